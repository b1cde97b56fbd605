//! Branch reducer - pure function producing the next branch state from
//! the current one and an action

use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::constants::{Constants, Operation, RESET_ALL_BRANCHES};
use crate::item::{Item, item_id, merge_shallow};
use crate::state::{BranchState, ITEMS_KEY};

/// Caller-supplied reducer for action types the branch does not own
pub type ExtensionReducer = Arc<dyn Fn(BranchState, &Action) -> BranchState + Send + Sync>;

/// Reducer bound to one branch's constants and default state
///
/// Cheap to clone, so a host can register it while the branch keeps its own copy.
#[derive(Clone)]
pub struct BranchReducer {
    constants: Arc<Constants>,
    default_state: Arc<BranchState>,
    extension: Option<ExtensionReducer>,
}

impl BranchReducer {
    pub fn new(
        constants: Arc<Constants>,
        default_state: Arc<BranchState>,
        extension: Option<ExtensionReducer>,
    ) -> Self {
        Self {
            constants,
            default_state,
            extension,
        }
    }

    pub fn default_state(&self) -> &BranchState {
        &self.default_state
    }

    /// Compute the next state
    ///
    /// `None` stands for a host that has no state for this branch yet and is
    /// replaced by the default state. Types not owned by this branch go to the
    /// extension reducer, which defaults to passing the state through.
    ///
    /// Ids are never generated here. Items without a string `id` in CREATE,
    /// UPDATE, REPLACE and REMOVE actions are skipped with a warning, so
    /// hand-built actions must carry ids or come from the action creators.
    pub fn reduce(&self, state: Option<BranchState>, action: &Action) -> BranchState {
        let state = state.unwrap_or_else(|| self.default_state.as_ref().clone());

        if action.action_type == RESET_ALL_BRANCHES {
            log::debug!("Reset all branches: restoring default state");
            return self.default_state.as_ref().clone();
        }

        let Some(operation) = self.constants.operation(action.dispatch_key()) else {
            return match &self.extension {
                Some(extension) => extension(state, action),
                None => state,
            };
        };

        log::debug!(
            "Reducing {} ({} item(s))",
            action.action_type,
            action.items.len()
        );

        match operation {
            Operation::Create | Operation::Replace => replace_items(state, &action.items),
            Operation::Update => update_items(state, &action.items),
            Operation::Remove | Operation::Delete => remove_items(state, &action.items),
            Operation::SetMeta => set_meta(state, action.meta.as_ref()),
            Operation::Reset => self.default_state.as_ref().clone(),
            Operation::Noop => state,
        }
    }
}

impl fmt::Debug for BranchReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchReducer")
            .field("constants", &self.constants)
            .field("default_state", &self.default_state)
            .field("extension", &self.extension.is_some())
            .finish()
    }
}

/// Items that carry a string id; the rest are skipped with a warning
fn with_ids<'a>(items: &'a [Item], operation: &'a str) -> impl Iterator<Item = (&'a str, &'a Item)> {
    items.iter().filter_map(move |item| match item_id(item) {
        Some(id) => Some((id, item)),
        None => {
            log::warn!("Skipping {} item without an id: {:?}", operation, item);
            None
        }
    })
}

/// Insert or overwrite each item at its id (CREATE, REPLACE)
fn replace_items(mut state: BranchState, items: &[Item]) -> BranchState {
    for (id, item) in with_ids(items, "replace") {
        state.items.insert(id.to_string(), item.clone());
    }
    state
}

/// Shallow-merge each item onto the stored record, or insert it as is
fn update_items(mut state: BranchState, items: &[Item]) -> BranchState {
    for (id, patch) in with_ids(items, "update") {
        let next = match state.items.get(id) {
            Some(existing) => merge_shallow(existing, patch),
            None => patch.clone(),
        };
        state.items.insert(id.to_string(), next);
    }
    state
}

fn remove_items(mut state: BranchState, items: &[Item]) -> BranchState {
    for (id, _) in with_ids(items, "remove") {
        state.items.remove(id);
    }
    state
}

/// Shallow-merge meta fields beside `items`; an `items` key is dropped
fn set_meta(mut state: BranchState, meta: Option<&Item>) -> BranchState {
    for (key, value) in meta.into_iter().flatten() {
        if key == ITEMS_KEY {
            log::warn!("Ignoring meta field named '{}'", ITEMS_KEY);
            continue;
        }
        state.meta.insert(key.clone(), value.clone());
    }
    state
}
