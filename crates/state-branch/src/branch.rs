//! State branch: name, constants, actions, selectors and reducer bound together

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::action::{Action, Dispatchable};
use crate::actions::{ActionCreators, ActionFn, ActionSet};
use crate::constants::Constants;
use crate::error::{BranchError, Result};
use crate::id::{GenerateId, RandomUuid};
use crate::item::{IntoRecord, Item};
use crate::reducer::{BranchReducer, ExtensionReducer};
use crate::selectors::{SelectorFn, SelectorSet, Selectors, StateTree};
use crate::state::BranchState;

/// Opaque helpers carried by a branch, looked up by name and type
pub type Utils = BTreeMap<String, Arc<dyn Any + Send + Sync>>;

/// Options for [`StateBranch::new`]
///
/// Only `name` is required. Defaults: empty default item, `{ items: {} }`
/// default state, pass-through extension reducer, random UUID ids.
pub struct BranchOptions {
    name: String,
    actions: BTreeMap<String, ActionFn>,
    selectors: BTreeMap<String, SelectorFn>,
    constants: BTreeMap<String, String>,
    utils: Utils,
    default_item: Option<Value>,
    default_state: Option<Value>,
    reducer: Option<ExtensionReducer>,
    generate_id: Option<Arc<dyn GenerateId>>,
}

impl BranchOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: BTreeMap::new(),
            selectors: BTreeMap::new(),
            constants: BTreeMap::new(),
            utils: Utils::new(),
            default_item: None,
            default_state: None,
            reducer: None,
            generate_id: None,
        }
    }

    /// Register a custom action, replacing any built-in of the same name
    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&ActionCreators, Value, Option<&str>) -> Result<Dispatchable> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    /// Register a custom selector, replacing any built-in of the same name
    pub fn selector<F>(mut self, name: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&Selectors, &dyn StateTree, &Value) -> Value + Send + Sync + 'static,
    {
        self.selectors.insert(name.into(), Arc::new(selector));
        self
    }

    pub fn constant(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.constants.insert(key.into(), value.into());
        self
    }

    pub fn constants(mut self, constants: BTreeMap<String, String>) -> Self {
        self.constants.extend(constants);
        self
    }

    pub fn util<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.utils.insert(key.into(), Arc::new(value));
        self
    }

    /// Fields merged underneath every created record
    pub fn default_item(mut self, default_item: Value) -> Self {
        self.default_item = Some(default_item);
        self
    }

    /// Initial state, also restored by RESET
    pub fn default_state(mut self, default_state: Value) -> Self {
        self.default_state = Some(default_state);
        self
    }

    /// Reducer for action types not owned by the branch
    pub fn reducer<F>(mut self, reducer: F) -> Self
    where
        F: Fn(BranchState, &Action) -> BranchState + Send + Sync + 'static,
    {
        self.reducer = Some(Arc::new(reducer));
        self
    }

    pub fn generate_id(mut self, generator: impl GenerateId + 'static) -> Self {
        self.generate_id = Some(Arc::new(generator));
        self
    }
}

impl fmt::Debug for BranchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchOptions")
            .field("name", &self.name)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("selectors", &self.selectors.keys().collect::<Vec<_>>())
            .field("constants", &self.constants)
            .field("utils", &self.utils.keys().collect::<Vec<_>>())
            .field("default_item", &self.default_item)
            .field("default_state", &self.default_state)
            .finish_non_exhaustive()
    }
}

/// One named branch of the state tree
///
/// Immutable after construction; the host owns the state value and feeds it
/// through [`reduce`](Self::reduce) on every dispatch.
#[derive(Clone)]
pub struct StateBranch {
    name: String,
    constant: Arc<Constants>,
    action: ActionSet,
    select: SelectorSet,
    util: Arc<Utils>,
    default_item: Arc<Item>,
    reducer: BranchReducer,
}

impl StateBranch {
    pub fn new(options: BranchOptions) -> Result<Self> {
        let BranchOptions {
            name,
            actions,
            selectors,
            constants,
            utils,
            default_item,
            default_state,
            reducer,
            generate_id,
        } = options;

        if name.is_empty() {
            return Err(BranchError::invalid_config("branch name must not be empty"));
        }
        if name.contains('/') {
            return Err(BranchError::invalid_config(format!(
                "branch name '{name}' must not contain '/'"
            )));
        }

        let default_item = match default_item {
            Some(item) => item
                .into_record()
                .map_err(|e| BranchError::invalid_config(format!("default item: {e}")))?,
            None => Item::new(),
        };
        let default_state = match default_state {
            Some(state) => BranchState::from_value(state)?,
            None => BranchState::default(),
        };

        let constant = Arc::new(Constants::with_custom(&name, constants));
        let default_item = Arc::new(default_item);
        let generate_id =
            generate_id.unwrap_or_else(|| Arc::new(RandomUuid) as Arc<dyn GenerateId>);

        let creators = ActionCreators::new(constant.clone(), default_item.clone(), generate_id);
        let reducer = BranchReducer::new(constant.clone(), Arc::new(default_state), reducer);

        log::debug!(
            "Created branch '{}' ({} custom action(s), {} custom selector(s))",
            name,
            actions.len(),
            selectors.len()
        );

        Ok(Self {
            action: ActionSet::new(creators, actions),
            select: SelectorSet::new(Selectors::new(name.clone()), selectors),
            name,
            constant,
            util: Arc::new(utils),
            default_item,
            reducer,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constant(&self) -> &Constants {
        &self.constant
    }

    pub fn action(&self) -> &ActionSet {
        &self.action
    }

    pub fn select(&self) -> &SelectorSet {
        &self.select
    }

    /// A helper registered with [`BranchOptions::util`], if it has type `T`
    pub fn util<T: Any>(&self, key: &str) -> Option<&T> {
        self.util.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn default_item(&self) -> &Item {
        &self.default_item
    }

    pub fn default_state(&self) -> &BranchState {
        self.reducer.default_state()
    }

    /// The reducer, for registration with a host store
    pub fn reducer(&self) -> &BranchReducer {
        &self.reducer
    }

    pub fn reduce(&self, state: Option<BranchState>, action: &Action) -> BranchState {
        self.reducer.reduce(state, action)
    }
}

impl fmt::Debug for StateBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBranch")
            .field("name", &self.name)
            .field("constant", &self.constant)
            .field("action", &self.action)
            .field("select", &self.select)
            .field("util", &self.util.keys().collect::<Vec<_>>())
            .field("default_item", &self.default_item)
            .field("reducer", &self.reducer)
            .finish()
    }
}
