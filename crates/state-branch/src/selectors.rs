//! Read-only selectors over a global state snapshot
//!
//! Selectors know their branch name and look the branch up in whatever
//! state tree the host keeps. A tree without the branch reads as empty.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::ops::Deref;
use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::error::{BranchError, Result};
use crate::item::Item;
use crate::state::BranchState;

/// Global state that holds branch states by name
pub trait StateTree {
    fn branch(&self, name: &str) -> Option<&BranchState>;
}

impl StateTree for BTreeMap<String, BranchState> {
    fn branch(&self, name: &str) -> Option<&BranchState> {
        self.get(name)
    }
}

impl<H: BuildHasher> StateTree for HashMap<String, BranchState, H> {
    fn branch(&self, name: &str) -> Option<&BranchState> {
        self.get(name)
    }
}

/// Records grouped by the value of one field, in first-seen order
pub type Groups<'s> = Vec<(Value, Vec<&'s Item>)>;

/// A caller-registered selector: receives the built-in selectors, the state
/// tree and free-form arguments
pub type SelectorFn = Arc<dyn Fn(&Selectors, &dyn StateTree, &Value) -> Value + Send + Sync>;

/// Names accepted by [`SelectorSet::call`] without any registration
pub const BUILTIN_SELECTORS: [&str; 7] = [
    "all",
    "by_id",
    "where",
    "map_by_id",
    "map_by_key",
    "meta",
    "meta_fields",
];

/// Built-in selectors for one branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    name: String,
}

impl Selectors {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn branch<'s, S: StateTree + ?Sized>(&self, state: &'s S) -> Option<&'s BranchState> {
        state.branch(&self.name)
    }

    /// Every record, in collection order
    pub fn all<'s, S: StateTree + ?Sized>(&self, state: &'s S) -> Vec<&'s Item> {
        self.branch(state)
            .map(|branch| branch.items.values().collect())
            .unwrap_or_default()
    }

    pub fn by_id<'s, S: StateTree + ?Sized>(&self, state: &'s S, id: &str) -> Option<&'s Item> {
        self.branch(state).and_then(|branch| branch.item(id))
    }

    /// Records matching `predicate`; empty when nothing matches
    #[doc(alias = "where")]
    pub fn filter<'s, S, P>(&self, state: &'s S, predicate: P) -> Vec<&'s Item>
    where
        S: StateTree + ?Sized,
        P: Fn(&Item) -> bool,
    {
        self.all(state)
            .into_iter()
            .filter(|item| predicate(item))
            .collect()
    }

    /// The raw record collection keyed by id
    pub fn map_by_id<'s, S: StateTree + ?Sized>(
        &self,
        state: &'s S,
    ) -> Option<&'s BTreeMap<String, Item>> {
        self.branch(state).map(|branch| &branch.items)
    }

    /// Group records by the value of `key`; records without it group under `null`
    pub fn map_by_key<'s, S: StateTree + ?Sized>(&self, state: &'s S, key: &str) -> Groups<'s> {
        let mut groups: Groups<'s> = Vec::new();
        for item in self.all(state) {
            let value = item.get(key).cloned().unwrap_or(Value::Null);
            match groups.iter_mut().find(|(seen, _)| *seen == value) {
                Some((_, members)) => members.push(item),
                None => groups.push((value, vec![item])),
            }
        }
        groups
    }

    /// The whole branch state, `items` included
    pub fn meta<'s, S: StateTree + ?Sized>(&self, state: &'s S) -> Option<&'s BranchState> {
        self.branch(state)
    }

    /// Only the meta fields, without `items`
    pub fn meta_fields<'s, S: StateTree + ?Sized>(
        &self,
        state: &'s S,
    ) -> Option<&'s Map<String, Value>> {
        self.branch(state).map(|branch| &branch.meta)
    }

    fn call_builtin(&self, name: &str, state: &dyn StateTree, args: &Value) -> Result<Value> {
        let items = |items: Vec<&Item>| {
            Value::Array(items.into_iter().cloned().map(Value::Object).collect())
        };

        match name {
            "all" => Ok(items(self.all(state))),
            "by_id" => {
                let id = args.as_str().ok_or_else(|| {
                    BranchError::invalid_argument("by_id expects an id string")
                })?;
                Ok(self
                    .by_id(state, id)
                    .cloned()
                    .map(Value::Object)
                    .unwrap_or(Value::Null))
            }
            "where" => {
                let fields = args.as_object().ok_or_else(|| {
                    BranchError::invalid_argument("where expects an object of field values")
                })?;
                Ok(items(self.filter(state, |item| {
                    fields.iter().all(|(key, value)| item.get(key) == Some(value))
                })))
            }
            "map_by_id" => Ok(self
                .map_by_id(state)
                .map(|items| {
                    Value::Object(
                        items
                            .iter()
                            .map(|(id, item)| (id.clone(), Value::Object(item.clone())))
                            .collect(),
                    )
                })
                .unwrap_or(Value::Null)),
            "map_by_key" => {
                let key = args.as_str().ok_or_else(|| {
                    BranchError::invalid_argument("map_by_key expects a field name")
                })?;
                Ok(Value::Array(
                    self.map_by_key(state, key)
                        .into_iter()
                        .map(|(value, members)| json!({"key": value, "items": items(members)}))
                        .collect(),
                ))
            }
            "meta" => Ok(self
                .meta(state)
                .map(BranchState::to_value)
                .unwrap_or(Value::Null)),
            "meta_fields" => Ok(self
                .meta_fields(state)
                .cloned()
                .map(Value::Object)
                .unwrap_or(Value::Null)),
            other => Err(BranchError::invalid_argument(format!(
                "unknown selector '{other}'"
            ))),
        }
    }
}

/// Built-in selectors merged with caller-registered ones
///
/// Dereferences to [`Selectors`], so typed built-ins stay available.
#[derive(Clone)]
pub struct SelectorSet {
    selectors: Selectors,
    custom: BTreeMap<String, SelectorFn>,
}

impl SelectorSet {
    pub fn new(selectors: Selectors, custom: BTreeMap<String, SelectorFn>) -> Self {
        Self { selectors, custom }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name) || BUILTIN_SELECTORS.contains(&name)
    }

    /// Run a selector by name; registered selectors win over built-ins
    pub fn call(&self, name: &str, state: &dyn StateTree, args: &Value) -> Result<Value> {
        if let Some(custom) = self.custom.get(name) {
            return Ok(custom(&self.selectors, state, args));
        }
        if !BUILTIN_SELECTORS.contains(&name) {
            log::warn!("Unknown selector '{}'", name);
        }
        self.selectors.call_builtin(name, state, args)
    }
}

impl Deref for SelectorSet {
    type Target = Selectors;

    fn deref(&self) -> &Self::Target {
        &self.selectors
    }
}

impl fmt::Debug for SelectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorSet")
            .field("selectors", &self.selectors)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Selectors for `name` without building a whole branch
pub fn create_selectors(name: &str) -> Selectors {
    Selectors::new(name)
}
