//! Plain action records and the action type string convention
//!
//! Types look like `"<branch>/<OPERATION>[/<suffix>]"`. Only the first two
//! segments decide what a reducer does; the suffix exists for trace tooling.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::RESET_ALL_BRANCHES;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::item::Item;

/// Append an optional devtools suffix to an action type
pub fn make_type(prefix: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) if !suffix.is_empty() => format!("{prefix}/{suffix}"),
        _ => prefix.to_string(),
    }
}

/// First two `/`-separated segments of an action type
pub fn dispatch_key(action_type: &str) -> &str {
    match action_type.match_indices('/').nth(1) {
        Some((idx, _)) => &action_type[..idx],
        None => action_type,
    }
}

/// A serializable message describing one state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub items: Vec<Item>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Item>,
}

impl Action {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            items: Vec::new(),
            meta: None,
        }
    }

    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    pub fn with_meta(mut self, meta: Item) -> Self {
        self.meta = Some(meta);
        self
    }

    /// The part of the type a reducer dispatches on
    pub fn dispatch_key(&self) -> &str {
        dispatch_key(&self.action_type)
    }

    /// Devtools suffix, if any
    pub fn suffix(&self) -> Option<&str> {
        let key = self.dispatch_key();
        self.action_type
            .get(key.len() + 1..)
            .filter(|suffix| !suffix.is_empty())
    }
}

/// The action every branch reducer answers by restoring its default state
pub fn reset_all_branches() -> Action {
    Action::new(RESET_ALL_BRANCHES)
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<Item>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Item>),
        One(Item),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

/// Deferred work that dispatches actions itself (thunk pattern)
pub type Thunk = Box<dyn FnOnce(&Dispatcher) -> Result<()> + Send>;

/// What an action creator hands to a store: plain data or a thunk
pub enum Dispatchable {
    Action(Action),
    Thunk(Thunk),
}

impl Dispatchable {
    pub fn thunk<F>(f: F) -> Self
    where
        F: FnOnce(&Dispatcher) -> Result<()> + Send + 'static,
    {
        Self::Thunk(Box::new(f))
    }

    /// The plain action, if this is not a thunk
    pub fn into_action(self) -> Option<Action> {
        match self {
            Self::Action(action) => Some(action),
            Self::Thunk(_) => None,
        }
    }
}

impl From<Action> for Dispatchable {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl fmt::Debug for Dispatchable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Self::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_make_type() {
        assert_eq!(make_type("todos/UPDATE", None), "todos/UPDATE");
        assert_eq!(make_type("todos/UPDATE", Some("")), "todos/UPDATE");
        assert_eq!(make_type("todos/UPDATE", Some("isDone")), "todos/UPDATE/isDone");
    }

    #[test]
    fn test_dispatch_key_ignores_suffix() {
        assert_eq!(dispatch_key("todos/UPDATE"), "todos/UPDATE");
        assert_eq!(dispatch_key("todos/UPDATE/isDone"), "todos/UPDATE");
        assert_eq!(dispatch_key("todos/UPDATE/a/b/c"), "todos/UPDATE");
        assert_eq!(dispatch_key(RESET_ALL_BRANCHES), RESET_ALL_BRANCHES);
    }

    #[test]
    fn test_suffix() {
        assert_eq!(Action::new("todos/SET_META/loading").suffix(), Some("loading"));
        assert_eq!(Action::new("todos/SET_META").suffix(), None);
        assert_eq!(Action::new("noop").suffix(), None);
    }

    #[test]
    fn test_deserialize_single_item_is_wrapped() {
        let action: Action =
            serde_json::from_value(json!({"type": "todos/CREATE", "items": {"id": "1"}})).unwrap();
        assert_eq!(action.items.len(), 1);
        assert_eq!(action.items[0]["id"], "1");
    }

    #[test]
    fn test_deserialize_without_items() {
        let action: Action = serde_json::from_value(json!({"type": "todos/RESET"})).unwrap();
        assert!(action.items.is_empty());
        assert!(action.meta.is_none());
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let value = serde_json::to_value(reset_all_branches()).unwrap();
        assert_eq!(value, json!({"type": "RESET_ALL_BRANCHES"}));
    }
}
