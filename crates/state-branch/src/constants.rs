//! Action type constants derived from a branch name

use std::collections::BTreeMap;

use serde::Serialize;

/// Broadcast type that resets every branch to its own default state
pub const RESET_ALL_BRANCHES: &str = "RESET_ALL_BRANCHES";

/// Built-in operations every branch reducer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Replace,
    Update,
    Remove,
    /// Legacy alias of `Remove`
    Delete,
    SetMeta,
    Reset,
    Noop,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Create,
        Operation::Replace,
        Operation::Update,
        Operation::Remove,
        Operation::Delete,
        Operation::SetMeta,
        Operation::Reset,
        Operation::Noop,
    ];

    /// Constant key, also the last segment of the action type
    pub fn key(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Replace => "REPLACE",
            Self::Update => "UPDATE",
            Self::Remove => "REMOVE",
            Self::Delete => "DELETE",
            Self::SetMeta => "SET_META",
            Self::Reset => "RESET",
            Self::Noop => "NOOP",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }
}

/// Namespaced action types of one branch plus caller-supplied extras
///
/// Built-in entries are always `"<name>/<OP>"`. Custom entries pass through
/// verbatim and can never shadow a built-in key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constants {
    builtin: BTreeMap<&'static str, String>,
    custom: BTreeMap<String, String>,
}

impl Constants {
    pub fn new(name: &str) -> Self {
        Self::with_custom(name, BTreeMap::new())
    }

    pub fn with_custom(name: &str, custom: BTreeMap<String, String>) -> Self {
        let builtin = Operation::ALL
            .into_iter()
            .map(|op| (op.key(), format!("{}/{}", name, op.key())))
            .collect();

        let custom = custom
            .into_iter()
            .filter(|(key, _)| {
                let shadowed = Operation::from_key(key).is_some();
                if shadowed {
                    log::warn!(
                        "Branch '{}': custom constant {} ignored, built-in wins",
                        name,
                        key
                    );
                }
                !shadowed
            })
            .collect();

        Self { builtin, custom }
    }

    /// Type string of a built-in operation
    pub fn of(&self, op: Operation) -> &str {
        // every operation is inserted in `with_custom`
        self.builtin.get(op.key()).map(String::as_str).unwrap_or_default()
    }

    /// Look up any constant by key, built-ins first
    pub fn get(&self, key: &str) -> Option<&str> {
        self.builtin
            .get(key)
            .or_else(|| self.custom.get(key))
            .map(String::as_str)
    }

    /// Built-in operation whose type string equals `dispatch_key`
    pub fn operation(&self, dispatch_key: &str) -> Option<Operation> {
        Operation::ALL
            .into_iter()
            .find(|op| self.of(*op) == dispatch_key)
    }

    pub fn custom(&self) -> &BTreeMap<String, String> {
        &self.custom
    }

    pub fn create(&self) -> &str {
        self.of(Operation::Create)
    }

    pub fn replace(&self) -> &str {
        self.of(Operation::Replace)
    }

    pub fn update(&self) -> &str {
        self.of(Operation::Update)
    }

    pub fn remove(&self) -> &str {
        self.of(Operation::Remove)
    }

    pub fn delete(&self) -> &str {
        self.of(Operation::Delete)
    }

    pub fn set_meta(&self) -> &str {
        self.of(Operation::SetMeta)
    }

    pub fn reset(&self) -> &str {
        self.of(Operation::Reset)
    }

    pub fn noop(&self) -> &str {
        self.of(Operation::Noop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_constants_are_namespaced() {
        for name in ["testBranch", "todos", "users"] {
            let constants = Constants::new(name);
            assert_eq!(constants.create(), format!("{name}/CREATE"));
            assert_eq!(constants.replace(), format!("{name}/REPLACE"));
            assert_eq!(constants.update(), format!("{name}/UPDATE"));
            assert_eq!(constants.remove(), format!("{name}/REMOVE"));
            assert_eq!(constants.set_meta(), format!("{name}/SET_META"));
            assert_eq!(constants.reset(), format!("{name}/RESET"));
        }
    }

    #[test]
    fn test_custom_constant_passes_through_verbatim() {
        let custom = BTreeMap::from([("CUSTOM".to_string(), "CUSTOM_CONSTANT".to_string())]);
        let constants = Constants::with_custom("testBranch", custom);
        assert_eq!(constants.get("CUSTOM"), Some("CUSTOM_CONSTANT"));
        assert_eq!(constants.get("MISSING"), None);
    }

    #[test]
    fn test_builtin_wins_on_collision() {
        let custom = BTreeMap::from([("CREATE".to_string(), "hijacked".to_string())]);
        let constants = Constants::with_custom("testBranch", custom);
        assert_eq!(constants.get("CREATE"), Some("testBranch/CREATE"));
        assert!(constants.custom().is_empty());
    }

    #[test]
    fn test_operation_lookup() {
        let constants = Constants::new("todos");
        assert_eq!(constants.operation("todos/UPDATE"), Some(Operation::Update));
        assert_eq!(constants.operation("todos/DELETE"), Some(Operation::Delete));
        assert_eq!(constants.operation("other/UPDATE"), None);
        assert_eq!(constants.operation("todos/CUSTOM"), None);
    }
}
