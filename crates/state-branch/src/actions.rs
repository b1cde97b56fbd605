//! Action creators for one branch
//!
//! `ActionCreators` builds the built-in actions. `ActionSet` layers
//! caller-registered actions on top by name; a registered name replaces the
//! built-in of the same name when invoked through [`ActionSet::call`].

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde_json::Value;

use crate::action::{Action, Dispatchable, make_type};
use crate::constants::{Constants, Operation};
use crate::error::{BranchError, Result};
use crate::id::{GenerateId, RandomUuid};
use crate::item::{
    ID_KEY, IntoIds, IntoItems, IntoRecord, Item, id_stub, item_id, merge_shallow, require_id,
};

/// A caller-registered action: receives the built-in creators, a payload and
/// an optional devtools suffix
pub type ActionFn =
    Arc<dyn Fn(&ActionCreators, Value, Option<&str>) -> Result<Dispatchable> + Send + Sync>;

/// Names accepted by [`ActionSet::call`] without any registration
pub const BUILTIN_ACTIONS: [&str; 8] = [
    "create", "update", "replace", "remove", "delete", "set_meta", "reset", "noop",
];

/// Built-in action creators bound to a branch's constants
#[derive(Clone)]
pub struct ActionCreators {
    constants: Arc<Constants>,
    default_item: Arc<Item>,
    id_generator: Arc<dyn GenerateId>,
}

impl ActionCreators {
    pub fn new(
        constants: Arc<Constants>,
        default_item: Arc<Item>,
        id_generator: Arc<dyn GenerateId>,
    ) -> Self {
        Self {
            constants,
            default_item,
            id_generator,
        }
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn default_item(&self) -> &Item {
        &self.default_item
    }

    fn action_type(&self, op: Operation, suffix: Option<&str>) -> String {
        make_type(self.constants.of(op), suffix)
    }

    /// New records: missing ids are generated, the default item goes underneath
    pub fn create(&self, items: impl IntoItems, suffix: Option<&str>) -> Result<Action> {
        let items = items
            .into_items()?
            .into_iter()
            .map(|mut item| {
                if item_id(&item).is_none() {
                    let id = self.id_generator.generate_id()?;
                    item.insert(ID_KEY.to_string(), Value::String(id));
                }
                Ok(merge_shallow(&self.default_item, &item))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Action::new(self.action_type(Operation::Create, suffix)).with_items(items))
    }

    /// Partial updates; every item must carry its `id`
    pub fn update(&self, items: impl IntoItems, suffix: Option<&str>) -> Result<Action> {
        let items = identified(items, "update")?;
        Ok(Action::new(self.action_type(Operation::Update, suffix)).with_items(items))
    }

    /// Full overwrites; every item must carry its `id`
    pub fn replace(&self, items: impl IntoItems, suffix: Option<&str>) -> Result<Action> {
        let items = identified(items, "replace")?;
        Ok(Action::new(self.action_type(Operation::Replace, suffix)).with_items(items))
    }

    /// Remove by record(s) or id(s); always emits `{id}` stubs
    pub fn remove(&self, targets: impl IntoIds, suffix: Option<&str>) -> Result<Action> {
        self.remove_as(Operation::Remove, targets, suffix)
    }

    /// Legacy spelling of [`remove`](Self::remove), emitting `<name>/DELETE`
    pub fn delete(&self, targets: impl IntoIds, suffix: Option<&str>) -> Result<Action> {
        self.remove_as(Operation::Delete, targets, suffix)
    }

    fn remove_as(
        &self,
        op: Operation,
        targets: impl IntoIds,
        suffix: Option<&str>,
    ) -> Result<Action> {
        let stubs = targets.into_ids()?.into_iter().map(id_stub).collect();
        Ok(Action::new(self.action_type(op, suffix)).with_items(stubs))
    }

    pub fn set_meta(&self, meta: impl IntoRecord, suffix: Option<&str>) -> Result<Action> {
        let meta = meta.into_record()?;
        Ok(Action::new(self.action_type(Operation::SetMeta, suffix)).with_meta(meta))
    }

    pub fn reset(&self, suffix: Option<&str>) -> Action {
        Action::new(self.action_type(Operation::Reset, suffix))
    }

    pub fn noop(&self, suffix: Option<&str>) -> Action {
        Action::new(self.action_type(Operation::Noop, suffix))
    }

    /// Invoke a built-in by name with a JSON payload
    fn call_builtin(&self, name: &str, payload: Value, suffix: Option<&str>) -> Result<Action> {
        match name {
            "create" => match payload {
                Value::Null => self.create((), suffix),
                payload => self.create(payload, suffix),
            },
            "update" => self.update(payload, suffix),
            "replace" => self.replace(payload, suffix),
            "remove" => self.remove(payload, suffix),
            "delete" => self.delete(payload, suffix),
            "set_meta" => self.set_meta(payload, suffix),
            "reset" => Ok(self.reset(suffix)),
            "noop" => Ok(self.noop(suffix)),
            other => Err(BranchError::invalid_argument(format!(
                "unknown action '{other}'"
            ))),
        }
    }
}

impl fmt::Debug for ActionCreators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreators")
            .field("constants", &self.constants)
            .field("default_item", &self.default_item)
            .finish_non_exhaustive()
    }
}

fn identified(items: impl IntoItems, operation: &str) -> Result<Vec<Item>> {
    let items = items.into_items()?;
    for item in &items {
        require_id(item, operation)?;
    }
    Ok(items)
}

/// Built-in creators merged with caller-registered actions
///
/// Dereferences to [`ActionCreators`], so typed built-ins stay available.
#[derive(Clone)]
pub struct ActionSet {
    creators: ActionCreators,
    custom: BTreeMap<String, ActionFn>,
}

impl ActionSet {
    pub fn new(creators: ActionCreators, custom: BTreeMap<String, ActionFn>) -> Self {
        Self { creators, custom }
    }

    pub fn creators(&self) -> &ActionCreators {
        &self.creators
    }

    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name) || BUILTIN_ACTIONS.contains(&name)
    }

    /// All callable names, custom entries included
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = BUILTIN_ACTIONS.to_vec();
        names.extend(
            self.custom
                .keys()
                .map(String::as_str)
                .filter(|name| !BUILTIN_ACTIONS.contains(name)),
        );
        names
    }

    /// Invoke an action by name; registered actions win over built-ins
    pub fn call(&self, name: &str, payload: Value, suffix: Option<&str>) -> Result<Dispatchable> {
        if let Some(custom) = self.custom.get(name) {
            return custom(&self.creators, payload, suffix);
        }
        if !BUILTIN_ACTIONS.contains(&name) {
            log::warn!("Unknown action '{}'", name);
        }
        self.creators
            .call_builtin(name, payload, suffix)
            .map(Dispatchable::from)
    }
}

impl Deref for ActionSet {
    type Target = ActionCreators;

    fn deref(&self) -> &Self::Target {
        &self.creators
    }
}

impl fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSet")
            .field("creators", &self.creators)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Action creators for `name` without building a whole branch
///
/// Uses an empty default item and random UUID ids.
pub fn create_actions(name: &str) -> ActionCreators {
    ActionCreators::new(
        Arc::new(Constants::new(name)),
        Arc::new(Item::new()),
        Arc::new(RandomUuid),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn creators() -> ActionCreators {
        ActionCreators::new(
            Arc::new(Constants::new("todos")),
            Arc::new(
                json!({"text": "", "priority": "normal", "isDone": false})
                    .into_record()
                    .unwrap(),
            ),
            Arc::new(|| "generated".to_string()),
        )
    }

    #[test]
    fn test_create_without_argument() {
        let action = creators().create((), None).unwrap();
        assert_eq!(action.action_type, "todos/CREATE");
        assert_eq!(
            Value::Object(action.items[0].clone()),
            json!({"id": "generated", "text": "", "priority": "normal", "isDone": false})
        );
    }

    #[test]
    fn test_create_caller_fields_win_over_default_item() {
        let action = creators()
            .create(json!({"text": "Buy milk"}), Some("text"))
            .unwrap();
        assert_eq!(action.action_type, "todos/CREATE/text");
        assert_eq!(action.items[0]["text"], "Buy milk");
        assert_eq!(action.items[0]["priority"], "normal");
    }

    #[test]
    fn test_create_keeps_given_ids() {
        let action = creators()
            .create(json!([{"id": "a"}, {"text": "no id"}]), None)
            .unwrap();
        let ids: Vec<_> = action.items.iter().filter_map(item_id).collect();
        assert_eq!(ids, vec!["a", "generated"]);
    }

    #[test]
    fn test_create_propagates_generator_failure() {
        struct Broken;
        impl GenerateId for Broken {
            fn generate_id(&self) -> Result<String> {
                Err(BranchError::invalid_argument("no ids today"))
            }
        }

        let creators = ActionCreators::new(
            Arc::new(Constants::new("todos")),
            Arc::new(Item::new()),
            Arc::new(Broken),
        );
        assert!(creators.create((), None).is_err());
    }

    #[test]
    fn test_update_requires_id() {
        let result = creators().update(json!({"isDone": true}), None);
        assert!(matches!(result, Err(BranchError::InvalidArgument(_))));

        let result = creators().replace(json!([{"id": "1"}, {"text": "x"}]), None);
        assert!(matches!(result, Err(BranchError::InvalidArgument(_))));
    }

    #[test]
    fn test_update_does_not_merge_default_item() {
        let action = creators()
            .update(json!({"id": "1", "isDone": true}), Some("isDone"))
            .unwrap();
        assert_eq!(action.action_type, "todos/UPDATE/isDone");
        assert_eq!(Value::Object(action.items[0].clone()), json!({"id": "1", "isDone": true}));
    }

    #[test]
    fn test_remove_normalizes_to_stubs() {
        let by_id = creators().remove("1", None).unwrap();
        let by_ids = creators().remove(vec!["1", "2"], None).unwrap();
        let by_item = creators()
            .remove(json!({"id": "1", "text": "ignored"}), None)
            .unwrap();

        assert_eq!(by_id.action_type, "todos/REMOVE");
        assert_eq!(Value::Object(by_id.items[0].clone()), json!({"id": "1"}));
        assert_eq!(by_ids.items.len(), 2);
        assert_eq!(by_item.items, by_id.items);
    }

    #[test]
    fn test_delete_uses_legacy_type() {
        let action = creators().delete("1", None).unwrap();
        assert_eq!(action.action_type, "todos/DELETE");
    }

    #[test]
    fn test_set_meta_reset_noop() {
        let meta = creators()
            .set_meta(json!({"viewByFilter": "done"}), Some("viewByFilter"))
            .unwrap();
        assert_eq!(meta.action_type, "todos/SET_META/viewByFilter");
        assert_eq!(meta.meta.unwrap()["viewByFilter"], "done");

        assert_eq!(creators().reset(None).action_type, "todos/RESET");
        assert_eq!(creators().noop(Some("tick")).action_type, "todos/NOOP/tick");
    }

    #[test]
    fn test_set_meta_rejects_non_object() {
        assert!(creators().set_meta(json!("nope"), None).is_err());
    }

    #[test]
    fn test_call_builtin_by_name() {
        let set = ActionSet::new(creators(), BTreeMap::new());
        let action = set
            .call("remove", json!("1"), None)
            .unwrap()
            .into_action()
            .unwrap();
        assert_eq!(action.action_type, "todos/REMOVE");

        let action = set.call("create", Value::Null, None).unwrap().into_action().unwrap();
        assert_eq!(item_id(&action.items[0]), Some("generated"));
    }

    #[test]
    fn test_call_unknown_name() {
        let set = ActionSet::new(creators(), BTreeMap::new());
        assert!(!set.contains("explode"));
        assert!(matches!(
            set.call("explode", Value::Null, None),
            Err(BranchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_custom_action_overrides_builtin() {
        let reset_view: ActionFn = Arc::new(
            |creators: &ActionCreators, _payload: Value, suffix: Option<&str>| {
                creators
                    .set_meta(json!({"viewByFilter": "all"}), suffix)
                    .map(Dispatchable::from)
            },
        );
        let set = ActionSet::new(creators(), BTreeMap::from([("reset".to_string(), reset_view)]));

        let action = set.call("reset", Value::Null, None).unwrap().into_action().unwrap();
        assert_eq!(action.action_type, "todos/SET_META");
        // the typed built-in is untouched
        assert_eq!(set.reset(None).action_type, "todos/RESET");
        assert_eq!(set.names().iter().filter(|n| **n == "reset").count(), 1);
    }

    #[test]
    fn test_custom_action_errors_pass_through() {
        let failing: ActionFn = Arc::new(|_: &ActionCreators, _: Value, _: Option<&str>| {
            Err(anyhow::anyhow!("Invalid Priority").into())
        });
        let set = ActionSet::new(creators(), BTreeMap::from([("change_priority".to_string(), failing)]));

        let err = set.call("change_priority", json!("urgent"), None).unwrap_err();
        assert!(matches!(err, BranchError::Custom(_)));
        assert_eq!(err.to_string(), "Invalid Priority");
    }

    #[test]
    fn test_create_actions_without_branch() {
        let action = create_actions("users").create(json!({"name": "A"}), None).unwrap();
        assert_eq!(action.action_type, "users/CREATE");
        assert_eq!(item_id(&action.items[0]).map(str::len), Some(36));
    }
}
