//! Branch state: the keyed record collection plus sibling meta fields

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BranchError, Result};
use crate::item::{ID_KEY, Item, item_id};

/// Key of the record collection inside a branch state
pub const ITEMS_KEY: &str = "items";

/// State of one branch, serialized flat as `{ items: {..}, ...meta }`
///
/// `items` keys always equal the `id` of the stored record. Meta fields may
/// hold anything except a key named `items`. Deserialization goes through
/// [`BranchState::from_value`], so restored state obeys the same rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct BranchState {
    #[serde(default)]
    pub items: BTreeMap<String, Item>,

    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

impl BranchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from a JSON-like value, validating the invariants
    ///
    /// Records without an `id` get their collection key as id; a record
    /// whose id differs from its key is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(BranchError::invalid_config(
                "branch state must be an object",
            ));
        };

        let items = match fields.remove(ITEMS_KEY) {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(items)) => items
                .into_iter()
                .map(|(key, value)| {
                    let Value::Object(mut item) = value else {
                        return Err(BranchError::invalid_config(format!(
                            "item '{key}' must be an object"
                        )));
                    };
                    match item_id(&item) {
                        Some(id) if id != key => {
                            return Err(BranchError::invalid_config(format!(
                                "item stored under '{key}' has id '{id}'"
                            )));
                        }
                        Some(_) => {}
                        None => {
                            item.insert(ID_KEY.to_string(), Value::String(key.clone()));
                        }
                    }
                    Ok((key, item))
                })
                .collect::<Result<_>>()?,
            Some(_) => {
                return Err(BranchError::invalid_config(
                    "`items` must be an object keyed by id",
                ));
            }
        };

        Ok(Self {
            items,
            meta: fields,
        })
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn meta_value(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Flat JSON representation, as a host would see it
    pub fn to_value(&self) -> Value {
        let mut fields = self.meta.clone();
        fields.insert(
            ITEMS_KEY.to_string(),
            Value::Object(
                self.items
                    .iter()
                    .map(|(id, item)| (id.clone(), Value::Object(item.clone())))
                    .collect(),
            ),
        );
        Value::Object(fields)
    }
}

impl TryFrom<Value> for BranchState {
    type Error = BranchError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}
