//! Records stored in a branch and the input shapes action creators accept

use serde_json::{Map, Value};

use crate::error::{BranchError, Result};

/// A single record: arbitrary fields plus a string `id`
pub type Item = Map<String, Value>;

/// Field holding the record identity
pub const ID_KEY: &str = "id";

/// Get the string id of an item, if it has one
pub fn item_id(item: &Item) -> Option<&str> {
    item.get(ID_KEY).and_then(Value::as_str)
}

/// Get the id of an item or fail with `InvalidArgument`
pub(crate) fn require_id<'a>(item: &'a Item, operation: &str) -> Result<&'a str> {
    item_id(item).ok_or_else(|| {
        BranchError::invalid_argument(format!(
            "{operation} item is missing a string `{ID_KEY}`: {}",
            Value::Object(item.clone())
        ))
    })
}

/// Shallow merge: fields of `patch` overwrite fields of `base`
pub fn merge_shallow(base: &Item, patch: &Item) -> Item {
    let mut merged = base.clone();
    merged.extend(patch.iter().map(|(key, value)| (key.clone(), value.clone())));
    merged
}

/// Single-record input (meta patches, default items)
pub trait IntoRecord {
    fn into_record(self) -> Result<Item>;
}

impl IntoRecord for Item {
    fn into_record(self) -> Result<Item> {
        Ok(self)
    }
}

impl IntoRecord for Value {
    fn into_record(self) -> Result<Item> {
        match self {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Item::new()),
            other => Err(BranchError::invalid_argument(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

/// One-or-many item input, normalized to a sequence
///
/// `()` stands for an absent argument and yields a single empty patch.
pub trait IntoItems {
    fn into_items(self) -> Result<Vec<Item>>;
}

impl IntoItems for () {
    fn into_items(self) -> Result<Vec<Item>> {
        Ok(vec![Item::new()])
    }
}

impl IntoItems for Item {
    fn into_items(self) -> Result<Vec<Item>> {
        Ok(vec![self])
    }
}

impl IntoItems for Vec<Item> {
    fn into_items(self) -> Result<Vec<Item>> {
        Ok(self)
    }
}

impl IntoItems for Value {
    fn into_items(self) -> Result<Vec<Item>> {
        match self {
            Value::Array(values) => values.into_iter().map(IntoRecord::into_record).collect(),
            other => other.into_record().map(|item| vec![item]),
        }
    }
}

/// Input accepted by `remove`: records, ids, or sequences of either
pub trait IntoIds {
    fn into_ids(self) -> Result<Vec<String>>;
}

impl IntoIds for &str {
    fn into_ids(self) -> Result<Vec<String>> {
        Ok(vec![self.to_string()])
    }
}

impl IntoIds for String {
    fn into_ids(self) -> Result<Vec<String>> {
        Ok(vec![self])
    }
}

impl IntoIds for Vec<&str> {
    fn into_ids(self) -> Result<Vec<String>> {
        Ok(self.into_iter().map(str::to_string).collect())
    }
}

impl IntoIds for Vec<String> {
    fn into_ids(self) -> Result<Vec<String>> {
        Ok(self)
    }
}

impl IntoIds for Item {
    fn into_ids(self) -> Result<Vec<String>> {
        Ok(vec![require_id(&self, "remove")?.to_string()])
    }
}

impl IntoIds for Vec<Item> {
    fn into_ids(self) -> Result<Vec<String>> {
        self.iter()
            .map(|item| require_id(item, "remove").map(str::to_string))
            .collect()
    }
}

impl IntoIds for Value {
    fn into_ids(self) -> Result<Vec<String>> {
        fn single(value: Value) -> Result<String> {
            match value {
                Value::String(id) => Ok(id),
                Value::Object(item) => Ok(require_id(&item, "remove")?.to_string()),
                other => Err(BranchError::invalid_argument(format!(
                    "expected an id or an item, got {other}"
                ))),
            }
        }

        match self {
            Value::Array(values) => values.into_iter().map(single).collect(),
            other => single(other).map(|id| vec![id]),
        }
    }
}

/// Build the `{id}` stub used by remove actions
pub(crate) fn id_stub(id: impl Into<String>) -> Item {
    let mut stub = Item::new();
    stub.insert(ID_KEY.to_string(), Value::String(id.into()));
    stub
}
