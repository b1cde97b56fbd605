//! The todos branch: built-in CRUD plus a few domain actions and selectors

use anyhow::bail;
use serde_json::{Value, json};
use state_branch::{BranchOptions, Dispatchable, Result, StateBranch};

pub const PRIORITIES: [&str; 3] = ["low", "normal", "high"];

pub fn default_options() -> BranchOptions {
    BranchOptions::new("todos")
        .default_item(json!({"text": "", "priority": "normal", "isDone": false}))
        .default_state(json!({
            "loading": false,
            "viewByFilter": "all",
            "items": {
                "1": {"id": "1", "text": "", "priority": "normal", "isDone": false}
            }
        }))
}

/// Add the todo actions and selectors to `options`
pub fn with_todo_logic(options: BranchOptions) -> BranchOptions {
    options
        .action("toggle_done", |creators, todo, suffix| {
            let is_done = todo.get("isDone").and_then(Value::as_bool).unwrap_or(false);
            creators
                .update(
                    json!({"id": todo["id"], "isDone": !is_done}),
                    suffix.or(Some("isDone")),
                )
                .map(Dispatchable::from)
        })
        .action("update_text", |creators, payload, suffix| {
            let text = capitalize(payload["text"].as_str().unwrap_or_default());
            creators
                .update(json!({"id": payload["id"], "text": text}), suffix.or(Some("text")))
                .map(Dispatchable::from)
        })
        .action("change_priority", |creators, payload, suffix| {
            let priority = parse_priority(&payload["priority"])?;
            creators
                .update(
                    json!({"id": payload["id"], "priority": priority}),
                    suffix.or(Some("priority")),
                )
                .map(Dispatchable::from)
        })
        .action("update_view_by_filter", |creators, filter, suffix| {
            creators
                .set_meta(json!({"viewByFilter": filter}), suffix.or(Some("viewByFilter")))
                .map(Dispatchable::from)
        })
        .action("create_todo", |creators, todo, _suffix| {
            let creators = creators.clone();
            Ok(Dispatchable::thunk(move |dispatcher| {
                dispatcher.dispatch(creators.set_meta(json!({"loading": true}), Some("loading"))?);
                dispatcher.dispatch(creators.create(todo, None)?);
                dispatcher.dispatch(creators.set_meta(json!({"loading": false}), Some("loading"))?);
                Ok(())
            }))
        })
        .selector("view_by_filter", |select, state, _args| {
            select
                .meta_fields(state)
                .and_then(|meta| meta.get("viewByFilter"))
                .cloned()
                .unwrap_or_else(|| json!("all"))
        })
        .selector("loading", |select, state, _args| {
            select
                .meta_fields(state)
                .and_then(|meta| meta.get("loading"))
                .cloned()
                .unwrap_or(Value::Bool(false))
        })
        .selector("visible_todos", |select, state, args| {
            // an explicit filter argument wins over the stored one
            let filter = args
                .as_str()
                .or_else(|| {
                    select
                        .meta_fields(state)
                        .and_then(|meta| meta.get("viewByFilter"))
                        .and_then(Value::as_str)
                })
                .unwrap_or("all")
                .to_string();
            let visible = select.filter(state, |todo| {
                let is_done = todo.get("isDone").and_then(Value::as_bool).unwrap_or(false);
                match filter.as_str() {
                    "todo" => !is_done,
                    "done" => is_done,
                    priority if PRIORITIES.contains(&priority) => {
                        todo.get("priority").and_then(Value::as_str) == Some(priority)
                    }
                    _ => true,
                }
            });
            Value::Array(visible.into_iter().cloned().map(Value::Object).collect())
        })
}

pub fn branch() -> Result<StateBranch> {
    StateBranch::new(with_todo_logic(default_options()))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_priority(value: &Value) -> anyhow::Result<&str> {
    match value.as_str() {
        Some(priority) if PRIORITIES.contains(&priority) => Ok(priority),
        _ => bail!("Invalid Priority"),
    }
}
