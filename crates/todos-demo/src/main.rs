use anyhow::Context;
use serde_json::json;
use state_branch::{BranchConfig, LoggingMiddleware, StateBranch, Store, reset_all_branches};

mod todos;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    log::info!("Starting todos-demo");

    // Optional TOML branch config as the only argument
    let todos = match std::env::args().nth(1) {
        Some(path) => {
            let options = BranchConfig::load(&path)
                .with_context(|| format!("Failed to load branch config from {path}"))?
                .into_options();
            StateBranch::new(todos::with_todo_logic(options))?
        }
        None => todos::branch()?,
    };
    let users = StateBranch::new(state_branch::BranchOptions::new("users"))?;

    let mut store = Store::new();
    store.register(&todos);
    store.register(&users);
    store.add_middleware(Box::new(LoggingMiddleware::new()));

    let action = todos.action();
    store.dispatch(action.call("create_todo", json!({"text": "buy milk"}), None)?)?;
    store.dispatch(action.call(
        "update_text",
        json!({"id": "1", "text": "write the demo"}),
        None,
    )?)?;
    store.dispatch(action.call(
        "change_priority",
        json!({"id": "1", "priority": "high"}),
        None,
    )?)?;

    if let Err(e) = action.call("change_priority", json!({"id": "1", "priority": "asap"}), None) {
        log::warn!("Rejected priority change: {}", e);
    }

    if let Some(first) = todos.select().by_id(store.state(), "1").cloned() {
        store.dispatch(action.call("toggle_done", first.into(), None)?)?;
    }
    store.dispatch(action.call("update_view_by_filter", json!("done"), None)?)?;
    store.dispatch(users.action().create(json!({"name": "Cookie Monster"}), None)?)?;

    println!("{}", serde_json::to_string_pretty(store.state())?);

    let visible = todos
        .select()
        .call("visible_todos", store.state(), &serde_json::Value::Null)?;
    println!("visible todos: {}", serde_json::to_string_pretty(&visible)?);

    store.dispatch(reset_all_branches())?;
    log::info!(
        "State after reset: {}",
        serde_json::to_string(store.state())?
    );

    Ok(())
}
