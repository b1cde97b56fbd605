use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver};

use serde::Serialize;
use serde_json::Value;

use crate::action::{Action, Dispatchable};
use crate::branch::StateBranch;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::middleware::Middleware;
use crate::reducer::BranchReducer;
use crate::selectors::StateTree;
use crate::state::BranchState;

/// Global state tree - one state per registered branch, keyed by branch name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AppState {
    branches: BTreeMap<String, BranchState>,
}

impl AppState {
    pub fn branch(&self, name: &str) -> Option<&BranchState> {
        self.branches.get(name)
    }

    pub fn branches(&self) -> &BTreeMap<String, BranchState> {
        &self.branches
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.branches
                .iter()
                .map(|(name, state)| (name.clone(), state.to_value()))
                .collect(),
        )
    }
}

impl StateTree for AppState {
    fn branch(&self, name: &str) -> Option<&BranchState> {
        AppState::branch(self, name)
    }
}

/// Store - holds the state tree and runs the dispatch loop
///
/// Every registered branch reducer sees every action, in registration order.
/// Actions pass the middleware chain first; anything queued on the
/// dispatcher meanwhile is processed right after.
pub struct Store {
    state: AppState,
    reducers: Vec<(String, BranchReducer)>,
    middleware: Vec<Box<dyn Middleware>>,
    dispatcher: Dispatcher,
    pending: Receiver<Dispatchable>,
}

impl Store {
    pub fn new() -> Self {
        let (action_tx, pending) = mpsc::channel();
        Self {
            state: AppState::default(),
            reducers: Vec::new(),
            middleware: Vec::new(),
            dispatcher: Dispatcher::new(action_tx),
            pending,
        }
    }

    /// Combine a branch into the root reducer, starting from its default state
    pub fn register(&mut self, branch: &StateBranch) {
        let name = branch.name().to_string();
        if let Some(slot) = self.reducers.iter_mut().find(|(n, _)| *n == name) {
            log::warn!("Branch '{}' registered twice, replacing reducer", name);
            slot.1 = branch.reducer().clone();
        } else {
            self.reducers.push((name.clone(), branch.reducer().clone()));
        }
        self.state
            .branches
            .insert(name, branch.default_state().clone());
    }

    /// Add middleware to the store
    pub fn add_middleware(&mut self, middleware: Box<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    /// Get the current state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Process an action (or thunk), then everything it queued
    ///
    /// Errors from thunks are returned as is; actions still queued stay
    /// pending for the next [`process_pending`](Self::process_pending).
    pub fn dispatch(&mut self, action: impl Into<Dispatchable>) -> Result<()> {
        self.process(action.into())?;
        self.process_pending()
    }

    /// Drain actions queued through the dispatcher, e.g. from other threads
    pub fn process_pending(&mut self) -> Result<()> {
        while let Ok(next) = self.pending.try_recv() {
            self.process(next)?;
        }
        Ok(())
    }

    fn process(&mut self, dispatchable: Dispatchable) -> Result<()> {
        match dispatchable {
            Dispatchable::Thunk(thunk) => thunk(&self.dispatcher),
            Dispatchable::Action(action) => {
                let mut should_reduce = true;

                // Pass through middleware chain
                for middleware in &mut self.middleware {
                    if !middleware.handle(&action, &self.state, &self.dispatcher) {
                        should_reduce = false;
                        break;
                    }
                }

                if should_reduce {
                    self.reduce(&action);
                }
                Ok(())
            }
        }
    }

    fn reduce(&mut self, action: &Action) {
        for (name, reducer) in &self.reducers {
            let current = self.state.branches.remove(name);
            let next = reducer.reduce(current, action);
            self.state.branches.insert(name.clone(), next);
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::reset_all_branches;
    use crate::branch::BranchOptions;
    use crate::error::BranchError;
    use crate::middleware::LoggingMiddleware;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn todos() -> StateBranch {
        StateBranch::new(
            BranchOptions::new("todos")
                .default_state(json!({"loading": false, "items": {}}))
                .generate_id(|| "new".to_string())
                .action("create_todo", |creators, payload, _suffix| {
                    let creators = creators.clone();
                    Ok(Dispatchable::thunk(move |dispatcher| {
                        dispatcher.dispatch(creators.set_meta(json!({"loading": true}), Some("loading"))?);
                        dispatcher.dispatch(creators.create(payload, None)?);
                        dispatcher.dispatch(creators.set_meta(json!({"loading": false}), Some("loading"))?);
                        Ok(())
                    }))
                }),
        )
        .unwrap()
    }

    fn users() -> StateBranch {
        StateBranch::new(BranchOptions::new("users")).unwrap()
    }

    /// Records the type of every action plus the `loading` flag at that moment
    struct Recorder(Arc<Mutex<Vec<(String, Value)>>>);

    impl Middleware for Recorder {
        fn handle(&mut self, action: &Action, state: &AppState, _dispatcher: &Dispatcher) -> bool {
            let loading = state
                .branch("todos")
                .and_then(|todos| todos.meta_value("loading"))
                .cloned()
                .unwrap_or(Value::Null);
            if let Ok(mut seen) = self.0.lock() {
                seen.push((action.action_type.clone(), loading));
            }
            true
        }
    }

    /// Swallows every action of one type
    struct Block(&'static str);

    impl Middleware for Block {
        fn handle(&mut self, action: &Action, _state: &AppState, _dispatcher: &Dispatcher) -> bool {
            action.dispatch_key() != self.0
        }
    }

    #[test]
    fn test_register_starts_from_default_state() {
        let mut store = Store::new();
        store.register(&todos());
        store.register(&users());

        assert_eq!(
            store.state().to_value(),
            json!({"todos": {"loading": false, "items": {}}, "users": {"items": {}}})
        );
    }

    #[test]
    fn test_dispatch_reaches_every_branch() {
        let todos = todos();
        let users = users();
        let mut store = Store::new();
        store.register(&todos);
        store.register(&users);

        store
            .dispatch(todos.action().create(json!({"text": "a"}), None).unwrap())
            .unwrap();
        store
            .dispatch(users.action().create(json!({"id": "u1"}), None).unwrap())
            .unwrap();

        assert_eq!(todos.select().all(store.state()).len(), 1);
        assert!(users.select().by_id(store.state(), "u1").is_some());
        assert!(todos.select().by_id(store.state(), "u1").is_none());

        store.dispatch(reset_all_branches()).unwrap();
        assert!(todos.select().all(store.state()).is_empty());
        assert!(users.select().all(store.state()).is_empty());
    }

    #[test]
    fn test_thunk_toggles_loading_around_create() {
        let todos = todos();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = Store::new();
        store.register(&todos);
        store.add_middleware(Box::new(LoggingMiddleware::new()));
        store.add_middleware(Box::new(Recorder(seen.clone())));

        let thunk = todos
            .action()
            .call("create_todo", json!({"text": "Write docs"}), None)
            .unwrap();
        store.dispatch(thunk).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("todos/SET_META/loading".to_string(), json!(false)),
                ("todos/CREATE".to_string(), json!(true)),
                ("todos/SET_META/loading".to_string(), json!(true)),
            ]
        );
        assert_eq!(
            todos.select().meta_fields(store.state()).unwrap()["loading"],
            json!(false)
        );
        assert_eq!(
            todos.select().by_id(store.state(), "new").unwrap()["text"],
            "Write docs"
        );
    }

    #[test]
    fn test_thunk_errors_propagate() {
        let todos = todos();
        let mut store = Store::new();
        store.register(&todos);

        let thunk = todos
            .action()
            .call("create_todo", json!(42), None)
            .unwrap();
        let result = store.dispatch(thunk);
        assert!(matches!(result, Err(BranchError::InvalidArgument(_))));
        assert_eq!(
            todos.select().meta_fields(store.state()).unwrap()["loading"],
            json!(false)
        );

        // the loading flag was queued before the failure
        store.process_pending().unwrap();
        assert_eq!(
            todos.select().meta_fields(store.state()).unwrap()["loading"],
            json!(true)
        );
    }

    #[test]
    fn test_middleware_can_consume_actions() {
        let todos = todos();
        let mut store = Store::new();
        store.register(&todos);
        store.add_middleware(Box::new(Block("todos/CREATE")));

        store
            .dispatch(todos.action().create((), None).unwrap())
            .unwrap();
        assert!(todos.select().all(store.state()).is_empty());

        store
            .dispatch(todos.action().set_meta(json!({"loading": true}), None).unwrap())
            .unwrap();
        assert_eq!(
            todos.select().meta_fields(store.state()).unwrap()["loading"],
            json!(true)
        );
    }

    #[test]
    fn test_actions_queued_from_other_threads() {
        let todos = todos();
        let mut store = Store::new();
        store.register(&todos);

        let dispatcher = store.dispatcher().clone();
        let action = todos.action().create(json!({"id": "remote"}), None).unwrap();
        std::thread::spawn(move || dispatcher.dispatch(action))
            .join()
            .unwrap();

        assert!(todos.select().by_id(store.state(), "remote").is_none());
        store.process_pending().unwrap();
        assert!(todos.select().by_id(store.state(), "remote").is_some());
    }

    #[test]
    fn test_register_twice_keeps_one_reducer() {
        let mut store = Store::new();
        store.register(&todos());
        store.register(&todos());
        assert_eq!(store.reducers.len(), 1);
        assert_eq!(store.state().branches().len(), 1);
    }
}
