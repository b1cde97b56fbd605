//! Named branches of a normalized state tree
//!
//! A [`StateBranch`] bundles everything one slice of application state needs:
//! namespaced action type constants, action creators for CRUD-style changes,
//! selectors over the global state and a reducer. Records live in an id-keyed
//! `items` collection next to free-form meta fields.
//!
//! This crate provides:
//! - Branch construction from code ([`BranchOptions`]) or TOML ([`BranchConfig`])
//! - Built-in and caller-registered actions and selectors, callable by name
//! - A small [`Store`] with middleware and thunk support for hosting branches

pub mod action;
pub mod actions;
pub mod branch;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod id;
pub mod item;
pub mod middleware;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod store;

pub use action::{Action, Dispatchable, Thunk, dispatch_key, make_type, reset_all_branches};
pub use actions::{ActionCreators, ActionFn, ActionSet, create_actions};
pub use branch::{BranchOptions, StateBranch, Utils};
pub use config::BranchConfig;
pub use constants::{Constants, Operation, RESET_ALL_BRANCHES};
pub use dispatcher::Dispatcher;
pub use error::{BranchError, Result};
pub use id::{GenerateId, RandomUuid, uuid_v4};
pub use item::{ID_KEY, IntoIds, IntoItems, IntoRecord, Item, item_id, merge_shallow};
pub use middleware::{LoggingMiddleware, Middleware};
pub use reducer::{BranchReducer, ExtensionReducer};
pub use selectors::{SelectorFn, SelectorSet, Selectors, StateTree, create_selectors};
pub use state::{BranchState, ITEMS_KEY};
pub use store::{AppState, Store};
