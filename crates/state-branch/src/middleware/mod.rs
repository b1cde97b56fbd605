use crate::action::Action;
use crate::dispatcher::Dispatcher;
use crate::store::AppState;

pub mod logging;

pub use logging::LoggingMiddleware;

/// Middleware trait - intercepts actions before they reach the reducers
pub trait Middleware: Send {
    /// Handle an action
    ///
    /// - `action`: The action to process
    /// - `state`: Current state tree (read-only snapshot)
    /// - `dispatcher`: Use to dispatch actions that should re-enter the middleware chain
    ///
    /// Returns `true` to continue chain, `false` to consume action
    fn handle(&mut self, action: &Action, state: &AppState, dispatcher: &Dispatcher) -> bool;
}
