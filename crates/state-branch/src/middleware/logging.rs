use crate::action::Action;
use crate::dispatcher::Dispatcher;
use crate::middleware::Middleware;
use crate::store::AppState;

/// LoggingMiddleware - logs all actions passing through
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn handle(&mut self, action: &Action, _state: &AppState, _dispatcher: &Dispatcher) -> bool {
        match action.suffix() {
            Some(suffix) => log::debug!(
                "Action: {} [{}] ({} item(s))",
                action.dispatch_key(),
                suffix,
                action.items.len()
            ),
            None => log::debug!(
                "Action: {} ({} item(s))",
                action.action_type,
                action.items.len()
            ),
        }

        true // Always pass action through
    }
}
