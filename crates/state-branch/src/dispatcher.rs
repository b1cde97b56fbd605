//! Dispatcher handed to middleware and thunks
//!
//! Anything dispatched here is queued and re-enters the store's full
//! middleware chain once the current dispatch has been reduced. Clones can be
//! moved to other threads; the store picks their actions up on its next
//! `process_pending` call.

use std::sync::mpsc::Sender;

use crate::action::Dispatchable;

/// Handle for queueing actions (or thunks) back into a store
#[derive(Clone)]
pub struct Dispatcher {
    action_tx: Sender<Dispatchable>,
}

impl Dispatcher {
    pub fn new(action_tx: Sender<Dispatchable>) -> Self {
        Self { action_tx }
    }

    /// Queue an action or thunk for processing
    pub fn dispatch(&self, action: impl Into<Dispatchable>) {
        if let Err(e) = self.action_tx.send(action.into()) {
            log::error!("Dispatcher: failed to send action: {}", e);
        }
    }
}
