use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use shared::{
    domain::HomeState,
    protocol::{HomeEvent, StateTransition},
};
use tokio::sync::broadcast;
use tracing::debug;

const TRANSITION_BUFFER: usize = 64;

/// Shared handle to the one home state of the process.
///
/// Clones share the same state. Each event replaces a single field while the
/// lock is held, so concurrent writers to different fields never clobber each
/// other. Reads always hand out a copy.
#[derive(Clone)]
pub struct HomeStore {
    state: Arc<Mutex<HomeState>>,
    transitions: broadcast::Sender<StateTransition>,
}

impl Default for HomeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HomeStore {
    pub fn new() -> Self {
        Self::with_state(HomeState::default())
    }

    pub fn with_state(initial: HomeState) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);
        Self {
            state: Arc::new(Mutex::new(initial)),
            transitions,
        }
    }

    /// Applies `event` and notifies subscribers.
    ///
    /// Payloads are trusted as-is; callers build them from validated values.
    /// Returns `false` for event types the store does not recognize, which
    /// leave the state untouched and publish nothing.
    pub fn send(&self, event: HomeEvent) -> bool {
        let mut state = self.lock();
        if !reduce(&mut state, &event) {
            debug!(kind = event.kind(), "ignoring unrecognized home event");
            return false;
        }

        // Published under the lock so subscribers see transitions in apply order.
        let transition = StateTransition {
            event,
            state: state.clone(),
            at: Utc::now(),
        };
        let _ = self.transitions.send(transition);
        true
    }

    pub fn snapshot(&self) -> HomeState {
        self.lock().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateTransition> {
        self.transitions.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, HomeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The transition function. Returns whether `event` was recognized.
pub fn reduce(state: &mut HomeState, event: &HomeEvent) -> bool {
    match event {
        HomeEvent::SetColor { value } => {
            state.color = value.clone();
            true
        }
        HomeEvent::SetTemp { value } => {
            state.temp = *value;
            true
        }
        HomeEvent::Unknown => false,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
