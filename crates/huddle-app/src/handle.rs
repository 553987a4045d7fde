//! Shared handle to the application state.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use crate::{action::StateAction, app::AppState};

/// Shared, atomically-mutated handle to [`AppState`].
///
/// The state is the only shared mutable resource in the engine. Every
/// mutation goes through [`StateHandle::dispatch`] (or its guarded
/// variant), which applies exactly one action under the lock; no action
/// ever interleaves with another mid-apply. Reads run under the same lock
/// through [`StateHandle::read`].
///
/// Clones share the same state. The lock is never held across an await
/// point.
#[derive(Clone, Default)]
pub struct StateHandle {
    inner: Arc<Mutex<AppState>>,
}

impl StateHandle {
    /// Fresh signed-out state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action.
    pub fn dispatch(&self, action: StateAction) {
        self.lock().apply(action);
    }

    /// Apply one action only if `generation` still equals `expected`.
    ///
    /// The teardown guard for retired subscriptions: a context bumps its
    /// generation counter before dispatching the superseding action, so a
    /// late callback carrying an older generation observes the bump here
    /// (the atomic load happens under the same lock its superseder went
    /// through) and is dropped. Returns whether the action was applied.
    pub fn dispatch_guarded(
        &self,
        generation: &AtomicU64,
        expected: u64,
        action: StateAction,
    ) -> bool {
        let mut state = self.lock();
        if generation.load(Ordering::SeqCst) != expected {
            return false;
        }
        state.apply(action);
        true
    }

    /// Read the state through a closure.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        // A poisoned state is still structurally valid; recover it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use huddle_core::DocId;

    use super::*;
    use crate::state::ConversationId;

    #[test]
    fn guarded_dispatch_drops_stale_generations() {
        let handle = StateHandle::new();
        let generation = AtomicU64::new(1);

        let conversation = ConversationId::Channel(DocId::new("c1"));
        assert!(handle.dispatch_guarded(
            &generation,
            1,
            StateAction::SelectConversation(conversation.clone()),
        ));

        generation.store(2, Ordering::SeqCst);
        assert!(!handle.dispatch_guarded(&generation, 1, StateAction::ClearConversation));

        assert_eq!(handle.read(|s| s.current_conversation().cloned()), Some(conversation));
    }
}
