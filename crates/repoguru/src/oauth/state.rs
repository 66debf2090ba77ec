//! Short-lived storage for the anti-CSRF state.

use std::sync::Mutex;

/// Holds at most one pending state value.
pub trait StateStore: Send + Sync {
    /// Replace any pending state.
    fn save(&self, state: &str);

    /// Remove and return the pending state.
    fn take(&self) -> Option<String>;

    /// The pending state, without removing it.
    fn peek(&self) -> Option<String>;
}

/// In-process [`StateStore`].
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<String>>,
}

impl StateStore for MemoryStateStore {
    fn save(&self, state: &str) {
        let mut slot = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(state.to_string());
    }

    fn take(&self) -> Option<String> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    fn peek(&self) -> Option<String> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_empties_the_store() {
        let store = MemoryStateStore::default();
        store.save("a");
        store.save("b");
        assert_eq!(store.peek().as_deref(), Some("b"));
        assert_eq!(store.take().as_deref(), Some("b"));
        assert_eq!(store.take(), None);
    }
}
