use common::domain::BreachEvent;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Accepted breach notifications for the current session, in arrival order,
/// plus the event ids already seen so redeliveries can be dropped.
#[derive(Default)]
pub struct NotificationLog {
    state: RwLock<LogState>,
}

#[derive(Default)]
struct LogState {
    seen: HashSet<String>,
    history: Vec<BreachEvent>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the event unless its id was already seen. Returns true if appended.
    pub async fn record(&self, event: &BreachEvent) -> bool {
        let mut state = self.state.write().await;
        if !state.seen.insert(event.event_id.clone()) {
            return false;
        }
        state.history.push(event.clone());
        true
    }

    pub async fn history(&self) -> Vec<BreachEvent> {
        self.state.read().await.history.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.history.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Forget history and seen ids, starting a new session
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.seen.clear();
        state.history.clear();
    }
}
