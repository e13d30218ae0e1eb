use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

const STATE_TTL: Duration = Duration::from_secs(15 * 60);

/// Anti-forgery states issued for in-flight browser logins. Entries older
/// than fifteen minutes are swept lazily whenever the map is touched; a
/// state is consumed on its first successful callback match.
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingStates {
    states: Arc<Mutex<HashMap<String, Instant>>>,
}

impl PendingStates {
    pub(crate) async fn insert(&self, state: String) {
        let mut states = self.states.lock().await;
        states.retain(|_, created| created.elapsed() < STATE_TTL);
        states.insert(state, Instant::now());
    }

    pub(crate) async fn consume(&self, state: &str) -> bool {
        let mut states = self.states.lock().await;
        match states.remove(state) {
            Some(created) => created.elapsed() < STATE_TTL,
            None => false,
        }
    }
}
