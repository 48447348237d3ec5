use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Tracks which file name a user is about to upload.
///
/// At most one pending upload exists per user; `begin` overwrites. Entries have no
/// expiry: an abandoned `upload` stays until overwritten or the process restarts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn begin(&self, user_id: &str, file_name: &str);
    async fn peek(&self, user_id: &str) -> Option<String>;
    /// Removes the pending entry, returning it if there was one.
    async fn consume(&self, user_id: &str) -> Option<String>;
    /// Removes the pending entry only while it still names `file_name`. A newer
    /// `begin` that landed in between is left in place. Returns whether it removed.
    async fn consume_if(&self, user_id: &str, file_name: &str) -> bool;
}

/// Process-local session table behind a single lock.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    pending: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn begin(&self, user_id: &str, file_name: &str) {
        let previous = self
            .pending
            .lock()
            .await
            .insert(user_id.to_string(), file_name.to_string());
        if let Some(previous) = previous {
            tracing::debug!(
                "Pending upload for {} replaced: {} -> {}",
                user_id,
                previous,
                file_name
            );
        }
    }

    async fn peek(&self, user_id: &str) -> Option<String> {
        self.pending.lock().await.get(user_id).cloned()
    }

    async fn consume(&self, user_id: &str) -> Option<String> {
        self.pending.lock().await.remove(user_id)
    }

    async fn consume_if(&self, user_id: &str, file_name: &str) -> bool {
        let mut pending = self.pending.lock().await;
        if pending.get(user_id).map(String::as_str) == Some(file_name) {
            pending.remove(user_id);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_begin_then_peek() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.peek("U1").await, None);

        store.begin("U1", "report").await;
        assert_eq!(store.peek("U1").await.as_deref(), Some("report"));
        // peek is non-destructive
        assert_eq!(store.peek("U1").await.as_deref(), Some("report"));
    }

    #[tokio::test]
    async fn test_second_begin_overwrites() {
        let store = InMemorySessionStore::new();
        store.begin("U1", "first").await;
        store.begin("U1", "second").await;
        assert_eq!(store.peek("U1").await.as_deref(), Some("second"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_consume_removes() {
        let store = InMemorySessionStore::new();
        store.begin("U1", "report").await;
        assert_eq!(store.consume("U1").await.as_deref(), Some("report"));
        assert_eq!(store.peek("U1").await, None);
        assert_eq!(store.consume("U1").await, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_consume_if_only_removes_matching_entry() {
        let store = InMemorySessionStore::new();
        store.begin("U1", "report").await;
        store.begin("U1", "other").await;

        assert!(!store.consume_if("U1", "report").await);
        assert_eq!(store.peek("U1").await.as_deref(), Some("other"));

        assert!(store.consume_if("U1", "other").await);
        assert_eq!(store.peek("U1").await, None);
        assert!(!store.consume_if("U1", "other").await);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = InMemorySessionStore::new();
        store.begin("U1", "a").await;
        store.begin("U2", "b").await;
        store.consume("U1").await;
        assert_eq!(store.peek("U2").await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_concurrent_begins_leave_one_entry_per_user() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.begin(&format!("U{}", i % 4), &format!("f{i}")).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.len().await, 4);
    }
}
