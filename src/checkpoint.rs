//! Process-lifetime conversation memory keyed by thread id.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::ai_sdk::ChatMessage;

pub type ThreadHistory = Arc<Mutex<Vec<ChatMessage>>>;

/// In-memory checkpoint store. Nothing survives a restart.
#[derive(Default)]
pub struct MemorySaver {
    threads: Mutex<HashMap<String, ThreadHistory>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the history for `thread_id`, creating an empty one on first use.
    pub async fn thread(&self, thread_id: &str) -> ThreadHistory {
        let mut threads = self.threads.lock().await;
        Arc::clone(threads.entry(thread_id.to_string()).or_default())
    }

    pub async fn thread_count(&self) -> usize {
        self.threads.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn threads_are_created_lazily_and_shared() {
        let saver = MemorySaver::new();
        assert_eq!(saver.thread_count().await, 0);

        let first = saver.thread("thread-1").await;
        first.lock().await.push(ChatMessage::user("hello"));

        let again = saver.thread("thread-1").await;
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.lock().await.len(), 1);

        let other = saver.thread("thread-2").await;
        assert!(other.lock().await.is_empty());
        assert_eq!(saver.thread_count().await, 2);
    }

    #[tokio::test]
    async fn a_new_store_forgets_everything() {
        let saver = MemorySaver::new();
        saver
            .thread("thread-1")
            .await
            .lock()
            .await
            .push(ChatMessage::user("remember me"));

        let restarted = MemorySaver::new();
        assert!(restarted.thread("thread-1").await.lock().await.is_empty());
    }
}
