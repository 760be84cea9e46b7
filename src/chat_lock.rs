use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async lock per chat. Handlers and auto-advance tasks take it around
/// every read-modify-write of the stored session, so a delayed task cannot
/// overwrite what a handler stored in the meantime (or the other way round).
#[derive(Default)]
pub struct ChatLocks {
    locks: Mutex<HashMap<ChatId, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn acquire(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(chat_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_same_chat_is_serialized() {
        let locks = ChatLocks::default();
        let guard = locks.acquire(ChatId(1)).await;
        assert!(timeout(WAIT, locks.acquire(ChatId(1))).await.is_err());

        drop(guard);
        assert!(timeout(WAIT, locks.acquire(ChatId(1))).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_chats_are_not_blocked() {
        let locks = ChatLocks::default();
        let _guard = locks.acquire(ChatId(1)).await;
        assert!(timeout(WAIT, locks.acquire(ChatId(2))).await.is_ok());
    }

    #[tokio::test]
    async fn test_waiting_task_sees_the_earlier_write() {
        let locks = Arc::new(ChatLocks::default());
        let stored = Arc::new(Mutex::new(Vec::new()));

        let guard = locks.acquire(ChatId(7)).await;
        let waiter = {
            let (locks, stored) = (Arc::clone(&locks), Arc::clone(&stored));
            tokio::spawn(async move {
                let _guard = locks.acquire(ChatId(7)).await;
                let seen = stored.lock().await.len();
                stored.lock().await.push("advance");
                seen
            })
        };
        tokio::time::sleep(WAIT).await;
        stored.lock().await.push("answer");
        drop(guard);

        assert_eq!(waiter.await.unwrap(), 1);
        assert_eq!(*stored.lock().await, vec!["answer", "advance"]);
    }
}
