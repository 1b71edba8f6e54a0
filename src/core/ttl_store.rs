use crate::core::clock::SystemClock;
use crate::domain::ports::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Entry<T> {
    item: T,
    stored_at: Instant,
}

/// 在畫面之間暫存偵測結果的記憶體表，項目超過 TTL 即失效
///
/// 由呼叫端建立並持有，不是全域單例。過期的項目會在 `get` 時移除，
/// 或由 `spawn_sweeper` 啟動的背景工作定期清掉。
pub struct EphemeralStore<T, C: Clock = SystemClock> {
    entries: Mutex<HashMap<String, Entry<T>>>,
    ttl: Duration,
    clock: C,
}

impl<T: Clone> EphemeralStore<T, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<T: Clone> Default for EphemeralStore<T, SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<T: Clone, C: Clock> EphemeralStore<T, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn put(&self, item: T) -> String {
        let id = Uuid::new_v4().to_string();
        let stored_at = self.clock.now();
        self.lock().insert(id.clone(), Entry { item, stored_at });
        tracing::debug!("Stored ephemeral entry {}", id);
        id
    }

    pub fn get(&self, id: &str) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let expired = match entries.get(id) {
            Some(entry) => self.is_expired(entry, now),
            None => return None,
        };

        if expired {
            entries.remove(id);
            tracing::debug!("Ephemeral entry {} expired on read", id);
            return None;
        }

        entries.get(id).map(|entry| entry.item.clone())
    }

    pub fn del(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Removes every entry older than the TTL, read or not. Returns how many were purged.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!("Swept {} expired ephemeral entries", purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn is_expired(&self, entry: &Entry<T>, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) > self.ttl
    }

    // 持鎖期間不會 panic，中毒時直接沿用內部資料
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T, C> EphemeralStore<T, C>
where
    T: Clone + Send + 'static,
    C: Clock + 'static,
{
    /// 啟動定期清理；store 被釋放或 handle 被 drop 時停止
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> SweeperHandle {
        let store: Weak<Self> = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // 第一次 tick 立即完成
            interval.tick().await;
            loop {
                interval.tick().await;
                match store.upgrade() {
                    Some(store) => {
                        store.sweep();
                    }
                    None => break,
                }
            }
            tracing::debug!("Ephemeral store dropped, sweeper exiting");
        });

        SweeperHandle { task }
    }
}

pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
