use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::CacheStats;

struct Entry<V> {
    value: V,
    last_access: Instant,
}

/// 按最后访问时间过期的线程安全缓存
///
/// 所有读写都在同一把锁内完成。未命中时的重建（`get_or_try_insert_with`
/// 的 `init`）在锁外执行，同一个键的并发未命中会各自重建，以后写入者为准。
///
/// 过期判断基于 [`tokio::time::Instant`]，测试中可以用
/// `tokio::time::pause()` 控制时间。
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // 持锁方从不在锁内 panic，中毒时直接取回数据
    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 命中时刷新最后访问时间；已过期的条目视为未命中并移除
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();

        let expired = match entries.get_mut(key) {
            Some(entry) if now.duration_since(entry.last_access) <= self.ttl => {
                entry.last_access = now;
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        let entry = Entry {
            value,
            last_access: Instant::now(),
        };
        self.lock().insert(key, entry);
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key).map(|entry| entry.value)
    }

    /// 移除所有超过存活时间未被访问的条目，返回移除数量
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut entries = self.lock();

        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_access) <= ttl);
        let evicted = before - entries.len();

        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
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

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// 读取缓存，未命中时调用 `init` 构建并写入
    ///
    /// `init` 失败时不写入缓存，错误原样返回。
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = init().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}
