//! hf呼び出し結果キャッシュモジュール
//!
//! タグ語彙と検索結果を一定時間（TTL）保持し、
//! 画面更新のたびにhfを起動しないようにする。
//! 変更系の操作は影響するエントリを明示的に無効化する。

use hf_serve_common::{Filter, Tag, TagSet};
use log::debug;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// キャッシュエントリ
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, created_at: Instant, ttl: Duration) -> Self {
        Self { value, created_at, ttl }
    }

    /// `now - created_at < ttl` の間だけ有効
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }
}

/// TTL付きの汎用キャッシュ
///
/// 読み取りは共有ロックのみで互いにブロックしない。
/// 計算はロック外で行うため、同じキーの同時ミスでは二重に計算されうる。
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// 有効なエントリがあれば返す
    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        self.read()
            .get(key)
            .filter(|entry| entry.is_valid_at(now))
            .map(|entry| entry.value.clone())
    }

    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        self.write().insert(key, CacheEntry::new(value, now, self.ttl));
    }

    /// キャッシュにあれば返し、なければ計算して保存
    ///
    /// 計算が失敗した場合は何も保存しない。
    pub fn get_or_compute_at<E, F>(&self, key: &K, now: Instant, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get_at(key, now) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert_at(key.clone(), value.clone(), now);
        Ok(value)
    }

    pub fn get_or_compute<E, F>(&self, key: &K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        self.get_or_compute_at(key, Instant::now(), compute)
    }

    /// 有効なエントリの値をその場で書き換える（無ければ何もしない）
    pub fn update_at<F>(&self, key: &K, now: Instant, update: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut entries = self.write();
        match entries.get_mut(key) {
            Some(entry) if entry.is_valid_at(now) => {
                update(&mut entry.value);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&self, key: &K) -> bool {
        self.write().remove(key).is_some()
    }

    /// 条件に合うキーを削除し、削除件数を返す
    pub fn remove_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    /// 期限切れエントリを削除
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid_at(now));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// 保持件数（期限切れ含む）
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// hfの読み取り結果キャッシュ
///
/// - tags: タグ語彙（キーなし）
/// - search: 検索条件 → 画像参照リスト
#[derive(Debug)]
pub struct ResultCache {
    tags: TtlCache<(), Vec<Tag>>,
    search: TtlCache<Filter, Vec<String>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tags: TtlCache::new(ttl),
            search: TtlCache::new(ttl),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.tags.ttl()
    }

    pub fn tags_or_compute<E, F>(&self, compute: F) -> Result<Vec<Tag>, E>
    where
        F: FnOnce() -> Result<Vec<Tag>, E>,
    {
        self.tags_or_compute_at(Instant::now(), compute)
    }

    pub fn tags_or_compute_at<E, F>(&self, now: Instant, compute: F) -> Result<Vec<Tag>, E>
    where
        F: FnOnce() -> Result<Vec<Tag>, E>,
    {
        self.tags.get_or_compute_at(&(), now, || {
            debug!("cache miss: tags");
            compute()
        })
    }

    pub fn search_or_compute<E, F>(&self, filter: &Filter, compute: F) -> Result<Vec<String>, E>
    where
        F: FnOnce() -> Result<Vec<String>, E>,
    {
        self.search_or_compute_at(filter, Instant::now(), compute)
    }

    pub fn search_or_compute_at<E, F>(
        &self,
        filter: &Filter,
        now: Instant,
        compute: F,
    ) -> Result<Vec<String>, E>
    where
        F: FnOnce() -> Result<Vec<String>, E>,
    {
        self.search.get_or_compute_at(filter, now, || {
            debug!("cache miss: search `{}`", filter);
            compute()
        })
    }

    /// キャッシュ中の語彙（有効な場合のみ）
    pub fn cached_tags(&self) -> Option<Vec<Tag>> {
        self.tags.get_at(&(), Instant::now())
    }

    /// 新しく使われたタグを語彙に追記（TTL切れを待たない）
    ///
    /// 追記したタグ数を返す。語彙が未取得なら次回の取得に任せる。
    pub fn extend_vocabulary(&self, new_tags: &TagSet) -> usize {
        self.extend_vocabulary_at(new_tags, Instant::now())
    }

    pub fn extend_vocabulary_at(&self, new_tags: &TagSet, now: Instant) -> usize {
        let mut added = 0;
        self.tags.update_at(&(), now, |vocabulary| {
            for tag in new_tags {
                if !vocabulary.contains(tag) {
                    vocabulary.push(tag.clone());
                    added += 1;
                }
            }
        });
        if added > 0 {
            debug!("vocabulary extended by {} tag(s)", added);
        }
        added
    }

    pub fn invalidate_tags(&self) -> bool {
        self.tags.remove(&())
    }

    /// 指定タグのいずれかを条件に含む検索結果を破棄
    pub fn invalidate_search_touching(&self, tags: &TagSet) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let removed = self.search.remove_where(|filter| filter.touches(tags));
        if removed > 0 {
            debug!("invalidated {} search entr(ies)", removed);
        }
        removed
    }

    /// 全検索結果を破棄（画像削除時）
    pub fn invalidate_all_searches(&self) {
        self.search.clear();
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        self.tags.purge_expired_at(now) + self.search.purge_expired_at(now)
    }

    pub fn clear(&self) {
        self.tags.clear();
        self.search.clear();
    }

    pub fn len(&self) -> usize {
        self.tags.len() + self.search.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
