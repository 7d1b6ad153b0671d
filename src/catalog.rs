//! UI向けのカタログ操作
//!
//! hfゲートウェイ・結果キャッシュ・タグ差分適用をまとめ、
//! `list_tags` / `search` / `get_detail` / `reconcile_and_apply` /
//! `remove` / `delete` を提供する。

use crate::cache::ResultCache;
use crate::error::{HfServeError, Result};
use crate::gateway::CatalogGateway;
use crate::reconciler::{apply_plan, Outcome};
use hf_serve_common::{
    new_tags, removal_plan, validate_reference, Filter, ImageRecord, ReconciliationPlan, Tag,
    TagSet, REMOVED_TAG,
};
use log::{info, warn};
use serde::Serialize;
use std::time::Duration;

/// タグ編集の結果
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub reference: String,
    pub plan: ReconciliationPlan,
    pub outcome: Outcome,
    /// 語彙に無かった（新規に入力された）タグ
    pub new_tags: TagSet,
    /// 適用後に取り直した詳細（何も実行しなかった場合は適用前のまま）
    pub detail: Option<ImageRecord>,
    /// 取り直しに失敗した場合の警告（`detail` は適用結果から推定した値）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// カタログ操作
pub struct Catalog<G> {
    gateway: G,
    cache: ResultCache,
    removed_tag: Tag,
}

impl<G: CatalogGateway> Catalog<G> {
    pub fn new(gateway: G, cache_ttl: Duration) -> Self {
        let removed_tag = Tag::new(REMOVED_TAG).expect("REMOVED_TAG is a valid tag");
        Self {
            gateway,
            cache: ResultCache::new(cache_ttl),
            removed_tag,
        }
    }

    pub fn with_removed_tag(mut self, tag: Tag) -> Self {
        self.removed_tag = tag;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn removed_tag(&self) -> &Tag {
        &self.removed_tag
    }

    /// タグ語彙（キャッシュ経由）
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        self.cache.tags_or_compute(|| self.gateway.list_all_tags())
    }

    /// 検索（キャッシュ経由）
    ///
    /// 空の条件はhfを呼ばずに0件。タグ無し + シャッフルは全画像。
    pub fn search(&self, filter: &Filter) -> Result<Vec<String>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }
        self.cache.search_or_compute(filter, || {
            if filter.lists_all() {
                self.gateway.list_all_images()
            } else {
                self.gateway.search_by_tags(&filter.tags)
            }
        })
    }

    /// 画像の詳細（キャッシュしない）
    pub fn get_detail(&self, reference: &str) -> Result<ImageRecord> {
        validate_reference(reference)?;
        self.gateway
            .get_detail(reference)?
            .ok_or_else(|| HfServeError::NotFound(reference.to_string()))
    }

    /// 詳細を取り、差分を計算して適用
    pub fn reconcile_and_apply(&self, reference: &str, proposed: &TagSet) -> Result<ReconcileReport> {
        let current = self.get_detail(reference)?;
        let plan = ReconciliationPlan::for_image(&current, proposed);
        self.apply(reference, current, plan)
    }

    /// 論理削除（全タグを `removed` に置き換える）
    pub fn remove(&self, reference: &str) -> Result<ReconcileReport> {
        let current = self.get_detail(reference)?;
        let plan = removal_plan(&current.tags, &self.removed_tag);
        self.apply(reference, current, plan)
    }

    /// 完全削除
    ///
    /// 削除済みの画像に対するエラーも呼び出し側へ返すだけで、セッションは継続できる。
    pub fn delete(&self, reference: &str) -> Result<()> {
        match self.gateway.delete_image(reference) {
            Ok(()) => {
                info!("deleted {}", reference);
                self.cache.invalidate_all_searches();
                Ok(())
            }
            Err(e) => {
                warn!("delete {} failed: {}", reference, e);
                Err(e)
            }
        }
    }

    fn apply(
        &self,
        reference: &str,
        current: ImageRecord,
        plan: ReconciliationPlan,
    ) -> Result<ReconcileReport> {
        let fresh = match self.cache.cached_tags() {
            Some(vocabulary) => new_tags(&plan.to_add, &vocabulary),
            None => TagSet::new(),
        };

        if plan.is_empty() {
            return Ok(ReconcileReport {
                reference: reference.to_string(),
                plan,
                outcome: Outcome::noop(),
                new_tags: fresh,
                detail: Some(current),
                warning: None,
            });
        }

        let outcome = apply_plan(&self.gateway, current.id, &plan);
        self.invalidate_after(&outcome);

        // 反映後の状態を取り直す（失敗しても編集結果は返す）
        let (detail, warning) = match self.gateway.get_detail(reference) {
            Ok(detail) => (detail, None),
            Err(e) => {
                warn!("re-fetch {} failed: {}", reference, e);
                let tags = outcome.project(&current.tags);
                let projected = ImageRecord { tags, ..current };
                (Some(projected), Some(format!("詳細を取り直せませんでした: {}", e)))
            }
        };

        Ok(ReconcileReport {
            reference: reference.to_string(),
            plan,
            outcome,
            new_tags: fresh,
            detail,
            warning,
        })
    }

    fn invalidate_after(&self, outcome: &Outcome) {
        if let Some(added) = outcome.add.applied_tags() {
            self.cache.extend_vocabulary(added);
            self.cache.invalidate_search_touching(added);
        }
        if let Some(deleted) = outcome.delete.applied_tags() {
            self.cache.invalidate_search_touching(deleted);
        }
    }
}
