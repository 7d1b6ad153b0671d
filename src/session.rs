//! ブラウズセッションの状態
//!
//! `NoFilter → HasFilter → ShowingResults → ShowingDetail` の状態遷移を管理する。
//! 状態が変わるたびに `dirty` を立て、UI側は `take_dirty` で再描画を判断する。

use crate::catalog::{Catalog, ReconcileReport};
use crate::error::{HfServeError, Result};
use crate::gateway::CatalogGateway;
use hf_serve_common::{clamp_index, display_position, Filter, ImageRecord, TagSet};
use log::debug;

/// 表示状態
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    NoFilter,
    HasFilter(Filter),
    ShowingResults {
        filter: Filter,
        results: Vec<String>,
    },
    ShowingDetail {
        filter: Filter,
        results: Vec<String>,
        /// 1始まりの表示番号
        index: usize,
        reference: String,
        /// `None` は未登録の画像
        detail: Option<ImageRecord>,
    },
}

impl ViewState {
    pub fn filter(&self) -> Option<&Filter> {
        match self {
            ViewState::NoFilter => None,
            ViewState::HasFilter(filter)
            | ViewState::ShowingResults { filter, .. }
            | ViewState::ShowingDetail { filter, .. } => Some(filter),
        }
    }

    pub fn results(&self) -> Option<&[String]> {
        match self {
            ViewState::ShowingResults { results, .. } | ViewState::ShowingDetail { results, .. } => {
                Some(results.as_slice())
            }
            _ => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            ViewState::ShowingDetail { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            ViewState::ShowingDetail { reference, .. } => Some(reference.as_str()),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&ImageRecord> {
        match self {
            ViewState::ShowingDetail { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    /// 検索済みで0件
    pub fn has_no_results(&self) -> bool {
        self.results().map(|r| r.is_empty()).unwrap_or(false)
    }
}

/// 1ユーザー分のブラウズセッション
#[derive(Debug, Default)]
pub struct Session {
    state: ViewState,
    dirty: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// 再描画が必要か（読み取ると下ろす）
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn transition(&mut self, state: ViewState) {
        self.state = state;
        self.dirty = true;
    }

    /// 検索条件を設定
    ///
    /// 同じ条件なら何もしない。条件が変わると結果は捨てて取り直し待ちにする。
    pub fn set_filter(&mut self, filter: Filter) {
        if filter.is_empty() {
            if self.state != ViewState::NoFilter {
                self.transition(ViewState::NoFilter);
            }
            return;
        }
        if self.state.filter() == Some(&filter) {
            return;
        }
        debug!("filter changed: {}", filter);
        self.transition(ViewState::HasFilter(filter));
    }

    /// 検索結果を取得（`HasFilter → ShowingResults`）
    ///
    /// 既に結果がある場合はそのまま。0件も正常な状態。
    pub fn refresh<G: CatalogGateway>(&mut self, catalog: &Catalog<G>) -> Result<&[String]> {
        if let ViewState::HasFilter(filter) = &self.state {
            let filter = filter.clone();
            let results = catalog.search(&filter)?;
            debug!("{} result(s) for `{}`", results.len(), filter);
            self.transition(ViewState::ShowingResults { filter, results });
        }
        self.state.results().ok_or(HfServeError::EmptyFilter)
    }

    /// 表示番号を選んで詳細を取得（`ShowingResults → ShowingDetail`）
    ///
    /// 番号は `[1, 件数]` に丸める。0件なら詳細は取得せず `None`。
    pub fn select<G: CatalogGateway>(
        &mut self,
        index: usize,
        catalog: &Catalog<G>,
    ) -> Result<Option<&ImageRecord>> {
        self.refresh(catalog)?;

        let (filter, results) = match &self.state {
            ViewState::ShowingResults { filter, results }
            | ViewState::ShowingDetail { filter, results, .. } => (filter.clone(), results.clone()),
            _ => return Err(HfServeError::EmptyFilter),
        };

        let Some(index) = clamp_index(index, results.len()) else {
            return Ok(None);
        };
        let Some(position) = display_position(index, results.len(), filter.shuffle) else {
            return Ok(None);
        };
        let reference = results[position].clone();

        let detail = match catalog.get_detail(&reference) {
            Ok(detail) => Some(detail),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        self.transition(ViewState::ShowingDetail {
            filter,
            results,
            index,
            reference,
            detail,
        });
        Ok(self.state.detail())
    }

    pub fn next<G: CatalogGateway>(&mut self, catalog: &Catalog<G>) -> Result<Option<&ImageRecord>> {
        let index = self.state.index().map(|i| i + 1).unwrap_or(1);
        self.select(index, catalog)
    }

    pub fn prev<G: CatalogGateway>(&mut self, catalog: &Catalog<G>) -> Result<Option<&ImageRecord>> {
        let index = self.state.index().map(|i| i.saturating_sub(1)).unwrap_or(1);
        self.select(index, catalog)
    }

    fn current_reference(&self) -> Result<String> {
        self.state
            .reference()
            .map(str::to_string)
            .ok_or_else(|| HfServeError::NotFound("表示中の画像がありません".into()))
    }

    /// 表示中の画像のタグを編集し、詳細を取り直す
    ///
    /// 結果リストは次に条件が変わるまで更新しない。
    pub fn edit_tags<G: CatalogGateway>(
        &mut self,
        proposed: &TagSet,
        catalog: &Catalog<G>,
    ) -> Result<ReconcileReport> {
        let reference = self.current_reference()?;
        let report = catalog.reconcile_and_apply(&reference, proposed)?;
        self.replace_detail(report.detail.clone());
        Ok(report)
    }

    /// 表示中の画像を論理削除
    pub fn remove_current<G: CatalogGateway>(&mut self, catalog: &Catalog<G>) -> Result<ReconcileReport> {
        let reference = self.current_reference()?;
        let report = catalog.remove(&reference)?;
        self.replace_detail(report.detail.clone());
        Ok(report)
    }

    /// 表示中の画像を完全削除し、結果リストから外す
    pub fn delete_current<G: CatalogGateway>(&mut self, catalog: &Catalog<G>) -> Result<()> {
        let reference = self.current_reference()?;
        catalog.delete(&reference)?;

        if let ViewState::ShowingDetail { filter, results, .. } = &self.state {
            let filter = filter.clone();
            let results: Vec<String> = results.iter().filter(|r| **r != reference).cloned().collect();
            self.transition(ViewState::ShowingResults { filter, results });
        }
        Ok(())
    }

    fn replace_detail(&mut self, fresh: Option<ImageRecord>) {
        if let ViewState::ShowingDetail { detail, .. } = &mut self.state {
            *detail = fresh;
            self.dirty = true;
        }
    }
}
