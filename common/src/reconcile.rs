//! タグ差分計算
//!
//! 画像の現在のタグ集合とユーザーが編集したタグ集合から、
//! 追加すべきタグと削除すべきタグを求める。外部呼び出しは行わない。

use crate::error::Result;
use crate::types::{parse_tags, ImageRecord, Tag, TagSet};
use serde::{Deserialize, Serialize};

/// 論理削除に使う既定のタグ
pub const REMOVED_TAG: &str = "removed";

/// 差分計画
///
/// `to_add = proposed − current`, `to_delete = current − proposed`。
/// 集合差で作るため両者は常に互いに素。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    pub to_add: TagSet,
    pub to_delete: TagSet,
}

impl ReconciliationPlan {
    /// 画像レコードと編集後タグから計画を作成
    pub fn for_image(image: &ImageRecord, proposed: &TagSet) -> Self {
        plan(&image.tags, proposed)
    }

    /// 何も変更しない計画か
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_delete.is_empty()
    }

    /// 計画を現在のタグに適用した結果（外部呼び出し無し）
    pub fn project(&self, current: &TagSet) -> TagSet {
        current
            .difference(&self.to_delete)
            .chain(self.to_add.iter())
            .cloned()
            .collect()
    }
}

/// 差分計画を計算
pub fn plan(current: &TagSet, proposed: &TagSet) -> ReconciliationPlan {
    ReconciliationPlan {
        to_add: proposed.difference(current).cloned().collect(),
        to_delete: current.difference(proposed).cloned().collect(),
    }
}

/// 論理削除の計画（全タグを番兵タグ1つに置き換える）
pub fn removal_plan(current: &TagSet, sentinel: &Tag) -> ReconciliationPlan {
    let proposed = TagSet::from([sentinel.clone()]);
    plan(current, &proposed)
}

/// タグ編集欄の入力を集合に変換
pub fn parse_tag_input(text: &str) -> Result<TagSet> {
    Ok(parse_tags(text)?.into_iter().collect())
}

/// 編集欄の入力を集合に変換（画像に既に付いているタグはそのまま受け入れる）
///
/// hf側で登録された `-` 始まりのタグも、残す・消す操作はできるようにする。
pub fn parse_tag_input_for(text: &str, current: &TagSet) -> Result<TagSet> {
    text.split_whitespace()
        .map(|token| match current.get(token) {
            Some(existing) => Ok(existing.clone()),
            None => Tag::new(token),
        })
        .collect()
}

/// 既知の語彙に無い（新しく入力された）タグ
pub fn new_tags(proposed: &TagSet, vocabulary: &[Tag]) -> TagSet {
    proposed
        .iter()
        .filter(|t| !vocabulary.contains(t))
        .cloned()
        .collect()
}
