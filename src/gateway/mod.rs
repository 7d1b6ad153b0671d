//! 外部カタログ（hfコマンド）とのやり取り
//!
//! すべての操作は同期的で、呼び出し中はスレッドをブロックする。

mod hf_cli;

pub use hf_cli::HfCli;

use crate::error::Result;
use hf_serve_common::{ImageRecord, Tag, TagSet};

/// 外部カタログへの操作
///
/// 実装は状態を持たない（設定値のみ）。テストではメモリ上の偽実装に差し替える。
pub trait CatalogGateway {
    /// 全タグ（語彙）。0件は空Vec
    fn list_all_tags(&self) -> Result<Vec<Tag>>;

    /// タグのAND検索。0件は空Vec
    fn search_by_tags(&self, tags: &[Tag]) -> Result<Vec<String>>;

    /// 全画像の一覧
    fn list_all_images(&self) -> Result<Vec<String>>;

    /// 画像の詳細。未登録なら `None`
    fn get_detail(&self, reference: &str) -> Result<Option<ImageRecord>>;

    /// タグ追加。空集合なら何もしない
    fn apply_add(&self, id: u64, tags: &TagSet) -> Result<()>;

    /// タグ削除。空集合なら何もしない
    fn apply_delete(&self, id: u64, tags: &TagSet) -> Result<()>;

    /// 画像の完全削除
    fn delete_image(&self, reference: &str) -> Result<()>;
}
