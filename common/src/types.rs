//! カタログの型定義
//!
//! CLIと対話ブラウザで共有される型:
//! - Tag: 検証済みのタグ文字列
//! - ImageRecord: `hf show --json` の出力
//! - Filter: タグ検索条件（AND検索 + シャッフル）

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

lazy_static! {
    /// 入力用: 空白を含まず、`-` で始まらない（hfのオプションと誤認されない）
    static ref TAG_RE: Regex = Regex::new(r"^[^\s\-]\S*$").unwrap();
    /// hf出力用: 空白を含まないことだけを要求
    static ref STORED_TAG_RE: Regex = Regex::new(r"^\S+$").unwrap();
}

/// タグ
///
/// 大文字小文字を区別する。ユーザー入力は `Tag::new` で厳しく、
/// hfの出力（デシリアライズ含む）は `Tag::from_catalog` で緩く検証する。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

/// 画像1枚のタグ集合（順序は意味を持たない）
pub type TagSet = BTreeSet<Tag>;

impl Tag {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if TAG_RE.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidTag(value))
        }
    }

    /// hfに既に登録されているタグ（`-` 始まりも受け入れる）
    pub fn from_catalog(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if STORED_TAG_RE.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidTag(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Tag::from_catalog(value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl std::str::FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Tag::new(s)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 空白区切りのテキストをタグ列に変換（重複は先勝ちで除去）
pub fn parse_tags(text: &str) -> Result<Vec<Tag>> {
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for token in text.split_whitespace() {
        let tag = Tag::new(token)?;
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// タグ集合を空白区切りで表示
pub fn join_tags<'a>(tags: impl IntoIterator<Item = &'a Tag>) -> String {
    tags.into_iter()
        .map(Tag::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 画像参照（パスまたはURL）を検証
///
/// hfの引数として1要素で渡すため空白は許可するが、
/// 空文字・制御文字・`-` 始まりは拒否する。
pub fn validate_reference(reference: &str) -> Result<&str> {
    if reference.is_empty()
        || reference.starts_with('-')
        || reference.chars().any(char::is_control)
    {
        return Err(Error::InvalidReference(reference.to_string()));
    }
    Ok(reference)
}

/// `hf show --json` の出力
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: u64,

    /// 画像参照（出力に無ければ問い合わせた参照で補完される）
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: TagSet,

    /// キャプション（`caption` でも受け付ける）
    #[serde(default, alias = "caption", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// その他のフィールド（表示用にそのまま保持）
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<TagSet, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TagSet>::deserialize(deserializer)?.unwrap_or_default())
}

/// 検索条件
///
/// タグはAND条件。タグ無し + シャッフルは「全画像」を意味する。
/// 検索結果キャッシュのキーにもなる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filter {
    pub tags: Vec<Tag>,
    pub shuffle: bool,
}

impl Filter {
    pub fn new(tags: Vec<Tag>, shuffle: bool) -> Self {
        Self { tags, shuffle }
    }

    /// 入力テキストから検索条件を作成
    pub fn parse(text: &str, shuffle: bool) -> Result<Self> {
        Ok(Self::new(parse_tags(text)?, shuffle))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && !self.shuffle
    }

    /// タグ指定が無く全画像を対象とするか
    pub fn lists_all(&self) -> bool {
        self.tags.is_empty() && self.shuffle
    }

    /// 指定タグのいずれかを条件に含むか
    pub fn touches(&self, tags: &TagSet) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }

    /// 表示用ラベル
    pub fn label(&self) -> String {
        if self.tags.is_empty() {
            "random".to_string()
        } else {
            join_tags(&self.tags)
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
