//! hfコマンド出力パーサー
//!
//! 標準出力の文字列を型付きの値に変換する。
//! プロセス起動や終了コードの扱いは呼び出し側の責務。

use crate::error::{Error, Result};
use crate::types::{ImageRecord, Tag};

/// `hf tags` の出力をパース
///
/// 空白区切りのタグ列。空出力はタグ0件として扱う。
///
/// # Examples
/// ```
/// use hf_serve_common::parse_tag_list;
///
/// let tags = parse_tag_list("cat\nred\n").unwrap();
/// assert_eq!(tags.len(), 2);
/// assert!(parse_tag_list("").unwrap().is_empty());
/// ```
pub fn parse_tag_list(stdout: &str) -> Result<Vec<Tag>> {
    stdout
        .split_whitespace()
        .map(|token| {
            Tag::from_catalog(token).map_err(|_| Error::Parse(format!("不正なタグ: {:?}", token)))
        })
        .collect()
}

/// `hf grep` / `hf cat` の出力をパース
///
/// 1行1画像参照。前後の空白を除去し、空行は捨てる。
pub fn parse_reference_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// `hf show --json` の出力をパース
///
/// # Returns
/// * `Ok(Some(record))` - パース成功
/// * `Ok(None)` - 空出力または `null`（未登録の画像）
/// * `Err` - JSONとして解釈できない
pub fn parse_detail(stdout: &str) -> Result<Option<ImageRecord>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|e| Error::Parse(format!("詳細JSONパースエラー: {}", e)))?;
    if value.is_null() {
        return Ok(None);
    }

    let record = serde_json::from_value(value)
        .map_err(|e| Error::Parse(format!("詳細JSONの形式が不正: {}", e)))?;
    Ok(Some(record))
}

/// 「未登録」を示すstderrの文言
///
/// `unknown option` のような使い方の誤りと区別するため、対象を含む語句に限る。
const UNKNOWN_OBJECT_PHRASES: [&str; 6] = [
    "not found",
    "unknown object",
    "unknown image",
    "no such object",
    "no such image",
    "no such file",
];

/// stderrの内容が「未登録」を示しているか
pub fn reports_unknown_object(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    UNKNOWN_OBJECT_PHRASES
        .iter()
        .any(|needle| lower.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_list() {
        let tags = parse_tag_list("cat red\nblue\n\n").unwrap();
        let names: Vec<&str> = tags.iter().map(Tag::as_str).collect();
        assert_eq!(names, vec!["cat", "red", "blue"]);
    }

    #[test]
    fn test_parse_tag_list_empty() {
        assert!(parse_tag_list("").unwrap().is_empty());
        assert!(parse_tag_list(" \n ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tag_list_keeps_dash_tag() {
        let tags = parse_tag_list("cat\n-1\nred\n").unwrap();
        let names: Vec<&str> = tags.iter().map(Tag::as_str).collect();
        assert_eq!(names, vec!["cat", "-1", "red"]);
    }

    #[test]
    fn test_parse_reference_lines() {
        let refs = parse_reference_lines("/a.jpg\n\n  /b c.png  \n\n");
        assert_eq!(refs, vec!["/a.jpg".to_string(), "/b c.png".to_string()]);
        assert!(parse_reference_lines("").is_empty());
    }

    #[test]
    fn test_parse_detail() {
        let record = parse_detail(r#"{"id": 12, "tags": ["cat"]}"#).unwrap().unwrap();
        assert_eq!(record.id, 12);
        assert_eq!(record.tags.len(), 1);
    }

    #[test]
    fn test_parse_detail_absent() {
        assert!(parse_detail("").unwrap().is_none());
        assert!(parse_detail("null\n").unwrap().is_none());
    }

    #[test]
    fn test_parse_detail_malformed() {
        assert!(matches!(parse_detail("{broken"), Err(Error::Parse(_))));
        assert!(matches!(parse_detail(r#"{"tags": []}"#), Err(Error::Parse(_))));
        assert!(matches!(parse_detail("[1, 2]"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_reports_unknown_object() {
        assert!(reports_unknown_object("Error: object Not Found"));
        assert!(reports_unknown_object("unknown object: x.jpg"));
        assert!(reports_unknown_object("No such file"));
        assert!(!reports_unknown_object("permission denied"));
        assert!(!reports_unknown_object("error: unknown option '--json'"));
        assert!(!reports_unknown_object("unknown command: show"));
    }
}
