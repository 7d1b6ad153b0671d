//! 表示インデックス計算
//!
//! ユーザーが指定する番号は1始まり。シャッフル時は
//! `(index + len / 2) % len` で決定的にずらす。

/// 指定番号を `[1, len]` に丸める（結果0件なら `None`）
pub fn clamp_index(index: usize, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(index.clamp(1, len))
    }
}

/// 表示番号を結果リストの位置（0始まり）に変換
///
/// # Examples
/// ```
/// use hf_serve_common::display_position;
///
/// assert_eq!(display_position(1, 10, false), Some(0));
/// assert_eq!(display_position(1, 10, true), Some(5));
/// assert_eq!(display_position(6, 10, true), Some(0));
/// ```
pub fn display_position(index: usize, len: usize, shuffle: bool) -> Option<usize> {
    let index = clamp_index(index, len)?;
    if shuffle {
        Some((index + len / 2) % len)
    } else {
        Some(index - 1)
    }
}
