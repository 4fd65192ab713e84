//! 搜尋鍵正規化。
//!
//! 建立快取時與解析查詢時都必須走同一個函式，兩邊的字元集合一旦不同，
//! 子字串比對就會悄悄失準。

use std::ops::RangeInclusive;

/// 韓文音節區塊 (가..힣)
pub const HANGUL_SYLLABLES: RangeInclusive<char> = '\u{AC00}'..='\u{D7A3}';

/// 是否為搜尋鍵保留的字元：ASCII 英數字或韓文音節
pub fn is_search_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || HANGUL_SYLLABLES.contains(&c)
}

/// 移除保留字元以外的所有字元，英文字母一律轉小寫。
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| is_search_char(*c))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// 缺值視為空字串
pub fn normalize_opt(s: Option<&str>) -> String {
    s.map(normalize).unwrap_or_default()
}
