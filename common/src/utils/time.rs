//! 時間ユーティリティ
//!
//! 時間処理に関連するユーティリティ機能を提供します。

use chrono::{DateTime, Local, TimeZone};

/// クリップボードエントリの時刻表記（例: `Mon Jan  2 15:04:05 2006`）
pub const ENTRY_TIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// 日時をエントリ表記にフォーマット
pub fn format_entry_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format(ENTRY_TIME_FORMAT).to_string()
}

/// 現在時刻をエントリ表記で取得
pub fn now_entry_time() -> String {
    format_entry_time(&Local::now())
}
