//! ユーティリティモジュール
//!
//! 各種ユーティリティ機能を提供します。

#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod time;

/// パス関連のユーティリティ
#[cfg(feature = "native")]
pub mod path {
    use std::path::PathBuf;

    /// アプリケーションディレクトリ名
    const APP_DIR_NAME: &str = "clipboard-relay-rs";

    /// 設定ディレクトリを取得
    pub fn get_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }
}

/// 文字列関連のユーティリティ
pub mod string {
    /// 文字列を安全に切り詰める
    pub fn truncate_str(s: &str, max_chars: usize) -> String {
        if s.chars().count() <= max_chars {
            return s.to_string();
        }

        let mut result: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        result.push_str("...");
        result
    }

    /// 複数行の文字列をエスケープする
    pub fn escape_multiline(s: &str) -> String {
        s.replace('\n', "\\n").replace('\r', "\\r")
    }
}
