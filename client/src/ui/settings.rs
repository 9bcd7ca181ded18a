//! クライアント設定
//!
//! ターミナルクライアントの設定を管理します。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use clipboard_relay_common::config::{self, ConfigError};
use clipboard_relay_common::utils::logging::LogLevel;
use clipboard_relay_common::Origin;

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// 接続先のオリジン（http または https）
    pub server_url: String,
    /// ログレベル
    pub log_level: String,
    /// ログファイル
    pub log_file: Option<PathBuf>,
    /// 確認を自動的に承認する
    pub assume_yes: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            log_level: LogLevel::default().as_str().to_string(),
            log_file: None,
            assume_yes: false,
        }
    }
}

impl AppSettings {
    /// 設定ファイルを読み込み（存在しなければデフォルト値）
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        config::load_or_default(path)
    }

    /// 設定ファイルに保存
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        config::save_to_file(self, path)
    }

    /// ログレベルを取得
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        LogLevel::from_str(&self.log_level)
            .ok_or_else(|| ConfigError::invalid("log_level", format!("不明なログレベル: {}", self.log_level)))
    }

    /// 接続先のオリジンを取得
    pub fn origin(&self) -> Result<Origin, ConfigError> {
        Origin::parse(&self.server_url).map_err(|e| ConfigError::invalid("server_url", e.to_string()))
    }

    /// リレー用 WebSocket URL を取得
    pub fn relay_endpoint(&self) -> Result<Url, ConfigError> {
        self.origin()?
            .relay_endpoint()
            .map_err(|e| ConfigError::invalid("server_url", e.to_string()))
    }

    /// 設定値を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level()?;
        self.origin()?;
        Ok(())
    }
}
