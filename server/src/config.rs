//! サーバー設定
//!
//! サーバーの設定情報を管理するモジュール

use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};

use clipboard_relay_common::config::{self, ConfigError};
use clipboard_relay_common::utils::logging::LogLevel;

/// 既定の最大メッセージサイズ（バイト）
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 8_000_000;

/// サーバー設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// ネットワーク設定
    pub network: NetworkSettings,
    /// 機能設定
    pub features: FeatureSettings,
    /// ログ設定
    pub logging: LoggingSettings,
}

/// ネットワーク設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// バインドアドレス
    pub bind_address: String,
    /// ポート番号
    pub port: u16,
    /// TLS使用フラグ
    pub use_tls: bool,
    /// TLSアイデンティティ（PKCS#12）のパス
    pub tls_identity_path: Option<PathBuf>,
    /// TLSアイデンティティのパスワード
    pub tls_identity_password: String,
    /// 最大接続数
    pub max_connections: usize,
    /// 最大メッセージサイズ（バイト）
    pub max_message_size: usize,
}

/// 機能設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    /// ブラウザからのコマンド実行を許可するか
    pub cli_enabled: bool,
}

/// ログ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// ログレベル
    pub level: String,
    /// ログファイル
    pub file: Option<PathBuf>,
}

impl NetworkSettings {
    /// バインド先アドレス文字列
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            use_tls: false,
            tls_identity_path: None,
            tls_identity_password: String::new(),
            max_connections: 64,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default().as_str().to_string(),
            file: None,
        }
    }
}

impl LoggingSettings {
    /// ログレベルを取得
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        LogLevel::from_str(&self.level)
            .ok_or_else(|| ConfigError::invalid("logging.level", format!("不明なログレベル: {}", self.level)))
    }
}

impl ServerSettings {
    /// 設定ファイルを読み込み（存在しなければデフォルト値）
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings: Self = config::load_or_default(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 設定ファイルに保存
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        config::save_to_file(self, path)
    }

    /// 設定値を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.bind_address.trim().is_empty() {
            return Err(ConfigError::invalid("network.bind_address", "空にはできません"));
        }
        if self.network.max_connections == 0 {
            return Err(ConfigError::invalid("network.max_connections", "1以上を指定してください"));
        }
        if self.network.max_message_size == 0 {
            return Err(ConfigError::invalid("network.max_message_size", "1以上を指定してください"));
        }
        if self.network.use_tls && self.network.tls_identity_path.is_none() {
            return Err(ConfigError::invalid(
                "network.tls_identity_path",
                "TLSを使用するにはPKCS#12アイデンティティが必要です",
            ));
        }
        self.logging.log_level()?;
        Ok(())
    }
}
