//! 設定管理
//!
//! 設定ファイルの読み込みと保存を提供します。形式（JSON / TOML）は
//! ファイルの拡張子から判定し、判定できない場合は JSON として扱います。

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// 設定エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O エラー
    #[error("設定の読み書き中にI/Oエラーが発生しました: {0}")]
    IoError(#[from] io::Error),

    /// JSON エラー
    #[error("JSONの解析に失敗しました: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML デシリアライズエラー
    #[error("TOMLの解析に失敗しました: {0}")]
    TomlDeError(#[from] toml::de::Error),

    /// TOML シリアライズエラー
    #[error("TOMLのシリアライズに失敗しました: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// 不正な設定値
    #[error("不正な設定値 '{key}': {message}")]
    InvalidValue {
        /// 設定キー
        key: String,
        /// 理由
        message: String,
    },
}

impl ConfigError {
    /// 不正な設定値エラーを作成
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// 設定形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON 形式
    Json,
    /// TOML 形式
    Toml,
}

impl Default for ConfigFormat {
    fn default() -> Self {
        ConfigFormat::Json
    }
}

impl ConfigFormat {
    /// ファイル拡張子から設定形式を判定
    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    /// 文字列を解析
    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> Result<T, ConfigError> {
        Ok(match self {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        })
    }

    /// 文字列に変換
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String, ConfigError> {
        Ok(match self {
            ConfigFormat::Json => serde_json::to_string_pretty(value)?,
            ConfigFormat::Toml => toml::to_string(value)?,
        })
    }
}

/// ファイルから設定を読み込み
pub fn load_from_file<T, P>(path: P) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let format = ConfigFormat::from_extension(path).unwrap_or_default();
    let content = fs::read_to_string(path)?;
    format.parse(&content)
}

/// ファイルから設定を読み込み（ファイルが無ければデフォルト値）
pub fn load_or_default<T, P>(path: P) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }
    load_from_file(path)
}

/// 設定をファイルに保存
pub fn save_to_file<T, P>(value: &T, path: P) -> Result<(), ConfigError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    // ディレクトリが存在することを確認
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let format = ConfigFormat::from_extension(path).unwrap_or_default();
    let content = format.render(value)?;
    fs::write(path, content)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::path::PathBuf;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        name: String,
        port: u16,
        enabled: bool,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                name: "relay".to_string(),
                port: 8000,
                enabled: false,
            }
        }
    }

    fn temp_path(file_name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("clipboard-relay-config-{}", std::process::id()))
            .join(file_name)
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension(Path::new("a.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension(Path::new("a.JSON")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension(Path::new("a.yaml")), None);
    }

    #[test]
    fn test_save_and_load_toml() {
        let path = temp_path("settings.toml");
        let value = Sample {
            name: "office".to_string(),
            port: 9443,
            enabled: true,
        };

        save_to_file(&value, &path).unwrap();
        let loaded: Sample = load_from_file(&path).unwrap();
        assert_eq!(loaded, value);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let sample: Sample = ConfigFormat::Json.parse(r#"{"port": 1234}"#).unwrap();
        assert_eq!(sample.port, 1234);
        assert_eq!(sample.name, "relay");
    }

    #[test]
    fn test_missing_file_yields_default() {
        let loaded: Sample = load_or_default(temp_path("does-not-exist.json")).unwrap();
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn test_invalid_content_is_reported() {
        let result: Result<Sample, _> = ConfigFormat::Toml.parse("port = \"many\"");
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }
}
