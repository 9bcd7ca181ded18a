//! 接続先エンドポイント
//!
//! ページのオリジン（スキームとホスト）からリレー用 WebSocket URL を構築します。
//! セキュアなオリジン（https）から読み込まれた場合のみ `wss` を使用します。

use url::Url;

use crate::error::{CommonError, Result};

/// リレーエンドポイントのパスとクエリ
pub const RELAY_PATH: &str = "/?ws";

/// ページのオリジン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// セキュアなスキームで読み込まれたか
    pub secure: bool,
    /// ホスト（ポートを含む）
    pub host: String,
}

impl Origin {
    /// 新しいオリジンを作成
    pub fn new(secure: bool, host: impl Into<String>) -> Self {
        Self {
            secure,
            host: host.into(),
        }
    }

    /// スキーム文字列とホストから作成
    ///
    /// ブラウザの `location.protocol` のように末尾の `:` は無視します。
    /// `https` 以外はすべて非セキュアとして扱います。
    pub fn from_scheme(scheme: &str, host: impl Into<String>) -> Self {
        let scheme = scheme.trim_end_matches(':');
        Self::new(scheme.eq_ignore_ascii_case("https"), host)
    }

    /// ページURLから作成
    pub fn parse(page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url)
            .map_err(|e| CommonError::InvalidParameterError(format!("無効なURL: {}: {}", page_url, e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| CommonError::InvalidParameterError(format!("ホストがありません: {}", page_url)))?;

        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self::from_scheme(url.scheme(), host))
    }

    /// WebSocket スキームを取得
    pub fn ws_scheme(&self) -> &'static str {
        if self.secure {
            "wss"
        } else {
            "ws"
        }
    }

    /// リレー用 WebSocket URL を構築
    pub fn relay_endpoint(&self) -> Result<Url> {
        let url_str = format!("{}://{}{}", self.ws_scheme(), self.host, RELAY_PATH);
        Url::parse(&url_str)
            .map_err(|e| CommonError::InvalidParameterError(format!("無効なURL: {}: {}", url_str, e)))
    }
}
