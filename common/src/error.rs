//! エラー型定義
//!
//! クリップボードリレーで使用する共通エラー型を定義します。

use std::io;
use thiserror::Error;

/// 共通エラー
#[derive(Error, Debug)]
pub enum CommonError {
    /// 入出力エラー
    #[error("I/Oエラー: {0}")]
    IoError(#[from] io::Error),

    /// シリアライズエラー
    #[error("シリアライズエラー: {0}")]
    SerializeError(String),

    /// デシリアライズエラー
    #[error("デシリアライズエラー: {0}")]
    DeserializeError(String),

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    NetworkError(String),

    /// 接続が開いていない
    #[error("接続が開いていません")]
    NotConnected,

    /// 無効なパラメータ
    #[error("無効なパラメータ: {0}")]
    InvalidParameterError(String),
}

impl CommonError {
    /// 接続レベルのエラーかどうか
    ///
    /// 接続レベルのエラーはセッション内で回復できません。
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            CommonError::NetworkError(_) | CommonError::NotConnected | CommonError::IoError(_)
        )
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            CommonError::IoError(err.into())
        } else {
            CommonError::DeserializeError(err.to_string())
        }
    }
}

/// 結果型のエイリアス
pub type Result<T> = std::result::Result<T, CommonError>;
