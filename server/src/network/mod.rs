//! ネットワークモジュール
//!
//! クリップボードリレーサーバーのネットワーク通信機能を提供します。
//! クライアントからの接続を受け付け、メッセージの処理とブロードキャストを行います。

pub mod hub;
pub mod session;
pub mod websocket_server;

use std::net::SocketAddr;
use std::time::SystemTime;
use thiserror::Error;

/// ネットワークエラー
#[derive(Error, Debug)]
pub enum NetworkError {
    /// I/Oエラー
    #[error("I/Oエラー: {0}")]
    IoError(#[from] std::io::Error),

    /// 通信エラー
    #[error("通信エラー: {0}")]
    CommunicationError(String),

    /// TLSエラー
    #[error("TLSエラー: {0}")]
    TlsError(String),

    /// スレッドエラー
    #[error("スレッドエラー: {0}")]
    ThreadError(String),

    /// その他のエラー
    #[error("ネットワークエラー: {0}")]
    Other(String),
}

impl From<native_tls::Error> for NetworkError {
    fn from(e: native_tls::Error) -> Self {
        NetworkError::TlsError(e.to_string())
    }
}

/// ネットワークサーバー
pub trait NetworkServer {
    /// サーバーを起動
    fn start(&mut self) -> Result<(), NetworkError>;

    /// サーバーを停止
    fn stop(&mut self) -> Result<(), NetworkError>;

    /// サーバーが実行中かどうかを確認
    fn is_running(&self) -> bool;

    /// 接続されているクライアント数を取得
    fn connected_clients(&self) -> usize;

    /// アドレスを取得
    fn get_address(&self) -> Option<SocketAddr>;
}

/// セッション情報
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// セッションID
    pub id: String,
    /// IPアドレス
    pub ip_address: String,
    /// 接続日時
    pub connection_time: SystemTime,
    /// 最後のアクティビティ
    pub last_activity: SystemTime,
    /// 受信メッセージ数
    pub messages_received: u64,
    /// 送信メッセージ数
    pub messages_sent: u64,
}

impl SessionInfo {
    /// 新しいセッション情報を作成
    pub fn new(id: String, ip_address: String) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            ip_address,
            connection_time: now,
            last_activity: now,
            messages_received: 0,
            messages_sent: 0,
        }
    }

    /// アクティビティを更新
    pub fn update_activity(&mut self) {
        self.last_activity = SystemTime::now();
    }

    /// 接続時間を取得（秒）
    pub fn connection_duration(&self) -> u64 {
        self.connection_time
            .elapsed()
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
