//! ネットワークモジュール
//!
//! リレーサーバーとの通信を担当する機能を提供します。

mod websocket_client;

pub use websocket_client::WebSocketClient;

use clipboard_relay_common::Transport;
use thiserror::Error;
use std::io;

/// ネットワークエラー
#[derive(Error, Debug)]
pub enum NetworkError {
    /// 接続エラー
    #[error("接続エラー: {0}")]
    ConnectionError(String),

    /// 接続がサーバーにより閉じられた
    #[error("サーバーにより接続が閉じられました")]
    ConnectionClosed,

    /// IO エラー
    #[error("IO エラー: {0}")]
    IoError(#[from] io::Error),

    /// プロトコルエラー
    #[error("プロトコルエラー: {0}")]
    ProtocolError(String),

    /// その他のエラー
    #[error("ネットワークエラー: {0}")]
    Other(String),
}

/// ネットワークインターフェース
///
/// リレーの送信路に加え、受信フレームのポーリングを提供します。
pub trait NetworkClient: Transport {
    /// 受信フレームを1つ取得（ポーリング間隔内に無ければ `None`）
    fn poll_frame(&mut self) -> Result<Option<String>, NetworkError>;

    /// サーバーから切断
    fn disconnect(&mut self) -> Result<(), NetworkError>;

    /// サーバーに接続されているかどうかを確認
    fn is_connected(&self) -> bool;
}
