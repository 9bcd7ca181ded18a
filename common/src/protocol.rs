//! 通信プロトコル定義
//!
//! リレークライアントとサーバー間で送受信されるタグ付きメッセージを定義します。
//! ワイヤ上では `{"type": ..., "content": ...}` 形式の JSON テキストフレームとして
//! 表現され、境界で閉じた列挙型に変換されます。

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, Result};

/// クライアント → サーバーのメッセージ種別
pub mod client_tag {
    /// 新しいクリップボードエントリ
    pub const NEW_ENTRY: &str = "newEntry";
    /// クリップボードの全消去
    pub const CLEAR_CLIPBOARD: &str = "clearClipboard";
    /// クリップボードエントリの削除
    pub const DEL_ENTRY: &str = "delEntry";
    /// コマンド実行
    pub const COMMAND: &str = "command";
}

/// サーバー → クライアントのメッセージ種別
pub mod server_tag {
    /// クリップボードの再読み込み要求
    pub const REFRESH_CLIPBOARD: &str = "refreshClipboard";
    /// コマンド出力の更新
    pub const UPDATE_CLI: &str = "updateCLI";
}

/// ワイヤ上のパケット
///
/// `content` が省略されたフレームは空文字列として扱います。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// メッセージ種別
    #[serde(rename = "type")]
    pub kind: String,
    /// ペイロード
    #[serde(default)]
    pub content: String,
}

impl Packet {
    /// 新しいパケットを作成
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }

    /// テキストフレームからパケットを解析
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CommonError::DeserializeError(format!("JSONデシリアライズエラー: {}", e)))
    }

    /// パケットをテキストフレームに変換
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CommonError::SerializeError(format!("JSONシリアライズエラー: {}", e)))
    }
}

/// クライアントからサーバーへのメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// クリップボードエントリを追加
    NewEntry(String),
    /// クリップボードを全消去
    ClearClipboard,
    /// 指定IDのエントリを削除
    DelEntry(String),
    /// サーバー上でコマンドを実行
    Command(String),
}

impl ClientMessage {
    /// メッセージ種別を取得
    pub fn tag(&self) -> &'static str {
        match self {
            ClientMessage::NewEntry(_) => client_tag::NEW_ENTRY,
            ClientMessage::ClearClipboard => client_tag::CLEAR_CLIPBOARD,
            ClientMessage::DelEntry(_) => client_tag::DEL_ENTRY,
            ClientMessage::Command(_) => client_tag::COMMAND,
        }
    }

    /// ペイロードを取得
    pub fn content(&self) -> &str {
        match self {
            ClientMessage::NewEntry(content)
            | ClientMessage::DelEntry(content)
            | ClientMessage::Command(content) => content,
            ClientMessage::ClearClipboard => "",
        }
    }

    /// パケットに変換
    pub fn to_packet(&self) -> Packet {
        Packet::new(self.tag(), self.content())
    }

    /// パケットから変換（未知の種別は `None`）
    pub fn from_packet(packet: Packet) -> Option<Self> {
        match packet.kind.as_str() {
            client_tag::NEW_ENTRY => Some(ClientMessage::NewEntry(packet.content)),
            client_tag::CLEAR_CLIPBOARD => Some(ClientMessage::ClearClipboard),
            client_tag::DEL_ENTRY => Some(ClientMessage::DelEntry(packet.content)),
            client_tag::COMMAND => Some(ClientMessage::Command(packet.content)),
            _ => None,
        }
    }

    /// テキストフレームにエンコード
    pub fn encode(&self) -> Result<String> {
        self.to_packet().to_text()
    }

    /// テキストフレームをデコード
    ///
    /// 解析できない場合はエラー、未知の種別は `Ok(None)` を返します。
    pub fn decode(text: &str) -> Result<Option<Self>> {
        Packet::parse(text).map(Self::from_packet)
    }
}

/// サーバーからクライアントへのメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// クリップボードが変更されたためページを再読み込みする
    RefreshClipboard,
    /// コマンド出力領域を更新する
    UpdateCli(String),
}

impl ServerMessage {
    /// メッセージ種別を取得
    pub fn tag(&self) -> &'static str {
        match self {
            ServerMessage::RefreshClipboard => server_tag::REFRESH_CLIPBOARD,
            ServerMessage::UpdateCli(_) => server_tag::UPDATE_CLI,
        }
    }

    /// パケットに変換
    pub fn to_packet(&self) -> Packet {
        match self {
            ServerMessage::RefreshClipboard => Packet::new(self.tag(), ""),
            ServerMessage::UpdateCli(output) => Packet::new(self.tag(), output.as_str()),
        }
    }

    /// パケットから変換（未知の種別は `None`）
    ///
    /// `refreshClipboard` の内容は参照しません。
    pub fn from_packet(packet: Packet) -> Option<Self> {
        match packet.kind.as_str() {
            server_tag::REFRESH_CLIPBOARD => Some(ServerMessage::RefreshClipboard),
            server_tag::UPDATE_CLI => Some(ServerMessage::UpdateCli(packet.content)),
            _ => None,
        }
    }

    /// テキストフレームにエンコード
    pub fn encode(&self) -> Result<String> {
        self.to_packet().to_text()
    }

    /// テキストフレームをデコード
    pub fn decode(text: &str) -> Result<Option<Self>> {
        Packet::parse(text).map(Self::from_packet)
    }
}

/// 接続状態
///
/// 再接続やキューイングの状態は持ちません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// 接続済み
    Open,
    /// 未接続（接続前・切断後・エラー後）
    Closed,
}

impl ConnectionState {
    /// 接続が開いているか
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Closed
    }
}
