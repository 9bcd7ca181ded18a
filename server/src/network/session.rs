//! クライアントセッション
//!
//! 1つのWebSocket接続を担当し、受信メッセージをクリップボード操作や
//! コマンド実行へ振り分け、その結果をハブ経由で全セッションへ配信します。

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use native_tls::TlsStream;
use parking_lot::Mutex;
use tungstenite::{Message, WebSocket};

use clipboard_relay_common::utils::string::{escape_multiline, truncate_str};
use clipboard_relay_common::{ClientMessage, Packet, ServerMessage};

use super::hub::Hub;
use super::{NetworkError, SessionInfo};
use crate::clipboard::Clipboard;
use crate::command::run_command;

/// セッションが扱えるストリーム
pub trait SessionStream: Read + Write + Send {
    /// 読み込みのポーリング間隔を設定
    fn set_poll_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

impl SessionStream for TcpStream {
    fn set_poll_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)
    }
}

impl SessionStream for TlsStream<TcpStream> {
    fn set_poll_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.get_ref().set_read_timeout(timeout)
    }
}

/// クライアントメッセージの振り分け
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// 共有クリップボード
    clipboard: Arc<Mutex<Clipboard>>,
    /// コマンド実行を許可するか
    cli_enabled: bool,
}

impl Dispatcher {
    /// 新しいディスパッチャーを作成
    pub fn new(clipboard: Arc<Mutex<Clipboard>>, cli_enabled: bool) -> Self {
        Self {
            clipboard,
            cli_enabled,
        }
    }

    /// 共有クリップボードを取得
    pub fn clipboard(&self) -> &Arc<Mutex<Clipboard>> {
        &self.clipboard
    }

    /// テキストフレームを処理し、配信すべき応答を返す
    ///
    /// 解析できないフレームや未知の種別は記録して破棄します。
    pub fn handle_text(&self, text: &str) -> Option<ServerMessage> {
        let packet = match Packet::parse(text) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("不正なフレームを破棄: {} ({})", truncate_str(text, 64), e);
                return None;
            }
        };

        let kind = packet.kind.clone();
        match ClientMessage::from_packet(packet) {
            Some(message) => self.dispatch(message),
            None => {
                warn!("未知のメッセージ種別です: {}", kind);
                None
            }
        }
    }

    /// メッセージを適用し、配信すべき応答を返す
    pub fn dispatch(&self, message: ClientMessage) -> Option<ServerMessage> {
        match message {
            ClientMessage::NewEntry(content) => {
                let id = self.clipboard.lock().add_entry(content);
                debug!("エントリを追加しました: {}", id);
                Some(ServerMessage::RefreshClipboard)
            }
            ClientMessage::DelEntry(id) => {
                match id.trim().parse::<i64>() {
                    Ok(id) => {
                        if let Err(e) = self.clipboard.lock().delete_entry(id) {
                            error!("クリップボードエントリの削除エラー: {}", e);
                        }
                    }
                    Err(e) => error!("エントリIDの解析エラー '{}': {}", id, e),
                }
                Some(ServerMessage::RefreshClipboard)
            }
            ClientMessage::ClearClipboard => {
                self.clipboard.lock().clear();
                info!("クリップボードを消去しました");
                Some(ServerMessage::RefreshClipboard)
            }
            ClientMessage::Command(command) => {
                if !self.cli_enabled {
                    warn!("CLIが無効のためコマンドを無視します: {}", truncate_str(&command, 64));
                    return None;
                }
                info!("コマンドを実行します: {}", escape_multiline(&command));
                Some(ServerMessage::UpdateCli(run_command(&command)))
            }
        }
    }
}

/// クライアントセッション
pub struct ClientSession<S: SessionStream> {
    /// セッション情報
    info: SessionInfo,
    /// WebSocket
    websocket: WebSocket<S>,
    /// 配信待ちメッセージ
    outbox: Receiver<String>,
    /// メッセージの振り分け
    dispatcher: Dispatcher,
    /// 配信ハブ
    hub: Arc<Hub>,
    /// アクティブフラグ
    active: bool,
}

impl<S: SessionStream> ClientSession<S> {
    /// 新しいセッションを作成
    pub fn new(
        info: SessionInfo,
        websocket: WebSocket<S>,
        outbox: Receiver<String>,
        dispatcher: Dispatcher,
        hub: Arc<Hub>,
    ) -> Self {
        Self {
            info,
            websocket,
            outbox,
            dispatcher,
            hub,
            active: true,
        }
    }

    /// セッション情報を取得
    pub fn session_info(&self) -> &SessionInfo {
        &self.info
    }

    /// サーバー停止かセッション終了までメッセージを処理
    pub fn run(&mut self, running: &Mutex<bool>) {
        while self.active && *running.lock() {
            if let Err(e) = self.receive_and_process() {
                error!("WebSocket通信エラー ({}): {}", self.info.ip_address, e);
                break;
            }
            if let Err(e) = self.flush_outbox() {
                error!("WebSocket送信エラー ({}): {}", self.info.ip_address, e);
                break;
            }
        }
        self.close();
    }

    /// メッセージを1つ受信して処理（ポーリング間隔内に無ければ何もしない）
    pub fn receive_and_process(&mut self) -> Result<(), NetworkError> {
        match self.websocket.read_message() {
            Ok(Message::Text(text)) => self.process_text(&text),
            Ok(Message::Binary(data)) => match String::from_utf8(data) {
                Ok(text) => self.process_text(&text),
                Err(e) => debug!("UTF-8ではないバイナリフレームを破棄: {}", e),
            },
            Ok(Message::Close(_)) => {
                info!("クライアントが接続を閉じました: {}", self.info.ip_address);
                self.active = false;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                self.active = false;
            }
            Err(e) => {
                self.active = false;
                return Err(NetworkError::CommunicationError(e.to_string()));
            }
        }
        Ok(())
    }

    /// 配信待ちのメッセージをすべて送信
    pub fn flush_outbox(&mut self) -> Result<(), NetworkError> {
        loop {
            match self.outbox.try_recv() {
                Ok(text) => {
                    self.websocket
                        .write_message(Message::Text(text))
                        .map_err(|e| NetworkError::CommunicationError(format!("WebSocket送信エラー: {}", e)))?;
                    self.info.messages_sent += 1;
                }
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    // ハブから外された
                    self.active = false;
                    return Ok(());
                }
            }
        }
    }

    /// 接続を閉じる
    pub fn close(&mut self) {
        self.active = false;
        let _ = self.websocket.close(None);
        let _ = self.websocket.write_pending();
        debug!(
            "セッション終了: {} (受信 {} / 送信 {}, {}秒)",
            self.info.id,
            self.info.messages_received,
            self.info.messages_sent,
            self.info.connection_duration()
        );
    }

    fn process_text(&mut self, text: &str) {
        self.info.messages_received += 1;
        self.info.update_activity();

        if let Some(reply) = self.dispatcher.handle_text(text) {
            self.hub.broadcast(&reply);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(cli_enabled: bool) -> Dispatcher {
        Dispatcher::new(Arc::new(Mutex::new(Clipboard::new())), cli_enabled)
    }

    fn contents(d: &Dispatcher) -> Vec<String> {
        d.clipboard()
            .lock()
            .entries()
            .iter()
            .map(|e| e.content.clone())
            .collect()
    }

    #[test]
    fn test_new_entry_refreshes() {
        let d = dispatcher(false);
        let reply = d.handle_text(r#"{"type":"newEntry","content":"hello"}"#);
        assert_eq!(reply, Some(ServerMessage::RefreshClipboard));
        assert_eq!(contents(&d), vec!["hello"]);
    }

    #[test]
    fn test_del_entry_refreshes_even_on_error() {
        let d = dispatcher(false);
        d.dispatch(ClientMessage::NewEntry("a".to_string()));
        d.dispatch(ClientMessage::NewEntry("b".to_string()));

        assert_eq!(
            d.dispatch(ClientMessage::DelEntry("not-a-number".to_string())),
            Some(ServerMessage::RefreshClipboard)
        );
        assert_eq!(
            d.dispatch(ClientMessage::DelEntry("7".to_string())),
            Some(ServerMessage::RefreshClipboard)
        );
        assert_eq!(contents(&d), vec!["b", "a"]);

        d.dispatch(ClientMessage::DelEntry("0".to_string()));
        assert_eq!(contents(&d), vec!["b"]);
    }

    #[test]
    fn test_clear_clipboard() {
        let d = dispatcher(false);
        d.dispatch(ClientMessage::NewEntry("a".to_string()));
        assert_eq!(
            d.handle_text(r#"{"type":"clearClipboard","content":""}"#),
            Some(ServerMessage::RefreshClipboard)
        );
        assert!(d.clipboard().lock().is_empty());
    }

    #[test]
    fn test_command_ignored_when_cli_disabled() {
        let d = dispatcher(false);
        assert_eq!(d.dispatch(ClientMessage::Command("echo hi".to_string())), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_updates_cli() {
        let d = dispatcher(true);
        assert_eq!(
            d.dispatch(ClientMessage::Command("echo hi".to_string())),
            Some(ServerMessage::UpdateCli("hi\n".to_string()))
        );
    }

    #[test]
    fn test_unknown_and_malformed_frames() {
        let d = dispatcher(true);
        assert_eq!(d.handle_text(r#"{"type":"unknownTag"}"#), None);
        assert_eq!(d.handle_text("not json"), None);
        assert!(d.clipboard().lock().is_empty());
    }
}
