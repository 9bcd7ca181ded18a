//! WebSocket クライアント実装
//!
//! WebSocket を使用してリレーサーバーと通信する機能を提供します。

use super::{NetworkClient, NetworkError};
use clipboard_relay_common::{CommonError, Transport};
use log::{debug, info};
use std::io;
use std::net::TcpStream;
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{connect, Message, WebSocket};
use url::Url;

/// 受信ポーリング間隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// WebSocket クライアント
pub struct WebSocketClient {
    /// WebSocket 接続
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
}

impl WebSocketClient {
    /// 指定されたエンドポイントへ接続
    pub fn connect(endpoint: Url) -> Result<Self, NetworkError> {
        let (socket, response) = connect(endpoint.as_str())
            .map_err(|e| NetworkError::ConnectionError(format!("WebSocket connection failed: {}", e)))?;
        debug!("ハンドシェイク応答: {}", response.status());

        set_poll_timeout(socket.get_ref(), Some(POLL_INTERVAL))?;
        info!("WebSocketで接続しました: {}", endpoint);

        Ok(Self {
            socket: Some(socket),
        })
    }
}

/// 下位ソケットに読み込みタイムアウトを設定
fn set_poll_timeout(stream: &MaybeTlsStream<TcpStream>, timeout: Option<Duration>) -> io::Result<()> {
    match stream {
        MaybeTlsStream::Plain(s) => s.set_read_timeout(timeout),
        MaybeTlsStream::NativeTls(s) => s.get_ref().set_read_timeout(timeout),
        _ => Ok(()),
    }
}

impl Transport for WebSocketClient {
    fn send_text(&mut self, text: String) -> Result<(), CommonError> {
        let socket = self.socket.as_mut().ok_or(CommonError::NotConnected)?;
        socket
            .write_message(Message::Text(text))
            .map_err(|e| CommonError::NetworkError(format!("WebSocket送信エラー: {}", e)))
    }
}

impl NetworkClient for WebSocketClient {
    fn poll_frame(&mut self) -> Result<Option<String>, NetworkError> {
        let socket = match self.socket.as_mut() {
            Some(socket) => socket,
            None => return Err(NetworkError::ConnectionClosed),
        };

        match socket.read_message() {
            Ok(Message::Text(text)) => Ok(Some(text)),
            Ok(Message::Binary(data)) => match String::from_utf8(data) {
                Ok(text) => Ok(Some(text)),
                Err(e) => {
                    // 接続はそのまま維持する
                    debug!("UTF-8ではないバイナリフレームを破棄: {}", e);
                    Ok(None)
                }
            },
            Ok(Message::Close(_)) => {
                self.socket = None;
                Err(NetworkError::ConnectionClosed)
            }
            Ok(_) => Ok(None),
            Err(tungstenite::Error::Io(ref e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                Ok(None)
            }
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                self.socket = None;
                Err(NetworkError::ConnectionClosed)
            }
            Err(tungstenite::Error::Io(e)) => {
                self.socket = None;
                Err(NetworkError::IoError(e))
            }
            Err(e) => {
                self.socket = None;
                Err(NetworkError::ProtocolError(e.to_string()))
            }
        }
    }

    fn disconnect(&mut self) -> Result<(), NetworkError> {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None);
            let _ = socket.write_pending();
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }
}
