//! ブラウザ WebSocket 送信路

use clipboard_relay_common::{CommonError, Result, Transport};
use web_sys::WebSocket;

/// ブラウザの `WebSocket` をリレーの送信路として扱う
pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    /// 新しい送信路を作成
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) -> Result<()> {
        self.socket
            .send_with_str(&text)
            .map_err(|e| CommonError::NetworkError(format!("WebSocket送信エラー: {:?}", e)))
    }
}
