//! ブロードキャストハブ
//!
//! 接続中の全セッションの送信キューを保持し、サーバーメッセージを配信します。

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, error};
use parking_lot::Mutex;
use uuid::Uuid;

use clipboard_relay_common::ServerMessage;

/// 接続中セッションの送信キュー
#[derive(Debug, Default)]
pub struct Hub {
    sessions: Mutex<HashMap<String, Sender<String>>>,
}

impl Hub {
    /// 空のハブを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// セッションを登録し、IDと受信側キューを返す
    pub fn register(&self) -> (String, Receiver<String>) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel();
        self.sessions.lock().insert(id.clone(), tx);
        debug!("セッション登録: {}", id);
        (id, rx)
    }

    /// セッションを登録解除
    pub fn unregister(&self, id: &str) {
        if self.sessions.lock().remove(id).is_some() {
            debug!("セッション登録解除: {}", id);
        }
    }

    /// 接続中のセッション数
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// セッションが無いかどうか
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// 全セッションへ配信し、配信できたセッション数を返す
    pub fn broadcast(&self, message: &ServerMessage) -> usize {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                error!("メッセージのシリアライズに失敗しました: {}", e);
                return 0;
            }
        };

        let mut sessions = self.sessions.lock();
        // 受信側が破棄されたセッションは取り除く
        sessions.retain(|id, tx| match tx.send(text.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!("切断済みセッションを削除: {}", id);
                false
            }
        });

        debug!("{} を {} セッションへ配信", message.tag(), sessions.len());
        sessions.len()
    }

    /// 全セッションを破棄
    pub fn clear(&self) {
        self.sessions.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_reaches_every_session() {
        let hub = Hub::new();
        let (_a, rx_a) = hub.register();
        let (_b, rx_b) = hub.register();

        assert_eq!(hub.broadcast(&ServerMessage::RefreshClipboard), 2);

        let expected = r#"{"type":"refreshClipboard","content":""}"#;
        assert_eq!(rx_a.try_recv().unwrap(), expected);
        assert_eq!(rx_b.try_recv().unwrap(), expected);
    }

    #[test]
    fn test_unregister_and_dropped_receivers() {
        let hub = Hub::new();
        let (a, _rx_a) = hub.register();
        let (_b, rx_b) = hub.register();
        assert_eq!(hub.len(), 2);

        hub.unregister(&a);
        assert_eq!(hub.len(), 1);

        drop(rx_b);
        assert_eq!(hub.broadcast(&ServerMessage::UpdateCli("x".to_string())), 0);
        assert!(hub.is_empty());
    }
}
