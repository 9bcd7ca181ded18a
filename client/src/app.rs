//! メインアプリケーション
//!
//! ターミナルクライアントのイベントループを実装します。
//! ソケットの受信と入力行の処理を1つのループで順番に行います。

use crate::input::{parse_line, UserAction, HELP_TEXT};
use crate::network::{NetworkClient, NetworkError};
use crate::ui::TerminalSurface;

use clipboard_relay_common::{InboundOutcome, InputField, RelayClient};
use log::{error, info};
use std::io::Write;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

/// 入力待ちの間隔
const INPUT_INTERVAL: Duration = Duration::from_millis(10);

/// 接続が閉じている間の入力待ちの間隔
const IDLE_INPUT_INTERVAL: Duration = Duration::from_millis(200);

/// アプリケーション
pub struct App<C: NetworkClient, W: Write> {
    /// リレークライアント
    relay: RelayClient<C, TerminalSurface<W>>,
    /// 実行中フラグ
    running: bool,
}

impl<C: NetworkClient, W: Write> App<C, W> {
    /// 新しいアプリケーションを作成
    pub fn new(client: C, surface: TerminalSurface<W>) -> Self {
        let connected = client.is_connected();
        let mut relay = RelayClient::new(client, surface);
        if connected {
            relay.on_open();
        }
        Self {
            relay,
            running: true,
        }
    }

    /// リレークライアントを取得
    pub fn relay(&self) -> &RelayClient<C, TerminalSurface<W>> {
        &self.relay
    }

    /// 実行中かどうか
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 終了するまでイベントループを実行
    pub fn run(&mut self) {
        self.relay.surface_mut().notice(":help で使い方を表示します");
        while self.running {
            self.step();
        }
        if let Err(e) = self.relay.transport_mut().disconnect() {
            error!("切断に失敗しました: {}", e);
        }
        info!("クライアントを終了しました");
    }

    /// イベントループを1回まわす
    pub fn step(&mut self) {
        let interval = if self.relay.state().is_open() {
            self.poll_socket();
            INPUT_INTERVAL
        } else {
            IDLE_INPUT_INTERVAL
        };

        match self.relay.surface().next_line(interval) {
            Ok(line) => self.handle_line(&line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("入力が閉じられました");
                self.running = false;
            }
        }
    }

    /// ソケットから受信したフレームを処理
    pub fn poll_socket(&mut self) -> Option<InboundOutcome> {
        match self.relay.transport_mut().poll_frame() {
            Ok(Some(text)) => Some(self.relay.handle_frame(&text)),
            Ok(None) => None,
            Err(NetworkError::ConnectionClosed) => {
                self.relay.on_close();
                self.relay
                    .surface_mut()
                    .notice("接続が閉じられました。再接続するにはクライアントを再起動してください");
                None
            }
            Err(e) => {
                self.relay.on_error(&e);
                self.relay.surface_mut().notice(&format!("接続エラー: {}", e));
                None
            }
        }
    }

    /// 入力行を処理
    pub fn handle_line(&mut self, line: &str) {
        let action = match parse_line(line) {
            Ok(action) => action,
            Err(e) => {
                self.relay.surface_mut().notice(&e.to_string());
                return;
            }
        };

        let result = match action {
            UserAction::Entry(text) => {
                self.relay.surface_mut().set_field(InputField::Entry, text);
                self.relay.submit_entry()
            }
            UserAction::Command(command) => {
                self.relay.surface_mut().set_field(InputField::Command, command);
                self.relay.submit_command()
            }
            UserAction::Clear => self.relay.clear_clipboard().map(|sent| {
                if !sent {
                    self.relay.surface_mut().notice("キャンセルしました");
                }
            }),
            UserAction::Delete(id) => self.relay.delete_entry(&id),
            UserAction::Help => {
                self.relay.surface_mut().notice(HELP_TEXT);
                Ok(())
            }
            UserAction::Quit => {
                self.running = false;
                Ok(())
            }
            UserAction::Empty => Ok(()),
        };

        if let Err(e) = result {
            error!("送信に失敗しました: {}", e);
            let hint = if e.is_connection_error() {
                "（接続は閉じています）"
            } else {
                ""
            };
            self.relay
                .surface_mut()
                .notice(&format!("送信に失敗しました: {}{}", e, hint));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipboard_relay_common::{CommonError, RenderSurface, Transport};
    use std::collections::VecDeque;
    use std::sync::mpsc::{self, Sender};

    /// メモリ上のネットワーククライアント
    #[derive(Default)]
    struct FakeClient {
        incoming: VecDeque<Result<Option<String>, NetworkError>>,
        sent: Vec<String>,
        connected: bool,
    }

    impl Transport for FakeClient {
        fn send_text(&mut self, text: String) -> Result<(), CommonError> {
            self.sent.push(text);
            Ok(())
        }
    }

    impl NetworkClient for FakeClient {
        fn poll_frame(&mut self) -> Result<Option<String>, NetworkError> {
            self.incoming.pop_front().unwrap_or(Ok(None))
        }

        fn disconnect(&mut self) -> Result<(), NetworkError> {
            self.connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    fn app() -> (App<FakeClient, Vec<u8>>, Sender<String>) {
        let (tx, rx) = mpsc::channel();
        let client = FakeClient {
            connected: true,
            ..Default::default()
        };
        (App::new(client, TerminalSurface::new(Vec::new(), rx, false)), tx)
    }

    fn output(app: &App<FakeClient, Vec<u8>>) -> String {
        String::from_utf8(app.relay().surface().writer().clone()).unwrap()
    }

    #[test]
    fn test_entry_and_command_lines() {
        let (mut app, _tx) = app();
        app.handle_line("hello");
        app.handle_line("!uname -a");
        app.handle_line(":del 4");

        assert_eq!(
            app.relay().transport().sent,
            vec![
                r#"{"type":"newEntry","content":"hello"}"#.to_string(),
                r#"{"type":"command","content":"uname -a"}"#.to_string(),
                r#"{"type":"delEntry","content":"4"}"#.to_string(),
            ]
        );
        assert_eq!(app.relay().surface().field_value(InputField::Entry), "");
        assert_eq!(app.relay().surface().field_value(InputField::Command), "");
    }

    #[test]
    fn test_clear_waits_for_confirmation() {
        let (mut app, tx) = app();

        tx.send("n".to_string()).unwrap();
        app.handle_line(":clear");
        assert!(app.relay().transport().sent.is_empty());
        assert!(output(&app).contains("キャンセルしました"));

        tx.send("yes".to_string()).unwrap();
        app.handle_line(":clear");
        assert_eq!(
            app.relay().transport().sent,
            vec![r#"{"type":"clearClipboard","content":""}"#.to_string()]
        );
    }

    #[test]
    fn test_inbound_frames() {
        let (mut app, _tx) = app();
        app.relay.transport_mut().incoming.extend([
            Ok(Some(r#"{"type":"updateCLI","content":"<b>42</b>"}"#.to_string())),
            Ok(Some("not json".to_string())),
            Ok(Some(r#"{"type":"refreshClipboard","content":""}"#.to_string())),
        ]);

        assert_eq!(app.poll_socket(), Some(InboundOutcome::OutputUpdated));
        assert_eq!(app.poll_socket(), Some(InboundOutcome::Discarded));
        assert_eq!(app.poll_socket(), Some(InboundOutcome::Reloaded));
        assert_eq!(app.poll_socket(), None);

        assert!(output(&app).contains("<b>42</b>"));
        assert_eq!(app.relay().surface().reloads(), 1);
        assert!(app.relay().state().is_open());
    }

    #[test]
    fn test_close_is_terminal() {
        let (mut app, _tx) = app();
        app.relay.transport_mut().incoming.push_back(Err(NetworkError::ConnectionClosed));
        app.poll_socket();
        assert!(!app.relay().state().is_open());

        app.handle_line("after close");
        assert!(app.relay().transport().sent.is_empty());
        assert!(output(&app).contains("送信に失敗しました"));
        // 送信に失敗した入力は残る
        assert_eq!(app.relay().surface().field_value(InputField::Entry), "after close");
    }

    #[test]
    fn test_quit_and_closed_input() {
        let (mut app, tx) = app();
        tx.send(":quit".to_string()).unwrap();
        app.step();
        assert!(!app.is_running());

        let (mut app, tx) = self::app();
        drop(tx);
        app.run();
        assert!(!app.is_running());
        assert!(!app.relay().transport().is_connected());
    }
}
