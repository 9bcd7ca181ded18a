//! メッセージリレー
//!
//! ユーザー操作をサーバーへ中継し、サーバーからのプッシュを画面へ適用する
//! リレークライアントを実装します。接続と画面はトレイトとして注入されるため、
//! ブラウザでも端末でも同じロジックが動作します。

use log::{debug, info, warn};

use crate::error::{CommonError, Result};
use crate::protocol::{ClientMessage, ConnectionState, ServerMessage};
use crate::utils::string::truncate_str;

/// クリップボード全消去時の確認メッセージ
pub const CLEAR_CLIPBOARD_PROMPT: &str = "Are you sure you want to clear the clipboard?";

/// ログに出すペイロードの最大文字数
const LOG_PREVIEW_CHARS: usize = 64;

/// 入力欄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    /// クリップボードエントリ入力欄
    Entry,
    /// コマンド入力欄
    Command,
}

/// テキストフレームの送信路
///
/// 送信は投げっぱなしで、応答や送達確認はありません。
pub trait Transport {
    /// テキストフレームを送信
    fn send_text(&mut self, text: String) -> Result<()>;
}

/// 描画面
///
/// DOM やターミナルなど、リレーが操作する画面の能力を表します。
pub trait RenderSurface {
    /// 入力欄の現在値を取得
    fn field_value(&self, field: InputField) -> String;

    /// 入力欄を空にする
    fn clear_input(&mut self, field: InputField);

    /// 入力欄にフォーカスを移す
    fn focus_input(&mut self, _field: InputField) {}

    /// 出力領域の内容を置き換える
    fn set_output(&mut self, content: &str);

    /// ページを再読み込みする（クライアント状態はすべて破棄される）
    fn reload(&mut self);

    /// 確認を求める（応答があるまでブロックする）
    fn confirm(&mut self, question: &str) -> bool;
}

/// 受信フレームの処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// ページを再読み込みした
    Reloaded,
    /// 出力領域を更新した
    OutputUpdated,
    /// 未知の種別のため無視した
    Ignored,
    /// 解析できなかったため破棄した
    Discarded,
}

/// リレークライアント
///
/// ページ読み込み時に一度だけ構築され、接続の生存期間中ずっと保持されます。
pub struct RelayClient<T: Transport, S: RenderSurface> {
    /// 送信路
    transport: T,
    /// 描画面
    surface: S,
    /// 接続状態
    state: ConnectionState,
}

impl<T: Transport, S: RenderSurface> RelayClient<T, S> {
    /// 新しいリレークライアントを作成
    ///
    /// 接続が開くまでは `Closed` 状態です。
    pub fn new(transport: T, surface: S) -> Self {
        Self {
            transport,
            surface,
            state: ConnectionState::Closed,
        }
    }

    /// 接続状態を取得
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// 描画面を取得
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// 描画面を可変で取得
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// 送信路を取得
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 送信路を可変で取得
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// 接続確立を通知
    pub fn on_open(&mut self) {
        self.state = ConnectionState::Open;
        info!("WebSocketで接続しました");
    }

    /// 切断を通知
    pub fn on_close(&mut self) {
        self.state = ConnectionState::Closed;
        info!("WebSocketサーバーにより接続が閉じられました");
    }

    /// 接続エラーを通知
    pub fn on_error(&mut self, error: &dyn std::fmt::Display) {
        self.state = ConnectionState::Closed;
        warn!("WebSocketエラー: {}", error);
    }

    /// 入力欄のテキストを新しいエントリとして送信
    pub fn submit_entry(&mut self) -> Result<()> {
        let text = self.surface.field_value(InputField::Entry);
        self.send(ClientMessage::NewEntry(text))?;
        self.surface.clear_input(InputField::Entry);
        Ok(())
    }

    /// 確認の上でクリップボードを全消去
    ///
    /// 確認が拒否された場合は何も送信せず `Ok(false)` を返します。
    pub fn clear_clipboard(&mut self) -> Result<bool> {
        if !self.surface.confirm(CLEAR_CLIPBOARD_PROMPT) {
            debug!("クリップボードの消去がキャンセルされました");
            return Ok(false);
        }

        self.send(ClientMessage::ClearClipboard)?;
        Ok(true)
    }

    /// 指定IDのエントリを削除（確認なし）
    pub fn delete_entry(&mut self, id: &str) -> Result<()> {
        self.send(ClientMessage::DelEntry(id.to_string()))
    }

    /// コマンド入力欄のテキストを送信
    ///
    /// 送信ボタンと Enter キーの両方から呼び出されます。
    pub fn submit_command(&mut self) -> Result<()> {
        let text = self.surface.field_value(InputField::Command);
        self.send(ClientMessage::Command(text))?;
        self.surface.clear_input(InputField::Command);
        self.surface.focus_input(InputField::Command);
        Ok(())
    }

    /// 受信したテキストフレームを処理
    ///
    /// 解析エラーはログに記録して破棄し、呼び出し元へは伝播しません。
    pub fn handle_frame(&mut self, text: &str) -> InboundOutcome {
        match ServerMessage::decode(text) {
            Ok(Some(message)) => self.apply(message),
            Ok(None) => {
                debug!("未知のメッセージを無視しました: {}", truncate_str(text, LOG_PREVIEW_CHARS));
                InboundOutcome::Ignored
            }
            Err(e) => {
                warn!("メッセージの読み取りエラー: {}", e);
                InboundOutcome::Discarded
            }
        }
    }

    /// サーバーメッセージを描画面に適用
    pub fn apply(&mut self, message: ServerMessage) -> InboundOutcome {
        match message {
            ServerMessage::RefreshClipboard => {
                debug!("クリップボード更新通知を受信しました");
                self.surface.reload();
                InboundOutcome::Reloaded
            }
            ServerMessage::UpdateCli(output) => {
                self.surface.set_output(&output);
                self.surface.clear_input(InputField::Command);
                InboundOutcome::OutputUpdated
            }
        }
    }

    /// メッセージをシリアライズして送信
    fn send(&mut self, message: ClientMessage) -> Result<()> {
        if !self.state.is_open() {
            return Err(CommonError::NotConnected);
        }

        let text = message.encode()?;
        debug!(
            "送信: {} {}",
            message.tag(),
            truncate_str(message.content(), LOG_PREVIEW_CHARS)
        );
        self.transport.send_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// 送信内容を記録する送信路
    #[derive(Default)]
    struct RecordingTransport {
        sent: Vec<String>,
        fail: bool,
    }

    impl Transport for RecordingTransport {
        fn send_text(&mut self, text: String) -> Result<()> {
            if self.fail {
                return Err(CommonError::NetworkError("送信失敗".to_string()));
            }
            self.sent.push(text);
            Ok(())
        }
    }

    /// メモリ上の描画面
    #[derive(Default)]
    struct FakeSurface {
        fields: HashMap<InputField, String>,
        output: String,
        reloads: usize,
        focused: Option<InputField>,
        answer: bool,
        questions: Vec<String>,
    }

    impl RenderSurface for FakeSurface {
        fn field_value(&self, field: InputField) -> String {
            self.fields.get(&field).cloned().unwrap_or_default()
        }

        fn clear_input(&mut self, field: InputField) {
            self.fields.insert(field, String::new());
        }

        fn focus_input(&mut self, field: InputField) {
            self.focused = Some(field);
        }

        fn set_output(&mut self, content: &str) {
            self.output = content.to_string();
        }

        fn reload(&mut self) {
            self.reloads += 1;
        }

        fn confirm(&mut self, question: &str) -> bool {
            self.questions.push(question.to_string());
            self.answer
        }
    }

    fn open_client() -> RelayClient<RecordingTransport, FakeSurface> {
        let mut client = RelayClient::new(RecordingTransport::default(), FakeSurface::default());
        client.on_open();
        client
    }

    fn sent_json(client: &RelayClient<RecordingTransport, FakeSurface>) -> Vec<Value> {
        client
            .transport()
            .sent
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }

    #[test]
    fn test_submit_entry_sends_and_clears() {
        let mut client = open_client();
        client
            .surface_mut()
            .fields
            .insert(InputField::Entry, "hello".to_string());

        client.submit_entry().unwrap();

        assert_eq!(sent_json(&client), vec![json!({"type": "newEntry", "content": "hello"})]);
        assert_eq!(client.surface().field_value(InputField::Entry), "");
    }

    #[test]
    fn test_submit_command_sends_clears_and_focuses() {
        let mut client = open_client();
        client
            .surface_mut()
            .fields
            .insert(InputField::Command, "id".to_string());

        client.submit_command().unwrap();

        assert_eq!(sent_json(&client), vec![json!({"type": "command", "content": "id"})]);
        assert_eq!(client.surface().field_value(InputField::Command), "");
        assert_eq!(client.surface().focused, Some(InputField::Command));
    }

    #[test]
    fn test_delete_entry_needs_no_confirmation() {
        let mut client = open_client();
        client.delete_entry("7").unwrap();

        assert_eq!(sent_json(&client), vec![json!({"type": "delEntry", "content": "7"})]);
        assert!(client.surface().questions.is_empty());
    }

    #[test]
    fn test_clear_clipboard_confirmed() {
        let mut client = open_client();
        client.surface_mut().answer = true;

        assert!(client.clear_clipboard().unwrap());
        assert_eq!(
            sent_json(&client),
            vec![json!({"type": "clearClipboard", "content": ""})]
        );
        assert_eq!(client.surface().questions, vec![CLEAR_CLIPBOARD_PROMPT.to_string()]);
    }

    #[test]
    fn test_clear_clipboard_declined_sends_nothing() {
        let mut client = open_client();
        client.surface_mut().answer = false;

        assert!(!client.clear_clipboard().unwrap());
        assert!(client.transport().sent.is_empty());
    }

    #[test]
    fn test_send_before_open_keeps_field() {
        let mut client = RelayClient::new(RecordingTransport::default(), FakeSurface::default());
        client
            .surface_mut()
            .fields
            .insert(InputField::Entry, "pending".to_string());

        assert!(matches!(client.submit_entry(), Err(CommonError::NotConnected)));
        assert!(client.transport().sent.is_empty());
        assert_eq!(client.surface().field_value(InputField::Entry), "pending");
    }

    #[test]
    fn test_transport_failure_keeps_field() {
        let mut client = open_client();
        client.transport_mut().fail = true;
        client
            .surface_mut()
            .fields
            .insert(InputField::Command, "uname -a".to_string());

        assert!(client.submit_command().is_err());
        assert_eq!(client.surface().field_value(InputField::Command), "uname -a");
    }

    #[test]
    fn test_update_cli_sets_output_and_clears_command() {
        let mut client = open_client();
        client
            .surface_mut()
            .fields
            .insert(InputField::Command, "whoami".to_string());

        let outcome = client.handle_frame(r#"{"type":"updateCLI","content":"<b>42</b>"}"#);

        assert_eq!(outcome, InboundOutcome::OutputUpdated);
        assert_eq!(client.surface().output, "<b>42</b>");
        assert_eq!(client.surface().field_value(InputField::Command), "");
    }

    #[test]
    fn test_refresh_clipboard_reloads() {
        let mut client = open_client();
        let outcome = client.handle_frame(r#"{"type":"refreshClipboard","content":"whatever"}"#);

        assert_eq!(outcome, InboundOutcome::Reloaded);
        assert_eq!(client.surface().reloads, 1);
    }

    #[test]
    fn test_malformed_frame_changes_nothing() {
        let mut client = open_client();
        client
            .surface_mut()
            .fields
            .insert(InputField::Command, "keep".to_string());
        client.surface_mut().output = "before".to_string();

        assert_eq!(client.handle_frame("not json"), InboundOutcome::Discarded);
        assert_eq!(client.surface().output, "before");
        assert_eq!(client.surface().field_value(InputField::Command), "keep");
        assert_eq!(client.surface().reloads, 0);
        assert_eq!(client.state(), ConnectionState::Open);
    }

    #[test]
    fn test_unknown_tag_changes_nothing() {
        let mut client = open_client();
        client.surface_mut().output = "before".to_string();

        assert_eq!(client.handle_frame(r#"{"type":"unknownTag"}"#), InboundOutcome::Ignored);
        assert_eq!(client.surface().output, "before");
        assert_eq!(client.surface().reloads, 0);
    }

    #[test]
    fn test_close_and_error_are_terminal() {
        let mut client = open_client();
        client.on_close();
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(client.delete_entry("1").is_err());

        let mut client = open_client();
        client.on_error(&"connection reset");
        assert_eq!(client.state(), ConnectionState::Closed);
    }
}
