//! ターミナル描画面
//!
//! リレーの描画面をターミナルで実現します。入力欄は行バッファとして保持し、
//! 出力領域への更新やページ再読み込みは通知として出力します。

use std::collections::HashMap;
use std::io::Write;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use log::{debug, warn};

use clipboard_relay_common::{InputField, RenderSurface};

/// ターミナル描画面
pub struct TerminalSurface<W: Write> {
    /// 出力先
    out: W,
    /// 入力行（標準入力スレッドから受け取る）
    lines: Receiver<String>,
    /// 入力欄のバッファ
    fields: HashMap<InputField, String>,
    /// 確認を自動的に承認する
    assume_yes: bool,
    /// 再読み込み回数
    reloads: usize,
}

impl<W: Write> TerminalSurface<W> {
    /// 新しい描画面を作成
    pub fn new(out: W, lines: Receiver<String>, assume_yes: bool) -> Self {
        Self {
            out,
            lines,
            fields: HashMap::new(),
            assume_yes,
            reloads: 0,
        }
    }

    /// 入力欄に値を設定
    pub fn set_field(&mut self, field: InputField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    /// 入力行を待つ
    pub fn next_line(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.lines.recv_timeout(timeout)
    }

    /// 通知を出力
    pub fn notice(&mut self, message: &str) {
        self.write_line(&format!("* {}", message));
    }

    /// 再読み込み回数を取得
    pub fn reloads(&self) -> usize {
        self.reloads
    }

    /// 出力先を取得
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn write_line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            warn!("ターミナルへの出力に失敗しました: {}", e);
        }
    }
}

impl<W: Write> RenderSurface for TerminalSurface<W> {
    fn field_value(&self, field: InputField) -> String {
        self.fields.get(&field).cloned().unwrap_or_default()
    }

    fn clear_input(&mut self, field: InputField) {
        self.fields.remove(&field);
    }

    fn set_output(&mut self, content: &str) {
        self.write_line("---- CLI ----");
        self.write_line(content.trim_end_matches('\n'));
        self.write_line("-------------");
    }

    fn reload(&mut self) {
        // ページの再読み込みに相当するため、ローカルの状態はすべて破棄する
        self.fields.clear();
        self.reloads += 1;
        debug!("再読み込み {}", self.reloads);
        self.notice("クリップボードが更新されました");
    }

    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        if let Err(e) = write!(self.out, "{} [y/N] ", question).and_then(|_| self.out.flush()) {
            warn!("ターミナルへの出力に失敗しました: {}", e);
        }

        match self.lines.recv() {
            Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            // 入力が閉じられた場合は拒否として扱う
            Err(_) => false,
        }
    }
}
