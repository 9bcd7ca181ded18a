//! DOM 描画面
//!
//! ページ上の入力欄と出力領域をリレーの描画面として扱います。

use clipboard_relay_common::{InputField, RenderSurface};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlInputElement, Window};

/// コマンド出力領域の要素ID
pub const OUTPUT_ID: &str = "cliOutput";

/// 入力欄の要素IDを取得
pub fn field_id(field: InputField) -> &'static str {
    match field {
        InputField::Entry => "cbEntry",
        InputField::Command => "cliCommand",
    }
}

/// DOM 描画面
pub struct DomSurface {
    window: Window,
    document: Document,
}

impl DomSurface {
    /// 新しい描画面を作成
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }

    fn input(&self, field: InputField) -> Option<HtmlInputElement> {
        let id = field_id(field);
        let element = self
            .document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlInputElement>().ok());
        if element.is_none() {
            log::warn!("入力欄が見つかりません: #{}", id);
        }
        element
    }
}

impl RenderSurface for DomSurface {
    fn field_value(&self, field: InputField) -> String {
        self.input(field).map(|e| e.value()).unwrap_or_default()
    }

    fn clear_input(&mut self, field: InputField) {
        if let Some(input) = self.input(field) {
            input.set_value("");
        }
    }

    fn focus_input(&mut self, field: InputField) {
        if let Some(input) = self.input(field) {
            let element: &HtmlElement = input.as_ref();
            if let Err(e) = element.focus() {
                log::debug!("フォーカスに失敗しました: {:?}", e);
            }
        }
    }

    fn set_output(&mut self, content: &str) {
        match self.document.get_element_by_id(OUTPUT_ID) {
            Some(output) => output.set_inner_html(content),
            None => log::warn!("出力領域が見つかりません: #{}", OUTPUT_ID),
        }
    }

    fn reload(&mut self) {
        if let Err(e) = self.window.location().reload() {
            log::error!("ページの再読み込みに失敗しました: {:?}", e);
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.window.confirm_with_message(question).unwrap_or(false)
    }
}
