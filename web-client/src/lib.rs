//! Webクライアントエントリポイント
//!
//! このクレートは、クリップボードリレーのWebクライアント実装を提供します。
//! WebAssemblyにコンパイルされ、ブラウザ上で実行されます。

mod dom;
mod transport;
mod utils;

use std::cell::RefCell;
use std::rc::Rc;

use clipboard_relay_common::{InputField, Origin, RelayClient};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, CloseEvent, Event, KeyboardEvent, MessageEvent, WebSocket};

use dom::{field_id, DomSurface};
use transport::WsTransport;

type Relay = RelayClient<WsTransport, DomSurface>;

/// ページごとに1つだけ作成されるリレーのハンドル
///
/// ページ側のボタンからは `send_entry` などを呼び出します。
#[wasm_bindgen]
pub struct RelayHandle {
    relay: Rc<RefCell<Relay>>,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
    _on_command_key: Option<Closure<dyn FnMut(KeyboardEvent)>>,
}

/// Webクライアントを初期化してリレーに接続
#[wasm_bindgen]
pub fn start() -> Result<RelayHandle, JsValue> {
    utils::logging::init();
    log::info!("Webクライアントを初期化中...");

    let window = window().ok_or_else(|| JsValue::from_str("ウィンドウが見つかりません"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("ドキュメントが見つかりません"))?;

    let location = window.location();
    let origin = Origin::from_scheme(&location.protocol()?, location.host()?);
    let endpoint = origin
        .relay_endpoint()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let socket = WebSocket::new(endpoint.as_str())?;
    let relay = Rc::new(RefCell::new(RelayClient::new(
        WsTransport::new(socket.clone()),
        DomSurface::new(window, document.clone()),
    )));

    let on_open = {
        let relay = relay.clone();
        Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            with_relay(&relay, |relay| relay.on_open());
        })
    };
    socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let on_message = {
        let relay = relay.clone();
        Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| match event.data().as_string() {
            Some(text) => {
                with_relay(&relay, |relay| {
                    relay.handle_frame(&text);
                });
            }
            None => log::debug!("テキスト以外のフレームを無視しました"),
        })
    };
    socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    let on_close = {
        let relay = relay.clone();
        Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            log::debug!("切断コード: {}", event.code());
            with_relay(&relay, |relay| relay.on_close());
        })
    };
    socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

    let on_error = {
        let relay = relay.clone();
        Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            with_relay(&relay, |relay| relay.on_error(&event.type_()));
        })
    };
    socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    // コマンド入力欄では Enter キーでも送信する
    let on_command_key = match document.get_element_by_id(field_id(InputField::Command)) {
        Some(input) => {
            let relay = relay.clone();
            let closure = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
                if event.key() == "Enter" {
                    event.prevent_default();
                    with_relay(&relay, |relay| {
                        if let Err(e) = relay.submit_command() {
                            log::error!("コマンドの送信に失敗しました: {}", e);
                        }
                    });
                }
            });
            input.add_event_listener_with_callback("keypress", closure.as_ref().unchecked_ref())?;
            Some(closure)
        }
        None => {
            log::warn!("コマンド入力欄が見つかりません");
            None
        }
    };

    log::info!("Webクライアントの初期化が完了しました: {}", endpoint);

    Ok(RelayHandle {
        relay,
        _on_open: on_open,
        _on_message: on_message,
        _on_close: on_close,
        _on_error: on_error,
        _on_command_key: on_command_key,
    })
}

/// リレーを借用して処理を実行（処理中の再入は記録して無視する）
fn with_relay<R>(relay: &Rc<RefCell<Relay>>, f: impl FnOnce(&mut Relay) -> R) -> Option<R> {
    match relay.try_borrow_mut() {
        Ok(mut relay) => Some(f(&mut relay)),
        Err(_) => {
            log::warn!("リレーは処理中です");
            None
        }
    }
}

/// 送信結果をページへ返す
fn report(action: &str, result: Option<clipboard_relay_common::Result<()>>) -> Result<(), JsValue> {
    match result {
        Some(Ok(())) | None => Ok(()),
        Some(Err(e)) => {
            log::error!("{}に失敗しました: {}", action, e);
            Err(JsValue::from_str(&e.to_string()))
        }
    }
}

#[wasm_bindgen]
impl RelayHandle {
    /// エントリ入力欄の内容を送信
    pub fn send_entry(&self) -> Result<(), JsValue> {
        report("エントリの送信", with_relay(&self.relay, |relay| relay.submit_entry()))
    }

    /// 確認の上でクリップボードを全消去
    pub fn clear_clipboard(&self) -> Result<(), JsValue> {
        let result = with_relay(&self.relay, |relay| relay.clear_clipboard().map(|_| ()));
        report("クリップボードの消去", result)
    }

    /// 指定IDのエントリを削除
    pub fn del_clipboard(&self, id: String) -> Result<(), JsValue> {
        report("エントリの削除", with_relay(&self.relay, |relay| relay.delete_entry(&id)))
    }

    /// コマンド入力欄の内容を送信
    pub fn send_command(&self) -> Result<(), JsValue> {
        report("コマンドの送信", with_relay(&self.relay, |relay| relay.submit_command()))
    }

    /// 接続が開いているか
    pub fn is_open(&self) -> bool {
        self.relay
            .try_borrow()
            .map(|relay| relay.state().is_open())
            .unwrap_or(false)
    }
}

/// バージョン情報を取得
#[wasm_bindgen]
pub fn get_version() -> String {
    clipboard_relay_common::VERSION.to_string()
}
