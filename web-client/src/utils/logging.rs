//! ロギングユーティリティ
//!
//! `log` マクロの出力先をブラウザのコンソールに設定します。

use log::Level;

/// 既定のログレベル
#[cfg(feature = "development")]
const DEFAULT_LEVEL: Level = Level::Debug;
#[cfg(not(feature = "development"))]
const DEFAULT_LEVEL: Level = Level::Info;

/// ロガーとパニックフックを初期化
///
/// 複数回呼び出しても安全です。
pub fn init() {
    // パニック時のフックを設定
    console_error_panic_hook::set_once();

    // ロガーを初期化（二重初期化は無視される）
    wasm_logger::init(wasm_logger::Config::new(DEFAULT_LEVEL));
}
