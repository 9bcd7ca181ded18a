//! UIモジュール
//!
//! このモジュールはターミナルクライアントのユーザーインターフェースを担当します。

mod settings;
mod terminal;

pub use settings::AppSettings;
pub use terminal::TerminalSurface;
