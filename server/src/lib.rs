//! クリップボードリレーサーバーライブラリ
//!
//! このクレートはリレークライアントの接続先となるサーバーの機能を提供します。

pub mod app;
pub mod clipboard;
pub mod command;
pub mod config;
pub mod network;

pub use app::{App, AppError, AppState};
pub use clipboard::{Clipboard, ClipboardError, Entry};
pub use config::ServerSettings;
