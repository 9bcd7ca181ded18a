//! クリップボードリレークライアントライブラリ
//!
//! ターミナルからクリップボードリレーサーバーへ接続するクライアントです。

pub mod app;
pub mod input;
pub mod network;
pub mod ui;

pub use app::App;
