//! 入力モジュール
//!
//! このモジュールはターミナルクライアントの入力処理を担当します。
//! 標準入力から読み込んだ行をリレーの操作に変換します。

mod command;

pub use command::{parse_line, InputError, UserAction, HELP_TEXT};
