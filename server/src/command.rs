//! コマンド実行
//!
//! ブラウザのCLI欄から送られたコマンドをサーバー上で実行します。
//! シェルは経由せず、空白で区切った最初の語をプログラム名として起動します。

use std::process::Command;
use log::{debug, error};

/// コマンドを実行して表示用の出力を返す
///
/// 標準エラー出力が空でなければそれを、そうでなければ標準出力を返します。
/// 起動に失敗した場合はエラーメッセージを返します。
pub fn run_command(command_line: &str) -> String {
    let mut parts = command_line.split_whitespace();
    let program = match parts.next() {
        Some(program) => program,
        None => return "空のコマンドです".to_string(),
    };
    let args: Vec<&str> = parts.collect();

    debug!("コマンド実行: {} {:?}", program, args);

    let output = match Command::new(program).args(&args).output() {
        Ok(output) => output,
        Err(e) => {
            error!("システムコマンドの実行エラー: {}", e);
            return e.to_string();
        }
    };

    if !output.status.success() {
        error!("コマンドが異常終了しました: {} ({})", program, output.status);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        return stderr.into_owned();
    }

    String::from_utf8_lossy(&output.stdout).into_owned()
}
