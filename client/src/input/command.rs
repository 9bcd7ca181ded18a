//! 入力コマンドモジュール
//!
//! 入力行から生成されるユーザー操作を定義します。

use thiserror::Error;

/// ヘルプ表示
pub const HELP_TEXT: &str = "\
使い方:
  <テキスト>     クリップボードにエントリを追加
  !<コマンド>    サーバー上でコマンドを実行
  :clear         クリップボードを全消去（確認あり）
  :del <ID>      指定IDのエントリを削除
  :help          このヘルプを表示
  :quit          終了
  先頭の ! や : をそのまま送るには \\ を前に付けます";

/// 入力エラー
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    /// 引数が不足している
    #[error("引数が必要です: {0}")]
    MissingArgument(&'static str),

    /// コマンド本体が空
    #[error("実行するコマンドが空です")]
    EmptyCommand,

    /// 不明な指示
    #[error("不明な指示です: :{0}（:help で一覧を表示）")]
    UnknownDirective(String),
}

/// ユーザー操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// エントリを追加
    Entry(String),
    /// コマンドを実行
    Command(String),
    /// クリップボードを全消去
    Clear,
    /// エントリを削除
    Delete(String),
    /// ヘルプを表示
    Help,
    /// 終了
    Quit,
    /// 空行
    Empty,
}

/// 入力行を解析
pub fn parse_line(line: &str) -> Result<UserAction, InputError> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.trim().is_empty() {
        return Ok(UserAction::Empty);
    }

    // エスケープされた先頭文字はそのままエントリとして送る
    if let Some(rest) = line.strip_prefix('\\') {
        if rest.starts_with('!') || rest.starts_with(':') || rest.starts_with('\\') {
            return Ok(UserAction::Entry(rest.to_string()));
        }
    }

    if let Some(command) = line.strip_prefix('!') {
        let command = command.trim();
        if command.is_empty() {
            return Err(InputError::EmptyCommand);
        }
        return Ok(UserAction::Command(command.to_string()));
    }

    if let Some(directive) = line.strip_prefix(':') {
        let mut parts = directive.split_whitespace();
        let name = parts.next().unwrap_or("");
        return match name {
            "clear" => Ok(UserAction::Clear),
            "del" | "delete" => parts
                .next()
                .map(|id| UserAction::Delete(id.to_string()))
                .ok_or(InputError::MissingArgument("ID")),
            "help" | "h" | "?" => Ok(UserAction::Help),
            "quit" | "q" | "exit" => Ok(UserAction::Quit),
            other => Err(InputError::UnknownDirective(other.to_string())),
        };
    }

    Ok(UserAction::Entry(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_entry() {
        assert_eq!(parse_line("hello world\n"), Ok(UserAction::Entry("hello world".to_string())));
        assert_eq!(parse_line("  indented\r\n"), Ok(UserAction::Entry("  indented".to_string())));
    }

    #[test]
    fn test_command() {
        assert_eq!(parse_line("!ls -la"), Ok(UserAction::Command("ls -la".to_string())));
        assert_eq!(parse_line("!   "), Err(InputError::EmptyCommand));
    }

    #[test]
    fn test_directives() {
        assert_eq!(parse_line(":clear"), Ok(UserAction::Clear));
        assert_eq!(parse_line(":del 3"), Ok(UserAction::Delete("3".to_string())));
        assert_eq!(parse_line(":del"), Err(InputError::MissingArgument("ID")));
        assert_eq!(parse_line(":q"), Ok(UserAction::Quit));
        assert_eq!(parse_line(":help"), Ok(UserAction::Help));
        assert_eq!(
            parse_line(":nope"),
            Err(InputError::UnknownDirective("nope".to_string()))
        );
    }

    #[test]
    fn test_escape_and_empty() {
        assert_eq!(parse_line("\\!not a command"), Ok(UserAction::Entry("!not a command".to_string())));
        assert_eq!(parse_line("\\:clear"), Ok(UserAction::Entry(":clear".to_string())));
        assert_eq!(parse_line("\\plain"), Ok(UserAction::Entry("\\plain".to_string())));
        assert_eq!(parse_line("   \n"), Ok(UserAction::Empty));
    }
}
