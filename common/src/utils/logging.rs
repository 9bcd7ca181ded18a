//! ロギング機能
//!
//! `env_logger` を用いてアプリケーションのロギングを初期化します。
//! 出力先は標準エラー出力または追記モードのログファイルです。

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// ログレベル
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// トレース情報
    Trace = 0,
    /// デバッグ情報
    Debug = 1,
    /// 一般情報
    Info = 2,
    /// 警告
    Warn = 3,
    /// エラー
    Error = 4,
}

impl LogLevel {
    /// ログレベルを文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// 文字列からログレベルを解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "ERROR" | "ERR" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// `log` クレートのフィルタに変換
    pub fn to_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// ロガーを構築
///
/// `RUST_LOG` が設定されている場合はそちらが優先されます。
pub fn build_logger(level: LogLevel, log_file: Option<&Path>) -> io::Result<Builder> {
    let mut builder = Builder::new();
    builder.filter_level(level.to_filter());
    builder.parse_env(Env::default());

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {}: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(path) = log_file {
        // ディレクトリが存在しない場合は作成
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    Ok(builder)
}

/// グローバルロガーを初期化
///
/// 既に初期化されている場合は何もしません。
pub fn init_logger(level: LogLevel, log_file: Option<&Path>) -> io::Result<()> {
    let mut builder = build_logger(level, log_file)?;
    if builder.try_init().is_err() {
        log::debug!("ロガーは既に初期化されています");
    }
    Ok(())
}

/// パニック時のログ記録ハンドラーを設定
pub fn set_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = match panic_info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => s.as_str(),
                None => "Unknown panic payload",
            },
        };

        let location = match panic_info.location() {
            Some(loc) => format!(" at {}:{}", loc.file(), loc.line()),
            None => String::new(),
        };

        eprintln!("パニックが発生しました: {}{}", message, location);
        log::error!("Panic: {}{}", message, location);
    }));
}
