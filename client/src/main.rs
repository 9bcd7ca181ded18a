//! クライアントエントリポイント
//!
//! クリップボードリレークライアントのメインエントリポイント

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::thread;

use clap::Parser;
use clipboard_relay_client::network::WebSocketClient;
use clipboard_relay_client::ui::{AppSettings, TerminalSurface};
use clipboard_relay_client::App;
use clipboard_relay_common::utils::logging::{init_logger, set_panic_hook};
use clipboard_relay_common::utils::path::get_config_dir;

/// クリップボードリレークライアント
#[derive(Parser, Debug)]
#[command(name = "clipboard-relay-client", version, about)]
struct Args {
    /// 接続先のオリジン（例: https://host:8443）
    #[arg(short, long)]
    url: Option<String>,

    /// 設定ファイル（JSON または TOML）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ログレベル（trace, debug, info, warn, error）
    #[arg(long)]
    log_level: Option<String>,

    /// ログファイル
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// 確認を自動的に承認
    #[arg(short, long)]
    yes: bool,

    /// 現在の設定を設定ファイルに保存して終了
    #[arg(long)]
    save_config: bool,
}

impl Args {
    /// コマンドライン引数で設定を上書き
    fn apply(&self, settings: &mut AppSettings) {
        if let Some(url) = &self.url {
            settings.server_url = url.clone();
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        if let Some(file) = &self.log_file {
            settings.log_file = Some(file.clone());
        }
        if self.yes {
            settings.assume_yes = true;
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    log::error!("{}", message);
    process::exit(1);
}

fn main() {
    let args = Args::parse();

    // 設定を読み込み
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| get_config_dir().join("client.toml"));
    let mut settings = match AppSettings::load(&config_path) {
        Ok(settings) => settings,
        Err(e) => fail(&format!("設定の読み込みに失敗しました ({}): {}", config_path.display(), e)),
    };
    args.apply(&mut settings);
    if let Err(e) = settings.validate() {
        fail(&e.to_string());
    }

    // ロガーを初期化（ログファイル未指定時は標準エラー出力）
    let level = match settings.log_level() {
        Ok(level) => level,
        Err(e) => fail(&e.to_string()),
    };
    if let Err(e) = init_logger(level, settings.log_file.as_deref()) {
        fail(&format!("ロガーの初期化に失敗しました: {}", e));
    }
    set_panic_hook();

    if args.save_config {
        match settings.save(&config_path) {
            Ok(()) => println!("設定を保存しました: {}", config_path.display()),
            Err(e) => fail(&format!("設定の保存に失敗しました: {}", e)),
        }
        return;
    }

    log::info!(
        "クリップボードリレークライアント v{} ({})",
        env!("CARGO_PKG_VERSION"),
        clipboard_relay_common::get_platform_name()
    );

    let endpoint = match settings.relay_endpoint() {
        Ok(endpoint) => endpoint,
        Err(e) => fail(&e.to_string()),
    };

    let client = match WebSocketClient::connect(endpoint) {
        Ok(client) => client,
        Err(e) => fail(&format!("サーバーに接続できませんでした: {}", e)),
    };

    // 標準入力を読み込むスレッド
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::error!("標準入力の読み込みエラー: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        fail(&format!("入力スレッドを起動できませんでした: {}", e));
    }

    let surface = TerminalSurface::new(io::stdout(), rx, settings.assume_yes);
    let mut app = App::new(client, surface);
    app.run();
}
