//! クリップボードリレーサーバーエントリポイント
//!
//! クリップボードリレーサーバーのメインエントリポイント

use std::path::PathBuf;
use std::process;

use clap::Parser;
use clipboard_relay_common::utils::logging::{init_logger, set_panic_hook};
use clipboard_relay_common::utils::path::get_config_dir;
use clipboard_relay_server::{App, ServerSettings};

/// クリップボードリレーサーバー
#[derive(Parser, Debug)]
#[command(name = "clipboard-relay-server", version, about)]
struct Args {
    /// 設定ファイル（JSON または TOML）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// バインドアドレス
    #[arg(short, long)]
    bind: Option<String>,

    /// ポート番号
    #[arg(short, long)]
    port: Option<u16>,

    /// ブラウザからのコマンド実行を許可
    #[arg(long)]
    cli: bool,

    /// 最大接続数
    #[arg(long)]
    max_connections: Option<usize>,

    /// TLSアイデンティティ（PKCS#12）
    #[arg(long)]
    tls_identity: Option<PathBuf>,

    /// TLSアイデンティティのパスワード
    #[arg(long)]
    tls_password: Option<String>,

    /// ログレベル（trace, debug, info, warn, error）
    #[arg(long)]
    log_level: Option<String>,

    /// ログファイル
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// 現在の設定を設定ファイルに保存して終了
    #[arg(long)]
    save_config: bool,
}

impl Args {
    /// コマンドライン引数で設定を上書き
    fn apply(&self, settings: &mut ServerSettings) {
        if let Some(bind) = &self.bind {
            settings.network.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            settings.network.port = port;
        }
        if self.cli {
            settings.features.cli_enabled = true;
        }
        if let Some(max) = self.max_connections {
            settings.network.max_connections = max;
        }
        if let Some(path) = &self.tls_identity {
            settings.network.use_tls = true;
            settings.network.tls_identity_path = Some(path.clone());
        }
        if let Some(password) = &self.tls_password {
            settings.network.tls_identity_password = password.clone();
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
        if let Some(file) = &self.log_file {
            settings.logging.file = Some(file.clone());
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
        .unwrap_or_else(|| get_config_dir().join("server.toml"));
    let mut settings = match ServerSettings::load(&config_path) {
        Ok(settings) => settings,
        Err(e) => fail(&format!("設定の読み込みに失敗しました ({}): {}", config_path.display(), e)),
    };
    args.apply(&mut settings);

    // ロガーを初期化
    let level = match settings.logging.log_level() {
        Ok(level) => level,
        Err(e) => fail(&e.to_string()),
    };
    if let Err(e) = init_logger(level, settings.logging.file.as_deref()) {
        fail(&format!("ロガーの初期化に失敗しました: {}", e));
    }

    // パニックハンドラを設定（未処理のパニックをログに記録）
    set_panic_hook();

    if args.save_config {
        match settings.save(&config_path) {
            Ok(()) => println!("設定を保存しました: {}", config_path.display()),
            Err(e) => fail(&format!("設定の保存に失敗しました: {}", e)),
        }
        return;
    }

    log::info!(
        "クリップボードリレーサーバー v{} ({})",
        env!("CARGO_PKG_VERSION"),
        clipboard_relay_common::get_platform_name()
    );

    // アプリケーションを実行
    let mut app = App::new(settings);
    if let Err(e) = app.run() {
        fail(&format!("アプリケーションの実行中にエラーが発生しました: {}", e));
    }
}
