//! サーバーアプリケーション
//!
//! クリップボードリレーサーバーのメインアプリケーションを実装します。

use crate::clipboard::Clipboard;
use crate::config::ServerSettings;
use crate::network::hub::Hub;
use crate::network::session::Dispatcher;
use crate::network::websocket_server::WebSocketServer;
use crate::network::{NetworkError, NetworkServer};

use clipboard_relay_common::config::ConfigError;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use parking_lot::Mutex;
use thiserror::Error;

/// 状態確認の間隔
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// 接続状況をログに出す間隔
const REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// アプリケーションエラー
#[derive(Error, Debug)]
pub enum AppError {
    /// 設定エラー
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// ネットワークエラー
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// 状態エラー
    #[error("不正なアプリケーション状態: {0:?}")]
    InvalidState(AppState),
}

/// アプリケーション状態
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum AppState {
    /// 初期化中
    Initializing,
    /// 準備完了
    Ready,
    /// サーバー実行中
    Running,
    /// 終了中
    ShuttingDown,
}

/// アプリケーション
pub struct App {
    /// アプリケーション状態
    state: AppState,
    /// サーバー設定
    settings: ServerSettings,
    /// 共有クリップボード
    clipboard: Arc<Mutex<Clipboard>>,
    /// ネットワークサーバー
    server: Option<Box<dyn NetworkServer + Send>>,
    /// アプリケーション開始時刻
    start_time: Instant,
    /// 終了コマンド受信チャネル
    exit_receiver: mpsc::Receiver<()>,
    /// 終了コマンド送信チャネル
    exit_sender: mpsc::Sender<()>,
}

impl App {
    /// 新しいアプリケーションを作成
    pub fn new(settings: ServerSettings) -> Self {
        let (exit_sender, exit_receiver) = mpsc::channel();
        Self {
            state: AppState::Initializing,
            settings,
            clipboard: Arc::new(Mutex::new(Clipboard::new())),
            server: None,
            start_time: Instant::now(),
            exit_receiver,
            exit_sender,
        }
    }

    /// アプリケーションを初期化
    pub fn initialize(&mut self) -> Result<(), AppError> {
        if self.state != AppState::Initializing {
            return Err(AppError::InvalidState(self.state));
        }

        self.settings.validate()?;

        if self.settings.features.cli_enabled {
            warn!("CLIが有効です。接続したクライアントはサーバー上でコマンドを実行できます");
        }

        let dispatcher = Dispatcher::new(self.clipboard.clone(), self.settings.features.cli_enabled);
        let server = WebSocketServer::new(self.settings.network.clone(), dispatcher, Arc::new(Hub::new()))?;
        self.server = Some(Box::new(server));

        self.state = AppState::Ready;
        Ok(())
    }

    /// 終了要求を送るためのハンドルを取得
    pub fn exit_handle(&self) -> mpsc::Sender<()> {
        self.exit_sender.clone()
    }

    /// アプリケーション状態を取得
    pub fn state(&self) -> AppState {
        self.state
    }

    /// 共有クリップボードを取得
    pub fn clipboard(&self) -> &Arc<Mutex<Clipboard>> {
        &self.clipboard
    }

    /// 待ち受けアドレスを取得
    pub fn address(&self) -> Option<SocketAddr> {
        self.server.as_ref().and_then(|server| server.get_address())
    }

    /// 終了要求を受けるまでサーバーを実行
    pub fn run(&mut self) -> Result<(), AppError> {
        if self.state == AppState::Initializing {
            self.initialize()?;
        }

        let server = self.server.as_mut().ok_or(AppError::InvalidState(self.state))?;
        server.start()?;
        self.state = AppState::Running;

        if let Some(addr) = server.get_address() {
            let scheme = if self.settings.network.use_tls { "wss" } else { "ws" };
            info!("リレーエンドポイント: {}://{}/?ws", scheme, addr);
        }

        let mut last_report = Instant::now();
        loop {
            match self.exit_receiver.recv_timeout(STATUS_INTERVAL) {
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                    info!("終了要求を受信しました");
                    break;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
            }

            if !server.is_running() {
                warn!("サーバーが停止しました");
                break;
            }

            if last_report.elapsed() >= REPORT_INTERVAL {
                debug!(
                    "接続中クライアント: {} / エントリ数: {} / 稼働時間: {}秒",
                    server.connected_clients(),
                    self.clipboard.lock().len(),
                    self.start_time.elapsed().as_secs()
                );
                last_report = Instant::now();
            }
        }

        self.shutdown()
    }

    /// サーバーを停止
    pub fn shutdown(&mut self) -> Result<(), AppError> {
        self.state = AppState::ShuttingDown;
        if let Some(server) = self.server.as_mut() {
            server.stop()?;
        }
        info!("サーバーを終了しました");
        Ok(())
    }
}
