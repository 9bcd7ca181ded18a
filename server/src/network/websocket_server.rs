//! WebSocket サーバー実装
//!
//! WebSocket を使用してリレークライアントと通信するサーバーを実装します。
//! ハンドシェイクは `/?ws` へのリクエストのみ受け付けます。

use super::hub::Hub;
use super::session::{ClientSession, Dispatcher, SessionStream};
use super::{NetworkError, NetworkServer, SessionInfo};
use crate::config::NetworkSettings;

use std::fs;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use native_tls::{Identity, TlsAcceptor};
use parking_lot::Mutex;

// WebSocket関連
use tungstenite::accept_hdr_with_config;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::protocol::WebSocketConfig;

/// セッションの読み込みポーリング間隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 接続受付のポーリング間隔
const ACCEPT_INTERVAL: Duration = Duration::from_millis(100);

/// セッションスレッドに渡す共有データ
#[derive(Clone)]
struct SessionContext {
    dispatcher: Dispatcher,
    hub: Arc<Hub>,
    running: Arc<Mutex<bool>>,
    tls_acceptor: Option<TlsAcceptor>,
    ws_config: WebSocketConfig,
}

/// 受け付けた接続の枠
///
/// ハンドシェイク中の接続も数え、ドロップ時に枠を返します。
struct ConnectionSlot(Arc<AtomicUsize>);

impl ConnectionSlot {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// WebSocket サーバー
pub struct WebSocketServer {
    /// ネットワーク設定
    settings: NetworkSettings,
    /// メッセージの振り分け
    dispatcher: Dispatcher,
    /// 配信ハブ
    hub: Arc<Hub>,
    /// リスナースレッド
    listener_thread: Option<thread::JoinHandle<()>>,
    /// スレッド管理用チャネル
    thread_control: Option<mpsc::Sender<()>>,
    /// 起動中フラグ
    running: Arc<Mutex<bool>>,
    /// 受け付け済みの接続数
    connections: Arc<AtomicUsize>,
    /// TLS Acceptor（TLS有効時）
    tls_acceptor: Option<TlsAcceptor>,
    /// サーバーアドレス
    server_addr: Option<SocketAddr>,
}

impl WebSocketServer {
    /// 新しいWebSocketサーバーを作成
    pub fn new(
        settings: NetworkSettings,
        dispatcher: Dispatcher,
        hub: Arc<Hub>,
    ) -> Result<Self, NetworkError> {
        // TLSが有効な場合はTLS Acceptorを作成
        let tls_acceptor = if settings.use_tls {
            let identity_path = settings.tls_identity_path.as_ref().ok_or_else(|| {
                NetworkError::Other("TLSアイデンティティのパスが指定されていません".to_string())
            })?;
            Some(load_tls_acceptor(identity_path, &settings.tls_identity_password)?)
        } else {
            None
        };

        Ok(Self {
            settings,
            dispatcher,
            hub,
            listener_thread: None,
            thread_control: None,
            running: Arc::new(Mutex::new(false)),
            connections: Arc::new(AtomicUsize::new(0)),
            tls_acceptor,
            server_addr: None,
        })
    }

    /// WebSocket設定を作成
    fn ws_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(self.settings.max_message_size);
        config.max_frame_size = Some(self.settings.max_message_size);
        config
    }

    /// クライアント接続を処理
    fn handle_client(
        stream: TcpStream,
        client_addr: SocketAddr,
        context: SessionContext,
        slot: ConnectionSlot,
    ) {
        thread::spawn(move || {
            let _slot = slot;
            info!("WebSocket接続受付: {}", client_addr);

            // リスナーの非ブロッキング設定を引き継がないようにする
            if let Err(e) = stream.set_nonblocking(false) {
                error!("ソケット設定エラー: {}", e);
                return;
            }

            match context.tls_acceptor.clone() {
                Some(acceptor) => match acceptor.accept(stream) {
                    Ok(tls_stream) => Self::serve(tls_stream, client_addr, context),
                    Err(e) => error!("TLSハンドシェイクエラー: {}", e),
                },
                None => Self::serve(stream, client_addr, context),
            }
        });
    }

    /// ハンドシェイク後のセッションを実行
    fn serve<S: SessionStream>(stream: S, client_addr: SocketAddr, context: SessionContext) {
        let websocket = match accept_hdr_with_config(stream, check_relay_request, Some(context.ws_config)) {
            Ok(ws) => ws,
            Err(e) => {
                warn!("WebSocketハンドシェイクエラー ({}): {}", client_addr, e);
                return;
            }
        };

        if let Err(e) = websocket.get_ref().set_poll_timeout(Some(POLL_INTERVAL)) {
            error!("ソケットのタイムアウト設定エラー: {}", e);
            return;
        }

        let (session_id, outbox) = context.hub.register();
        info!("WebSocket接続確立: {} (TLS: {})", client_addr, context.tls_acceptor.is_some());

        let info = SessionInfo::new(session_id.clone(), client_addr.to_string());
        let mut session = ClientSession::new(
            info,
            websocket,
            outbox,
            context.dispatcher.clone(),
            context.hub.clone(),
        );
        session.run(&context.running);

        context.hub.unregister(&session_id);
        info!(
            "WebSocket接続終了: {} (受信 {} 件)",
            client_addr,
            session.session_info().messages_received
        );
    }
}

impl NetworkServer for WebSocketServer {
    fn start(&mut self) -> Result<(), NetworkError> {
        // 既に起動していれば何もしない
        if self.is_running() {
            return Ok(());
        }

        // サーバーソケットのバインドアドレス
        let bind_addr = self.settings.bind_addr();

        // TCPリスナーを作成
        let listener = TcpListener::bind(&bind_addr)?;

        // 非ブロッキングモードに設定
        listener.set_nonblocking(true)?;

        // サーバーアドレスを保存
        let local_addr = listener.local_addr()?;
        self.server_addr = Some(local_addr);

        let (tx, rx) = mpsc::channel();
        self.thread_control = Some(tx);

        let context = SessionContext {
            dispatcher: self.dispatcher.clone(),
            hub: self.hub.clone(),
            running: self.running.clone(),
            tls_acceptor: self.tls_acceptor.clone(),
            ws_config: self.ws_config(),
        };
        let max_connections = self.settings.max_connections;
        let connections = self.connections.clone();
        let running = self.running.clone();

        // 実行中フラグをセット
        *running.lock() = true;

        // リスナースレッドを起動
        let listener_thread = thread::Builder::new()
            .name("relay-listener".to_string())
            .spawn(move || {
                info!("WebSocketサーバー起動: {}", local_addr);

                // 接続を受け付けるループ
                loop {
                    // サーバー終了要求をチェック
                    match rx.try_recv() {
                        Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
                        Err(mpsc::TryRecvError::Empty) => {}
                    }

                    match listener.accept() {
                        Ok((stream, addr)) => {
                            // 最大接続数のチェック（ハンドシェイク中の接続を含む）
                            let accepted = connections.load(Ordering::SeqCst);
                            if accepted >= max_connections {
                                warn!("最大接続数到達: {}/{} ({}を拒否)", accepted, max_connections, addr);
                                continue;
                            }

                            let slot = ConnectionSlot::acquire(&connections);
                            Self::handle_client(stream, addr, context.clone(), slot);
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                            // 接続要求がない場合は短いスリープ
                            thread::sleep(ACCEPT_INTERVAL);
                        }
                        Err(e) => {
                            error!("接続受付エラー: {}", e);
                            // 短いスリープを入れて連続エラーを防止
                            thread::sleep(Duration::from_millis(1000));
                        }
                    }
                }

                info!("WebSocketサーバー停止");

                // 実行中フラグをクリア
                *running.lock() = false;
            })
            .map_err(|e| NetworkError::ThreadError(e.to_string()))?;

        self.listener_thread = Some(listener_thread);

        Ok(())
    }

    fn stop(&mut self) -> Result<(), NetworkError> {
        // スレッド終了シグナルを送信
        if let Some(tx) = self.thread_control.take() {
            let _ = tx.send(());
        }

        // リスナースレッドの終了を待機
        if let Some(handle) = self.listener_thread.take() {
            handle
                .join()
                .map_err(|e| NetworkError::ThreadError(format!("リスナースレッドの終了に失敗: {:?}", e)))?;
        }

        *self.running.lock() = false;

        // 送信キューを破棄してすべてのセッションを終了させる
        self.hub.clear();

        Ok(())
    }

    fn is_running(&self) -> bool {
        *self.running.lock()
    }

    fn connected_clients(&self) -> usize {
        self.hub.len()
    }

    fn get_address(&self) -> Option<SocketAddr> {
        self.server_addr
    }
}

/// PKCS#12 ファイルから TLS Acceptor を作成
fn load_tls_acceptor(path: &Path, password: &str) -> Result<TlsAcceptor, NetworkError> {
    let der = fs::read(path)?;
    let identity = Identity::from_pkcs12(&der, password)?;
    let acceptor = TlsAcceptor::new(identity)?;
    debug!("TLSアイデンティティを読み込みました: {}", path.display());
    Ok(acceptor)
}

/// クエリに `ws` パラメータが含まれるか
pub fn is_relay_query(query: Option<&str>) -> bool {
    query
        .map(|q| q.split('&').any(|pair| pair == "ws" || pair.starts_with("ws=")))
        .unwrap_or(false)
}

/// リレー用エンドポイント以外へのハンドシェイクを 404 で拒否
fn check_relay_request(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if is_relay_query(request.uri().query()) {
        return Ok(response);
    }

    debug!("リレー以外へのリクエストを拒否: {}", request.uri());
    let mut error = ErrorResponse::new(Some("404 page not found".to_string()));
    *error.status_mut() = StatusCode::NOT_FOUND;
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::Clipboard;
    use clipboard_relay_common::ClientMessage;
    use std::time::Instant;
    use tungstenite::Message;

    fn start_server() -> (WebSocketServer, Arc<Mutex<Clipboard>>, SocketAddr) {
        start_server_with_limit(NetworkSettings::default().max_connections)
    }

    fn start_server_with_limit(max_connections: usize) -> (WebSocketServer, Arc<Mutex<Clipboard>>, SocketAddr) {
        let mut settings = NetworkSettings::default();
        settings.bind_address = "127.0.0.1".to_string();
        settings.port = 0;
        settings.max_connections = max_connections;

        let clipboard = Arc::new(Mutex::new(Clipboard::new()));
        let dispatcher = Dispatcher::new(clipboard.clone(), false);
        let mut server = WebSocketServer::new(settings, dispatcher, Arc::new(Hub::new())).unwrap();
        server.start().unwrap();
        let addr = server.get_address().unwrap();
        (server, clipboard, addr)
    }

    fn wait_for_clients(server: &WebSocketServer, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while server.connected_clients() < count && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(server.connected_clients(), count);
    }

    #[test]
    fn test_relay_query() {
        assert!(is_relay_query(Some("ws")));
        assert!(is_relay_query(Some("foo=1&ws")));
        assert!(!is_relay_query(Some("wss")));
        assert!(!is_relay_query(None));
    }

    #[test]
    fn test_new_entry_broadcasts_refresh() {
        let (mut server, clipboard, addr) = start_server();
        assert!(server.is_running());

        let url = format!("ws://{}/?ws", addr);
        let (mut socket, _) = tungstenite::connect(url.as_str()).unwrap();
        let frame = ClientMessage::NewEntry("hello".to_string()).encode().unwrap();
        socket.write_message(Message::Text(frame)).unwrap();

        let reply = socket.read_message().unwrap();
        assert_eq!(
            reply,
            Message::Text(r#"{"type":"refreshClipboard","content":""}"#.to_string())
        );
        assert_eq!(clipboard.lock().entries()[0].content, "hello");

        let _ = socket.close(None);
        server.stop().unwrap();
        assert!(!server.is_running());
    }

    #[test]
    fn test_broadcast_reaches_other_sessions() {
        let (mut server, _clipboard, addr) = start_server();
        let url = format!("ws://{}/?ws", addr);

        let (mut sender, _) = tungstenite::connect(url.as_str()).unwrap();
        let (mut observer, _) = tungstenite::connect(url.as_str()).unwrap();
        wait_for_clients(&server, 2);

        let frame = ClientMessage::ClearClipboard.encode().unwrap();
        sender.write_message(Message::Text(frame)).unwrap();

        let expected = Message::Text(r#"{"type":"refreshClipboard","content":""}"#.to_string());
        assert_eq!(sender.read_message().unwrap(), expected);
        assert_eq!(observer.read_message().unwrap(), expected);

        server.stop().unwrap();
    }

    #[test]
    fn test_non_relay_path_is_rejected() {
        let (mut server, _clipboard, addr) = start_server();

        let url = format!("ws://{}/", addr);
        match tungstenite::connect(url.as_str()) {
            Err(tungstenite::Error::Http(response)) => {
                assert_eq!(response.status(), StatusCode::NOT_FOUND)
            }
            other => panic!("404を期待しましたが {:?} でした", other.map(|_| ())),
        }

        server.stop().unwrap();
    }

    #[test]
    fn test_pending_handshake_counts_toward_limit() {
        let (mut server, _clipboard, addr) = start_server_with_limit(1);
        let url = format!("ws://{}/?ws", addr);

        // ハンドシェイクを送らずに枠を占有する
        let idle = TcpStream::connect(addr).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while server.connections.load(Ordering::SeqCst) < 1 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(server.connections.load(Ordering::SeqCst), 1);
        assert_eq!(server.connected_clients(), 0);

        assert!(tungstenite::connect(url.as_str()).is_err());

        // 枠が空けば接続できる
        drop(idle);
        let deadline = Instant::now() + Duration::from_secs(5);
        while server.connections.load(Ordering::SeqCst) > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        let (mut socket, _) = tungstenite::connect(url.as_str()).unwrap();
        wait_for_clients(&server, 1);

        let _ = socket.close(None);
        server.stop().unwrap();
    }
}
