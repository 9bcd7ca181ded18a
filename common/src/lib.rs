//! クリップボードリレー共通ライブラリ
//!
//! このクレートは、クリップボードリレーで使用される共通の機能を提供します。
//! ネイティブクライアント、Webクライアント、サーバーのすべてで使用されます。

pub mod config;
pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod utils;

// 主要コンポーネントを再エクスポート
pub use endpoint::Origin;
pub use error::{CommonError, Result};
pub use protocol::{ClientMessage, ConnectionState, Packet, ServerMessage};
pub use relay::{InboundOutcome, InputField, RelayClient, RenderSurface, Transport};

/// ライブラリのバージョン
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// プラットフォーム名を取得
pub fn get_platform_name() -> &'static str {
    if cfg!(target_arch = "wasm32") {
        "WebAssembly"
    } else if cfg!(target_os = "windows") {
        "Windows"
    } else if cfg!(target_os = "macos") {
        "macOS"
    } else if cfg!(target_os = "linux") {
        "Linux"
    } else {
        "Unknown"
    }
}
