//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP / WebSocket 请求委托给应用层的用例
//! 服务与实时核心。HTTP 侧的编辑/删除与 socket 管线共用同一条
//! message_updated 扇出路径，两条访问路径对客户端保持一致。

mod auth;
mod error;
mod routes;
mod state;
mod ws_connection;

pub use auth::{JwtService, LoginResponse};
pub use config::JwtConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
