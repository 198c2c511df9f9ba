//! 基础设施层。
//!
//! 提供应用层端口的具体实现：PostgreSQL 仓储和 bcrypt 密码
//! 哈希。内存仓储实现位于 application::memory，供测试使用。

pub mod db;
pub mod password;

pub use db::repositories::{
    PgChannelMemberRepository, PgChannelRepository, PgMessageRepository, PgUserRepository,
};
pub use db::create_pg_pool;
pub use password::BcryptPasswordHasher;
