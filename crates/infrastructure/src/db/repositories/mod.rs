mod channel_member_repository_impl;
mod channel_repository_impl;
mod message_repository_impl;
mod user_repository_impl;

pub use channel_member_repository_impl::PgChannelMemberRepository;
pub use channel_repository_impl::PgChannelRepository;
pub use message_repository_impl::PgMessageRepository;
pub use user_repository_impl::PgUserRepository;
