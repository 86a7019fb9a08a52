//! Repositories over the redb tables
//!
//! Each repository is a cheap clone around [`Storage`](super::Storage).

pub mod lockout;
pub mod order;
pub mod user;

pub use lockout::LockoutRepository;
pub use order::OrderRepository;
pub use user::UserRepository;
