//! Credential store backends.

pub mod memory;
pub mod user;

pub use memory::MemoryUserStore;
pub use user::UserRepository;
