//! Client session: bearer token, profile and derived flags.

mod manager;
pub mod store;

pub use manager::{LoginSuccess, SessionManager};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
