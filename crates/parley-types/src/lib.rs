pub mod api;
pub mod error;
pub mod models;
pub mod pagination;

pub use error::{ChatError, ChatResult};
