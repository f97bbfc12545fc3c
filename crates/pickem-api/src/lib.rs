// REST transport for the pick'em backend.

pub mod backend;
pub mod client;
pub mod dto;
pub mod error;

pub use backend::Backend;
pub use client::ApiClient;
pub use error::ApiError;
