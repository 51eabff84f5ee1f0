//! Backend access over HTTP.

pub mod backend;
pub mod client;

pub use backend::{Backend, GuestSession, HttpBackend, USER_ID_HEADER};
pub use client::ApiClient;
