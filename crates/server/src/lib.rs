pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod state;
