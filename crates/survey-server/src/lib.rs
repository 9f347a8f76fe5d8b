pub mod cache;
pub mod config;
pub mod pages;
pub mod security;
pub mod server;

pub use server::{router, AppError, AppState, Server};
