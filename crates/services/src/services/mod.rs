pub mod auth;
pub mod cache;
pub mod chatbot;
pub mod config;
pub mod mood;
pub mod rate_limit;
pub mod tasbih;
