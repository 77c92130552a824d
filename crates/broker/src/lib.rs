// Файл: crates/broker/src/lib.rs
pub mod config;
pub mod http_api;
pub mod lookup;
