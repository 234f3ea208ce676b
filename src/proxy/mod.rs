// src/proxy/mod.rs
pub mod client;
pub mod error;
pub mod executor;
pub mod hal;
pub mod request;
