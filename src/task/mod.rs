// src/task/mod.rs
pub mod flash_proxy;
