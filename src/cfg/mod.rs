// src/cfg/mod.rs
pub mod flash_cfg;
