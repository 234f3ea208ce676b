// src/mem/mod.rs
pub mod partition;
pub mod scratch;
