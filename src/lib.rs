//! Flash access proxy for filesystem block-device callbacks.
//!
//! Every read, program and erase issued by the filesystem engine is handed to a
//! single executor whose stack lives in internal RAM, so callers running with
//! their stack in PSRAM never touch the flash driver directly. The caller
//! blocks until the executor reports back; one request is in flight at a time.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

// Declare modules at the crate root
pub mod cfg;
pub mod mem;
pub mod proxy;
#[cfg(feature = "esp32c6")]
pub mod task;

pub use cfg::flash_cfg::{ConfigError, MountConfig};
pub use mem::partition::{Partition, PartitionError};
pub use mem::scratch::ScratchBuffer;
pub use proxy::client::FlashProxy;
pub use proxy::error::{status_of, ProxyError, LFS_ERR_IO, LFS_ERR_OK};
pub use proxy::executor::ProxyExecutor;
pub use proxy::hal::LfsBlockDevice;
pub use proxy::request::OperationKind;
