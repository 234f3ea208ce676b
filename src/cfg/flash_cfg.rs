use core::fmt;

use crate::mem::partition::Partition;

// Geometry defaults for the on-chip SPI flash (4KB sectors, 256 byte pages)
pub const DEFAULT_BLOCK_SIZE: u32 = 4096;
pub const DEFAULT_READ_SIZE: u32 = 16;
pub const DEFAULT_PROG_SIZE: u32 = 256;
// Partition table labels are at most 16 bytes
pub const PARTITION_LABEL_LEN: usize = 16;
// Data partition holding the filesystem, right after a 1MB factory app
pub const DEFAULT_PARTITION_LABEL: &str = "littlefs";
pub const DEFAULT_PARTITION_OFFSET: u32 = 0x110000;
pub const DEFAULT_PARTITION_SIZE: u32 = 0x100000; // 1 MiB

/// Priority of the interrupt executor that runs the flash proxy. It has to be
/// above thread mode so the proxy preempts callers blocked on a completion.
#[cfg(feature = "esp32c6")]
pub const EXECUTOR_PRIORITY: esp_hal::interrupt::Priority =
    esp_hal::interrupt::Priority::Priority2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ZeroBlockSize,
    UnalignedPartition,
    UnalignedIoSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroBlockSize => write!(f, "block size must be non-zero"),
            ConfigError::UnalignedPartition => {
                write!(f, "partition size is not a multiple of the block size")
            }
            ConfigError::UnalignedIoSize => {
                write!(f, "read/prog size must divide the block size")
            }
        }
    }
}

/// Per-mount context handed to every block-device callback.
///
/// `block_size` is read-only once mounted; the proxy never re-derives it from
/// the flash geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    pub partition: Partition,
    pub block_size: u32,
    pub read_size: u32,
    pub prog_size: u32,
}

impl MountConfig {
    pub fn new(
        partition: Partition,
        block_size: u32,
        read_size: u32,
        prog_size: u32,
    ) -> Result<Self, ConfigError> {
        if block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if partition.size % block_size != 0 {
            return Err(ConfigError::UnalignedPartition);
        }
        if read_size == 0
            || prog_size == 0
            || block_size % read_size != 0
            || block_size % prog_size != 0
        {
            return Err(ConfigError::UnalignedIoSize);
        }
        Ok(Self {
            partition,
            block_size,
            read_size,
            prog_size,
        })
    }

    /// Mount the whole partition with the default flash geometry
    pub fn with_defaults(partition: Partition) -> Result<Self, ConfigError> {
        Self::new(partition, DEFAULT_BLOCK_SIZE, DEFAULT_READ_SIZE, DEFAULT_PROG_SIZE)
    }

    pub fn block_count(&self) -> u32 {
        self.partition.size / self.block_size
    }
}
