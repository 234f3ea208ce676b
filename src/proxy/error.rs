use core::fmt;

use crate::mem::partition::PartitionError;

/// Success status returned to the filesystem engine
pub const LFS_ERR_OK: i32 = 0;
/// Generic I/O failure status returned to the filesystem engine
pub const LFS_ERR_IO: i32 = -5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyError {
    /// The executor was never started
    NotStarted,
    /// The scratch buffer could not grow to the requested size
    AllocationFailure,
    /// The partition read/write/erase failed
    DeviceFailure,
    /// The request carried no executable operation
    InvalidOperation,
}

impl ProxyError {
    /// Every proxy failure collapses to the engine's generic I/O code
    pub fn status(&self) -> i32 {
        LFS_ERR_IO
    }
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::NotStarted => write!(f, "flash proxy task not started"),
            ProxyError::AllocationFailure => write!(f, "scratch buffer allocation failed"),
            ProxyError::DeviceFailure => write!(f, "flash operation failed"),
            ProxyError::InvalidOperation => write!(f, "invalid flash operation"),
        }
    }
}

impl From<PartitionError> for ProxyError {
    fn from(_: PartitionError) -> Self {
        ProxyError::DeviceFailure
    }
}

pub fn status_of(result: Result<(), ProxyError>) -> i32 {
    match result {
        Ok(()) => LFS_ERR_OK,
        Err(e) => e.status(),
    }
}
