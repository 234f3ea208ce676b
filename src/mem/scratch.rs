use alloc::vec::Vec;
use core::mem;

use log::{error, trace};

use crate::proxy::error::ProxyError;

/// Staging buffer shuttled between callers and the flash executor.
///
/// The backing storage comes from the global heap, which on target is placed
/// in internal DRAM by `esp-alloc` and is therefore always reachable by the
/// flash driver. Capacity only ever grows.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    storage: Vec<u8>,
}

impl ScratchBuffer {
    pub const fn new() -> Self {
        Self {
            storage: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Grow the buffer to at least `size` bytes. Never shrinks.
    pub fn ensure_capacity(&mut self, size: usize) -> Result<(), ProxyError> {
        let current = self.storage.len();
        if size <= current {
            return Ok(());
        }
        self.storage.try_reserve_exact(size - current).map_err(|e| {
            error!("[FlashProxy] cannot grow scratch buffer from {current} to {size} bytes: {e:?}");
            ProxyError::AllocationFailure
        })?;
        self.storage.resize(size, 0);
        trace!("[FlashProxy] scratch buffer grown to {size} bytes");
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    /// Hand the storage over to the executor for the duration of one request
    pub(crate) fn lend(&mut self) -> Vec<u8> {
        mem::take(&mut self.storage)
    }

    pub(crate) fn reclaim(&mut self, storage: Vec<u8>) {
        self.storage = storage;
    }
}
