use alloc::vec::Vec;

use crate::cfg::flash_cfg::MountConfig;
use crate::mem::partition::Partition;
use crate::proxy::error::ProxyError;

/// The operation the executor is asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    None,
    Read,
    Write,
    Erase,
    Invalid,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Erase => "erase",
            OperationKind::None | OperationKind::Invalid => "unknown",
        }
    }
}

/// `block * block_size + offset`, or `InvalidOperation` if it does not fit
/// the flash address space.
pub fn absolute_offset(block_size: u32, block: u32, offset: u32) -> Result<u32, ProxyError> {
    block
        .checked_mul(block_size)
        .and_then(|base| base.checked_add(offset))
        .ok_or(ProxyError::InvalidOperation)
}

/// One operation travelling from a caller to the executor.
///
/// Read and write requests own the scratch storage while in flight; it comes
/// back in the matching [`Completion`].
#[derive(Debug)]
pub struct Request {
    pub(crate) kind: OperationKind,
    pub(crate) partition: Partition,
    pub(crate) offset: u32,
    pub(crate) buffer: Option<Vec<u8>>,
    pub(crate) length: usize,
}

impl Request {
    pub(crate) fn compose(
        kind: OperationKind,
        config: &MountConfig,
        block: u32,
        offset: u32,
        length: usize,
    ) -> Result<Self, ProxyError> {
        let offset = absolute_offset(config.block_size, block, offset)?;
        Ok(Self {
            kind,
            partition: config.partition.clone(),
            offset,
            buffer: None,
            length,
        })
    }

    /// Erase always covers exactly one block and carries no buffer
    pub(crate) fn erase(config: &MountConfig, block: u32) -> Result<Self, ProxyError> {
        Self::compose(
            OperationKind::Erase,
            config,
            block,
            0,
            config.block_size as usize,
        )
    }

    pub(crate) fn with_buffer(mut self, buffer: Vec<u8>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

/// The executor's answer to one [`Request`]
#[derive(Debug)]
pub struct Completion {
    pub(crate) outcome: Result<(), ProxyError>,
    pub(crate) buffer: Option<Vec<u8>>,
}
