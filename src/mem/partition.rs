use core::fmt;

use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash};
use heapless::String;

use crate::cfg::flash_cfg::PARTITION_LABEL_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionError {
    LabelTooLong,
    OutOfBounds,
    Misaligned,
    Flash(NorFlashErrorKind),
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionError::LabelTooLong => write!(f, "partition label too long"),
            PartitionError::OutOfBounds => write!(f, "range outside partition"),
            PartitionError::Misaligned => write!(f, "erase range not sector aligned"),
            PartitionError::Flash(kind) => write!(f, "flash driver error: {kind:?}"),
        }
    }
}

/// A labelled region of the flash chip.
///
/// All offsets taken by the functions below are relative to the start of the
/// partition; the flash driver only ever sees `self.offset + offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub label: String<PARTITION_LABEL_LEN>,
    pub offset: u32,
    pub size: u32,
}

impl Partition {
    pub fn new(label: &str, offset: u32, size: u32) -> Result<Self, PartitionError> {
        let label = String::try_from(label).map_err(|_| PartitionError::LabelTooLong)?;
        if offset.checked_add(size).is_none() {
            return Err(PartitionError::OutOfBounds);
        }
        Ok(Self {
            label,
            offset,
            size,
        })
    }

    /// Translate a partition-relative range into an absolute flash address
    fn absolute(&self, offset: u32, len: usize) -> Result<u32, PartitionError> {
        let len = u32::try_from(len).map_err(|_| PartitionError::OutOfBounds)?;
        let end = offset.checked_add(len).ok_or(PartitionError::OutOfBounds)?;
        if end > self.size {
            return Err(PartitionError::OutOfBounds);
        }
        Ok(self.offset + offset)
    }
}

fn flash_error<E: NorFlashError>(e: E) -> PartitionError {
    PartitionError::Flash(e.kind())
}

/// Read `buf.len()` bytes at `offset` within the partition
pub fn read<F: ReadNorFlash>(
    flash: &mut F,
    partition: &Partition,
    offset: u32,
    buf: &mut [u8],
) -> Result<(), PartitionError> {
    let address = partition.absolute(offset, buf.len())?;
    flash.read(address, buf).map_err(flash_error)
}

/// Program `data` at `offset` within the partition. The range must have been
/// erased beforehand.
pub fn write<F: NorFlash>(
    flash: &mut F,
    partition: &Partition,
    offset: u32,
    data: &[u8],
) -> Result<(), PartitionError> {
    let address = partition.absolute(offset, data.len())?;
    flash.write(address, data).map_err(flash_error)
}

/// Erase `[offset, offset + size)` within the partition. Both ends must sit
/// on a flash sector boundary.
pub fn erase_range<F: NorFlash>(
    flash: &mut F,
    partition: &Partition,
    offset: u32,
    size: u32,
) -> Result<(), PartitionError> {
    let sector = F::ERASE_SIZE as u32;
    if offset % sector != 0 || size % sector != 0 {
        return Err(PartitionError::Misaligned);
    }
    let from = partition.absolute(offset, size as usize)?;
    flash.erase(from, from + size).map_err(flash_error)
}
