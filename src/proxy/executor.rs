use core::cell::RefCell;
use core::future::pending;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::{Receiver, Sender};
use embedded_storage::nor_flash::NorFlash;
use log::{error, info, trace, warn};

use crate::mem::partition::{self, PartitionError};
use crate::proxy::error::ProxyError;
use crate::proxy::request::{Completion, OperationKind, Request};

/// Where the flash driver waits while no executor owns it
pub(crate) type FlashSlot<F> = BlockingMutex<CriticalSectionRawMutex, RefCell<Option<F>>>;

/// The worker that owns the flash driver and performs every operation.
///
/// Obtained once from [`FlashProxy::start`](crate::FlashProxy::start) and meant
/// to run on a context whose stack is in internal RAM, e.g. a high priority
/// interrupt executor. The proxy only accepts requests while [`run`](Self::run)
/// is serving; dropping an executor that never ran parks the driver again so
/// `start` can be retried.
pub struct ProxyExecutor<'a, F> {
    flash: Option<F>,
    slot: &'a FlashSlot<F>,
    running: &'a AtomicBool,
    requests: Receiver<'a, CriticalSectionRawMutex, Request, 1>,
    completions: Sender<'a, CriticalSectionRawMutex, Completion, 1>,
}

impl<'a, F: NorFlash> ProxyExecutor<'a, F> {
    pub(crate) fn new(
        flash: F,
        slot: &'a FlashSlot<F>,
        running: &'a AtomicBool,
        requests: Receiver<'a, CriticalSectionRawMutex, Request, 1>,
        completions: Sender<'a, CriticalSectionRawMutex, Completion, 1>,
    ) -> Self {
        Self {
            flash: Some(flash),
            slot,
            running,
            requests,
            completions,
        }
    }

    /// Serve requests forever: wait, execute exactly one device call, reply
    pub async fn run(mut self) -> ! {
        let Some(mut flash) = self.flash.take() else {
            error!("[FlashProxy] executor has no flash driver");
            loop {
                pending::<()>().await;
            }
        };
        self.running.store(true, Ordering::Release);
        info!("[FlashProxy] executor running");
        loop {
            let request = self.requests.receive().await;
            let completion = execute(&mut flash, request);
            self.completions.send(completion).await;
        }
    }
}

impl<F> Drop for ProxyExecutor<'_, F> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(flash) = self.flash.take() {
            warn!("[FlashProxy] executor dropped before running, flash driver parked");
            self.slot.lock(|cell| *cell.borrow_mut() = Some(flash));
        }
    }
}

/// Perform the device call described by `request` and hand the scratch
/// storage back with the outcome.
pub(crate) fn execute<F: NorFlash>(flash: &mut F, request: Request) -> Completion {
    let Request {
        kind,
        partition: part,
        offset,
        mut buffer,
        length,
    } = request;
    trace!(
        "[FlashProxy] {} {} bytes at 0x{offset:08X} on '{}'",
        kind.as_str(),
        length,
        part.label
    );

    let result = match (kind, buffer.as_mut()) {
        (OperationKind::Read, Some(buf)) => match buf.get_mut(..length) {
            Some(buf) => device(kind, offset, partition::read(flash, &part, offset, buf)),
            None => invalid(kind, length),
        },
        (OperationKind::Write, Some(buf)) => match buf.get(..length) {
            Some(buf) => device(kind, offset, partition::write(flash, &part, offset, buf)),
            None => invalid(kind, length),
        },
        (OperationKind::Erase, _) => {
            let erased = u32::try_from(length)
                .map_err(|_| PartitionError::OutOfBounds)
                .and_then(|size| partition::erase_range(flash, &part, offset, size));
            device(kind, offset, erased)
        }
        _ => invalid(kind, length),
    };

    Completion {
        outcome: result,
        buffer,
    }
}

fn device(
    kind: OperationKind,
    offset: u32,
    result: Result<(), PartitionError>,
) -> Result<(), ProxyError> {
    result.map_err(|e| {
        error!(
            "[FlashProxy] failed to perform flash {} at 0x{offset:08X}, err {e}",
            kind.as_str()
        );
        ProxyError::from(e)
    })
}

fn invalid(kind: OperationKind, length: usize) -> Result<(), ProxyError> {
    error!("[FlashProxy] rejected {kind:?} request of {length} bytes");
    Err(ProxyError::InvalidOperation)
}
