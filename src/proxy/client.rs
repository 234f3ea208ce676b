use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embedded_storage::nor_flash::NorFlash;
use log::{debug, error, info};

use crate::cfg::flash_cfg::MountConfig;
use crate::mem::scratch::ScratchBuffer;
use crate::proxy::error::ProxyError;
use crate::proxy::executor::{FlashSlot, ProxyExecutor};
use crate::proxy::request::{Completion, OperationKind, Request};

/// Caller side of the flash proxy.
///
/// Owns everything the hand-off needs: the flash driver until the executor
/// claims it, the scratch buffer, and one single-slot channel in each
/// direction. Holding the scratch lock from composing a request until its
/// completion arrives keeps exactly one request in flight, whatever the
/// number of callers.
///
/// Every entry point blocks its caller. On target the executor must run on a
/// context that preempts those callers (see `task::flash_proxy`).
pub struct FlashProxy<F> {
    flash: FlashSlot<F>,
    running: AtomicBool,
    scratch: Mutex<CriticalSectionRawMutex, ScratchBuffer>,
    requests: Channel<CriticalSectionRawMutex, Request, 1>,
    completions: Channel<CriticalSectionRawMutex, Completion, 1>,
}

impl<F: NorFlash> FlashProxy<F> {
    pub const fn new(flash: F) -> Self {
        Self {
            flash: BlockingMutex::new(RefCell::new(Some(flash))),
            running: AtomicBool::new(false),
            scratch: Mutex::new(ScratchBuffer::new()),
            requests: Channel::new(),
            completions: Channel::new(),
        }
    }

    /// Hand the flash driver to the executor.
    ///
    /// The first call returns the executor, which the caller must run; later
    /// calls are no-ops returning `None` while that executor exists. Entry
    /// points keep failing with `NotStarted` until it is actually running.
    pub fn start(&self) -> Option<ProxyExecutor<'_, F>> {
        let Some(flash) = self.flash.lock(|cell| cell.borrow_mut().take()) else {
            debug!("[FlashProxy] executor already started");
            return None;
        };
        info!("[FlashProxy] executor handed out");
        Some(ProxyExecutor::new(
            flash,
            &self.flash,
            &self.running,
            self.requests.receiver(),
            self.completions.sender(),
        ))
    }

    /// Whether an executor is currently serving requests
    pub fn is_started(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Current size of the scratch buffer in bytes
    pub fn scratch_capacity(&self) -> usize {
        block_on(self.scratch.lock()).capacity()
    }

    /// Read `buf.len()` bytes at `offset` inside `block`
    pub fn read(
        &self,
        config: &MountConfig,
        block: u32,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), ProxyError> {
        self.ensure_started()?;
        block_on(async {
            let mut scratch = self.scratch.lock().await;
            scratch.ensure_capacity(buf.len())?;
            let request =
                Request::compose(OperationKind::Read, config, block, offset, buf.len())?;
            self.submit(request, Some(&mut *scratch)).await?;
            let filled = scratch
                .as_slice()
                .get(..buf.len())
                .ok_or(ProxyError::InvalidOperation)?;
            buf.copy_from_slice(filled);
            Ok::<(), ProxyError>(())
        })
    }

    /// Program `data` at `offset` inside `block`. The block must be erased.
    pub fn program(
        &self,
        config: &MountConfig,
        block: u32,
        offset: u32,
        data: &[u8],
    ) -> Result<(), ProxyError> {
        self.ensure_started()?;
        block_on(async {
            let mut scratch = self.scratch.lock().await;
            scratch.ensure_capacity(data.len())?;
            scratch.as_mut_slice()[..data.len()].copy_from_slice(data);
            let request =
                Request::compose(OperationKind::Write, config, block, offset, data.len())?;
            self.submit(request, Some(&mut *scratch)).await
        })
    }

    /// Erase exactly one block
    pub fn erase(&self, config: &MountConfig, block: u32) -> Result<(), ProxyError> {
        self.ensure_started()?;
        block_on(async {
            // The lock is held for exclusion only; erase moves no data
            let _scratch = self.scratch.lock().await;
            let request = Request::erase(config, block)?;
            self.submit(request, None).await
        })
    }

    /// The flash driver has no write-back cache, nothing to flush
    pub fn sync(&self, _config: &MountConfig) -> Result<(), ProxyError> {
        Ok(())
    }

    fn ensure_started(&self) -> Result<(), ProxyError> {
        if self.is_started() {
            Ok(())
        } else {
            error!("[FlashProxy] flash proxy task not started");
            Err(ProxyError::NotStarted)
        }
    }

    /// Send one request and wait for its completion. Scratch storage, if any,
    /// travels with the request and is put back before returning.
    async fn submit(
        &self,
        request: Request,
        scratch: Option<&mut ScratchBuffer>,
    ) -> Result<(), ProxyError> {
        match scratch {
            Some(scratch) => {
                let request = request.with_buffer(scratch.lend());
                self.requests.send(request).await;
                let completion = self.completions.receive().await;
                if let Some(buffer) = completion.buffer {
                    scratch.reclaim(buffer);
                }
                completion.outcome
            }
            None => {
                self.requests.send(request).await;
                self.completions.receive().await.outcome
            }
        }
    }
}
