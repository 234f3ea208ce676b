use embassy_executor::{SendSpawner, SpawnError};
use esp_hal::interrupt::software::SoftwareInterrupt;
use esp_hal_embassy::InterruptExecutor;
use esp_storage::FlashStorage;
use log::{error, info};
use static_cell::StaticCell;

use crate::cfg::flash_cfg::EXECUTOR_PRIORITY;
use crate::proxy::client::FlashProxy;
use crate::proxy::executor::ProxyExecutor;

pub type EspFlashProxy = FlashProxy<FlashStorage>;

static PROXY_EXECUTOR: StaticCell<InterruptExecutor<2>> = StaticCell::new();

#[derive(Debug)]
pub enum StartError {
    /// The interrupt executor was already claimed by an earlier attempt
    ExecutorInUse,
    Spawn(SpawnError),
}

impl From<SpawnError> for StartError {
    fn from(err: SpawnError) -> Self {
        StartError::Spawn(err)
    }
}

/// Flash proxy task
/// Runs on its own interrupt executor so that:
///
/// 1.Its stack is the interrupt stack in internal RAM
/// 2.It preempts thread-mode callers blocked waiting for a completion
/// 3.It serves one flash operation per request, forever
#[embassy_executor::task]
async fn flash_proxy_task(executor: ProxyExecutor<'static, FlashStorage>) -> ! {
    executor.run().await
}

/// Start the flash proxy task. Must run before any filesystem on `proxy` is
/// mounted. Calling it again while the task exists does nothing.
pub fn start_flash_proxy_task(
    proxy: &'static EspFlashProxy,
    sw_int: SoftwareInterrupt<2>,
) -> Result<(), StartError> {
    let Some(executor) = proxy.start() else {
        return Ok(());
    };
    let Some(interrupt_executor) = PROXY_EXECUTOR.try_init(InterruptExecutor::new(sw_int)) else {
        // Dropping `executor` parks the flash driver again
        error!("[FlashProxy] interrupt executor already in use");
        return Err(StartError::ExecutorInUse);
    };
    let spawner: SendSpawner = interrupt_executor.start(EXECUTOR_PRIORITY);
    spawner.spawn(flash_proxy_task(executor)).map_err(|e| {
        error!("[FlashProxy] failed to spawn task: {e:?}");
        StartError::from(e)
    })?;
    info!("[FlashProxy] task spawned at {EXECUTOR_PRIORITY:?}");
    Ok(())
}
