#![no_std]
#![no_main]

extern crate alloc;

use alloc::vec;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::{
    clock::CpuClock, interrupt::software::SoftwareInterruptControl, timer::timg::TimerGroup,
};
use esp_storage::FlashStorage;
use flash_proxy::cfg::flash_cfg::{
    DEFAULT_PARTITION_LABEL, DEFAULT_PARTITION_OFFSET, DEFAULT_PARTITION_SIZE,
};
use flash_proxy::task::flash_proxy::{start_flash_proxy_task, EspFlashProxy};
use flash_proxy::{FlashProxy, LfsBlockDevice, MountConfig, Partition, ProxyError, LFS_ERR_OK};
use log::{error, info, warn};
use static_cell::StaticCell;

static PROXY: StaticCell<EspFlashProxy> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    info!("=== Flash Proxy Test Starting ===");

    let peripherals = esp_hal::init({
        let mut config = esp_hal::Config::default();
        config.cpu_clock = CpuClock::max();
        config
    });
    // Heap lives in internal DRAM, so does the scratch buffer
    esp_alloc::heap_allocator!(200 * 1024);
    let timg1 = TimerGroup::new(peripherals.TIMG1);
    esp_hal_embassy::init(timg1.timer0);
    let sw_ints = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);

    let partition = match Partition::new(
        DEFAULT_PARTITION_LABEL,
        DEFAULT_PARTITION_OFFSET,
        DEFAULT_PARTITION_SIZE,
    ) {
        Ok(partition) => partition,
        Err(e) => {
            error!("✗ Invalid partition: {e}");
            panic!("Cannot continue without a partition");
        }
    };
    let cfg = match MountConfig::with_defaults(partition) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("✗ Invalid mount configuration: {e}");
            panic!("Cannot continue without a mount configuration");
        }
    };
    info!(
        "Partition '{}' @0x{:06X}: {} blocks of {} bytes",
        cfg.partition.label,
        cfg.partition.offset,
        cfg.block_count(),
        cfg.block_size
    );

    let proxy: &'static EspFlashProxy = PROXY.init(FlashProxy::new(FlashStorage::new()));

    // Before the task exists every call must fail straight away
    let mut first = [0u8; 16];
    match proxy.read(&cfg, 0, 0, &mut first) {
        Err(ProxyError::NotStarted) => info!("✓ Read before start rejected"),
        other => error!("✗ Read before start returned {other:?}"),
    }

    if let Err(e) = start_flash_proxy_task(proxy, sw_ints.software_interrupt2) {
        error!("✗ Failed to start flash proxy task: {e:?}");
        panic!("Cannot continue without the flash proxy task");
    }
    // Any further start must be a no-op
    if proxy.start().is_some() {
        error!("✗ Flash proxy started twice");
    }
    // The task flags itself running once it is polled on the interrupt executor
    for _ in 0..10 {
        if proxy.is_started() {
            break;
        }
        Timer::after(Duration::from_millis(1)).await;
    }
    if proxy.is_started() {
        info!("✓ Flash proxy task started");
    } else {
        error!("✗ Flash proxy task not running");
    }

    let device = LfsBlockDevice::new(proxy, cfg);

    let block = 2;
    info!("Erasing block {block}...");
    if device.erase(block) == LFS_ERR_OK {
        info!("✓ Block erased");
    } else {
        error!("✗ Erase failed");
    }

    let pattern = [0xAAu8; 16];
    info!("Programming {} bytes at block {block} offset 16", pattern.len());
    if device.prog(block, 16, &pattern) == LFS_ERR_OK {
        info!("✓ Data programmed");
    } else {
        error!("✗ Program failed");
    }

    let mut read_back = [0u8; 16];
    if device.read(block, 16, &mut read_back) == LFS_ERR_OK && read_back == pattern {
        info!("✓ Read back matches: {read_back:02x?}");
    } else {
        error!("✗ Read back mismatch: {read_back:02x?}");
    }

    // Larger transfer grows the scratch buffer, a smaller one reuses it
    let large = vec![0x5Au8; 1024];
    if device.prog(block, 1024, &large) != LFS_ERR_OK {
        error!("✗ Large program failed");
    }
    let grown = proxy.scratch_capacity();
    let mut small = [0u8; 8];
    if device.read(block, 1024, &mut small) != LFS_ERR_OK {
        error!("✗ Small read failed");
    } else if proxy.scratch_capacity() == grown && small == [0x5A; 8] {
        info!("✓ Scratch buffer reused at {grown} bytes");
    } else {
        warn!("⚠ Scratch buffer changed to {} bytes", proxy.scratch_capacity());
    }

    info!("=== Flash Proxy Test Completed ===");
    loop {
        Timer::after(Duration::from_secs(5)).await;
        info!("System running...");
    }
}
