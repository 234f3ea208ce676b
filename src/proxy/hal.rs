use embedded_storage::nor_flash::NorFlash;

use crate::cfg::flash_cfg::MountConfig;
use crate::proxy::client::FlashProxy;
use crate::proxy::error::status_of;

/// Block-device callbacks in the shape the filesystem engine calls them:
/// block/offset addressing in, `0` or `LFS_ERR_IO` out.
pub struct LfsBlockDevice<'a, F> {
    proxy: &'a FlashProxy<F>,
    config: MountConfig,
}

impl<'a, F: NorFlash> LfsBlockDevice<'a, F> {
    pub fn new(proxy: &'a FlashProxy<F>, config: MountConfig) -> Self {
        Self { proxy, config }
    }

    pub fn config(&self) -> &MountConfig {
        &self.config
    }

    pub fn read(&self, block: u32, off: u32, buffer: &mut [u8]) -> i32 {
        status_of(self.proxy.read(&self.config, block, off, buffer))
    }

    pub fn prog(&self, block: u32, off: u32, buffer: &[u8]) -> i32 {
        status_of(self.proxy.program(&self.config, block, off, buffer))
    }

    pub fn erase(&self, block: u32) -> i32 {
        status_of(self.proxy.erase(&self.config, block))
    }

    pub fn sync(&self) -> i32 {
        status_of(self.proxy.sync(&self.config))
    }
}
