//! 扇区的抽象

use alloc::sync::Arc;
use core::ops::Range;

use block_dev::BlockDevice;
use derive_more::{Add, Display, From, Into};

use crate::config::SECTOR_SIZE;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Add, From, Into)]
#[repr(transparent)]
pub struct SectorId(usize);

impl core::ops::Add<usize> for SectorId {
    type Output = Self;

    fn add(self, rhs: usize) -> Self::Output {
        self + Self(rhs)
    }
}

impl SectorId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// 扇区大小与块大小一致
    pub const fn block(self) -> usize {
        self.0
    }
}

/// 遍历一段扇区
pub fn sectors(range: Range<SectorId>) -> impl Iterator<Item = SectorId> {
    (range.start.0..range.end.0).map(SectorId)
}

/// 底层块设备的引用，以扇区为单位读写
#[derive(Clone)]
pub struct Disk {
    dev: Arc<dyn BlockDevice>,
}

impl core::fmt::Debug for Disk {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Disk").finish_non_exhaustive()
    }
}

impl Disk {
    pub fn new(dev: &Arc<dyn BlockDevice>) -> Self {
        Self { dev: Arc::clone(dev) }
    }

    /// 读入一个扇区
    pub fn load(&self, id: SectorId) -> Sector {
        let mut data = [0; SECTOR_SIZE];
        log::trace!("read sector {id}");
        self.dev.read_block(id.block(), &mut data);

        Sector {
            data,
            id,
            modified: false,
            disk: self.clone(),
        }
    }
}

/// 内存中的扇区
///
/// 修改过的扇区在析构时整块写回，未改动的字节保持原样。
#[derive(Debug)]
pub struct Sector {
    /// 缓存的数据
    data: [u8; SECTOR_SIZE],
    /// 对应的扇区号
    id: SectorId,
    /// 是否为脏块
    modified: bool,
    disk: Disk,
}

impl Sector {
    pub fn sync(&mut self) {
        if self.modified {
            self.modified = false;
            log::trace!("write sector {}", self.id);
            self.disk.dev.write_block(self.id.block(), &self.data);
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.modified = true;
        &mut self.data
    }

    #[inline]
    pub fn map_slice<V>(&self, f: impl FnOnce(&[u8]) -> V) -> V {
        f(self.as_slice())
    }

    #[inline]
    pub fn map_mut_slice<V>(&mut self, f: impl FnOnce(&mut [u8]) -> V) -> V {
        f(self.as_mut_slice())
    }

    /// 读取`offset`处的小端`u16`
    pub fn u16_at(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.data[offset], self.data[offset + 1]])
    }
}

impl Drop for Sector {
    fn drop(&mut self) {
        self.sync();
    }
}

#[cfg(test)]
mod tests {
    use block_dev::RamDisk;

    use super::*;

    #[test]
    fn untouched_sector_is_not_written() {
        let ram = Arc::new(RamDisk::new(2));
        let dev: Arc<dyn BlockDevice> = ram.clone();
        let disk = Disk::new(&dev);

        drop(disk.load(SectorId::new(1)));
        assert_eq!(1, ram.reads());
        assert_eq!(0, ram.writes());
    }

    #[test]
    fn modified_sector_is_written_back_whole() {
        let ram = Arc::new(RamDisk::from_bytes(alloc::vec![7; 2 * SECTOR_SIZE]));
        let dev: Arc<dyn BlockDevice> = ram.clone();
        let disk = Disk::new(&dev);

        {
            let mut sector = disk.load(SectorId::new(1));
            sector.map_mut_slice(|data| data[10..12].copy_from_slice(&[1, 2]));
        }

        assert_eq!(1, ram.writes());
        let image = ram.snapshot();
        assert_eq!(&[7, 1, 2, 7], &image[SECTOR_SIZE + 9..SECTOR_SIZE + 13]);
        assert!(image[..SECTOR_SIZE].iter().all(|&b| b == 7));
    }

    #[test]
    fn little_endian_words() {
        let ram = Arc::new(RamDisk::from_bytes(alloc::vec![0x34, 0x12, 0xFF]));
        let dev: Arc<dyn BlockDevice> = ram;
        let sector = Disk::new(&dev).load(SectorId::new(0));
        assert_eq!(0x1234, sector.u16_at(0));
        assert_eq!(0x00FF, sector.u16_at(2));
    }
}
