//! 卷的布局
//!
//! 保留区 | FAT区 | 根目录(FAT12/16) | 数据区

pub mod data;
pub mod fat;
pub mod reserved;

use alloc::sync::Arc;
use alloc::vec::Vec;

use block_dev::BlockDevice;

use self::data::{DataArea, DirEntry, DirEntryStatus};
use self::fat::FatArea;
use self::reserved::{BootSector, Geometry};
use crate::config::{FatLookup, ROOT_DIR_ENTRIES};
use crate::sector::{self, Disk};
use crate::{ClusterId, SectorId};

/// 已加载的卷：启动扇区及由它推导出的各个区域
#[derive(Debug)]
pub struct Volume {
    disk: Disk,
    bpb: BootSector,
    geometry: Geometry,
    fat: FatArea,
    data: DataArea,
}

impl Volume {
    /// 读取0号扇区并推导布局。
    pub fn load(dev: &Arc<dyn BlockDevice>, lookup: FatLookup) -> Result<Self, vfs::Error> {
        let disk = Disk::new(dev);

        let bpb = disk.load(SectorId::new(0)).map_slice(|boot| {
            if !BootSector::has_signature(boot) {
                log::warn!("boot sector lacks the 0x55AA signature");
            }
            BootSector::from_sector(boot)
        });
        let geometry = bpb.geometry()?;
        log::debug!("{geometry:?}");

        Ok(Self {
            fat: FatArea::new(disk.clone(), &geometry, bpb.fat_sectors(), lookup),
            data: DataArea::new(&geometry, bpb.root_entries(), bpb.total_sectors()),
            disk,
            bpb,
            geometry,
        })
    }

    pub const fn boot_sector(&self) -> &BootSector {
        &self.bpb
    }

    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub const fn fat(&self) -> &FatArea {
        &self.fat
    }

    pub const fn data(&self) -> &DataArea {
        &self.data
    }

    pub const fn disk(&self) -> &Disk {
        &self.disk
    }

    /// 以`start`为首的簇链表所占的全部扇区
    pub fn data_sectors(&self, start: ClusterId) -> impl Iterator<Item = SectorId> + '_ {
        self.fat
            .chain(start)
            .map_while(|cid| self.data.cluster(cid).ok())
            .flat_map(sector::sectors)
    }

    /// 目录所占的扇区，`ClusterId::ROOT`为固定的根目录区
    pub fn directory_sectors(&self, start: ClusterId) -> impl Iterator<Item = SectorId> + '_ {
        let is_root = start == ClusterId::ROOT;
        let root = is_root.then(|| sector::sectors(self.data.root()));
        let sub = (!is_root).then(|| self.data_sectors(start));
        root.into_iter().flatten().chain(sub.into_iter().flatten())
    }

    /// 按磁盘顺序读出目录中的目录项（包括长目录项），
    /// 至多[`ROOT_DIR_ENTRIES`]个，遇到目录末尾即停。
    pub fn read_directory(&self, start: ClusterId) -> Vec<DirEntry> {
        let limit = if start == ClusterId::ROOT {
            self.data.root_entries().min(ROOT_DIR_ENTRIES)
        } else {
            ROOT_DIR_ENTRIES
        };

        let mut dirents = Vec::new();
        for sid in self.directory_sectors(start) {
            let sector = self.disk.load(sid);
            for dirent in DirEntry::parse_sector(sector.as_slice()) {
                if dirents.len() == limit || dirent.status() == DirEntryStatus::TailFree {
                    return dirents;
                }
                dirents.push(dirent);
            }
        }
        dirents
    }
}

#[cfg(test)]
mod tests {
    use core::mem;

    use super::data::{DIR_ENTRY_SIZE, LongDirEntry, ShortDirEntry};
    use super::reserved::BootSector;

    #[test]
    fn volume() {
        assert_eq!(36, mem::size_of::<BootSector>());
        assert_eq!(DIR_ENTRY_SIZE, mem::size_of::<ShortDirEntry>());
        assert_eq!(DIR_ENTRY_SIZE, mem::size_of::<LongDirEntry>())
    }
}
