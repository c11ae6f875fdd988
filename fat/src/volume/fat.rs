use core::mem;
use core::ops::Range;

use crate::config::{FatLookup, SECTOR_SIZE};
use crate::sector::Disk;
use crate::volume::reserved::Geometry;
use crate::{ClusterError, ClusterId, SectorId};

/// 文件分配表区，只读。
///
/// 多个FAT互为备份，只使用第一个。
#[derive(Debug)]
pub struct FatArea {
    disk: Disk,
    range: Range<SectorId>,
    lookup: FatLookup,
    /// 卷内最大的簇编号
    last: ClusterId,
    /// 簇链表长度的上限，防止环状的FAT
    total_clusters: usize,
}

impl FatArea {
    pub fn new(disk: Disk, geometry: &Geometry, fat_sectors: usize, lookup: FatLookup) -> Self {
        let start = geometry.fat_start;
        let end = start + fat_sectors;
        let last = (geometry.total_clusters + 1).min(u16::MAX as usize) as u16;
        Self {
            disk,
            range: Range { start, end },
            lookup,
            last: ClusterId::new(last),
            total_clusters: geometry.total_clusters,
        }
    }

    /// 获取下一个簇编号。
    /// 若`id`或其FAT条目不指向已分配的簇，则报错。
    /// `Ok(None)`表示`id`为链表上最后一个簇。
    pub fn next(&self, id: ClusterId) -> Result<Option<ClusterId>, ClusterError> {
        let id = self.validate_id(id)?;

        let Some((sid, offset)) = self.cluster_id2pos(id) else {
            log::warn!("FAT entry of cluster {id} is outside the first FAT sector");
            return Ok(None);
        };

        let raw = self.disk.load(sid).u16_at(offset);
        log::trace!("FAT[{id}] = {raw:#06x}");
        match self.validate_id(ClusterId::new(raw)) {
            Ok(cid) => Ok(Some(cid)),
            Err(ClusterError::Eof) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 以`start`为首的簇链表。
    /// 遇到链表末尾或错误的FAT条目时结束。
    pub fn chain(&self, start: ClusterId) -> Chain<'_> {
        Chain {
            fat: self,
            next: self.validate_id(start).ok(),
            budget: self.total_clusters,
        }
    }
}

impl FatArea {
    /// 一个扇区能容纳多少条簇编号
    const fn sector_clusters() -> usize {
        SECTOR_SIZE / mem::size_of::<u16>()
    }

    fn validate_id(&self, id: ClusterId) -> Result<ClusterId, ClusterError> {
        id.validate().and_then(|id| {
            if id <= self.last {
                Ok(id)
            } else {
                Err(ClusterError::Reserved)
            }
        })
    }

    /// 返回簇编号在FAT中的位置（扇区号 + 扇区内字节偏移）
    fn cluster_id2pos(&self, id: ClusterId) -> Option<(SectorId, usize)> {
        let index = usize::from(id);
        let sector_index = index / Self::sector_clusters();
        let offset = index % Self::sector_clusters() * mem::size_of::<u16>();

        match self.lookup {
            FatLookup::Full => {
                let sid = self.range.start + sector_index;
                self.range.contains(&sid).then_some((sid, offset))
            }
            FatLookup::FirstSector => (sector_index == 0).then_some((self.range.start, offset)),
        }
    }
}

/// 簇链表的迭代器，首项即起始簇。
pub struct Chain<'a> {
    fat: &'a FatArea,
    next: Option<ClusterId>,
    /// 还能走多少个簇
    budget: usize,
}

impl Iterator for Chain<'_> {
    type Item = ClusterId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        if self.budget == 0 {
            log::warn!("cluster chain is longer than the volume, cut at {id}");
            return None;
        }
        self.budget -= 1;

        self.next = match self.fat.next(id) {
            Ok(next) => next,
            Err(e) => {
                log::warn!("cluster chain broken after {id}: {e}");
                None
            }
        };
        Some(id)
    }
}
