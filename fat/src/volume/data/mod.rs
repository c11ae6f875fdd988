//! 数据区，存放目录项与文件内容的区域，使用**簇编号**索引。
//!
//! 因为FAT条目存放着下一个簇的编号，
//! 其中`0`表示簇未分配，`1`保留，
//! 所以数据区第一个可用的簇编号为2。
//! FAT16的根目录不在簇里，而是固定在FAT区与2号簇之间。

mod dir_entry;

use core::ops::Range;

pub use self::dir_entry::*;
use crate::volume::reserved::Geometry;
use crate::{ClusterError, ClusterId, SectorId};

#[derive(Debug)]
pub struct DataArea {
    root: Range<SectorId>,
    /// 根目录的条目数
    root_entries: usize,
    clusters: Range<SectorId>,
    cluster_sectors: usize,
}

impl DataArea {
    pub fn new(geometry: &Geometry, root_entries: usize, total_sectors: usize) -> Self {
        let root = geometry.root_dir_start..geometry.root_dir_start + geometry.root_dir_sectors;
        let start = geometry.cluster_start;
        let end = start + geometry.total_clusters * geometry.cluster_sectors;
        debug_assert!(usize::from(end) <= total_sectors);

        Self {
            root,
            root_entries,
            clusters: start..end,
            cluster_sectors: geometry.cluster_sectors,
        }
    }

    pub const fn cluster_sectors(&self) -> usize {
        self.cluster_sectors
    }

    pub fn root(&self) -> Range<SectorId> {
        self.root.clone()
    }

    pub const fn root_entries(&self) -> usize {
        self.root_entries
    }

    /// 返回簇编号指向的一系列扇区
    ///
    /// 数据区不占有`ClusterId::MIN`前面的簇，所以需要转换计算得到索引指向的扇区。
    pub fn cluster(&self, id: ClusterId) -> Result<Range<SectorId>, ClusterError> {
        let id = id.validate()?;
        let start = self.clusters.start + id.data_index() * self.cluster_sectors;
        let end = start + self.cluster_sectors;
        if end > self.clusters.end {
            return Err(ClusterError::Reserved);
        }
        Ok(start..end)
    }
}
