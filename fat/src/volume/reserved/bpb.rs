use core::{mem, ptr};

use crate::config::SECTOR_SIZE;
use crate::SectorId;

/// BIOS Parameter Block BIOS参数块
/// 位于保留区的第一扇区，该扇区又名启动扇区。
///
/// 只收录FAT12/16共有的前36字节，多字节字段均为小端序。
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct BootSector {
    /// 跳转至启动代码的指令
    _bs_jmp_boot: [u8; 3],

    /// 一般用于记录什么系统格式化此卷
    bs_oem_name: [u8; 8],

    /// 一个扇区的字节量
    byts_per_sec: u16,

    /// 一个簇的扇区数
    sec_per_clus: u8,

    /// 保留区的扇区数
    rsvd_sec_cnt: u16,

    /// 此卷的文件分配表(FAT)数量，建议为2
    num_fats: u8,

    /// 根目录可容纳的目录项数
    root_ent_cnt: u16,

    /// 为0时使用`tot_sec32`
    tot_sec16: u16,

    /// 物理媒介的类型
    media: u8,

    /// 一个FAT占用的扇区数
    fat_sz16: u16,

    /// 中断0x13模式下，轨道的扇区数
    sec_per_trk: u16,

    /// 中断0x13模式下，头数量
    num_heads: u16,

    /// 中断0x13模式下使用
    hidd_sec: u32,

    tot_sec32: u32,
}

/* 扇区末尾两字节为签名 [0x55, 0xAA] */

const SIGNATURE_OFFSET: usize = 510;
const SIGNATURE: [u8; 2] = [0x55, 0xAA];

impl BootSector {
    /// 从启动扇区的原始字节解析。
    pub fn from_sector(sector: &[u8]) -> Self {
        assert!(sector.len() >= mem::size_of::<Self>());
        // SAFETY: 长度已检查，且所有字段均为整数，任意位模式都合法
        unsafe { ptr::read_unaligned(sector.as_ptr().cast()) }
    }

    pub fn has_signature(sector: &[u8]) -> bool {
        sector.get(SIGNATURE_OFFSET..SIGNATURE_OFFSET + 2) == Some(&SIGNATURE[..])
    }

    pub fn oem_name(&self) -> [u8; 8] {
        self.bs_oem_name
    }

    pub const fn sector_bytes(&self) -> usize {
        u16::from_le(self.byts_per_sec) as usize
    }

    pub const fn cluster_sectors(&self) -> usize {
        self.sec_per_clus as usize
    }

    pub const fn reserved_sectors(&self) -> usize {
        u16::from_le(self.rsvd_sec_cnt) as usize
    }

    pub const fn fat_count(&self) -> usize {
        self.num_fats as usize
    }

    /// FAT占用的扇区数
    pub const fn fat_sectors(&self) -> usize {
        u16::from_le(self.fat_sz16) as usize
    }

    pub const fn root_entries(&self) -> usize {
        u16::from_le(self.root_ent_cnt) as usize
    }

    pub const fn media(&self) -> u8 {
        self.media
    }

    pub const fn sectors_per_track(&self) -> u16 {
        u16::from_le(self.sec_per_trk)
    }

    pub const fn heads(&self) -> u16 {
        u16::from_le(self.num_heads)
    }

    pub const fn hidden_sectors(&self) -> u32 {
        u32::from_le(self.hidd_sec)
    }

    pub const fn total_sectors(&self) -> usize {
        let tot_sec16 = u16::from_le(self.tot_sec16);
        if tot_sec16 > 0 {
            tot_sec16 as usize
        } else {
            u32::from_le(self.tot_sec32) as usize
        }
    }

    /// 计算根目录占用的扇区数
    pub const fn root_dir_sectors(&self) -> usize {
        (self.root_entries() * 32).div_ceil(SECTOR_SIZE)
    }

    /// 检查字段并推导卷的布局
    pub fn geometry(&self) -> Result<Geometry, vfs::Error> {
        if self.sector_bytes() != SECTOR_SIZE {
            log::warn!("bytes per sector {} != {SECTOR_SIZE}", self.sector_bytes());
            return Err(vfs::Error::CorruptFilesystem);
        }
        if !self.cluster_sectors().is_power_of_two() {
            log::warn!("sectors per cluster {} is not a power of two", self.cluster_sectors());
            return Err(vfs::Error::CorruptFilesystem);
        }
        if self.fat_count() == 0 || self.fat_sectors() == 0 {
            log::warn!("no FAT on volume");
            return Err(vfs::Error::CorruptFilesystem);
        }
        if self.root_entries() == 0 {
            log::warn!("no fixed root directory, not a FAT16 volume");
            return Err(vfs::Error::CorruptFilesystem);
        }

        let geometry = Geometry::new(self);
        if self.total_sectors() < usize::from(geometry.cluster_start) {
            log::warn!(
                "total sectors {} end inside the root directory",
                self.total_sectors()
            );
            return Err(vfs::Error::CorruptFilesystem);
        }

        Ok(geometry)
    }
}

/// 由启动扇区推导出的布局
///
/// 保留区 | FAT区 | 根目录 | 簇
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// FAT区的起始扇区
    pub fat_start: SectorId,
    /// FAT区之后的第一个扇区，FAT16的根目录从这里开始
    pub data_start: SectorId,
    pub root_dir_start: SectorId,
    pub root_dir_sectors: usize,
    /// 2号簇的起始扇区
    pub cluster_start: SectorId,
    pub cluster_sectors: usize,
    /// 数据区可容纳的簇数
    pub total_clusters: usize,
}

impl Geometry {
    pub fn new(bpb: &BootSector) -> Self {
        let fat_start = SectorId::new(bpb.reserved_sectors());
        let data_start = fat_start + bpb.fat_count() * bpb.fat_sectors();
        let root_dir_start = data_start;
        let root_dir_sectors = bpb.root_dir_sectors();
        let cluster_start = root_dir_start + root_dir_sectors;
        let total_clusters = bpb
            .total_sectors()
            .saturating_sub(usize::from(cluster_start))
            .checked_div(bpb.cluster_sectors())
            .unwrap_or(0);

        Self {
            fat_start,
            data_start,
            root_dir_start,
            root_dir_sectors,
            cluster_start,
            cluster_sectors: bpb.cluster_sectors(),
            total_clusters,
        }
    }

    pub const fn cluster_bytes(&self) -> usize {
        self.cluster_sectors * SECTOR_SIZE
    }
}
