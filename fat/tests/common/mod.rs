#![allow(dead_code)]

use std::sync::Arc;

use block_dev::{BlockDevice, RamDisk};
use fat16::{FatFileSystem, MountOptions};

pub const SECTOR: usize = 512;
pub const DIRENT: usize = 32;

pub const ATTR_DIR: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LABEL: u8 = 0x08;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub reserved: u16,
    pub fats: u8,
    pub fat_sectors: u16,
    pub root_entries: u16,
    pub cluster_sectors: u8,
    pub total_sectors: u16,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            reserved: 1,
            fats: 2,
            fat_sectors: 1,
            root_entries: 16,
            cluster_sectors: 1,
            total_sectors: 64,
        }
    }
}

impl Layout {
    pub fn fat_start(&self) -> usize {
        self.reserved as usize
    }

    pub fn root_start(&self) -> usize {
        self.fat_start() + self.fats as usize * self.fat_sectors as usize
    }

    pub fn cluster_start(&self) -> usize {
        self.root_start() + (self.root_entries as usize * DIRENT).div_ceil(SECTOR)
    }

    pub fn cluster_bytes(&self) -> usize {
        self.cluster_sectors as usize * SECTOR
    }

    /// 簇在镜像中的字节偏移
    pub fn cluster_offset(&self, cluster: u16) -> usize {
        (self.cluster_start() + (cluster as usize - 2) * self.cluster_sectors as usize) * SECTOR
    }
}

/// 在内存中拼装FAT16镜像
pub struct Image {
    pub layout: Layout,
    pub bytes: Vec<u8>,
}

impl Image {
    pub fn new(layout: Layout) -> Self {
        let mut bytes = vec![0; layout.total_sectors as usize * SECTOR];

        let boot = &mut bytes[..SECTOR];
        boot[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        boot[3..11].copy_from_slice(b"MSWIN4.1");
        boot[11..13].copy_from_slice(&(SECTOR as u16).to_le_bytes());
        boot[13] = layout.cluster_sectors;
        boot[14..16].copy_from_slice(&layout.reserved.to_le_bytes());
        boot[16] = layout.fats;
        boot[17..19].copy_from_slice(&layout.root_entries.to_le_bytes());
        boot[19..21].copy_from_slice(&layout.total_sectors.to_le_bytes());
        boot[21] = 0xF8;
        boot[22..24].copy_from_slice(&layout.fat_sectors.to_le_bytes());
        boot[510] = 0x55;
        boot[511] = 0xAA;

        let mut image = Self { layout, bytes };
        image.set_fat(0, 0xFFF8);
        image.set_fat(1, 0xFFFF);
        image
    }

    /// 写入每一份FAT
    pub fn set_fat(&mut self, cluster: u16, value: u16) {
        for fat in 0..self.layout.fats as usize {
            let start = (self.layout.fat_start() + fat * self.layout.fat_sectors as usize) * SECTOR;
            let pos = start + cluster as usize * 2;
            self.bytes[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
        }
    }

    /// 依次链接`clusters`，最后一个写入结束标记
    pub fn chain(&mut self, clusters: &[u16]) {
        for pair in clusters.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(&last) = clusters.last() {
            self.set_fat(last, 0xFFFF);
        }
    }

    pub fn root_entry(&mut self, index: usize, raw: [u8; DIRENT]) {
        let pos = self.layout.root_start() * SECTOR + index * DIRENT;
        self.bytes[pos..pos + DIRENT].copy_from_slice(&raw);
    }

    /// 连续写入多个根目录项，返回下一个空位
    pub fn root_entries(&mut self, start: usize, raws: &[[u8; DIRENT]]) -> usize {
        for (i, raw) in raws.iter().enumerate() {
            self.root_entry(start + i, *raw);
        }
        start + raws.len()
    }

    pub fn dir_entry(&mut self, cluster: u16, index: usize, raw: [u8; DIRENT]) {
        let pos = self.layout.cluster_offset(cluster) + index * DIRENT;
        self.bytes[pos..pos + DIRENT].copy_from_slice(&raw);
    }

    /// 从`cluster`的开头写入数据
    pub fn fill_cluster(&mut self, cluster: u16, data: &[u8]) {
        assert!(data.len() <= self.layout.cluster_bytes());
        let pos = self.layout.cluster_offset(cluster);
        self.bytes[pos..pos + data.len()].copy_from_slice(data);
    }

    /// 按簇链表依次写入数据
    pub fn fill_chain(&mut self, clusters: &[u16], data: &[u8]) {
        for (cluster, chunk) in clusters.iter().zip(data.chunks(self.layout.cluster_bytes())) {
            self.fill_cluster(*cluster, chunk);
        }
    }

    pub fn into_disk(self) -> Arc<RamDisk> {
        Arc::new(RamDisk::from_bytes(self.bytes))
    }

    pub fn mount(self) -> (Arc<RamDisk>, FatFileSystem) {
        self.mount_with(MountOptions::default())
    }

    pub fn mount_with(self, options: MountOptions) -> (Arc<RamDisk>, FatFileSystem) {
        init_logger();
        let disk = self.into_disk();
        let dev: Arc<dyn BlockDevice> = disk.clone();
        let fs = FatFileSystem::mount(&dev, options).unwrap();
        (disk, fs)
    }
}

pub fn short_entry(name: &[u8; 11], attr: u8, cluster: u16, size: u32) -> [u8; DIRENT] {
    let mut raw = [0; DIRENT];
    raw[..11].copy_from_slice(name);
    raw[11] = attr;
    raw[26..28].copy_from_slice(&cluster.to_le_bytes());
    raw[28..32].copy_from_slice(&size.to_le_bytes());
    raw
}

pub fn checksum(name: &[u8; 11]) -> u8 {
    name.iter()
        .fold(0u8, |sum, &b| sum.rotate_right(1).wrapping_add(b))
}

/// 长名称的长目录项，按磁盘顺序（序号倒序）排列
pub fn lfn_entries(long: &str, short: &[u8; 11]) -> Vec<[u8; DIRENT]> {
    const OFFSETS: [usize; 13] = [1, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];

    let mut units: Vec<u16> = long.encode_utf16().collect();
    let count = units.len().div_ceil(13);
    if units.len() % 13 != 0 {
        units.push(0x0000);
    }
    units.resize(count * 13, 0xFFFF);

    let sum = checksum(short);
    let mut slots: Vec<_> = units
        .chunks(13)
        .enumerate()
        .map(|(i, chunk)| {
            let mut raw = [0; DIRENT];
            raw[0] = i as u8 + 1;
            if i + 1 == count {
                raw[0] |= 0x40;
            }
            raw[11] = 0x0F;
            raw[13] = sum;
            for (&offset, unit) in OFFSETS.iter().zip(chunk) {
                raw[offset..offset + 2].copy_from_slice(&unit.to_le_bytes());
            }
            raw
        })
        .collect();
    slots.reverse();
    slots
}

/// `len`字节的可辨认数据
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
}
