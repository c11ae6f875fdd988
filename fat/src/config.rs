//! Constants and mount-time options

/// 扇区的字节量，也是块设备读写的单位
pub const SECTOR_SIZE: usize = 512;

/// 目录读取的条目上限，同时也是根目录条目数的上限
pub const ROOT_DIR_ENTRIES: usize = 512;

/// 默认的文件描述符数量
pub const MAX_OPEN_FILES: usize = 10;

/// 不小于此值的FAT条目都会终止簇链表
pub const FAT16_MAX_CLUSTER: u16 = 0xFFF5;

/// 长名称最多255个UTF-16字符
pub const MAX_LONG_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountOptions {
    pub fat_lookup: FatLookup,
    pub name_match: NameMatch,
    /// 文件描述符表的容量
    pub max_open_files: usize,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            fat_lookup: FatLookup::Full,
            name_match: NameMatch::Canonical,
            max_open_files: MAX_OPEN_FILES,
        }
    }
}

/// 查找FAT条目的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FatLookup {
    /// 读取条目所在的FAT扇区
    #[default]
    Full,
    /// 只读取FAT的第一个扇区，即只认识0~255号簇。
    /// 超出范围的簇当作链表末尾。
    FirstSector,
}

/// 路径分量与目录项的比较方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatch {
    /// 转换为补空格的大写8.3名称后比较全部11字节，
    /// 不匹配时再与长名称做忽略大小写的比较
    #[default]
    Canonical,
    /// 名称字段的前8字节与原样的分量逐字节比较（不足8字节补0）
    Raw,
}
