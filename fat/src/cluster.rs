use core::fmt;

use derive_more::{Display, From, Into};

use crate::config::FAT16_MAX_CLUSTER;

/// FAT16的簇编号
///
/// `0`在目录项中表示空文件，在路径解析中表示根目录；`1`保留；
/// 数据区的第一个簇为`2`。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[repr(transparent)]
pub struct ClusterId(u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterError {
    Free,
    Defective,
    Reserved,
    Eof,
}

impl From<ClusterId> for usize {
    fn from(id: ClusterId) -> Self {
        id.0 as usize
    }
}

impl From<ClusterId> for u64 {
    fn from(id: ClusterId) -> Self {
        id.0 as u64
    }
}

impl ClusterId {
    pub const FREE: Self = Self(0);

    /// 根目录不占簇，以空簇编号代表
    pub const ROOT: Self = Self::FREE;

    /// 最小的可用簇号
    pub const MIN: Self = Self(2);

    pub const BAD: Self = Self(0xFFF7);

    /// 写入FAT时惯用的链表结束标记
    pub const EOF: Self = Self(0xFFFF);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// 由目录项的高低两半拼出簇编号。
    /// FAT16的簇编号只有16位，高半部分正常应为0。
    pub fn from_halves(low: u16, high: u16) -> Self {
        let raw = u32::from(low) | (u32::from(high) << 16);
        if high != 0 {
            log::warn!("cluster {raw:#x} exceeds the FAT16 range, truncated");
        }
        Self(raw as u16)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// 作为FAT条目的值时是否会终止簇链表
    pub const fn is_end(self) -> bool {
        self.0 >= FAT16_MAX_CLUSTER
    }

    /// 将FAT条目的值分类。
    ///
    /// NOTE: 超出卷内最大簇编号的值由[`crate::volume::fat::FatArea`]检查。
    pub fn validate(self) -> Result<Self, ClusterError> {
        match self.0 {
            0x0000 => Err(ClusterError::Free),
            0x0001 => Err(ClusterError::Reserved),
            0xFFF7 => Err(ClusterError::Defective),
            0xFFF8..=0xFFFF => Err(ClusterError::Eof),
            _ if self.is_end() => Err(ClusterError::Reserved),
            _ => Ok(self),
        }
    }

    /// 相对于数据区首簇的索引
    pub(crate) fn data_index(self) -> usize {
        usize::from(self) - usize::from(Self::MIN)
    }
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ClusterError::Free => "free cluster inside a chain",
            ClusterError::Defective => "bad cluster",
            ClusterError::Reserved => "reserved cluster",
            ClusterError::Eof => "end of chain",
        };
        f.write_str(msg)
    }
}
