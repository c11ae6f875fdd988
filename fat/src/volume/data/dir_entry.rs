//! 目录项，每项32字节。
//!
//! 长名称目录项(LFN)紧挨在所属的短目录项之前，且按序号**倒序**存放。

use alloc::string::String;
use alloc::vec::Vec;
use core::{mem, ptr};

use enumflags2::{BitFlags, bitflags};

use crate::ClusterId;
use crate::config::MAX_LONG_NAME_LENGTH;

/// 目录项的字节量
pub const DIR_ENTRY_SIZE: usize = 32;

#[derive(Debug, Clone, Copy)]
pub enum DirEntry {
    Short(ShortDirEntry),
    Long(LongDirEntry),
}

impl DirEntry {
    /// 通过属性字节区分短目录项与长目录项。
    pub fn from_bytes(raw: &[u8; DIR_ENTRY_SIZE]) -> Self {
        if is_long_name_attr(raw[11]) {
            // SAFETY: `LongDirEntry`与原始字节等长，字段均为整数
            Self::Long(unsafe { ptr::read_unaligned(raw.as_ptr().cast()) })
        } else {
            // SAFETY: 同上
            Self::Short(unsafe { ptr::read_unaligned(raw.as_ptr().cast()) })
        }
    }

    /// 一个扇区内的全部目录项
    pub fn parse_sector(sector: &[u8]) -> impl Iterator<Item = Self> + '_ {
        sector.chunks_exact(DIR_ENTRY_SIZE).map(|raw| {
            let raw: &[u8; DIR_ENTRY_SIZE] = raw.try_into().unwrap_or(&[0; DIR_ENTRY_SIZE]);
            Self::from_bytes(raw)
        })
    }

    pub fn is_long_name(&self) -> bool {
        matches!(self, Self::Long(_))
    }

    pub fn as_short(&self) -> Option<&ShortDirEntry> {
        match self {
            Self::Short(short) => Some(short),
            Self::Long(_) => None,
        }
    }

    pub fn as_long(&self) -> Option<&LongDirEntry> {
        match self {
            Self::Short(_) => None,
            Self::Long(long) => Some(long),
        }
    }

    /// 长目录项的首字节是序号，不参与状态判断
    pub fn status(&self) -> DirEntryStatus {
        match self {
            Self::Short(short) => short.status(),
            Self::Long(long) if long.ord == 0 => DirEntryStatus::TailFree,
            Self::Long(long) if long.ord == 0xE5 => DirEntryStatus::Free,
            Self::Long(_) => DirEntryStatus::Occupied,
        }
    }
}

/// 属性字节的低4位全为1即为长目录项
pub const fn is_long_name_attr(attr: u8) -> bool {
    attr & LongDirEntry::ATTR == LongDirEntry::ATTR
}

#[derive(Debug, Default, Clone, Copy)]
#[repr(C, packed)]
pub struct ShortDirEntry {
    name: [u8; 11],

    attr: u8,

    /// Reserved, must be 0
    _ntres: u8,

    /// Count of tenths of a second.
    /// Range: [0, 199]
    crt_time_tenth: u8,

    /// Creation time, granularity is 2 seconds
    crt_time: u16,

    /// Creation date
    crt_date: u16,

    /// Last access date
    lst_acc_date: u16,

    /// High word of first data cluster number
    /// for file/directory described by this entry
    fst_clus_hi: u16,

    /// Last modification time
    wrt_time: u16,

    /// Last modification date
    wrt_date: u16,

    /// Low word of first data cluster number
    /// for file/directory described by this entry
    fst_clus_lo: u16,

    /// Quantity containing size in bytes
    /// of file/directory described by this entry
    file_size: u32,
}

/// 不解析的时间戳，原样保留
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub created_tenths: u8,
    pub created_time: u16,
    pub created_date: u16,
    pub accessed_date: u16,
    pub written_time: u16,
    pub written_date: u16,
}

impl ShortDirEntry {
    pub const fn raw_name(&self) -> [u8; 11] {
        self.name
    }

    pub fn attr(&self) -> BitFlags<AttrFlag> {
        BitFlags::from_bits_truncate(self.attr)
    }

    pub fn is_dir(&self) -> bool {
        self.attr().contains(AttrFlag::Directory)
    }

    pub fn is_volume_label(&self) -> bool {
        self.attr().contains(AttrFlag::VolumeID)
    }

    /// `.`与`..`
    pub fn is_relative(&self) -> bool {
        self.name == *b".          " || self.name == *b"..         "
    }

    pub fn cluster_id(&self) -> ClusterId {
        ClusterId::from_halves(u16::from_le(self.fst_clus_lo), u16::from_le(self.fst_clus_hi))
    }

    /// 目录的大小字段无意义，恒为0
    pub const fn size(&self) -> usize {
        u32::from_le(self.file_size) as usize
    }

    pub const fn timestamps(&self) -> Timestamps {
        Timestamps {
            created_tenths: self.crt_time_tenth,
            created_time: u16::from_le(self.crt_time),
            created_date: u16::from_le(self.crt_date),
            accessed_date: u16::from_le(self.lst_acc_date),
            written_time: u16::from_le(self.wrt_time),
            written_date: u16::from_le(self.wrt_date),
        }
    }

    pub fn status(&self) -> DirEntryStatus {
        match self.name[0] {
            0xE5 => DirEntryStatus::Free,
            0x00 => DirEntryStatus::TailFree,
            _ => DirEntryStatus::Occupied,
        }
    }

    pub fn checksum(&self) -> u8 {
        self.name.iter().fold(0u8, |sum, &b| {
            // NOTE: The operation is an unsigned char rotate right
            sum.rotate_right(1).wrapping_add(b)
        })
    }

    /// `NAME.EXT`形式的名称，去掉补位的空格，扩展名为空时不带`.`。
    pub fn display_name(&self) -> String {
        let (base, ext) = self.name.split_at(8);
        let mut name: String = trim_padding(base)
            .iter()
            .enumerate()
            .map(|(i, &b)| if i == 0 && b == 0x05 { 0xE5 } else { b })
            .map(char::from)
            .collect();

        let ext = trim_padding(ext);
        if !ext.is_empty() {
            name.push('.');
            name.extend(ext.iter().copied().map(char::from));
        }
        name
    }
}

fn trim_padding(field: &[u8]) -> &[u8] {
    let len = field
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    &field[..len]
}

/// 可容纳名字的13个UTF-16字符。
///
/// 目录项名称最长为255字符，所以最多用到20个长目录项。
#[derive(Debug, Default, Clone, Copy)]
#[repr(C, packed)]
pub struct LongDirEntry {
    /// 序号（1起），最后一项另带[`LongDirEntry::LAST_MASK`]
    ord: u8,
    name1: [u16; 5],
    /// [`LongDirEntry::ATTR`]
    _attr: u8,
    /// 0
    _type: u8,
    /// 此项跟随的短名称目录项的校验和。
    /// 若不一致则说明发生了错误
    chksum: u8,
    name2: [u16; 6],
    /// 0
    _fst_clus_lo: u16,
    name3: [u16; 2],
}

impl LongDirEntry {
    pub const LAST_MASK: u8 = 0b0100_0000;

    pub const ORD_MASK: u8 = 0b0011_1111;

    pub const ATTR: u8 = 0x0F;

    /// 可为名称容纳的字符数
    pub const CAP: usize = 13;

    /// 去掉末项标记的序号
    pub const fn seq(&self) -> u8 {
        self.ord & Self::ORD_MASK
    }

    pub const fn is_last(&self) -> bool {
        self.ord & Self::LAST_MASK != 0
    }

    pub const fn checksum(&self) -> u8 {
        self.chksum
    }

    /// 本项的13个UTF-16字符
    pub fn units(&self) -> [u16; Self::CAP] {
        let (name1, name2, name3) = (self.name1, self.name2, self.name3);
        let mut units = [0; Self::CAP];
        for (unit, raw) in units.iter_mut().zip(name1.into_iter().chain(name2).chain(name3)) {
            *unit = u16::from_le(raw);
        }
        units
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[bitflags]
#[repr(u8)]
pub enum AttrFlag {
    ReadOnly = 0b0000_0001,
    Hidden = 0b0000_0010,
    /// The corresponding file is tagged as a component of the operating system
    System = 0b0000_0100,
    /// The corresponding entry contains the volume label
    VolumeID = 0b0000_1000,
    Directory = 0b0001_0000,
    /// Indicates that properties of the associated file have been modified
    Archive = 0b0010_0000,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DirEntryStatus {
    /// name[0] == 0xE5
    Free,
    /// name[0] == 0，此条目后的条目皆为[`DirEntryStatus::TailFree`]
    TailFree,
    /// 已被使用
    Occupied,
}

/// Converts the long entries of `dirents` to a name.
///
/// 收集其中所有的长目录项，按序号排列后拼接。
/// 序号为0的项不是合法的长目录项，直接跳过；
/// 不校验校验和，也不要求序号连续。
pub fn long_name(dirents: &[DirEntry]) -> Option<String> {
    let mut longs: Vec<&LongDirEntry> = dirents
        .iter()
        .filter_map(DirEntry::as_long)
        .filter(|long| long.seq() != 0)
        .collect();
    if longs.is_empty() {
        return None;
    }
    longs.sort_by_key(|long| long.seq());

    let units = longs
        .iter()
        .flat_map(|long| long.units())
        .take_while(|&unit| unit != 0x0000)
        .filter(|&unit| unit != 0xFFFF)
        .take(MAX_LONG_NAME_LENGTH);

    Some(
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
    )
}

/// 紧挨在`dirents[index]`之前、属于该短目录项的长目录项。
///
/// 从短目录项往前，序号须依次为1、2、3……，
/// 带[`LongDirEntry::LAST_MASK`]的项即为一串长目录项的开头，更前面的项不属于它。
/// 返回的长目录项保持磁盘上的顺序。
pub fn lfn_run(dirents: &[DirEntry], index: usize) -> &[DirEntry] {
    let Some(short) = dirents.get(index).and_then(DirEntry::as_short) else {
        return &[];
    };
    let checksum = short.checksum();

    let mut len = 0;
    let mut complete = false;
    for (dirent, seq) in dirents[..index].iter().rev().zip(1..=LongDirEntry::ORD_MASK) {
        let Some(long) = dirent.as_long().filter(|long| long.status_ok()) else {
            break;
        };
        if long.seq() != seq {
            break;
        }
        len += 1;
        if long.is_last() {
            complete = true;
            break;
        }
    }
    if len > 0 && !complete {
        log::warn!(
            "long name of {:?} lacks its first slot, ignored",
            short.display_name()
        );
        return &[];
    }
    let run = &dirents[index - len..index];

    if run
        .iter()
        .filter_map(DirEntry::as_long)
        .any(|long| long.checksum() != checksum)
    {
        log::warn!(
            "long name of {:?} has a mismatched checksum, ignored",
            short.display_name()
        );
        return &[];
    }
    run
}

impl LongDirEntry {
    fn status_ok(&self) -> bool {
        self.ord != 0 && self.ord != 0xE5
    }
}

/// 将路径分量转换为补空格的大写8.3名称。
///
/// 名称多于8字节、扩展名多于3字节或含有多个`.`时无法转换。
pub fn short_name_of(name: &str) -> Option<[u8; 11]> {
    let (base, ext) = match name.rsplit_once('.') {
        Some(("", _)) => return None,
        Some((base, ext)) => (base, ext),
        None => (name, ""),
    };
    if base.is_empty() || base.len() > 8 || ext.len() > 3 || base.contains('.') {
        return None;
    }

    let mut short = [b' '; 11];
    for (b, nb) in short[..8].iter_mut().zip(base.bytes()) {
        *b = nb.to_ascii_uppercase();
    }
    for (b, nb) in short[8..].iter_mut().zip(ext.bytes()) {
        *b = nb.to_ascii_uppercase();
    }
    if short[0] == 0xE5 {
        short[0] = 0x05;
    }
    Some(short)
}

const _: () = assert!(mem::size_of::<ShortDirEntry>() == DIR_ENTRY_SIZE);
const _: () = assert!(mem::size_of::<LongDirEntry>() == DIR_ENTRY_SIZE);
