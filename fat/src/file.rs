//! 文件描述符层
//!
//! 容量固定的描述符表，线性扫描分配。
//! 句柄由槽位索引与代数组成，槽位被释放后代数加一，旧句柄随之失效。

use alloc::string::String;
use alloc::vec::Vec;

use enumflags2::{BitFlags, bitflags};

use crate::{ClusterId, Inode, Result};

#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlag {
    Read = 0b001,
    Write = 0b010,
    /// 起始偏移量为文件末尾
    Append = 0b100,
}

impl OpenFlag {
    /// 解析`fopen`风格的模式字符串，`b`后缀被忽略。
    ///
    /// 文件大小不可变，所以`w`不会清空文件。
    pub fn parse_mode(mode: &str) -> Result<BitFlags<Self>> {
        let mode = mode.strip_suffix('b').unwrap_or(mode);
        let mode = match mode {
            "r" => Self::Read.into(),
            "w" => Self::Write.into(),
            "a" => Self::Append.into(),
            "r+" | "w+" => Self::Read | Self::Write,
            "a+" => Self::Read | Self::Append,
            _ => return Err(vfs::Error::InvalidMode),
        };
        Ok(mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u32,
}

impl Handle {
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// 打开的文件
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub(crate) inode: Inode,
    /// 顺序读写的当前偏移量
    pub(crate) offset: usize,
    mode: BitFlags<OpenFlag>,
}

impl FileDescriptor {
    pub fn new(inode: Inode, mode: BitFlags<OpenFlag>) -> Self {
        let offset = if mode.contains(OpenFlag::Append) {
            inode.size()
        } else {
            0
        };
        Self {
            inode,
            offset,
            mode,
        }
    }

    /// 有长名称时为长名称，否则为`NAME.EXT`
    pub fn name(&self) -> String {
        self.inode.name()
    }

    pub fn short_name(&self) -> String {
        self.inode.short_entry().display_name()
    }

    pub fn long_name(&self) -> Option<&str> {
        self.inode.long_name()
    }

    pub fn first_cluster(&self) -> ClusterId {
        self.inode.start_id()
    }

    pub fn size(&self) -> usize {
        self.inode.size()
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_dir(&self) -> bool {
        self.inode.is_dir()
    }

    pub fn parent_cluster(&self) -> ClusterId {
        self.inode.parent()
    }

    pub const fn mode(&self) -> BitFlags<OpenFlag> {
        self.mode
    }

    pub fn readable(&self) -> bool {
        self.mode.contains(OpenFlag::Read)
    }

    pub fn writable(&self) -> bool {
        self.mode.intersects(OpenFlag::Write | OpenFlag::Append)
    }

    pub fn inode(&self) -> &Inode {
        &self.inode
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    file: Option<FileDescriptor>,
}

#[derive(Debug)]
pub struct FdTable {
    slots: Vec<Slot>,
}

impl FdTable {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::default);
        Self { slots }
    }

    /// 打开中的文件数
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.file.is_some()).count()
    }

    /// 占用第一个空槽位
    pub fn acquire(&mut self, file: FileDescriptor) -> Result<Handle> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.file.is_none())
            .ok_or(vfs::Error::ResourceExhausted)?;
        slot.file = Some(file);

        Ok(Handle {
            index,
            generation: slot.generation,
        })
    }

    pub fn get(&self, handle: Handle) -> Result<&FileDescriptor> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.file.as_ref())
            .ok_or(vfs::Error::NotOpen)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut FileDescriptor> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.file.as_mut())
            .ok_or(vfs::Error::NotOpen)
    }

    /// 释放槽位，旧句柄从此失效
    pub fn release(&mut self, handle: Handle) -> Result<FileDescriptor> {
        let slot = self
            .slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation && slot.file.is_some())
            .ok_or(vfs::Error::NotOpen)?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.file.take().ok_or(vfs::Error::NotOpen)
    }
}
