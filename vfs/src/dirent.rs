use alloc::string::String;

/// 目录列举所交换的目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// 首簇编号，空文件为0
    pub inode: u64,
    pub ty: DirEntryType,
    /// 有长名称时为长名称，否则为`NAME.EXT`
    pub name: String,
    /// 字节数，目录恒为0
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DirEntryType {
    Directory,
    #[default]
    Regular,
}
