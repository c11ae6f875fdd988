use alloc::string::String;
use core::ops::Range;

use vfs::DirEntryType;

use crate::config::{NameMatch, SECTOR_SIZE};
use crate::path::{self, Path};
use crate::sector::Sector;
use crate::volume::Volume;
use crate::volume::data::{DirEntry, DirEntryStatus, ShortDirEntry, lfn_run, long_name};
use crate::{ClusterId, Result};

/// 目录项会指向一个簇链表，这就是FAT文件系统中的inode。
///
/// 解析路径得到的目录项，连同其长名称与所在目录的首簇。
#[derive(Debug, Clone)]
pub struct Inode {
    short: ShortDirEntry,
    long_name: Option<String>,
    /// 所在目录的首簇，根目录为[`ClusterId::ROOT`]
    parent: ClusterId,
}

impl Inode {
    /// 逐个分量地解析路径。
    ///
    /// 中间的分量不存在时立即失败，不会再读取更深的目录。
    /// 中间的目录首簇为0时只有`..`才回到根目录，其余视为不存在，见[`Inode::dir_cluster`]。
    pub fn resolve(path: &str, volume: &Volume, mode: NameMatch) -> Result<Self> {
        let mut cmps = path.components();
        let basename = cmps.next_back().ok_or(vfs::Error::NotFound)?;

        let mut dir = ClusterId::ROOT;
        for cmp in cmps {
            let inode = Self::find_cwd(dir, cmp, volume, mode).ok_or(vfs::Error::NotFound)?;
            if !inode.is_dir() {
                log::debug!("{cmp:?} in {path:?} isn't a directory");
            }
            dir = inode.dir_cluster()?;
        }

        Self::find_cwd(dir, basename, volume, mode).ok_or(vfs::Error::NotFound)
    }

    /// 搜索`dir`目录下指定名称的项，首个匹配者胜出。
    fn find_cwd(dir: ClusterId, name: &str, volume: &Volume, mode: NameMatch) -> Option<Self> {
        log::debug!("look up {name:?} in cluster {dir}");
        let dirents = volume.read_directory(dir);

        dirents.iter().enumerate().find_map(|(i, dirent)| {
            let short = dirent.as_short()?;
            if short.status() != DirEntryStatus::Occupied || short.is_volume_label() {
                return None;
            }

            let long = long_name(lfn_run(&dirents, i));
            path::matches(name, short, long.as_deref(), mode).then(|| Self {
                short: *short,
                long_name: long,
                parent: dir,
            })
        })
    }

    pub(crate) fn from_dirents(dirents: &[DirEntry], index: usize, parent: ClusterId) -> Option<Self> {
        let short = dirents.get(index)?.as_short()?;
        Some(Self {
            short: *short,
            long_name: long_name(lfn_run(dirents, index)),
            parent,
        })
    }

    pub fn start_id(&self) -> ClusterId {
        self.short.cluster_id()
    }

    /// 作为目录时的首簇。
    ///
    /// 簇号0与[`ClusterId::ROOT`]相同，`..`以此指向根目录；
    /// 其他目录项的簇号为0说明目录项已损坏，返回`NotFound`而不是根目录。
    pub(crate) fn dir_cluster(&self) -> Result<ClusterId> {
        if !self.is_dir() {
            return Err(vfs::Error::NotADirectory);
        }

        let id = self.start_id();
        if id == ClusterId::FREE && !self.short.is_relative() {
            log::warn!("directory {:?} has no cluster", self.short.display_name());
            return Err(vfs::Error::NotFound);
        }
        Ok(id)
    }

    pub fn parent(&self) -> ClusterId {
        self.parent
    }

    pub fn size(&self) -> usize {
        self.short.size()
    }

    pub fn is_dir(&self) -> bool {
        self.short.is_dir()
    }

    pub fn kind(&self) -> DirEntryType {
        if self.is_dir() {
            DirEntryType::Directory
        } else {
            DirEntryType::Regular
        }
    }

    pub fn short_entry(&self) -> &ShortDirEntry {
        &self.short
    }

    pub fn long_name(&self) -> Option<&str> {
        self.long_name.as_deref()
    }

    /// 有长名称时为长名称，否则为`NAME.EXT`
    pub fn name(&self) -> String {
        self.long_name
            .clone()
            .unwrap_or_else(|| self.short.display_name())
    }
}

impl Inode {
    /// 文件
    ///
    /// 从`offset`处读取，返回实际读取的字节数。
    pub fn read_at(&self, offset: usize, buf: &mut [u8], volume: &Volume) -> usize {
        debug_assert!(!self.is_dir());

        self.walk(offset, buf.len(), volume, |sector, in_sector, in_buf| {
            sector.map_slice(|data| buf[in_buf].copy_from_slice(&data[in_sector]))
        })
    }

    /// 文件
    ///
    /// 在`offset`处覆写，先读出扇区，改动后整块写回。
    /// 文件不会变长，写到文件末尾或簇链表末尾即止。
    pub fn write_at(&self, offset: usize, buf: &[u8], volume: &Volume) -> usize {
        debug_assert!(!self.is_dir());

        self.walk(offset, buf.len(), volume, |sector, in_sector, in_buf| {
            sector.map_mut_slice(|data| data[in_sector].copy_from_slice(&buf[in_buf]))
        })
    }

    /// 将`[offset, offset + len)`与文件大小的交集映射到扇区上，
    /// 对每段连续字节调用`step(扇区, 扇区内范围, 缓冲区内范围)`。
    fn walk(
        &self,
        offset: usize,
        len: usize,
        volume: &Volume,
        mut step: impl FnMut(&mut Sector, Range<usize>, Range<usize>),
    ) -> usize {
        let file_size = self.size();
        let end = offset.saturating_add(len).min(file_size); // exclusive
        if offset >= end {
            return 0;
        }

        let cluster_bytes = volume.geometry().cluster_bytes();
        let mut pos = offset;

        for cid in volume.fat().chain(self.start_id()).skip(offset / cluster_bytes) {
            let Ok(sectors) = volume.data().cluster(cid) else {
                break;
            };

            loop {
                let in_cluster = pos % cluster_bytes;
                let in_sector = pos % SECTOR_SIZE;
                let n = (SECTOR_SIZE - in_sector).min(end - pos);

                let mut sector = volume.disk().load(sectors.start + in_cluster / SECTOR_SIZE);
                let done = pos - offset;
                step(&mut sector, in_sector..in_sector + n, done..done + n);
                pos += n;

                if pos == end || pos % cluster_bytes == 0 {
                    break;
                }
            }

            if pos == end {
                break;
            }
        }

        if pos < end {
            log::debug!(
                "chain of cluster {} ended {} bytes before the file size",
                self.start_id(),
                file_size - pos
            );
        }
        pos - offset
    }
}
