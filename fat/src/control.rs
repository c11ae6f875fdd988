use alloc::sync::Arc;
use alloc::vec::Vec;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::config::{MountOptions, SECTOR_SIZE};
use crate::file::{FdTable, FileDescriptor, Handle, OpenFlag};
use crate::path::Path;
use crate::volume::Volume;
use crate::volume::data::{DirEntry, DirEntryStatus};
use crate::volume::reserved::{BootSector, Geometry};
use crate::{ClusterError, ClusterId, Inode, Result};

/// 多线程共享同一个卷时使用
pub type SharedFileSystem = Mutex<FatFileSystem>;

/// 已挂载的FAT16卷，所有状态都在此处，没有全局变量。
#[derive(Debug)]
pub struct FatFileSystem {
    volume: Volume,
    files: FdTable,
    options: MountOptions,
}

impl FatFileSystem {
    /// 读取启动扇区，检查并推导卷的布局。
    pub fn mount(dev: &Arc<dyn BlockDevice>, options: MountOptions) -> Result<Self> {
        let volume = Volume::load(dev, options.fat_lookup)?;
        log::debug!(
            "mounted FAT16 volume: {} clusters of {} bytes",
            volume.geometry().total_clusters,
            volume.geometry().cluster_bytes()
        );

        Ok(Self {
            volume,
            files: FdTable::new(options.max_open_files),
            options,
        })
    }

    pub const fn boot_sector(&self) -> &BootSector {
        self.volume.boot_sector()
    }

    pub const fn geometry(&self) -> &Geometry {
        self.volume.geometry()
    }

    /// 查询FAT，`Ok(None)`表示`id`是链表上最后一个簇。
    pub fn next_cluster(
        &self,
        id: ClusterId,
    ) -> core::result::Result<Option<ClusterId>, ClusterError> {
        self.volume.fat().next(id)
    }

    /// 按磁盘顺序读出目录的全部目录项，`ClusterId::ROOT`为根目录。
    pub fn read_directory(&self, start: ClusterId) -> Vec<DirEntry> {
        self.volume.read_directory(start)
    }

    pub fn resolve(&self, path: &str) -> Result<Inode> {
        Inode::resolve(path, &self.volume, self.options.name_match)
    }

    /// 列举目录，不含长目录项、已删除项、卷标以及`.`与`..`。
    pub fn list(&self, path: &str) -> Result<Vec<vfs::DirEntry>> {
        let dir = if path.is_root() {
            ClusterId::ROOT
        } else {
            self.resolve(path)?.dir_cluster()?
        };

        let dirents = self.volume.read_directory(dir);
        let entries = (0..dirents.len())
            .filter(|&i| {
                dirents[i].as_short().is_some_and(|short| {
                    short.status() == DirEntryStatus::Occupied
                        && !short.is_volume_label()
                        && !short.is_relative()
                })
            })
            .filter_map(|i| Inode::from_dirents(&dirents, i, dir))
            .map(|inode| vfs::DirEntry {
                inode: u64::from(inode.start_id()),
                ty: inode.kind(),
                size: if inode.is_dir() { 0 } else { inode.size() as u64 },
                name: inode.name(),
            })
            .collect();

        Ok(entries)
    }
}

impl FatFileSystem {
    /// 打开文件或目录。
    ///
    /// 先解析路径，再占用描述符，所以路径不存在时不会消耗槽位。
    pub fn open(&mut self, path: &str, mode: &str) -> Result<Handle> {
        let mode = OpenFlag::parse_mode(mode)?;
        let inode = self.resolve(path)?;
        log::debug!("open {path:?} at cluster {} with {mode:?}", inode.start_id());

        self.files.acquire(FileDescriptor::new(inode, mode))
    }

    /// 从当前偏移量读取，返回实际读取的字节数并推进偏移量。
    pub fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        let file = self.files.get_mut(handle)?;
        if file.is_dir() {
            return Err(vfs::Error::IsADirectory);
        }
        if !file.readable() {
            return Err(vfs::Error::PermissionDenied);
        }

        let n = file.inode.read_at(file.offset, buf, &self.volume);
        file.offset += n;
        Ok(n)
    }

    /// 在当前偏移量处覆写，文件大小不变，超出的部分被截断。
    pub fn write(&mut self, handle: Handle, data: &[u8]) -> Result<usize> {
        let file = self.files.get_mut(handle)?;
        if file.is_dir() {
            return Err(vfs::Error::IsADirectory);
        }
        if !file.writable() {
            return Err(vfs::Error::PermissionDenied);
        }

        let n = file.inode.write_at(file.offset, data, &self.volume);
        if n < data.len() {
            log::debug!("short write on {:?}: {n} of {} bytes", file.name(), data.len());
        }
        file.offset += n;
        Ok(n)
    }

    /// 设置偏移量，超出文件大小的部分会被截断。返回新的偏移量。
    pub fn seek(&mut self, handle: Handle, offset: usize) -> Result<usize> {
        let file = self.files.get_mut(handle)?;
        file.offset = offset.min(file.size());
        Ok(file.offset)
    }

    pub fn stat(&self, handle: Handle) -> Result<vfs::Stat> {
        let file = self.files.get(handle)?;
        let inode = file.inode();
        let blocks = self.volume.data_sectors(inode.start_id()).count();

        Ok(vfs::Stat {
            mode: inode.kind(),
            block_size: SECTOR_SIZE as u64,
            blocks: blocks as u64,
            size: inode.size() as u64,
        })
    }

    pub fn close(&mut self, handle: Handle) -> Result<()> {
        let file = self.files.release(handle)?;
        log::debug!("close {:?}", file.name());
        Ok(())
    }

    pub fn file(&self, handle: Handle) -> Result<&FileDescriptor> {
        self.files.get(handle)
    }

    /// 打开中的文件数
    pub fn open_files(&self) -> usize {
        self.files.len()
    }
}
