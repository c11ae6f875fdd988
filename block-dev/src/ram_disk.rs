use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::Mutex;

use crate::{BlockDevice, BLOCK_SIZE};

/// 内存中的块设备，供测试与没有真实存储的环境使用。
///
/// 记录读写的块数，方便观察文件系统实际发出的I/O。
#[derive(Debug)]
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl RamDisk {
    /// 创建`blocks`个全零块。
    pub fn new(blocks: usize) -> Self {
        Self::from_bytes(vec![0; blocks * BLOCK_SIZE])
    }

    /// 长度不足整块时补零。
    pub fn from_bytes(mut bytes: Vec<u8>) -> Self {
        let len = bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        bytes.resize(len, 0);
        Self {
            data: Mutex::new(bytes),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn block_count(&self) -> usize {
        self.data.lock().len() / BLOCK_SIZE
    }

    /// 复制一份当前的全部数据
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn reset_counters(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
    }
}

impl BlockDevice for RamDisk {
    /// 越界的块读出为全零。
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let data = self.data.lock();
        let start = block_id * BLOCK_SIZE;
        match data.get(start..start + buf.len()) {
            Some(block) => buf.copy_from_slice(block),
            None => buf.fill(0),
        }
    }

    /// 越界的写入被丢弃。
    fn write_block(&self, block_id: usize, buf: &[u8]) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut data = self.data.lock();
        let start = block_id * BLOCK_SIZE;
        if let Some(block) = data.get_mut(start..start + buf.len()) {
            block.copy_from_slice(buf);
        }
    }
}
