//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、SD卡、磁盘镜像等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统只通过块设备驱动读写数据，并假定每次读写都会成功。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;

pub use self::ram_disk::RamDisk;

/// 块的字节量
pub const BLOCK_SIZE: usize = 512;

/// 块设备驱动特质
///
/// `buf`的长度恒为[`BLOCK_SIZE`]。
pub trait BlockDevice: Send + Sync + Any {
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);
}
