//! FAT16文件系统驱动
//!
//! 只遍历既有的目录树并改写已分配文件的字节，
//! 不格式化、不创建或删除文件、不分配新簇，所以文件永远不会变长。

#![no_std]

extern crate alloc;

mod cluster;
pub mod config;
mod control;
mod file;
mod inode;
pub mod path;
mod sector;
pub mod volume;

pub use self::{
    cluster::{ClusterError, ClusterId},
    config::{FatLookup, MountOptions, NameMatch},
    control::{FatFileSystem, SharedFileSystem},
    file::{FileDescriptor, Handle, OpenFlag},
    inode::Inode,
    sector::SectorId,
};

pub type Result<T> = core::result::Result<T, vfs::Error>;
