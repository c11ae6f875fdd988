//! 保留区，首扇区为启动扇区

mod bpb;

pub use self::bpb::{BootSector, Geometry};
