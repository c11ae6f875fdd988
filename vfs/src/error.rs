use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// 路径解析失败
    NotFound,
    /// 文件描述符已用尽
    ResourceExhausted,
    /// 句柄已关闭或已失效
    NotOpen,
    NotADirectory,
    IsADirectory,
    /// 打开模式不允许此操作
    PermissionDenied,
    /// 无法识别的打开模式
    InvalidMode,
    /// 启动扇区未通过检查
    CorruptFilesystem,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::NotFound => "no such file or directory",
            Error::ResourceExhausted => "too many open files",
            Error::NotOpen => "file is not open",
            Error::NotADirectory => "not a directory",
            Error::IsADirectory => "is a directory",
            Error::PermissionDenied => "operation not permitted by open mode",
            Error::InvalidMode => "invalid open mode",
            Error::CorruptFilesystem => "corrupt filesystem",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}
