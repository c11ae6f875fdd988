//! 以`/`分隔的路径

use crate::config::NameMatch;
use crate::volume::data::{ShortDirEntry, short_name_of};

pub trait Path {
    /// 在最后一个`/`处切分，返回`(父目录, 文件名)`。
    ///
    /// 没有`/`时父目录为空字符串，即根目录。
    fn split_leaf(&self) -> (&Self, &Self);

    /// 非空的路径分量，忽略开头、结尾及重复的`/`
    fn components(&self) -> impl DoubleEndedIterator<Item = &Self>;

    /// 是否指向根目录
    fn is_root(&self) -> bool;
}

impl Path for str {
    fn split_leaf(&self) -> (&Self, &Self) {
        self.rsplit_once('/').unwrap_or(("", self))
    }

    fn components(&self) -> impl DoubleEndedIterator<Item = &Self> {
        self.split('/').filter(|cmp| !cmp.is_empty())
    }

    fn is_root(&self) -> bool {
        self.components().next().is_none()
    }
}

/// 在最后一个`/`处切分为`(父目录, 文件名)`
pub fn split_path(path: &str) -> (&str, &str) {
    path.split_leaf()
}

/// 路径分量是否指向该短目录项。
///
/// `long_name`为该目录项的长名称（若有）。
pub fn matches(cmp: &str, short: &ShortDirEntry, long_name: Option<&str>, mode: NameMatch) -> bool {
    match mode {
        NameMatch::Canonical => {
            short_name_of(cmp).is_some_and(|name| name == short.raw_name())
                || long_name.is_some_and(|long| long.eq_ignore_ascii_case(cmp))
        }
        NameMatch::Raw => {
            let mut raw = [0; 8];
            for (b, nb) in raw.iter_mut().zip(cmp.bytes()) {
                *b = nb;
            }
            short.raw_name()[..8] == raw
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::volume::data::{DIR_ENTRY_SIZE, DirEntry};

    fn short(name: &[u8; 11]) -> ShortDirEntry {
        let mut raw = [0; DIR_ENTRY_SIZE];
        raw[..11].copy_from_slice(name);
        raw[11] = 0x20;
        *DirEntry::from_bytes(&raw).as_short().unwrap()
    }

    #[test]
    fn split_on_last_slash() {
        assert_eq!(("/a/b", "c"), "/a/b/c".split_leaf());
        assert_eq!(("", "FOO.TXT"), "/FOO.TXT".split_leaf());
        assert_eq!(("", "FOO.TXT"), "FOO.TXT".split_leaf());
        assert_eq!(("a", ""), "a/".split_leaf());
        assert_eq!(("/DIR", "FILE.TXT"), split_path("/DIR/FILE.TXT"));
    }

    #[test]
    fn components_skip_empty_segments() {
        let cmps: Vec<_> = "//a/b//c/".components().collect();
        assert_eq!(["a", "b", "c"], cmps.as_slice());
        assert!("/".is_root());
        assert!("".is_root());
        assert!(!"/a".is_root());
    }

    #[test]
    fn canonical_matching() {
        let foo = short(b"FOO     TXT");
        assert!(matches("FOO.TXT", &foo, None, NameMatch::Canonical));
        assert!(matches("foo.txt", &foo, None, NameMatch::Canonical));
        assert!(!matches("FOO", &foo, None, NameMatch::Canonical));
        assert!(!matches("FOO     TXT", &foo, None, NameMatch::Canonical));

        let long = short(b"MYDOCU~1   ");
        assert!(matches("My Documents", &long, Some("My Documents"), NameMatch::Canonical));
        assert!(matches("my documents", &long, Some("My Documents"), NameMatch::Canonical));
        assert!(matches("MYDOCU~1", &long, Some("My Documents"), NameMatch::Canonical));
    }

    #[test]
    fn raw_matching_compares_eight_bytes() {
        let padded = short(b"FOO     TXT");
        assert!(matches("FOO     ", &padded, None, NameMatch::Raw));
        assert!(matches("FOO     TXT", &padded, None, NameMatch::Raw));
        assert!(!matches("FOO", &padded, None, NameMatch::Raw));
        assert!(!matches("FOO.TXT", &padded, None, NameMatch::Raw));

        let full = short(b"ABCDEFGHTXT");
        assert!(matches("ABCDEFGH", &full, None, NameMatch::Raw));
    }
}
