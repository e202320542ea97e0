//! LFS pointer file format.
//!
//! LFS pointer files are small text files that replace large files in the Git repository.
//! The checkout filter only needs the `oid sha256:` line out of them; the
//! version and size lines are read when present.

use crate::{Error, Oid, Result};

/// LFS specification version.
pub const LFS_SPEC_V1: &str = "https://git-lfs.github.com/spec/v1";

/// Maximum size of an LFS pointer file (1KB).
pub const MAX_POINTER_SIZE: usize = 1024;

/// Line prefix carrying the object id.
pub const OID_PREFIX: &str = "oid sha256:";

/// An LFS pointer representing a file stored in LFS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    /// The SHA256 hash of the file content.
    oid: Oid,
    /// The size of the file in bytes, if the pointer states one.
    size: Option<u64>,
}

impl Pointer {
    /// Create a new pointer with the given OID and size.
    pub fn new(oid: Oid, size: u64) -> Self {
        Pointer {
            oid,
            size: Some(size),
        }
    }

    /// Create a pointer from file content.
    pub fn from_content(content: &[u8]) -> Self {
        Pointer::new(Oid::from_content(content), content.len() as u64)
    }

    /// Find the raw `<hex>` of the first `oid sha256:<hex>` line.
    pub fn find_oid(text: &str) -> Option<&str> {
        text.lines()
            .find_map(|line| line.trim().strip_prefix(OID_PREFIX))
            .map(str::trim)
    }

    /// Parse a pointer from its text representation.
    ///
    /// Only the oid line is required. Anything larger than
    /// [`MAX_POINTER_SIZE`] is real content, not a pointer.
    pub fn parse(content: &[u8]) -> Result<Self> {
        if content.len() > MAX_POINTER_SIZE {
            return Err(Error::InvalidPointer(
                "content too large to be a pointer".into(),
            ));
        }

        let text = String::from_utf8_lossy(content);

        let hex = Pointer::find_oid(&text)
            .ok_or_else(|| Error::InvalidPointer("missing oid".into()))?;
        let oid = Oid::parse(hex)?;

        let mut size = None;
        for line in text.lines() {
            if let Some(rest) = line.trim().strip_prefix("size ") {
                size = Some(
                    rest.trim()
                        .parse()
                        .map_err(|_| Error::InvalidPointer("invalid size".into()))?,
                );
            }
        }

        Ok(Pointer { oid, size })
    }

    /// Get the OID of this pointer.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Get the size of the file.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Encode the pointer to its text representation.
    pub fn encode(&self) -> String {
        let mut text = format!("version {}\n{}{}\n", LFS_SPEC_V1, OID_PREFIX, self.oid);
        if let Some(size) = self.size {
            text.push_str(&format!("size {}\n", size));
        }
        text
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_from_content() {
        let pointer = Pointer::from_content(b"Hello, World!");
        assert_eq!(pointer.size(), Some(13));
        assert_eq!(
            pointer.oid().as_str(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_pointer_encode_matches_git_lfs() {
        let pointer = Pointer::from_content(b"Hello, World!");
        assert_eq!(
            pointer.encode(),
            "version https://git-lfs.github.com/spec/v1\n\
             oid sha256:dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f\n\
             size 13\n"
        );
    }

    #[test]
    fn test_pointer_parse_valid() {
        let pointer_text = b"version https://git-lfs.github.com/spec/v1\n\
            oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
            size 12345\n";

        let pointer = Pointer::parse(pointer_text).unwrap();
        assert_eq!(pointer.size(), Some(12345));
        assert_eq!(
            pointer.oid().as_str(),
            "4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393"
        );
    }

    #[test]
    fn test_pointer_parse_oid_only() {
        let pointer = Pointer::parse(b"oid sha256:abcd1234\n").unwrap();
        assert_eq!(pointer.oid().as_str(), "abcd1234");
        assert_eq!(pointer.size(), None);
    }

    #[test]
    fn test_pointer_parse_invalid() {
        // Not a pointer
        assert!(Pointer::parse(b"Hello, World!").is_err());

        // Missing oid
        let no_oid = b"version https://git-lfs.github.com/spec/v1\nsize 123\n";
        assert!(Pointer::parse(no_oid).is_err());

        // Bad size
        assert!(Pointer::parse(b"oid sha256:abcd1234\nsize lots\n").is_err());

        // Oid line with non-hex id
        assert!(Pointer::parse(b"oid sha256:not-a-hash\n").is_err());

        // Too large
        let mut large = b"oid sha256:abcd1234\n".to_vec();
        large.extend(vec![b'x'; 2000]);
        assert!(Pointer::parse(&large).is_err());
    }

    #[test]
    fn test_find_oid_scans_lines() {
        let text = "version https://git-lfs.github.com/spec/v1\r\n  oid sha256:beef0001  \r\nsize 1\r\n";
        assert_eq!(Pointer::find_oid(text), Some("beef0001"));
        assert_eq!(Pointer::find_oid("oid md5:abcd\n"), None);
        assert_eq!(Pointer::find_oid(""), None);
    }
}
