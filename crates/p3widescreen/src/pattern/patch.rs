use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use tracing::debug;

use super::{BytePattern, DWORD_SIZE, Slot};
use crate::error::{Error, Result};

/// A byte pattern anchored at a fixed file offset.
///
/// Verifying and patching walk the same code path: the region is read into
/// memory, checked (and filled in) slot by slot, and only written back once
/// every literal byte has matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DWordPatch {
    offset: u64,
    pattern: BytePattern,
}

impl DWordPatch {
    pub fn new(offset: u64, pattern: &str) -> Result<Self> {
        Ok(Self {
            offset,
            pattern: pattern.parse()?,
        })
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn pattern(&self) -> &BytePattern {
        &self.pattern
    }

    pub fn wildcard_count(&self) -> usize {
        self.pattern.wildcard_count()
    }

    /// Check that the file holds this pattern, without writing.
    pub fn verify<F: Read + Seek>(&self, file: &mut F) -> Result<()> {
        self.walk(file, None).map(|_| ())
    }

    /// Fill every dword slot with the matching value from `values`.
    ///
    /// `values` must hold exactly one value per slot; nothing is read or
    /// written otherwise.
    pub fn apply<F: Read + Write + Seek>(&self, file: &mut F, values: &[u32]) -> Result<()> {
        if values.len() != self.wildcard_count() {
            return Err(Error::ArgumentCountMismatch {
                expected: self.wildcard_count(),
                actual: values.len(),
            });
        }

        let patched = self.walk(file, Some(values))?;
        file.seek(SeekFrom::Start(self.offset))?;
        file.write_all(&patched)?;
        debug!(
            "Patched {} byte(s) at {:#x} with {:?}",
            patched.len(),
            self.offset,
            values
        );
        Ok(())
    }

    fn walk<F: Read + Seek>(&self, file: &mut F, fill: Option<&[u32]>) -> Result<Vec<u8>> {
        let mut bytes = self.read_region(file)?;
        let mut values = fill.map(|v| v.iter());
        let mut pos = 0;

        for slot in self.pattern.slots() {
            match *slot {
                Slot::DWord => {
                    if let Some(value) = values.as_mut().and_then(|v| v.next()) {
                        bytes[pos..pos + DWORD_SIZE].copy_from_slice(&value.to_le_bytes());
                    }
                }
                Slot::Literal(expected) => {
                    let actual = bytes[pos];
                    if actual != expected {
                        return Err(Error::PatternMismatch {
                            offset: self.offset + pos as u64,
                            expected,
                            actual,
                        });
                    }
                }
            }
            pos += slot.width();
        }
        Ok(bytes)
    }

    fn read_region<F: Read + Seek>(&self, file: &mut F) -> Result<Vec<u8>> {
        let expected = self.pattern.patch_length();
        file.seek(SeekFrom::Start(self.offset))?;

        let mut bytes = vec![0u8; expected];
        let mut filled = 0;
        while filled < expected {
            match file.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if filled != expected {
            return Err(Error::Truncated {
                offset: self.offset,
                expected,
                actual: filled,
            });
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Cursor;

    /// Records every write so tests can assert nothing was written.
    struct WriteCounter {
        inner: Cursor<Vec<u8>>,
        writes: usize,
        reads: usize,
    }

    impl WriteCounter {
        fn new(bytes: Vec<u8>) -> Self {
            Self {
                inner: Cursor::new(bytes),
                writes: 0,
                reads: 0,
            }
        }
    }

    impl Read for WriteCounter {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            self.inner.read(buf)
        }
    }

    impl Write for WriteCounter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.writes += 1;
            self.inner.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Seek for WriteCounter {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    /// Image with two `mov dword [esp+x], imm32` instructions at 0x10.
    fn sample_image() -> Vec<u8> {
        let mut bytes = vec![0x90; 0x10];
        bytes.extend_from_slice(&[0xc7, 0x44, 0x24, 0x4c]);
        bytes.extend_from_slice(&1280u32.to_le_bytes());
        bytes.extend_from_slice(&[0xc7, 0x44, 0x24, 0x50]);
        bytes.extend_from_slice(&1024u32.to_le_bytes());
        bytes.extend_from_slice(&[0xcc; 8]);
        bytes
    }

    fn sample_patch() -> DWordPatch {
        DWordPatch::new(0x10, "c7 44 24 4c ? c7 44 24 50 ?").unwrap()
    }

    #[test]
    fn test_verify_ignores_wildcard_contents() {
        let mut file = Cursor::new(sample_image());
        sample_patch().verify(&mut file).unwrap();
    }

    #[test]
    fn test_verify_reports_first_mismatch() {
        let mut image = sample_image();
        image[0x10 + 3] = 0x48;
        image[0x10 + 8] = 0x00;
        let err = sample_patch().verify(&mut Cursor::new(image)).unwrap_err();
        assert!(matches!(
            err,
            Error::PatternMismatch {
                offset: 0x13,
                expected: 0x4c,
                actual: 0x48
            }
        ));
    }

    #[test]
    fn test_verify_short_file() {
        let mut image = sample_image();
        image.truncate(0x18);
        let err = sample_patch().verify(&mut Cursor::new(image)).unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                offset: 0x10,
                expected: 16,
                actual: 8
            }
        ));
    }

    #[test]
    fn test_apply_writes_values_little_endian() {
        let mut file = Cursor::new(sample_image());
        sample_patch().apply(&mut file, &[1440, 900]).unwrap();

        let bytes = file.into_inner();
        assert_eq!(&bytes[0x14..0x18], &1440u32.to_le_bytes());
        assert_eq!(&bytes[0x1c..0x20], &900u32.to_le_bytes());
        // surrounding bytes untouched
        assert_eq!(&bytes[..0x10], &[0x90; 0x10]);
        assert_eq!(&bytes[0x20..], &[0xcc; 8]);
    }

    #[test]
    fn test_apply_is_repeatable() {
        let mut file = Cursor::new(sample_image());
        let patch = sample_patch();
        patch.apply(&mut file, &[1440, 900]).unwrap();
        patch.verify(&mut file).unwrap();
        patch.apply(&mut file, &[1920, 1080]).unwrap();
        assert_eq!(&file.get_ref()[0x14..0x18], &1920u32.to_le_bytes());
    }

    #[test]
    fn test_apply_never_writes_on_mismatch() {
        let mut image = sample_image();
        // the last literal byte fails, after both dwords were filled in memory
        image[0x10 + 11] = 0x51;
        let original = image.clone();
        let mut file = WriteCounter::new(image);

        let err = sample_patch().apply(&mut file, &[1440, 900]).unwrap_err();
        assert!(matches!(err, Error::PatternMismatch { offset: 0x1b, .. }));
        assert_eq!(file.writes, 0);
        assert_eq!(file.inner.into_inner(), original);
    }

    #[test]
    fn test_apply_rejects_wrong_value_count_before_io() {
        let patch = sample_patch();
        for values in [&[1440u32][..], &[1440, 900, 1][..]] {
            let mut file = WriteCounter::new(sample_image());
            let err = patch.apply(&mut file, values).unwrap_err();
            assert!(matches!(
                err,
                Error::ArgumentCountMismatch { expected: 2, .. }
            ));
            assert_eq!(file.reads, 0);
            assert_eq!(file.writes, 0);
        }
    }

    #[test]
    fn test_apply_on_disk() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), sample_image()).unwrap();

        let patch = DWordPatch::new(0x10, "c7 44 24 4c ?").unwrap();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(temp.path())
            .unwrap();
        patch.apply(&mut file, &[1600]).unwrap();
        drop(file);

        let bytes = std::fs::read(temp.path()).unwrap();
        assert_eq!(bytes.len(), sample_image().len());
        assert_eq!(&bytes[0x14..0x18], &1600u32.to_le_bytes());
        assert_eq!(&bytes[0x1c..0x20], &1024u32.to_le_bytes());
    }
}
