//! Reader for Ascaron `.cpr` resource archives.
//!
//! The archive index is a chain of headers. Each header lists a batch of
//! entries and points at the next header relative to its own end. The whole
//! chain is read once at open time into a name → (offset, length) map;
//! entries are then extracted by seeking into the file.

mod format;

pub use format::{
    ENTRY_FIXED_SIZE, FIRST_HEADER_OFFSET, HEADER_FIXED_SIZE, RESERVED_SIZE, SIGNATURE,
    TEXT_ENCODING, decode_text, encode_text,
};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use format::{read_cstring, read_u32, skip_reserved, try_read_u32};

/// Location of one file inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub offset: u64,
    pub length: u64,
}

/// An open archive with its parsed index.
pub struct Archive<R: Read + Seek> {
    reader: BufReader<R>,
    index: HashMap<String, IndexEntry>,
}

impl Archive<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening archive {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Validate the signature and read the full header chain.
    pub fn from_reader(inner: R) -> Result<Self> {
        let mut archive = Self {
            reader: BufReader::new(inner),
            index: HashMap::new(),
        };
        archive.check_signature()?;
        archive.read_index()?;
        debug!("Archive index holds {} entries", archive.index.len());
        Ok(archive)
    }

    fn check_signature(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        let raw = read_cstring(&mut self.reader).map_err(|_| Error::InvalidSignature {
            expected: SIGNATURE.to_string(),
            found: String::new(),
        })?;
        let found = decode_text(&raw);
        if found != SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: SIGNATURE.to_string(),
                found,
            });
        }
        Ok(())
    }

    fn read_index(&mut self) -> Result<()> {
        let mut header_offset = FIRST_HEADER_OFFSET;
        loop {
            debug!("Moving to header at {:#x}", header_offset);
            self.reader.seek(SeekFrom::Start(header_offset))?;

            // Well-formed archives end with a header pointer to EOF.
            let Some(header_length) = try_read_u32(&mut self.reader, header_offset)? else {
                debug!("Hit EOF reading header at {:#x}, index complete", header_offset);
                break;
            };
            skip_reserved(&mut self.reader, header_offset + 4)?;
            let entry_count = read_u32(&mut self.reader, header_offset + 8)?;
            let next_header = read_u32(&mut self.reader, header_offset + 12)? as i32;
            debug!(
                "Header at {:#x}: length={} entries={} next={}",
                header_offset, header_length, entry_count, next_header
            );

            for _ in 0..entry_count {
                self.read_entry()?;
            }

            if next_header <= 0 {
                debug!("Header chain ends at {:#x}", header_offset);
                break;
            }
            header_offset += u64::from(header_length) + next_header as u64;
        }
        Ok(())
    }

    fn read_entry(&mut self) -> Result<()> {
        let position = self.reader.stream_position()?;
        let offset = read_u32(&mut self.reader, position)?;
        let length = read_u32(&mut self.reader, position + 4)?;
        if !is_positive(offset) || !is_positive(length) {
            return Err(Error::ArchiveCorrupt(format!(
                "invalid offset ({:#x}) and/or length ({}) in entry at {:#x}",
                offset, length, position
            )));
        }
        skip_reserved(&mut self.reader, position + 8)?;
        let raw_name = read_cstring(&mut self.reader).map_err(|_| {
            let name_start = position + ENTRY_FIXED_SIZE as u64;
            Error::ArchiveCorrupt(format!("unterminated entry name at {:#x}", name_start))
        })?;
        let name = decode_text(&raw_name);
        debug!("Read file={} offset={:#x} length={}", name, offset, length);

        let entry = IndexEntry {
            offset: u64::from(offset),
            length: u64::from(length),
        };
        if let Some(previous) = self.index.insert(name.clone(), entry) {
            warn!(
                "Archive lists {} twice (offset {:#x} replaced by {:#x})",
                name, previous.offset, entry.offset
            );
        }
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Option<IndexEntry> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All entries ordered by their position in the archive.
    pub fn entries(&self) -> Vec<(&str, IndexEntry)> {
        let mut entries: Vec<_> = self
            .index
            .iter()
            .map(|(name, entry)| (name.as_str(), *entry))
            .collect();
        entries.sort_by_key(|(name, entry)| (entry.offset, *name));
        entries
    }

    /// Read the full contents of an entry.
    pub fn extract(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .entry(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        let expected = entry.length as usize;

        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let mut data = Vec::with_capacity(expected);
        (&mut self.reader)
            .take(entry.length)
            .read_to_end(&mut data)?;
        if data.len() != expected {
            return Err(Error::Truncated {
                offset: entry.offset,
                expected,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// Extract an entry and decode it as legacy single-byte text.
    pub fn extract_text(&mut self, name: &str) -> Result<String> {
        let data = self.extract(name)?;
        Ok(decode_text(&data))
    }

    /// Extract a text entry as a line-readable stream.
    pub fn text_reader(&mut self, name: &str) -> Result<Cursor<String>> {
        Ok(Cursor::new(self.extract_text(name)?))
    }
}

fn is_positive(value: u32) -> bool {
    value > 0 && value <= i32::MAX as u32
}
