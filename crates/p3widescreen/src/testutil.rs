//! Builders for synthetic archives used by unit tests.

use crate::archive::{
    ENTRY_FIXED_SIZE, FIRST_HEADER_OFFSET, HEADER_FIXED_SIZE, RESERVED_SIZE, SIGNATURE,
};

/// Lays out an archive as: signature, then for every header the index block
/// followed by the data of its entries. Each header points past its data at
/// the next header; the last one points at EOF unless
/// [`terminate_with`](Self::terminate_with) is used.
pub(crate) struct ArchiveBuilder {
    headers: Vec<Vec<(Vec<u8>, Vec<u8>)>>,
    last_next: Option<i32>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            last_next: None,
        }
    }

    pub fn header(mut self) -> Self {
        self.headers.push(Vec::new());
        self
    }

    pub fn entry(self, name: &str, data: impl AsRef<[u8]>) -> Self {
        self.raw_entry(name.as_bytes(), data)
    }

    pub fn raw_entry(mut self, name: &[u8], data: impl AsRef<[u8]>) -> Self {
        if self.headers.is_empty() {
            self.headers.push(Vec::new());
        }
        if let Some(header) = self.headers.last_mut() {
            header.push((name.to_vec(), data.as_ref().to_vec()));
        }
        self
    }

    /// Store `next` as the last header's next-header offset instead of
    /// pointing at EOF.
    pub fn terminate_with(mut self, next: i32) -> Self {
        self.last_next = Some(next);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = SIGNATURE.as_bytes().to_vec();
        out.push(0);
        out.resize(FIRST_HEADER_OFFSET as usize, 0);

        for (i, entries) in self.headers.iter().enumerate() {
            let header_start = out.len();
            let header_len: usize = HEADER_FIXED_SIZE
                + entries
                    .iter()
                    .map(|(n, _)| ENTRY_FIXED_SIZE + n.len() + 1)
                    .sum::<usize>();
            let data_len: usize = entries.iter().map(|(_, d)| d.len()).sum();
            let is_last = i + 1 == self.headers.len();
            let next = match self.last_next {
                Some(next) if is_last => next,
                _ => data_len as i32,
            };

            out.extend_from_slice(&(header_len as u32).to_le_bytes());
            out.extend_from_slice(&[0; RESERVED_SIZE]);
            out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
            out.extend_from_slice(&next.to_le_bytes());

            let mut data_offset = header_start + header_len;
            for (name, data) in entries {
                out.extend_from_slice(&(data_offset as u32).to_le_bytes());
                out.extend_from_slice(&(data.len() as u32).to_le_bytes());
                out.extend_from_slice(&[0; RESERVED_SIZE]);
                out.extend_from_slice(name);
                out.push(0);
                data_offset += data.len();
            }
            for (_, data) in entries {
                out.extend_from_slice(data);
            }
        }
        out
    }
}
