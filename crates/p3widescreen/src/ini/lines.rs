//! Line splitting that accepts `\n`, `\r\n` and bare `\r`.

use std::io::{self, BufRead, ErrorKind};

use memchr::memchr2;

/// Find the first line terminator in `window`.
pub(crate) fn sniff_line_ending(window: &[u8]) -> Option<&'static str> {
    let i = memchr2(b'\n', b'\r', window)?;
    match (window[i], window.get(i + 1)) {
        (b'\n', _) => Some("\n"),
        (_, Some(b'\n')) => Some("\r\n"),
        _ => Some("\r"),
    }
}

pub(crate) struct Lines<R> {
    inner: R,
    pending_lf: bool,
}

impl<R: BufRead> Lines<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending_lf: false,
        }
    }

    /// Next line without its terminator, or `None` at EOF.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        let mut started = false;
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            if self.pending_lf {
                self.pending_lf = false;
                if buf[0] == b'\n' {
                    self.inner.consume(1);
                    continue;
                }
            }
            started = true;

            let (taken, terminator) = match memchr2(b'\n', b'\r', buf) {
                Some(i) => {
                    line.extend_from_slice(&buf[..i]);
                    (i + 1, Some(buf[i]))
                }
                None => {
                    line.extend_from_slice(buf);
                    (buf.len(), None)
                }
            };
            self.inner.consume(taken);
            if let Some(t) = terminator {
                self.pending_lf = t == b'\r';
                return to_string(line).map(Some);
            }
        }
        if started {
            to_string(line).map(Some)
        } else {
            Ok(None)
        }
    }
}

fn to_string(line: Vec<u8>) -> io::Result<String> {
    String::from_utf8(line).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
}
