//! Settings line protocol
//!
//! Every store holds the same text format:
//!
//! ```text
//! # comment
//! speed_rate            100      # trailing comment
//! temperature_control.hotend.enable  true
//! ```
//!
//! One `key value` pair per line, optional leading whitespace, `\n` or
//! `\r\n` terminated. Lines shorter than three bytes or starting with `#`
//! are ignored. Text ends at the end of the source, at the byte budget given
//! to the cursor, or at an [`END_MARKER`] byte.
//!
//! The reader works on bytes through [`ByteSource`] so the same code runs
//! over a file, a memory range in the firmware image, or a flash sector.

use heapless::Vec;

/// Maximum number of bytes kept per line
pub const MAX_LINE_LEN: usize = 256;

/// Byte that terminates the text region
pub const END_MARKER: u8 = 0x00;

/// Bytes fetched from the source per read
const CHUNK_SIZE: usize = 64;

/// Random-access byte source the line cursor reads from
pub trait ByteSource {
    /// Error raised by the underlying medium
    type Error;

    /// Read up to `buf.len()` bytes starting at `offset`
    ///
    /// Returns the number of bytes read; zero means end of data.
    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl ByteSource for &[u8] {
    type Error = core::convert::Infallible;

    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let start = (offset as usize).min(self.len());
        let len = buf.len().min(self.len() - start);
        buf[..len].copy_from_slice(&self[start..start + len]);
        Ok(len)
    }
}

/// One line of text as read from a source, without its `\n`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    offset: u32,
    bytes: Vec<u8, MAX_LINE_LEN>,
    truncated: bool,
}

impl RawLine {
    /// Source offset of the first byte of the line
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Line bytes (at most [`MAX_LINE_LEN`])
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True if the line was longer than [`MAX_LINE_LEN`]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Parse the line as a `key value` pair
    ///
    /// A truncated line still parses if its value ends before the cut.
    pub fn parse(&self) -> Option<ConfigLine<'_>> {
        let line = parse_line(&self.bytes)?;
        if self.truncated && line.value_offset + line.value.len() == self.bytes.len() {
            return None;
        }
        Some(line)
    }
}

/// A parsed `key value` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigLine<'a> {
    /// Key token (may contain `.` separated path segments)
    pub key: &'a str,
    /// Value token
    pub value: &'a str,
    /// Offset of the value within the line
    pub value_offset: usize,
    /// Bytes from the value start to the next `#`, `\r` or line end
    ///
    /// This is the room available to rewrite the value in place.
    pub value_span: usize,
}

fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Parse one line (without its `\n`) into a key and a value
///
/// Returns `None` for comments, blank or short lines, and lines without a
/// value.
pub fn parse_line(line: &[u8]) -> Option<ConfigLine<'_>> {
    if line.len() < 3 || line[0] == b'#' {
        return None;
    }

    let begin_key = line.iter().position(|&b| !is_blank(b))?;
    if matches!(line[begin_key], b'#' | b'\r') {
        return None;
    }

    let end_key = begin_key + line[begin_key..].iter().position(|&b| is_blank(b) || b == b'\r')?;
    if line[end_key] == b'\r' {
        return None;
    }

    let begin_value = end_key + line[end_key..].iter().position(|&b| !is_blank(b))?;
    if matches!(line[begin_value], b'#' | b'\r') {
        return None;
    }

    let rest = &line[begin_value..];
    let value_len = rest
        .iter()
        .position(|&b| is_blank(b) || b == b'#' || b == b'\r')
        .unwrap_or(rest.len());
    let value_span = rest
        .iter()
        .position(|&b| b == b'#' || b == b'\r')
        .unwrap_or(rest.len());

    let key = core::str::from_utf8(&line[begin_key..end_key]).ok()?;
    let value = core::str::from_utf8(&rest[..value_len]).ok()?;

    Some(ConfigLine {
        key,
        value,
        value_offset: begin_value,
        value_span,
    })
}

/// Buffered line cursor over a [`ByteSource`]
///
/// The cursor does not own its source; the source is passed to every call so
/// a caller may write to the same medium between lines.
///
/// # Example
///
/// ```
/// use pico_settings_core::LineCursor;
///
/// let mut text: &[u8] = b"# header\nspeed_rate 100\n";
/// let mut cursor = LineCursor::new();
/// let mut values = 0;
/// while let Ok(Some(line)) = cursor.next_line(&mut text) {
///     if line.parse().is_some() {
///         values += 1;
///     }
/// }
/// assert_eq!(values, 1);
/// ```
#[derive(Debug, Clone)]
pub struct LineCursor {
    chunk: [u8; CHUNK_SIZE],
    chunk_len: usize,
    chunk_pos: usize,
    next_read: u32,
    limit: u32,
    finished: bool,
}

impl LineCursor {
    /// Cursor reading until the end of the source or an end marker
    pub fn new() -> Self {
        Self::with_limit(u32::MAX)
    }

    /// Cursor that never reads at or past `limit`
    pub fn with_limit(limit: u32) -> Self {
        Self {
            chunk: [0; CHUNK_SIZE],
            chunk_len: 0,
            chunk_pos: 0,
            next_read: 0,
            limit,
            finished: false,
        }
    }

    /// Source offset of the next unread byte
    pub fn position(&self) -> u32 {
        self.next_read - (self.chunk_len - self.chunk_pos) as u32
    }

    /// True once the end of the text has been reached
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn next_byte<S: ByteSource>(&mut self, source: &mut S) -> Result<Option<u8>, S::Error> {
        if self.finished {
            return Ok(None);
        }

        if self.chunk_pos == self.chunk_len {
            let want = CHUNK_SIZE.min(self.limit.saturating_sub(self.next_read) as usize);
            if want == 0 {
                self.finished = true;
                return Ok(None);
            }
            let read = source.read_at(self.next_read, &mut self.chunk[..want])?;
            if read == 0 {
                self.finished = true;
                return Ok(None);
            }
            self.chunk_len = read;
            self.chunk_pos = 0;
            self.next_read += read as u32;
        }

        let byte = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        if byte == END_MARKER {
            self.finished = true;
            return Ok(None);
        }
        Ok(Some(byte))
    }

    /// Read the next line
    ///
    /// Returns `Ok(None)` at the end of the text. Bytes beyond
    /// [`MAX_LINE_LEN`] are dropped and the line is flagged as truncated.
    pub fn next_line<S: ByteSource>(&mut self, source: &mut S) -> Result<Option<RawLine>, S::Error> {
        let mut line = RawLine {
            offset: self.position(),
            bytes: Vec::new(),
            truncated: false,
        };
        let mut seen_any = false;

        loop {
            match self.next_byte(source)? {
                None => return Ok(seen_any.then_some(line)),
                Some(b'\n') => return Ok(Some(line)),
                Some(byte) => {
                    seen_any = true;
                    if line.bytes.push(byte).is_err() {
                        line.truncated = true;
                    }
                }
            }
        }
    }
}

impl Default for LineCursor {
    fn default() -> Self {
        Self::new()
    }
}
