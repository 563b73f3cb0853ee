//! TXT record creation
//!
//! Splits a token into indexed frames (`"<index>:<chunk>"`) that each fit
//! in a single TXT character-string. The index prefix is budgeted by width
//! class rather than exact digit count, so every frame in the same
//! hundred/thousand bracket carries the same amount of payload.

use crate::{Error, Result};

/// Largest permitted frame length (one TXT character-string, minus one)
pub const MAX_LINE_LENGTH: usize = 254;

/// Default total record size budget
pub const DEFAULT_MAX_SIZE: usize = 15 * 1024;

/// Largest permitted total record size budget
pub const MAX_SIZE_LIMIT: usize = 65270;

/// Size budget for [`create_record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOptions {
    max_line_length: usize,
    max_size: usize,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            max_line_length: MAX_LINE_LENGTH,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl RecordOptions {
    /// Build a budget; out-of-range values fall back to the defaults.
    pub fn new(max_line_length: usize, max_size: usize) -> Self {
        Self::default()
            .with_max_line_length(max_line_length)
            .with_max_size(max_size)
    }

    /// Maximum length of one frame. Any value outside 1..=254 becomes 254.
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = if (1..=MAX_LINE_LENGTH).contains(&length) {
            length
        } else {
            MAX_LINE_LENGTH
        };
        self
    }

    /// Maximum total size of all frames. Any value outside 1..=65270
    /// becomes 15360.
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = if (1..=MAX_SIZE_LIMIT).contains(&size) {
            size
        } else {
            DEFAULT_MAX_SIZE
        };
        self
    }

    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// Prefix width reserved for the frame after `produced` frames: the
/// widest index in its decade (at least two digits) plus the colon.
fn prefix_reservation(produced: usize) -> usize {
    let mut digits = 1;
    let mut n = produced;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits.max(2) + 1
}

/// Encode `token` into TXT record frames.
///
/// An empty token yields no frames. Fails with [`Error::InvalidInput`]
/// when a frame cannot fit in the line budget or the frames together
/// exceed the size budget; no partial record is ever returned.
pub fn create_record(token: &str, options: &RecordOptions) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut total = 0usize;
    let mut rest = token;

    while !rest.is_empty() {
        let index = lines.len();
        let room = options.max_line_length.saturating_sub(prefix_reservation(index));

        let mut end = room.min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            return Err(Error::InvalidInput(format!(
                "max line length {} leaves no room for frame {}",
                options.max_line_length, index
            )));
        }

        let (chunk, tail) = rest.split_at(end);
        rest = tail;

        let line = format!("{:02}:{}", index, chunk);
        total += line.len();
        if total > options.max_size {
            return Err(Error::InvalidInput(format!(
                "record exceeds max size of {} bytes",
                options.max_size
            )));
        }
        lines.push(line);
    }

    log::debug!("created TXT record: {} frames, {} bytes", lines.len(), total);
    Ok(lines)
}
