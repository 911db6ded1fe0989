//! Line splitting and classification.

use bytes::{Buf, Bytes, BytesMut};
use bytes_utils::Str;

use super::{
    constants::{BOM, CR, DATA_FIELD, DONE_SENTINEL, LF},
    errors::{EventStreamError, MalformedFrame},
};

/// Fully classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValidatedLine {
    /// Blank line (or whitespace only).
    Blank,
    /// Comment or any field other than `data`.
    Ignored,
    /// A `data:` line with its trimmed payload.
    Data(Str),
    /// The `[DONE]` sentinel.
    Done,
}

/// Removes the next `\n`-terminated line from `buffer`, without its terminator.
///
/// Returns `None` if the buffer contains no complete line.
pub(crate) fn take_line(buffer: &mut BytesMut) -> Option<Bytes> {
    let eol = memchr::memchr(LF, buffer)?;
    let line = buffer.split_to(eol).freeze();
    buffer.advance(1);
    Some(line)
}

fn is_space(b: &u8) -> bool {
    b.is_ascii_whitespace()
}

/// Range of `bytes` with leading and trailing ASCII whitespace removed.
fn trimmed(bytes: &[u8]) -> (usize, usize) {
    let start = bytes.iter().position(|b| !is_space(b)).unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !is_space(b))
        .map_or(start, |last| last + 1);
    (start, end)
}

fn validate_bytes(val: Bytes) -> Result<Str, core::str::Utf8Error> {
    match core::str::from_utf8(val.as_ref()) {
        Ok(_) => {
            // Safety: we just validated the bytes are valid UTF-8.
            Ok(unsafe { Str::from_inner_unchecked(val) })
        }
        Err(e) => Err(e),
    }
}

/// Classifies one line. `first` is set for the first line of a stream, where
/// a byte-order mark is rejected.
pub(crate) fn classify_line<E>(
    line: Bytes,
    first: bool,
) -> Result<ValidatedLine, EventStreamError<E>> {
    if first && line.starts_with(BOM) {
        return Err(MalformedFrame::ByteOrderMark.into());
    }

    let (start, end) = trimmed(&line);
    let content = line.slice(start..end);

    // A trailing CR of a CRLF pair is whitespace and already trimmed.
    if memchr::memchr(CR, &content).is_some() {
        return Err(MalformedFrame::CarriageReturn.into());
    }

    if content.is_empty() {
        return Ok(ValidatedLine::Blank);
    }

    if !content.starts_with(DATA_FIELD) {
        return Ok(ValidatedLine::Ignored);
    }

    let value = content.slice(DATA_FIELD.len()..);
    let (start, end) = trimmed(&value);
    let payload = validate_bytes(value.slice(start..end))?;

    if &*payload == DONE_SENTINEL {
        Ok(ValidatedLine::Done)
    } else {
        Ok(ValidatedLine::Data(payload))
    }
}
