//! Wire constants for the frame reader.

/// Newline byte, the only supported line terminator.
pub(crate) const LF: u8 = b'\n';
/// Carriage return byte, rejected inside a line.
pub(crate) const CR: u8 = b'\r';

/// Field prefix of payload lines.
pub(crate) const DATA_FIELD: &[u8] = b"data:";

/// Payload that ends the logical stream.
pub(crate) const DONE_SENTINEL: &str = "[DONE]";

/// UTF-8 encoding of U+FEFF BYTE ORDER MARK.
pub(crate) const BOM: &[u8; 3] = b"\xEF\xBB\xBF";
