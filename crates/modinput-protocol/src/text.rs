// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decoding of the bytes the host writes to stdin.

use crate::ProtocolError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// View raw stdin bytes as UTF-8 text.
///
/// A leading byte-order mark is dropped when present; otherwise the bytes are
/// borrowed untouched.
///
/// # Errors
///
/// Returns [`ProtocolError::Encoding`] if the bytes are not UTF-8.
pub fn normalize_input(bytes: &[u8]) -> Result<&str, ProtocolError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    Ok(std::str::from_utf8(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_utf8_is_borrowed() {
        let bytes = "<input>ü</input>".as_bytes();
        let text = normalize_input(bytes).unwrap();
        assert_eq!(text.as_ptr(), bytes.as_ptr());
    }

    #[test]
    fn bom_is_stripped() {
        let bytes = b"\xEF\xBB\xBF<input/>";
        assert_eq!(normalize_input(bytes).unwrap(), "<input/>");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(
            normalize_input(b"<input>\xFF</input>"),
            Err(ProtocolError::Encoding(_))
        ));
    }
}
