//! Candidate text encodings for raw exports.
//!
//! The portal's backend emits exports in the encoding of whatever locale
//! produced them. Decoders are tried strictly in [`ENCODINGS_TO_TRY`] order;
//! a lenient encoding placed earlier would silently mis-decode text that a
//! later one reads correctly.

use std::borrow::Cow;

/// UTF-8 byte-order mark.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A text encoding a raw export may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// Strict UTF-8.
    Utf8,
    /// UTF-8 with a leading byte-order mark.
    Utf8Sig,
    /// Windows code page 950 (Traditional Chinese).
    Cp950,
    /// Big5 (Traditional Chinese).
    Big5,
}

/// Fallback order used by [`crate::convert::convert_to_canonical`].
pub const ENCODINGS_TO_TRY: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Utf8Sig,
    TextEncoding::Cp950,
    TextEncoding::Big5,
];

impl TextEncoding {
    /// Decodes `bytes` without replacement characters.
    ///
    /// Returns `None` if any byte sequence is malformed for this encoding.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self {
            Self::Utf8 => encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes),
            Self::Utf8Sig => encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(
                bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes),
            ),
            // encoding_rs implements the WHATWG Big5 table, which is a
            // superset of both cp950 and plain Big5.
            Self::Cp950 | Self::Big5 => {
                encoding_rs::BIG5.decode_without_bom_handling_and_without_replacement(bytes)
            }
        }
    }

    /// The conventional label for this encoding (e.g., `"utf-8-sig"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Sig => "utf-8-sig",
            Self::Cp950 => "cp950",
            Self::Big5 => "big5",
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_order_is_fixed() {
        let labels: Vec<String> = ENCODINGS_TO_TRY.iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["utf-8", "utf-8-sig", "cp950", "big5"]);
    }

    #[test]
    fn utf8_rejects_big5_bytes() {
        // "中文" in Big5
        let bytes = b"\xA4\xA4\xA4\xE5";
        assert!(TextEncoding::Utf8.decode(bytes).is_none());
        assert_eq!(TextEncoding::Big5.decode(bytes).unwrap(), "中文");
    }

    #[test]
    fn utf8_sig_strips_bom() {
        let bytes = b"\xEF\xBB\xBFa,b";
        assert_eq!(TextEncoding::Utf8Sig.decode(bytes).unwrap(), "a,b");
        assert_eq!(TextEncoding::Utf8.decode(bytes).unwrap(), "\u{feff}a,b");
    }
}
