//! Email address handling.

use percent_encoding::percent_decode_str;

/// Brings an email address to its canonical form.
///
/// Percent-escapes are decoded, surrounding whitespace is trimmed and the
/// result is lowercased, so that all the different ways of writing the same
/// address map to a single key. Byte sequences that don't decode to valid
/// UTF-8 are replaced with `U+FFFD`.
///
/// No further validation is performed, an empty result means no address was
/// provided.
pub fn normalize(raw: &str) -> String {
    percent_decode_str(raw)
        .decode_utf8_lossy()
        .trim()
        .to_lowercase()
}
