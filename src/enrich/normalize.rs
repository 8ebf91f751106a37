//! Line-Ending Normalizer
//!
//! Canonicalizes an accepted sequence to the protocol-conventional CRLF
//! form: every terminator becomes `\r\n`, trailing horizontal whitespace
//! is stripped per line, and the output ends with exactly one terminator.
//! Idempotent: normalizing twice yields the same bytes as normalizing once.

/// Normalize `text` to CRLF line endings.
pub fn normalize_crlf(text: &str) -> String {
    // Unify all terminator styles first so \r\n, \r and \n are equivalent
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<&str> = unified
        .split('\n')
        .map(|l| l.trim_end_matches([' ', '\t']))
        .collect();

    // Drop trailing empty lines; interior blanks are message separators
    // and stay
    while lines.last() == Some(&"") {
        lines.pop();
    }

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}
