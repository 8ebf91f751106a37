//! Type Extractor
//!
//! Scans seed text and returns the set of message types already present.
//! Only the leading token of each line is inspected; lines without a
//! recognizable leading token contribute nothing. False positives would
//! corrupt the missing-type computation downstream, so the extractor
//! trades recall for precision.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Leading maximal run of uppercase letters (underscore admitted for
/// two-word forms like GET_PARAMETER) followed by whitespace.
static LEADING_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z_]+)\s").expect("valid leading token pattern"));

/// Extract the message types used in a seed.
///
/// When a non-empty canonical set is supplied, only members of that set are
/// kept. With an empty canonical set (no registry available) any leading
/// uppercase token is accepted.
pub fn used_types(seed_text: &str, canonical: &BTreeSet<String>) -> BTreeSet<String> {
    let mut found = BTreeSet::new();

    for line in seed_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = LEADING_TOKEN_RE.captures(line) {
            let token = caps[1].to_ascii_uppercase();
            if canonical.is_empty() || canonical.contains(&token) {
                found.insert(token);
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;

    #[test]
    fn test_extract_rtsp_seed() {
        let seed = "DESCRIBE rtsp://x RTSP/1.0\r\nCSeq: 1\r\n";
        let canonical = protocol::canonical_types("RTSP");
        let used = used_types(seed, &canonical);
        assert_eq!(used.len(), 1);
        assert!(used.contains("DESCRIBE"));
    }

    #[test]
    fn test_extract_ftp_seed() {
        let seed = "USER anonymous\r\nPASS guest\r\nLIST /\r\n";
        let canonical = protocol::canonical_types("FTP");
        let used = used_types(seed, &canonical);
        assert_eq!(
            used.into_iter().collect::<Vec<_>>(),
            vec!["LIST", "PASS", "USER"]
        );
    }

    #[test]
    fn test_non_canonical_token_filtered() {
        // "CSEQ" would match the lexical pattern but is not an RTSP command
        let seed = "CSEQ 1\r\nPLAY rtsp://x RTSP/1.0\r\n";
        let canonical = protocol::canonical_types("RTSP");
        let used = used_types(seed, &canonical);
        assert_eq!(used.len(), 1);
        assert!(used.contains("PLAY"));
    }

    #[test]
    fn test_empty_canonical_accepts_any_leading_token() {
        let seed = "FROB x\nNOISE\nlower case line\n123 not a command\n";
        let used = used_types(seed, &BTreeSet::new());
        // "NOISE" has no trailing whitespace after trimming, so only FROB
        assert_eq!(used.into_iter().collect::<Vec<_>>(), vec!["FROB"]);
    }

    #[test]
    fn test_blank_and_header_lines_contribute_nothing() {
        let seed = "\r\nCSeq: 1\r\nUser-Agent: test\r\n\r\n";
        let canonical = protocol::canonical_types("RTSP");
        assert!(used_types(seed, &canonical).is_empty());
    }

    #[test]
    fn test_underscore_command() {
        let seed = "GET_PARAMETER rtsp://x RTSP/1.0\r\n";
        let canonical = protocol::canonical_types("RTSP");
        assert!(used_types(seed, &canonical).contains("GET_PARAMETER"));
    }
}
