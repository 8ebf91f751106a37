//! Response Reconciler
//!
//! Deterministic text-cleaning pass over the raw model reply. The rules
//! are an explicit ordered list, each one named and unit-testable, rather
//! than inline ad hoc matching:
//!
//! 1. a leading fenced code block's interior replaces the whole text
//! 2. meta lines (numbered lists, bullets, bold, headings) are dropped
//! 3. explanatory-vocabulary lines are dropped unless command-leading
//! 4. placeholder-led lines are dropped
//! 5. sequence mode is sticky once a command-leading line is seen
//! 6. FTP only: echoed server status lines are dropped
//! 7. enumeration remnants are stripped from retained lines
//! 8. trailing commentary after a double blank line is cut, long blank
//!    runs collapse to a single blank line
//! 9. fallback: the cleaned whole text with explanatory openers removed;
//!    irrecoverable placeholder contamination yields the empty string

use once_cell::sync::Lazy;
use regex::Regex;

use super::PLACEHOLDER_TOKENS;
use crate::protocol::{self, GENERIC_COMMAND_RE};

static FENCED_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:\w+)?\n(.*?)```").expect("valid fence pattern"));

/// Meta prefixes: numbered list, bullets, bold, heading.
static META_PREFIX_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"^\d+\.?\s+", r"^\*\s+", r"^-\s+", r"^\*\*", r"^#+\s+"]
        .iter()
        .map(|p| Regex::new(p).expect("valid meta prefix pattern"))
        .collect()
});

/// Vocabulary that marks explanatory prose around the sequence.
const EXPLANATION_KEYWORDS: &[&str] = &[
    "here",
    "the",
    "so",
    "in",
    "this",
    "note",
    "important",
    "following",
    "above",
    "below",
    "sequence",
    "command",
    "response",
    "status",
    "code",
    "server",
];

/// Bare placeholder keyword leading a line.
static PLACEHOLDER_LEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^({})\b", PLACEHOLDER_TOKENS.join("|")))
        .expect("valid placeholder pattern")
});

/// Placeholder keyword anywhere as a whole word.
static PLACEHOLDER_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b({})\b", PLACEHOLDER_TOKENS.join("|")))
        .expect("valid placeholder word pattern")
});

/// Bare 3-digit server status line (FTP reply echo).
static FTP_STATUS_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3}\s").expect("valid status pattern"));

/// 3-digit code mixed with descriptive text.
static FTP_STATUS_MIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{3}\s+[A-Z]").expect("valid status mix pattern"));

/// Leading enumeration or bullet remnants on an otherwise valid line.
static REMNANT_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.?\s*").expect("valid remnant pattern"));
static REMNANT_BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*]\s*").expect("valid bullet remnant pattern"));

/// Trailing block separated by two or more blank lines. A single blank
/// line is a message separator and must survive, so the cut anchors on
/// three consecutive newlines.
static TRAILING_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\n{3,}.*$").expect("valid trailing block pattern"));

/// Three or more consecutive newlines.
static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank run pattern"));

/// Explanatory openers stripped in the fallback path.
static OPENER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^(Here|The|So|In|This|Note|Important|Following|Above|Below)\b.*\n+")
        .expect("valid opener pattern")
});

/// Whether a line begins with a recognized command: the protocol's own
/// pattern when the protocol is known, the generic uppercase-token
/// pattern otherwise.
fn is_command_line(line: &str, protocol_name: &str) -> bool {
    match protocol::lookup(protocol_name) {
        Some(spec) => spec.is_command_line(line),
        None => GENERIC_COMMAND_RE.is_match(line),
    }
}

fn is_meta_line(line: &str) -> bool {
    META_PREFIX_RES.iter().any(|re| re.is_match(line))
}

fn has_explanation_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    EXPLANATION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// FTP replies echoed by the model: a bare status line, or a status code
/// mixed into descriptive text that is not itself a command line.
fn is_ftp_server_echo(line: &str) -> bool {
    FTP_STATUS_LINE_RE.is_match(line)
        || (FTP_STATUS_MIX_RE.is_match(line) && !GENERIC_COMMAND_RE.is_match(line))
}

fn strip_remnants(line: &str) -> String {
    let line = REMNANT_NUMBER_RE.replace(line, "");
    REMNANT_BULLET_RE.replace(&line, "").to_string()
}

/// Clean a raw model reply down to a candidate sequence.
///
/// Returns the empty string on irrecoverable contamination; the caller
/// treats that as a failed variant.
pub fn reconcile(raw: &str, protocol_name: &str) -> String {
    let text = raw.trim_start_matches(['\n', ' ', '\t', '\r']);

    // Rule 1: first fenced block interior replaces the whole text
    let text = match FENCED_BLOCK_RE.captures(text) {
        Some(caps) => caps[1].trim().to_string(),
        None => text.to_string(),
    };

    let ftp = protocol_name.eq_ignore_ascii_case("FTP");
    let mut sequence_lines: Vec<String> = Vec::new();
    let mut in_sequence = false;

    for line in text.lines() {
        let line = line.trim();

        if line.is_empty() {
            // Blank lines are message separators, but only once the
            // sequence has started (rule 5)
            if in_sequence {
                sequence_lines.push(String::new());
            }
            continue;
        }

        // Rule 2
        if is_meta_line(line) {
            continue;
        }

        // Rule 3
        if has_explanation_keyword(line)
            && !is_command_line(line, protocol_name)
            && !GENERIC_COMMAND_RE.is_match(line)
        {
            continue;
        }

        // Rule 4
        if PLACEHOLDER_LEAD_RE.is_match(line) {
            continue;
        }

        // Rule 5: sticky sequence mode
        if is_command_line(line, protocol_name) || in_sequence {
            in_sequence = true;

            // Rule 6
            if ftp && is_ftp_server_echo(line) {
                continue;
            }

            // Rule 7
            sequence_lines.push(strip_remnants(line));
        }
    }

    if !sequence_lines.is_empty() {
        // Rule 8
        let joined = sequence_lines.join("\n");
        let joined = joined.trim();
        let cut = TRAILING_BLOCK_RE.replace(joined, "");
        return BLANK_RUN_RE.replace_all(&cut, "\n\n").trim().to_string();
    }

    // Rule 9: no sequence line was ever retained
    fallback(&text)
}

/// Best-effort salvage of a reply in which no command-leading line was
/// recognized. Explanatory openers are stripped from the front; lines led
/// by placeholder keywords are removed, except when that would erase the
/// reply entirely, in which case the text is left for the validator to
/// reject with a precise diagnostic. Placeholders surviving mid-line mean
/// the reply is irrecoverable.
fn fallback(text: &str) -> String {
    let cleaned = OPENER_RE.replace_all(text.trim(), "").trim().to_string();

    if !PLACEHOLDER_WORD_RE.is_match(&cleaned) {
        return cleaned;
    }

    let kept: Vec<&str> = cleaned
        .lines()
        .filter(|l| !PLACEHOLDER_LEAD_RE.is_match(l.trim()))
        .collect();
    let salvaged = kept.join("\n").trim().to_string();

    if salvaged.is_empty() {
        // Nothing but placeholder lines; hand the text to the validator
        return cleaned;
    }
    if PLACEHOLDER_WORD_RE.is_match(&salvaged) {
        return String::new();
    }
    salvaged
}
