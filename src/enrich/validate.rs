//! Validator
//!
//! Final acceptance gate over a reconciled candidate. Acceptance is
//! binary: a rejected candidate marks the whole variant failed and is
//! never repaired. Each rejection carries the name of the rule that
//! fired, so diagnostics can distinguish contamination kinds.

use once_cell::sync::Lazy;
use regex::Regex;

use super::PLACEHOLDER_TOKENS;

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Empty or whitespace-only candidate
    Empty,
    /// A placeholder keyword survived reconciliation
    Placeholder,
    /// An explanatory marker survived reconciliation
    ExplanatoryMarker(&'static str),
    /// FTP only: a line begins with a literal COMMAND/RESPONSE keyword
    FtpPlaceholderLine,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty candidate"),
            Rejection::Placeholder => write!(f, "placeholder token present"),
            Rejection::ExplanatoryMarker(name) => write!(f, "explanatory marker: {}", name),
            Rejection::FtpPlaceholderLine => write!(f, "FTP placeholder line"),
        }
    }
}

/// Placeholder keyword anywhere as a whole word. Uppercase-only on
/// purpose: legitimate protocol arguments are lowercase or mixed case.
static PLACEHOLDER_ANYWHERE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b({})\b", PLACEHOLDER_TOKENS.join("|")))
        .expect("valid placeholder pattern")
});

/// Named explanatory-marker patterns. Any match anywhere rejects.
static EXPLANATORY_MARKERS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("code-fence", r"```"),
        ("here-is-opener", r"(?im)^here (is|are)\b"),
        ("affirmation-opener", r"(?im)^(sure|certainly|okay|of course)\b"),
        ("note-marker", r"(?i)\bnote that\b|(?im)^note:"),
        ("narration", r"(?i)\bi('ve| have) (added|inserted|modified)\b"),
        ("sequence-narration", r"(?i)\b(the|this) (modified|following|updated) sequence\b"),
        ("explanation-heading", r"(?im)^explanation\b"),
    ]
    .iter()
    .map(|(name, p)| (*name, Regex::new(p).expect("valid marker pattern")))
    .collect()
});

static FTP_PLACEHOLDER_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(COMMAND|RESPONSE)\b").expect("valid FTP placeholder pattern"));

/// Validate a reconciled candidate. `Ok(())` means accepted.
pub fn validate(candidate: &str, protocol_name: &str) -> Result<(), Rejection> {
    if candidate.trim().is_empty() {
        return Err(Rejection::Empty);
    }

    if PLACEHOLDER_ANYWHERE_RE.is_match(candidate) {
        return Err(Rejection::Placeholder);
    }

    for (name, re) in EXPLANATORY_MARKERS.iter() {
        if re.is_match(candidate) {
            return Err(Rejection::ExplanatoryMarker(name));
        }
    }

    if protocol_name.eq_ignore_ascii_case("FTP") && FTP_PLACEHOLDER_LINE_RE.is_match(candidate) {
        return Err(Rejection::FtpPlaceholderLine);
    }

    Ok(())
}
