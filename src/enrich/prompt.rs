//! Prompt Synthesizer
//!
//! Builds a bounded-length enrichment request from the protocol exemplar,
//! the verbatim original sequence, and the target missing-type subset.
//!
//! Token budgeting uses the `ceil(chars / 4)` approximation, not an exact
//! tokenizer count. Callers get a conservative ceiling: the fixed template
//! and exemplar are estimated first, a safety margin is reserved, and the
//! embedded sequence is truncated from the tail to fit whatever remains.

use super::PLACEHOLDER_TOKENS;

/// Default overall model token ceiling.
pub const DEFAULT_MAX_TOKENS: usize = 2048;

/// Tokens held back to absorb estimation error.
pub const DEFAULT_SAFETY_MARGIN: usize = 50;

const APPROX_CHARS_PER_TOKEN: usize = 4;

/// Optional caller-supplied hook that produces extra context for the
/// target subset (e.g. mined implementation knowledge). Replaces the ad
/// hoc subclassing the earlier tooling used for knowledge injection.
pub type ContextEnricher<'a> = &'a dyn Fn(&[String]) -> String;

/// Builds enrichment prompts under a fixed token budget.
pub struct PromptSynthesizer {
    max_tokens: usize,
    safety_margin: usize,
}

impl Default for PromptSynthesizer {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }
}

impl PromptSynthesizer {
    pub fn new(max_tokens: usize, safety_margin: usize) -> Self {
        Self {
            max_tokens,
            safety_margin,
        }
    }

    /// Build the enrichment request.
    ///
    /// `exemplar` is the protocol's short correct request sample,
    /// `sequence` the verbatim seed content, and `targets` the missing
    /// types this variant asks for. `enricher`, when present, appends
    /// caller-provided context after the instruction block.
    pub fn synthesize(
        &self,
        protocol_name: &str,
        exemplar: &str,
        sequence: &str,
        targets: &[String],
        enricher: Option<ContextEnricher>,
    ) -> String {
        let targets_joined = targets.join(", ");
        let extra = enricher.map(|f| f(targets)).unwrap_or_default();

        // JSON-escape the sequence (interior of a JSON string) so control
        // bytes like \r\n survive as visible escapes in the prompt.
        let escaped = json_escape(sequence);
        let budget = self.sequence_budget(protocol_name, exemplar, &targets_joined, &extra);
        let embedded = truncate_chars(&escaped, budget);

        self.render(protocol_name, exemplar, &embedded, &targets_joined, &extra)
    }

    /// Maximum characters the embedded sequence may occupy.
    fn sequence_budget(
        &self,
        protocol_name: &str,
        exemplar: &str,
        targets_joined: &str,
        extra: &str,
    ) -> usize {
        let fixed = self.render(protocol_name, exemplar, "", targets_joined, extra);
        let fixed_tokens = estimate_tokens(&fixed);
        self.max_tokens
            .saturating_sub(fixed_tokens)
            .saturating_sub(self.safety_margin)
            * APPROX_CHARS_PER_TOKEN
    }

    fn render(
        &self,
        protocol_name: &str,
        exemplar: &str,
        sequence: &str,
        targets_joined: &str,
        extra: &str,
    ) -> String {
        let mut prompt = format!(
            "The following is a short correct sample of {protocol_name} client requests:\n\
             {exemplar}\n\
             \n\
             The following is one sequence of client requests:\n\
             {sequence}\n\
             \n\
             Please add the {targets_joined} client requests in the proper locations.\n\
             IMPORTANT: Return ONLY the modified sequence of client requests, without any explanations, comments, or additional text.\n\
             Do not include status codes, server responses, or any descriptive text.\n\
             Do not use placeholder tokens such as {placeholders}.\n\
             Return only the raw client request sequence:\n",
            placeholders = PLACEHOLDER_TOKENS.join(", "),
        );
        if !extra.is_empty() {
            prompt.push('\n');
            prompt.push_str(extra);
            prompt.push('\n');
        }
        prompt
    }
}

/// `ceil(chars / 4)` token estimate.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(APPROX_CHARS_PER_TOKEN)
}

/// Interior of the JSON string encoding of `text` (outer quotes removed).
fn json_escape(text: &str) -> String {
    let quoted = serde_json::to_string(text).unwrap_or_default();
    quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(&quoted)
        .to_string()
}

/// Truncate from the tail to at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prompt_names_targets_and_embeds_sequence() {
        let synth = PromptSynthesizer::default();
        let prompt = synth.synthesize(
            "FTP",
            "USER anonymous\r\nQUIT\r\n",
            "USER test\r\nPASS test\r\n",
            &targets(&["MKD", "RMD"]),
            None,
        );
        assert!(prompt.contains("MKD, RMD"));
        assert!(prompt.contains("USER test\\r\\nPASS test\\r\\n"));
        assert!(prompt.contains("without any explanations"));
        assert!(prompt.contains("COMMAND, RESPONSE, PARAMETER, VALUE"));
    }

    #[test]
    fn test_long_sequence_is_truncated_to_budget() {
        let synth = PromptSynthesizer::new(200, 50);
        let long_seq = "USER aaaa\r\n".repeat(500);
        let prompt = synth.synthesize("FTP", "USER a\r\n", &long_seq, &targets(&["MKD"]), None);
        // Whole prompt stays within the ceiling (4 chars per token)
        assert!(estimate_tokens(&prompt) <= 200);
    }

    #[test]
    fn test_budget_exhausted_embeds_nothing() {
        let synth = PromptSynthesizer::new(10, 50);
        let prompt = synth.synthesize("FTP", "USER a\r\n", "USER x\r\n", &targets(&["MKD"]), None);
        assert!(!prompt.contains("USER x"));
    }

    #[test]
    fn test_context_enricher_is_appended() {
        let synth = PromptSynthesizer::default();
        let hook = |missing: &[String]| format!("Known server quirks for {}.", missing.join("/"));
        let prompt = synth.synthesize(
            "FTP",
            "USER a\r\n",
            "USER x\r\n",
            &targets(&["SITE", "MDTM"]),
            Some(&hook),
        );
        assert!(prompt.contains("Known server quirks for SITE/MDTM."));
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_json_escape_keeps_crlf_visible() {
        assert_eq!(json_escape("a\r\nb"), "a\\r\\nb");
        assert_eq!(json_escape(r#"say "hi""#), r#"say \"hi\""#);
    }
}
