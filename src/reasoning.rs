//! Reasoning extractor
//!
//! The reasoner model echoes its own prompt ahead of the generated
//! narrative, so raw completions open with the analyst role statement, the
//! transaction dict and the rule list before any actual reasoning appears.
//! Two independent passes recover the narrative:
//! 1. remove one occurrence of the full prompt template as a block
//! 2. sweep any remaining marker lines off the top, line by line
//!
//! Already-clean narratives pass through both steps unchanged, and the
//! output is a fixed point: extracting twice yields the same text.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::RawReasoning;

/// Shown when stripping leaves nothing behind.
pub const EMPTY_NARRATIVE_PLACEHOLDER: &str = "No reasoning available.";

/// Line prefixes that mark echoed prompt text, compared case-insensitively
/// against the trimmed start of each line. The last three are the opening
/// tokens of the echoed transaction dict and rule list literals.
const PROMPT_LINE_MARKERS: &[&str] = &[
    "you are an aml compliance analyst",
    "explain the reasoning clearly",
    "transaction data:",
    "triggered rules:",
    "explain why this transaction might be suspicious",
    "{'amount':",
    "'amount':",
    "['high_",
];

/// Blank lines within this many leading lines are prompt residue and get
/// swept; blank lines further down belong to the narrative.
const LEADING_BLANK_WINDOW: usize = 5;

lazy_static! {
    /// The full prompt template: role statement, instruction line,
    /// "Transaction data:" with a brace-delimited dict, "Triggered rules:"
    /// with a bracket-delimited list, closing instruction. Non-greedy
    /// bodies (`[^}]*`, `[^\]]*`) stop at the first closing delimiter so
    /// narrative text is never consumed.
    static ref PROMPT_BLOCK: Regex = Regex::new(
        r"(?i)you are an aml compliance analyst\.\s*explain the reasoning clearly\.\s*transaction data:\s*\{[^}]*\}\s*triggered rules:\s*\[[^\]]*\]\s*explain why this transaction might be suspicious\.\s*"
    )
    .expect("prompt block pattern is valid");
}

/// Extract the display narrative from a transaction's raw reasoning value.
pub fn extract_narrative(raw: &RawReasoning) -> String {
    clean_completion(&raw.narrative_source())
}

/// Strip the echoed prompt from a raw completion string.
pub fn clean_completion(completion: &str) -> String {
    let without_block = strip_prompt_block(completion);
    let without_markers = sweep_marker_lines(&without_block);

    let narrative = without_markers.trim();
    if narrative.is_empty() {
        EMPTY_NARRATIVE_PLACEHOLDER.to_string()
    } else {
        narrative.to_string()
    }
}

/// Pass 1: remove at most one occurrence of the full prompt template.
fn strip_prompt_block(text: &str) -> String {
    PROMPT_BLOCK.replacen(text, 1, "").into_owned()
}

/// Pass 2: advance past leading marker lines (and early blank lines),
/// stopping at the first line that matches none of them.
fn sweep_marker_lines(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();

    let mut start = 0;
    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        let lowered = trimmed.to_lowercase();

        let is_marker = PROMPT_LINE_MARKERS
            .iter()
            .any(|marker| lowered.starts_with(marker));
        let is_leading_blank = trimmed.is_empty() && index < LEADING_BLANK_WINDOW;

        if is_marker || is_leading_blank {
            start = index + 1;
        } else {
            break;
        }
    }

    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawReasoning;

    /// The template exactly as the reasoner echoes it.
    fn echoed_prompt(txn_dict: &str, rule_list: &str) -> String {
        format!(
            "You are an AML compliance analyst.\nExplain the reasoning clearly.\n Transaction data:\n{}\n\nTriggered rules:\n{}\n\nExplain why this transaction might be suspicious.\n",
            txn_dict, rule_list
        )
    }

    const NARRATIVE: &str = "This transaction is suspicious because the amount \
far exceeds the customer's mean and the counterparty repeats.";

    #[test]
    fn test_block_removal_leaves_only_narrative() {
        let input = format!(
            "{}{}",
            echoed_prompt(
                "{'amount': 9800.0, 'txn_hour': 3, 'merchant_mcc': '7995'}",
                "['HIGH_AMOUNT', 'R2_STRUCTURING_SMURFING']"
            ),
            NARRATIVE
        );

        assert_eq!(clean_completion(&input), NARRATIVE);
    }

    #[test]
    fn test_line_sweep_catches_partial_echo() {
        // No full template, just stray prompt lines ahead of the narrative
        let input = format!(
            "Transaction data:\n{{'amount': 120.0}}\nTriggered rules:\n['HIGH_AMOUNT']\n{}",
            NARRATIVE
        );

        assert_eq!(clean_completion(&input), NARRATIVE);
    }

    #[test]
    fn test_clean_input_passes_through_trimmed() {
        assert_eq!(clean_completion(NARRATIVE), NARRATIVE);
        assert_eq!(clean_completion(&format!("  {}  \n", NARRATIVE)), NARRATIVE);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            format!(
                "{}{}",
                echoed_prompt("{'amount': 1.0}", "['HIGH_AMOUNT']"),
                NARRATIVE
            ),
            NARRATIVE.to_string(),
            String::new(),
            "Triggered rules:\nexplanation follows".to_string(),
        ];

        for input in &inputs {
            let once = clean_completion(input);
            let twice = clean_completion(&once);
            assert_eq!(once, twice, "extractor not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_template_only_yields_placeholder() {
        let input = echoed_prompt("{'amount': 42.0}", "['HIGH_AMOUNT']");
        assert_eq!(clean_completion(&input), EMPTY_NARRATIVE_PLACEHOLDER);

        assert_eq!(clean_completion(""), EMPTY_NARRATIVE_PLACEHOLDER);
        assert_eq!(clean_completion("   \n \n  "), EMPTY_NARRATIVE_PLACEHOLDER);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let input = format!(
            "YOU ARE AN AML COMPLIANCE ANALYST.\nEXPLAIN THE REASONING CLEARLY.\nTRANSACTION DATA:\n{{'amount': 5.0}}\n\nTRIGGERED RULES:\n['HIGH_AMOUNT']\n\nEXPLAIN WHY THIS TRANSACTION MIGHT BE SUSPICIOUS.\n{}",
            NARRATIVE
        );

        assert_eq!(clean_completion(&input), NARRATIVE);
    }

    #[test]
    fn test_block_body_is_non_greedy() {
        // A narrative containing braces must survive: the dict body must
        // stop at the first closing brace, not swallow up to the last one.
        let narrative = "Flagged {structuring} pattern across accounts.";
        let input = format!(
            "{}{}",
            echoed_prompt("{'amount': 300.0}", "['HIGH_AMOUNT']"),
            narrative
        );

        assert_eq!(clean_completion(&input), narrative);
    }

    #[test]
    fn test_blank_lines_only_swept_near_the_top() {
        // A blank line past the leading window separates narrative
        // paragraphs and must survive the sweep.
        let input = format!("line one\nline two\nline three\nline four\nline five\nline six\n\n{}", NARRATIVE);
        let output = clean_completion(&input);
        assert!(output.contains("\n\n"));
    }

    #[test]
    fn test_extract_narrative_unwraps_structured_reasoning() {
        let raw: RawReasoning = serde_json::from_str(&format!(
            r#"{{"raw_output": "Transaction data:\n{{'amount': 12.0}}\n{}"}}"#,
            NARRATIVE
        ))
        .unwrap();

        assert_eq!(extract_narrative(&raw), NARRATIVE);
    }
}
