//! Short descriptive labels for selected passages.
//!
//! Label generation is best-effort: a [`Summarizer`] may fail, and the failure
//! is carried in the returned [`Label`] rather than raised. The fallback label
//! is the passage text up to its first `.`, truncated to the character budget.

use anyhow::Result;
use std::fmt;

/// Default character budget for a label.
pub const DEFAULT_LABEL_CHARS: usize = 80;

/// Produces a short label for a passage text.
pub trait Summarizer {
    /// Provider identifier for logs (e.g. `"ollama"`).
    fn name(&self) -> &str;

    /// `false` for providers that never generate; every label then falls
    /// back without calling [`Summarizer::summarize`].
    fn is_enabled(&self) -> bool {
        true
    }

    /// Summarize `text` into a label of at most `max_chars` characters.
    fn summarize(&self, text: &str, max_chars: usize) -> Result<String>;
}

/// A label and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Generated(String),
    /// No generated label was used; `reason` says why.
    Fallback { text: String, reason: FallbackReason },
}

/// Why a label fell back to the passage's first sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Label generation is switched off.
    Disabled,
    /// The summarizer succeeded but returned only whitespace.
    Empty { provider: String },
    /// The summarizer returned an error.
    Failed(String),
}

impl FallbackReason {
    /// Whether the fallback reflects a provider problem rather than a choice.
    pub fn is_failure(&self) -> bool {
        !matches!(self, FallbackReason::Disabled)
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Disabled => write!(f, "label generation is disabled"),
            FallbackReason::Empty { provider } => write!(f, "{} returned an empty label", provider),
            FallbackReason::Failed(message) => write!(f, "{}", message),
        }
    }
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::Generated(text) => text,
            Label::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Label::Fallback { .. })
    }

    pub fn into_string(self) -> String {
        match self {
            Label::Generated(text) => text,
            Label::Fallback { text, .. } => text,
        }
    }
}

/// Ask `summarizer` for a label, falling back to [`fallback_label`].
pub fn label_passage(summarizer: &dyn Summarizer, text: &str, max_chars: usize) -> Label {
    if !summarizer.is_enabled() {
        return Label::Fallback {
            text: fallback_label(text, max_chars),
            reason: FallbackReason::Disabled,
        };
    }
    match summarizer.summarize(text, max_chars) {
        Ok(generated) => {
            let generated = generated.trim();
            if generated.is_empty() {
                Label::Fallback {
                    text: fallback_label(text, max_chars),
                    reason: FallbackReason::Empty {
                        provider: summarizer.name().to_string(),
                    },
                }
            } else {
                Label::Generated(truncate_chars(generated, max_chars).to_string())
            }
        }
        Err(e) => Label::Fallback {
            text: fallback_label(text, max_chars),
            reason: FallbackReason::Failed(format!("{:#}", e)),
        },
    }
}

/// First sentence of `text`, trimmed, at most `max_chars` characters.
pub fn fallback_label(text: &str, max_chars: usize) -> String {
    let first_sentence = text.trim().split('.').next().unwrap_or_default();
    truncate_chars(first_sentence, max_chars).to_string()
}

/// Truncate on a character boundary.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct Fixed(String);

    impl Summarizer for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn summarize(&self, _text: &str, _max_chars: usize) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl Summarizer for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn summarize(&self, _text: &str, _max_chars: usize) -> Result<String> {
            Err(anyhow!("connection refused"))
        }
    }

    #[test]
    fn generated_label_is_trimmed() {
        let label = label_passage(&Fixed("  Coastal Adventures \n".to_string()), "text", 80);
        assert_eq!(label, Label::Generated("Coastal Adventures".to_string()));
        assert!(!label.is_fallback());
    }

    #[test]
    fn failure_falls_back_to_first_sentence() {
        let label = label_passage(&Broken, "Nice is lovely. It has beaches.", 80);
        assert!(label.is_fallback());
        assert_eq!(label.as_str(), "Nice is lovely");
        match &label {
            Label::Fallback { reason, .. } => {
                assert!(reason.is_failure());
                assert!(reason.to_string().contains("connection refused"));
            }
            Label::Generated(_) => panic!("expected a fallback"),
        }
    }

    struct Off;

    impl Summarizer for Off {
        fn name(&self) -> &str {
            "off"
        }
        fn is_enabled(&self) -> bool {
            false
        }
        fn summarize(&self, _text: &str, _max_chars: usize) -> Result<String> {
            panic!("disabled summarizer must not be called")
        }
    }

    #[test]
    fn disabled_summarizer_is_not_a_failure() {
        let label = label_passage(&Off, "Nice is lovely. It has beaches.", 80);
        assert_eq!(
            label,
            Label::Fallback {
                text: "Nice is lovely".to_string(),
                reason: FallbackReason::Disabled,
            }
        );
    }

    #[test]
    fn empty_generation_counts_as_failure() {
        let label = label_passage(&Fixed("   ".to_string()), "Short text", 80);
        assert!(matches!(
            &label,
            Label::Fallback { reason: FallbackReason::Empty { provider }, .. } if provider == "fixed"
        ));
        assert_eq!(label.into_string(), "Short text");
    }

    #[test]
    fn fallback_respects_char_budget_on_multibyte_text() {
        let text = "é".repeat(100);
        let label = fallback_label(&text, 80);
        assert_eq!(label.chars().count(), 80);
    }

    #[test]
    fn generated_label_is_capped() {
        let long = "word ".repeat(40);
        let label = label_passage(&Fixed(long), "t", 10);
        assert_eq!(label.as_str().chars().count(), 10);
    }
}
