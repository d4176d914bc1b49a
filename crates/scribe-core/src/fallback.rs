//! Reference-only fallback rendering.
//!
//! When no generation backend succeeds, the orchestrator returns a
//! deterministic answer built purely from retrieved excerpts. This path has
//! no external dependency and never fails.

use crate::prompt::{select_cases, truncate_chars};
use crate::types::ReferenceCase;

/// Per-excerpt character budget in the fallback text.
pub const FALLBACK_EXCERPT_CHARS: usize = 500;

/// Fixed confidence of the reference-only path.
pub const FALLBACK_CONFIDENCE: f64 = 0.75;

/// Advisory note appended to every reference-only answer.
pub const ADVISORY_NOTE: &str = "NOTE: these are excerpts from approved reference projects. \
Adapt them to the specific context of your own project before submitting.";

/// Shown when no retrieved excerpt survives selection.
pub const NO_MATERIAL_PLACEHOLDER: &str =
    "No relevant reference material was found in the knowledge base.";

/// A rendered reference-only answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAnswer {
    /// The concatenated excerpt text, ending with [`ADVISORY_NOTE`]
    pub text: String,

    /// Ids of the cases whose excerpts were included
    pub references: Vec<String>,
}

/// Render the reference-only answer for one document field.
///
/// Uses the same case selection as the prompt builder (top 3 by relevance,
/// short excerpts rejected), truncates each excerpt to
/// [`FALLBACK_EXCERPT_CHARS`], annotates it with its relevance score, and
/// appends the fixed advisory note. Byte-identical across repeated calls.
pub fn render(field_name: &str, cases: &[ReferenceCase]) -> ReferenceAnswer {
    let selected = select_cases(field_name, cases);

    let body = if selected.is_empty() {
        NO_MATERIAL_PLACEHOLDER.to_string()
    } else {
        selected
            .iter()
            .enumerate()
            .map(|(i, case)| {
                let excerpt = case.excerpt_for(field_name);
                let truncated = truncate_chars(excerpt, FALLBACK_EXCERPT_CHARS);
                let ellipsis = if truncated.len() < excerpt.len() { "..." } else { "" };
                format!(
                    "Example {} (relevance {:.1}%):\n{}{}",
                    i + 1,
                    case.relevance * 100.0,
                    truncated,
                    ellipsis,
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    ReferenceAnswer {
        text: format!("EXCERPTS FROM APPROVED REFERENCE PROJECTS:\n\n{body}\n\n{ADVISORY_NOTE}"),
        references: selected.iter().map(|case| case.id.clone()).collect(),
    }
}
