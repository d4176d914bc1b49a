//! Grounded prompt assembly.
//!
//! The template here is the versioned contract between the orchestrator and
//! whichever backend is used. It must stay provider-agnostic: no
//! backend-specific tokens, no model names, plain text only.
//!
//! Prompt assembly is pure and deterministic - same field, context, and
//! cases always produce the same prompt byte-for-byte.

use crate::types::{ProjectContext, ReferenceCase};

/// Excerpts shorter than this are treated as noise and skipped.
pub const MIN_EXCERPT_CHARS: usize = 50;

/// At most this many cases are interpolated into a prompt.
pub const MAX_PROMPT_CASES: usize = 3;

/// Per-excerpt character budget inside the prompt.
pub const PROMPT_EXCERPT_CHARS: usize = 800;

/// Shown when no retrieved case survives selection.
pub const NO_EXAMPLES_PLACEHOLDER: &str = "No specific examples available.";

/// Truncate to at most `max_chars` characters, respecting char boundaries.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Select the cases a prompt (or the reference-only fallback) will quote:
/// the top [`MAX_PROMPT_CASES`] by relevance whose excerpt for `field` is
/// long enough to be useful.
pub fn select_cases<'a>(field: &str, cases: &'a [ReferenceCase]) -> Vec<&'a ReferenceCase> {
    let mut sorted: Vec<&ReferenceCase> = cases.iter().collect();
    // Descending by relevance; ties keep input order (stable sort).
    sorted.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

    sorted
        .into_iter()
        .take(MAX_PROMPT_CASES)
        .filter(|case| case.excerpt_for(field).chars().count() >= MIN_EXCERPT_CHARS)
        .collect()
}

/// Render the example block for the selected cases.
fn render_examples(field: &str, selected: &[&ReferenceCase]) -> String {
    if selected.is_empty() {
        return NO_EXAMPLES_PLACEHOLDER.to_string();
    }

    selected
        .iter()
        .enumerate()
        .map(|(i, case)| {
            format!(
                "Example {} (approved project - relevance {:.1}%):\n{}",
                i + 1,
                case.relevance * 100.0,
                truncate_chars(case.excerpt_for(field), PROMPT_EXCERPT_CHARS),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the generation prompt for one document field.
///
/// Pure and deterministic; performs no I/O. The instructions ask the
/// backend to adapt rather than copy, respect the character budget, and
/// emit only the field content.
pub fn build(
    field_name: &str,
    context: &ProjectContext,
    cases: &[ReferenceCase],
    max_length: usize,
) -> String {
    let selected = select_cases(field_name, cases);
    let examples = render_examples(field_name, &selected);

    format!(
        r#"You are a specialist in writing official healthcare project submissions.

TASK: Write the "{field}" section for the following project.

PROJECT CONTEXT:
- Title: {title}
- Institution: {institution}
- Type: {project_type}

MANDATORY GUIDELINES:
1. Use formal, technical language suitable for official government documents
2. Use terminology appropriate to healthcare and rehabilitation services
3. Base the text on the approved examples, but ADAPT it specifically to "{title}"
4. Stay fully consistent with the context provided
5. Be objective, clear, and specific
6. At most {max_length} characters
7. IMPORTANT: do not copy the examples literally - REWRITE them for this project

EXAMPLES FROM SIMILAR APPROVED PROJECTS:
{examples}

WRITE ONLY the content of the "{field}" section, with no introductions, headings, or additional commentary. The text must be ready for direct insertion into the official form."#,
        field = field_name,
        title = context.title,
        institution = context.institution,
        project_type = context.project_type,
        max_length = max_length,
        examples = examples,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn context() -> ProjectContext {
        ProjectContext {
            title: "Physiotherapy service expansion".to_string(),
            institution: "Regional Rehabilitation Center".to_string(),
            project_type: "service expansion".to_string(),
            description: String::new(),
        }
    }

    fn long_excerpt(tag: &str) -> String {
        format!("{tag}: {}", "relevant approved project text ".repeat(5))
    }

    #[test]
    fn test_prompt_contains_contract_markers() {
        let cases = vec![ReferenceCase::new("c1", 0.91, long_excerpt("a"))];
        let prompt = build("justification", &context(), &cases, 1000);

        assert!(prompt.contains("\"justification\""));
        assert!(prompt.contains("At most 1000 characters"));
        assert!(prompt.contains("do not copy the examples literally"));
        assert!(prompt.contains("WRITE ONLY the content"));
    }

    #[test]
    fn test_short_excerpts_are_rejected() {
        let cases = vec![
            ReferenceCase::new("short", 0.99, "too short to be useful"),
            ReferenceCase::new("long", 0.40, long_excerpt("keep")),
        ];
        let selected = select_cases("justification", &cases);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "long");
    }

    #[test]
    fn test_at_most_three_cases_selected() {
        let cases: Vec<ReferenceCase> = (0..6)
            .map(|i| ReferenceCase::new(format!("c{i}"), 0.9 - 0.1 * i as f32, long_excerpt("x")))
            .collect();

        let selected = select_cases("justification", &cases);
        assert_eq!(selected.len(), 3);
        // Highest relevance first
        assert_eq!(selected[0].id, "c0");
        assert_eq!(selected[2].id, "c2");
    }

    #[test]
    fn test_selection_sorts_unordered_input() {
        let cases = vec![
            ReferenceCase::new("low", 0.3, long_excerpt("a")),
            ReferenceCase::new("high", 0.9, long_excerpt("b")),
        ];
        let selected = select_cases("justification", &cases);
        assert_eq!(selected[0].id, "high");
    }

    #[test]
    fn test_empty_cases_use_placeholder() {
        let prompt = build("justification", &context(), &[], 800);
        assert!(prompt.contains(NO_EXAMPLES_PLACEHOLDER));
    }

    #[test]
    fn test_field_specific_excerpt_wins() {
        let case = ReferenceCase::new("c1", 0.8, "short")
            .with_field("justification", long_excerpt("field text"));
        let prompt = build("justification", &context(), &[case], 800);
        assert!(prompt.contains("field text"));
    }

    #[test]
    fn test_excerpt_truncated_to_budget() {
        let case = ReferenceCase::new("c1", 0.8, "x".repeat(2000));
        let prompt = build("justification", &context(), &[case], 800);
        assert!(!prompt.contains(&"x".repeat(PROMPT_EXCERPT_CHARS + 1)));
        assert!(prompt.contains(&"x".repeat(PROMPT_EXCERPT_CHARS)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // Multibyte input must not panic on byte slicing
        let text = "ampliação de fisioterapia é prioritária";
        let truncated = truncate_chars(text, 10);
        assert_eq!(truncated.chars().count(), 10);
    }

    proptest! {
        #[test]
        fn prop_prompt_is_deterministic(
            field in "[a-z]{1,16}",
            title in ".{0,40}",
            max_length in 1usize..5000,
        ) {
            let context = ProjectContext { title, ..Default::default() };
            let cases = vec![ReferenceCase::new("c1", 0.7, "text ".repeat(20))];

            let a = build(&field, &context, &cases, max_length);
            let b = build(&field, &context, &cases, max_length);
            prop_assert_eq!(a, b);
        }
    }
}
