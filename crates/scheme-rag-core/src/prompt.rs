//! Prompt composition.
//!
//! Pure templating: fixed sections in a fixed order, the inputs inserted
//! verbatim. An empty context is replaced by [`NO_CONTEXT`] so the model is
//! told explicitly that nothing was retrieved.

use crate::models::Turn;

/// Number of most recent turns rendered into the prompt.
pub const HISTORY_WINDOW: usize = 5;

/// The phrase the model must use for information the context lacks.
pub const NOT_AVAILABLE: &str = "Not available in the provided context.";

pub const NO_CONTEXT: &str = "No relevant scheme context was found for this question.";

const INSTRUCTIONS: &str = "\
You are a helpful assistant that explains Indian Government Schemes to citizens clearly and in a structured way.

### Instructions:
- Use both the retrieved scheme context and the past conversation to answer the question.
- Paraphrase and simplify in your own words instead of copying text, but keep every important detail.
- Never change the meaning of the retrieved context. Stay faithful to its facts.
- Preserve every numerical value (amounts in ₹, percentages, years, dates, counts) exactly as it appears in the context. Do not round or convert.
- Organize the answer into sections with bullet points, steps or short paragraphs.
- Write scheme names in **bold**.";

/// Render the last `window` turns as `User: ...` / `Bot: ...` lines.
///
/// Each line ends with a newline; no turns yields `""`.
pub fn render_history(turns: &[Turn], window: usize) -> String {
    let start = turns.len().saturating_sub(window);
    turns[start..]
        .iter()
        .map(|turn| format!("{}: {}\n", turn.role.label(), turn.text))
        .collect()
}

/// Merge retrieved context, rendered history and the question into one prompt.
pub fn compose_prompt(context: &str, query: &str, conversation: &str) -> String {
    let context = if context.trim().is_empty() {
        NO_CONTEXT
    } else {
        context
    };

    format!(
        "{INSTRUCTIONS}\n\
         - If information is missing, say: \"{NOT_AVAILABLE}\"\n\
         - Do not invent values, schemes or details that are not present in the context.\n\
         \n\
         ---\n\
         \n\
         ### Past Conversation:\n\
         {conversation}\n\
         \n\
         ### Retrieved Scheme Context:\n\
         {context}\n\
         \n\
         ### Current Question:\n\
         {query}\n\
         \n\
         ### Answer:\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_positions(prompt: &str) -> Vec<usize> {
        [
            "### Instructions:",
            "### Past Conversation:",
            "### Retrieved Scheme Context:",
            "### Current Question:",
            "### Answer:",
        ]
        .iter()
        .map(|heading| prompt.find(heading).unwrap())
        .collect()
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let prompt = compose_prompt("[a--0000] ctx", "Who is eligible?", "User: hi\n");
        let positions = section_positions(&prompt);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.ends_with("### Answer:\n"));
    }

    #[test]
    fn test_inputs_inserted_verbatim() {
        let prompt = compose_prompt(
            "[pm-kisan--0000] Income support of ₹6,000/year.",
            "How much does PM Kisan pay?",
            "User: hello\nBot: Hi!\n",
        );
        assert!(prompt.contains(
            "### Retrieved Scheme Context:\n[pm-kisan--0000] Income support of ₹6,000/year.\n"
        ));
        assert!(prompt.contains("### Current Question:\nHow much does PM Kisan pay?\n"));
        assert!(prompt.contains("### Past Conversation:\nUser: hello\nBot: Hi!\n"));
        assert!(prompt.contains(NOT_AVAILABLE));
        assert!(!prompt.contains(NO_CONTEXT));
    }

    #[test]
    fn test_empty_context_is_stated_explicitly() {
        let prompt = compose_prompt("", "anything", "");
        assert!(prompt.contains(&format!("### Retrieved Scheme Context:\n{}\n", NO_CONTEXT)));
        assert!(prompt.contains("### Past Conversation:\n\n"));
    }

    #[test]
    fn test_render_history_window() {
        let turns: Vec<Turn> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("q{}", i))
                } else {
                    Turn::bot(format!("a{}", i))
                }
            })
            .collect();
        assert_eq!(
            render_history(&turns, HISTORY_WINDOW),
            "Bot: a3\nUser: q4\nBot: a5\nUser: q6\nBot: a7\n"
        );
        assert_eq!(render_history(&turns[..2], HISTORY_WINDOW), "User: q0\nBot: a1\n");
        assert_eq!(render_history(&[], HISTORY_WINDOW), "");
    }
}
