//! Prompt assembly and citation handling.

use std::sync::LazyLock;

use docqa_rag::SearchResult;
use regex::Regex;

use crate::conversation::{Conversation, Role};
use crate::llm::ChatMessage;

/// Default system instruction restricting the model to the retrieved context.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Answer ONLY using the provided context. \
If the answer is not in the context, say you don't know. Be concise. \
Cite the context blocks you used with their bracketed numbers, e.g. [1].";

/// Fixed reply when retrieval produced no usable context.
pub const NO_CONTEXT_ANSWER: &str = "I don't know based on the provided documents.";

static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d+(?:\s*,\s*\d+)*)\]").unwrap_or_else(|e| panic!("invalid citation regex: {e}"))
});

/// Render retrieved chunks as numbered context blocks.
///
/// ```text
/// [1] (source: notes.txt)
/// The sky is blue.
/// ```
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!("[{}] (source: {})\n{}", i + 1, result.chunk.source_id(), result.chunk.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Messages for one generation call: the instruction, prior turns, then the
/// question with its context.
pub fn build_messages(
    instruction: &str,
    history: &Conversation,
    question: &str,
    results: &[SearchResult],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(instruction));
    messages.extend(history.turns().iter().map(|turn| match turn.role {
        Role::User => ChatMessage::user(&turn.content),
        Role::Assistant => ChatMessage::assistant(&turn.content),
    }));
    messages.push(ChatMessage::user(format!(
        "Question: {question}\n\nContext:\n{}",
        format_context(results)
    )));
    messages
}

/// Source identifiers the answer relies on, de-duplicated in first-seen order.
///
/// Markers like `[2]` or `[1, 3]` select context blocks; out-of-range numbers
/// are ignored. An answer without any valid marker cites every block.
pub fn cited_sources(answer: &str, results: &[SearchResult]) -> Vec<String> {
    let cited: Vec<&SearchResult> = CITATION
        .captures_iter(answer)
        .flat_map(|caps| {
            caps[1]
                .split(',')
                .filter_map(|n| n.trim().parse::<usize>().ok())
                .collect::<Vec<_>>()
        })
        .filter_map(|n| n.checked_sub(1).and_then(|i| results.get(i)))
        .collect();

    let used: Vec<&SearchResult> =
        if cited.is_empty() { results.iter().collect() } else { cited };

    let mut sources: Vec<String> = Vec::new();
    for result in used {
        let id = result.chunk.source_id();
        if !sources.contains(&id) {
            sources.push(id);
        }
    }
    sources
}

/// Append the `Sources:` footer. No footer is added for an empty list.
pub fn append_citation(answer: &str, sources: &[String]) -> String {
    if sources.is_empty() {
        return answer.to_string();
    }
    format!("{answer}\n\nSources: {}", sources.join("; "))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use docqa_rag::Chunk;
    use docqa_rag::document::{PAGE_KEY, SOURCE_KEY};

    use super::*;

    fn result(source: &str, page: Option<u32>, text: &str) -> SearchResult {
        let mut metadata = HashMap::from([(SOURCE_KEY.to_string(), source.to_string())]);
        if let Some(page) = page {
            metadata.insert(PAGE_KEY.to_string(), page.to_string());
        }
        SearchResult {
            chunk: Chunk {
                id: format!("{source}_0"),
                text: text.to_string(),
                start: 0,
                embedding: vec![],
                metadata,
                document_id: source.to_string(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn markers_select_cited_blocks() {
        let results = [
            result("a.txt", None, "alpha"),
            result("b.pdf", Some(2), "beta"),
            result("c.txt", None, "gamma"),
        ];
        assert_eq!(cited_sources("It is beta [2].", &results), ["b.pdf:p2"]);
        assert_eq!(cited_sources("See [3, 1] and [3].", &results), ["c.txt", "a.txt"]);
    }

    #[test]
    fn uncited_answer_cites_everything_once() {
        let results = [
            result("a.txt", None, "one"),
            result("a.txt", None, "two"),
            result("b.txt", None, "three"),
        ];
        assert_eq!(cited_sources("No markers here.", &results), ["a.txt", "b.txt"]);
        assert_eq!(cited_sources("Bogus [9] marker.", &results), ["a.txt", "b.txt"]);
    }

    #[test]
    fn footer_format() {
        let sources = vec!["a.txt".to_string(), "b.pdf:p1".to_string()];
        assert_eq!(append_citation("Blue.", &sources), "Blue.\n\nSources: a.txt; b.pdf:p1");
        assert_eq!(append_citation("Blue.", &[]), "Blue.");
    }

    #[test]
    fn prompt_puts_history_between_instruction_and_question() {
        let history = Conversation::new().with_exchange("hi", "hello");
        let messages =
            build_messages("be brief", &history, "What color?", &[result("a.txt", None, "Blue.")]);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::system("be brief"));
        assert_eq!(messages[1], ChatMessage::user("hi"));
        assert_eq!(messages[2], ChatMessage::assistant("hello"));
        assert_eq!(
            messages[3].content,
            "Question: What color?\n\nContext:\n[1] (source: a.txt)\nBlue."
        );
    }
}
