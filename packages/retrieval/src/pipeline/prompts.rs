//! Prompt builders for the generation oracle.

/// Prompt for answering a user query from retrieved context.
///
/// The persona rules matter: the model must answer in the same
/// language as the question and must never mention documents, chunks,
/// sources, or context; retrieved information is presented as if
/// naturally recalled.
pub fn answer_prompt(context: &str, query: &str) -> String {
    format!(
        r#"You are an assistant that answers questions from a user's personal information.

CORE PRINCIPLES:
- Answer accurately and directly based on the provided information
- Match the user's tone and language style
- Be informative and helpful without being robotic
- Do NOT use emojis or excessive exclamation marks
- Do NOT start with phrases like "Based on the context provided"
- Do NOT mention "documents", "chunks", "sources", or "context"
- Present information as if naturally recalling it

LANGUAGE REQUIREMENT:
- Always respond in the SAME LANGUAGE as the user's question

CONTENT GUIDELINES:
- If the question is not covered by the information, clearly say that
  this information isn't available
- Keep responses concise but thorough

INFORMATION:
{context}

QUESTION:
{query}

Now provide a helpful, natural response:"#
    )
}

/// Prompt for extracting upcoming events from document text.
///
/// The reply contract is strict: a bare JSON array with the schema
/// below, no markdown, no commentary. The parser in
/// [`crate::events`] still tolerates fencing because models
/// routinely ignore the "no markdown" rule.
pub fn event_detection_prompt(text: &str) -> String {
    format!(
        r#"You are an event extraction engine.

Rules:
- Extract ONLY future or upcoming events (deadlines, exams, meetings, classes)
- Ignore past events, hypotheticals, and examples
- Return ONLY valid JSON
- No markdown
- No explanations

Schema:
[
  {{
    "title": "string",
    "start_time": "ISO8601 or null",
    "end_time": "ISO8601 or null",
    "location": "string or null",
    "confidence": number (0 to 1),
    "source_text": "exact snippet"
  }}
]

If no events exist, return: []

TEXT:
{text}"#
    )
}

/// Separator used to join retrieved snippets into one context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";
