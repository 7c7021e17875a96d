//! Prompt assembly for the FAQ assistant.

use crate::llm::ChatMessage;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful and accurate assistant. Respond concisely. \
Always prioritize the provided context from the FAQs. If the information is not in the provided \
FAQs, clearly state that you cannot find the answer there.";

const GROUNDED_PREAMBLE: &str = "Here is some relevant information from our frequently asked \
questions that might help answer the user's current question:\n\n";

const GROUNDED_INSTRUCTION: &str = "Please use ONLY the provided FAQ information to answer the \
user's question. If the FAQ information does not contain a direct answer, state that you cannot \
find the answer in the provided FAQs and offer to connect them with support. Do NOT use your \
general knowledge to answer questions that are not covered by the FAQs.\n\n";

const UNGROUNDED_NOTICE: &str = "No specific information was found in our frequently asked \
questions related to your query. I will try my best to answer based on my general knowledge, but \
please be aware that I may not have specific details for this topic. If you need precise \
information, please contact our support team.\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Grounded,
    Ungrounded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub kind: PromptKind,
    pub system: String,
    pub user: String,
}

impl AssembledPrompt {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system), ChatMessage::user(self.user)]
    }
}

/// Builds the system and user turns, grounding on `faqs` when any were retrieved.
pub fn assemble(faqs: &[String], message: &str) -> AssembledPrompt {
    let (kind, context) = if faqs.is_empty() {
        (PromptKind::Ungrounded, UNGROUNDED_NOTICE.to_string())
    } else {
        (PromptKind::Grounded, grounded_context(faqs))
    };

    AssembledPrompt {
        kind,
        system: SYSTEM_INSTRUCTION.to_string(),
        user: format!("{}User's current question: {}", context, message),
    }
}

fn grounded_context(faqs: &[String]) -> String {
    let mut context = String::from(GROUNDED_PREAMBLE);
    for (i, faq) in faqs.iter().enumerate() {
        context.push_str(&format!("--- FAQ Entry {} ---\n{}\n\n", i + 1, faq.trim()));
    }
    context.push_str(GROUNDED_INSTRUCTION);
    context
}
