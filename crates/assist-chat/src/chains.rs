//! Prompt construction for the four response chains.
//!
//! Each builder returns a complete [`PromptRequest`]; the dispatcher makes
//! the single model call.

use assist_core::types::{ChatTurn, Passage};
use assist_llm::PromptRequest;

const GENERAL_SYSTEM: &str =
    "당신은 친절하고 유능한 AI 비서입니다. 사용자의 질문에 명확하고 간결하게 답변하세요.";

const DOCUMENT_SYSTEM: &str = "당신은 문서 검색 및 요약 전문가입니다. \
주어진 문서(context)를 기반으로 사용자의 질문에 답변하세요. \
문서에 없는 내용은 답변하지 말고, 정보가 없다고 솔직하게 말하세요.";

/// Reply when the document chain yields no answer text.
pub const DOCUMENT_FALLBACK: &str = "죄송합니다, 답변을 생성할 수 없습니다.";

const EMAIL_TEMPLATE: &str = "당신은 사용자의 이메일 요약을 돕는 AI 비서입니다.
아래는 사용자의 이메일 검색 결과입니다. 이 내용을 바탕으로 사용자에게 친절하게 요약해서 전달해주세요.
만약 검색 결과가 없다면, \"{no_result}\" 라고 답변해주세요.

[이메일 검색 결과]
{tool_output}

[사용자 원본 질문]
{input}

요약 답변:";

const CALENDAR_TEMPLATE: &str = "당신은 사용자의 일정을 알려주는 AI 비서입니다.
아래는 사용자의 오늘 일정 검색 결과입니다. 이 내용을 바탕으로 사용자에게 친절하게 정리해서 전달해주세요.
만약 일정이 없다면, \"{no_result}\" 라고 답변해주세요.

[오늘 일정 검색 결과]
{tool_output}

[사용자 원본 질문]
{input}

요약 답변:";

fn fill(template: &str, no_result: &str, tool_output: &str, input: &str) -> String {
    // tool output is substituted last so braces inside it are left alone
    template
        .replace("{no_result}", no_result)
        .replace("{input}", input)
        .replace("{tool_output}", tool_output)
}

/// General conversation: system instruction, prior turns, the message.
pub fn general(input: &str, history: &[ChatTurn]) -> PromptRequest {
    PromptRequest::new(input)
        .with_system(GENERAL_SYSTEM)
        .with_history(history)
}

/// Email summarizer over the Gmail search output.
pub fn email(input: &str, history: &[ChatTurn], tool_output: &str, no_result: &str) -> PromptRequest {
    PromptRequest::new(fill(EMAIL_TEMPLATE, no_result, tool_output, input)).with_history(history)
}

/// Calendar summarizer over today's agenda.
pub fn calendar(
    input: &str,
    history: &[ChatTurn],
    tool_output: &str,
    no_result: &str,
) -> PromptRequest {
    PromptRequest::new(fill(CALENDAR_TEMPLATE, no_result, tool_output, input))
        .with_history(history)
}

/// Document QA: the retrieved passages become the system context.
pub fn document_qa(input: &str, history: &[ChatTurn], passages: &[Passage]) -> PromptRequest {
    let context = passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    PromptRequest::new(input)
        .with_system(format!("{}\n\n{}", DOCUMENT_SYSTEM, context))
        .with_history(history)
}
