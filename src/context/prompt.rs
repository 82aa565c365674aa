//! Prompt texts and the functions that assemble them into chat messages.

use crate::core::config::FewShotExample;
use crate::llm::ChatMessage;

/// Answer given when the retrieved documents do not support an answer.
pub const NOT_DETERMINABLE: &str = "제공된 정보에서는 알 수 없습니다.";

const DICTIONARY_PROMPT_HEAD: &str = "\
당신은 사용자의 질문에서 특정 표현을 사전에 따라 '전문 용어'로 교체하는 변환기입니다.

[변환 규칙]";

const DICTIONARY_PROMPT_RULES: &str = "\
[지시사항]
1. 질문에서 변환 규칙 왼쪽의 표현이 보이면 무조건 오른쪽의 전문 용어로 바꾸세요.
2. \"5천만원\" 같은 숫자나 다른 상세 조건은 절대로 건드리지 마세요.
3. 설명 없이 오직 '변환된 문장'만 다시 출력하세요.";

const CONTEXTUALIZE_PROMPT: &str = "\
대화 기록과 사용자의 최신 질문이 주어집니다. 최신 질문은 대화 기록의 내용을 참조하고 있을 수 있습니다.
대화 기록 없이도 이해할 수 있는 독립적인 질문으로 다시 작성하세요.
- '그것', '그 경우', '위의 금액'처럼 이전 대화를 가리키는 표현은 가리키는 대상을 직접 적어 넣으세요.
- 숫자와 금액은 그대로 유지하세요.
- 질문에 답하지 마세요. 다시 작성할 필요가 없으면 질문을 그대로 반환하세요.
- 설명 없이 질문 한 문장만 출력하세요.";

const ANSWER_PERSONA: &str = "당신은 한국의 소득세 전문가입니다.";

const ANSWER_INSTRUCTIONS: &str = "\
다음에 제공된 [관련 법령/문서] 내용만을 근거로 사용자의 질문에 답변하세요.

[지시사항]
1. 수치를 계산하거나 조항을 설명할 때는 반드시 문서에 있는 내용만 사용하세요.
2. 문서에 없는 내용은 \"제공된 정보에서는 알 수 없습니다\"라고 명확히 답하세요.
3. 가능한 한 읽기 쉽게 결론부터 말하고, 필요하면 글머리 기호를 사용하세요.
4. 아래 예시 대화는 답변 형식을 보여줄 뿐이며 사실의 근거가 아닙니다.";

/// Single-message prompt asking the model to apply the term dictionary.
pub fn dictionary_messages(rules: &[String], question: &str) -> Vec<ChatMessage> {
    let rules_text = rules
        .iter()
        .map(|rule| format!("- {rule}"))
        .collect::<Vec<_>>()
        .join("\n");
    vec![ChatMessage::user(format!(
        "{DICTIONARY_PROMPT_HEAD}\n{rules_text}\n\n{DICTIONARY_PROMPT_RULES}\n\n질문: {question}"
    ))]
}

/// System instruction, prior turns, then the question to restate.
pub fn contextualize_messages(history: &[ChatMessage], question: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(CONTEXTUALIZE_PROMPT));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(question));
    messages
}

/// Persona, grounding rules and context, then few-shot pairs, prior turns
/// and finally the question.
pub fn answer_messages(
    context: &str,
    examples: &[FewShotExample],
    history: &[ChatMessage],
    question: &str,
) -> Vec<ChatMessage> {
    let system = format!(
        "{ANSWER_PERSONA} {ANSWER_INSTRUCTIONS}\n\n[관련 법령/문서]:\n{context}"
    );

    let mut messages = Vec::with_capacity(2 + examples.len() * 2 + history.len());
    messages.push(ChatMessage::system(system));
    for example in examples {
        messages.push(ChatMessage::user(example.question.clone()));
        messages.push(ChatMessage::assistant(example.answer.clone()));
    }
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(question));
    messages
}
