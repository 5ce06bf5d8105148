//! Prompt templates for the abbreviation and definition oracles.

use crate::lexicon::Candidate;

/// Reply meaning "none of the candidates fits".
pub const NONE_SENTINEL: &str = "NONE";

/// Ask the model to pick the candidate term closest in meaning to `word`.
pub fn selection_prompt(word: &str, candidates: &[Candidate]) -> String {
    let terms = candidates
        .iter()
        .map(|c| c.term.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "회사에서 이미 사용 중인 표준 약어 목록에서 '{word}'와 의미가 동일하거나 가장 유사한 용어를 정확히 하나만 선택해주세요.\n\n\
         ** 중요 규칙 **\n\
         1. '{word}'와 완전히 같은 의미의 용어가 있으면 반드시 그것을 선택\n\
         2. 완전히 같은 의미가 없다면, 가장 유사한 의미의 용어 1개 선택\n\
         3. 어떤 용어도 의미가 비슷하지 않다면 '{NONE_SENTINEL}' 출력\n\
         4. 설명 없이 선택된 용어명만 출력\n\n\
         표준 약어 목록: {terms}\n\n\
         분석 대상: {word}\n\
         선택 결과:"
    )
}

/// Ask the model to synthesize a new abbreviation for `word`.
pub fn generation_prompt(word: &str) -> String {
    format!(
        "다음 단어를 회사 표준에 맞는 영문 약어로 변환해주세요.\n\n\
         ** 약어 생성 규칙 **\n\
         1. 한글 → 의미에 맞는 영문 약어 (예: 계좌→ACCOUNT→ACNT, 사용자→USER)\n\
         2. 영문 → 축약형 또는 그대로 (예: Password→PWD, User→USER)\n\
         3. 숫자 → 그대로 유지 (예: 2024→2024)\n\
         4. 복합어 → 각 단어의 약어 조합 (예: 사용자번호→USER_NO)\n\
         5. 추상적 개념도 적절한 영문으로 변환 (예: 사랑→LOVE, 희망→HOPE)\n\
         6. 업무용어가 아니어도 일관된 규칙 적용\n\
         7. 대문자 사용, 언더스코어로 단어 구분\n\
         8. 최대 10자 이내로 간결하게\n\n\
         ** 생성 예시 **\n\
         로그인 → LOGIN → LGN\n\
         일자 → DATE → DT 또는 YMD\n\
         번호 → NUMBER → NO\n\
         파일경로 → FILE_PATH\n\
         사용자 → USER\n\
         사랑 → LOVE\n\
         관리 → MANAGE → MGT\n\n\
         변환 대상: {word}\n\
         생성된 약어:"
    )
}

/// Ask the model to rewrite a column definition.
pub fn definition_prompt(abbreviation: &str, term_name: &str, current_definition: &str) -> String {
    format!(
        "개발자들이 DB를 구성할 때 사용하는 컬럼 이름에 대한 정의를 개선해주세요. \"\"\"개선된 내용만 보여주세요.\"\"\"\n\n\
         공통표준용어영문약어명: {abbreviation}\n\
         공통표준용어명: {term_name}\n\
         현재 정의: {current_definition}\n\n\
         조건:\n\
         - 문장은 개조식으로 끝나야 함 (예: \"~여부.\", \"~번호.\", \"~명.\", \"~일자.\")\n\
         - 해당 컬럼이 어떤 것을 의미하는지 간단하게 설명\n\
         - 누구나 이해할 수 있도록 작성\n\
         - 개발자들이 경험적으로 사용하는 컬럼명 기준으로 설명\n\
         - 200-250자 내외로 간결하게 작성\n\
         - 양식은 지정되어 있습니다. 정의된 내용 만 보여주세요."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_prompt_lists_candidate_terms() {
        let prompt = selection_prompt(
            "계정",
            &[Candidate::new("계좌", "ACNT"), Candidate::new("계약", "CNTR")],
        );
        assert!(prompt.contains("표준 약어 목록: 계좌, 계약"));
        assert!(prompt.contains("분석 대상: 계정"));
        assert!(prompt.contains("'NONE' 출력"));
        // abbreviations are never shown to the model
        assert!(!prompt.contains("ACNT"));
    }

    #[test]
    fn test_generation_prompt() {
        let prompt = generation_prompt("해지");
        assert!(prompt.ends_with("변환 대상: 해지\n생성된 약어:"));
        assert!(prompt.contains("최대 10자 이내"));
    }

    #[test]
    fn test_definition_prompt() {
        let prompt = definition_prompt("ACNT_NO", "계좌번호", "계좌 번호");
        assert!(prompt.contains("공통표준용어영문약어명: ACNT_NO"));
        assert!(prompt.contains("공통표준용어명: 계좌번호"));
        assert!(prompt.contains("현재 정의: 계좌 번호"));
    }
}
