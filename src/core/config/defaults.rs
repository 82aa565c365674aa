use super::settings::FewShotExample;

pub fn default_dictionary() -> Vec<String> {
    vec!["사람을 나타내는 표현 -> 거주자".to_string()]
}

pub fn default_few_shot_examples() -> Vec<FewShotExample> {
    vec![
        FewShotExample {
            question: "소득은 어떻게 구분되나요?".to_string(),
            answer: "소득세법 제4조에 따르면 거주자의 소득은 다음과 같이 구분됩니다.\n\
                     - 종합소득: 이자소득, 배당소득, 사업소득, 근로소득, 연금소득, 기타소득을 합산한 소득\n\
                     - 퇴직소득\n\
                     - 양도소득"
                .to_string(),
        },
        FewShotExample {
            question: "비거주자도 소득세를 내야 하나요?".to_string(),
            answer: "네. 소득세법 제2조에 따라 비거주자도 국내원천소득이 있는 경우 소득세 납세의무를 집니다. \
                     다만 과세 범위는 국내원천소득으로 한정됩니다."
                .to_string(),
        },
        FewShotExample {
            question: "과세표준이 1,400만원 이하인 거주자의 세율은 얼마인가요?".to_string(),
            answer: "소득세법 제55조에 따르면 종합소득 과세표준 1,400만원 이하 구간의 세율은 과세표준의 6%입니다."
                .to_string(),
        },
    ]
}
