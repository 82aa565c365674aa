//! Dictionary-based query rewriting.
//!
//! Everyday phrases are replaced by the legal term the index was written
//! with (`사람을 나타내는 표현 -> 거주자`). Only the matched phrase changes;
//! a case particle glued to it is re-attached in the form the new term
//! takes, so `표현이` becomes `거주자가`.

use regex::Regex;

use crate::core::config::RewriteConfig;
use crate::core::errors::ApiError;

/// Longest first: the regex engine takes the first alternative that matches.
const PARTICLES: &str = "으로|이|가|을|를|은|는|과|와|로";

/// Digits with optional Korean magnitude units and currency/percent suffix.
const AMOUNT_PATTERN: &str = r"\d[\d,.]*(?:\s*[십백천만억조])*\s*(?:원|%|퍼센트)?";

#[derive(Debug, Clone)]
pub struct DictionaryRule {
    pub from: String,
    pub to: String,
    pattern: Regex,
}

impl DictionaryRule {
    /// Parse a `phrase -> term` rule. Whitespace inside the phrase matches
    /// any run of whitespace in the question.
    pub fn parse(rule: &str) -> Result<Self, ApiError> {
        let (from, to) = rule.split_once("->").ok_or_else(|| {
            ApiError::config(format!("dictionary rule '{}' must look like 'phrase -> term'", rule))
        })?;
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(ApiError::config(format!(
                "dictionary rule '{}' has an empty side",
                rule
            )));
        }

        let words: Vec<String> = from.split_whitespace().map(regex::escape).collect();
        let pattern = Regex::new(&format!("{}(?P<particle>{})?", words.join(r"\s+"), PARTICLES))
            .map_err(|e| ApiError::config(format!("dictionary rule '{}': {}", rule, e)))?;

        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
            pattern,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in self.pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            out.push_str(&self.to);

            if let Some(particle) = caps.name("particle") {
                let rest = &text[particle.end()..];
                match particle_stem_or_syllable(particle.as_str(), rest) {
                    Attached::Particle(p) => out.push_str(attach_particle(&self.to, p)),
                    // Not a particle, just the start of the next syllables.
                    Attached::Syllables(s) => out.push_str(s),
                }
            }
            last = whole.end();
        }

        out.push_str(&text[last..]);
        out
    }
}

enum Attached<'a> {
    Particle(&'a str),
    Syllables(&'a str),
}

/// `으로`/`로` stay particles when more syllables follow (`으로서`,
/// `로부터`); the others only when they end the word.
fn particle_stem_or_syllable<'a>(particle: &'a str, rest: &str) -> Attached<'a> {
    if matches!(particle, "으로" | "로") || ends_word(rest) {
        Attached::Particle(particle)
    } else {
        Attached::Syllables(particle)
    }
}

pub struct QueryRewriter {
    rules: Vec<DictionaryRule>,
    raw_rules: Vec<String>,
    amount_pattern: Regex,
}

impl QueryRewriter {
    pub fn new(rules: &[String]) -> Result<Self, ApiError> {
        let parsed = rules
            .iter()
            .map(|rule| DictionaryRule::parse(rule))
            .collect::<Result<Vec<_>, _>>()?;
        let amount_pattern = Regex::new(AMOUNT_PATTERN).map_err(ApiError::internal)?;

        Ok(Self {
            rules: parsed,
            raw_rules: rules.to_vec(),
            amount_pattern,
        })
    }

    pub fn from_config(config: &RewriteConfig) -> Result<Self, ApiError> {
        Self::new(&config.dictionary)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules as written in the configuration, for the model prompt.
    pub fn rules(&self) -> &[String] {
        &self.raw_rules
    }

    /// Apply every rule in order.
    pub fn rewrite(&self, question: &str) -> String {
        self.rules
            .iter()
            .fold(question.to_string(), |text, rule| rule.apply(&text))
    }

    /// Numeric amounts in `text`, whitespace removed, sorted.
    pub fn amounts(&self, text: &str) -> Vec<String> {
        let mut amounts: Vec<String> = self
            .amount_pattern
            .find_iter(text)
            .map(|m| {
                m.as_str()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .trim_end_matches([',', '.'])
                    .to_string()
            })
            .collect();
        amounts.sort();
        amounts
    }

    /// Validate a model-produced rewrite against the deterministic one.
    ///
    /// The candidate is accepted only if it is non-empty, carries exactly the
    /// same amounts, and no dictionary phrase survives in it.
    pub fn accept_model_rewrite(&self, deterministic: &str, candidate: &str) -> Option<String> {
        let candidate = candidate
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())?
            .trim_matches('"')
            .trim();
        if candidate.is_empty() {
            return None;
        }
        if self.amounts(candidate) != self.amounts(deterministic) {
            return None;
        }
        if self.rules.iter().any(|rule| rule.matches(candidate)) {
            return None;
        }
        Some(candidate.to_string())
    }
}

fn ends_word(rest: &str) -> bool {
    rest.chars().next().map_or(true, |c| !c.is_alphanumeric())
}

/// Final consonant index of a precomposed Hangul syllable (0 = none).
fn final_consonant(c: char) -> Option<u32> {
    let code = c as u32;
    if (0xAC00..=0xD7A3).contains(&code) {
        Some((code - 0xAC00) % 28)
    } else {
        None
    }
}

/// The form of `particle` that follows `term`.
fn attach_particle<'a>(term: &str, particle: &'a str) -> &'a str {
    let Some(jong) = term.chars().last().and_then(final_consonant) else {
        return particle;
    };
    let closed = jong != 0;
    match particle {
        "이" | "가" => if closed { "이" } else { "가" },
        "을" | "를" => if closed { "을" } else { "를" },
        "은" | "는" => if closed { "은" } else { "는" },
        "과" | "와" => if closed { "과" } else { "와" },
        // ㄹ (index 8) takes 로 like an open syllable.
        "으로" | "로" => if closed && jong != 8 { "으로" } else { "로" },
        _ => particle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_rewriter() -> QueryRewriter {
        QueryRewriter::new(&["사람을 나타내는 표현 -> 거주자".to_string()]).unwrap()
    }

    #[test]
    fn replaces_phrase_and_keeps_amounts() {
        let rewriter = default_rewriter();
        let rewritten = rewriter.rewrite("사람을 나타내는 표현이 5천만원 초과일 때 세율은?");

        assert_eq!(rewritten, "거주자가 5천만원 초과일 때 세율은?");
        assert_eq!(
            rewriter.amounts(&rewritten),
            rewriter.amounts("사람을 나타내는 표현이 5천만원 초과일 때 세율은?")
        );
    }

    #[test]
    fn question_without_phrase_is_unchanged() {
        let rewriter = default_rewriter();
        let question = "비거주자의 종합소득 과세표준은?";
        assert_eq!(rewriter.rewrite(question), question);
    }

    #[test]
    fn phrase_matches_across_irregular_spacing() {
        let rewriter = default_rewriter();
        assert_eq!(
            rewriter.rewrite("사람을  나타내는\t표현의 정의"),
            "거주자의 정의"
        );
    }

    #[test]
    fn particle_follows_new_term() {
        let rewriter = default_rewriter();
        assert_eq!(rewriter.rewrite("사람을 나타내는 표현을 알려줘"), "거주자를 알려줘");
        assert_eq!(rewriter.rewrite("사람을 나타내는 표현은?"), "거주자는?");
        assert_eq!(rewriter.rewrite("사람을 나타내는 표현으로 본다"), "거주자로 본다");
    }

    #[test]
    fn syllable_after_phrase_is_not_treated_as_particle() {
        let rewriter = default_rewriter();
        assert_eq!(rewriter.rewrite("사람을 나타내는 표현이다"), "거주자이다");
    }

    #[test]
    fn instrumental_particle_adjusts_before_more_syllables() {
        let rewriter = default_rewriter();
        assert_eq!(
            rewriter.rewrite("사람을 나타내는 표현으로서 내는 세금"),
            "거주자로서 내는 세금"
        );
        assert_eq!(rewriter.rewrite("사람을 나타내는 표현으로부터"), "거주자로부터");

        let rewriter = QueryRewriter::new(&["회사 -> 법인".to_string()]).unwrap();
        assert_eq!(rewriter.rewrite("회사로서 납부"), "법인으로서 납부");
    }

    #[test]
    fn closed_syllable_terms_keep_closed_particles() {
        let rewriter = QueryRewriter::new(&["회사 -> 법인".to_string()]).unwrap();
        assert_eq!(rewriter.rewrite("회사가 내는 세금"), "법인이 내는 세금");
        assert_eq!(rewriter.rewrite("회사로 보는 단체"), "법인으로 보는 단체");
    }

    #[test]
    fn rules_apply_in_order() {
        let rewriter = QueryRewriter::new(&[
            "사람을 나타내는 표현 -> 거주자".to_string(),
            "돈 버는 것 -> 소득".to_string(),
        ])
        .unwrap();
        assert_eq!(
            rewriter.rewrite("사람을 나타내는 표현의 돈 버는 것"),
            "거주자의 소득"
        );
    }

    #[test]
    fn malformed_rule_is_a_config_error() {
        let err = QueryRewriter::new(&["거주자".to_string()]).err().unwrap();
        assert!(err.is_startup_fatal());
        assert!(QueryRewriter::new(&[" -> 거주자".to_string()]).is_err());
    }

    #[test]
    fn amounts_are_normalized() {
        let rewriter = default_rewriter();
        assert_eq!(
            rewriter.amounts("1,400만원 초과 5천 만원 이하, 세율 15%"),
            vec!["1,400만원", "15%", "5천만원"]
        );
    }

    #[test]
    fn model_rewrite_is_accepted_when_faithful() {
        let rewriter = default_rewriter();
        let deterministic = "거주자가 5천만원 초과일 때 세율은?";
        assert_eq!(
            rewriter.accept_model_rewrite(deterministic, "\n거주자의 소득이 5천만원 초과일 때 세율은?\n"),
            Some("거주자의 소득이 5천만원 초과일 때 세율은?".to_string())
        );
    }

    #[test]
    fn model_rewrite_is_rejected_when_amounts_change() {
        let rewriter = default_rewriter();
        let deterministic = "거주자가 5천만원 초과일 때 세율은?";
        assert!(rewriter
            .accept_model_rewrite(deterministic, "거주자가 5백만원 초과일 때 세율은?")
            .is_none());
        assert!(rewriter
            .accept_model_rewrite(deterministic, "거주자의 세율은?")
            .is_none());
        assert!(rewriter.accept_model_rewrite(deterministic, "   ").is_none());
    }

    #[test]
    fn model_rewrite_is_rejected_when_phrase_survives() {
        let rewriter = default_rewriter();
        assert!(rewriter
            .accept_model_rewrite(
                "거주자가 5천만원 초과일 때 세율은?",
                "사람을 나타내는 표현이 5천만원 초과일 때 세율은?"
            )
            .is_none());
    }
}
