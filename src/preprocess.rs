use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "is", "be", "to", "of", "in", "on", "with", "that", "for", "it", "as",
    "was", "are", "at", "by", "from",
];

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Normalization used by the baseline mode: lowercase, drop punctuation,
/// drop stop words, rejoin on single spaces.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lowered, "");

    stripped
        .split_whitespace()
        .filter(|token| !STOP_WORD_SET.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_stop_words() {
        assert_eq!(
            normalize("The Senate, in a SHOCKING vote, passed the bill!"),
            "senate shocking vote passed bill"
        );
    }

    #[test]
    fn keeps_underscores_and_digits() {
        assert_eq!(normalize("COVID_19 cases rose 12%"), "covid_19 cases rose 12");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  breaking\n\tnews \r\n"), "breaking news");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn punctuation_joined_stop_words_survive_as_new_tokens() {
        // "it's" becomes "its", which is not a stop word.
        assert_eq!(normalize("It's over."), "its over");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "The stock market crashed today due to unforeseen circumstances in the banking sector",
            "Aliens built the pyramids -- scientists are STUNNED!!!",
            "Ünïcödé Straße, ÉTÉ and naïve café!",
            "a an the",
            "",
            "...",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn counts_whitespace_separated_words() {
        assert_eq!(word_count("short text"), 2);
        assert_eq!(word_count("  spaced   out\twords\n"), 3);
        assert_eq!(word_count(""), 0);
    }
}
