//! Text normalization and tokenization
//!
//! Vocabulary phrases and document text go through different pipelines:
//! phrases are folded into trie keys, documents are cut into sentences and
//! then into word tokens whose positions drive proximity pairing.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Dash variants folded to spaces: hyphen, en-dash, em-dash
const DASHES: [char; 3] = ['-', '\u{2013}', '\u{2014}'];

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid non-word regex"));

/// English stop words (NLTK list)
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
        "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
        "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
        "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
        "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
        "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
        "with", "about", "against", "between", "into", "through", "during", "before", "after",
        "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
        "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
        "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o", "re",
        "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn",
        "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma",
        "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
        "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
        "wouldn't",
    ]
    .into_iter()
    .collect()
});

/// Fold a vocabulary phrase into trie key tokens
///
/// Lowercases, drops commas, turns dash variants into spaces and splits on
/// whitespace. `"University of Wisconsin–Madison, USA"` becomes
/// `["university", "of", "wisconsin", "madison", "usa"]`.
pub fn normalize_phrase(phrase: &str) -> Vec<String> {
    phrase
        .to_lowercase()
        .replace(',', "")
        .replace(DASHES, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Split free text into sentences (UAX #29 sentence boundaries)
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences().map(str::trim).collect()
}

/// Split a sentence into word tokens
///
/// Runs of non-word characters separate tokens, periods are removed and
/// empty tokens dropped, so token indices are dense.
pub fn word_tokens(sentence: &str) -> Vec<String> {
    NON_WORD
        .split(sentence)
        .map(|word| word.replace('.', ""))
        .filter(|word| !word.is_empty())
        .collect()
}

/// Lowercase copies of `tokens`, the form the trie is keyed by
pub fn lowercase_all<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens.iter().map(|t| t.as_ref().to_lowercase()).collect()
}

/// Whether a lowercase token is an English stop word
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phrase() {
        assert_eq!(
            normalize_phrase("University of California, San Diego"),
            vec!["university", "of", "california", "san", "diego"]
        );
        assert_eq!(
            normalize_phrase("Wisconsin\u{2013}Madison"),
            vec!["wisconsin", "madison"]
        );
        assert_eq!(normalize_phrase("Max-Planck\u{2014}Institut"), vec!["max", "planck", "institut"]);
        assert!(normalize_phrase(" , - ").is_empty());
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("We thank our colleagues. This work was funded by NSF.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1], "This work was funded by NSF.");
    }

    #[test]
    fn test_word_tokens() {
        let tokens = word_tokens("Supported by NIH (grant R01-CA123456).");
        assert_eq!(tokens, vec!["Supported", "by", "NIH", "grant", "R01", "CA123456"]);
        assert!(word_tokens("...").is_empty());
    }

    #[test]
    fn test_stop_words() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("of"));
        assert!(!is_stop_word("nih"));
        assert!(!is_stop_word("The"));
    }
}
