use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{IndexError, Result};
use crate::Freq;

/// Правило нормализации текста в термы. Одно и то же правило обязано
/// применяться при сборке и при поиске, поэтому оно пишется в манифест.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerKind {
    /// `[A-Za-z0-9]+` в нижнем регистре
    #[default]
    Ascii,
    /// lowercase + NFKC + снятие диакритики, затем юникодные буквы/цифры
    Folded,
}

impl NormalizerKind {
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        match self {
            NormalizerKind::Ascii => ascii_word()
                .find_iter(text)
                .map(|m| m.as_str().to_ascii_lowercase())
                .collect(),
            NormalizerKind::Folded => fold(text)
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn term_frequencies(&self, text: &str) -> HashMap<String, Freq> {
        let mut tf: HashMap<String, Freq> = HashMap::new();
        for t in self.tokenize(text) {
            *tf.entry(t).or_insert(0) += 1;
        }
        tf
    }

    /// Терм получен этим же нормализатором: токенизация возвращает его без изменений
    pub fn is_stable(&self, term: &str) -> bool {
        matches!(self.tokenize(term).as_slice(), [t] if t == term)
    }

    /// Нормализует сырой запрос в один терм.
    /// `Ok(None)`: после нормализации ничего не осталось.
    pub fn normalize_query(&self, raw: &str) -> Result<Option<String>> {
        let mut terms = self.tokenize(raw);
        match terms.len() {
            0 => Ok(None),
            1 => Ok(terms.pop()),
            _ => Err(IndexError::MultiTermQuery(terms)),
        }
    }
}

fn ascii_word() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    RX.get_or_init(|| Regex::new("[A-Za-z0-9]+").expect("static regex"))
}

fn fold(s: &str) -> String {
    let lower = s.to_lowercase();
    let nfkc = lower.nfkc().collect::<String>();
    nfkc.nfd().filter(|c| !is_mark(*c)).collect()
}

fn is_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_splits_on_punctuation_and_lowercases() {
        let t = NormalizerKind::Ascii.tokenize("Virus, VIRUS! spread-fast 2020");
        assert_eq!(t, vec!["virus", "virus", "spread", "fast", "2020"]);
    }

    #[test]
    fn ascii_drops_non_ascii_letters() {
        assert_eq!(NormalizerKind::Ascii.tokenize("café"), vec!["caf"]);
    }

    #[test]
    fn folded_strips_accents() {
        assert_eq!(NormalizerKind::Folded.tokenize("Café NAÏVE"), vec!["cafe", "naive"]);
        assert_eq!(NormalizerKind::Folded.tokenize("КоШКи"), vec!["кошки"]);
    }

    #[test]
    fn frequencies_count_repeats() {
        let tf = NormalizerKind::Ascii.term_frequencies("Virus Virus Spread");
        assert_eq!(tf["virus"], 2);
        assert_eq!(tf["spread"], 1);
    }

    #[test]
    fn query_normalization_outcomes() {
        let n = NormalizerKind::Ascii;
        assert_eq!(n.normalize_query("  Virus! ").unwrap().as_deref(), Some("virus"));
        assert_eq!(n.normalize_query("?!  ").unwrap(), None);
        assert!(matches!(
            n.normalize_query("covid-19"),
            Err(IndexError::MultiTermQuery(_))
        ));
    }

    #[test]
    fn stable_terms_depend_on_kind() {
        assert!(NormalizerKind::Ascii.is_stable("virus"));
        assert!(!NormalizerKind::Ascii.is_stable("щенок"));
        assert!(!NormalizerKind::Ascii.is_stable("Virus"));
        assert!(NormalizerKind::Folded.is_stable("щенок"));
        assert!(NormalizerKind::Folded.is_stable("cafe"));
        assert!(!NormalizerKind::Folded.is_stable("café"));
        assert!(!NormalizerKind::Folded.is_stable("two words"));
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&NormalizerKind::Folded).unwrap(), "\"folded\"");
    }
}
