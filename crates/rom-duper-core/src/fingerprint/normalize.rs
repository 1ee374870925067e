use regex::{Captures, Regex};

lazy_static::lazy_static! {
    static ref BRACKETED_CHUNK: Regex = Regex::new(r"\([^)]+\)|\[[^\]]+\]|\{[^}]+\}").unwrap();
    static ref PUNCTUATION: Regex = Regex::new(r"\p{P}|\p{So}").unwrap();
    static ref SYMBOL: Regex = Regex::new(r"\p{S}").unwrap();
    static ref MULTIPLE_SPACES: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref SHORT_NUMBER: Regex = Regex::new(r"\b[0-9]{1,2}\b").unwrap();
}

const STOPWORDS: &[&str] = &["and", "the", "an", "a", "der", "das", "die"];

const ROMAN_NUMERALS: &[(u32, &str)] = &[
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Canonicalize a name for fuzzy comparison.
///
/// Region/revision annotations, articles, punctuation and numbering style are
/// the usual reasons two copies of the same release look different, so they
/// are removed or unified here before fingerprinting:
///
/// ```
/// use rom_duper_core::fingerprint::normalize;
///
/// assert_eq!(normalize("Final Fantasy 7 (USA) [!]"), "FINAL FANTASY VII");
/// assert_eq!(normalize("Final Fantasy VII (Disc 1)"), "FINAL FANTASY VII");
/// ```
pub fn normalize(raw: &str) -> String {
    let text = BRACKETED_CHUNK.replace_all(raw, "");
    let text = text.replace('&', "and");
    let text = remove_stopwords(&text);
    let text = PUNCTUATION.replace_all(&text, "");
    let text = SYMBOL.replace_all(&text, "+");
    let text = MULTIPLE_SPACES.replace_all(&text, " ");
    let text = SHORT_NUMBER.replace_all(&text, |caps: &Captures| romanize(&caps[0]));
    text.trim().to_uppercase()
}

/// Drop stopword tokens unless every token is one.
///
/// A token counts as a stopword once its punctuation is stripped, so "the" and
/// "the," are both removed and the later punctuation pass cannot reassemble one.
fn remove_stopwords(text: &str) -> String {
    let kept: Vec<&str> = text
        .split_whitespace()
        .filter(|token| !is_stopword(token))
        .collect();

    if kept.is_empty() {
        text.to_string()
    } else {
        kept.join(" ")
    }
}

fn is_stopword(token: &str) -> bool {
    let stripped = PUNCTUATION.replace_all(token, "");
    STOPWORDS
        .iter()
        .any(|stopword| stripped.eq_ignore_ascii_case(stopword))
}

/// Zero has no numeral and is kept as written.
fn romanize(number: &str) -> String {
    match number.parse::<u32>() {
        Ok(n) if n > 0 => to_roman(n),
        _ => number.to_string(),
    }
}

pub fn to_roman(mut number: u32) -> String {
    let mut roman = String::with_capacity(8);
    for &(value, numeral) in ROMAN_NUMERALS {
        while number >= value {
            number -= value;
            roman.push_str(numeral);
        }
    }
    roman
}
