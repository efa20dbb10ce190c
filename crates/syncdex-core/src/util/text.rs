//! Text utilities.
//!
//! Free-text queries are cleaned before they reach the engine's query-string
//! parser, and index/type names are derived from model identifiers.

use convert_case::{Case, Casing};

/// Clean free text for use as a query string.
///
/// Every run of non-word characters collapses into a single space and the
/// result is trimmed. Word characters are alphanumerics and underscores.
///
/// # Examples
///
/// ```
/// use syncdex_core::util::text::clean;
///
/// assert_eq!(clean("hello world"), "hello world");
/// assert_eq!(clean("  hello,   world!! "), "hello world");
/// assert_eq!(clean("title:(foo OR bar)"), "title foo OR bar");
/// ```
pub fn clean(text: &str) -> String {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Pluralize a lowercase English noun.
///
/// Covers the regular cases: sibilant endings take `es`, consonant + `y`
/// becomes `ies`, everything else takes `s`.
///
/// ```
/// use syncdex_core::util::text::pluralize;
///
/// assert_eq!(pluralize("article"), "articles");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("box"), "boxes");
/// ```
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }

    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }

    format!("{word}s")
}

/// Snake-case a model identifier (`SubArticle` → `sub_article`).
pub fn snake_case(model: &str) -> String {
    model.to_case(Case::Snake)
}
