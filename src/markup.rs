//! Game markup found in card text.
//!
//! Single-bracket tokens such as `[action]` or `[elder_sign]` are game symbols
//! and must survive translation byte-for-byte. Double-bracket tokens such as
//! `[[Item]]` are trait labels and are translated with their brackets kept.

use std::sync::LazyLock;

use fancy_regex::Regex;

static SYMBOL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?<!\[)\[[^\[\]\n]+\](?!\])").expect("symbol token pattern is valid")
});

static TRAIT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[[^\[\]\n]+\]\]").expect("trait token pattern is valid")
});

/// Single-bracket symbol tokens in order of first appearance, without repeats.
#[inline]
pub fn symbol_tokens(text: &str) -> Vec<&str> {
    collect_unique(&SYMBOL_TOKEN, text)
}

/// Double-bracket trait labels in order of first appearance, without repeats.
#[inline]
pub fn trait_tokens(text: &str) -> Vec<&str> {
    collect_unique(&TRAIT_TOKEN, text)
}

/// Symbol tokens of `source` that do not appear in `translated`.
#[inline]
pub fn missing_symbols<'a>(source: &'a str, translated: &str) -> Vec<&'a str> {
    symbol_tokens(source)
        .into_iter()
        .filter(|token| !translated.contains(token))
        .collect()
}

fn collect_unique<'a>(regex: &Regex, text: &'a str) -> Vec<&'a str> {
    let mut tokens: Vec<&str> = Vec::new();
    // A backtrack-limit error ends the scan.
    for found in regex.find_iter(text).map_while(Result::ok) {
        let token = found.as_str();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}
