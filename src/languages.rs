//! The closed set of languages the corpus carries official translations for.
//!
//! Every language maps to exactly one storage column; adding a language means
//! adding a variant here and a column in the schema, and the compiler points
//! at every match that needs updating.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    It,
    Fr,
    De,
    Es,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language: {code} (supported: {})", Language::supported_codes())]
pub struct UnsupportedLanguage {
    pub code: String,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::It, Language::Fr, Language::De, Language::Es];

    /// ISO 639-1 code, also the directory name under `translations/`.
    #[inline]
    pub const fn code(self) -> &'static str {
        match self {
            Language::It => "it",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Es => "es",
        }
    }

    /// Column of `card_embeddings` holding this language's official text.
    #[inline]
    pub const fn column(self) -> &'static str {
        match self {
            Language::It => "it_text",
            Language::Fr => "fr_text",
            Language::De => "de_text",
            Language::Es => "es_text",
        }
    }

    #[inline]
    pub const fn display_name(self) -> &'static str {
        match self {
            Language::It => "Italian",
            Language::Fr => "French",
            Language::De => "German",
            Language::Es => "Spanish",
        }
    }

    #[inline]
    pub fn supported_codes() -> String {
        Self::ALL.map(Language::code).join(", ")
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| UnsupportedLanguage {
                code: s.to_string(),
            })
    }
}

impl fmt::Display for Language {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
