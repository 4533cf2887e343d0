use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::CardText;
use crate::languages::Language;

/// A card face ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedCardText {
    pub card: CardText,
    pub embedding: Vec<f32>,
}

/// An official card face returned as reference material for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextResult {
    pub card_code: String,
    pub card_name: String,
    pub is_back: bool,
    pub english_text: String,
    pub translated_text: String,
    pub language: Language,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub total: i64,
    pub per_language: BTreeMap<Language, i64>,
    /// Newest row's insertion time; `None` for an empty table.
    pub last_inserted_at: Option<DateTime<Utc>>,
}

impl Coverage {
    /// Rows carrying a translation for `language`.
    #[inline]
    pub fn translated(&self, language: Language) -> i64 {
        self.per_language.get(&language).copied().unwrap_or(0)
    }
}
