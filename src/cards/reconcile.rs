use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use super::{CardText, EnglishSide, Side, TranslationPack};
use crate::languages::Language;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Grounded card faces ordered by (code, side).
    pub entries: Vec<CardText>,
    /// Faces with no official text in any supported language.
    pub untranslated: usize,
    /// Reprints of a (code, side) already taken from an earlier pack file.
    pub duplicates: usize,
}

impl Reconciliation {
    #[inline]
    pub fn skipped(&self) -> usize {
        self.untranslated + self.duplicates
    }
}

/// Attach official translations to each English face and drop faces that no
/// language covers.
#[inline]
pub fn reconcile(
    canonical: &[EnglishSide],
    translations: &BTreeMap<Language, TranslationPack>,
) -> Reconciliation {
    let mut result = Reconciliation::default();
    let mut seen: HashSet<(&str, Side)> = HashSet::new();

    for english in canonical {
        if !seen.insert((english.code.as_str(), english.side)) {
            debug!("Duplicate {} side of card {}", english.side, english.code);
            result.duplicates += 1;
            continue;
        }

        let found: BTreeMap<Language, String> = Language::ALL
            .into_iter()
            .filter_map(|language| {
                let text = translations
                    .get(&language)?
                    .get(&english.code)?
                    .text_for(english.side)?
                    .trim();
                (!text.is_empty()).then(|| (language, text.to_string()))
            })
            .collect();

        if found.is_empty() {
            result.untranslated += 1;
            continue;
        }

        result.entries.push(CardText {
            code: english.code.clone(),
            name: english.name.clone(),
            side: english.side,
            english_text: english.english_text.clone(),
            translations: found,
        });
    }

    result
        .entries
        .sort_by(|a, b| (a.code.as_str(), a.side).cmp(&(b.code.as_str(), b.side)));

    info!(
        "Reconciled {} card faces ({} without translation, {} duplicates)",
        result.entries.len(),
        result.untranslated,
        result.duplicates
    );

    result
}
