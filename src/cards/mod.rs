// Card corpus loading
// Reads the arkhamdb-json-data layout: canonical English cards under
// `pack/<pack>/*.json` and official translations under
// `translations/<lang>/pack/<pack>/*.json`.

#[cfg(test)]
mod tests;

pub mod reconcile;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::languages::Language;

pub use reconcile::{Reconciliation, reconcile};

/// One card record as it appears in a pack JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawCard {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub real_text: Option<String>,
    #[serde(default)]
    pub back_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

/// An English card face read from the canonical packs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnglishSide {
    pub code: String,
    pub name: String,
    pub side: Side,
    pub english_text: String,
}

/// One face of a card with every official translation known for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardText {
    pub code: String,
    pub name: String,
    pub side: Side,
    pub english_text: String,
    pub translations: BTreeMap<Language, String>,
}

/// Official text of a single card in one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatedCard {
    pub name: Option<String>,
    pub text: Option<String>,
    pub back_text: Option<String>,
}

/// Translated cards of one language keyed by card code.
pub type TranslationPack = BTreeMap<String, TranslatedCard>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalCorpus {
    pub sides: Vec<EnglishSide>,
    pub cards_read: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct CorpusLoader {
    root: PathBuf,
}

impl RawCard {
    #[inline]
    pub fn code(&self) -> Option<&str> {
        non_blank(self.code.as_deref())
    }

    /// Rules text of the front face, falling back to the printed flavor text.
    #[inline]
    pub fn front_text(&self) -> Option<&str> {
        non_blank(self.text.as_deref()).or_else(|| non_blank(self.real_text.as_deref()))
    }

    #[inline]
    pub fn back_text(&self) -> Option<&str> {
        non_blank(self.back_text.as_deref())
    }

    #[inline]
    pub fn side_text(&self, side: Side) -> Option<&str> {
        match side {
            Side::Front => self.front_text(),
            Side::Back => self.back_text(),
        }
    }
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Front, Side::Back];

    #[inline]
    pub const fn is_back(self) -> bool {
        matches!(self, Side::Back)
    }

    #[inline]
    pub const fn from_is_back(is_back: bool) -> Self {
        if is_back { Side::Back } else { Side::Front }
    }
}

impl fmt::Display for Side {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Side::Front => write!(f, "front"),
            Side::Back => write!(f, "back"),
        }
    }
}

impl TranslatedCard {
    #[inline]
    pub fn text_for(&self, side: Side) -> Option<&str> {
        match side {
            Side::Front => self.text.as_deref(),
            Side::Back => self.back_text.as_deref(),
        }
    }
}

impl CorpusLoader {
    #[inline]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every English card face under `pack/`.
    #[inline]
    pub fn load_canonical(&self) -> Result<CanonicalCorpus> {
        let pack_dir = self.root.join("pack");
        info!("Scanning card files in {}", pack_dir.display());

        let files = pack_json_files(&pack_dir)
            .with_context(|| format!("Failed to list packs in {}", pack_dir.display()))?;

        let mut corpus = CanonicalCorpus::default();

        for file in files {
            let Some(cards) = read_cards(&file) else {
                continue;
            };

            for card in cards {
                corpus.cards_read += 1;

                let Some(code) = card.code() else {
                    corpus.skipped += 1;
                    continue;
                };
                let name = card.name.as_deref().map(str::trim).unwrap_or_default();

                let mut has_text = false;
                for side in Side::BOTH {
                    if let Some(text) = card.side_text(side) {
                        has_text = true;
                        corpus.sides.push(EnglishSide {
                            code: code.to_string(),
                            name: name.to_string(),
                            side,
                            english_text: text.to_string(),
                        });
                    }
                }

                if !has_text {
                    corpus.skipped += 1;
                }
            }

            debug!(
                "Read {} ({} card faces so far)",
                file.display(),
                corpus.sides.len()
            );
        }

        info!(
            "Extracted {} English card faces from {} cards (skipped {})",
            corpus.sides.len(),
            corpus.cards_read,
            corpus.skipped
        );

        Ok(corpus)
    }

    /// Read the official translations for one language.
    ///
    /// A language without a `translations/<lang>/pack` directory yields an
    /// empty pack. Files are visited in sorted order and later files win, so
    /// the result does not depend on directory enumeration order.
    #[inline]
    pub fn load_translations(&self, language: Language) -> Result<TranslationPack> {
        let dir = self
            .root
            .join("translations")
            .join(language.code())
            .join("pack");

        let mut pack = TranslationPack::new();

        if !dir.is_dir() {
            debug!("No translations directory for {}", language);
            return Ok(pack);
        }

        let files = pack_json_files(&dir)
            .with_context(|| format!("Failed to list translation packs in {}", dir.display()))?;

        for file in files {
            let Some(cards) = read_cards(&file) else {
                continue;
            };

            for card in cards {
                let Some(code) = card.code() else {
                    continue;
                };

                let entry = pack.entry(code.to_string()).or_default();
                if let Some(name) = non_blank(card.name.as_deref()) {
                    entry.name = Some(name.to_string());
                }
                if let Some(text) = card.front_text() {
                    entry.text = Some(text.to_string());
                }
                if let Some(text) = card.back_text() {
                    entry.back_text = Some(text.to_string());
                }
            }
        }

        info!("Loaded {} {} card translations", pack.len(), language);
        Ok(pack)
    }

    #[inline]
    pub fn load_all_translations(&self) -> Result<BTreeMap<Language, TranslationPack>> {
        let mut all = BTreeMap::new();
        for language in Language::ALL {
            all.insert(language, self.load_translations(language)?);
        }
        Ok(all)
    }
}

/// All `*.json` files one level below each pack directory, in path order.
fn pack_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pack_dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    pack_dirs.sort();

    let mut files = Vec::new();
    for pack_dir in pack_dirs {
        let entries = match fs::read_dir(&pack_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping unreadable pack {}: {}", pack_dir.display(), e);
                continue;
            }
        };

        let mut pack_files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect();
        pack_files.sort();
        files.extend(pack_files);
    }

    Ok(files)
}

fn read_cards(path: &Path) -> Option<Vec<RawCard>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Skipping unreadable file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(cards) => Some(cards),
        Err(e) => {
            warn!("Skipping malformed file {}: {}", path.display(), e);
            None
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
