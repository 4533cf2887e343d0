use super::*;
use serde_json::{Value, json};
use tempfile::TempDir;

fn write_json(root: &Path, relative: &str, value: &Value) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("fixture path has a parent"))
        .expect("should create fixture directories");
    fs::write(&path, value.to_string()).expect("should write fixture file");
}

fn two_card_fixture(root: &Path) {
    write_json(
        root,
        "pack/core/core.json",
        &json!([
            {
                "code": "01001",
                "name": "Roland Banks",
                "text": "[reaction] After you defeat an enemy: Discover 1 clue.",
                "back_text": "Deck Size: 30."
            },
            {
                "code": "01020",
                "name": "Machete",
                "text": "[action]: <b>Fight.</b> You get +1 [combat] for this attack."
            }
        ]),
    );
    write_json(
        root,
        "translations/it/pack/core/core.json",
        &json!([
            {
                "code": "01001",
                "name": "Roland Banks",
                "text": "[reaction] Dopo che hai sconfitto un nemico: Scopri 1 indizio.",
                "back_text": "Dimensione del Mazzo: 30."
            }
        ]),
    );
    write_json(
        root,
        "translations/fr/pack/core/core.json",
        &json!([
            {
                "code": "01020",
                "name": "Machette",
                "text": "[action] : <b>Combat.</b> Vous obtenez +1 [combat] pour cette attaque."
            }
        ]),
    );
}

#[test]
fn front_text_falls_back_to_real_text() {
    let card = RawCard {
        code: Some("02001".to_string()),
        text: Some("   ".to_string()),
        real_text: Some(" Fast. ".to_string()),
        ..RawCard::default()
    };
    assert_eq!(card.front_text(), Some("Fast."));
    assert_eq!(card.back_text(), None);

    let blank = RawCard {
        code: Some("02002".to_string()),
        ..RawCard::default()
    };
    assert_eq!(blank.front_text(), None);
}

#[test]
fn canonical_loading_extracts_both_sides() {
    let temp_dir = TempDir::new().expect("should create TempDir");
    two_card_fixture(temp_dir.path());

    let corpus = CorpusLoader::new(temp_dir.path())
        .load_canonical()
        .expect("should load canonical cards");

    assert_eq!(corpus.cards_read, 2);
    assert_eq!(corpus.skipped, 0);
    assert_eq!(corpus.sides.len(), 3);
    assert_eq!(corpus.sides[0].code, "01001");
    assert_eq!(corpus.sides[0].side, Side::Front);
    assert_eq!(corpus.sides[1].side, Side::Back);
    assert_eq!(corpus.sides[1].english_text, "Deck Size: 30.");
}

#[test]
fn empty_codes_and_textless_cards_are_skipped() {
    let temp_dir = TempDir::new().expect("should create TempDir");
    write_json(
        temp_dir.path(),
        "pack/core/core.json",
        &json!([
            { "code": "", "name": "Nameless", "text": "Something." },
            { "name": "No code", "text": "Something else." },
            { "code": "01010", "name": "Blank card" },
            { "code": "01011", "name": "Real", "text": "Revelation - Lose 1 action." }
        ]),
    );

    let corpus = CorpusLoader::new(temp_dir.path())
        .load_canonical()
        .expect("should load canonical cards");

    assert_eq!(corpus.cards_read, 4);
    assert_eq!(corpus.skipped, 3);
    assert_eq!(corpus.sides.len(), 1);
    assert_eq!(corpus.sides[0].code, "01011");
}

#[test]
fn malformed_files_do_not_abort_loading() {
    let temp_dir = TempDir::new().expect("should create TempDir");
    two_card_fixture(temp_dir.path());
    let broken = temp_dir.path().join("pack/broken/broken.json");
    fs::create_dir_all(broken.parent().expect("has parent")).expect("should create dir");
    fs::write(&broken, "{ not json").expect("should write broken file");
    fs::write(temp_dir.path().join("pack/core/notes.txt"), "ignored").expect("should write");

    let corpus = CorpusLoader::new(temp_dir.path())
        .load_canonical()
        .expect("should load despite malformed file");
    assert_eq!(corpus.sides.len(), 3);
}

#[test]
fn missing_pack_directory_is_an_error() {
    let temp_dir = TempDir::new().expect("should create TempDir");
    let result = CorpusLoader::new(temp_dir.path()).load_canonical();
    assert!(result.is_err());
}

#[test]
fn missing_language_yields_empty_pack() {
    let temp_dir = TempDir::new().expect("should create TempDir");
    two_card_fixture(temp_dir.path());

    let pack = CorpusLoader::new(temp_dir.path())
        .load_translations(Language::De)
        .expect("should tolerate missing language");
    assert!(pack.is_empty());
}

#[test]
fn later_translation_files_win_and_blanks_never_overwrite() {
    let temp_dir = TempDir::new().expect("should create TempDir");
    write_json(
        temp_dir.path(),
        "translations/es/pack/a_first/a.json",
        &json!([{ "code": "01020", "name": "Machete", "text": "vieja", "back_text": "dorso" }]),
    );
    write_json(
        temp_dir.path(),
        "translations/es/pack/b_second/b.json",
        &json!([{ "code": "01020", "name": "", "text": "nueva", "back_text": "  " }]),
    );

    let pack = CorpusLoader::new(temp_dir.path())
        .load_translations(Language::Es)
        .expect("should load translations");
    let card = pack.get("01020").expect("card is translated");

    assert_eq!(card.name.as_deref(), Some("Machete"));
    assert_eq!(card.text.as_deref(), Some("nueva"));
    assert_eq!(card.back_text.as_deref(), Some("dorso"));
}

#[test]
fn reconciliation_drops_ungrounded_faces() {
    let temp_dir = TempDir::new().expect("should create TempDir");
    two_card_fixture(temp_dir.path());
    write_json(
        temp_dir.path(),
        "pack/core/extra.json",
        &json!([{ "code": "01099", "name": "Untranslated", "text": "Nobody translated me." }]),
    );

    let loader = CorpusLoader::new(temp_dir.path());
    let corpus = loader.load_canonical().expect("should load canonical");
    let translations = loader
        .load_all_translations()
        .expect("should load translations");
    let result = reconcile(&corpus.sides, &translations);

    assert_eq!(result.entries.len(), 3);
    assert_eq!(result.untranslated, 1);
    assert!(result.entries.iter().all(|e| !e.translations.is_empty()));

    let machete = result
        .entries
        .iter()
        .find(|e| e.code == "01020")
        .expect("Machete is grounded in French");
    assert!(!machete.translations.contains_key(&Language::It));
    assert!(machete.translations.contains_key(&Language::Fr));

    let roland_back = result
        .entries
        .iter()
        .find(|e| e.code == "01001" && e.side == Side::Back)
        .expect("Roland's back is translated");
    assert_eq!(
        roland_back.translations.get(&Language::It).map(String::as_str),
        Some("Dimensione del Mazzo: 30.")
    );
}

#[test]
fn reconciliation_keeps_first_reprint() {
    let english = vec![
        EnglishSide {
            code: "01020".to_string(),
            name: "Machete".to_string(),
            side: Side::Front,
            english_text: "first printing".to_string(),
        },
        EnglishSide {
            code: "01020".to_string(),
            name: "Machete".to_string(),
            side: Side::Front,
            english_text: "reprint".to_string(),
        },
    ];
    let mut it = TranslationPack::new();
    it.insert(
        "01020".to_string(),
        TranslatedCard {
            text: Some("prima".to_string()),
            ..TranslatedCard::default()
        },
    );
    let translations = BTreeMap::from([(Language::It, it)]);

    let result = reconcile(&english, &translations);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].english_text, "first printing");
    assert_eq!(result.duplicates, 1);
    assert_eq!(result.skipped(), 1);
}

#[test]
fn reconciliation_is_independent_of_creation_order() {
    let forward = TempDir::new().expect("should create TempDir");
    let backward = TempDir::new().expect("should create TempDir");

    let files = [
        ("pack/core/core.json", json!([{ "code": "01001", "name": "A", "text": "alpha" }])),
        ("pack/dunwich/dwl.json", json!([{ "code": "02001", "name": "B", "text": "beta" }])),
        ("translations/it/pack/core/core.json", json!([{ "code": "01001", "text": "alfa" }])),
        ("translations/it/pack/dunwich/dwl.json", json!([{ "code": "02001", "text": "beta-it" }])),
        ("translations/de/pack/core/core.json", json!([{ "code": "02001", "text": "beta-de" }])),
    ];

    for (path, value) in &files {
        write_json(forward.path(), path, value);
    }
    for (path, value) in files.iter().rev() {
        write_json(backward.path(), path, value);
    }

    let run = |root: &Path| {
        let loader = CorpusLoader::new(root);
        let corpus = loader.load_canonical().expect("should load canonical");
        let translations = loader
            .load_all_translations()
            .expect("should load translations");
        reconcile(&corpus.sides, &translations)
    };

    assert_eq!(run(forward.path()), run(backward.path()));
}
