use super::*;

#[test]
fn nearest_query_filters_on_the_language_column() {
    let sql = nearest_sql(Language::Fr);

    assert!(sql.contains("fr_text AS translated_text"));
    assert!(sql.contains("fr_text IS NOT NULL"));
    assert!(sql.contains("embedding IS NOT NULL"));
    assert!(sql.contains("ORDER BY embedding <=> $1"));
    assert!(sql.contains("LIMIT $2"));
    assert!(!sql.contains("it_text"));
}

#[test]
fn insert_binds_every_language_column() {
    let sql = insert_sql();

    assert!(sql.contains(
        "(card_code, card_name, is_back, english_text, it_text, fr_text, de_text, es_text, embedding)"
    ));
    assert!(sql.contains("$9"));
    assert!(!sql.contains("$10"));
}

#[test]
fn schema_uses_configured_dimension_and_cosine_index() {
    let statements = schema_statements(1536);

    assert_eq!(statements[0], "CREATE EXTENSION IF NOT EXISTS vector");
    assert!(statements[1].contains("embedding vector(1536)"));
    assert!(statements[1].contains("es_text TEXT,"));
    assert!(statements[1].contains("is_back BOOLEAN NOT NULL DEFAULT FALSE"));
    assert!(statements[2].contains("ivfflat (embedding vector_cosine_ops)"));
    assert!(statements[2].contains("lists = 100"));
    assert!(statements.iter().all(|s| s.contains("IF NOT EXISTS")));
    assert_eq!(statements.len(), 6);

    assert!(schema_statements(3)[1].contains("embedding vector(3)"));
}

#[test]
fn coverage_counts_each_language() {
    let sql = coverage_sql();

    assert!(sql.starts_with("SELECT COUNT(*) AS total"));
    for language in Language::ALL {
        assert!(sql.contains(&format!("COUNT({0}) AS {0}", language.column())));
    }
    assert!(sql.contains("MAX(created_at) AS last_inserted_at"));
}
