//! Unit tests for loading study catalogs

use std::io::Write;

use varql::catalog::{ColumnType, PedigreeIndex, PedigreeMember, StudyCatalog};
use varql::dialect::Dialect;
use varql::QueryError;

const MINIMAL: &str = r#"{
    "studies": {
        "s1": {
            "variants_table": "s1_variants",
            "schema": { "family_id": "string", "af_allele_freq": "float", "position": "int" }
        }
    }
}"#;

#[test]
fn test_defaults_fill_in() {
    let catalog = StudyCatalog::from_json(MINIMAL).unwrap();
    let study = catalog.study("s1").unwrap();
    assert_eq!(study.db, None);
    assert_eq!(study.properties.rare_boundary, 5.0);
    assert_eq!(study.properties.region_length, 0);
    assert_eq!(study.properties.family_bin_size, 0);
    assert!(study.pedigree.is_empty());
    assert_eq!(catalog.dialect, Dialect::impala());
    assert!(catalog.gene_models.transcripts("CHD8").is_none());
}

#[test]
fn test_schema_keeps_order_and_types() {
    let catalog = StudyCatalog::from_json(MINIMAL).unwrap();
    let schema = &catalog.study("s1").unwrap().schema;
    assert_eq!(
        schema.columns().collect::<Vec<_>>(),
        vec!["family_id", "af_allele_freq", "position"]
    );
    assert_eq!(schema.column_type("af_allele_freq"), Some(ColumnType::Float));
    assert!(schema.column_type("af_allele_freq").is_some_and(ColumnType::is_numeric));
    assert!(!ColumnType::String.is_numeric());
    assert!(!schema.has("frequency_bin"));
}

#[test]
fn test_unknown_study() {
    let catalog = StudyCatalog::from_json(MINIMAL).unwrap();
    match catalog.study("s2") {
        Err(QueryError::UnknownStudy(id)) => assert_eq!(id, "s2"),
        other => panic!("expected unknown study, got {other:?}"),
    }
}

#[test]
fn test_invalid_catalogs() {
    assert!(matches!(StudyCatalog::from_json("{"), Err(QueryError::Config(_))));
    assert!(matches!(
        StudyCatalog::from_json(r#"{"studies": {"s": {"variants_table": "", "schema": {}}}}"#),
        Err(QueryError::Config(_))
    ));
    assert!(matches!(
        StudyCatalog::from_json(
            r#"{"studies": {"s": {"variants_table": "t", "schema": {}, "properties": {"rare_boundary": -1}}}}"#
        ),
        Err(QueryError::Config(_))
    ));
    assert!(matches!(
        StudyCatalog::from_json(r#"{"studies": {"s": {"variants_table": "t", "schema": {"x": "decimal"}}}}"#),
        Err(QueryError::Config(_))
    ));
}

#[test]
fn test_ansi_dialect_from_json() {
    let json = r#"{
        "studies": {},
        "dialect": { "use_bit_and_function": false, "escape_quote_char": "'", "identifier_quote": "\"" }
    }"#;
    let catalog = StudyCatalog::from_json(json).unwrap();
    assert_eq!(catalog.dialect, Dialect::ansi());
}

#[test]
fn test_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();
    let catalog = StudyCatalog::from_path(file.path()).unwrap();
    assert_eq!(catalog.studies.len(), 1);

    let missing = file.path().with_extension("missing");
    assert!(matches!(StudyCatalog::from_path(missing), Err(QueryError::Io(_))));
}

#[test]
fn test_pedigree_index() {
    let members = vec![
        PedigreeMember {
            family_id: "f1".to_string(),
            person_id: "p1".to_string(),
            family_bin: Some(3),
        },
        PedigreeMember {
            family_id: "f1".to_string(),
            person_id: "p2".to_string(),
            family_bin: Some(3),
        },
        PedigreeMember {
            family_id: "f2".to_string(),
            person_id: "p3".to_string(),
            family_bin: Some(7),
        },
    ];
    let index = PedigreeIndex::from(members.clone());
    assert_eq!(index.len(), 3);
    assert!(index.has_family("f2"));
    assert!(!index.has_family("p1"));
    assert!(index.has_person("p1"));
    assert!(index.has_family_bins());

    let bins = index.family_bins(["f1", "nope"], ["p3"]);
    assert_eq!(bins.into_iter().collect::<Vec<_>>(), vec![3, 7]);

    let json = serde_json::to_string(&index).unwrap();
    let back: Vec<PedigreeMember> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, members);
}
