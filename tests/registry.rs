//! The keyword/macro registry: disjoint namespaces, collision detection, and
//! bare-identifier resolution.

use molselect::registry::{FieldType, KeywordEntry, MacroEntry, Registry, Resolved};

#[test]
fn builtin_catalog_loads_without_collisions() {
    let reg = Registry::with_builtins();
    assert!(reg.iter_keywords().count() > 0);
    assert!(reg.iter_macros().count() > 0);
}

#[test]
fn registering_a_keyword_name_already_taken_by_a_keyword_fails() {
    let mut reg = Registry::new();
    reg.register_keyword(KeywordEntry::new("resid", FieldType::Int)).unwrap();
    let err = reg.register_keyword(KeywordEntry::new("resid", FieldType::Str)).unwrap_err();
    assert_eq!(err.name, "resid");
}

#[test]
fn a_keyword_synonym_cannot_collide_with_another_keywords_canonical_name() {
    let mut reg = Registry::new();
    reg.register_keyword(KeywordEntry::new("residue", FieldType::Int)).unwrap();
    let clashing = KeywordEntry::new("resid", FieldType::Int).with_synonyms(["residue"]);
    assert!(reg.register_keyword(clashing).is_err());
}

#[test]
fn keyword_and_macro_namespaces_are_disjoint() {
    let mut reg = Registry::new();
    reg.register_keyword(KeywordEntry::new("protein", FieldType::Int)).unwrap();
    let err = reg.register_macro(MacroEntry::new("protein", "resname ALA")).unwrap_err();
    assert_eq!(err.name, "protein");
}

#[test]
fn resolve_name_classifies_keywords_and_macros_distinctly() {
    let reg = Registry::with_builtins();
    assert!(matches!(reg.resolve_name("resid"), Some(Resolved::Keyword(_))));
    assert!(matches!(reg.resolve_name("protein"), Some(Resolved::Macro(_))));
    assert!(reg.resolve_name("not_a_real_name").is_none());
}

#[test]
fn resolve_name_follows_synonyms_to_the_canonical_entry() {
    let mut reg = Registry::new();
    reg.register_keyword(KeywordEntry::new("residue", FieldType::Int).with_synonyms(["resid", "resnum"])).unwrap();
    match reg.resolve_name("resnum") {
        Some(Resolved::Keyword(k)) => assert_eq!(k.name, "residue"),
        other => panic!("expected a keyword resolution, got {other:?}"),
    }
}

#[test]
fn is_reserved_covers_both_namespaces_and_all_synonyms() {
    let reg = Registry::with_builtins();
    assert!(reg.is_reserved("resid"));
    assert!(reg.is_reserved("protein"));
    assert!(!reg.is_reserved("totally_unregistered_name"));
}

#[test]
fn a_user_registered_keyword_is_usable_once_registered() {
    let mut reg = Registry::new();
    reg.register_keyword(KeywordEntry::new("occupancy", FieldType::Float)).unwrap();
    assert!(reg.keyword("occupancy").is_some());
    assert!(reg.keyword("nonexistent").is_none());
}
