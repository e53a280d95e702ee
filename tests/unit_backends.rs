//! Unit tests for the predicate, SQL and bitwise SQL backends

use varql::ast::QueryNode;
use varql::attributes::{Category, Role, Sex, VariantType};
use varql::backend::{BitmaskMatcher, BitwiseSqlCompiler, Matcher, SqlCompiler, Subject};
use varql::convert::{CategoryConverter, Identity};
use varql::dialect::Dialect;
use varql::transform::compile;
use varql::QueryError;

fn s(v: &str) -> String {
    v.to_string()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn matcher(query: &str) -> Matcher<String> {
    Matcher::new(compile(query, &Identity).unwrap())
}

fn sql(query: &str) -> String {
    let d = Dialect::default();
    SqlCompiler::new("effect_types", &d).compile(&compile(query, &Identity).unwrap())
}

fn bitwise<C: Category>(query: &str) -> Result<String, QueryError> {
    let d = Dialect::default();
    let tree = compile(query, &CategoryConverter::<C>::new())?;
    BitwiseSqlCompiler::new("col", &d).compile_categories(&tree)
}

// ============================================================================
// Predicate backend
// ============================================================================

#[test]
fn test_predicate_membership() {
    let m = matcher("missense and not synonymous");
    assert!(m.matches_values(&strings(&["missense", "intron"])));
    assert!(!m.matches_values(&strings(&["missense", "synonymous"])));
    assert!(!m.matches_values(&[]));
}

#[test]
fn test_predicate_eq_is_set_equality() {
    let m = matcher("eq(a, b)");
    assert!(m.matches_values(&strings(&["b", "a"])));
    assert!(m.matches_values(&strings(&["a", "b", "a"])));
    assert!(!m.matches_values(&strings(&["a"])));
    assert!(!m.matches_values(&strings(&["a", "b", "c"])));

    // any(a, b) accepts a single match where eq does not
    assert!(matcher("any(a, b)").matches_values(&strings(&["a"])));
}

#[test]
fn test_predicate_element_of() {
    let m = Matcher::new(QueryNode::ElementOf(strings(&["a", "b"])));
    assert!(m.matches_value(&s("a")));
    assert!(!m.matches_value(&s("c")));
    assert!(m.matches_values(&strings(&["a", "b"])));
    assert!(!m.matches_values(&strings(&["a", "c"])));
    assert!(!m.matches_values(&[]));
    assert!(!Matcher::new(QueryNode::<String>::ElementOf(vec![])).matches_value(&s("a")));
}

#[test]
fn test_predicate_comparisons() {
    let m = matcher("> 0.5 and <= 2");
    assert!(m.matches_number(1.0));
    assert!(m.matches_number(2.0));
    assert!(!m.matches_number(0.5));
    assert!(!m.matches_number(2.5));
    assert!(!m.matches(&Subject::Item(&s("1"))));
    assert!(matcher("not < 0").matches_number(0.0));
}

#[test]
fn test_predicate_over_categories() {
    let tree = compile("prb or sib", &CategoryConverter::<Role>::new()).unwrap();
    let m = Matcher::new(tree);
    assert!(m.matches_values(&[Role::Mom, Role::Sib]));
    assert!(!m.matches_values(&[Role::Mom, Role::Dad]));
    assert!(format!("{m:?}").contains("Matcher"));
}

#[test]
fn test_bitmask_matcher() {
    let tree = compile("any(mom, dad) and not prb", &CategoryConverter::<Role>::new()).unwrap();
    let m = BitmaskMatcher::from_categories(&tree).unwrap();
    assert!(m.matches(Role::Mom.bits() | Role::Sib.bits()));
    assert!(!m.matches(Role::Mom.bits() | Role::Prb.bits()));
    assert!(!m.matches(Role::Sib.bits()));

    let eq = BitmaskMatcher::new(QueryNode::Equals(vec![1, 2])).unwrap();
    assert!(eq.matches(3));
    assert!(!eq.matches(1));
    assert!(!eq.matches(7));
}

// ============================================================================
// SQL backend
// ============================================================================

#[test]
fn test_sql_basic_forms() {
    assert_eq!(sql("missense"), "effect_types = 'missense'");
    assert_eq!(sql("not missense"), "NOT (effect_types = 'missense')");
    assert_eq!(
        sql("a or b and c"),
        "(effect_types = 'a' OR (effect_types = 'b' AND effect_types = 'c'))"
    );
    assert_eq!(sql("eq(a)"), "effect_types = 'a'");
    assert_eq!(sql("eq(a, b)"), "(effect_types = 'a' AND effect_types = 'b')");
}

#[test]
fn test_sql_comparisons_keep_direction() {
    assert_eq!(sql("> 0.5"), "effect_types > 0.5");
    assert_eq!(sql("< 3"), "effect_types < 3");
    assert_eq!(sql(">= 1"), "effect_types >= 1");
    assert_eq!(sql("<= -2.5"), "effect_types <= -2.5");
}

#[test]
fn test_sql_escapes_and_quotes_identifiers() {
    let d = Dialect::default();
    let c = SqlCompiler::new("position", &d);
    assert_eq!(c.column(), "`position`");
    assert_eq!(c.compile(&QueryNode::Contains(s("5'UTR"))), r"`position` = '5\'UTR'");

    let ansi = Dialect::ansi();
    let c = SqlCompiler::new("x", &ansi);
    assert_eq!(c.compile(&QueryNode::Contains(s("5'UTR"))), "x = '5''UTR'");
}

#[test]
fn test_sql_in_list() {
    let d = Dialect::default();
    let c = SqlCompiler::new("family_id", &d);
    assert_eq!(c.in_list(&strings(&["f1", "f2"])), "family_id IN ('f1', 'f2')");
    assert_eq!(c.in_list::<String>(&[]), "family_id IS NULL");
    assert_eq!(c.compile(&QueryNode::ElementOf(vec![1u64, 2])), "family_id IN (1, 2)");
}

// ============================================================================
// Bitwise SQL backend
// ============================================================================

#[test]
fn test_bitwise_forms() {
    assert_eq!(bitwise::<Sex>("male").unwrap(), "(BITAND(col, 1) != 0)");
    assert_eq!(bitwise::<Sex>("not F").unwrap(), "(NOT ((BITAND(col, 2) != 0)))");
    assert_eq!(
        bitwise::<Sex>("male or female").unwrap(),
        "((BITAND(col, 1) != 0)) OR ((BITAND(col, 2) != 0))"
    );
    assert_eq!(
        bitwise::<Sex>("M and F and U").unwrap(),
        "(((BITAND(col, 1) != 0)) AND ((BITAND(col, 2) != 0))) AND ((BITAND(col, 4) != 0))"
    );
    assert_eq!(bitwise::<Sex>("eq(male, female)").unwrap(), "(col = 3)");
}

#[test]
fn test_bitwise_empty_element_of() {
    let d = Dialect::default();
    let c = BitwiseSqlCompiler::new("variant_type", &d);
    assert_eq!(c.compile(&QueryNode::ElementOf(vec![])).unwrap(), "variant_type IS NULL");
}

#[test]
fn test_bitwise_variant_type_aliases() {
    assert_eq!(
        bitwise::<VariantType>("any(sub, CNV+)").unwrap(),
        "((BITAND(col, 1) != 0)) OR ((BITAND(col, 16) != 0))"
    );
}

#[test]
fn test_bitwise_ansi_operator() {
    let d = Dialect::ansi();
    let c = BitwiseSqlCompiler::new("col", &d);
    assert_eq!(c.compile(&QueryNode::Contains(4)).unwrap(), "((col & 4) != 0)");
}

#[test]
fn test_bitwise_rejects_comparisons() {
    for query in ["> 1", "prb and < 2", "not >= 0", "prb or <= 3"] {
        match bitwise::<Role>(query) {
            Err(QueryError::Unsupported { backend, operation }) => {
                assert_eq!(backend, "bitwise SQL");
                assert!(operation.starts_with("comparison"), "{operation}");
            }
            other => panic!("{query:?}: expected unsupported, got {other:?}"),
        }
    }
    assert!(BitmaskMatcher::new(QueryNode::GreaterThanEq(1.0)).is_err());
}

#[test]
fn test_bitwise_unknown_token() {
    assert!(matches!(
        bitwise::<Role>("prb or grandchild"),
        Err(QueryError::Conversion { kind: "role", .. })
    ));
}
