use hm_gcp::{analyze, AnalysisConfig};
use pretty_assertions::assert_eq;

fn type_and_value(source: &str) -> (String, String) {
    let result = analyze(source, &AnalysisConfig::default()).unwrap();
    assert!(!result.has_errors, "{} has errors: {}", source, result.program_type);
    (result.program_type, result.program_value)
}

#[test]
fn test_add_constants() {
    assert_eq!(type_and_value("(+ 2 3)"), ("int64".to_string(), "5".to_string()));
}

#[test]
fn test_mul_through_parameter() {
    let (ty, value) = type_and_value("f = {x -> (* x 2)}; (f 7)");
    assert_eq!(ty, "int64");
    assert_eq!(value, "14");
}

#[test]
fn test_eq_of_equal_constants() {
    assert_eq!(type_and_value("(eq 1 1)"), ("bool".to_string(), "1".to_string()));
}

#[test]
fn test_eq0_of_nonzero() {
    assert_eq!(type_and_value("(eq0 5)"), ("bool".to_string(), "0".to_string()));
}

#[test]
fn test_isempty_of_empty_string() {
    assert_eq!(type_and_value("(isempty \"\")"), ("bool".to_string(), "1".to_string()));
}

#[test]
fn test_triple_type() {
    let (ty, _) = type_and_value("(triple 1 \"a\" 2)");
    assert_eq!(ty, "( int64, *str, int64 )");
}

#[test]
fn test_pair_instances_are_distinct_sites() {
    let result = analyze("(pair (pair 1 2) 3)", &AnalysisConfig::default()).unwrap();
    assert_eq!(result.program_type, "( ( int64, int64 ), int64 )");
    assert!(result.program_value.starts_with("*[1]"), "{}", result.program_value);
    assert!(result.program_value.contains("*[2]"), "{}", result.program_value);
}
