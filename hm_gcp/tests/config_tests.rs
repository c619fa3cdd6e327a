use hm_gcp::{analyze, AnalysisConfig, AnalysisError};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "seed = 5").unwrap();
    writeln!(file, "do_gcp = false").unwrap();
    let config = AnalysisConfig::from_file(file.path()).unwrap();
    assert_eq!(config.seed, 5);
    assert!(!config.do_gcp);
    assert!(config.do_hm);
    assert_eq!(config.max_iterations, AnalysisConfig::default().max_iterations);
}

#[test]
fn test_config_from_file_rejects_unknown_keys() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "sede = 5").unwrap();
    let err = AnalysisConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AnalysisError::Config(_)));
    assert!(err.to_string().starts_with("Invalid configuration"));
}

#[test]
fn test_loaded_config_drives_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis.toml");
    std::fs::write(&path, "max_iterations = 2\n").unwrap();
    let config = AnalysisConfig::from_file(&path).unwrap();
    let err = analyze("(pair 1 2)", &config).unwrap_err();
    assert_eq!(err.to_string(), "Fixed point did not settle within 2 iterations");
}
