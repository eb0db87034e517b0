use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_verbosity_from_count() {
    assert_eq!(VerbosityLevel::from_count(0), VerbosityLevel::Normal);
    assert_eq!(VerbosityLevel::from_count(1), VerbosityLevel::Verbose);
    assert_eq!(VerbosityLevel::from_count(2), VerbosityLevel::Debug);
    assert_eq!(VerbosityLevel::from_count(9), VerbosityLevel::Trace);
}

#[test]
fn test_verbosity_filter() {
    assert_eq!(VerbosityLevel::Normal.filter(), "warn");
    assert!(VerbosityLevel::Debug.filter().contains("libdockyard=debug"));
}

#[test]
fn test_build_with_explicit_config() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "network:\n  timeout: 3\n  deadline: 9").unwrap();

    let ctx = AppContext::build(
        Some(file.path()),
        ColorChoice::Never,
        VerbosityLevel::Normal,
    )
    .unwrap();

    assert_eq!(ctx.config.network.timeout, 3);
    assert_eq!(ctx.config.network.deadline, Some(9));
    assert!(!ctx.color);
}

#[test]
fn test_build_with_missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");

    let result = AppContext::build(Some(&missing), ColorChoice::Never, VerbosityLevel::Normal);
    assert!(result.is_err());
}

#[test]
fn test_default_config_path_name() {
    if let Some(path) = default_config_path() {
        assert!(path.ends_with("dockyard/config.yaml"));
    }
}
