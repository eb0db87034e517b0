use super::*;
use crate::commands::{describe_error, exit_code};
use libdockyard::DockyardError;

#[test]
fn test_parse_library_image() {
    let parsed = parse_reference("nginx").unwrap();
    assert_eq!(parsed.registry, "registry-1.docker.io");
    assert_eq!(parsed.repository, "library/nginx");
    assert_eq!(parsed.tag.as_deref(), Some("latest"));
    assert_eq!(parsed.digest, None);
    assert_eq!(parsed.canonical, "registry-1.docker.io/library/nginx:latest");
}

#[test]
fn test_parse_self_hosted_digest() {
    let digest = "sha256:2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae";
    let parsed = parse_reference(&format!("gitlab.example.com/group/app@{}", digest)).unwrap();
    assert_eq!(parsed.registry, "gitlab.example.com");
    assert_eq!(parsed.repository, "group/app");
    assert_eq!(parsed.tag, None);
    assert_eq!(parsed.digest.as_deref(), Some(digest));
}

#[test]
fn test_ambiguous_reference_lists_candidates() {
    let err = parse_reference("localhost/app:1.0").unwrap_err();
    assert!(matches!(err, DockyardError::AmbiguousReference { .. }));

    let err = describe_error(&err);
    assert!(err.contains("ambiguous"));
    assert!(err.contains("localhost/app:1.0"));
    assert!(err.contains("registry-1.docker.io/localhost/app:1.0"));
}

#[test]
fn test_unparseable_reference() {
    let err = parse_reference("UPPER CASE").unwrap_err();
    assert!(describe_error(&err).contains("Cannot parse"));
}

#[test]
fn test_malformed_references_exit_with_usage_status() {
    let unparseable = parse_reference("UPPER CASE").unwrap_err();
    let ambiguous = parse_reference("localhost/app").unwrap_err();
    assert_eq!(exit_code(&unparseable), 2);
    assert_eq!(exit_code(&ambiguous), 2);

    let rejected = DockyardError::authentication("token request denied", Some(403));
    assert_eq!(exit_code(&rejected), 1);
}

#[test]
fn test_pretty_output() {
    let parsed = parse_reference("user/image:1.0.0").unwrap();
    let output = format::format_output(&parsed, OutputFormat::Pretty, false).unwrap();
    assert!(output.starts_with("✓ registry-1.docker.io/user/image:1.0.0"));
    assert!(output.contains("Repository: user/image"));
    assert!(output.contains("Tag:        1.0.0"));
    assert!(!output.contains("Digest"));
}

#[test]
fn test_json_output_omits_missing_digest() {
    let parsed = parse_reference("user/image:1.0.0").unwrap();
    let output = format::format_output(&parsed, OutputFormat::Json, false).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["input"], "user/image:1.0.0");
    assert_eq!(json["tag"], "1.0.0");
    assert!(json.get("digest").is_none());
}
