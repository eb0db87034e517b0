use super::*;
use std::str::FromStr;

fn manifest(config_digest: &str) -> Manifest {
    Manifest {
        config_digest: Some(config_digest.to_string()),
        ..Manifest::default()
    }
}

fn key(reference: &str, credential: Option<&RegistryCredential>) -> ManifestKey {
    ManifestKey::new(&ImageReference::from_str(reference).unwrap(), credential)
}

#[test]
fn test_empty_memo_misses() {
    let memo = ManifestMemo::new();
    assert!(memo.get(&key("nginx", None)).is_none());
}

#[test]
fn test_hit_on_same_key() {
    let mut memo = ManifestMemo::new();
    memo.store(key("nginx:1.28", None), manifest("sha256:aaa"));

    let hit = memo.get(&key("nginx:1.28", None)).unwrap();
    assert_eq!(hit.config_digest.as_deref(), Some("sha256:aaa"));
}

#[test]
fn test_canonical_forms_share_a_key() {
    assert_eq!(
        key("nginx", None),
        key("registry-1.docker.io/library/nginx:latest", None)
    );
}

#[test]
fn test_miss_on_other_tag_or_credential() {
    let credential = RegistryCredential::oauth2("secret");
    let mut memo = ManifestMemo::new();
    memo.store(key("nginx:1.28", Some(&credential)), manifest("sha256:aaa"));

    assert!(memo.get(&key("nginx:1.29", Some(&credential))).is_none());
    assert!(memo.get(&key("nginx:1.28", None)).is_none());
    assert!(
        memo.get(&key("nginx:1.28", Some(&RegistryCredential::oauth2("other"))))
            .is_none()
    );
    assert!(memo.get(&key("nginx:1.28", Some(&credential))).is_some());
}

#[test]
fn test_store_replaces_previous_entry() {
    let mut memo = ManifestMemo::new();
    memo.store(key("nginx", None), manifest("sha256:aaa"));
    memo.store(key("alpine", None), manifest("sha256:bbb"));

    assert!(memo.get(&key("nginx", None)).is_none());
    assert_eq!(
        memo.get(&key("alpine", None)).unwrap().config_digest.as_deref(),
        Some("sha256:bbb")
    );
}

#[test]
fn test_key_does_not_hold_secret() {
    let credential = RegistryCredential::oauth2("hunter2");
    let rendered = format!("{:?}", key("nginx", Some(&credential)));
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains(&credential.fingerprint()));
}
