use crate::credentials::{CredentialSource, FileCredentialSource, Secret};
use crate::tests::init_tracing;

#[test]
fn reads_and_trims_the_secret() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("password.txt");
    std::fs::write(&path, "hunter2\n").unwrap();

    let source = FileCredentialSource::new(&path);
    let secret = source.secret().unwrap().expect("secret should be present");
    assert_eq!(secret.expose(), "hunter2");
}

#[test]
fn absent_file_means_manual_login() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileCredentialSource::new(dir.path().join("missing.txt"));
    assert!(source.secret().unwrap().is_none());
}

#[test]
fn blank_file_means_manual_login() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("password.txt");
    std::fs::write(&path, "  \n\n").unwrap();

    let source = FileCredentialSource::new(&path);
    assert!(source.secret().unwrap().is_none());
}

#[test]
fn secret_debug_output_is_redacted() {
    let secret = Secret::new("hunter2");
    let rendered = format!("{secret:?}");
    assert!(!rendered.contains("hunter2"));
    assert_eq!(rendered, "Secret(***)");
}
