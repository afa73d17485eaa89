use tempfile::tempdir;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn no_arguments_means_no_workspace() {
    let dir = tempdir().unwrap();
    let parsed = super::resolve_cli_args(dir.path(), args(&[])).unwrap();
    assert_eq!(parsed, super::CliArgs::default());
}

#[test]
fn workspace_is_resolved_against_cwd() {
    let dir = tempdir().unwrap();
    let cwd = dir.path();
    let workspace = cwd.join("notes");
    std::fs::create_dir_all(&workspace).unwrap();

    let parsed = super::resolve_cli_args(cwd, args(&["notes"])).unwrap();
    assert_eq!(parsed.workspace, Some(workspace));
}

#[test]
fn render_and_gallery_take_paths() {
    let dir = tempdir().unwrap();
    let cwd = dir.path();

    let parsed = super::resolve_cli_args(
        cwd,
        args(&["--render", "a.md", "--gallery", "/abs/pics"]),
    )
    .unwrap();
    assert!(parsed.workspace.is_none());
    assert_eq!(parsed.render, Some(cwd.join("a.md")));
    assert_eq!(parsed.gallery, Some(std::path::PathBuf::from("/abs/pics")));
}

#[test]
fn missing_workspace_is_not_found() {
    let dir = tempdir().unwrap();
    let err = super::resolve_cli_args(dir.path(), args(&["nope"])).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn file_as_workspace_is_rejected() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.md"), "x").unwrap();
    let err = super::resolve_cli_args(dir.path(), args(&["a.md"])).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}

#[test]
fn bad_options_are_rejected() {
    let dir = tempdir().unwrap();
    let cases: [&[&str]; 3] = [&["--render"], &["--verbose"], &[".", "."]];
    for bad in cases {
        let err = super::resolve_cli_args(dir.path(), args(bad)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
