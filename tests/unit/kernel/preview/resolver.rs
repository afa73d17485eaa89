use super::*;

#[test]
fn relative_reference_joins_context_directory() {
    assert_eq!(
        resolve("img.png", Some(Path::new("/ws/notes/a.md"))),
        Resolved::Path(PathBuf::from("/ws/notes/img.png"))
    );
    assert_eq!(
        resolve("assets/diagram.svg", Some(Path::new("/ws/a.md"))),
        Resolved::Path(PathBuf::from("/ws/assets/diagram.svg"))
    );
}

#[test]
fn parent_segments_are_kept_verbatim() {
    assert_eq!(
        resolve("../shared/x.png", Some(Path::new("/ws/notes/a.md"))),
        Resolved::Path(PathBuf::from("/ws/notes/../shared/x.png"))
    );
}

#[test]
fn urls_pass_through_unchanged() {
    assert_eq!(
        resolve("http://x/y.png", Some(Path::new("/ws/a.md"))),
        Resolved::Url("http://x/y.png".to_string())
    );
    assert_eq!(
        resolve("data:image/png;base64,AAAA", None),
        Resolved::Url("data:image/png;base64,AAAA".to_string())
    );
}

#[test]
fn absolute_paths_pass_through_unchanged() {
    assert_eq!(
        resolve("/abs/pic.jpg", Some(Path::new("/ws/a.md"))),
        Resolved::Path(PathBuf::from("/abs/pic.jpg"))
    );
}

#[test]
fn missing_context_is_unresolved() {
    let resolved = resolve("img.png", None);
    assert_eq!(resolved, Resolved::Unresolved("img.png".to_string()));
    assert_eq!(resolved.display(), "img.png");
}

#[test]
fn drive_letters_are_not_urls() {
    assert!(!is_url("C:/pics/a.png"));
    assert!(is_url("https://example.com/a.png"));
    assert!(!is_url("img.png"));
}
