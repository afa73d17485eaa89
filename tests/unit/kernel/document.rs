use super::*;
use crate::kernel::services::ports::ErrorKind;
use crate::test_support::{runtime, MemoryFs};

fn session_over(fs: &Arc<MemoryFs>) -> DocumentSession {
    let provider: Arc<dyn FileProvider> = fs.clone();
    DocumentSession::new(provider)
}

#[test]
fn starts_with_welcome_text_and_no_file() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    let mut doc = session_over(&fs);
    let rt = runtime();

    assert_eq!(doc.text(), "# Welcome\n\nSelect a file to edit or start typing.");
    assert!(doc.path().is_none());
    assert!(!doc.is_dirty());
    assert_eq!(rt.block_on(doc.save()), Err(DocumentError::NoFile));
}

#[test]
fn open_edit_save_round() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/a.md", "# A");
    let mut doc = session_over(&fs);
    let rt = runtime();

    rt.block_on(doc.open(Path::new("/ws/a.md"), OpenMode::KeepChanges))
        .unwrap();
    assert_eq!(doc.text(), "# A");
    assert!(!doc.is_dirty());

    doc.edit("# A\n\nmore");
    assert!(doc.is_dirty());
    rt.block_on(doc.save()).unwrap();
    assert!(!doc.is_dirty());
    assert_eq!(fs.contents("/ws/a.md").unwrap(), b"# A\n\nmore".to_vec());
}

#[test]
fn editing_back_to_saved_text_is_clean() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/a.md", "x");
    let mut doc = session_over(&fs);
    let rt = runtime();
    rt.block_on(doc.open(Path::new("/ws/a.md"), OpenMode::KeepChanges))
        .unwrap();

    doc.edit("xy");
    doc.edit("x");
    assert!(!doc.is_dirty());
}

#[test]
fn dirty_buffer_blocks_open_unless_discarding() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/a.md", "a");
    fs.add_file("/ws/b.md", "b");
    let mut doc = session_over(&fs);
    let rt = runtime();
    rt.block_on(doc.open(Path::new("/ws/a.md"), OpenMode::KeepChanges))
        .unwrap();
    doc.edit("changed");

    let err = rt
        .block_on(doc.open(Path::new("/ws/b.md"), OpenMode::KeepChanges))
        .unwrap_err();
    assert_eq!(
        err,
        DocumentError::UnsavedChanges(Some(PathBuf::from("/ws/a.md")))
    );
    assert_eq!(doc.text(), "changed");

    rt.block_on(doc.open(Path::new("/ws/b.md"), OpenMode::DiscardChanges))
        .unwrap();
    assert_eq!(doc.text(), "b");
    assert_eq!(doc.path(), Some(Path::new("/ws/b.md")));
}

#[test]
fn discard_restores_saved_text() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    let mut doc = session_over(&fs);
    doc.edit("scratch");
    assert!(doc.is_dirty());
    doc.discard();
    assert_eq!(doc.text(), WELCOME_TEXT);
}

#[test]
fn failed_open_keeps_buffer() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/bin.md", vec![0xffu8, 0xfe]);
    let mut doc = session_over(&fs);
    let rt = runtime();

    let err = rt
        .block_on(doc.open(Path::new("/ws/bin.md"), OpenMode::KeepChanges))
        .unwrap_err();
    match err {
        DocumentError::File(file) => assert_eq!(file.kind(), ErrorKind::DecodeError),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(doc.path().is_none());
    assert_eq!(doc.text(), WELCOME_TEXT);
}

#[test]
fn save_failure_keeps_dirty() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/a.md", "a");
    let mut doc = session_over(&fs);
    let rt = runtime();
    rt.block_on(doc.open(Path::new("/ws/a.md"), OpenMode::KeepChanges))
        .unwrap();
    doc.edit("b");
    fs.deny("/ws/a.md");

    let err = rt.block_on(doc.save()).unwrap_err();
    assert!(matches!(err, DocumentError::File(FileError::PermissionDenied(_))));
    assert!(doc.is_dirty());
}
