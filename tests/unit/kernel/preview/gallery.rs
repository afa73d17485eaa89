use super::*;
use crate::kernel::services::ports::ErrorKind;
use crate::test_support::{runtime, MemoryFs};

#[test]
fn image_names_match_case_insensitively() {
    assert!(is_image_name("a.PNG"));
    assert!(is_image_name("b.jpeg"));
    assert!(is_image_name("c.Svg"));
    assert!(!is_image_name("notes.md"));
    assert!(!is_image_name("png"));
}

#[test]
fn gallery_loads_only_image_files_in_listing_order() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/b.png", vec![1u8]);
    fs.add_file("/ws/a.JPG", vec![2u8]);
    fs.add_file("/ws/readme.md", "# hi");
    fs.add_dir("/ws/pics.png");
    let assets = Arc::new(AssetLoader::new(fs.clone(), 16));
    let rt = runtime();

    let items = rt
        .block_on(gallery(fs.clone(), assets, Path::new("/ws")))
        .unwrap();
    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["a.JPG", "b.png"]);
    assert_eq!(
        items[0].status,
        BlockStatus::Ready("data:image/jpeg;base64,Ag==".to_string())
    );
    assert!(items[1].status.is_ready());
}

#[test]
fn unreadable_image_fails_alone() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/ok.gif", vec![1u8]);
    fs.add_file("/ws/locked.gif", vec![1u8]);
    fs.deny("/ws/locked.gif");
    let assets = Arc::new(AssetLoader::new(fs.clone(), 16));
    let rt = runtime();

    let items = rt
        .block_on(gallery(fs.clone(), assets, Path::new("/ws")))
        .unwrap();
    assert_eq!(items.len(), 2);
    match &items[0].status {
        BlockStatus::Failed(failure) => {
            assert_eq!(failure.kind, ErrorKind::PermissionDenied);
            assert_eq!(failure.fallback, "locked.gif");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(items[1].status.is_ready());
}

#[test]
fn listing_failure_is_returned() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    let assets = Arc::new(AssetLoader::new(fs.clone(), 16));
    let rt = runtime();

    let err = rt
        .block_on(gallery(fs.clone(), assets, Path::new("/missing")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
