use super::*;

fn entry(parent: &str, name: &str, is_dir: bool) -> DirEntry {
    DirEntry {
        name: name.to_string(),
        path: PathBuf::from(parent).join(name),
        is_dir,
    }
}

fn names(tree: &WorkspaceTree, id: NodeId) -> Vec<String> {
    tree.children(id)
        .unwrap()
        .iter()
        .map(|c| tree.name(*c).unwrap().to_string())
        .collect()
}

fn loaded_root(entries: Vec<DirEntry>) -> WorkspaceTree {
    let mut tree = WorkspaceTree::new(PathBuf::from("/ws"));
    let root = tree.root();
    assert_eq!(
        tree.begin_expand(root).unwrap(),
        ExpandStep::List(PathBuf::from("/ws"))
    );
    assert!(tree.finish_load(root, Ok(entries)).unwrap());
    tree
}

#[test]
fn new_root_is_unloaded_and_collapsed() {
    let tree = WorkspaceTree::new(PathBuf::from("/ws/notes"));
    let root = tree.node(tree.root()).unwrap();

    assert_eq!(root.name, "notes");
    assert!(root.is_dir);
    assert!(root.children.is_none());
    assert!(!root.expanded);
    assert_eq!(root.load_state, LoadState::Unloaded);
}

#[test]
fn listing_sorts_directories_first_then_case_sensitive() {
    let tree = loaded_root(vec![
        entry("/ws", "b.md", false),
        entry("/ws", "A", true),
        entry("/ws", "a.md", false),
    ]);

    assert_eq!(names(&tree, tree.root()), ["A", "a.md", "b.md"]);
}

#[test]
fn sort_is_byte_wise_within_each_group() {
    let mut entries = vec![
        entry("/ws", "zeta", true),
        entry("/ws", "Beta.md", false),
        entry("/ws", "Alpha", true),
        entry("/ws", "alpha.md", false),
        entry("/ws", "beta", true),
    ];
    sort_entries(&mut entries);
    let order: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(order, ["Alpha", "beta", "zeta", "Beta.md", "alpha.md"]);
}

#[test]
fn listing_hides_os_noise() {
    let tree = loaded_root(vec![
        entry("/ws", ".DS_Store", false),
        entry("/ws", ".git", true),
        entry("/ws", "note.md", false),
    ]);
    assert_eq!(names(&tree, tree.root()), ["note.md"]);
}

#[test]
fn second_expand_toggles_without_listing() {
    let mut tree = loaded_root(vec![entry("/ws", "a.md", false)]);
    let root = tree.root();
    assert!(tree.is_expanded(root));

    assert_eq!(
        tree.begin_expand(root).unwrap(),
        ExpandStep::Toggled { expanded: false }
    );
    assert_eq!(
        tree.begin_expand(root).unwrap(),
        ExpandStep::Toggled { expanded: true }
    );
    assert_eq!(tree.load_state(root), Some(LoadState::Loaded));
}

#[test]
fn expand_while_loading_is_in_flight() {
    let mut tree = WorkspaceTree::new(PathBuf::from("/ws"));
    let root = tree.root();
    assert!(matches!(tree.begin_expand(root).unwrap(), ExpandStep::List(_)));
    assert_eq!(tree.load_state(root), Some(LoadState::Loading));
    assert_eq!(tree.begin_expand(root).unwrap(), ExpandStep::InFlight);
}

#[test]
fn failed_listing_keeps_previous_children() {
    let mut tree = loaded_root(vec![entry("/ws", "keep.md", false)]);
    let root = tree.root();

    tree.refresh(root).unwrap();
    assert!(matches!(tree.begin_expand(root).unwrap(), ExpandStep::List(_)));
    let err = tree
        .finish_load(root, Err(FileError::PermissionDenied(PathBuf::from("/ws"))))
        .unwrap_err();

    assert!(matches!(err, TreeError::Io(FileError::PermissionDenied(_))));
    assert_eq!(tree.load_state(root), Some(LoadState::LoadFailed));
    assert_eq!(names(&tree, root), ["keep.md"]);

    // A failed node is retried on the next expand.
    assert!(matches!(tree.begin_expand(root).unwrap(), ExpandStep::List(_)));
}

#[test]
fn first_failed_listing_leaves_children_unloaded() {
    let mut tree = WorkspaceTree::new(PathBuf::from("/ws"));
    let root = tree.root();
    tree.begin_expand(root).unwrap();
    assert!(tree
        .finish_load(root, Err(FileError::NotFound(PathBuf::from("/ws"))))
        .is_err());
    assert!(tree.children(root).is_none());
    assert!(!tree.is_expanded(root));
}

#[test]
fn refresh_marks_unloaded_and_relisting_keeps_surviving_ids() {
    let mut tree = loaded_root(vec![
        entry("/ws", "docs", true),
        entry("/ws", "old.md", false),
    ]);
    let root = tree.root();
    let docs = tree.find_node_by_path(Path::new("/ws/docs")).unwrap();
    let old = tree.find_node_by_path(Path::new("/ws/old.md")).unwrap();

    tree.refresh(root).unwrap();
    assert_eq!(tree.load_state(root), Some(LoadState::Unloaded));
    assert!(!tree.is_expanded(root));

    tree.begin_expand(root).unwrap();
    tree.finish_load(
        root,
        Ok(vec![entry("/ws", "docs", true), entry("/ws", "x.md", false)]),
    )
    .unwrap();

    assert_eq!(names(&tree, root), ["docs", "x.md"]);
    assert_eq!(tree.find_node_by_path(Path::new("/ws/docs")), Some(docs));
    assert!(tree.node(old).is_none());
    assert!(tree.find_node_by_path(Path::new("/ws/old.md")).is_none());
}

#[test]
fn entry_that_changed_kind_gets_a_new_id() {
    let mut tree = loaded_root(vec![
        entry("/ws", "notes", false),
        entry("/ws", "keep.md", false),
    ]);
    let root = tree.root();
    let notes_file = tree.find_node_by_path(Path::new("/ws/notes")).unwrap();
    let keep = tree.find_node_by_path(Path::new("/ws/keep.md")).unwrap();

    tree.refresh(root).unwrap();
    tree.begin_expand(root).unwrap();
    tree.finish_load(
        root,
        Ok(vec![entry("/ws", "notes", true), entry("/ws", "keep.md", false)]),
    )
    .unwrap();

    let notes_dir = tree.find_node_by_path(Path::new("/ws/notes")).unwrap();
    assert_ne!(notes_dir, notes_file);
    assert!(tree.is_dir(notes_dir));
    assert!(tree.node(notes_file).is_none());
    assert_eq!(tree.find_node_by_path(Path::new("/ws/keep.md")), Some(keep));
}

#[test]
fn stale_listing_after_refresh_is_dropped() {
    let mut tree = WorkspaceTree::new(PathBuf::from("/ws"));
    let root = tree.root();
    tree.begin_expand(root).unwrap();
    tree.refresh(root).unwrap();

    let applied = tree
        .finish_load(root, Ok(vec![entry("/ws", "a.md", false)]))
        .unwrap();
    assert!(!applied);
    assert!(tree.children(root).is_none());
}

#[test]
fn files_cannot_be_expanded_or_refreshed() {
    let mut tree = loaded_root(vec![entry("/ws", "a.md", false)]);
    let file = tree.find_node_by_path(Path::new("/ws/a.md")).unwrap();

    assert!(matches!(
        tree.begin_expand(file),
        Err(TreeError::NotADirectory(_))
    ));
    assert!(tree.refresh(file).is_err());
}

#[test]
fn collapse_keeps_children_in_memory() {
    let mut tree = loaded_root(vec![entry("/ws", "a.md", false)]);
    let root = tree.root();
    tree.collapse(root);
    assert!(!tree.is_expanded(root));
    assert_eq!(names(&tree, root), ["a.md"]);
    assert_eq!(
        tree.begin_expand(root).unwrap(),
        ExpandStep::Toggled { expanded: true }
    );
}

#[test]
fn flatten_for_view_follows_expansion() {
    let mut tree = loaded_root(vec![
        entry("/ws", "file1.md", false),
        entry("/ws", "subdir", true),
    ]);
    let subdir = tree.find_node_by_path(Path::new("/ws/subdir")).unwrap();

    let rows = tree.flatten_for_view();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].is_dir);
    assert_eq!(rows[0].depth, 0);

    tree.begin_expand(subdir).unwrap();
    tree.finish_load(subdir, Ok(vec![entry("/ws/subdir", "file2.md", false)]))
        .unwrap();

    let rows = tree.flatten_for_view();
    let order: Vec<(&str, u16)> = rows.iter().map(|r| (r.name.as_str(), r.depth)).collect();
    assert_eq!(order, [("subdir", 0), ("file2.md", 1), ("file1.md", 0)]);
}

#[test]
fn removing_selected_node_moves_selection_to_parent() {
    let mut tree = loaded_root(vec![entry("/ws", "gone.md", false)]);
    let root = tree.root();
    let gone = tree.find_node_by_path(Path::new("/ws/gone.md")).unwrap();
    tree.set_selected(Some(gone));

    tree.refresh(root).unwrap();
    tree.begin_expand(root).unwrap();
    tree.finish_load(root, Ok(Vec::new())).unwrap();

    assert_eq!(tree.selected(), Some(root));
}
