use super::*;

#[test]
fn test_get_log_dir() {
    let dir = get_log_dir();
    assert!(dir.is_some());
    let dir = dir.unwrap();
    assert!(dir.to_string_lossy().contains(APP_NAME));
    assert!(dir.to_string_lossy().contains(LOG_DIR));
}

#[test]
fn test_get_settings_path() {
    let path = get_settings_path().unwrap();
    assert!(path.to_string_lossy().contains(APP_NAME));
    assert!(path.ends_with(SETTINGS_FILE));
}
