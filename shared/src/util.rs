/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 获取当前 UTC 时间戳（秒）
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Normalize a navigation path: leading slash, no trailing slash, no
/// duplicate separators, query and fragment stripped.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Split a location into its normalized path and the untouched
/// `?query#fragment` suffix
pub fn split_location(location: &str) -> (String, &str) {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    (normalize_path(&location[..end]), &location[end..])
}

/// Normalize the path part of a location, keeping its query and fragment
pub fn normalize_location(location: &str) -> String {
    let (path, suffix) = split_location(location);
    format!("{}{}", path, suffix)
}

/// Join a child path onto a parent; absolute children replace the parent
pub fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        normalize_path(child)
    } else {
        normalize_path(&format!("{}/{}", parent, child))
    }
}
