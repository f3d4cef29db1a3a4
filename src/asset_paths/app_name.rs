/// Strip a leading application-name segment from a root-relative path.
///
/// Applications mounted under a virtual sub-path (`/testApp`) emit asset references that carry
/// the mount as their first segment, while the content root on disk does not. Only the first
/// segment is considered and the comparison ignores ASCII case, matching how request path bases
/// are compared. The remaining path always keeps its leading slash.
pub fn strip_app_name<'a>(path: &'a str, app_name: &str) -> Option<&'a str> {
    let app_name = app_name.trim_matches('/');
    if app_name.is_empty() {
        return None;
    }

    let rest = path.strip_prefix('/')?;
    let (first, remainder) = match rest.find('/') {
        Some(index) => (&rest[..index], &rest[index..]),
        None => (rest, ""),
    };

    if !first.eq_ignore_ascii_case(app_name) {
        return None;
    }

    Some(if remainder.is_empty() { "/" } else { remainder })
}
