/// Asset path split at its query string and fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetPathParts<'a> {
    /// Path portion used to locate the file.
    pub path: &'a str,
    /// Query string including the leading `?`, if any.
    pub query: Option<&'a str>,
    /// Fragment including the leading `#`, if any.
    pub fragment: Option<&'a str>,
}

/// Split `value` into path, query and fragment.
pub fn split_asset_path(value: &str) -> AssetPathParts<'_> {
    let (before_fragment, fragment) = match value.find('#') {
        Some(index) => (&value[..index], Some(&value[index..])),
        None => (value, None),
    };
    let (path, query) = match before_fragment.find('?') {
        Some(index) => (&before_fragment[..index], Some(&before_fragment[index..])),
        None => (before_fragment, None),
    };

    AssetPathParts {
        path,
        query,
        fragment,
    }
}

/// Append `key=value` to the query string of `path`.
///
/// The parameter joins an existing query with `&`, starts one with `?` otherwise, and is placed
/// ahead of any fragment so browsers still send it to the server.
pub fn append_query_parameter(path: &str, key: &str, value: &str) -> String {
    let (before_fragment, fragment) = match path.find('#') {
        Some(index) => (&path[..index], &path[index..]),
        None => (path, ""),
    };
    let separator = if before_fragment.contains('?') {
        '&'
    } else {
        '?'
    };

    format!("{before_fragment}{separator}{key}={value}{fragment}")
}
