//! Versioning asset references inside generated markup.

use std::sync::OnceLock;

use regex::Regex;

use crate::configure::TagHelper;
use crate::version::{FileVersionProvider, VersionError};

fn asset_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<(?:script|link|img|source|audio|video|embed)\b[^>]*>")
            .expect("invalid asset tag regex")
    })
}

fn asset_attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)\s(?:src|href)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("invalid asset attribute regex")
    })
}

/// Append version tokens to the `src`/`href` attributes of asset elements in `html`.
///
/// Only `script`, `link`, `img`, `source`, `audio`, `video` and `embed` tags are touched. External
/// references and paths without a backing file are left exactly as written.
pub fn append_versions_to_markup(
    html: &str,
    versioner: &FileVersionProvider,
) -> Result<String, VersionError> {
    let mut output = String::with_capacity(html.len());
    let mut last = 0;

    for tag in asset_tag_pattern().find_iter(html) {
        output.push_str(&html[last..tag.start()]);
        output.push_str(&rewrite_tag(tag.as_str(), versioner)?);
        last = tag.end();
    }
    output.push_str(&html[last..]);

    Ok(output)
}

fn rewrite_tag(tag: &str, versioner: &FileVersionProvider) -> Result<String, VersionError> {
    let mut output = String::with_capacity(tag.len());
    let mut last = 0;

    for captures in asset_attribute_pattern().captures_iter(tag) {
        let Some(value) = captures.get(1).or_else(|| captures.get(2)) else {
            continue;
        };
        output.push_str(&tag[last..value.start()]);
        output.push_str(&versioner.add_version_to_file_path(value.as_str())?);
        last = value.end();
    }
    output.push_str(&tag[last..]);

    Ok(output)
}

/// Tag helper for an element referencing a static asset, such as `<script src>` or
/// `<link href>`.
#[derive(Debug, Clone)]
pub struct AssetTagHelper {
    element: String,
    /// Attribute holding the asset path.
    pub attribute: String,
    /// Asset path as written in the view.
    pub path: String,
    /// Whether [`AssetTagHelper::resolve`] appends the file version.
    pub append_version: bool,
}

impl AssetTagHelper {
    /// Helper for `<script src="...">`.
    pub fn script(path: impl Into<String>) -> Self {
        Self::new("script", "src", path)
    }

    /// Helper for `<link href="...">`.
    pub fn link(path: impl Into<String>) -> Self {
        Self::new("link", "href", path)
    }

    /// Helper for `<img src="...">`.
    pub fn image(path: impl Into<String>) -> Self {
        Self::new("img", "src", path)
    }

    fn new(element: &str, attribute: &str, path: impl Into<String>) -> Self {
        Self {
            element: element.to_string(),
            attribute: attribute.to_string(),
            path: path.into(),
            append_version: false,
        }
    }

    /// Final attribute value, versioned when [`AssetTagHelper::append_version`] is set.
    pub fn resolve(&self, versioner: &FileVersionProvider) -> Result<String, VersionError> {
        if !self.append_version {
            return Ok(self.path.clone());
        }
        versioner.add_version_to_file_path(&self.path)
    }

    /// Render the attribute as `name="value"`.
    pub fn render_attribute(
        &self,
        versioner: &FileVersionProvider,
    ) -> Result<String, VersionError> {
        let value = self.resolve(versioner)?;
        Ok(format!("{}=\"{}\"", self.attribute, value))
    }
}

impl TagHelper for AssetTagHelper {
    fn target_element(&self) -> &str {
        &self.element
    }
}
