//! Template file-name conventions.
//!
//! A template basename is `stem[.extension].tag`:
//!
//! - `tag` is the last dotted segment and selects the renderer
//! - `extension`, if present, becomes the output file's extension
//! - a leading `_` marks a partial
//!
//! | Basename | Stem | Extension | Tag | Output (`html` default) |
//! |----------|------|-----------|-----|-------------------------|
//! | `index.jinja` | `index` | | `jinja` | `index.html` |
//! | `style.css.jinja` | `style` | `css` | `jinja` | `style.css` |
//! | `_nav.html.jinja` | `_nav` | `html` | `jinja` | partial `nav.html` |
//! | `.htaccess` | `.htaccess` | | | copied |

/// A parsed template basename.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateName<'a> {
    file_name: &'a str,
    head: &'a str,
    stem: &'a str,
    extension: Option<&'a str>,
    tag: Option<&'a str>,
}

impl<'a> TemplateName<'a> {
    /// Split `file_name` into stem, secondary extension, and tag.
    #[must_use]
    pub fn parse(file_name: &'a str) -> Self {
        let (head, tag) = match file_name.rsplit_once('.') {
            Some((head, tag)) if !file_name.starts_with('.') && !head.is_empty() => {
                (head, Some(tag))
            }
            _ => (file_name, None),
        };

        let (stem, extension) = match (tag, head.rsplit_once('.')) {
            (Some(_), Some((stem, ext))) if !stem.is_empty() => (stem, Some(ext)),
            _ => (head, None),
        };

        Self {
            file_name,
            head,
            stem,
            extension,
            tag,
        }
    }

    /// The original basename.
    #[must_use]
    pub fn file_name(&self) -> &'a str {
        self.file_name
    }

    /// Last dotted segment, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&'a str> {
        self.tag
    }

    /// Basename without the tag and at most one secondary extension.
    #[must_use]
    pub fn stem(&self) -> &'a str {
        self.stem
    }

    /// Secondary extension that overrides the default output extension.
    #[must_use]
    pub fn extension(&self) -> Option<&'a str> {
        self.extension
    }

    /// Returns `true` if the basename starts with `_`.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.file_name.starts_with('_')
    }

    /// Key under which a partial is visible to templates.
    ///
    /// Returns `None` unless this is a partial with a tag and a non-empty
    /// name.
    #[must_use]
    pub fn partial_key(&self) -> Option<&'a str> {
        self.tag?;
        self.head.strip_prefix('_').filter(|key| !key.is_empty())
    }

    /// Output basename for a rendered template.
    ///
    /// A secondary extension wins over `default_extension`. With neither,
    /// the output name is the bare stem.
    #[must_use]
    pub fn output_name(&self, default_extension: Option<&str>) -> String {
        match self
            .extension
            .or(default_extension.filter(|ext| !ext.is_empty()))
        {
            Some(ext) => format!("{}.{ext}", self.stem),
            None => self.stem.to_owned(),
        }
    }
}
