//! Per-run generator settings.

use std::path::{Path, PathBuf};

use glob::Pattern;

/// Paths and naming options for one generation run.
///
/// Immutable for the lifetime of the run.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Root of the template tree.
    pub template_dir: PathBuf,
    /// Root of the output tree.
    pub output_dir: PathBuf,
    /// Root of per-template content; `None` disables content lookup.
    pub content_dir: Option<PathBuf>,
    /// Content shared by every template, relative to `content_dir`.
    pub shared_content: Option<PathBuf>,
    /// Extension for rendered templates without a secondary extension.
    pub output_extension: Option<String>,
    /// Entries to skip, matched against paths relative to `template_dir`.
    pub exclude: Vec<Pattern>,
}

impl GeneratorConfig {
    /// Create settings with no content, `html` output, and no excludes.
    #[must_use]
    pub fn new(template_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            output_dir: output_dir.into(),
            content_dir: None,
            shared_content: None,
            output_extension: Some("html".to_owned()),
            exclude: Vec::new(),
        }
    }

    /// Set the content root.
    #[must_use]
    pub fn with_content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content_dir = Some(dir.into());
        self
    }

    /// Set the shared content path.
    #[must_use]
    pub fn with_shared_content(mut self, path: impl Into<PathBuf>) -> Self {
        self.shared_content = Some(path.into());
        self
    }

    /// Set or clear the default output extension.
    #[must_use]
    pub fn with_output_extension(mut self, extension: Option<&str>) -> Self {
        self.output_extension = extension.map(str::to_owned);
        self
    }

    /// Add exclude patterns.
    #[must_use]
    pub fn with_exclude(mut self, patterns: impl IntoIterator<Item = Pattern>) -> Self {
        self.exclude.extend(patterns);
        self
    }

    /// Logical content path of shared content.
    ///
    /// Returns `None` when either the content root or the shared path is unset.
    #[must_use]
    pub fn shared_content_path(&self) -> Option<PathBuf> {
        let dir = self.content_dir.as_ref()?;
        let shared = self.shared_content.as_ref()?;
        Some(dir.join(shared))
    }

    /// Returns `true` if `path` matches an exclude pattern.
    pub(crate) fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.template_dir).unwrap_or(path);
        self.exclude.iter().any(|p| p.matches_path(relative))
    }

    /// `path` with its `template_dir` prefix replaced by `output_dir`.
    pub(crate) fn mirror(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.template_dir) {
            Ok(relative) if relative.as_os_str().is_empty() => self.output_dir.clone(),
            Ok(relative) => self.output_dir.join(relative),
            Err(_) => self.output_dir.join(path),
        }
    }

    /// Directory of `path` relative to `template_dir`.
    pub(crate) fn relative_dir<'a>(&self, path: &'a Path) -> &'a Path {
        path.parent()
            .and_then(|dir| dir.strip_prefix(&self.template_dir).ok())
            .unwrap_or_else(|| Path::new(""))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::new("templates", "public");

        assert_eq!(config.output_extension.as_deref(), Some("html"));
        assert!(config.content_dir.is_none());
        assert!(config.shared_content_path().is_none());
    }

    #[test]
    fn test_shared_content_under_content_dir() {
        let config = GeneratorConfig::new("t", "o")
            .with_content_dir("content")
            .with_shared_content("shared");

        assert_eq!(
            config.shared_content_path(),
            Some(PathBuf::from("content/shared"))
        );
    }

    #[test]
    fn test_shared_content_disabled_without_content_dir() {
        let config = GeneratorConfig::new("templates", "public").with_shared_content("shared");

        assert!(config.shared_content_path().is_none());
    }

    #[test]
    fn test_mirror() {
        let config = GeneratorConfig::new("templates", "public");

        assert_eq!(
            config.mirror(Path::new("templates/sub/a.css")),
            PathBuf::from("public/sub/a.css")
        );
        assert_eq!(
            config.mirror(Path::new("templates")),
            PathBuf::from("public")
        );
    }

    #[test]
    fn test_relative_dir() {
        let config = GeneratorConfig::new("templates", "public");

        assert_eq!(
            config.relative_dir(Path::new("templates/a/b/index.jinja")),
            Path::new("a/b")
        );
        assert_eq!(
            config.relative_dir(Path::new("templates/index.jinja")),
            Path::new("")
        );
    }

    #[test]
    fn test_exclude_matches_relative_path() {
        let config = GeneratorConfig::new("templates", "public")
            .with_exclude([Pattern::new("drafts").unwrap(), Pattern::new("**/*.swp").unwrap()]);

        assert!(config.is_excluded(Path::new("templates/drafts")));
        assert!(config.is_excluded(Path::new("templates/sub/index.jinja.swp")));
        assert!(!config.is_excluded(Path::new("templates/index.jinja")));
    }
}
