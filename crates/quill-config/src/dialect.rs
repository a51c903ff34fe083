//! Source-file dialect dispatch.

use std::path::Path;

/// The format family of a source file, determining which processor chain
/// is assembled for it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Plain Markdown.
    Markdown,
    /// Markdown with embedded script expressions.
    RMarkdown,
    /// XML transformed through a stylesheet.
    Xml,
    /// XML with embedded script expressions.
    RXml,
    /// Anything else; rendered preformatted.
    #[default]
    Unknown,
}

impl Dialect {
    /// Map a file extension to its dialect, case-insensitively.
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Self::Markdown,
            "rmd" => Self::RMarkdown,
            "xml" => Self::Xml,
            "rxml" => Self::RXml,
            _ => Self::Unknown,
        }
    }

    /// Dialect of the file at `path`, from its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::Unknown, Self::from_extension)
    }

    /// Whether documents of this dialect carry embedded script
    /// expressions.
    #[must_use]
    pub fn is_scripted(&self) -> bool {
        matches!(self, Self::RMarkdown | Self::RXml)
    }

    /// Whether documents of this dialect are XML transformed through a
    /// stylesheet.
    #[must_use]
    pub fn is_xml(&self) -> bool {
        matches!(self, Self::Xml | Self::RXml)
    }
}
