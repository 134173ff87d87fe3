//! Filename templates and export target paths.
//!
//! A [`NameTemplate`] such as `{year}/{folder}/{docart}/{cdate}_{docid}` is
//! parsed once at startup and filled per document from its
//! [`EnrichedAttributes`]. `{{` and `}}` produce literal braces.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use crate::document::EnrichedAttributes;

/// Errors produced while parsing or filling a name template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template text itself is invalid.
    #[error("malformed name template {template:?} at byte {position}: {reason}")]
    Malformed {
        /// Full template text.
        template: String,
        /// Byte offset of the problem.
        position: usize,
        /// What is wrong.
        reason: &'static str,
    },

    /// The template references an attribute the document does not have.
    #[error("name template references unknown attribute `{name}`")]
    MissingAttribute {
        /// Placeholder name.
        name: String,
    },

    /// The filled template would escape the export root.
    #[error("resolved name {path:?} is not a relative path inside the export directory")]
    UnsafePath {
        /// Filled template text.
        path: String,
    },
}

impl TemplateError {
    fn malformed(template: &str, position: usize, reason: &'static str) -> Self {
        Self::Malformed {
            template: template.to_string(),
            position,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Parsed filename template with named `{placeholder}`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl NameTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Malformed`] for unbalanced braces, empty
    /// placeholders, or placeholders carrying format specs (`{a:>4}`, `{a!r}`).
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((position, ch)) = chars.next() {
            match ch {
                '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(TemplateError::malformed(
                        template,
                        position,
                        "single '}' encountered",
                    ));
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (inner_position, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(TemplateError::malformed(
                                    template,
                                    inner_position,
                                    "nested '{' inside placeholder",
                                ));
                            }
                            ':' | '!' | '[' | '.' => {
                                return Err(TemplateError::malformed(
                                    template,
                                    inner_position,
                                    "format specs and field access are not supported",
                                ));
                            }
                            c => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::malformed(
                            template,
                            position,
                            "unterminated placeholder",
                        ));
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(TemplateError::malformed(
                            template,
                            position,
                            "empty placeholder",
                        ));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// The template text as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitutes every placeholder by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingAttribute`] for the first placeholder
    /// that has no attribute of the same name.
    pub fn render(&self, attributes: &EnrichedAttributes) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => {
                    let value =
                        attributes
                            .get(name)
                            .ok_or_else(|| TemplateError::MissingAttribute {
                                name: name.clone(),
                            })?;
                    rendered.push_str(value);
                }
            }
        }
        Ok(rendered)
    }
}

impl FromStr for NameTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Target paths for one exported document.
///
/// `base` is the export root joined with the filled template; the PDF and
/// JSON sidecar paths append `.pdf` and `.json` to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    base: PathBuf,
}

impl ExportTarget {
    /// Fills `template` from `attributes` and anchors it at `export_root`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingAttribute`] when a placeholder cannot
    /// be filled, and [`TemplateError::UnsafePath`] when the filled template is
    /// absolute, contains `..`, or ends in an empty file name (e.g. `2023/`
    /// from `{year}/{bemerkung}` with an empty `bemerkung`). Empty directory
    /// segments (`2023//x`) collapse.
    pub fn resolve(
        export_root: &Path,
        template: &NameTemplate,
        attributes: &EnrichedAttributes,
    ) -> Result<Self, TemplateError> {
        let relative = template.render(attributes)?;
        let unsafe_path = || TemplateError::UnsafePath {
            path: relative.clone(),
        };

        let file_name = relative
            .rsplit(['/', std::path::MAIN_SEPARATOR])
            .next()
            .unwrap_or_default();
        if matches!(file_name.trim(), "" | ".") {
            return Err(unsafe_path());
        }

        let mut base = export_root.to_path_buf();
        let mut pushed = false;
        for component in Path::new(&relative).components() {
            match component {
                Component::Normal(part) => {
                    base.push(part);
                    pushed = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(unsafe_path());
                }
            }
        }
        if !pushed {
            return Err(unsafe_path());
        }
        Ok(Self { base })
    }

    /// Path without extension.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `<base>.pdf`
    #[must_use]
    pub fn pdf_path(&self) -> PathBuf {
        self.with_suffix(".pdf")
    }

    /// `<base>.json`
    #[must_use]
    pub fn json_path(&self) -> PathBuf {
        self.with_suffix(".json")
    }

    /// Directory that will contain the exported files.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.base.parent()
    }

    /// Creates the target directory and its parents if missing.
    ///
    /// Returns `true` when the directory had to be created.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if directory creation fails.
    pub fn ensure_directory(&self) -> io::Result<bool> {
        let Some(dir) = self.directory() else {
            return Ok(false);
        };
        if dir.is_dir() {
            return Ok(false);
        }
        info!(path = %dir.display(), "Creating directory");
        std::fs::create_dir_all(dir)?;
        Ok(true)
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        append_suffix(&self.base, suffix)
    }
}

/// Suffix of files that are still being written.
pub(crate) const PARTIAL_SUFFIX: &str = ".part";

/// `<target>.part`, the name a file is written under until it is complete.
pub(crate) fn partial_path(target: &Path) -> PathBuf {
    append_suffix(target, PARTIAL_SUFFIX)
}

// `set_extension` would clobber dots produced by slugs, so append instead.
fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut path = path.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}
