use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use relative_path::RelativePath;
use url::{Url, form_urlencoded};

use super::ExtraError;

/// URI stored in a FILE or LINK extra.
///
/// A URI without a scheme, or with the `file` scheme, is a file URI. For file
/// URIs the query string is split off into [`parameters`](Self::parameters)
/// (`notes/todo.txt?line=12`); other URIs are kept whole.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MmdUri {
    uri: String,
    scheme: Option<String>,
    parameters: Vec<(String, String)>,
}

impl MmdUri {
    pub fn parse(text: &str) -> Result<Self, ExtraError> {
        let invalid = |reason: String| ExtraError::InvalidUri {
            uri: text.to_string(),
            reason,
        };

        if text.is_empty() {
            return Err(invalid("empty URI".to_string()));
        }
        if let Some(c) = text.chars().find(|c| is_illegal(*c)) {
            return Err(invalid(format!("illegal character {c:?}")));
        }
        check_percent_escapes(text).map_err(invalid)?;

        let scheme = detect_scheme(text).map(str::to_string);
        if scheme.is_some() {
            Url::parse(text).map_err(|e| invalid(e.to_string()))?;
        }

        let is_file = scheme
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case("file"));

        let (uri, parameters) = match text.rsplit_once('?') {
            Some((path, query)) if is_file => (
                path.to_string(),
                form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
            ),
            _ => (text.to_string(), Vec::new()),
        };

        Ok(Self {
            uri,
            scheme,
            parameters,
        })
    }

    /// File URI for `file`, relative to `base` when `file` lies inside it.
    pub fn from_path(base: Option<&Path>, file: &Path) -> Result<Self, ExtraError> {
        if let Some(relative) = base.and_then(|base| file.strip_prefix(base).ok()) {
            return Self::parse(&encode_segments(relative));
        }
        if file.is_absolute() {
            let url = Url::from_file_path(file).map_err(|()| ExtraError::InvalidUri {
                uri: file.display().to_string(),
                reason: "path cannot be expressed as a file URL".to_string(),
            })?;
            return Self::parse(url.as_str());
        }
        Self::parse(&encode_segments(file))
    }

    pub fn is_file(&self) -> bool {
        self.scheme
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case("file"))
    }

    pub fn is_absolute(&self) -> bool {
        self.scheme.is_some()
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Copy with `name` set to `value`, replacing an existing parameter.
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        match self.parameters.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.parameters.push((name.to_string(), value.to_string())),
        }
        self
    }

    /// Resolve a file URI against `base`.
    ///
    /// Returns `None` for non-file URIs and for file URLs that do not map to a
    /// local path.
    pub fn to_file_path(&self, base: &Path) -> Option<PathBuf> {
        if !self.is_file() {
            return None;
        }
        if self.is_absolute() {
            return Url::parse(&self.uri).ok()?.to_file_path().ok();
        }
        let decoded = urlencoding::decode(&self.uri).ok()?;
        if decoded.starts_with('/') {
            return Some(normalize_path(Path::new(decoded.as_ref())));
        }
        Some(normalize_path(
            &RelativePath::new(decoded.as_ref()).normalize().to_path(base),
        ))
    }
}

impl FromStr for MmdUri {
    type Err = ExtraError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl fmt::Display for MmdUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)?;
        if !self.parameters.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.parameters)
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

fn is_illegal(c: char) -> bool {
    c.is_whitespace()
        || c.is_control()
        || matches!(c, '"' | '<' | '>' | '\\' | '^' | '`' | '{' | '|' | '}')
}

fn check_percent_escapes(text: &str) -> Result<(), String> {
    let bytes = text.as_bytes();
    for (index, _) in text.match_indices('%') {
        let valid = bytes
            .get(index + 1..index + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(format!("malformed percent escape at byte {index}"));
        }
    }
    Ok(())
}

/// Scheme of an absolute URI: letters, digits, `+`, `-` and `.` before the
/// first `:`, starting with a letter and not preceded by a path character.
fn detect_scheme(text: &str) -> Option<&str> {
    let end = text.find([':', '/', '?', '#'])?;
    if text.as_bytes()[end] != b':' {
        return None;
    }
    let scheme = &text[..end];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    (first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')))
    .then_some(scheme)
}

fn encode_segments(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => {
                Some(urlencoding::encode(&segment.to_string_lossy()).into_owned())
            }
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Lexically resolve `.` and `..` components.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other),
        }
    }
    result
}
