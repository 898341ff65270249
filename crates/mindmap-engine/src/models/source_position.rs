use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use super::ExtraError;

fn source_position_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^\[]*)\[(-?\d+):(-?\d+)\]$").expect("Invalid source position regex")
    })
}

/// Location in a source file, written as `name[line:column]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub name: String,
    pub line: i32,
    pub column: i32,
}

impl SourcePosition {
    pub fn new(name: impl Into<String>, line: i32, column: i32) -> Self {
        Self {
            name: name.into(),
            line,
            column,
        }
    }
}

impl FromStr for SourcePosition {
    type Err = ExtraError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ExtraError::InvalidSourcePosition(text.to_string());
        let captures = source_position_regex().captures(text).ok_or_else(invalid)?;
        Ok(Self {
            name: captures[1].to_string(),
            line: captures[2].parse().map_err(|_| invalid())?,
            column: captures[3].parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}:{}]", self.name, self.line, self.column)
    }
}
