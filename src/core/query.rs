//! Parses project codes such as `EP25005/2025`.

use std::fmt;

/// A project code ("značka"), optionally qualified by a year.
///
/// `code` is everything before the first `/`, `year` the segment after it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectCode {
    raw: String,
    code: String,
    year: Option<String>,
}

impl ProjectCode {
    /// Splits a raw code on `/`. No validation beyond that: an empty input
    /// yields an empty code.
    pub fn parse(raw: &str) -> Self {
        let mut segments = raw.split('/');
        let code = segments.next().unwrap_or_default().to_string();
        let year = segments.next().map(str::to_string);

        Self {
            raw: raw.to_string(),
            code,
            year,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }
}

impl fmt::Display for ProjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
