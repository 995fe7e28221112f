use std::fmt;
use std::str::FromStr;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "parser/key_path.pest"] // relative to src
pub struct KeyPathParser;

/// A path of property names leading from a global object to a nested property,
/// e.g. `["document", "foo"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parses a dotted/bracketed path such as `document.foo` or `a['b'][0]`.
    pub fn parse(path: &str) -> Result<Self, String> {
        let pairs = KeyPathParser::parse(Rule::key_path, path)
            .map_err(|e| format!("Parse error due to {}", e))?;
        let mut segments = vec![];
        for pair in pairs {
            for inner in pair.into_inner() {
                if let Some(segment) = segment_from_pair(inner) {
                    segments.push(segment);
                }
            }
        }
        Ok(KeyPath { segments })
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyPath {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Every segment but the last one; the path of the object that owns the property.
    pub fn parent(&self) -> &[String] {
        match self.segments.len() {
            0 => &[],
            n => &self.segments[..n - 1],
        }
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn segment_from_pair(pair: Pair<Rule>) -> Option<String> {
    match pair.as_rule() {
        Rule::identifier | Rule::index_segment => Some(pair.as_str().to_string()),
        Rule::quoted_segment => Some(
            pair.into_inner()
                .next()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
        ),
        _ => None,
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '$' || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '$' || c == '_')
        }
        _ => false,
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if is_identifier(segment) {
                if idx > 0 {
                    write!(f, ".")?;
                }
                write!(f, "{}", segment)?;
            } else if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                write!(f, "[{}]", segment)?;
            } else {
                write!(f, "[{:?}]", segment)?;
            }
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(s)
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        KeyPath { segments }
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        KeyPath::from_segments(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        KeyPath::from_segments(segments)
    }
}
