use crate::source::Comment;
use serde::{Deserialize, Serialize};

/// Match mode for keyword filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Match if ANY keyword is found (OR logic)
    #[default]
    Any,
    /// Match only if ALL keywords are found (AND logic)
    All,
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            other => Err(format!("match mode must be 'any' or 'all', got: {}", other)),
        }
    }
}

/// Split a space-separated keyword string; blank input yields no keywords
pub fn parse_keywords(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

/// Case-insensitive substring match against any keyword
///
/// An empty keyword list accepts every text.
pub fn matches(text: &str, keywords: &[String]) -> bool {
    KeywordFilter::new(keywords, MatchMode::Any).matches(text)
}

/// Keyword predicate over comment text
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    // Lowercased once up front
    keywords: Vec<String>,
    mode: MatchMode,
}

impl KeywordFilter {
    pub fn new(keywords: &[String], mode: MatchMode) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.keywords.is_empty() {
            return true;
        }

        let text_lower = text.to_lowercase();
        match self.mode {
            MatchMode::Any => self.keywords.iter().any(|k| text_lower.contains(k.as_str())),
            MatchMode::All => self.keywords.iter().all(|k| text_lower.contains(k.as_str())),
        }
    }

    /// Keep only comments whose text matches
    pub fn apply(&self, comments: Vec<Comment>) -> Vec<Comment> {
        comments
            .into_iter()
            .filter(|comment| self.matches(&comment.text))
            .collect()
    }
}
