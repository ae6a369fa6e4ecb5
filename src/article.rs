//! Article model and loading.
//!
//! Articles are supplied by the surrounding layer as an ordered list of
//! `{title, body}` records. Load order is display order and each article keeps
//! the index it was loaded at for the whole session.

use crate::{ReaderError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One readable news item
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    /// Headline
    pub title: String,
    /// Article text
    pub body: String,
    /// Position in the loaded list
    pub index: usize,
}

impl Article {
    /// Create an article, trimming surrounding whitespace.
    pub fn new(title: impl Into<String>, body: impl Into<String>, index: usize) -> Self {
        Self {
            title: title.into().trim().to_string(),
            body: body.into().trim().to_string(),
            index,
        }
    }

    /// Text handed to the speech engine: title and body joined as two sentences.
    pub fn spoken_text(&self) -> String {
        format!("{}. {}", self.title, self.body)
    }

    /// Character count of the spoken text (used for progress estimates)
    pub fn spoken_len(&self) -> usize {
        self.title.chars().count() + 2 + self.body.chars().count()
    }
}

#[derive(Deserialize)]
struct RawArticle {
    #[serde(default)]
    title: String,
    #[serde(default, alias = "description", alias = "text")]
    body: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArticleFile {
    List(Vec<RawArticle>),
    Wrapped { articles: Vec<RawArticle> },
}

/// Build an indexed article list from `(title, body)` pairs.
pub fn articles_from_pairs<I, T, B>(pairs: I) -> Vec<Article>
where
    I: IntoIterator<Item = (T, B)>,
    T: Into<String>,
    B: Into<String>,
{
    pairs
        .into_iter()
        .enumerate()
        .map(|(index, (title, body))| Article::new(title, body, index))
        .collect()
}

/// Parse articles from JSON text.
///
/// Accepts either a bare array of `{ "title", "body" }` objects or an object
/// with an `articles` array. `description` is accepted in place of `body`.
/// Entries whose title and body are both empty are skipped.
pub fn parse_articles(json: &str) -> Result<Vec<Article>> {
    let raw: RawArticleFile = serde_json::from_str(json)?;
    let entries = match raw {
        RawArticleFile::List(list) => list,
        RawArticleFile::Wrapped { articles } => articles,
    };

    let pairs = entries
        .into_iter()
        .filter(|a| !(a.title.trim().is_empty() && a.body.trim().is_empty()))
        .map(|a| (a.title, a.body));

    Ok(articles_from_pairs(pairs))
}

/// Load articles from a JSON file.
pub fn load_articles(path: &Path) -> Result<Vec<Article>> {
    let content = fs::read_to_string(path).map_err(|e| {
        ReaderError::Other(format!(
            "Failed to read article file {}: {e}",
            path.display()
        ))
    })?;
    let articles = parse_articles(&content)?;
    tracing::debug!(count = articles.len(), path = %path.display(), "loaded articles");
    Ok(articles)
}
