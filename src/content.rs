use crate::models::{ArticleQuery, ArticleView};

/// Average reading speed used for the reading-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// generate_slug
///
/// Lowercases the title, turns every run of non-alphanumeric characters into a
/// single hyphen and trims hyphens from both ends. Collisions are not resolved
/// here; the UNIQUE constraint on `articles.slug` rejects duplicates.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Estimated minutes to read a markdown body. Never less than one.
pub fn calculate_reading_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

/// ArticleFilter
///
/// The in-memory half of an article listing: category slug, tag slug and a
/// case-insensitive substring search over title and excerpt.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    category: Option<String>,
    tag: Option<String>,
    search: Option<String>,
}

impl ArticleFilter {
    pub fn from_query(query: &ArticleQuery) -> Self {
        let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();
        Self {
            category: non_empty(&query.category),
            tag: non_empty(&query.tag),
            search: non_empty(&query.search).map(|s| s.to_lowercase()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.tag.is_none() && self.search.is_none()
    }

    pub fn matches(&self, article: &ArticleView) -> bool {
        if let Some(category) = &self.category {
            if !article.categories.iter().any(|c| &c.slug == category) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !article.tags.iter().any(|t| &t.slug == tag) {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            return article.title.to_lowercase().contains(needle)
                || article.excerpt.to_lowercase().contains(needle);
        }
        true
    }

    /// Filters, then pages the survivors.
    pub fn apply(
        &self,
        articles: Vec<ArticleView>,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Vec<ArticleView> {
        let skip = offset.unwrap_or(0).max(0) as usize;
        let take = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        articles
            .into_iter()
            .filter(|a| self.matches(a))
            .skip(skip)
            .take(take)
            .collect()
    }
}
