use super::article::Article;
use std::collections::HashSet;

/// The sorted article list for one fetch cycle.
///
/// Ordered newest first; articles sharing a date keep their fetch order.
/// A catalog is never patched in place: a reload builds a new one, so readers
/// holding an older catalog keep valid indices into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    articles: Vec<Article>,
}

impl Catalog {
    /// Build a catalog from parsed articles.
    ///
    /// Ids must be unique within a catalog. Two files with identical bytes
    /// share a content hash, so later duplicates are dropped.
    pub fn build(parsed: Vec<Article>) -> Self {
        let mut seen = HashSet::with_capacity(parsed.len());
        let mut articles: Vec<Article> = Vec::with_capacity(parsed.len());

        for article in parsed {
            if seen.insert(article.id.clone()) {
                articles.push(article);
            } else {
                tracing::warn!(
                    id = %article.id,
                    title = %article.title,
                    "Dropping article with duplicate content hash"
                );
            }
        }

        // sort_by is stable: same-date articles keep fetch order
        articles.sort_by(|a, b| b.date.cmp(&a.date));

        Self { articles }
    }

    pub fn get(&self, index: usize) -> Option<&Article> {
        self.articles.get(index)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.articles.iter().position(|a| a.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Article> {
        self.articles.iter()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Article;
    type IntoIter = std::slice::Iter<'a, Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.articles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn article(id: &str, date: (i32, u32, u32)) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {}", id),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            category: "Security".into(),
            excerpt: "excerpt".into(),
            read_time_minutes: 1,
            content: String::new(),
            source_url: String::new(),
        }
    }

    #[test]
    fn test_sorted_newest_first() {
        let catalog = Catalog::build(vec![
            article("a", (2023, 1, 1)),
            article("b", (2024, 6, 1)),
            article("c", (2023, 12, 31)),
        ]);
        let ids: Vec<&str> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_same_date_keeps_fetch_order() {
        let catalog = Catalog::build(vec![
            article("first", (2024, 1, 1)),
            article("newer", (2024, 2, 1)),
            article("second", (2024, 1, 1)),
            article("third", (2024, 1, 1)),
        ]);
        let ids: Vec<&str> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "first", "second", "third"]);
    }

    #[test]
    fn test_lookup() {
        let catalog = Catalog::build(vec![article("a", (2023, 1, 1)), article("b", (2024, 1, 1))]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.index_of("a"), Some(1));
        assert_eq!(catalog.index_of("missing"), None);
        assert_eq!(catalog.get(0).map(|a| a.id.as_str()), Some("b"));
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_duplicate_hash_dropped() {
        let catalog = Catalog::build(vec![article("same", (2023, 1, 1)), article("same", (2024, 1, 1))]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::build(Vec::new());
        assert!(catalog.is_empty());
        assert!(catalog.get(0).is_none());
    }

    proptest! {
        #[test]
        fn prop_length_preserved_and_sorted(days in prop::collection::vec(0u32..2000, 0..40)) {
            let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
            let parsed: Vec<Article> = days
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    let mut a = article(&format!("id-{}", i), (2020, 1, 1));
                    a.date = base + chrono::Days::new(u64::from(*d));
                    a
                })
                .collect();
            let n = parsed.len();
            let catalog = Catalog::build(parsed);

            prop_assert_eq!(catalog.len(), n);
            for pair in catalog.articles().windows(2) {
                prop_assert!(pair[0].date >= pair[1].date);
            }
        }
    }
}
