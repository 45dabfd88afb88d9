use anyhow::Result;

use super::schema::Database;
use super::types::Article;

impl Database {
    // ========================================================================
    // Search Operations
    // ========================================================================

    /// Case-insensitive substring search over title, content, summary,
    /// and tags.
    ///
    /// A full-scan convenience, not an indexed search: fine at the data
    /// volumes of a personal, single-user corpus. Order of results is
    /// unspecified; an empty or whitespace-only query matches nothing.
    pub async fn search_articles(&self, query: &str) -> Result<Vec<Article>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let needle = query.to_lowercase();

        let articles = self.get_articles().await?;
        Ok(articles
            .into_iter()
            .filter(|a| article_matches(a, &needle))
            .collect())
    }
}

/// `needle` must already be lowercased.
fn article_matches(article: &Article, needle: &str) -> bool {
    if article.title.to_lowercase().contains(needle)
        || article.content.to_lowercase().contains(needle)
    {
        return true;
    }
    if article
        .summary
        .as_deref()
        .is_some_and(|s| s.to_lowercase().contains(needle))
    {
        return true;
    }
    article
        .tags
        .iter()
        .any(|t| t.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewArticle;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    async fn seed(db: &Database) -> i64 {
        db.save_article(NewArticle {
            title: "Notes on Ferrous Metallurgy".to_string(),
            content: "Smelting iron in a BLOOMERY furnace".to_string(),
            summary: Some("Iron from ore".to_string()),
            tags: vec!["chemistry".to_string(), "History".to_string()],
            ..Default::default()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_matches_each_field_case_insensitively() {
        let db = test_db().await;
        let id = seed(&db).await;

        for query in ["ferrous", "FERROUS", "bloomery", "from ORE", "history", "chem"] {
            let hits = db.search_articles(query).await.unwrap();
            assert_eq!(hits.len(), 1, "query {query:?} should match");
            assert_eq!(hits[0].id, id);
        }
    }

    #[tokio::test]
    async fn test_excludes_non_matching_articles() {
        let db = test_db().await;
        seed(&db).await;
        db.save_article(NewArticle {
            title: "Gardening".to_string(),
            content: "tomatoes and soil".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        let hits = db.search_articles("bloomery").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(db.search_articles("nonexistent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_matches_nothing() {
        let db = test_db().await;
        seed(&db).await;
        assert!(db.search_articles("").await.unwrap().is_empty());
        assert!(db.search_articles("   ").await.unwrap().is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]
            // Searching for any substring of the stored title finds the
            // article regardless of the casing of the query.
            #[test]
            fn title_substrings_always_match(
                title in "[a-zA-Z ]{3,24}",
                start in 0usize..3,
                uppercase in proptest::bool::ANY,
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                rt.block_on(async {
                    let db = test_db().await;
                    db.save_article(NewArticle {
                        title: title.clone(),
                        ..Default::default()
                    })
                    .await
                    .unwrap();

                    let slice = title[start.min(title.len() - 1)..].trim().to_string();
                    if slice.is_empty() {
                        return Ok(());
                    }
                    let query = if uppercase { slice.to_uppercase() } else { slice.to_lowercase() };
                    let hits = db.search_articles(&query).await.unwrap();
                    prop_assert_eq!(hits.len(), 1);
                    Ok(())
                })?;
            }
        }
    }
}
