//! SQLite tweet store implementation

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tweetbot_domain::{NewTweet, StoreError, Tweet, TweetFilter, TweetStore, TweetUpdate};

const TWEET_COLUMNS: &str = "id, topic, content, posted, image_path, created_at";

type TweetRow = (i64, String, String, bool, Option<String>, String);

/// SQLite-backed tweet store
pub struct SqliteTweetStore {
    pool: SqlitePool,
}

impl SqliteTweetStore {
    /// Open (or create) the database file and run migrations
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        // AUTOINCREMENT keeps ids from ever being reused
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tweets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic TEXT NOT NULL,
                content TEXT NOT NULL,
                posted INTEGER NOT NULL DEFAULT 0,
                image_path TEXT,
                created_at TEXT NOT NULL,
                topic_folded TEXT NOT NULL,
                content_folded TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tweets_posted ON tweets(posted)")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn row_to_tweet(row: TweetRow) -> Result<Tweet, StoreError> {
    let (id, topic, content, posted, image_path, created_at_str) = row;
    let created_at = OffsetDateTime::parse(&created_at_str, &Rfc3339)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(Tweet {
        id,
        topic,
        content,
        posted,
        image_path,
        created_at,
    })
}

/// Case-folded copy used for search; SQLite LOWER() only folds ASCII
fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Escape LIKE wildcards so the search matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &TweetFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(posted) = filter.posted {
        builder.push(" AND posted = ").push_bind(posted);
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(&fold(search)));
        builder
            .push(" AND (topic_folded LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR content_folded LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

#[async_trait]
impl TweetStore for SqliteTweetStore {
    async fn insert(&self, tweet: &NewTweet) -> Result<Tweet, StoreError> {
        let created_at_str = tweet
            .created_at
            .format(&Rfc3339)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let row: TweetRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO tweets
                (topic, content, posted, image_path, created_at, topic_folded, content_folded)
            VALUES (?, ?, 0, ?, ?, ?, ?)
            RETURNING {}
            "#,
            TWEET_COLUMNS
        ))
        .bind(&tweet.topic)
        .bind(&tweet.content)
        .bind(&tweet.image_path)
        .bind(&created_at_str)
        .bind(fold(&tweet.topic))
        .bind(fold(&tweet.content))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        row_to_tweet(row)
    }

    async fn get(&self, id: i64) -> Result<Option<Tweet>, StoreError> {
        let row: Option<TweetRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tweets WHERE id = ?",
            TWEET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(row_to_tweet).transpose()
    }

    async fn update_draft(
        &self,
        id: i64,
        update: &TweetUpdate,
    ) -> Result<Option<Tweet>, StoreError> {
        let row: Option<TweetRow> = sqlx::query_as(&format!(
            r#"
            UPDATE tweets SET
                topic = COALESCE(?, topic),
                content = COALESCE(?, content),
                topic_folded = COALESCE(?, topic_folded),
                content_folded = COALESCE(?, content_folded)
            WHERE id = ? AND posted = 0
            RETURNING {}
            "#,
            TWEET_COLUMNS
        ))
        .bind(&update.topic)
        .bind(&update.content)
        .bind(update.topic.as_deref().map(fold))
        .bind(update.content.as_deref().map(fold))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(row_to_tweet).transpose()
    }

    async fn mark_posted(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE tweets SET posted = 1 WHERE id = ? AND posted = 0")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_image_path(&self, id: i64, image_path: Option<&str>) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE tweets SET image_path = ? WHERE id = ?")
            .bind(image_path)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, filter: &TweetFilter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tweets");
        push_filter(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(count.max(0) as u64)
    }

    async fn list(
        &self,
        filter: &TweetFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Tweet>, StoreError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM tweets", TWEET_COLUMNS));
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let rows: Vec<TweetRow> = builder
            .build_query_as::<TweetRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(row_to_tweet).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tweet(topic: &str, content: &str) -> NewTweet {
        NewTweet {
            topic: topic.to_string(),
            content: content.to_string(),
            image_path: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    async fn seeded_store() -> SqliteTweetStore {
        let store = SqliteTweetStore::in_memory().await.unwrap();
        store
            .insert(&new_tweet("launch day", "Exciting launch! #launch"))
            .await
            .unwrap();
        store
            .insert(&new_tweet("Rust", "Ownership explained"))
            .await
            .unwrap();
        store
            .insert(&new_tweet("coffee", "100% arabica_beans"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let store = SqliteTweetStore::in_memory().await.unwrap();

        let inserted = store.insert(&new_tweet("T", "body")).await.unwrap();
        let fetched = store.get(inserted.id).await.unwrap().unwrap();

        assert_eq!(fetched.topic, "T");
        assert_eq!(fetched.content, "body");
        assert!(!fetched.posted);
        assert_eq!(fetched.image_path, None);
        assert_eq!(
            fetched.created_at.unix_timestamp(),
            inserted.created_at.unix_timestamp()
        );
        assert!(store.get(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_draft_only_touches_unposted_rows() {
        let store = seeded_store().await;

        let updated = store
            .update_draft(
                1,
                &TweetUpdate {
                    topic: None,
                    content: Some("edited".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.topic, "launch day");
        assert_eq!(updated.content, "edited");

        assert!(store.mark_posted(1).await.unwrap());
        assert!(!store.mark_posted(1).await.unwrap());

        let blocked = store
            .update_draft(
                1,
                &TweetUpdate {
                    topic: Some("new topic".to_string()),
                    content: None,
                },
            )
            .await
            .unwrap();
        assert!(blocked.is_none());
        assert_eq!(store.get(1).await.unwrap().unwrap().topic, "launch day");
    }

    #[tokio::test]
    async fn test_list_orders_by_id_desc_with_offset() {
        let store = seeded_store().await;
        let all = TweetFilter::default();

        let page = store.list(&all, 2, 0).await.unwrap();
        assert_eq!(page.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 2]);

        let page = store.list(&all, 2, 2).await.unwrap();
        assert_eq!(page.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);

        assert_eq!(store.count(&all).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_across_topic_and_content() {
        let store = seeded_store().await;

        let filter = TweetFilter {
            posted: None,
            search: Some("LAUNCH".to_string()),
        };
        assert_eq!(store.count(&filter).await.unwrap(), 1);

        let filter = TweetFilter {
            posted: None,
            search: Some("ownership".to_string()),
        };
        let found = store.list(&filter, 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].topic, "Rust");
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_capitals() {
        let store = SqliteTweetStore::in_memory().await.unwrap();
        store.insert(&new_tweet("Élan", "ÜBER cool")).await.unwrap();

        for needle in ["Élan", "élan", "ÉLAN", "über", "ÜBER", "Über cool"] {
            let filter = TweetFilter {
                posted: None,
                search: Some(needle.to_string()),
            };
            assert_eq!(store.count(&filter).await.unwrap(), 1, "search {:?}", needle);
            assert_eq!(store.list(&filter, 10, 0).await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_search_follows_edited_text() {
        let store = seeded_store().await;
        store
            .update_draft(
                2,
                &TweetUpdate {
                    topic: Some("Straße".to_string()),
                    content: None,
                },
            )
            .await
            .unwrap();

        let old = TweetFilter {
            posted: None,
            search: Some("rust".to_string()),
        };
        let new = TweetFilter {
            posted: None,
            search: Some("STRAßE".to_string()),
        };
        assert_eq!(store.count(&old).await.unwrap(), 0);
        assert_eq!(store.count(&new).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_wildcards_match_literally() {
        let store = seeded_store().await;

        let percent = TweetFilter {
            posted: None,
            search: Some("100%".to_string()),
        };
        assert_eq!(store.count(&percent).await.unwrap(), 1);

        let underscore = TweetFilter {
            posted: None,
            search: Some("_".to_string()),
        };
        assert_eq!(store.count(&underscore).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_posted_filter() {
        let store = seeded_store().await;
        store.mark_posted(2).await.unwrap();

        let posted = TweetFilter {
            posted: Some(true),
            search: None,
        };
        let drafts = TweetFilter {
            posted: Some(false),
            search: None,
        };

        assert_eq!(store.count(&posted).await.unwrap(), 1);
        assert_eq!(store.count(&drafts).await.unwrap(), 2);
        let ids: Vec<i64> = store
            .list(&drafts, 10, 0)
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_set_image_path() {
        let store = seeded_store().await;

        assert!(store.set_image_path(1, Some("images/a.png")).await.unwrap());
        assert_eq!(
            store.get(1).await.unwrap().unwrap().image_path.as_deref(),
            Some("images/a.png")
        );

        assert!(store.set_image_path(1, None).await.unwrap());
        assert_eq!(store.get(1).await.unwrap().unwrap().image_path, None);

        assert!(!store.set_image_path(404, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tweets.sqlite");

        {
            let store = SqliteTweetStore::new(&path).await.unwrap();
            store.insert(&new_tweet("persist", "me")).await.unwrap();
        }

        let reopened = SqliteTweetStore::new(&path).await.unwrap();
        let tweet = reopened.get(1).await.unwrap().unwrap();
        assert_eq!(tweet.topic, "persist");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
