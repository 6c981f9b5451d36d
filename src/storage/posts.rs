use chrono::Utc;
use sqlx::error::DatabaseError as _;

use super::schema::Database;
use super::types::{DatabaseError, NewPost, Post, PostWrite};

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Insert a post, treating a duplicate entry URL as the expected
    /// already-ingested outcome rather than an error. The existing record
    /// is left untouched.
    pub async fn create_post(&self, post: NewPost) -> Result<PostWrite, DatabaseError> {
        let now = Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO posts (feed_id, title, url, description, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(&post.published_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(PostWrite::Created),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Ok(PostWrite::DuplicateUrl)
            }
            Err(e) => Err(DatabaseError::Other(e)),
        }
    }

    /// Posts for one feed in insertion order.
    pub async fn get_posts_for_feed(&self, feed_id: i64) -> Result<Vec<Post>, DatabaseError> {
        let posts = sqlx::query_as(
            r#"
            SELECT id, feed_id, title, url, description, published_at, created_at, updated_at
            FROM posts
            WHERE feed_id = ?
            ORDER BY id
        "#,
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn count_posts(&self) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, NewPost, PostWrite};

    async fn test_db_with_feed() -> (Database, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("tester").await.unwrap();
        let feed = db
            .create_feed("Example", "https://example.com/rss", user.id)
            .await
            .unwrap();
        (db, feed.id)
    }

    fn test_post(feed_id: i64, url: &str, title: &str) -> NewPost {
        NewPost {
            feed_id,
            title: title.to_string(),
            url: url.to_string(),
            description: Some("A description".to_string()),
            published_at: Some("Mon, 06 Sep 2021 00:00:00 GMT".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_post_round_trip() {
        let (db, feed_id) = test_db_with_feed().await;

        let write = db
            .create_post(test_post(feed_id, "https://example.com/1", "First"))
            .await
            .unwrap();
        assert_eq!(write, PostWrite::Created);

        let posts = db.get_posts_for_feed(feed_id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "First");
        assert_eq!(posts[0].url, "https://example.com/1");
        assert_eq!(posts[0].description.as_deref(), Some("A description"));
        assert_eq!(
            posts[0].published_at.as_deref(),
            Some("Mon, 06 Sep 2021 00:00:00 GMT")
        );
    }

    #[tokio::test]
    async fn test_duplicate_url_reported_not_errored() {
        let (db, feed_id) = test_db_with_feed().await;

        db.create_post(test_post(feed_id, "https://example.com/1", "Original"))
            .await
            .unwrap();
        let write = db
            .create_post(test_post(feed_id, "https://example.com/1", "Replacement"))
            .await
            .unwrap();
        assert_eq!(write, PostWrite::DuplicateUrl);

        // First record unchanged
        let posts = db.get_posts_for_feed(feed_id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Original");
    }

    #[tokio::test]
    async fn test_url_unique_across_feeds() {
        let (db, feed_id) = test_db_with_feed().await;
        let user = db.get_user_by_name("tester").await.unwrap().unwrap();
        let other = db
            .create_feed("Other", "https://other.example.com/rss", user.id)
            .await
            .unwrap();

        db.create_post(test_post(feed_id, "https://example.com/1", "First"))
            .await
            .unwrap();
        let write = db
            .create_post(test_post(other.id, "https://example.com/1", "Second"))
            .await
            .unwrap();
        assert_eq!(write, PostWrite::DuplicateUrl);
        assert_eq!(db.count_posts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_nullable_fields() {
        let (db, feed_id) = test_db_with_feed().await;

        db.create_post(NewPost {
            feed_id,
            title: "Bare".to_string(),
            url: "https://example.com/bare".to_string(),
            description: None,
            published_at: None,
        })
        .await
        .unwrap();

        let posts = db.get_posts_for_feed(feed_id).await.unwrap();
        assert!(posts[0].description.is_none());
        assert!(posts[0].published_at.is_none());
    }

    #[tokio::test]
    async fn test_posts_kept_in_insertion_order() {
        let (db, feed_id) = test_db_with_feed().await;

        for i in 1..=3 {
            db.create_post(test_post(
                feed_id,
                &format!("https://example.com/{}", i),
                &format!("Post {}", i),
            ))
            .await
            .unwrap();
        }

        let posts = db.get_posts_for_feed(feed_id).await.unwrap();
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 1", "Post 2", "Post 3"]);
    }
}
