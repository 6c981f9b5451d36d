use chrono::Utc;
use sqlx::error::DatabaseError as _;

use super::schema::Database;
use super::types::{DatabaseError, Feed, FeedFollow, FeedWithOwner};

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Register a feed for a user. Fails with
    /// [`DatabaseError::DuplicateFeedUrl`] if the URL is already registered.
    pub async fn create_feed(
        &self,
        name: &str,
        url: &str,
        user_id: i64,
    ) -> Result<Feed, DatabaseError> {
        let now = Utc::now().timestamp();
        let result = sqlx::query_as(
            r#"
            INSERT INTO feeds (name, url, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, url, user_id, created_at, updated_at, last_fetched_at
        "#,
        )
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(feed) => Ok(feed),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DatabaseError::DuplicateFeedUrl)
            }
            Err(e) => Err(DatabaseError::Other(e)),
        }
    }

    pub async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>, DatabaseError> {
        let feed = sqlx::query_as(
            r#"
            SELECT id, name, url, user_id, created_at, updated_at, last_fetched_at
            FROM feeds WHERE url = ?
        "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(feed)
    }

    /// All feeds with the name of the user who registered each, for the
    /// `feeds` listing.
    pub async fn list_feeds_with_owners(&self) -> Result<Vec<FeedWithOwner>, DatabaseError> {
        let feeds = sqlx::query_as(
            r#"
            SELECT f.name AS name, f.url AS url, u.name AS owner
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.name
        "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }

    // ========================================================================
    // Fetch Rotation
    // ========================================================================

    /// The feed due for the next fetch: oldest `last_fetched_at` first,
    /// with never-fetched feeds (NULL) ahead of everything and ties broken
    /// by id. Returns `None` when no feed is registered.
    pub async fn get_next_feed_to_fetch(&self) -> Result<Option<Feed>, DatabaseError> {
        let feed = sqlx::query_as(
            r#"
            SELECT id, name, url, user_id, created_at, updated_at, last_fetched_at
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST, id ASC
            LIMIT 1
        "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(feed)
    }

    /// Record a fetch attempt. Called by the ingestion cycle before the
    /// network request, so a failing feed still rotates to the back of the
    /// queue.
    pub async fn mark_feed_fetched(
        &self,
        feed_id: i64,
        fetched_at: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?")
            .bind(fetched_at)
            .bind(fetched_at)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Follow Operations
    // ========================================================================

    /// Subscribe a user to a feed. Fails with
    /// [`DatabaseError::AlreadyFollowing`] on a repeat follow.
    pub async fn create_feed_follow(
        &self,
        user_id: i64,
        feed_id: i64,
    ) -> Result<FeedFollow, DatabaseError> {
        let now = Utc::now().timestamp();
        let result = sqlx::query_as(
            r#"
            INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, feed_id, created_at, updated_at
        "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(follow) => Ok(follow),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DatabaseError::AlreadyFollowing)
            }
            Err(e) => Err(DatabaseError::Other(e)),
        }
    }

    /// Names of the feeds a user follows, oldest follow first.
    pub async fn list_follows_for_user(&self, user_id: i64) -> Result<Vec<String>, DatabaseError> {
        let names = sqlx::query_scalar(
            r#"
            SELECT f.name
            FROM feed_follows ff
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.user_id = ?
            ORDER BY ff.created_at, ff.id
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Remove a follow by feed URL. Returns `false` when the user was not
    /// following that feed.
    pub async fn delete_feed_follow(
        &self,
        user_id: i64,
        url: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            DELETE FROM feed_follows
            WHERE user_id = ? AND feed_id IN (SELECT id FROM feeds WHERE url = ?)
        "#,
        )
        .bind(user_id)
        .bind(url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
