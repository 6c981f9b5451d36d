use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process has the database locked
    #[error("Another gather process appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// A user with this name already exists
    #[error("A user with that name already exists")]
    DuplicateUser,

    /// A feed with this URL already exists
    #[error("A feed with that URL is already registered")]
    DuplicateFeedUrl,

    /// The user already follows this feed
    #[error("Already following that feed")]
    AlreadyFollowing,

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking.
    ///
    /// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all
    /// surface as message text rather than a stable code through sqlx.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let message = err.to_string().to_lowercase();
        if message.contains("database is locked")
            || message.contains("database table is locked")
            || message.contains("sqlite_busy")
            || message.contains("sqlite_locked")
            || message.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A registered user. Timestamps are epoch seconds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A registered feed.
///
/// `last_fetched_at` is NULL until the ingestion cycle first selects the
/// feed, and is only ever written by the cycle.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_fetched_at: Option<i64>,
}

/// A stored feed entry, unique by `url` across all feeds.
///
/// `published_at` is the raw source string: feeds do not agree on a date
/// format, so no parsing is attempted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for [`super::Database::create_post`].
#[derive(Debug, Clone)]
pub struct NewPost {
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<String>,
}

/// Outcome of a post insert.
///
/// A duplicate entry URL is an expected, non-error outcome: the item was
/// already ingested in a previous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostWrite {
    Created,
    DuplicateUrl,
}

/// A user-to-feed subscription.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedFollow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Row for the `feeds` listing: feed plus the name of the registering user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithOwner {
    pub name: String,
    pub url: String,
    pub owner: String,
}
