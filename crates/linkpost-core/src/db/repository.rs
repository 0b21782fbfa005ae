//! Post repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use crate::error::Result;
use crate::models::{Post, PostId};
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for post storage operations
pub trait PostRepository {
    /// Write the full post, replacing any stored state for its ID
    fn save(&self, post: &Post) -> Result<()>;

    /// Get a post by ID (`None` if absent or unreadable)
    fn get(&self, id: &PostId) -> Result<Option<Post>>;

    /// List every readable post, most recently modified first
    fn list(&self) -> Result<Vec<Post>>;

    /// Remove a post, returning whether a row was deleted
    fn delete(&self, id: &PostId) -> Result<bool>;

    /// List post IDs starting with `prefix`, most recently modified first
    fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;
}

/// `SQLite` implementation of `PostRepository`
///
/// Each post is one pretty-printed JSON object in `posts.body`.
pub struct SqlitePostRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePostRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a stored body, logging and dropping corrupt entries
    fn parse_body(id: &str, body: &str) -> Option<Post> {
        match serde_json::from_str::<Post>(body) {
            Ok(post) => Some(post),
            Err(error) => {
                tracing::warn!("Skipping unreadable post {id}: {error}");
                None
            }
        }
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn save(&self, post: &Post) -> Result<()> {
        let body = serde_json::to_string_pretty(post)?;

        self.conn.execute(
            "INSERT INTO posts (id, modified_at, body) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET modified_at = excluded.modified_at, body = excluded.body",
            params![post.id.as_str(), post.modified_at, body],
        )?;

        tracing::debug!("Saved post: {}", post.id);
        Ok(())
    }

    fn get(&self, id: &PostId) -> Result<Option<Post>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM posts WHERE id = ?",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(body.and_then(|body| Self::parse_body(&id.as_str(), &body)))
    }

    fn list(&self) -> Result<Vec<Post>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM posts ORDER BY modified_at DESC, id ASC")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut posts: Vec<Post> = rows
            .iter()
            .filter_map(|(id, body)| Self::parse_body(id, body))
            .collect();

        // The column mirrors the body, but order by the parsed value in case they drifted
        posts.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(posts)
    }

    fn delete(&self, id: &PostId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?", params![id.as_str()])?;

        tracing::debug!("Deleted post: {id}, success: {}", rows > 0);
        Ok(rows > 0)
    }

    fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM posts
             WHERE id LIKE ? || '%'
             ORDER BY modified_at DESC
             LIMIT ?",
        )?;

        let ids = stmt
            .query_map(params![prefix.to_ascii_lowercase(), limit as i64], |row| {
                row.get(0)
            })?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(ids)
    }
}
