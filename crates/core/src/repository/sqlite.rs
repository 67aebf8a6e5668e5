//! SQLite-backed video repository implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::store::{RepositoryError, VideoFilter, VideoRepository};
use super::types::{NewVideo, Video, VideoStatus};

const VIDEO_COLUMNS: &str = "id, channel_id, category_id, title, description, original_key, \
     processed_prefix, thumbnail_key, duration_secs, status, error_message, \
     views, likes, created_at, updated_at";

/// SQLite-backed video repository.
pub struct SqliteVideoRepository {
    conn: Mutex<Connection>,
}

impl SqliteVideoRepository {
    /// Create a new repository, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path).map_err(|e| RepositoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory repository (useful for testing).
    pub fn in_memory() -> Result<Self, RepositoryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| RepositoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RepositoryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id TEXT PRIMARY KEY,
                channel_id TEXT NOT NULL,
                category_id TEXT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                original_key TEXT NOT NULL,
                processed_prefix TEXT,
                thumbnail_key TEXT,
                duration_secs REAL,
                status TEXT NOT NULL,
                error_message TEXT,
                views INTEGER NOT NULL DEFAULT 0,
                likes INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_videos_channel ON videos(channel_id);
            CREATE INDEX IF NOT EXISTS idx_videos_status ON videos(status);
            CREATE INDEX IF NOT EXISTS idx_videos_created_at ON videos(created_at);
            "#,
        )
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &VideoFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.clone()));
        }

        if let Some(ref channel_id) = filter.channel_id {
            conditions.push("channel_id = ?");
            params.push(Box::new(channel_id.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_video(row: &rusqlite::Row) -> rusqlite::Result<Video> {
        let status_str: String = row.get(9)?;
        let created_at_str: String = row.get(13)?;
        let updated_at_str: String = row.get(14)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Video {
            id: row.get(0)?,
            channel_id: row.get(1)?,
            category_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            original_key: row.get(5)?,
            processed_prefix: row.get(6)?,
            thumbnail_key: row.get(7)?,
            duration_secs: row.get(8)?,
            status: VideoStatus::parse(&status_str).unwrap_or(VideoStatus::Failed),
            error_message: row.get(10)?,
            views: row.get(11)?,
            likes: row.get(12)?,
            created_at,
            updated_at,
        })
    }

    /// Distinguishes a missing record from a terminal-state conflict
    /// after a guarded update touched zero rows.
    fn guarded_update_miss(
        conn: &Connection,
        id: &str,
        operation: &str,
    ) -> RepositoryError {
        let status: Result<String, _> = conn.query_row(
            "SELECT status FROM videos WHERE id = ?",
            params![id],
            |row| row.get(0),
        );

        match status {
            Ok(current_status) => RepositoryError::InvalidStatus {
                video_id: id.to_string(),
                current_status,
                operation: operation.to_string(),
            },
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                RepositoryError::NotFound(id.to_string())
            }
            Err(e) => RepositoryError::Database(e.to_string()),
        }
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Video, RepositoryError> {
        conn.query_row(
            &format!("SELECT {} FROM videos WHERE id = ?", VIDEO_COLUMNS),
            params![id],
            Self::row_to_video,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound(id.to_string()),
            e => RepositoryError::Database(e.to_string()),
        })
    }
}

impl VideoRepository for SqliteVideoRepository {
    fn create(&self, request: NewVideo) -> Result<Video, RepositoryError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO videos (id, channel_id, category_id, title, description, original_key, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.channel_id,
                request.category_id,
                request.title,
                request.description,
                request.original_key,
                VideoStatus::Uploading.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(Video {
            id,
            channel_id: request.channel_id,
            category_id: request.category_id,
            title: request.title,
            description: request.description,
            original_key: request.original_key,
            processed_prefix: None,
            thumbnail_key: None,
            duration_secs: None,
            status: VideoStatus::Uploading,
            error_message: None,
            views: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Video>, RepositoryError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {} FROM videos WHERE id = ?", VIDEO_COLUMNS),
            params![id],
            Self::row_to_video,
        );

        match result {
            Ok(video) => Ok(Some(video)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RepositoryError::Database(e.to_string())),
        }
    }

    fn list(&self, filter: &VideoFilter) -> Result<Vec<Video>, RepositoryError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM videos {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            VIDEO_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_video)
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut videos = Vec::new();
        for row_result in rows {
            let video = row_result.map_err(|e| RepositoryError::Database(e.to_string()))?;
            videos.push(video);
        }

        Ok(videos)
    }

    fn count(&self, filter: &VideoFilter) -> Result<i64, RepositoryError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM videos {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(count)
    }

    fn mark_ready(
        &self,
        id: &str,
        processed_prefix: &str,
        thumbnail_key: Option<&str>,
        duration_secs: f64,
    ) -> Result<Video, RepositoryError> {
        let conn = self.conn.lock().unwrap();

        // Guarded by the current status: a record already in a
        // terminal state is never rewritten.
        let affected = conn
            .execute(
                "UPDATE videos SET processed_prefix = ?, thumbnail_key = ?, duration_secs = ?, status = ?, updated_at = ? WHERE id = ? AND status = ?",
                params![
                    processed_prefix,
                    thumbnail_key,
                    duration_secs,
                    VideoStatus::Ready.as_str(),
                    Utc::now().to_rfc3339(),
                    id,
                    VideoStatus::Uploading.as_str(),
                ],
            )
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if affected == 0 {
            return Err(Self::guarded_update_miss(&conn, id, "mark ready"));
        }

        Self::fetch(&conn, id)
    }

    fn mark_failed(&self, id: &str, message: &str) -> Result<Video, RepositoryError> {
        let conn = self.conn.lock().unwrap();

        let affected = conn
            .execute(
                "UPDATE videos SET status = ?, error_message = ?, updated_at = ? WHERE id = ? AND status = ?",
                params![
                    VideoStatus::Failed.as_str(),
                    message,
                    Utc::now().to_rfc3339(),
                    id,
                    VideoStatus::Uploading.as_str(),
                ],
            )
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if affected == 0 {
            return Err(Self::guarded_update_miss(&conn, id, "mark failed"));
        }

        Self::fetch(&conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_video(channel_id: &str) -> NewVideo {
        NewVideo {
            channel_id: channel_id.to_string(),
            category_id: Some("cat-1".to_string()),
            title: "Test upload".to_string(),
            description: "A test".to_string(),
            original_key: format!("temp/{}/raw.mp4", channel_id),
        }
    }

    #[test]
    fn test_create_and_get() {
        let repo = SqliteVideoRepository::in_memory().unwrap();
        let video = repo.create(new_video("chan-1")).unwrap();

        assert_eq!(video.status, VideoStatus::Uploading);
        assert!(video.processed_prefix.is_none());
        assert!(video.error_message.is_none());

        let fetched = repo.get(&video.id).unwrap().unwrap();
        assert_eq!(fetched.id, video.id);
        assert_eq!(fetched.channel_id, "chan-1");
        assert_eq!(fetched.status, VideoStatus::Uploading);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let repo = SqliteVideoRepository::in_memory().unwrap();
        assert!(repo.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_mark_ready_sets_published_fields() {
        let repo = SqliteVideoRepository::in_memory().unwrap();
        let video = repo.create(new_video("chan-1")).unwrap();

        let ready = repo
            .mark_ready(
                &video.id,
                "processed/chan-1/vid",
                Some("processed/chan-1/vid/thumbnail.jpg"),
                15.0,
            )
            .unwrap();

        assert_eq!(ready.status, VideoStatus::Ready);
        assert_eq!(ready.processed_prefix.as_deref(), Some("processed/chan-1/vid"));
        assert_eq!(
            ready.thumbnail_key.as_deref(),
            Some("processed/chan-1/vid/thumbnail.jpg")
        );
        assert_eq!(ready.duration_secs, Some(15.0));
        assert!(ready.error_message.is_none());
    }

    #[test]
    fn test_mark_ready_without_thumbnail() {
        let repo = SqliteVideoRepository::in_memory().unwrap();
        let video = repo.create(new_video("chan-1")).unwrap();

        let ready = repo
            .mark_ready(&video.id, "processed/chan-1/vid", None, 7.5)
            .unwrap();
        assert!(ready.thumbnail_key.is_none());
        assert_eq!(ready.status, VideoStatus::Ready);
    }

    #[test]
    fn test_mark_failed_sets_message() {
        let repo = SqliteVideoRepository::in_memory().unwrap();
        let video = repo.create(new_video("chan-1")).unwrap();

        let failed = repo.mark_failed(&video.id, "encoder exploded").unwrap();
        assert_eq!(failed.status, VideoStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("encoder exploded"));
        assert!(failed.processed_prefix.is_none());
    }

    #[test]
    fn test_terminal_state_is_never_rewritten() {
        let repo = SqliteVideoRepository::in_memory().unwrap();
        let video = repo.create(new_video("chan-1")).unwrap();

        repo.mark_ready(&video.id, "processed/chan-1/vid", None, 10.0)
            .unwrap();

        // Second terminal write of either kind is rejected.
        let err = repo.mark_failed(&video.id, "late failure").unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidStatus { .. }));

        let err = repo
            .mark_ready(&video.id, "processed/other", None, 1.0)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidStatus { .. }));

        // Record still reflects the first terminal write.
        let current = repo.get(&video.id).unwrap().unwrap();
        assert_eq!(current.status, VideoStatus::Ready);
        assert_eq!(current.duration_secs, Some(10.0));
    }

    #[test]
    fn test_mark_ready_missing_video() {
        let repo = SqliteVideoRepository::in_memory().unwrap();
        let err = repo.mark_ready("ghost", "prefix", None, 1.0).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[test]
    fn test_list_and_count_with_filter() {
        let repo = SqliteVideoRepository::in_memory().unwrap();
        let a = repo.create(new_video("chan-1")).unwrap();
        let _b = repo.create(new_video("chan-1")).unwrap();
        let _c = repo.create(new_video("chan-2")).unwrap();

        repo.mark_ready(&a.id, "processed/chan-1/a", None, 5.0)
            .unwrap();

        let filter = VideoFilter::new().with_channel("chan-1");
        assert_eq!(repo.count(&filter).unwrap(), 2);

        let ready = VideoFilter::new().with_status("ready");
        let listed = repo.list(&ready).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, a.id);

        let paged = VideoFilter::new().with_limit(1).with_offset(0);
        assert_eq!(repo.list(&paged).unwrap().len(), 1);
    }
}
