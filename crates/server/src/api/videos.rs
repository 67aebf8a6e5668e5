//! Video API handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use clipstream_core::{
    pipeline::{JobRequest, PipelineError},
    repository::{NewVideo, Video, VideoFilter, VideoStatus},
    store::content_type_for_key,
    transcoder::MASTER_MANIFEST_NAME,
};

use crate::state::AppState;

/// Maximum allowed limit for video queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for video queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing videos
#[derive(Debug, Deserialize)]
pub struct ListVideosParams {
    /// Filter by status (uploading, ready, failed)
    pub status: Option<String>,
    /// Filter by owning channel
    pub channel_id: Option<String>,
    /// Maximum number of videos to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Signed playback URLs for a ready video
#[derive(Debug, Serialize)]
pub struct PlaybackUrls {
    pub master_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Response for video operations
#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub id: String,
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: VideoStatus,
    pub processed_prefix: Option<String>,
    pub thumbnail_key: Option<String>,
    pub duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback: Option<PlaybackUrls>,
}

impl VideoResponse {
    fn from_video(video: Video) -> Self {
        Self {
            id: video.id,
            channel_id: video.channel_id,
            category_id: video.category_id,
            title: video.title,
            description: video.description,
            status: video.status,
            processed_prefix: video.processed_prefix,
            thumbnail_key: video.thumbnail_key,
            duration_secs: video.duration_secs,
            error_message: video.error_message,
            views: video.views,
            likes: video.likes,
            created_at: video.created_at.to_rfc3339(),
            updated_at: video.updated_at.to_rfc3339(),
            playback: None,
        }
    }
}

/// Response for listing videos
#[derive(Debug, Serialize)]
pub struct ListVideosResponse {
    pub videos: Vec<VideoResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct VideoErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<VideoErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(VideoErrorResponse {
            error: message.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Parsed multipart upload.
struct UploadForm {
    channel_id: Option<String>,
    category_id: Option<String>,
    title: Option<String>,
    description: String,
    filename: Option<String>,
    bytes: Option<Vec<u8>>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm {
        channel_id: None,
        category_id: None,
        title: None,
        description: String::new(),
        filename: None,
        bytes: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Invalid multipart body: {}", e)))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                form.filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    api_error(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file field: {}", e),
                    )
                })?;
                form.bytes = Some(bytes.to_vec());
            }
            "channel_id" => form.channel_id = Some(read_text(field).await?),
            "category_id" => form.category_id = Some(read_text(field).await?),
            "title" => form.title = Some(read_text(field).await?),
            "description" => form.description = read_text(field).await?,
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Failed to read form field: {}", e),
        )
    })
}

/// Upload a video.
///
/// Accepts a multipart form with a `file` field plus `channel_id` and
/// optional metadata, creates the record in the uploading state, and
/// queues the transcode job. Responds 202 before any processing runs.
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<VideoResponse>), ApiError> {
    let form = read_upload_form(multipart).await?;

    let bytes = form
        .bytes
        .filter(|b| !b.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing or empty file field"))?;
    let channel_id = form
        .channel_id
        .filter(|c| !c.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing channel_id field"))?;

    let filename = form.filename.unwrap_or_else(|| "video.mp4".to_string());
    let title = form.title.unwrap_or_else(|| filename.clone());

    // The raw upload is published before the record exists, so
    // original_key always names a stored object.
    let raw_key = format!("uploads/{}/{}", channel_id, filename);
    let original_key = state
        .store()
        .upload_buffer(&raw_key, bytes.clone(), content_type_for_key(&raw_key))
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to store upload: {}", e),
            )
        })?;

    let video = state
        .repository()
        .create(NewVideo {
            channel_id: channel_id.clone(),
            category_id: form.category_id,
            title,
            description: form.description,
            original_key,
        })
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let job = JobRequest {
        video_id: video.id.clone(),
        channel_id,
        raw_bytes: bytes,
        original_filename: filename,
    };

    match state.pipeline().submit(job) {
        Ok(()) => Ok((StatusCode::ACCEPTED, Json(VideoResponse::from_video(video)))),
        Err(PipelineError::QueueFull) => {
            // The record must not stay in uploading forever.
            if let Err(e) = state
                .repository()
                .mark_failed(&video.id, "transcode queue full")
            {
                tracing::error!(video_id = %video.id, error = %e, "failed to fail rejected upload");
            }
            Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Transcode queue is full, retry later",
            ))
        }
        Err(e) => {
            if let Err(write_err) = state.repository().mark_failed(&video.id, &e.to_string()) {
                tracing::error!(video_id = %video.id, error = %write_err, "failed to fail rejected upload");
            }
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Get a video by ID.
///
/// Ready videos include signed playback URLs.
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, ApiError> {
    let video = state
        .repository()
        .get(&id)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Video not found: {}", id)))?;

    let mut response = VideoResponse::from_video(video);

    if response.status == VideoStatus::Ready {
        if let Some(prefix) = &response.processed_prefix {
            let ttl = state.signed_url_ttl_secs();
            let master_key = format!("{}/{}", prefix, MASTER_MANIFEST_NAME);
            let master_url = state
                .store()
                .signed_url(&master_key, ttl)
                .await
                .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

            let thumbnail_url = match &response.thumbnail_key {
                Some(key) => Some(
                    state
                        .store()
                        .signed_url(key, ttl)
                        .await
                        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?,
                ),
                None => None,
            };

            response.playback = Some(PlaybackUrls {
                master_url,
                thumbnail_url,
            });
        }
    }

    Ok(Json(response))
}

/// List videos with optional filters.
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListVideosParams>,
) -> Result<Json<ListVideosResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = VideoFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref status) = params.status {
        filter = filter.with_status(status);
    }

    if let Some(ref channel_id) = params.channel_id {
        filter = filter.with_channel(channel_id);
    }

    let videos = state
        .repository()
        .list(&filter)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let total = state
        .repository()
        .count(&filter)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ListVideosResponse {
        videos: videos.into_iter().map(VideoResponse::from_video).collect(),
        total,
        limit,
        offset,
    }))
}
