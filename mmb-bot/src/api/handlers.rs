//! HTTP request handlers
//!
//! Thin adapters: parse the request, call the catalog / playback engine,
//! translate results into JSON and status codes. Playlist indices are
//! 1-based on the wire.

use crate::api::server::AppContext;
use crate::error::{Error, PlaybackError};
use crate::playback::{PlayerStatus, StartOutcome};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mmb_common::{PlaybackMode, Track};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

// ============================================================================
// Errors
// ============================================================================

/// API error with its HTTP status
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing request parameter
    #[error("{0}")]
    BadRequest(String),

    /// Rejected by the playback engine
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Unknown track or album
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database or other internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(what) => ApiError::NotFound(what),
            Error::Playback(e) => ApiError::Playback(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Playback(PlaybackError::OutOfRange { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Playback(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(msg) => {
                error!("Request failed: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// Catalog entry as exposed over HTTP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MusicData {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artists: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_num: Option<i64>,
}

impl From<Track> for MusicData {
    fn from(track: Track) -> Self {
        Self {
            id: track.id,
            title: track.title,
            artists: track.artists,
            album: track.album,
            track_num: track.track_num,
            disc_num: track.disc_num,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// 1-based position
    pub index: usize,
    pub playing: bool,
    #[serde(flatten)]
    pub track: MusicData,
}

#[derive(Debug, Deserialize)]
pub struct AddSingleQuery {
    pub trackid: String,
}

#[derive(Debug, Deserialize)]
pub struct AddAllRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeQuery {
    pub mode: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeResponse {
    pub mode: PlaybackMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistLengthResponse {
    pub playlist_length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlbumAddedResponse {
    pub album: String,
    pub added: usize,
    pub playlist_length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    /// "started", "already_playing" or "idle"
    pub outcome: String,
    pub track: Option<MusicData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkipResponse {
    /// Newly started track, absent when playback went idle
    pub track: Option<MusicData>,
}

// ============================================================================
// Health
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "mmb-bot".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /tracks - Whole catalog
pub async fn get_tracks(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<MusicData>>> {
    let tracks = ctx.catalog.list_tracks().await?;
    Ok(Json(tracks.into_iter().map(MusicData::from).collect()))
}

/// GET /albums - Album names
pub async fn get_albums(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(ctx.catalog.list_albums().await?))
}

// ============================================================================
// Playlist Editing
// ============================================================================

/// POST /add_single?trackid=N
pub async fn add_single(
    State(ctx): State<AppContext>,
    Query(query): Query<AddSingleQuery>,
) -> ApiResult<Json<PlaylistLengthResponse>> {
    let id: i64 = query
        .trackid
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("Track id is not a number.".to_string()))?;

    let track = ctx.catalog.lookup_by_id(id).await?;
    info!("Adding track {} via HTTP", id);
    let playlist_length = ctx.engine.add_track(track).await;
    Ok(Json(PlaylistLengthResponse { playlist_length }))
}

/// POST /add_all - JSON `{"ids": [..]}`; all ids must exist
pub async fn add_all(
    State(ctx): State<AppContext>,
    body: Result<Json<AddAllRequest>, JsonRejection>,
) -> ApiResult<Json<PlaylistLengthResponse>> {
    let Json(request) = body.map_err(|_| ApiError::BadRequest("Invalid JSON body.".to_string()))?;

    let tracks = ctx.catalog.lookup_all(&request.ids).await?;
    info!("Adding {} tracks via HTTP", tracks.len());
    let playlist_length = ctx.engine.add_all_tracks(tracks).await;
    Ok(Json(PlaylistLengthResponse { playlist_length }))
}

/// POST /add_album?name=..
pub async fn add_album(
    State(ctx): State<AppContext>,
    Query(query): Query<AlbumQuery>,
) -> ApiResult<Json<AlbumAddedResponse>> {
    if query.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Album name needed.".to_string()));
    }

    let album = ctx
        .catalog
        .find_album(&query.name)
        .await?
        .ok_or_else(|| ApiError::NotFound("no albums in catalog".to_string()))?;
    let tracks = ctx.catalog.tracks_for_album(&album).await?;
    let added = tracks.len();
    let playlist_length = ctx.engine.add_all_tracks(tracks).await;

    Ok(Json(AlbumAddedResponse {
        album,
        added,
        playlist_length,
    }))
}

/// GET /playlist - Snapshot with 1-based indices
pub async fn get_playlist(State(ctx): State<AppContext>) -> Json<Vec<PlaylistEntry>> {
    let snapshot = ctx.engine.snapshot().await;
    let playing = snapshot.playing_index();

    Json(
        snapshot
            .tracks
            .into_iter()
            .enumerate()
            .map(|(i, track)| PlaylistEntry {
                index: i + 1,
                playing: playing == Some(i),
                track: track.into(),
            })
            .collect(),
    )
}

/// DELETE /playlist/:index - Remove by 1-based index
pub async fn remove_from_playlist(
    State(ctx): State<AppContext>,
    Path(index): Path<usize>,
) -> ApiResult<Json<MusicData>> {
    let zero_based = index
        .checked_sub(1)
        .ok_or_else(|| ApiError::BadRequest("Playlist indices start at 1.".to_string()))?;
    let removed = ctx.engine.remove_at(zero_based).await?;
    Ok(Json(removed.into()))
}

/// POST /clear
pub async fn clear(State(ctx): State<AppContext>) -> StatusCode {
    ctx.engine.clear().await;
    StatusCode::NO_CONTENT
}

// ============================================================================
// Mode
// ============================================================================

/// POST /set_mode?mode=..
pub async fn set_mode(
    State(ctx): State<AppContext>,
    Query(query): Query<ModeQuery>,
) -> ApiResult<Json<ModeResponse>> {
    let mode: PlaybackMode = query
        .mode
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid playback mode: {}", query.mode)))?;
    ctx.engine.set_mode(mode).await;
    Ok(Json(ModeResponse { mode }))
}

/// GET /mode
pub async fn get_mode(State(ctx): State<AppContext>) -> Json<ModeResponse> {
    Json(ModeResponse {
        mode: ctx.engine.mode().await,
    })
}

// ============================================================================
// Transport
// ============================================================================

/// POST /start
pub async fn start(State(ctx): State<AppContext>) -> ApiResult<Json<StartResponse>> {
    let (outcome, track) = match ctx.engine.start().await? {
        StartOutcome::Started(track) => ("started", Some(track)),
        StartOutcome::AlreadyPlaying(track) => ("already_playing", Some(track)),
        StartOutcome::Idle => ("idle", None),
    };
    Ok(Json(StartResponse {
        outcome: outcome.to_string(),
        track: track.map(MusicData::from),
    }))
}

/// POST /stop
pub async fn stop(State(ctx): State<AppContext>) -> ApiResult<StatusCode> {
    ctx.engine.stop().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /skip
pub async fn skip(State(ctx): State<AppContext>) -> ApiResult<Json<SkipResponse>> {
    let next = ctx.engine.skip().await?;
    Ok(Json(SkipResponse {
        track: next.map(MusicData::from),
    }))
}

/// POST /pause
pub async fn pause(State(ctx): State<AppContext>) -> ApiResult<StatusCode> {
    ctx.engine.pause().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /unpause
pub async fn unpause(State(ctx): State<AppContext>) -> ApiResult<StatusCode> {
    ctx.engine.unpause().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Status
// ============================================================================

/// GET /nowplaying - Current track, 204 when idle
pub async fn now_playing(State(ctx): State<AppContext>) -> Response {
    match ctx.engine.current_track().await {
        Some(track) => Json(MusicData::from(track)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /state
pub async fn get_state(State(ctx): State<AppContext>) -> Json<PlayerStatus> {
    Json(ctx.engine.status().await)
}

// ============================================================================
// Chat Command Bridge
// ============================================================================

/// POST /command - Plain-text chat message; replies with the HTML answer
pub async fn command(State(ctx): State<AppContext>, body: String) -> Response {
    match ctx.commands.handle_command(&body).await {
        Some(reply) => (StatusCode::OK, reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
