//! Chat command router
//!
//! Turns one raw chat message into an optional HTML reply:
//! 1. HTML-unescape and trim the message
//! 2. Require and strip the command prefix
//! 3. Split with shell-like quoting
//! 4. Dispatch on the verb to the playback engine / catalog
//!
//! Messages that are not commands (no prefix, unbalanced quotes, unknown
//! verb) produce no reply.

pub mod reply;

use crate::catalog::Catalog;
use crate::error::PlaybackError;
use crate::playback::{PlaybackEngine, StartOutcome};
use async_trait::async_trait;
use mmb_common::PlaybackMode;
use reply::{escape_html, track_line, unescape_html, usage};
use tracing::{debug, warn};

/// Something that answers chat commands
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// `None` means the message is not a command and gets no reply
    async fn handle_command(&self, raw: &str) -> Option<String>;
}

/// Command handler backed by the playback engine and catalog
pub struct BotCommandHandler {
    engine: PlaybackEngine,
    catalog: Catalog,
    prefix: String,
    page_size: i64,
}

const PLAYLIST_EMPTY: &str = "Playlist is empty.";
const NOT_PLAYING: &str = "Not playing anything right now.";

impl BotCommandHandler {
    pub fn new(engine: PlaybackEngine, catalog: Catalog, prefix: impl Into<String>, page_size: usize) -> Self {
        Self {
            engine,
            catalog,
            prefix: prefix.into(),
            page_size: i64::try_from(page_size).unwrap_or(i64::MAX).max(1),
        }
    }

    /// Verb and arguments, or `None` if the message is not a command
    fn parse(&self, raw: &str) -> Option<(String, Vec<String>)> {
        let unescaped = unescape_html(raw);
        let body = unescaped.trim().strip_prefix(self.prefix.as_str())?;

        let mut parts = shlex::split(body)?.into_iter();
        let verb = parts.next()?;
        Some((verb, parts.collect()))
    }

    async fn dispatch(&self, verb: &str, args: &[String]) -> Option<String> {
        let reply = match verb {
            "help" => reply::help_text(&self.prefix),
            "tracks" => self.list_tracks(args).await,
            "add" => self.add_track(args).await,
            "addalbum" => self.add_album(args).await,
            "mode" => self.mode(args).await,
            "remove" => self.remove(args).await,
            "skip" => self.skip().await,
            "playlist" => self.playlist().await,
            "nowplaying" => self.now_playing().await,
            "start" => self.start().await,
            "stop" => self.stop().await,
            "clear" => self.clear().await,
            "pause" => self.pause().await,
            "unpause" => self.unpause().await,
            _ => return None,
        };
        Some(reply)
    }

    async fn list_tracks(&self, args: &[String]) -> String {
        let requested = match args.first() {
            None => 1,
            Some(arg) => match arg.parse::<i64>() {
                Ok(page) => page,
                Err(_) => return "Not a valid page number.".to_string(),
            },
        };

        let page = match self.catalog.list_tracks_page(requested, self.page_size).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Track listing failed: {}", e);
                return "Error when listing tracks.".to_string();
            }
        };
        let pagination = page.pagination;

        if pagination.total_pages == 0 {
            return "No tracks available.".to_string();
        }
        if !pagination.contains(requested) {
            return format!(
                "Page {} does not exist. There are {} pages.",
                requested, pagination.total_pages
            );
        }

        let mut out = format!(
            "<b>Showing page {} of {}</b>:<br>",
            pagination.page, pagination.total_pages
        );
        for track in &page.tracks {
            out.push_str(&format!("<b>{}:</b> {}<br>", track.id, track_line(track)));
        }
        if pagination.has_next() {
            out.push_str(&format!(
                "<br>Type <b>{}tracks {}</b> to see the next page.",
                escape_html(&self.prefix),
                pagination.page + 1
            ));
        }
        out
    }

    async fn add_track(&self, args: &[String]) -> String {
        let Some(arg) = args.first() else {
            return usage(&self.prefix, "add", "track id");
        };
        let Ok(id) = arg.parse::<i64>() else {
            return "Invalid track ID.".to_string();
        };

        match self.catalog.lookup_by_id(id).await {
            Ok(track) => {
                let line = track_line(&track);
                self.engine.add_track(track).await;
                format!("<b>Adding track:</b> {}", line)
            }
            Err(e) => {
                debug!("Track lookup for {} failed: {}", id, e);
                "Invalid track ID.".to_string()
            }
        }
    }

    async fn add_album(&self, args: &[String]) -> String {
        if args.is_empty() {
            return "Album name needed.".to_string();
        }
        let query = args.join(" ");

        let album = match self.catalog.find_album(&query).await {
            Ok(Some(album)) => album,
            Ok(None) => return "No albums are in the catalog.".to_string(),
            Err(e) => {
                warn!("Album search failed: {}", e);
                return "Error when searching for albums.".to_string();
            }
        };

        let tracks = match self.catalog.tracks_for_album(&album).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Album track query failed: {}", e);
                return "Database error while fetching album tracks.".to_string();
            }
        };
        if tracks.is_empty() {
            return format!("No tracks found for album {}", escape_html(&album));
        }

        let count = tracks.len();
        self.engine.add_all_tracks(tracks).await;
        format!(
            "Adding album <b>{}</b> to playlist. ({} tracks)",
            escape_html(&album),
            count
        )
    }

    async fn mode(&self, args: &[String]) -> String {
        let Some(arg) = args.first() else {
            return format!("<b>Current playback mode:</b> {}", self.engine.mode().await);
        };

        match arg.parse::<PlaybackMode>() {
            Ok(mode) => {
                self.engine.set_mode(mode).await;
                format!("<b>Changed playback mode to:</b> {}", mode)
            }
            Err(_) => format!("Invalid playback mode: {}", escape_html(&arg.to_lowercase())),
        }
    }

    async fn remove(&self, args: &[String]) -> String {
        if self.engine.status().await.playlist_length == 0 {
            return PLAYLIST_EMPTY.to_string();
        }
        let Some(arg) = args.first() else {
            return usage(&self.prefix, "remove", "index");
        };
        let index = match arg.parse::<usize>() {
            Ok(n) if n >= 1 => n - 1,
            _ => return "Invalid index.".to_string(),
        };

        match self.engine.remove_at(index).await {
            Ok(track) => format!(
                "Removed track <b>{}: {}</b> from playlist.",
                index + 1,
                escape_html(&track.title)
            ),
            Err(PlaybackError::Playing { .. }) => {
                "You can't remove the track that's currently playing.".to_string()
            }
            Err(PlaybackError::OutOfRange { .. }) => "Invalid index.".to_string(),
            Err(e) => e.to_string(),
        }
    }

    async fn skip(&self) -> String {
        if self.engine.status().await.playlist_length == 0 {
            return PLAYLIST_EMPTY.to_string();
        }
        match self.engine.skip().await {
            Ok(_) => "Skipping track.".to_string(),
            Err(_) => NOT_PLAYING.to_string(),
        }
    }

    async fn playlist(&self) -> String {
        let snapshot = self.engine.snapshot().await;
        if snapshot.tracks.is_empty() {
            return PLAYLIST_EMPTY.to_string();
        }
        reply::playlist_listing(&snapshot.tracks, snapshot.playing_index())
    }

    async fn now_playing(&self) -> String {
        match self.engine.current_track().await {
            Some(track) => format!("<b>Now playing:</b> {}", track_line(&track)),
            None => NOT_PLAYING.to_string(),
        }
    }

    async fn start(&self) -> String {
        match self.engine.start().await {
            Ok(StartOutcome::Started(_)) => "Starting playback.".to_string(),
            Ok(StartOutcome::AlreadyPlaying(_)) => "Already playing.".to_string(),
            Ok(StartOutcome::Idle) => {
                "Reached the end of the playlist. Use stop to rewind.".to_string()
            }
            Err(PlaybackError::EmptyPlaylist) => PLAYLIST_EMPTY.to_string(),
            Err(e) => e.to_string(),
        }
    }

    async fn stop(&self) -> String {
        match self.engine.stop().await {
            Ok(()) => "Stopping playback.".to_string(),
            Err(e) => e.to_string(),
        }
    }

    async fn clear(&self) -> String {
        if self.engine.status().await.playlist_length == 0 {
            return PLAYLIST_EMPTY.to_string();
        }
        self.engine.clear().await;
        "Stopping playback and clearing playlist.".to_string()
    }

    async fn pause(&self) -> String {
        match self.engine.pause().await {
            Ok(()) => "Pausing playback.".to_string(),
            Err(_) => NOT_PLAYING.to_string(),
        }
    }

    async fn unpause(&self) -> String {
        match self.engine.unpause().await {
            Ok(()) => "Resuming playback.".to_string(),
            Err(e) => e.to_string(),
        }
    }
}

#[async_trait]
impl CommandHandler for BotCommandHandler {
    async fn handle_command(&self, raw: &str) -> Option<String> {
        let (verb, args) = self.parse(raw)?;
        debug!(verb = %verb, args = ?args, "Chat command");
        self.dispatch(&verb, &args).await
    }
}
