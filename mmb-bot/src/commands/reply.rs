//! HTML reply helpers
//!
//! Chat messages arrive HTML-escaped and replies are rendered as HTML, so
//! anything user- or catalog-supplied is escaped before interpolation.

use mmb_common::Track;

/// Escape text for inclusion in an HTML reply
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = entity.strip_prefix('#')?;
            let code = match numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Decode HTML character references
///
/// Unknown or malformed references are left as written.
pub fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let decoded = after
            .find(';')
            .filter(|&end| end > 0 && end <= 10)
            .and_then(|end| decode_entity(&after[..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escaped one-line description of a track
pub fn track_line(track: &Track) -> String {
    escape_html(&track.to_string())
}

/// Command reference
pub fn help_text(prefix: &str) -> String {
    let p = escape_html(prefix);
    let entries = [
        ("help", "", "Show this help message."),
        (
            "tracks",
            " <i>&lt;page number&gt;</i>",
            "Show available tracks. Invoke with no arguments to show the first page.",
        ),
        ("add", " <i>&lt;track id&gt;</i>", "Add a track to playlist by its track ID."),
        ("addalbum", " <i>&lt;album name&gt;</i>", "Add an entire album to playlist."),
        (
            "mode",
            " <i>&lt;playback mode&gt;</i>",
            "Set playback mode. Invoke with no arguments to see current playback mode. \
             Available values are: &quot;single&quot;, &quot;shuffle&quot;, &quot;repeat&quot;, \
             &quot;shufflerepeat&quot;.",
        ),
        (
            "remove",
            " <i>&lt;index&gt;</i>",
            "Remove a track from playlist by its index in the playlist.",
        ),
        ("skip", "", "Skip the current track."),
        ("nowplaying", "", "Show what's playing right now."),
        ("playlist", "", "Show the current playlist."),
        ("start", "", "Start playback."),
        ("stop", "", "Stop playback and rewind to first track in playlist."),
        ("pause", "", "Pause playback."),
        ("unpause", "", "Resume paused playback."),
        ("clear", "", "Stop playback and clear playlist."),
    ];

    let lines: Vec<String> = entries
        .iter()
        .map(|(verb, args, text)| format!("<b>{}{}{}:</b> {}", p, verb, args, text))
        .collect();
    format!("<b>Available Commands:</b><br>{}", lines.join("<br>"))
}

/// Usage hint for a verb invoked without its argument
pub fn usage(prefix: &str, verb: &str, arg: &str) -> String {
    format!(
        "Usage: <b>{}{}</b> <i>&lt;{}&gt;</i>",
        escape_html(prefix),
        verb,
        arg
    )
}

/// Playlist listing with 1-based indices; the current entry is marked
/// while a session is active
pub fn playlist_listing(tracks: &[Track], playing_index: Option<usize>) -> String {
    let lines: Vec<String> = tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if playing_index == Some(i) { " &#9654;" } else { "" };
            format!("<b>{}:</b> {}{}", i + 1, track_line(track), marker)
        })
        .collect();
    format!("<b>Current playlist:</b><br>{}", lines.join("<br>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Rock" & 'Roll'</b>"#),
            "&lt;b&gt;&quot;Rock&quot; &amp; &#39;Roll&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_unescape_named_and_numeric() {
        assert_eq!(unescape_html("!addalbum &quot;Abbey Road&quot;"), "!addalbum \"Abbey Road\"");
        assert_eq!(unescape_html("a &amp;&amp; b"), "a && b");
        assert_eq!(unescape_html("&#33;skip"), "!skip");
        assert_eq!(unescape_html("&#x21;skip"), "!skip");
    }

    #[test]
    fn test_unescape_leaves_malformed() {
        assert_eq!(unescape_html("AT&T"), "AT&T");
        assert_eq!(unescape_html("&bogus; &"), "&bogus; &");
        assert_eq!(unescape_html("&#xZZ;"), "&#xZZ;");
    }

    #[test]
    fn test_escape_round_trip() {
        let text = "Simon & Garfunkel <Live>";
        assert_eq!(unescape_html(&escape_html(text)), text);
    }

    #[test]
    fn test_help_uses_prefix() {
        let help = help_text("#");
        assert!(help.contains("<b>#skip:</b>"));
        assert!(help.contains("<b>#unpause:</b>"));
    }

    #[test]
    fn test_playlist_listing_is_one_based() {
        let track = |id: i64, title: &str| Track {
            id,
            path: format!("/m/{}.mp3", id),
            title: title.to_string(),
            artists: None,
            album: None,
            track_num: None,
            disc_num: None,
        };
        let listing = playlist_listing(&[track(1, "A"), track(2, "B & C")], Some(1));
        assert!(listing.contains("<b>1:</b> A<br>"));
        assert!(listing.contains("<b>2:</b> B &amp; C &#9654;"));
    }
}
