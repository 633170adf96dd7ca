//! Fuzzy album name matching

use strsim::levenshtein;

/// Pick the album closest to `query`
///
/// Case-insensitive Levenshtein distance; the earliest album wins a tie.
/// Returns `None` only when `albums` is empty.
pub fn best_album_match<'a, S>(query: &str, albums: &'a [S]) -> Option<&'a str>
where
    S: AsRef<str>,
{
    let query = query.to_lowercase();

    let mut best: Option<(&str, usize)> = None;
    for album in albums {
        let album = album.as_ref();
        let distance = levenshtein(&query, &album.to_lowercase());
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((album, distance)),
        }
    }

    best.map(|(album, _)| album)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_case_insensitive() {
        let albums = ["Abbey Road", "Revolver", "Help!"];
        assert_eq!(best_album_match("abbey road", &albums), Some("Abbey Road"));
    }

    #[test]
    fn test_typo_still_matches() {
        let albums = vec!["Kind of Blue".to_string(), "Blue Train".to_string()];
        assert_eq!(best_album_match("kind of bleu", &albums), Some("Kind of Blue"));
    }

    #[test]
    fn test_tie_prefers_first() {
        let albums = ["abd", "abe"];
        assert_eq!(best_album_match("abc", &albums), Some("abd"));
    }

    #[test]
    fn test_no_albums() {
        let albums: [&str; 0] = [];
        assert_eq!(best_album_match("anything", &albums), None);
    }
}
