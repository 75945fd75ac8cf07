//! Track queries and normalized lookup results

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An `(artist, title)` pair to enrich.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackQuery {
    pub artist: String,
    pub title: String,
}

impl TrackQuery {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// Normalized memoization key: `"<artist> - <title>"`, trimmed and lowercased.
    pub fn cache_key(&self) -> String {
        format!(
            "{} - {}",
            self.artist.trim().to_lowercase(),
            self.title.trim().to_lowercase()
        )
    }
}

impl fmt::Display for TrackQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Genres and release year for a track.
///
/// "No data" is the default value (no genres, no year), never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataResult {
    pub genres: BTreeSet<String>,
    pub year: Option<i32>,
}

impl MetadataResult {
    pub fn new(genres: impl IntoIterator<Item = String>, year: Option<i32>) -> Self {
        let mut result = Self {
            genres: BTreeSet::new(),
            year,
        };
        for genre in genres {
            result.add_genre(&genre);
        }
        result
    }

    /// Adds a genre unless an equal one (ignoring case and surrounding
    /// whitespace) is already present. Blank names are skipped.
    pub fn add_genre(&mut self, genre: &str) -> bool {
        let genre = genre.trim();
        if genre.is_empty() {
            return false;
        }

        let lowered = genre.to_lowercase();
        if self.genres.iter().any(|g| g.to_lowercase() == lowered) {
            return false;
        }

        self.genres.insert(genre.to_string())
    }

    /// True when at least one genre is present
    pub fn has_genres(&self) -> bool {
        !self.genres.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty() && self.year.is_none()
    }
}

/// Title-cases a tag: the first letter of every word is uppercased, the rest
/// lowercased. A "word" starts after any non-alphabetic character, so
/// `"hip-hop"` becomes `"Hip-Hop"` and `"drum'n'bass"` becomes `"Drum'N'Bass"`.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;

    for ch in input.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }

    out
}

/// Extracts a year from the first four characters of a date string
/// (`"2000-11-13"`, `"2000"`, `"19"`). Non-numeric or zero prefixes yield `None`.
pub fn parse_year(date: &str) -> Option<i32> {
    let prefix: String = date.trim().chars().take(4).collect();
    prefix.parse::<i32>().ok().filter(|year| *year > 0)
}
