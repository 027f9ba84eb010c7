use crate::error::DisplayError;

/// Metadata for the track currently playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    /// Artist names joined with `", "`.
    pub artist: String,
    pub album_art_url: String,
    pub thumbnail_url: Option<String>,
    /// `YYYY-MM`, or whatever prefix of it the service knows.
    pub release_date: String,
}

impl Track {
    pub fn join_artists<I, S>(names: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Trim a release date down to year and month.
    pub fn release_month(date: &str) -> String {
        date.chars().take(7).collect()
    }
}

/// Source of "what is playing right now".
pub trait TrackProvider {
    /// `Ok(None)` when nothing is playing.
    fn current_track(&mut self) -> Result<Option<Track>, DisplayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_artists_with_commas() {
        assert_eq!(Track::join_artists(["Daft Punk"]), "Daft Punk");
        assert_eq!(
            Track::join_artists(vec!["A".to_string(), "B".to_string(), "C".to_string()]),
            "A, B, C"
        );
        assert_eq!(Track::join_artists(Vec::<String>::new()), "");
    }

    #[test]
    fn release_month_keeps_year_and_month() {
        assert_eq!(Track::release_month("2013-05-17"), "2013-05");
        assert_eq!(Track::release_month("1999"), "1999");
    }
}
