//! Spotify Web API client for the "currently playing" endpoint.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::error::DisplayError;
use crate::track::{Track, TrackProvider};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const CURRENTLY_PLAYING_URL: &str = "https://api.spotify.com/v1/me/player/currently-playing";
/// Refresh this long before the service-reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
/// Position of the 64px cover in the service's largest-first image list.
const THUMBNAIL_INDEX: usize = 2;

#[derive(Debug)]
struct AccessToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    item: Option<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
    album: Album,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<AlbumImage>,
    #[serde(default)]
    release_date: String,
}

#[derive(Debug, Deserialize)]
struct AlbumImage {
    url: String,
}

pub struct SpotifyProvider {
    credentials: Credentials,
    agent: ureq::Agent,
    token: Option<AccessToken>,
}

impl SpotifyProvider {
    pub fn new(credentials: Credentials, agent: ureq::Agent) -> Self {
        Self {
            credentials,
            agent,
            token: None,
        }
    }

    fn access_token(&mut self) -> Result<String> {
        if let Some(token) = self.token.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let basic = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));
        let body = self
            .agent
            .post(TOKEN_URL)
            .header("Authorization", &format!("Basic {basic}"))
            .send_form([
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .context("token refresh request failed")?
            .body_mut()
            .read_to_string()
            .context("failed to read token response")?;
        let parsed: TokenResponse =
            serde_json::from_str(&body).context("malformed token response")?;

        let lifetime = Duration::from_secs(parsed.expires_in);
        info!(expires_in = parsed.expires_in, "refreshed access token");
        let value = parsed.access_token;
        self.token = Some(AccessToken {
            value: value.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN),
        });
        Ok(value)
    }

    fn query(&mut self) -> Result<Option<Track>> {
        let token = self.access_token()?;
        let response = self
            .agent
            .get(CURRENTLY_PLAYING_URL)
            .header("Authorization", &format!("Bearer {token}"))
            .call();
        let mut response = match response {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(401)) => {
                // Revoked or expired early; fetch a fresh token next cycle.
                self.token = None;
                return Err(anyhow!("access token rejected"));
            }
            Err(err) => return Err(err).context("currently-playing request failed"),
        };
        if response.status().as_u16() == 204 {
            debug!("player idle");
            return Ok(None);
        }
        let body = response
            .body_mut()
            .read_to_string()
            .context("failed to read currently-playing response")?;
        parse_currently_playing(&body)
    }
}

impl TrackProvider for SpotifyProvider {
    fn current_track(&mut self) -> Result<Option<Track>, DisplayError> {
        self.query().map_err(DisplayError::ProviderUnavailable)
    }
}

/// Map a currently-playing payload to a [`Track`].
pub fn parse_currently_playing(body: &str) -> Result<Option<Track>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let playing: CurrentlyPlaying =
        serde_json::from_str(body).context("malformed currently-playing response")?;
    let Some(item) = playing.item else {
        return Ok(None);
    };

    let images = item.album.images;
    let album_art_url = images
        .first()
        .map(|image| image.url.clone())
        .ok_or_else(|| anyhow!("track '{}' has no album art", item.name))?;
    let thumbnail_url = images
        .get(THUMBNAIL_INDEX)
        .or_else(|| images.last())
        .map(|image| image.url.clone());

    Ok(Some(Track {
        artist: Track::join_artists(item.artists.iter().map(|artist| artist.name.as_str())),
        title: item.name,
        album_art_url,
        thumbnail_url,
        release_date: Track::release_month(&item.album.release_date),
    }))
}
