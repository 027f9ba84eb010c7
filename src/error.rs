use thiserror::Error;

/// Failure causes for a single display cycle.
///
/// The display loop never propagates these; they are logged, the surface is
/// cleared and the loop carries on.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The track provider could not be queried or returned malformed data.
    #[error("track provider unavailable: {0:#}")]
    ProviderUnavailable(anyhow::Error),

    /// The image request failed at the transport or HTTP level.
    #[error("failed to fetch {url}: {reason:#}")]
    FetchFailed { url: String, reason: anyhow::Error },

    /// The image bytes arrived but could not be decoded or resized.
    #[error("failed to decode image from {url}: {reason:#}")]
    DecodeFailed { url: String, reason: anyhow::Error },

    /// Presenting to the render surface failed.
    #[error("render error: {0:#}")]
    Render(anyhow::Error),
}
