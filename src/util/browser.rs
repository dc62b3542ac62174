use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("Invalid link: {0}")]
    Invalid(String),
    #[error("Refusing to open {0} link (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Failed to open browser: {0}")]
    Launch(#[from] std::io::Error),
}

/// Parse a link from remote data and make sure it is safe to hand to the OS.
///
/// Anything but http(s) is rejected so a crafted `file:` or custom-scheme URL
/// in repository metadata cannot launch a local handler.
pub fn checked_link(raw: &str) -> Result<Url, OpenError> {
    let url = Url::parse(raw.trim()).map_err(|_| OpenError::Invalid(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(OpenError::UnsupportedScheme(scheme.to_string())),
    }
}

pub fn open_in_browser(raw: &str) -> Result<(), OpenError> {
    let url = checked_link(raw)?;
    tracing::debug!(url = %url, "Opening link in browser");
    open::that(url.as_str())?;
    Ok(())
}
