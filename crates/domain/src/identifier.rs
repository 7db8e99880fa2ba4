//! Normalization of platform references to bare identifiers.
//!
//! Accepted forms, for a playlist:
//! - `37i9dQZF1DXcBWIGoYBM5M`
//! - `spotify:playlist:37i9dQZF1DXcBWIGoYBM5M`
//! - `https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc`
//! - `https://open.spotify.com/intl-de/playlist/37i9dQZF1DXcBWIGoYBM5M`

/// Kind of resource a reference must point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Show,
    Playlist,
    Episode,
}

impl ResourceKind {
    /// Path segment / URI component naming this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Show => "show",
            ResourceKind::Playlist => "playlist",
            ResourceKind::Episode => "episode",
        }
    }
}

/// Extract the bare identifier from an id, URI or URL.
///
/// Identifiers are opaque: any non-empty string without whitespace, `/` or
/// `:` is accepted as is. Returns `None` when the reference is empty or points
/// at a different kind of resource.
pub fn resolve_identifier(raw: &str, kind: ResourceKind) -> Option<String> {
    let trimmed = raw.trim();

    if let Some(rest) = trimmed.strip_prefix("spotify:") {
        let mut parts = rest.split(':');
        let found_kind = parts.next()?;
        let id = parts.next()?;
        if found_kind != kind.as_str() || parts.next().is_some() {
            return None;
        }
        return valid_id(id);
    }

    if trimmed.contains('/') {
        let without_scheme = trimmed
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(trimmed);
        // Query string and fragment are never part of the id
        let path = without_scheme
            .split(['?', '#'])
            .next()
            .unwrap_or(without_scheme);

        let mut segments = path.split('/').skip(1);
        while let Some(segment) = segments.next() {
            if segment == kind.as_str() {
                return segments.next().and_then(valid_id);
            }
        }
        return None;
    }

    valid_id(trimmed)
}

fn valid_id(candidate: &str) -> Option<String> {
    let opaque = candidate
        .chars()
        .all(|c| !c.is_whitespace() && c != '/' && c != ':');
    if !candidate.is_empty() && opaque {
        Some(candidate.to_string())
    } else {
        None
    }
}
