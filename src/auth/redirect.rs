use axum::http::Uri;

/// Landing page used when there is no acceptable `next` destination.
pub const DEFAULT_LANDING: &str = "/";

/// Same-origin relative path from a caller-supplied `next`, or the default
/// landing page.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(next) if is_local_path(next) => next.to_string(),
        _ => DEFAULT_LANDING.to_string(),
    }
}

fn is_local_path(next: &str) -> bool {
    // Browsers treat `\` like `/`, so `/\evil.example` is protocol-relative too.
    if !next.starts_with('/') || next.starts_with("//") || next.contains('\\') {
        return false;
    }
    if next.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return false;
    }
    match next.parse::<Uri>() {
        Ok(uri) => uri.scheme().is_none() && uri.authority().is_none(),
        Err(_) => false,
    }
}
