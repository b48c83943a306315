//! Hyperlink detection inside note text

/// Shortest extracted link that counts as a link
const MIN_LINK_LEN: usize = 12;

const SCHEMES: [&str; 2] = ["http://", "https://"];

/// Find the first `http://` or `https://` link in `text`
///
/// The scheme is matched case-insensitively and the link runs up to the
/// first whitespace or control character. Returns `None` when no scheme is
/// present or the link is shorter than 12 characters.
pub fn parse_first_link(text: &str) -> Option<&str> {
    let lowered = text.to_ascii_lowercase();
    let start = SCHEMES
        .iter()
        .filter_map(|scheme| lowered.find(scheme))
        .min()?;

    let rest = &text[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c.is_control())
        .unwrap_or(rest.len());
    let link = &rest[..end];

    if link.chars().count() < MIN_LINK_LEN {
        return None;
    }
    Some(link)
}
