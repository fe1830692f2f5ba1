//! Entry links
//!
//! Entries are addressable as `recnik://word/<id>`, the form handed out by
//! the home-screen widget and accepted by `recnik open`.

/// URL scheme for entry links
pub const LINK_SCHEME: &str = "recnik";

const WORD_HOST: &str = "word";

/// Link to an entry
pub fn entry_link(id: i64) -> String {
    format!("{}://{}/{}", LINK_SCHEME, WORD_HOST, id)
}

/// Parse an entry link into an entry id
///
/// Accepts a trailing slash. Anything else returns `None`.
pub fn parse_entry_link(link: &str) -> Option<i64> {
    let rest = link.trim().strip_prefix(LINK_SCHEME)?.strip_prefix("://")?;
    let (host, path) = rest.split_once('/')?;
    if !host.eq_ignore_ascii_case(WORD_HOST) {
        return None;
    }
    path.trim_end_matches('/').parse().ok()
}
