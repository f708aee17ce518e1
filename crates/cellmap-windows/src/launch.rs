//! Launch parameters for auxiliary windows.
//!
//! A new window gets its subject tower in the query string so it can
//! initialize itself without waiting for a channel message.

use cellmap_common::TowerId;

/// Query parameter carrying the tower id.
pub const TOWER_ID_PARAM: &str = "towerId";

/// Build `<document>?towerId=<id>`; just the document when there is no tower.
pub fn launch_url(document: &str, tower_id: Option<&TowerId>) -> String {
    match tower_id {
        Some(id) => format!(
            "{document}?{TOWER_ID_PARAM}={}",
            urlencoding::encode(id.as_str())
        ),
        None => document.to_string(),
    }
}

/// Extract the tower id from a launch URL's query string.
///
/// Empty or undecodable values read as absent.
pub fn parse_launch_tower_id(url: &str) -> Option<TowerId> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == TOWER_ID_PARAM)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .filter(|value| !value.is_empty())
        .map(|value| TowerId::new(value.into_owned()))
}
