//! Header allow-listing and layered merging.

use super::types::Headers;

/// Inbound headers forwarded to every task unless configured otherwise.
pub const DEFAULT_FORWARD_HEADERS: [&str; 5] =
    ["authorization", "app-id", "resource-id", "x-trace-id", "cookie"];

/// Keep only allow-listed inbound headers. Names are matched case-insensitively
/// and normalised to lowercase.
pub fn forwarded_headers<'a, I>(incoming: I, allow_list: &[String]) -> Headers
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    incoming
        .into_iter()
        .filter(|(name, _)| allow_list.iter().any(|allowed| allowed.eq_ignore_ascii_case(name)))
        .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
        .collect()
}

/// Overlay `layer` onto `base`; a later header replaces any earlier one whose
/// name differs only in case.
pub fn overlay(base: &mut Headers, layer: &Headers) {
    for (name, value) in layer {
        base.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        base.insert(name.clone(), value.clone());
    }
}

pub fn merged(base: &Headers, layer: Option<&Headers>) -> Headers {
    let mut out = base.clone();
    if let Some(layer) = layer {
        overlay(&mut out, layer);
    }
    out
}
