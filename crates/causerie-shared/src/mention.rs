//! `@name` mention handling for the input bar and message bodies.

use crate::types::Participant;

/// A piece of a message body, either plain text or an `@word` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// Includes the leading `@`.
    Mention(&'a str),
}

/// The mention query being typed, if any.
///
/// Looks at the last `@` in `text`: the query is everything after it, as
/// long as the `@` is the final character or is directly followed by a
/// non-whitespace character.
pub fn active_query(text: &str) -> Option<&str> {
    let at = text.rfind('@')?;
    let query = &text[at + 1..];
    match query.chars().next() {
        Some(c) if c.is_whitespace() => None,
        _ => Some(query),
    }
}

/// Participants whose name contains `query` (case-insensitive), excluding
/// the local identity, sorted by name.
pub fn suggest<'a, I>(participants: I, query: &str) -> Vec<&'a Participant>
where
    I: IntoIterator<Item = &'a Participant>,
{
    let needle = query.to_lowercase();
    let mut matches: Vec<&Participant> = participants
        .into_iter()
        .filter(|p| !p.is_local() && p.name.to_lowercase().contains(&needle))
        .collect();
    matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.uuid.cmp(&b.uuid)));
    matches
}

/// Replace the mention being typed with `@name ` (trailing space).
///
/// Returns the text unchanged when it contains no `@`.
pub fn complete(text: &str, name: &str) -> String {
    match text.rfind('@') {
        Some(at) => format!("{}@{} ", &text[..at], name),
        None => text.to_string(),
    }
}

/// Split a message body into plain text and `@word` tokens, where a word is
/// a run of alphanumerics and underscores.
pub fn split_mentions(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c != '@' {
            continue;
        }
        let mut end = idx + 1;
        while let Some(&(next_idx, next)) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                end = next_idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        if end == idx + 1 {
            continue;
        }
        if plain_start < idx {
            segments.push(Segment::Text(&text[plain_start..idx]));
        }
        segments.push(Segment::Mention(&text[idx..end]));
        plain_start = end;
    }

    if plain_start < text.len() {
        segments.push(Segment::Text(&text[plain_start..]));
    }
    segments
}
