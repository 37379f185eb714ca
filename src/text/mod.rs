//! Small text utilities shared by the sync components.

/// Longest entity body we will attempt to decode (`#x10FFFF` is 8 chars).
const MAX_ENTITY_LEN: usize = 10;

/// Decode HTML entities in a configuration string.
///
/// Dashboard-sourced titles and messages frequently arrive double-encoded
/// (`&amp;amp;`), so a single decoding pass is applied before display.
/// Unknown or malformed entities are left untouched.
pub fn decode_html_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let decoded = tail
            .find(';')
            .filter(|&end| end > 1 && end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}
