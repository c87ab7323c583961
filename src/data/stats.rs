//! Characteristic parsing for string-encoded stat lines ("3+", "-1", "4", "N/A").

/// Roll target such as "3+" (or a bare "3"). Values outside 1..=7 and placeholders yield None.
pub fn parse_threshold(raw: &str) -> Option<u8> {
    let value = raw.trim().trim_end_matches('+').trim();
    let parsed = value.parse::<u8>().ok()?;
    (1..=7).contains(&parsed).then_some(parsed)
}

/// Plain integer characteristic such as toughness, strength or wounds.
pub fn parse_int(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

/// Armour penetration as a positive magnitude: "-2", "2" and "−2" all give 2; "0" and "-" give 0.
pub fn parse_penetration(raw: &str) -> Option<i32> {
    let value = raw.trim().replace('\u{2212}', "-");
    if value.is_empty() || value == "-" {
        return Some(0);
    }
    value.parse::<i32>().ok().map(i32::abs)
}

/// Threshold embedded in free text, e.g. "Feel No Pain (5+)" -> 5.
pub fn embedded_threshold(text: &str) -> Option<u8> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'+')
        .find_map(|(pos, _)| {
            let digits = bytes[..pos]
                .iter()
                .rev()
                .take_while(|byte| byte.is_ascii_digit())
                .count();
            if digits == 0 {
                return None;
            }
            // ASCII digits are single bytes, so both ends sit on char boundaries.
            parse_threshold(&text[pos - digits..pos])
        })
}
