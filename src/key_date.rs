//! Opportunistic parsing of the partially structured `key_date` column.
//!
//! Key dates look like `1950-03-01` but any component may be `00`, blank or
//! missing entirely. Missing or zero components stay `None`.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyDate {
    pub year: Option<i64>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

pub fn parse_key_date(raw: &str) -> KeyDate {
    let mut parts = raw.trim().splitn(3, '-');

    let year = parts.next().and_then(parse_component::<i64>);
    let month = parts
        .next()
        .and_then(parse_component::<u32>)
        .filter(|m| (1..=12).contains(m));
    let day = parts
        .next()
        .and_then(parse_component::<u32>)
        .filter(|d| (1..=31).contains(d));

    KeyDate { year, month, day }
}

fn parse_component<T: std::str::FromStr + PartialEq + Default>(part: &str) -> Option<T> {
    let trimmed = part.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| !c.is_ascii_digit()) {
        return None;
    }
    match trimmed.parse::<T>() {
        Ok(value) if value != T::default() => Some(value),
        _ => None,
    }
}
