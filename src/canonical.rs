//! Canonical destination models handed to callers.

/// Identifies which source produced a metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct TagOrigin {
    pub id: String,
    pub name: String,
}

/// A name/role pair in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Credit {
    pub person: String,
    pub role: String,
}

/// Canonical series summary, produced for search results and series lookups.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CanonicalSeries {
    pub id: String,
    pub name: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub start_year: Option<i64>,
    pub count_of_issues: Option<i64>,
    pub format: Option<String>,
    pub genres: Vec<String>,
    pub aliases: Vec<String>,
}

/// Canonical per-issue metadata record. Produced once per resolution call and
/// owned exclusively by the caller afterwards; it has no identity beyond the
/// issue/series id pair.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CanonicalMetadata {
    pub tag_origin: Option<TagOrigin>,
    pub issue_id: Option<String>,
    pub series_id: Option<String>,
    pub publisher: Option<String>,
    /// Normalized issue number (leading zeros stripped, alpha suffix kept).
    pub issue: Option<String>,
    pub series: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub characters: Vec<String>,
    pub credits: Vec<Credit>,
    pub cover_url: Option<String>,
    pub variant_cover_urls: Vec<String>,
    pub issue_count: Option<i64>,
    pub volume: Option<i64>,
    pub year: Option<i64>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    /// ISO language code.
    pub language: Option<String>,
    /// Country display name.
    pub country: Option<String>,
    pub maturity_rating: Option<String>,
    pub web_link: Option<String>,
    pub format: Option<String>,
}

impl CanonicalMetadata {
    /// True when the record carries no identity, i.e. resolution found no
    /// match and no error occurred.
    pub fn is_empty(&self) -> bool {
        self.issue_id.is_none() && self.series_id.is_none()
    }
}

/// Maps an empty or whitespace-only string to `None`.
pub fn opt_string(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{opt_string, CanonicalMetadata};

    #[test]
    fn test_opt_string_drops_blank_values() {
        assert_eq!(opt_string(""), None);
        assert_eq!(opt_string("   "), None);
        assert_eq!(opt_string("Detective Comics"), Some("Detective Comics".to_string()));
    }

    #[test]
    fn test_default_metadata_is_empty() {
        let metadata = CanonicalMetadata::default();
        assert!(metadata.is_empty());
        assert!(metadata.genres.is_empty());
        assert!(metadata.credits.is_empty());
    }
}
