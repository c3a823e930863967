//! Intermediate value records produced by row aggregation and stored in the
//! structured cache as JSON.
//!
//! Records are value objects: each pipeline stage hands complete copies
//! onward and retains nothing. A refreshed record supersedes the cached one,
//! it never mutates it in place.

/// One series row, with the authoritative issue count used by the cache
/// consistency gate.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct GcdSeries {
    pub id: i64,
    pub name: String,
    pub sort_name: String,
    pub notes: String,
    pub year_began: Option<i64>,
    pub year_ended: Option<i64>,
    pub count_of_issues: Option<i64>,
    pub publisher_name: String,
    /// Free-text publishing format tag.
    pub format: String,
    pub image: String,
    /// Whether a cover lookup was attempted. An empty `image` alone cannot
    /// distinguish "no cover exists" from "never looked".
    pub cover_downloaded: bool,
}

/// One issue with its per-story one-to-many fields already aggregated into
/// typed lists.
///
/// `story_ids`, `story_titles` and `synopses` come from the same grouped
/// query and are index-aligned per story only when all three are present;
/// lengths may legitimately differ when stories lack fields, so no consumer
/// may assume equal length without checking.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct GcdIssue {
    pub id: i64,
    /// Partially structured date text, parsed opportunistically later.
    pub key_date: String,
    pub number: String,
    pub title: String,
    pub series_id: i64,
    pub notes: String,
    pub volume: Option<i64>,
    pub maturity_rating: String,
    pub country: String,
    pub country_iso: String,
    pub language: String,
    pub language_iso: String,
    pub story_ids: Vec<String>,
    pub story_titles: Vec<String>,
    pub genres: Vec<String>,
    pub synopses: Vec<String>,
    pub characters: Vec<String>,
    pub image: String,
    pub alt_image_urls: Vec<String>,
    pub credits: Vec<GcdCredit>,
    pub covers_downloaded: bool,
}

/// One creator credit. The role label is passed through verbatim: issue-level
/// role names and story-level credit-type names are distinct vocabularies and
/// are never unified.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct GcdCredit {
    pub name: String,
    pub gcd_role: String,
}
