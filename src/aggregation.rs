//! Row aggregation: one relational row with delimiter-joined columns becomes
//! one `GcdIssue` with typed list fields.
//!
//! Two output shapes exist. The summary shape backs series issue listings and
//! carries only identity, date, number, title and story titles/synopses. The
//! complete shape backs single-issue resolution and adds notes, volume,
//! rating, country, language, characters, genres and story ids. The story
//! join being unavailable is expressed through `None` columns on the raw row,
//! not by a second mapping path, so both query shapes stay semantically
//! identical outside the fields only one of them can populate.

use crate::delimited::{
    split_list, CHARACTER_DELIMITER, LINE_DELIMITER, PARAGRAPH_DELIMITER,
};
use crate::records::GcdIssue;

/// Output shape selector. The two shapes never cross-contaminate: a summary
/// row with complete-only columns set still aggregates to a summary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueShape {
    Complete,
    Summary,
}

/// One issue row as it comes back from the query layer, before any delimiter
/// decoding. Columns the executed query shape did not select stay `None`.
#[derive(Debug, Clone, Default)]
pub struct RawIssueRow {
    pub id: i64,
    pub key_date: Option<String>,
    pub number: Option<String>,
    pub title: Option<String>,
    pub series_id: i64,
    pub notes: Option<String>,
    pub volume: Option<i64>,
    pub maturity_rating: Option<String>,
    pub country: Option<String>,
    pub country_iso: Option<String>,
    pub language: Option<String>,
    pub language_iso: Option<String>,
    pub characters: Option<String>,
    pub story_titles: Option<String>,
    pub genres: Option<String>,
    pub synopses: Option<String>,
    pub story_ids: Option<String>,
}

pub fn aggregate_issue(row: RawIssueRow, shape: IssueShape) -> GcdIssue {
    let mut issue = GcdIssue {
        id: row.id,
        key_date: row.key_date.unwrap_or_default(),
        number: row.number.unwrap_or_default(),
        title: row.title.unwrap_or_default(),
        series_id: row.series_id,
        story_titles: split_list(row.story_titles.as_deref(), LINE_DELIMITER),
        synopses: split_list(row.synopses.as_deref(), PARAGRAPH_DELIMITER),
        ..GcdIssue::default()
    };

    if shape == IssueShape::Complete {
        issue.notes = row.notes.unwrap_or_default();
        issue.volume = row.volume;
        issue.maturity_rating = row.maturity_rating.unwrap_or_default();
        issue.country = row.country.unwrap_or_default();
        issue.country_iso = row.country_iso.unwrap_or_default();
        issue.language = row.language.unwrap_or_default();
        issue.language_iso = row.language_iso.unwrap_or_default();
        issue.characters = split_list(row.characters.as_deref(), CHARACTER_DELIMITER);
        issue.genres = split_list(row.genres.as_deref(), LINE_DELIMITER);
        issue.story_ids = split_list(row.story_ids.as_deref(), LINE_DELIMITER);
    }

    issue
}

#[cfg(test)]
mod tests {
    use super::{aggregate_issue, IssueShape, RawIssueRow};

    fn full_row() -> RawIssueRow {
        RawIssueRow {
            id: 242700,
            key_date: Some("1984-05-00".to_string()),
            number: Some("001".to_string()),
            title: Some("Annual Special".to_string()),
            series_id: 2045,
            notes: Some("Reprint notes".to_string()),
            volume: Some(2),
            maturity_rating: Some("Mature".to_string()),
            country: Some("United States".to_string()),
            country_iso: Some("us".to_string()),
            language: Some("English".to_string()),
            language_iso: Some("en".to_string()),
            characters: Some("Wolverine; Cyclops; Storm".to_string()),
            story_titles: Some("Part One\nPart Two".to_string()),
            genres: Some("superhero\nadventure".to_string()),
            synopses: Some("A hero rises.\n\nA villain falls.".to_string()),
            story_ids: Some("9001\n9002".to_string()),
        }
    }

    #[test]
    fn test_complete_shape_decodes_every_list_field() {
        let issue = aggregate_issue(full_row(), IssueShape::Complete);
        assert_eq!(issue.id, 242700);
        assert_eq!(issue.story_titles, vec!["Part One", "Part Two"]);
        assert_eq!(issue.synopses, vec!["A hero rises.", "A villain falls."]);
        assert_eq!(issue.story_ids, vec!["9001", "9002"]);
        assert_eq!(issue.genres, vec!["superhero", "adventure"]);
        assert_eq!(issue.characters, vec!["Wolverine", "Cyclops", "Storm"]);
        assert_eq!(issue.volume, Some(2));
        assert_eq!(issue.country_iso, "us");
        assert_eq!(issue.language_iso, "en");
    }

    #[test]
    fn test_summary_shape_never_picks_up_complete_fields() {
        let issue = aggregate_issue(full_row(), IssueShape::Summary);
        assert_eq!(issue.story_titles, vec!["Part One", "Part Two"]);
        assert_eq!(issue.synopses, vec!["A hero rises.", "A villain falls."]);
        assert!(issue.story_ids.is_empty());
        assert!(issue.genres.is_empty());
        assert!(issue.characters.is_empty());
        assert_eq!(issue.volume, None);
        assert!(issue.notes.is_empty());
        assert!(issue.country.is_empty());
    }

    #[test]
    fn test_absent_story_join_yields_empty_lists() {
        let row = RawIssueRow {
            id: 7,
            series_id: 9,
            number: Some("7".to_string()),
            ..RawIssueRow::default()
        };
        let issue = aggregate_issue(row, IssueShape::Complete);
        assert!(issue.story_titles.is_empty());
        assert!(issue.synopses.is_empty());
        assert!(issue.story_ids.is_empty());
        assert!(issue.genres.is_empty());
        assert_eq!(issue.number, "7");
    }
}
