//! Deterministic mapping of aggregated records into canonical metadata.
//!
//! Pure functions only: the normalizer never touches the cache or the
//! network, and the same inputs always produce the same output.

use crate::canonical::{opt_string, CanonicalMetadata, CanonicalSeries, Credit, TagOrigin};
use crate::issue_number::normalize_issue_number;
use crate::key_date::parse_key_date;
use crate::records::{GcdIssue, GcdSeries};

/// Maps one aggregated issue + its owning series into canonical metadata.
pub fn map_issue_to_metadata(
    issue: &GcdIssue,
    series: &GcdSeries,
    origin: &TagOrigin,
    website: &str,
    use_series_start_as_volume: bool,
) -> CanonicalMetadata {
    let mut md = CanonicalMetadata {
        tag_origin: Some(origin.clone()),
        issue_id: Some(issue.id.to_string()),
        series_id: Some(series.id.to_string()),
        publisher: opt_string(series.publisher_name.clone()),
        issue: opt_string(normalize_issue_number(&issue.number)),
        series: opt_string(series.name.clone()),
        ..CanonicalMetadata::default()
    };

    md.cover_url = opt_string(issue.image.clone());
    md.variant_cover_urls = issue.alt_image_urls.clone();

    // "Logan [disambiguation: Wolverine] - (name) James Howlett" style
    // entries pass through untouched.
    md.characters = issue.characters.clone();

    md.credits = issue
        .credits
        .iter()
        .map(|credit| Credit {
            person: credit.name.clone(),
            role: credit.gcd_role.clone(),
        })
        .collect();

    md.title = if !issue.title.is_empty() {
        Some(issue.title.clone())
    } else {
        opt_string(issue.story_titles.join("; "))
    };

    md.genres = issue.genres.clone();
    md.issue_count = series.count_of_issues;
    md.description = opt_string(build_description(&issue.story_titles, &issue.synopses));
    md.web_link = Some(issue_web_link(website, issue.id));

    md.volume = if use_series_start_as_volume {
        series.year_began
    } else {
        issue.volume
    };

    if !issue.key_date.is_empty() {
        let date = parse_key_date(&issue.key_date);
        md.year = date.year;
        md.month = date.month;
        md.day = date.day;
    } else if series.year_began.is_some() {
        md.year = series.year_began;
    }

    md.language = opt_string(issue.language_iso.clone());
    md.country = opt_string(issue.country.clone());
    // The publishing_format field is a free-text mess; passed through as-is.
    md.format = opt_string(series.format.clone());
    md.maturity_rating = opt_string(issue.maturity_rating.clone());

    md
}

/// Known-fragile pairing heuristic, kept behind this function so a keyed
/// strategy can replace it without touching callers: titles and synopses
/// are paired index-by-index only when their counts happen to match, since
/// the aggregated lists share no key. On any other count the synopses are
/// joined alone and title pairing is discarded entirely.
fn build_description(story_titles: &[String], synopses: &[String]) -> String {
    if synopses.len() == story_titles.len() {
        let mut description = String::new();
        for (title, synopsis) in story_titles.iter().zip(synopses) {
            if !title.is_empty() && !synopsis.is_empty() {
                description.push_str(&format!("{title}: {synopsis}\n\n"));
            }
        }
        description
    } else {
        synopses.join("\n\n")
    }
}

pub fn issue_web_link(website: &str, issue_id: i64) -> String {
    format!("{}/issue/{issue_id}", website.trim_end_matches('/'))
}

/// Maps a series record into the canonical series summary.
pub fn map_series(series: &GcdSeries) -> CanonicalSeries {
    CanonicalSeries {
        id: series.id.to_string(),
        name: series.name.clone(),
        publisher: opt_string(series.publisher_name.clone()),
        description: opt_string(series.notes.clone()),
        image_url: series.image.clone(),
        start_year: series.year_began,
        count_of_issues: series.count_of_issues,
        format: opt_string(series.format.clone()),
        genres: Vec::new(),
        aliases: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{build_description, issue_web_link, map_issue_to_metadata, map_series};
    use crate::canonical::TagOrigin;
    use crate::records::{GcdCredit, GcdIssue, GcdSeries};

    const WEBSITE: &str = "https://www.comics.org/";

    fn origin() -> TagOrigin {
        TagOrigin {
            id: "gcd".to_string(),
            name: "Grand Comics Database".to_string(),
        }
    }

    fn series() -> GcdSeries {
        GcdSeries {
            id: 2045,
            name: "Uncanny Tales".to_string(),
            publisher_name: "Atlas".to_string(),
            year_began: Some(1952),
            count_of_issues: Some(56),
            format: "ongoing series".to_string(),
            ..GcdSeries::default()
        }
    }

    fn issue() -> GcdIssue {
        GcdIssue {
            id: 242700,
            key_date: "1956-08-00".to_string(),
            number: "046".to_string(),
            series_id: 2045,
            story_titles: vec!["Part One".to_string(), "Part Two".to_string()],
            synopses: vec!["A hero rises.".to_string(), "A villain falls.".to_string()],
            language_iso: "en".to_string(),
            country: "United States".to_string(),
            ..GcdIssue::default()
        }
    }

    #[test]
    fn test_equal_counts_pair_titles_with_synopses() {
        let description = build_description(
            &["Part One".to_string(), "Part Two".to_string()],
            &["A hero rises.".to_string(), "A villain falls.".to_string()],
        );
        assert_eq!(description, "Part One: A hero rises.\n\nPart Two: A villain falls.\n\n");
    }

    #[test]
    fn test_unequal_counts_fall_back_to_joined_synopses() {
        let description = build_description(
            &["Part One".to_string(), "Part Two".to_string()],
            &["Only synopsis.".to_string()],
        );
        assert_eq!(description, "Only synopsis.");
    }

    #[test]
    fn test_aligned_pairs_with_blank_members_are_skipped() {
        let description = build_description(
            &["Part One".to_string(), String::new()],
            &["A hero rises.".to_string(), "Orphan synopsis.".to_string()],
        );
        assert_eq!(description, "Part One: A hero rises.\n\n");
    }

    #[test]
    fn test_title_prefers_issue_title_then_joined_story_titles() {
        let md = map_issue_to_metadata(&issue(), &series(), &origin(), WEBSITE, false);
        assert_eq!(md.title.as_deref(), Some("Part One; Part Two"));

        let mut titled = issue();
        titled.title = "The Big One".to_string();
        let md = map_issue_to_metadata(&titled, &series(), &origin(), WEBSITE, false);
        assert_eq!(md.title.as_deref(), Some("The Big One"));

        let mut bare = issue();
        bare.story_titles.clear();
        bare.synopses.clear();
        let md = map_issue_to_metadata(&bare, &series(), &origin(), WEBSITE, false);
        assert_eq!(md.title, None);
    }

    #[test]
    fn test_key_date_wins_over_series_start_year() {
        let md = map_issue_to_metadata(&issue(), &series(), &origin(), WEBSITE, false);
        assert_eq!(md.year, Some(1956));
        assert_eq!(md.month, Some(8));
        assert_eq!(md.day, None);

        let mut undated = issue();
        undated.key_date.clear();
        let md = map_issue_to_metadata(&undated, &series(), &origin(), WEBSITE, false);
        assert_eq!(md.year, Some(1952));
        assert_eq!(md.month, None);
    }

    #[test]
    fn test_volume_override_uses_series_start_year() {
        let mut with_volume = issue();
        with_volume.volume = Some(3);
        let md = map_issue_to_metadata(&with_volume, &series(), &origin(), WEBSITE, false);
        assert_eq!(md.volume, Some(3));

        let md = map_issue_to_metadata(&with_volume, &series(), &origin(), WEBSITE, true);
        assert_eq!(md.volume, Some(1952));
    }

    #[test]
    fn test_passthrough_fields_and_web_link() {
        let mut full = issue();
        full.genres = vec!["horror".to_string()];
        full.credits = vec![GcdCredit {
            name: "Stan Lee".to_string(),
            gcd_role: "script".to_string(),
        }];
        let md = map_issue_to_metadata(&full, &series(), &origin(), WEBSITE, false);

        assert_eq!(md.issue.as_deref(), Some("46"));
        assert_eq!(md.issue_count, Some(56));
        assert_eq!(md.publisher.as_deref(), Some("Atlas"));
        assert_eq!(md.language.as_deref(), Some("en"));
        assert_eq!(md.country.as_deref(), Some("United States"));
        assert_eq!(md.format.as_deref(), Some("ongoing series"));
        assert_eq!(md.genres, vec!["horror"]);
        assert_eq!(md.credits.len(), 1);
        assert_eq!(md.credits[0].person, "Stan Lee");
        assert_eq!(md.credits[0].role, "script");
        assert_eq!(
            md.web_link.as_deref(),
            Some("https://www.comics.org/issue/242700")
        );
        assert_eq!(
            issue_web_link("https://www.comics.org", 7),
            "https://www.comics.org/issue/7"
        );
    }

    #[test]
    fn test_map_series_summary() {
        let summary = map_series(&series());
        assert_eq!(summary.id, "2045");
        assert_eq!(summary.name, "Uncanny Tales");
        assert_eq!(summary.publisher.as_deref(), Some("Atlas"));
        assert_eq!(summary.start_year, Some(1952));
        assert_eq!(summary.count_of_issues, Some(56));
        assert_eq!(summary.description, None);
    }
}
