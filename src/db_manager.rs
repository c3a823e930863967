//! Relational query layer over the GCD SQLite dump.
//!
//! Every operation opens its own connection: lookups are user-driven, not a
//! hot path, and per-call connections keep the layer free of shared state.
//! All queries are read-only except `ensure_index`, which creates the one
//! index the issue list query needs to perform acceptably.

use std::path::PathBuf;

use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::aggregation::{aggregate_issue, IssueShape, RawIssueRow};
use crate::error::{DataFault, ResolverError};
use crate::records::{GcdCredit, GcdIssue, GcdSeries};
use crate::SOURCE_NAME;

/// Story rows of other types (ads, covers, text pieces) are excluded from
/// aggregation; type 19 is the comic story itself.
const COMIC_STORY_TYPE_ID: i64 = 19;
const ISSUE_LIST_INDEX_NAME: &str = "issue_id_on_type_id";

pub struct DbManager {
    db_file: PathBuf,
}

impl DbManager {
    pub fn new(db_file: impl Into<PathBuf>) -> Self {
        Self {
            db_file: db_file.into(),
        }
    }

    fn open(&self) -> Result<Connection, ResolverError> {
        if self.db_file.as_os_str().is_empty() {
            return Err(ResolverError::data(
                SOURCE_NAME,
                DataFault::MissingConfig,
                "Database path is empty, specify a path and filename!",
            ));
        }
        Connection::open(&self.db_file).map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))
    }

    /// DB access probe used by configuration UIs.
    pub fn check_status(&self) -> (String, bool) {
        let probe = || -> Result<(), ResolverError> {
            let conn = self.open()?;
            conn.prepare("SELECT * FROM gcd_credit_type LIMIT 1")
                .and_then(|mut stmt| stmt.query([]).map(|_| ()))
                .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))
        };
        match probe() {
            Ok(()) => ("The DB access test was successful".to_string(), true),
            Err(error) => {
                debug!("DB access test failed: {error}");
                ("DB access failed".to_string(), false)
            }
        }
    }

    /// Idempotently creates the index the issue list query depends on.
    /// The check goes to `sqlite_master` on every call rather than a
    /// process-local flag, so a dump swapped underneath a long-lived process
    /// is still indexed.
    pub fn ensure_index(&self) -> Result<(), ResolverError> {
        let conn = self.open()?;
        let existing: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND name = ?1",
                params![ISSUE_LIST_INDEX_NAME],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        if existing.is_none() {
            debug!("Creating index {ISSUE_LIST_INDEX_NAME} on gcd_story");
            conn.execute(
                "CREATE INDEX issue_id_on_type_id ON gcd_story (type_id, issue_id)",
                [],
            )
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        }
        Ok(())
    }

    pub fn search_series(&self, series_name: &str) -> Result<Vec<GcdSeries>, ResolverError> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT gcd_series.id AS id, gcd_series.name AS series_name, \
                 gcd_series.sort_name AS sort_name, gcd_series.notes AS notes, \
                 gcd_series.year_began AS year_began, gcd_series.year_ended AS year_ended, \
                 gcd_series.issue_count AS issue_count, gcd_publisher.name AS publisher_name \
                 FROM gcd_publisher \
                 LEFT JOIN gcd_series ON gcd_series.publisher_id = gcd_publisher.id \
                 WHERE gcd_series.name LIKE ?1",
            )
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        let rows = stmt
            .query_map(params![series_name], |row| series_from_row(row, false))
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;

        let mut results = Vec::new();
        for series in rows {
            results.push(series.map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?);
        }
        Ok(results)
    }

    pub fn series(&self, series_id: i64) -> Result<Option<GcdSeries>, ResolverError> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT gcd_series.id AS id, gcd_series.name AS series_name, \
             gcd_series.sort_name AS sort_name, gcd_series.notes AS notes, \
             gcd_series.year_began AS year_began, gcd_series.year_ended AS year_ended, \
             gcd_series.issue_count AS issue_count, gcd_publisher.name AS publisher_name, \
             gcd_series.publishing_format AS format \
             FROM gcd_publisher \
             LEFT JOIN gcd_series ON gcd_series.publisher_id = gcd_publisher.id \
             WHERE gcd_series.id = ?1",
            params![series_id],
            |row| series_from_row(row, true),
        )
        .optional()
        .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))
    }

    /// Id of the first issue of a series, used for the series cover lookup.
    pub fn first_issue_id(&self, series_id: i64) -> Result<Option<i64>, ResolverError> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT gcd_series.first_issue_id FROM gcd_series WHERE gcd_series.id = ?1",
            params![series_id],
            |row| row.get::<_, Option<i64>>(0),
        )
        .optional()
        .map(|found| found.flatten())
        .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))
    }

    /// Summary-shape issue listing for a series. The story-joined shape is
    /// tried first; when every issue of the series lacks qualifying story
    /// rows it returns nothing, and the issue-only fallback shape runs.
    pub fn issues_for_series(&self, series_id: i64) -> Result<Vec<GcdIssue>, ResolverError> {
        let conn = self.open()?;

        let issues = summary_rows(
            &conn,
            "SELECT gcd_issue.id AS id, gcd_issue.key_date AS key_date, \
             gcd_issue.number AS number, gcd_issue.title AS issue_title, \
             gcd_issue.series_id AS series_id, \
             GROUP_CONCAT(CASE WHEN gcd_story.title IS NOT NULL AND gcd_story.title != '' THEN \
             gcd_story.title END, '\n') AS story_titles \
             FROM gcd_issue \
             LEFT JOIN gcd_story ON gcd_story.issue_id = gcd_issue.id \
             WHERE gcd_issue.series_id = ?1 AND gcd_story.type_id = ?2 \
             GROUP BY gcd_issue.id",
            params![series_id, COMIC_STORY_TYPE_ID],
            true,
        )?;
        if !issues.is_empty() {
            return Ok(issues);
        }

        summary_rows(
            &conn,
            "SELECT gcd_issue.id AS id, gcd_issue.key_date AS key_date, \
             gcd_issue.number AS number, gcd_issue.title AS issue_title, \
             gcd_issue.series_id AS series_id \
             FROM gcd_issue \
             WHERE gcd_issue.series_id = ?1",
            params![series_id],
            false,
        )
    }

    /// Summary-shape issues matched by number and key-date year prefix, with
    /// the same two-shape fallback as `issues_for_series`.
    pub fn issues_by_number_and_year(
        &self,
        series_id: i64,
        issue_number: &str,
        year: Option<i64>,
    ) -> Result<Vec<GcdIssue>, ResolverError> {
        let conn = self.open()?;
        let year_search = match year {
            Some(year) => format!("{year}%"),
            None => "%".to_string(),
        };

        let issues = summary_rows(
            &conn,
            "SELECT gcd_issue.id AS id, gcd_issue.key_date AS key_date, \
             gcd_issue.number AS number, gcd_issue.title AS issue_title, \
             gcd_issue.series_id AS series_id, \
             GROUP_CONCAT(CASE WHEN gcd_story.title IS NOT NULL AND gcd_story.title != '' THEN \
             gcd_story.title END, '\n') AS story_titles \
             FROM gcd_issue \
             LEFT JOIN gcd_story ON gcd_story.issue_id = gcd_issue.id \
             WHERE gcd_issue.series_id = ?1 AND gcd_story.type_id = ?2 \
             AND gcd_issue.number = ?3 AND gcd_issue.key_date LIKE ?4 \
             GROUP BY gcd_issue.id",
            params![series_id, COMIC_STORY_TYPE_ID, issue_number, year_search],
            true,
        )?;
        if !issues.is_empty() {
            return Ok(issues);
        }

        summary_rows(
            &conn,
            "SELECT gcd_issue.id AS id, gcd_issue.key_date AS key_date, \
             gcd_issue.number AS number, gcd_issue.title AS issue_title, \
             gcd_issue.series_id AS series_id \
             FROM gcd_issue \
             WHERE gcd_issue.series_id = ?1 AND gcd_issue.number = ?2 \
             AND gcd_issue.key_date LIKE ?3",
            params![series_id, issue_number, year_search],
            false,
        )
    }

    /// Complete-shape single issue, or `None` when the id is unknown.
    pub fn issue_by_id(&self, issue_id: i64) -> Result<Option<GcdIssue>, ResolverError> {
        let conn = self.open()?;

        let row = conn
            .query_row(
                "SELECT gcd_issue.id AS id, gcd_issue.key_date AS key_date, \
                 gcd_issue.number AS number, gcd_issue.title AS issue_title, \
                 gcd_issue.series_id AS series_id, gcd_issue.notes AS issue_notes, \
                 gcd_issue.volume AS volume, gcd_issue.rating AS maturity_rating, \
                 gcd_story.characters AS characters, \
                 stddata_country.name AS country, stddata_country.code AS country_iso, \
                 stddata_language.name AS language, stddata_language.code AS language_iso, \
                 GROUP_CONCAT(CASE WHEN gcd_story.title IS NOT NULL AND gcd_story.title != '' THEN \
                 gcd_story.title END, '\n') AS story_titles, \
                 GROUP_CONCAT(CASE WHEN gcd_story.genre IS NOT NULL AND gcd_story.genre != '' THEN \
                 gcd_story.genre END, '\n') AS genres, \
                 GROUP_CONCAT(CASE WHEN gcd_story.synopsis IS NOT NULL AND gcd_story.synopsis != '' THEN \
                 gcd_story.synopsis END, '\n\n') AS synopses, \
                 GROUP_CONCAT(CASE WHEN gcd_story.id IS NOT NULL AND gcd_story.id != '' THEN \
                 gcd_story.id END, '\n') AS story_ids \
                 FROM gcd_issue \
                 LEFT JOIN gcd_story ON gcd_story.issue_id = gcd_issue.id \
                 LEFT JOIN gcd_indicia_publisher ON gcd_issue.indicia_publisher_id = gcd_indicia_publisher.id \
                 LEFT JOIN gcd_series ON gcd_issue.series_id = gcd_series.id \
                 LEFT JOIN stddata_country ON gcd_indicia_publisher.country_id = stddata_country.id \
                 LEFT JOIN stddata_language ON gcd_series.language_id = stddata_language.id \
                 WHERE gcd_issue.id = ?1 AND gcd_story.type_id = ?2 \
                 GROUP BY gcd_issue.id",
                params![issue_id, COMIC_STORY_TYPE_ID],
                |row| complete_row(row, true),
            )
            .optional()
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        if let Some(raw) = row {
            return Ok(Some(aggregate_issue(raw, IssueShape::Complete)));
        }

        // The issue may have no qualifying story rows at all.
        let row = conn
            .query_row(
                "SELECT gcd_issue.id AS id, gcd_issue.key_date AS key_date, \
                 gcd_issue.number AS number, gcd_issue.title AS issue_title, \
                 gcd_issue.series_id AS series_id, gcd_issue.notes AS issue_notes, \
                 gcd_issue.volume AS volume, gcd_issue.rating AS maturity_rating, \
                 stddata_country.name AS country, stddata_country.code AS country_iso, \
                 stddata_language.name AS language, stddata_language.code AS language_iso \
                 FROM gcd_issue \
                 LEFT JOIN gcd_indicia_publisher ON gcd_issue.indicia_publisher_id = gcd_indicia_publisher.id \
                 LEFT JOIN gcd_series ON gcd_issue.series_id = gcd_series.id \
                 LEFT JOIN stddata_country ON gcd_indicia_publisher.country_id = stddata_country.id \
                 LEFT JOIN stddata_language ON gcd_series.language_id = stddata_language.id \
                 WHERE gcd_issue.id = ?1",
                params![issue_id],
                |row| complete_row(row, false),
            )
            .optional()
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        Ok(row.map(|raw| aggregate_issue(raw, IssueShape::Complete)))
    }

    pub fn issue_id_for_number(
        &self,
        series_id: i64,
        issue_number: &str,
    ) -> Result<Option<i64>, ResolverError> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT gcd_issue.id FROM gcd_issue \
             WHERE gcd_issue.series_id = ?1 AND gcd_issue.number = ?2",
            params![series_id, issue_number],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))
    }

    /// Issue-level credits then per-story credits, iterating story ids in
    /// list order. No deduplication and no role-vocabulary unification:
    /// duplicate person/role pairs from different stories stay separate.
    pub fn merged_credits(
        &self,
        issue_id: i64,
        story_ids: &[String],
    ) -> Result<Vec<GcdCredit>, ResolverError> {
        let conn = self.open()?;
        let mut credits = Vec::new();

        let mut stmt = conn
            .prepare(
                "SELECT gcd_issue_credit.credit_name AS role, gcd_creator_name_detail.name AS name \
                 FROM gcd_issue_credit \
                 INNER JOIN gcd_creator_name_detail \
                 ON gcd_issue_credit.creator_id = gcd_creator_name_detail.id \
                 WHERE gcd_issue_credit.issue_id = ?1",
            )
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        let rows = stmt
            .query_map(params![issue_id], |row| {
                Ok(GcdCredit {
                    name: row.get("name")?,
                    gcd_role: row.get("role")?,
                })
            })
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        for credit in rows {
            credits.push(credit.map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?);
        }

        let mut stmt = conn
            .prepare(
                "SELECT gcd_creator_name_detail.name AS name, gcd_credit_type.name AS role \
                 FROM gcd_story_credit \
                 INNER JOIN gcd_credit_type \
                 ON gcd_credit_type.id = gcd_story_credit.credit_type_id \
                 INNER JOIN gcd_creator_name_detail \
                 ON gcd_creator_name_detail.id = gcd_story_credit.creator_id \
                 WHERE gcd_story_credit.story_id = ?1",
            )
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        for story_id in story_ids {
            let rows = stmt
                .query_map(params![story_id], |row| {
                    Ok(GcdCredit {
                        name: row.get("name")?,
                        gcd_role: row.get("role")?,
                    })
                })
                .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
            for credit in rows {
                credits.push(credit.map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?);
            }
        }

        Ok(credits)
    }
}

fn summary_rows(
    conn: &Connection,
    sql: &str,
    query_params: &[&dyn rusqlite::ToSql],
    with_stories: bool,
) -> Result<Vec<GcdIssue>, ResolverError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
    let rows = stmt
        .query_map(query_params, |row| summary_row(row, with_stories))
        .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;

    let mut issues = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        issues.push(aggregate_issue(raw, IssueShape::Summary));
    }
    Ok(issues)
}

fn series_from_row(row: &Row<'_>, with_format: bool) -> rusqlite::Result<GcdSeries> {
    Ok(GcdSeries {
        id: row.get("id")?,
        name: row
            .get::<_, Option<String>>("series_name")?
            .unwrap_or_default(),
        sort_name: row
            .get::<_, Option<String>>("sort_name")?
            .unwrap_or_default(),
        notes: row.get::<_, Option<String>>("notes")?.unwrap_or_default(),
        year_began: row.get("year_began")?,
        year_ended: row.get("year_ended")?,
        count_of_issues: row.get("issue_count")?,
        publisher_name: row
            .get::<_, Option<String>>("publisher_name")?
            .unwrap_or_default(),
        format: if with_format {
            row.get::<_, Option<String>>("format")?.unwrap_or_default()
        } else {
            String::new()
        },
        image: String::new(),
        cover_downloaded: false,
    })
}

fn summary_row(row: &Row<'_>, with_stories: bool) -> rusqlite::Result<RawIssueRow> {
    Ok(RawIssueRow {
        id: row.get("id")?,
        key_date: row.get("key_date")?,
        number: row.get("number")?,
        title: row.get("issue_title")?,
        series_id: row.get("series_id")?,
        story_titles: if with_stories {
            row.get("story_titles")?
        } else {
            None
        },
        ..RawIssueRow::default()
    })
}

fn complete_row(row: &Row<'_>, with_stories: bool) -> rusqlite::Result<RawIssueRow> {
    let mut raw = RawIssueRow {
        id: row.get("id")?,
        key_date: row.get("key_date")?,
        number: row.get("number")?,
        title: row.get("issue_title")?,
        series_id: row.get("series_id")?,
        notes: row.get("issue_notes")?,
        // The volume column is free text in the dump; digits or nothing.
        volume: row
            .get::<_, Option<String>>("volume")?
            .and_then(|v| v.trim().parse::<i64>().ok()),
        maturity_rating: row.get("maturity_rating")?,
        country: row.get("country")?,
        country_iso: row.get("country_iso")?,
        language: row.get("language")?,
        language_iso: row.get("language_iso")?,
        ..RawIssueRow::default()
    };
    if with_stories {
        raw.characters = row.get("characters")?;
        raw.story_titles = row.get("story_titles")?;
        raw.genres = row.get("genres")?;
        raw.synopses = row.get("synopses")?;
        raw.story_ids = row.get("story_ids")?;
    }
    Ok(raw)
}
