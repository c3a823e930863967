//! Read-through metadata resolution pipeline.
//!
//! One `GcdResolver` call runs cache check, any necessary relational
//! queries, the optional cover fetch and normalization sequentially on the
//! calling thread, then returns a fully formed canonical record or a typed
//! error. Query and fetch failures propagate immediately; nothing is retried
//! internally.

use log::{debug, info};

use crate::cache_manager::{issue_list_is_usable, CacheManager};
use crate::canonical::{CanonicalMetadata, CanonicalSeries, TagOrigin};
use crate::config::GcdConfig;
use crate::cover_resolver::{find_issue_images, HttpPageFetcher, PageFetcher};
use crate::db_manager::DbManager;
use crate::error::{DataFault, ResolverError};
use crate::normalizer::{map_issue_to_metadata, map_series};
use crate::records::{GcdIssue, GcdSeries};
use crate::{SOURCE_ID, SOURCE_NAME};

pub struct GcdResolver {
    config: GcdConfig,
    db: DbManager,
    cache: CacheManager,
    fetcher: Box<dyn PageFetcher>,
    origin: TagOrigin,
}

impl GcdResolver {
    pub fn new(config: GcdConfig) -> Result<Self, ResolverError> {
        Self::with_fetcher(config, Box::new(HttpPageFetcher::new()))
    }

    /// Constructor taking an explicit page fetcher, used to exercise cover
    /// resolution without a network.
    pub fn with_fetcher(
        config: GcdConfig,
        fetcher: Box<dyn PageFetcher>,
    ) -> Result<Self, ResolverError> {
        let cache = CacheManager::new(&config.cache_dir_path())
            .map_err(|e| ResolverError::from_sqlite(SOURCE_NAME, e))?;
        let db = DbManager::new(config.db_file.clone());
        Ok(Self {
            config,
            db,
            cache,
            fetcher,
            origin: TagOrigin {
                id: SOURCE_ID.to_string(),
                name: SOURCE_NAME.to_string(),
            },
        })
    }

    fn check_db_file_configured(&self) -> Result<(), ResolverError> {
        if self.config.db_file.is_empty() {
            return Err(ResolverError::data(
                SOURCE_NAME,
                DataFault::MissingConfig,
                "Database path is empty, specify a path and filename!",
            ));
        }
        Ok(())
    }

    /// DB access probe for configuration UIs.
    pub fn check_status(&self) -> (String, bool) {
        self.db.check_status()
    }

    /// Series search by name pattern. Results are cached per query string;
    /// `refresh_cache` forces a re-query.
    pub fn search_series(
        &self,
        series_name: &str,
        refresh_cache: bool,
    ) -> Result<Vec<CanonicalSeries>, ResolverError> {
        info!("{SOURCE_NAME} searching: {series_name}");

        if !refresh_cache {
            let cached = self.cache.search_results(SOURCE_ID, series_name);
            if !cached.is_empty() {
                debug!("Serving {} search results from cache", cached.len());
                return Ok(cached.iter().map(map_series).collect());
            }
        }

        self.check_db_file_configured()?;
        let results = self.db.search_series(series_name)?;
        self.cache
            .store_search_results(SOURCE_ID, series_name, &results);
        Ok(results.iter().map(map_series).collect())
    }

    pub fn fetch_series(&self, series_id: i64) -> Result<CanonicalSeries, ResolverError> {
        Ok(map_series(&self.fetch_series_record(series_id)?))
    }

    /// Read-through series record. A cached record is usable only when its
    /// complete flag is set; otherwise the series is re-queried and the
    /// refreshed record supersedes the cached one.
    fn fetch_series_record(&self, series_id: i64) -> Result<GcdSeries, ResolverError> {
        if let Some((series, complete)) = self.cache.series(SOURCE_ID, series_id) {
            if complete {
                return Ok(series);
            }
        }

        let mut series = self.db.series(series_id)?.ok_or_else(|| {
            ResolverError::data(
                SOURCE_NAME,
                DataFault::Fatal,
                format!("series {series_id} not found"),
            )
        })?;

        if self.config.download_gui_covers {
            if let Some(first_issue_id) = self.db.first_issue_id(series_id)? {
                let (cover, _) =
                    find_issue_images(self.fetcher.as_ref(), &self.config.website, first_issue_id)?;
                series.image = cover;
            }
            series.cover_downloaded = true;
        }

        self.cache.store_series(SOURCE_ID, &series, true);
        Ok(series)
    }

    /// All issues of a series as canonical summaries. The cached collection
    /// is reused only when the consistency gate passes; otherwise the whole
    /// list is re-fetched, never partially merged.
    pub fn fetch_issues_in_series(
        &self,
        series_id: i64,
    ) -> Result<Vec<CanonicalMetadata>, ResolverError> {
        let cached = self.cache.series_issues(SOURCE_ID, series_id);
        let series = self.fetch_series_record(series_id)?;

        if issue_list_is_usable(cached.len(), series.count_of_issues) {
            debug!(
                "Serving {} cached issues for series {series_id}",
                cached.len()
            );
            return Ok(cached
                .iter()
                .map(|issue| self.normalize(issue, &series))
                .collect());
        }

        self.db.ensure_index()?;
        let issues = self.db.issues_for_series(series_id)?;
        self.cache.store_issues(SOURCE_ID, &issues, false);

        Ok(issues
            .iter()
            .map(|issue| self.normalize(issue, &series))
            .collect())
    }

    /// Single-issue resolution by issue id. Returns an empty record when the
    /// id matches nothing; that is not an error.
    pub fn fetch_issue_by_id(&self, issue_id: i64) -> Result<CanonicalMetadata, ResolverError> {
        self.check_db_file_configured()?;
        let Some(issue) = self.fetch_issue_record(issue_id)? else {
            return Ok(CanonicalMetadata::default());
        };
        let series = self.fetch_series_record(issue.series_id)?;
        Ok(self.normalize(&issue, &series))
    }

    /// Single-issue resolution by series id + issue number.
    pub fn fetch_issue(
        &self,
        series_id: i64,
        issue_number: &str,
    ) -> Result<CanonicalMetadata, ResolverError> {
        self.check_db_file_configured()?;
        match self.db.issue_id_for_number(series_id, issue_number)? {
            Some(issue_id) => self.fetch_issue_by_id(issue_id),
            None => Ok(CanonicalMetadata::default()),
        }
    }

    /// Tagging match path: summary issues filtered by number and key-date
    /// year across several candidate series, with covers fetched when tag
    /// covers are enabled.
    pub fn fetch_issues_by_number_and_year(
        &self,
        series_ids: &[i64],
        issue_number: &str,
        year: Option<i64>,
    ) -> Result<Vec<CanonicalMetadata>, ResolverError> {
        self.check_db_file_configured()?;
        self.db.ensure_index()?;

        let mut results = Vec::new();
        for &series_id in series_ids {
            let series = self.fetch_series_record(series_id)?;
            for mut issue in self.db.issues_by_number_and_year(series_id, issue_number, year)? {
                if self.config.download_tag_covers {
                    let (image, variants) =
                        find_issue_images(self.fetcher.as_ref(), &self.config.website, issue.id)?;
                    issue.image = image;
                    issue.alt_image_urls = variants;
                    issue.covers_downloaded = true;
                }
                results.push(self.normalize(&issue, &series));
            }
        }
        Ok(results)
    }

    /// Read-through complete issue record: aggregation, credit merge and the
    /// optional cover fetch, in that order. Relational resolution finishes
    /// before the cover fetch runs, so a network failure surfaces only after
    /// credits and text fields were resolvable; nothing partial is cached.
    fn fetch_issue_record(&self, issue_id: i64) -> Result<Option<GcdIssue>, ResolverError> {
        if let Some((issue, complete)) = self.cache.issue(SOURCE_ID, issue_id) {
            if complete {
                debug!("Serving issue {issue_id} from cache");
                return Ok(Some(issue));
            }
        }

        self.db.ensure_index()?;
        let Some(mut issue) = self.db.issue_by_id(issue_id)? else {
            return Ok(None);
        };

        issue.credits = self.db.merged_credits(issue_id, &issue.story_ids)?;

        if self.config.download_gui_covers || self.config.download_tag_covers {
            let (image, variants) =
                find_issue_images(self.fetcher.as_ref(), &self.config.website, issue.id)?;
            issue.image = image;
            issue.alt_image_urls = variants;
            issue.covers_downloaded = true;
        }

        self.cache
            .store_issues(SOURCE_ID, std::slice::from_ref(&issue), true);
        Ok(Some(issue))
    }

    fn normalize(&self, issue: &GcdIssue, series: &GcdSeries) -> CanonicalMetadata {
        map_issue_to_metadata(
            issue,
            series,
            &self.origin,
            &self.config.website,
            self.config.use_series_start_as_volume,
        )
    }
}
