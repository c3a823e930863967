//! Cover image resolution from the source website's cover listing page.
//!
//! The page for an issue lists every known cover scan as an `img` with the
//! `cover_img` class. The first image in document order is the primary
//! cover, the rest are variants. Image URLs carry a cache-busting query
//! suffix that is not stable across fetches, so it is stripped before
//! storage. Zero matching images is a valid outcome, not an error.

use std::io::Read;
use std::time::Duration;

use log::debug;
use scraper::{Html, Selector};

use crate::error::{NetworkFault, ResolverError};

const COVER_IMG_SELECTOR: &str = "img.cover_img";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport-level fetch outcome, classified for error reporting.
#[derive(Debug)]
pub enum FetchError {
    Timeout,
    Transport {
        status: Option<u16>,
        message: String,
    },
}

/// Seam between cover resolution and the HTTP client, so failures can be
/// injected without a network.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Production fetcher over a shared ureq agent.
pub struct HttpPageFetcher {
    agent: ureq::Agent,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self { agent }
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.agent.get(url).call().map_err(classify_ureq_error)?;
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|error| {
                if error.kind() == std::io::ErrorKind::TimedOut {
                    FetchError::Timeout
                } else {
                    FetchError::Transport {
                        status: None,
                        message: format!("Failed to read response: {error}"),
                    }
                }
            })?;
        Ok(body)
    }
}

fn classify_ureq_error(error: ureq::Error) -> FetchError {
    match error {
        ureq::Error::Status(code, _) => FetchError::Transport {
            status: Some(code),
            message: format!("HTTP status {code}"),
        },
        ureq::Error::Transport(transport) => {
            let message = transport.to_string();
            if message.contains("timed out") || message.contains("timeout") {
                FetchError::Timeout
            } else {
                FetchError::Transport {
                    status: None,
                    message,
                }
            }
        }
    }
}

/// Extracts cover URLs from the listing page in document order, stripping
/// everything from the first `?` of each `src`. Returns the primary cover
/// (empty string when none) and the variant list.
pub fn extract_cover_urls(html: &str) -> (String, Vec<String>) {
    let selector = Selector::parse(COVER_IMG_SELECTOR).expect("static selector");
    let document = Html::parse_document(html);

    let mut cover = String::new();
    let mut variants = Vec::new();
    for (index, element) in document.select(&selector).enumerate() {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let src = src.split('?').next().unwrap_or(src).to_string();
        if index == 0 {
            cover = src;
        } else {
            variants.push(src);
        }
    }
    (cover, variants)
}

/// Fetches the cover listing page for an issue and resolves primary +
/// variant cover URLs. Transport failures are never retried and surface with
/// the fetched URL so the caller can distinguish "no cover" from "fetch
/// failed".
pub fn find_issue_images(
    fetcher: &dyn PageFetcher,
    website: &str,
    issue_id: i64,
) -> Result<(String, Vec<String>), ResolverError> {
    let url = cover_page_url(website, issue_id);
    debug!("Fetching cover listing {url}");
    let html = fetcher.fetch(&url).map_err(|error| match error {
        FetchError::Timeout => ResolverError::network(
            &url,
            NetworkFault::Timeout,
            None,
            format!("Connection to {website} timed out"),
        ),
        FetchError::Transport { status, message } => {
            ResolverError::network(&url, NetworkFault::Transport, status, message)
        }
    })?;
    Ok(extract_cover_urls(&html))
}

fn cover_page_url(website: &str, issue_id: i64) -> String {
    format!("{}/issue/{issue_id}/cover/4", website.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::{
        cover_page_url, extract_cover_urls, find_issue_images, FetchError, PageFetcher,
    };
    use crate::error::{NetworkFault, ResolverError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher(&'static str);

    impl PageFetcher for StaticFetcher {
        fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    struct TimeoutFetcher {
        calls: AtomicUsize,
    }

    impl PageFetcher for TimeoutFetcher {
        fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Timeout)
        }
    }

    const THREE_COVER_PAGE: &str = r#"
        <html><body>
        <img class="cover_img" src="https://files1.comics.org/img/a.jpg?1"/>
        <img class="other" src="https://files1.comics.org/img/skip.jpg"/>
        <img class="cover_img" src="https://files1.comics.org/img/b.jpg?2"/>
        <img class="cover_img" src="https://files1.comics.org/img/c.jpg?3"/>
        </body></html>
    "#;

    #[test]
    fn test_first_image_is_primary_rest_are_variants_suffix_stripped() {
        let (cover, variants) = extract_cover_urls(THREE_COVER_PAGE);
        assert_eq!(cover, "https://files1.comics.org/img/a.jpg");
        assert_eq!(
            variants,
            vec![
                "https://files1.comics.org/img/b.jpg",
                "https://files1.comics.org/img/c.jpg",
            ]
        );
    }

    #[test]
    fn test_zero_cover_images_is_empty_not_error() {
        let fetcher = StaticFetcher("<html><body><p>No covers.</p></body></html>");
        let (cover, variants) =
            find_issue_images(&fetcher, "https://www.comics.org/", 11).expect("should resolve");
        assert!(cover.is_empty());
        assert!(variants.is_empty());
    }

    #[test]
    fn test_timeout_surfaces_as_network_error_without_retry() {
        let fetcher = TimeoutFetcher {
            calls: AtomicUsize::new(0),
        };
        let error = find_issue_images(&fetcher, "https://www.comics.org/", 11)
            .expect_err("timeout should propagate");
        match error {
            ResolverError::Network { fault, status, .. } => {
                assert_eq!(fault, NetworkFault::Timeout);
                assert_eq!(fault.code(), 4);
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cover_page_url_shape() {
        assert_eq!(
            cover_page_url("https://www.comics.org/", 242700),
            "https://www.comics.org/issue/242700/cover/4"
        );
        assert_eq!(
            cover_page_url("https://www.comics.org", 7),
            "https://www.comics.org/issue/7/cover/4"
        );
    }
}
