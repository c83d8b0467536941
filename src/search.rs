//! Web search providers.
//!
//! `MockGoogle` fabricates deterministic result pages locally, with no
//! simulated latency. `GoogleCustomSearch` calls the Google Custom Search
//! JSON API; queries are idempotent reads, so transient remote failures are
//! re-attempted up to the configured bound with a fixed sleep between
//! attempts, each re-attempt recorded with status `retry`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::SharedSettings;
use crate::contract::{ImageHit, SearchHit, SearchOptions, SearchService};
use crate::error::{Result, ServiceError};
use crate::logger::{CallLogger, CallStatus, LogRecord};

const CAPABILITY: &str = "search_service";

/// Sample result domains the mock rotates through.
const DOMAINS: &[(&str, &str)] = &[
    ("wikipedia.org", "Wikipedia"),
    ("github.com", "Github"),
    ("stackoverflow.com", "Stackoverflow"),
    ("medium.com", "Medium"),
    ("docs.rs", "Docs"),
    ("reddit.com", "Reddit"),
    ("news.ycombinator.com", "News"),
];

const SNIPPET_TEMPLATES: &[&str] = &[
    "Learn about {} with comprehensive guides and tutorials...",
    "Everything you need to know about {}. Expert insights and analysis...",
    "Discover {} - detailed information, tips, and best practices...",
    "A complete guide to {}. Step-by-step instructions and examples...",
];

const IMAGE_DIMENSIONS: &[(u32, u32)] = &[
    (800, 600),
    (1024, 768),
    (1920, 1080),
    (640, 480),
    (1280, 720),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockGoogleSettings {
    pub results_per_query: usize,
    pub include_snippets: bool,
}

impl Default for MockGoogleSettings {
    fn default() -> Self {
        MockGoogleSettings {
            results_per_query: 10,
            include_snippets: true,
        }
    }
}

/// Fabricates plausible result pages without touching the network.
pub struct MockGoogleService {
    results_per_query: usize,
    include_snippets: bool,
    logger: CallLogger,
}

const MOCK_PROVIDER: &str = "MockGoogle";

impl MockGoogleService {
    pub fn new(settings: MockGoogleSettings, logger: CallLogger) -> Self {
        MockGoogleService {
            results_per_query: settings.results_per_query,
            include_snippets: settings.include_snippets,
            logger,
        }
    }
}

#[async_trait]
impl SearchService for MockGoogleService {
    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        let count = options.num_results.min(self.results_per_query);
        let slug = query.replace(' ', "+");

        let results = (0..count)
            .map(|i| {
                let (domain, display) = DOMAINS[i % DOMAINS.len()];
                let snippet = if self.include_snippets {
                    SNIPPET_TEMPLATES[i % SNIPPET_TEMPLATES.len()].replace("{}", query)
                } else {
                    String::new()
                };
                SearchHit {
                    title: format!("Result {}: {query} - {display}", i + 1),
                    url: format!("https://www.{domain}/search?q={slug}&result={}", i + 1),
                    display_url: domain.to_string(),
                    snippet,
                    position: i + 1,
                }
            })
            .collect::<Vec<_>>();

        self.logger.record(LogRecord::new(
            CAPABILITY,
            MOCK_PROVIDER,
            "search",
            CallStatus::Success,
            serde_json::json!({"query": query, "results_count": results.len(), "language": options.language}),
        ));
        Ok(results)
    }

    async fn search_images(&self, query: &str, num_results: usize) -> Result<Vec<ImageHit>> {
        let count = num_results.min(self.results_per_query);
        let slug = query.replace(' ', "-");

        let results = (0..count)
            .map(|i| {
                let (width, height) = IMAGE_DIMENSIONS[i % IMAGE_DIMENSIONS.len()];
                ImageHit {
                    title: format!("Image {}: {query}", i + 1),
                    url: format!("https://picsum.photos/id/{}/{width}/{height}", i + 10),
                    thumbnail_url: format!("https://picsum.photos/id/{}/200/150", i + 10),
                    source_url: format!("https://example.com/images/{slug}-{}", i + 1),
                    width,
                    height,
                    position: i + 1,
                }
            })
            .collect::<Vec<_>>();

        self.logger.record(LogRecord::new(
            CAPABILITY,
            MOCK_PROVIDER,
            "search_images",
            CallStatus::Success,
            serde_json::json!({"query": query, "results_count": results.len()}),
        ));
        Ok(results)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCustomSearchSettings {
    pub api_key: String,
    pub engine_id: String,
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
}

fn default_search_base_url() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

/// Google Custom Search JSON API client.
pub struct GoogleCustomSearchService {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    base_url: String,
    retry_attempts: u32,
    logger: CallLogger,
}

const GOOGLE_PROVIDER: &str = "GoogleCustomSearch";

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    items: Vec<ApiItem>,
}

#[derive(Deserialize)]
struct ApiItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(rename = "displayLink", default)]
    display_link: String,
    #[serde(default)]
    snippet: String,
    image: Option<ApiImage>,
}

#[derive(Deserialize)]
struct ApiImage {
    #[serde(rename = "thumbnailLink", default)]
    thumbnail_link: String,
    #[serde(rename = "contextLink", default)]
    context_link: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

impl GoogleCustomSearchService {
    pub fn new(
        settings: GoogleCustomSearchSettings,
        shared: SharedSettings,
        logger: CallLogger,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(shared.timeout_seconds))
            .build()
            .map_err(|e| ServiceError::Config(format!("failed to build http client: {e}")))?;
        Ok(GoogleCustomSearchService {
            client,
            api_key: settings.api_key,
            engine_id: settings.engine_id,
            base_url: settings.base_url,
            retry_attempts: shared.retry_attempts.max(1),
            logger,
        })
    }

    async fn fetch(&self, params: Vec<(&'static str, String)>) -> Result<ApiResponse> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ServiceError::Remote(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Remote(format!(
                "search API returned {status}: {body}"
            )));
        }

        response
            .json::<ApiResponse>()
            .await
            .map_err(|e| ServiceError::Remote(format!("malformed search response: {e}")))
    }

    /// Fixed-bound retry for an idempotent read. Sleeps one second between
    /// attempts, no jitter.
    async fn fetch_with_retry(
        &self,
        action: &str,
        query: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<ApiResponse> {
        let mut attempt = 1;
        loop {
            match self.fetch(params.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    warn!(attempt, error = %e, query, "Search attempt failed, retrying");
                    self.logger.record(LogRecord::new(
                        CAPABILITY,
                        GOOGLE_PROVIDER,
                        action,
                        CallStatus::Retry,
                        serde_json::json!({"query": query, "attempt": attempt, "error": e.to_string()}),
                    ));
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn fail(&self, action: &str, query: &str, error: ServiceError) -> ServiceError {
        self.logger.record(LogRecord::new(
            CAPABILITY,
            GOOGLE_PROVIDER,
            action,
            CallStatus::Failure,
            serde_json::json!({"query": query, "error": error.to_string()}),
        ));
        error
    }
}

#[async_trait]
impl SearchService for GoogleCustomSearchService {
    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        let mut params = vec![
            ("key", self.api_key.clone()),
            ("cx", self.engine_id.clone()),
            ("q", query.to_string()),
            ("num", options.num_results.min(10).to_string()),
            ("hl", options.language.clone()),
        ];
        if let Some(region) = &options.region {
            params.push(("gl", region.clone()));
        }

        let response = match self.fetch_with_retry("search", query, params).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail("search", query, e)),
        };

        let results = response
            .items
            .into_iter()
            .enumerate()
            .map(|(i, item)| SearchHit {
                title: item.title,
                url: item.link,
                display_url: item.display_link,
                snippet: item.snippet,
                position: i + 1,
            })
            .collect::<Vec<_>>();

        info!(query, results = results.len(), "Search completed");
        self.logger.record(LogRecord::new(
            CAPABILITY,
            GOOGLE_PROVIDER,
            "search",
            CallStatus::Success,
            serde_json::json!({"query": query, "results_count": results.len()}),
        ));
        Ok(results)
    }

    async fn search_images(&self, query: &str, num_results: usize) -> Result<Vec<ImageHit>> {
        let params = vec![
            ("key", self.api_key.clone()),
            ("cx", self.engine_id.clone()),
            ("q", query.to_string()),
            ("num", num_results.min(10).to_string()),
            ("searchType", "image".to_string()),
        ];

        let response = match self.fetch_with_retry("search_images", query, params).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail("search_images", query, e)),
        };

        let results = response
            .items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let image = item.image.unwrap_or(ApiImage {
                    thumbnail_link: String::new(),
                    context_link: String::new(),
                    width: 0,
                    height: 0,
                });
                ImageHit {
                    title: item.title,
                    url: item.link,
                    thumbnail_url: image.thumbnail_link,
                    source_url: image.context_link,
                    width: image.width,
                    height: image.height,
                    position: i + 1,
                }
            })
            .collect::<Vec<_>>();

        self.logger.record(LogRecord::new(
            CAPABILITY,
            GOOGLE_PROVIDER,
            "search_images",
            CallStatus::Success,
            serde_json::json!({"query": query, "results_count": results.len()}),
        ));
        Ok(results)
    }
}
