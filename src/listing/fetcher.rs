use crate::config::{AccountCredentials, CrawlConfig};
use crate::listing::error::{ListingError, ListingResult};
use crate::listing::parser::parse_listing;
use crate::listing::signer::RequestSigner;
use crate::listing::types::{ListingPage, ListingRequest, PageSource, SessionFactory};
use crate::metrics;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// Longest slice of an error body carried into an error message
const ERROR_BODY_LIMIT: usize = 300;

/// Lists directory pages over one HTTP session
pub struct PageFetcher {
    client: reqwest::Client,
    base_url: Url,
    credentials: AccountCredentials,
    signer: RequestSigner,
    api_version: String,
    max_retries: u32,
}

impl PageFetcher {
    pub fn new(
        credentials: AccountCredentials,
        base_url: Url,
        config: &CrawlConfig,
    ) -> ListingResult<Self> {
        let signer = RequestSigner::new(&credentials)?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
            signer,
            api_version: config.api_version.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Full request URL: the base URL with the already encoded resource path
    /// appended and the query parameters in name order. The path is the same
    /// text the signature covers.
    pub fn request_url(&self, request: &ListingRequest) -> ListingResult<Url> {
        if self.base_url.cannot_be_a_base() {
            return Err(ListingError::InvalidUrl(format!(
                "{} cannot be a base",
                self.base_url
            )));
        }
        let mut url = self.base_url.clone();
        let base_path = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", base_path, request.resource_uri));
        url.query_pairs_mut()
            .clear()
            .extend_pairs(request.query.iter());

        Ok(url)
    }

    /// Fetch a page, retrying transient failures when `max_retries` allows
    pub async fn fetch(&self, request: &ListingRequest) -> ListingResult<ListingPage> {
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: None,
            ..Default::default()
        };
        let mut attempts = 0;

        loop {
            match self.fetch_once(request).await {
                Ok(page) => {
                    metrics::record_page_fetched(page.entry_count());
                    return Ok(page);
                }
                Err(e) if e.is_transient() && attempts < self.max_retries => {
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| Duration::from_secs(5));
                    attempts += 1;
                    tracing::warn!(
                        "Listing {} failed (attempt {}/{}), retrying in {:?}: {}",
                        request.resource_uri,
                        attempts,
                        self.max_retries,
                        delay,
                        e
                    );
                    metrics::record_fetch_retry();
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    metrics::record_fetch_failure();
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_once(&self, request: &ListingRequest) -> ListingResult<ListingPage> {
        let url = self.request_url(request)?;
        let signed = self.signer.sign(request, &self.api_version);

        let response = self
            .client
            .get(url)
            .header("x-ms-version", &self.api_version)
            .header(ACCEPT, "application/json")
            .header("x-ms-client-request-id", &signed.request_id)
            .header("x-ms-date", &signed.date)
            .header(AUTHORIZATION, &signed.authorization)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ListingError::Authentication {
                status: status.as_u16(),
                message: summarize_body(&body),
            });
        }
        if !status.is_success() {
            return Err(ListingError::UnexpectedStatus {
                status: status.as_u16(),
                message: summarize_body(&body),
            });
        }

        let page = parse_listing(&body)?;
        tracing::debug!(
            directory = %request.directory_path,
            directories = page.directories.len(),
            files = page.files.len(),
            more = page.has_more(),
            "Fetched listing page"
        );

        Ok(page)
    }
}

impl PageSource for PageFetcher {
    async fn fetch_page(
        &self,
        directory_path: &str,
        marker: Option<&str>,
    ) -> ListingResult<ListingPage> {
        let request = ListingRequest::new(&self.credentials, directory_path, marker);
        self.fetch(&request).await
    }
}

/// Opens a fresh [`PageFetcher`] (and HTTP client) for every worker
#[derive(Debug, Clone)]
pub struct ShareClient {
    credentials: AccountCredentials,
    base_url: Url,
    config: CrawlConfig,
}

impl ShareClient {
    /// Client for `https://<account>.<endpoint_suffix>`
    pub fn new(credentials: AccountCredentials, config: CrawlConfig) -> ListingResult<Self> {
        let base_url = Url::parse(&credentials.service_url(&config.endpoint_suffix))?;
        Self::with_base_url(credentials, base_url, config)
    }

    pub fn with_base_url(
        credentials: AccountCredentials,
        base_url: Url,
        config: CrawlConfig,
    ) -> ListingResult<Self> {
        // Reject bad key material before any request goes out
        credentials.decoded_key()?;
        Ok(Self {
            credentials,
            base_url,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl SessionFactory for ShareClient {
    type Session = PageFetcher;

    fn open_session(&self) -> ListingResult<PageFetcher> {
        PageFetcher::new(self.credentials.clone(), self.base_url.clone(), &self.config)
    }

    fn describe(&self) -> (String, String) {
        (
            self.credentials.account_name.clone(),
            self.credentials.share_name.clone(),
        )
    }
}

fn summarize_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
