//! Career page scraper - plain HTTP + CSS selectors.
//!
//! This implementation:
//! - Uses reqwest for HTTP requests
//! - Uses scraper crate for HTML parsing
//! - Uses htmd for HTML to Markdown conversion of job descriptions
//!
//! Limitations:
//! - No JavaScript rendering (use for static HTML career pages only)
//!
//! Listing ids come from the page (`data-job-id` or `id` attributes) when
//! available, otherwise from a content hash of the listing text. Either way
//! an unchanged page yields the same ids on every fetch, which the diff
//! engine depends on.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use watcher::{ContentHash, Job, JobCollection, JobScraper};

/// Listing container selectors, tried in order until one matches.
const JOB_SELECTORS: &[&str] = &[
    ".job-listing",
    ".careers-listing",
    ".job-post",
    ".job-card",
    "[data-job-id]",
    "article.job",
    // F1soft-style career sites
    ".features-job",
];

pub struct PageScraper {
    client: reqwest::Client,
}

struct ListingFields {
    title: String,
    url: String,
    location: String,
    department: String,
    description: String,
}

impl PageScraper {
    pub fn new(timeout: Duration) -> Result<Self> {
        // Use a browser-like User-Agent to avoid bot detection
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().unwrap(),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch raw HTML from a URL
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        response
            .text()
            .await
            .context("Failed to read response body")
    }

    /// Extract job listings from a fetched page.
    pub fn parse_jobs(html: &str, source_url: &str) -> Vec<Job> {
        let document = Html::parse_document(html);
        let observed_at = Utc::now();

        for selector_str in JOB_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };

            let jobs: Vec<Job> = document
                .select(&selector)
                .filter_map(|element| Self::parse_listing(element, source_url, observed_at))
                .collect();

            // Stop at the first selector that produces listings
            if !jobs.is_empty() {
                debug!(
                    selector = selector_str,
                    count = jobs.len(),
                    "Extracted job listings"
                );
                return jobs;
            }
        }

        Vec::new()
    }

    fn parse_listing(
        element: ElementRef<'_>,
        source_url: &str,
        observed_at: DateTime<Utc>,
    ) -> Option<Job> {
        let text: String = element.text().collect();

        let id = element
            .value()
            .attr("data-job-id")
            .or_else(|| element.value().attr("id"))
            .map(str::to_string)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| ContentHash::from_content(&text).to_hex());

        let is_features_listing = element.value().classes().any(|class| class == "features-job");
        let fields = if is_features_listing {
            Self::parse_features_listing(element, source_url)
        } else {
            Self::parse_generic_listing(element, source_url)
        };

        // Listings without a title are navigation chrome, not jobs
        if fields.title.is_empty() {
            return None;
        }

        Some(Job {
            id,
            title: fields.title,
            description: fields.description,
            location: fields.location,
            department: fields.department,
            url: fields.url,
            posted_at: None,
            observed_at,
        })
    }

    fn parse_generic_listing(element: ElementRef<'_>, source_url: &str) -> ListingFields {
        ListingFields {
            title: select_text(element, ".job-title, h2, h3").unwrap_or_default(),
            url: select_href(element, "a[href]", source_url).unwrap_or_default(),
            location: select_text(element, ".job-location, .location").unwrap_or_default(),
            department: select_text(element, ".job-department, .department, .category")
                .unwrap_or_default(),
            description: select_description(element),
        }
    }

    /// F1soft-style markup: title and link under `h3 a`, tags as a list.
    fn parse_features_listing(element: ElementRef<'_>, source_url: &str) -> ListingFields {
        let mut description_parts = Vec::new();
        if let Some(job_type) = select_text(element, ".job-tag li:nth-child(1) a") {
            description_parts.push(format!("Type: {job_type}"));
        }
        if let Some(level) = select_text(element, ".job-tag li:nth-child(2) a") {
            description_parts.push(format!("Level: {level}"));
        }
        if let Some(category) = select_text(element, ".job-tag li:nth-child(3) a") {
            description_parts.push(format!("Category: {category}"));
        }
        if let Some(deadline) = select_text(element, "p.days") {
            description_parts.push(deadline);
        }

        ListingFields {
            title: select_text(element, "h3 a").unwrap_or_default(),
            url: select_href(element, "h3 a", source_url).unwrap_or_default(),
            location: select_text(element, ".icon-map-pin + span").unwrap_or_default(),
            department: select_text(element, ".box-content a.fw-600").unwrap_or_default(),
            description: description_parts.join(" | "),
        }
    }

    /// Derive a display name from the source URL host
    /// (`careers.acme.com` or `acme.com/careers` → `Acme`).
    pub fn extract_company_name(source_url: &str) -> String {
        let host = Url::parse(source_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string));

        let Some(host) = host else {
            return "Unknown Company".to_string();
        };

        let labels: Vec<&str> = host.split('.').collect();
        let name = if labels.len() > 1 {
            labels[labels.len() - 2]
        } else {
            labels[0]
        };
        title_case(name)
    }
}

#[async_trait]
impl JobScraper for PageScraper {
    async fn scrape(&self, url: &str) -> Result<JobCollection> {
        let html = self
            .fetch_html(url)
            .await
            .with_context(|| format!("failed to fetch {url}"))?;
        debug!(url = %url, bytes = html.len(), "Fetched career page");

        let jobs = Self::parse_jobs(&html, url);
        info!(url = %url, jobs = jobs.len(), "Parsed career page");

        Ok(JobCollection {
            company_name: Self::extract_company_name(url),
            source_url: url.to_string(),
            observed_at: Utc::now(),
            jobs,
        })
    }
}

fn select_text(element: ElementRef<'_>, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    element
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

fn select_href(element: ElementRef<'_>, selector_str: &str, source_url: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    let href = element
        .select(&selector)
        .find_map(|el| el.value().attr("href"))?;
    Some(resolve_href(href, source_url))
}

/// First description-ish block, converted to Markdown.
fn select_description(element: ElementRef<'_>) -> String {
    let Ok(selector) = Selector::parse(".job-description, .description, p") else {
        return String::new();
    };
    element
        .select(&selector)
        .next()
        .map(|el| html_to_markdown(&el.inner_html()).trim().to_string())
        .unwrap_or_default()
}

/// Convert HTML to Markdown
fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|_| {
        // Fallback: strip tags and return plain text
        let fragment = Html::parse_fragment(html);
        fragment.root_element().text().collect::<String>()
    })
}

/// Resolve a possibly-relative href against the page URL.
fn resolve_href(href: &str, source_url: &str) -> String {
    Url::parse(source_url)
        .ok()
        .and_then(|base| base.join(href).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| href.to_string())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_name_from_bare_domain() {
        assert_eq!(
            PageScraper::extract_company_name("https://acme.com/careers"),
            "Acme"
        );
    }

    #[test]
    fn company_name_from_careers_subdomain() {
        assert_eq!(
            PageScraper::extract_company_name("https://careers.f1soft.com"),
            "F1soft"
        );
    }

    #[test]
    fn company_name_for_unparseable_url() {
        assert_eq!(PageScraper::extract_company_name("not a url"), "Unknown Company");
    }

    #[test]
    fn relative_hrefs_resolve_against_the_page() {
        assert_eq!(
            resolve_href("/jobs/42", "https://acme.com/careers"),
            "https://acme.com/jobs/42"
        );
        assert_eq!(
            resolve_href("https://ats.example/42", "https://acme.com/careers"),
            "https://ats.example/42"
        );
    }
}
