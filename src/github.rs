use anyhow::{Context, Result};
use regex::Regex;
use reqwest::header::{ACCEPT, LINK};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
pub const USER_AGENT: &str = "portfolio-stats";

/// Repositories requested per listing page (the API maximum).
pub const PAGE_SIZE: u32 = 100;
/// Listing stops after this many pages even if more exist.
pub const MAX_PAGES: u32 = 10;

static LAST_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"page=(\d+)>; rel="last""#).expect("last-page pattern is a valid regex")
});

// Absent and null counts both read as zero.
fn zero_if_null<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(d)?.unwrap_or(0))
}

fn empty_if_null<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "zero_if_null")]
    pub public_repos: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub name: String,
    #[serde(
        default,
        rename = "stargazers_count",
        deserialize_with = "zero_if_null"
    )]
    pub star_count: u64,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default, deserialize_with = "zero_if_null")]
    total_count: u64,
}

#[derive(Clone)]
pub struct GithubClient {
    token: Option<Arc<String>>,
    http: Arc<Client>,
    base_url: Arc<str>,
}

impl GithubClient {
    /// Create an unauthenticated REST client.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build GitHub HTTP client")?;
        Ok(Self {
            token: None,
            http: Arc::new(http),
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').into();
        self
    }

    /// Attach a bearer token for a higher rate limit. Blank tokens are ignored.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty()).map(Arc::new);
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        log::debug!("{method} {url}");

        let req = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/vnd.github+json");

        match &self.token {
            Some(token) => req.bearer_auth(token.as_str()),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let resp = self
            .request(Method::GET, path)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Network error requesting {path}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: resp.url().to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse JSON from {path}"))
    }

    /// Account profile; only `public_repos` is consumed.
    pub async fn profile(&self, username: &str) -> Result<Profile> {
        self.get_json(&format!("/users/{username}"), &[]).await
    }

    /// A single page (1-based) of the account's public repositories.
    pub async fn repos_page(&self, username: &str, page: u32) -> Result<Vec<RepoSummary>> {
        self.get_json(
            &format!("/users/{username}/repos"),
            &[("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())],
        )
        .await
    }

    /// Every repository, page by page, until an empty page or the page ceiling.
    pub async fn all_repos(&self, username: &str) -> Result<Vec<RepoSummary>> {
        let mut all = Vec::new();

        for page in 1..=MAX_PAGES {
            let repos = self.repos_page(username, page).await?;
            if repos.is_empty() {
                break;
            }
            all.extend(repos);
        }

        Ok(all)
    }

    /// Estimate a repository's commit count from the `Link` header of a one-per-page listing.
    ///
    /// Repositories with a single page of commits carry no `rel="last"` link and count as zero.
    pub async fn commit_probe(&self, username: &str, repo: &str) -> Result<u64> {
        let path = format!("/repos/{username}/{repo}/commits");
        let resp = self
            .request(Method::HEAD, &path)
            .query(&[("per_page", "1")])
            .send()
            .await
            .with_context(|| format!("Network error probing {path}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: resp.url().to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        Ok(resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_last_page)
            .unwrap_or(0))
    }

    async fn search_total(&self, query: String) -> Result<u64> {
        let result: SearchResult = self.get_json("/search/issues", &[("q", query)]).await?;
        Ok(result.total_count)
    }

    pub async fn authored_pull_requests(&self, username: &str) -> Result<u64> {
        self.search_total(format!("author:{username} type:pr")).await
    }

    pub async fn authored_issues(&self, username: &str) -> Result<u64> {
        self.search_total(format!("author:{username} type:issue")).await
    }
}

/// Page number of the `rel="last"` entry in a `Link` header.
pub fn parse_last_page(link: &str) -> Option<u64> {
    LAST_PAGE
        .captures(link)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new(Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.uri())
    }

    fn repos(count: usize, stars: u64) -> serde_json::Value {
        serde_json::Value::Array(
            (0..count)
                .map(|i| serde_json::json!({ "name": format!("repo-{i}"), "stargazers_count": stars }))
                .collect(),
        )
    }

    #[test]
    fn parses_last_page_from_link_header() {
        let link = r#"<https://api.github.com/repositories/1/commits?per_page=1&page=2>; rel="next", <https://api.github.com/repositories/1/commits?per_page=1&page=347>; rel="last""#;
        assert_eq!(parse_last_page(link), Some(347));
    }

    #[test]
    fn link_header_without_last_is_none() {
        let link = r#"<https://api.github.com/repositories/1/commits?page=1>; rel="prev""#;
        assert_eq!(parse_last_page(link), None);
        assert_eq!(parse_last_page(""), None);
    }

    #[tokio::test]
    async fn stops_after_first_empty_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repos(100, 2)))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repos(0, 0)))
            .expect(1)
            .mount(&server)
            .await;

        let all = client(&server).all_repos("octo").await.unwrap();

        assert_eq!(all.len(), 100);
        assert_eq!(all.iter().map(|r| r.star_count).sum::<u64>(), 200);
    }

    #[tokio::test]
    async fn stops_at_page_ceiling() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repos(1, 3)))
            .expect(u64::from(MAX_PAGES))
            .mount(&server)
            .await;

        let all = client(&server).all_repos("octo").await.unwrap();

        assert_eq!(all.len(), MAX_PAGES as usize);
    }

    #[tokio::test]
    async fn missing_star_count_is_zero() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "name": "bare" }])),
            )
            .mount(&server)
            .await;

        let page = client(&server).repos_page("octo", 1).await.unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].star_count, 0);
    }

    #[tokio::test]
    async fn null_and_missing_fields_read_as_defaults() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octo"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "public_repos": null })),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "stargazers_count": 7 },
                { "name": null, "stargazers_count": null },
                { "name": "ok", "stargazers_count": 2 }
            ])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search/issues"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "total_count": null })),
            )
            .mount(&server)
            .await;

        let github = client(&server);
        let page = github.repos_page("octo", 1).await.unwrap();

        assert_eq!(github.profile("octo").await.unwrap().public_repos, 0);
        assert_eq!(
            page.iter().map(|r| (r.name.as_str(), r.star_count)).collect::<Vec<_>>(),
            vec![("", 7), ("", 0), ("ok", 2)]
        );
        assert_eq!(github.authored_issues("octo").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn token_is_sent_as_bearer_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octo"))
            .and(header("authorization", "Bearer t"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "public_repos": 5 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let profile = client(&server)
            .with_token(Some("t".to_string()))
            .profile("octo")
            .await
            .unwrap();

        assert_eq!(profile.public_repos, 5);
    }

    #[tokio::test]
    async fn blank_token_sends_no_authorization() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octo"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "public_repos": 1 })),
            )
            .mount(&server)
            .await;

        client(&server)
            .with_token(Some("   ".to_string()))
            .profile("octo")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octo"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server).profile("octo").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Status { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn commit_probe_reads_last_page() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/repos/octo/widgets/commits"))
            .and(query_param("per_page", "1"))
            .respond_with(ResponseTemplate::new(200).insert_header(
                "link",
                r#"<https://api.github.com/repositories/9/commits?per_page=1&page=2>; rel="next", <https://api.github.com/repositories/9/commits?per_page=1&page=88>; rel="last""#,
            ))
            .mount(&server)
            .await;

        let commits = client(&server).commit_probe("octo", "widgets").await.unwrap();

        assert_eq!(commits, 88);
    }

    #[tokio::test]
    async fn commit_probe_without_link_is_zero() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/repos/octo/tiny/commits"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let commits = client(&server).commit_probe("octo", "tiny").await.unwrap();

        assert_eq!(commits, 0);
    }

    #[tokio::test]
    async fn search_counts_use_author_queries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/issues"))
            .and(query_param("q", "author:octo type:pr"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "total_count": 31 })),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search/issues"))
            .and(query_param("q", "author:octo type:issue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let github = client(&server);

        assert_eq!(github.authored_pull_requests("octo").await.unwrap(), 31);
        assert_eq!(github.authored_issues("octo").await.unwrap(), 0);
    }
}
