//! Page-indexed listing with short-page termination.
//!
//! GitHub list endpoints are walked one page at a time with `per_page=100`.
//! A page holding fewer than 100 items (or none) ends the walk, so a listing
//! of `n` items costs `n / 100 + 1` requests and never asks for a page past
//! the short one. A failed page fails the whole listing; there are no retries.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::client::{GitHubClient, api_error, encode_path, parse_body};
use super::error::Result;
use crate::progress::{AnalysisProgress, ProgressCallback, emit};

/// Items requested per page.
pub const PAGE_SIZE: usize = 100;

/// Configuration for a paginated fetch operation.
pub struct PaginatedFetchConfig<'a> {
    /// Label used for progress reporting and logs.
    pub label: String,
    /// Function to build the API route for a given page number.
    pub route_fn: Box<dyn Fn(u32) -> String + Send + Sync + 'a>,
    /// A 409 on the first page means "nothing to list" rather than an error.
    pub empty_on_conflict: bool,
}

impl<'a> PaginatedFetchConfig<'a> {
    /// Create config for fetching organization repositories.
    pub fn org_repos(org: &'a str) -> Self {
        Self {
            label: org.to_string(),
            route_fn: Box::new(move |page| {
                format!("/orgs/{org}/repos?per_page={PAGE_SIZE}&page={page}")
            }),
            empty_on_conflict: false,
        }
    }

    /// Create config for fetching user repositories.
    pub fn user_repos(username: &'a str) -> Self {
        Self {
            label: username.to_string(),
            route_fn: Box::new(move |page| {
                format!("/users/{username}/repos?per_page={PAGE_SIZE}&page={page}")
            }),
            empty_on_conflict: false,
        }
    }

    /// Create config for fetching a repository's commit list.
    ///
    /// GitHub answers 409 for a repository without commits.
    pub fn commits(owner: &'a str, repo: &'a str, branch: Option<&'a str>) -> Self {
        let sha = branch
            .map(|b| format!("&sha={}", encode_path(b)))
            .unwrap_or_default();
        Self {
            label: format!("{owner}/{repo} commits"),
            route_fn: Box::new(move |page| {
                format!("/repos/{owner}/{repo}/commits?per_page={PAGE_SIZE}&page={page}{sha}")
            }),
            empty_on_conflict: true,
        }
    }
}

impl GitHubClient {
    /// Fetch all pages of a paginated endpoint, concatenated in request order.
    ///
    /// The client's pacer runs between consecutive pages.
    pub async fn fetch_pages<T: DeserializeOwned>(
        &self,
        config: &PaginatedFetchConfig<'_>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<T>> {
        let mut all_items: Vec<T> = Vec::new();
        let mut page = 1u32;

        loop {
            let route = (config.route_fn)(page);
            let response = self.send_get(&route).await?;

            if response.status == 409 && config.empty_on_conflict {
                debug!(label = %config.label, "409 Conflict, treating listing as empty");
                break;
            }
            if !response.is_success() {
                return Err(api_error(&response, &route));
            }

            let items: Vec<T> = parse_body(&response, &route)?;
            let count = items.len();
            all_items.extend(items);

            debug!(label = %config.label, page, count, total = all_items.len(), "Fetched page");
            emit(
                on_progress,
                AnalysisProgress::FetchedPage {
                    label: config.label.clone(),
                    page,
                    count,
                    total_so_far: all_items.len(),
                },
            );

            if count < PAGE_SIZE {
                break;
            }
            page += 1;
            self.pause().await;
        }

        Ok(all_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::GitHubError;
    use crate::github::client::test_support::*;

    fn page_of(n: usize, offset: usize) -> String {
        let items: Vec<usize> = (offset..offset + n).collect();
        serde_json::to_string(&items).unwrap()
    }

    fn org_route(page: u32) -> String {
        format!("/orgs/acme/repos?per_page=100&page={page}")
    }

    #[tokio::test]
    async fn full_page_then_empty_page_stops_after_two_requests() {
        let (client, transport, pacer) = mock_client(None);
        push(&transport, &org_route(1), json_response(200, &page_of(100, 0)));
        push(&transport, &org_route(2), json_response(200, "[]"));

        let items: Vec<usize> = client
            .fetch_pages(&PaginatedFetchConfig::org_repos("acme"), None)
            .await
            .unwrap();

        assert_eq!(items.len(), 100);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(pacer.pauses(), 1);
    }

    #[tokio::test]
    async fn short_page_ends_listing_and_keeps_order() {
        let (client, transport, _) = mock_client(None);
        push(&transport, &org_route(1), json_response(200, &page_of(100, 0)));
        push(&transport, &org_route(2), json_response(200, &page_of(50, 100)));

        let items: Vec<usize> = client
            .fetch_pages(&PaginatedFetchConfig::org_repos("acme"), None)
            .await
            .unwrap();

        assert_eq!(items.len(), 150);
        assert_eq!(items, (0..150).collect::<Vec<_>>());
        assert_eq!(transport.request_count(), 2);
        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert!(urls[0].ends_with("page=1"));
        assert!(urls[1].ends_with("page=2"));
    }

    #[tokio::test]
    async fn conflict_on_commit_list_is_empty() {
        let (client, transport, _) = mock_client(None);
        push(
            &transport,
            "/repos/o/r/commits?per_page=100&page=1",
            status_response(409),
        );

        let items: Vec<serde_json::Value> = client
            .fetch_pages(&PaginatedFetchConfig::commits("o", "r", None), None)
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn conflict_elsewhere_is_an_error() {
        let (client, transport, _) = mock_client(None);
        push(&transport, &org_route(1), status_response(409));
        let err = client
            .fetch_pages::<serde_json::Value>(&PaginatedFetchConfig::org_repos("acme"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn failed_page_is_terminal() {
        let (client, transport, _) = mock_client(None);
        push(&transport, &org_route(1), json_response(200, &page_of(100, 0)));
        push(&transport, &org_route(2), status_response(500));

        let err = client
            .fetch_pages::<usize>(&PaginatedFetchConfig::org_repos("acme"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::Api { status: 500, .. }));
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn commit_route_carries_branch() {
        let config = PaginatedFetchConfig::commits("o", "r", Some("release/1.x"));
        assert_eq!(
            (config.route_fn)(3),
            "/repos/o/r/commits?per_page=100&page=3&sha=release/1.x"
        );
    }

    #[tokio::test]
    async fn progress_reports_running_total() {
        use std::sync::{Arc, Mutex};

        let (client, transport, _) = mock_client(None);
        push(&transport, &org_route(1), json_response(200, &page_of(100, 0)));
        push(&transport, &org_route(2), json_response(200, &page_of(7, 100)));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: ProgressCallback = Box::new(move |event| {
            if let AnalysisProgress::FetchedPage { total_so_far, .. } = event {
                seen_clone.lock().unwrap().push(total_so_far);
            }
        });

        let _: Vec<usize> = client
            .fetch_pages(&PaginatedFetchConfig::org_repos("acme"), Some(&callback))
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![100, 107]);
    }
}
