//! Repository operations: metadata, recursive tree, file contents and listings.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use super::client::{GitHubClient, encode_path, parse_body};
use super::error::{GitHubError, Result, short_error_message};
use super::pagination::PaginatedFetchConfig;
use super::types::{ContentResponse, GitHubRepo, TreeResponse};
use crate::progress::{AnalysisProgress, ProgressCallback, emit};
use crate::repo_ref::RepoRef;
use crate::selection::SelectedFile;
use crate::snapshot::{EntryKind, FileContent, RepoMeta, Tree, TreeEntry};

impl GitHubClient {
    /// Fetch repository metadata.
    pub async fn get_repo_meta(&self, repo: &RepoRef) -> Result<RepoMeta> {
        let route = format!("/repos/{}/{}", repo.owner, repo.repo);
        let raw: GitHubRepo = self.get_json(&route).await?;
        Ok(RepoMeta::from(raw))
    }

    /// Fetch the full recursive tree of `branch` in a single call.
    ///
    /// A truncated listing is logged and returned as-is.
    pub async fn get_tree(&self, owner: &str, repo: &str, branch: &str) -> Result<Tree> {
        let route = format!(
            "/repos/{owner}/{repo}/git/trees/{}?recursive=1",
            encode_path(branch)
        );
        let raw: TreeResponse = self.get_json(&route).await?;
        if raw.truncated {
            warn!(owner, repo, entries = raw.tree.len(), "GitHub truncated the tree listing");
        }

        let entries = raw
            .tree
            .into_iter()
            .filter_map(|entry| {
                let kind = match entry.kind.as_str() {
                    "blob" => EntryKind::Blob,
                    "tree" => EntryKind::Tree,
                    // Submodules ("commit") are neither files nor directories here.
                    _ => return None,
                };
                Some(TreeEntry {
                    path: entry.path,
                    kind,
                    size: entry.size,
                })
            })
            .collect();

        Ok(Tree {
            entries,
            truncated: raw.truncated,
        })
    }

    /// Download selected files one at a time, pausing between requests.
    ///
    /// Results come back in selection order. A file that fails to download is
    /// recorded as [`FileContent::Missing`] and one whose payload cannot be
    /// decoded as [`FileContent::DecodeFailed`]; neither stops the loop. Only
    /// an exhausted rate limit aborts.
    pub async fn fetch_file_contents(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        files: &[SelectedFile],
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<(String, FileContent)>> {
        let mut contents = Vec::with_capacity(files.len());

        for (i, file) in files.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            emit(
                on_progress,
                AnalysisProgress::FetchingFile {
                    index: i + 1,
                    total: files.len(),
                    path: file.path.clone(),
                },
            );

            let route = format!(
                "/repos/{owner}/{repo}/contents/{}?ref={}",
                encode_path(&file.path),
                urlencoding::encode(branch)
            );
            let content = match self.send_get(&route).await {
                Err(e @ GitHubError::RateLimitExceeded { .. }) => return Err(e),
                Err(e) => {
                    let reason = short_error_message(&e);
                    warn!(path = %file.path, error = %reason, "Skipping file");
                    emit(
                        on_progress,
                        AnalysisProgress::FileSkipped {
                            path: file.path.clone(),
                            reason,
                        },
                    );
                    FileContent::Missing
                }
                Ok(response) if !response.is_success() => {
                    warn!(path = %file.path, status = response.status, "Skipping file");
                    emit(
                        on_progress,
                        AnalysisProgress::FileSkipped {
                            path: file.path.clone(),
                            reason: format!("HTTP {}", response.status),
                        },
                    );
                    FileContent::Missing
                }
                Ok(response) => match parse_body::<ContentResponse>(&response, &route) {
                    Ok(body) => decode_content(&file.path, &body),
                    Err(e) => {
                        warn!(path = %file.path, error = %e, "Unexpected contents payload");
                        FileContent::DecodeFailed
                    }
                },
            };
            contents.push((file.path.clone(), content));
        }

        debug!(
            owner,
            repo,
            fetched = contents
                .iter()
                .filter(|(_, c)| matches!(c, FileContent::Bytes(_)))
                .count(),
            selected = files.len(),
            "Fetched file contents"
        );
        Ok(contents)
    }

    /// List all repositories of an organization.
    pub async fn list_org_repos(
        &self,
        org: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<GitHubRepo>> {
        self.fetch_pages(&PaginatedFetchConfig::org_repos(org), on_progress)
            .await
    }

    /// List all public repositories of a user.
    pub async fn list_user_repos(
        &self,
        user: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<GitHubRepo>> {
        self.fetch_pages(&PaginatedFetchConfig::user_repos(user), on_progress)
            .await
    }
}

/// Decode the transport encoding of a contents response.
fn decode_content(path: &str, body: &ContentResponse) -> FileContent {
    let Some(raw) = body.content.as_deref() else {
        warn!(path, "Contents response without payload");
        return FileContent::DecodeFailed;
    };
    match body.encoding.as_deref() {
        Some("base64") => {
            let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            match STANDARD.decode(compact) {
                Ok(bytes) => FileContent::Bytes(bytes),
                Err(e) => {
                    warn!(path, error = %e, "Failed to decode base64 content");
                    FileContent::DecodeFailed
                }
            }
        }
        Some("utf-8") | None => FileContent::Bytes(raw.as_bytes().to_vec()),
        Some(other) => {
            warn!(path, encoding = other, "Unsupported content encoding");
            FileContent::DecodeFailed
        }
    }
}
