use repoguru::AnalysisProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: AnalysisProgress) {
        match event {
            AnalysisProgress::FetchingMetadata { repo } => {
                tracing::info!(repo = %repo, "Fetching repository metadata");
            }

            AnalysisProgress::FetchingTree { repo, branch } => {
                tracing::debug!(repo = %repo, branch = %branch, "Fetching tree");
            }

            AnalysisProgress::TreeFetched { entries, truncated } => {
                if truncated {
                    tracing::warn!(entries, "Tree listing was truncated by GitHub");
                } else {
                    tracing::info!(entries, "Fetched tree");
                }
            }

            AnalysisProgress::FilesSelected { count } => {
                tracing::info!(count, "Selected files for download");
            }

            AnalysisProgress::FetchingFile { index, total, path } => {
                tracing::debug!(index, total, path = %path, "Fetching file");
            }

            AnalysisProgress::FileSkipped { path, reason } => {
                tracing::debug!(path = %path, reason = %reason, "Skipped file");
            }

            AnalysisProgress::FetchedPage {
                label,
                page,
                count,
                total_so_far,
            } => {
                tracing::debug!(label = %label, page, count, total_so_far, "Fetched page");
            }

            AnalysisProgress::FetchingCommitDetails { total } => {
                tracing::info!(total, "Fetching commit details");
            }

            AnalysisProgress::CommitDetailFetched { index, total } => {
                if index == total || index % 50 == 0 {
                    tracing::info!(index, total, "Commit details progress");
                }
            }

            AnalysisProgress::FetchingStatistics => {
                tracing::info!("Fetching repository statistics");
            }

            AnalysisProgress::AnalysisComplete {
                repo,
                overall_score,
                grade,
            } => {
                tracing::info!(repo = %repo, overall_score, grade = %grade, "Analysis complete");
            }

            AnalysisProgress::ScanStarted { namespace, count } => {
                tracing::info!(namespace = %namespace, count, "Scanning repositories");
            }

            AnalysisProgress::ScanRepoFinished { repo, grade, error } => match (grade, error) {
                (_, Some(error)) => {
                    tracing::warn!(repo = %repo, error = %error, "Repository failed");
                }
                (Some(grade), None) => {
                    tracing::info!(repo = %repo, grade = %grade, "Repository graded");
                }
                (None, None) => {}
            },

            AnalysisProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
