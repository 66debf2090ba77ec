//! Progress reporting for analysis runs.
//!
//! Long-running operations accept an optional [`ProgressCallback`] and emit
//! [`AnalysisProgress`] events through it. The CLI turns these into progress
//! bars on a terminal and into log lines everywhere else.

/// Progress events emitted while analyzing repositories.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnalysisProgress {
    /// Fetching repository metadata.
    FetchingMetadata {
        /// `owner/repo` being analyzed.
        repo: String,
    },

    /// Fetching the recursive tree for a branch.
    FetchingTree { repo: String, branch: String },

    /// Tree received.
    TreeFetched {
        /// Number of entries in the tree.
        entries: usize,
        /// Whether GitHub truncated the listing.
        truncated: bool,
    },

    /// File selection finished.
    FilesSelected { count: usize },

    /// About to download one selected file.
    FetchingFile {
        /// 1-indexed position in the selection.
        index: usize,
        total: usize,
        path: String,
    },

    /// A selected file could not be used.
    FileSkipped { path: String, reason: String },

    /// Fetched a page of a paginated listing.
    FetchedPage {
        /// What is being listed (org name, user name, `owner/repo` commits).
        label: String,
        /// Page number (1-indexed).
        page: u32,
        /// Number of items on this page.
        count: usize,
        /// Running total of items fetched so far.
        total_so_far: usize,
    },

    /// Starting per-commit detail fetches.
    FetchingCommitDetails {
        /// Number of detail requests that will be issued.
        total: usize,
    },

    /// One commit detail request finished (successfully or skipped).
    CommitDetailFetched { index: usize, total: usize },

    /// The six statistics endpoints are being fetched.
    FetchingStatistics,

    /// All categories scored.
    AnalysisComplete {
        repo: String,
        overall_score: u8,
        grade: char,
    },

    /// Starting a multi-repository scan.
    ScanStarted {
        /// Org or user being scanned.
        namespace: String,
        /// Number of repositories that will be analyzed.
        count: usize,
    },

    /// One repository of a scan finished.
    ScanRepoFinished {
        repo: String,
        /// Grade when the analysis succeeded.
        grade: Option<char>,
        /// Error message when it failed.
        error: Option<String>,
    },

    /// Warning message.
    Warning { message: String },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(AnalysisProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: AnalysisProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn emit_with_callback_invokes_it() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let callback: ProgressCallback = Box::new(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        emit(Some(&callback), AnalysisProgress::FilesSelected { count: 3 });
        emit(Some(&callback), AnalysisProgress::FetchingStatistics);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn emit_without_callback_is_a_no_op() {
        emit(None, AnalysisProgress::FetchingStatistics);
    }
}
