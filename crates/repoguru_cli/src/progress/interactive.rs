use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use repoguru::AnalysisProgress;

const TICK: Duration = Duration::from_millis(100);

/// Bars owned by the reporter, guarded by one lock.
#[derive(Default)]
struct ProgressState {
    /// Spinner for the current stage (metadata, tree, statistics).
    stage: Option<ProgressBar>,
    /// Bar over the selected files.
    files: Option<ProgressBar>,
    /// Spinners for paginated listings, by label.
    listings: HashMap<String, ProgressBar>,
    /// Bar over commit detail requests.
    details: Option<ProgressBar>,
    /// Bar over the repositories of a scan.
    scan: Option<ProgressBar>,
}

/// Spinner and bars for a single analysis or scan.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// A reporter that draws nowhere.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_multi(MultiProgress::with_draw_target(
            indicatif::ProgressDrawTarget::hidden(),
        ))
    }

    fn with_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn spinner(&self, prefix: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(format!("{:12}", prefix));
        pb.enable_steady_tick(TICK);
        pb
    }

    fn bar(&self, prefix: &str, len: usize) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(len as u64));
        pb.set_style(Self::bar_style());
        pb.set_prefix(format!("{:12}", prefix));
        pb
    }

    fn note(&self, message: String) {
        if self.multi.println(&message).is_err() {
            eprintln!("{}", message);
        }
    }

    pub fn handle(&self, event: AnalysisProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            AnalysisProgress::FetchingMetadata { repo } => {
                let pb = self.spinner(&repo);
                pb.set_message("Fetching metadata...");
                state.stage = Some(pb);
            }

            AnalysisProgress::FetchingTree { repo, branch } => {
                let pb = state.stage.get_or_insert_with(|| self.spinner(&repo));
                pb.set_message(format!("Fetching tree ({})...", branch));
            }

            AnalysisProgress::TreeFetched { entries, truncated } => {
                if let Some(ref pb) = state.stage {
                    let suffix = if truncated { ", truncated" } else { "" };
                    pb.set_message(format!("{} entries{}", entries, suffix));
                }
            }

            AnalysisProgress::FilesSelected { count } => {
                if count > 0 {
                    let pb = self.bar("Files", count);
                    pb.set_message("downloading");
                    state.files = Some(pb);
                }
            }

            AnalysisProgress::FetchingFile { index, path, .. } => {
                if let Some(ref pb) = state.files {
                    pb.set_position(index.saturating_sub(1) as u64);
                    pb.set_message(path);
                }
            }

            AnalysisProgress::FileSkipped { path, reason } => {
                if let Some(ref pb) = state.files {
                    pb.set_message(format!("{} skipped ({})", path, reason));
                }
            }

            AnalysisProgress::FetchedPage {
                label,
                page,
                total_so_far,
                ..
            } => {
                let pb = state
                    .listings
                    .entry(label.clone())
                    .or_insert_with(|| self.spinner(&label));
                pb.set_message(format!("Page {} ({} items)", page, total_so_far));
            }

            AnalysisProgress::FetchingCommitDetails { total } => {
                for pb in state.listings.values() {
                    if !pb.is_finished() {
                        pb.finish();
                    }
                }
                let pb = self.bar("Commits", total);
                pb.set_message("details");
                state.details = Some(pb);
            }

            AnalysisProgress::CommitDetailFetched { index, .. } => {
                if let Some(ref pb) = state.details {
                    pb.set_position(index as u64);
                }
            }

            AnalysisProgress::FetchingStatistics => {
                if let Some(ref pb) = state.details {
                    pb.finish_with_message("✓ details");
                }
                let pb = self.spinner("Statistics");
                pb.set_message("Fetching statistics...");
                state.stage = Some(pb);
            }

            AnalysisProgress::AnalysisComplete {
                overall_score,
                grade,
                ..
            } => {
                if let Some(ref pb) = state.files {
                    pb.finish_with_message("✓ downloaded");
                }
                if let Some(ref pb) = state.stage {
                    pb.finish_with_message(format!("✓ {} ({}/100)", grade, overall_score));
                }
            }

            AnalysisProgress::ScanStarted { namespace, count } => {
                for pb in state.listings.values() {
                    if !pb.is_finished() {
                        pb.finish();
                    }
                }
                let pb = self.bar(&namespace, count);
                pb.set_message("analyzing");
                state.scan = Some(pb);
            }

            AnalysisProgress::ScanRepoFinished { repo, grade, error } => {
                if let Some(ref pb) = state.scan {
                    pb.inc(1);
                    match (grade, error) {
                        (_, Some(error)) => pb.set_message(format!("{} failed: {}", repo, error)),
                        (Some(grade), None) => pb.set_message(format!("{} {}", repo, grade)),
                        (None, None) => pb.set_message(repo),
                    }
                }
            }

            AnalysisProgress::Warning { message } => {
                self.note(format!("⚠ {}", message));
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let bars = [&state.stage, &state.files, &state.details, &state.scan];
        for pb in bars.into_iter().flatten().chain(state.listings.values()) {
            if !pb.is_finished() {
                pb.finish();
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .expect("Invalid template")
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
