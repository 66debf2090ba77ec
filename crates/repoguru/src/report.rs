//! The terminal artifact of an analysis run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{Category, CategoryResult, TechItem, analyze_all, detect_tech_stack};
use crate::scoring::{NextStep, aggregate};
use crate::selection::SelectedFile;
use crate::snapshot::{RepoMeta, RepoSnapshot};

/// How much of the repository an analysis looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Tree plus selected file contents.
    Full,
    /// Tree listing only.
    Light,
}

/// Narrative produced by an external language model.
///
/// This crate never fills it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmInsights {
    pub summary: String,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Scores, grade and guidance for one repository.
///
/// Built once per run and never mutated afterwards; re-analysis produces a
/// new report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub repo_meta: RepoMeta,
    /// Branch that was analyzed.
    pub branch: String,
    pub mode: AnalysisMode,
    pub categories: Vec<CategoryResult>,
    pub overall_score: u8,
    pub grade: char,
    pub strengths: Vec<Category>,
    pub risks: Vec<Category>,
    pub next_steps: Vec<NextStep>,
    pub tech_stack: Vec<TechItem>,
    /// Files whose contents were downloaded.
    pub selected_files: Vec<SelectedFile>,
    pub tree_entries: usize,
    pub tree_truncated: bool,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_insights: Option<LlmInsights>,
}

/// Inputs to [`AnalysisReport::build`] besides the snapshot.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub repo_meta: RepoMeta,
    pub branch: String,
    pub mode: AnalysisMode,
    pub selected_files: Vec<SelectedFile>,
    pub tree_truncated: bool,
}

impl AnalysisReport {
    /// Analyze a snapshot and assemble the report. Infallible.
    #[must_use]
    pub fn build(context: ReportContext, snapshot: &RepoSnapshot) -> Self {
        let categories = analyze_all(snapshot);
        let summary = aggregate(&categories);
        Self {
            repo_meta: context.repo_meta,
            branch: context.branch,
            mode: context.mode,
            overall_score: summary.overall_score,
            grade: summary.grade,
            strengths: summary.strengths,
            risks: summary.risks,
            next_steps: summary.next_steps,
            tech_stack: detect_tech_stack(snapshot),
            selected_files: context.selected_files,
            tree_entries: snapshot.tree.len(),
            tree_truncated: context.tree_truncated,
            generated_at: Utc::now(),
            llm_insights: None,
            categories,
        }
    }

    #[must_use]
    pub fn category(&self, category: Category) -> Option<&CategoryResult> {
        self.categories.iter().find(|c| c.category == category)
    }
}
