//! Weighted aggregation of category scores.

use serde::{Deserialize, Serialize};

use crate::analysis::{Category, CategoryResult};

/// Number of suggested next steps.
pub const NEXT_STEP_COUNT: usize = 3;
/// Categories at or above this score are strengths.
pub const STRENGTH_THRESHOLD: u8 = 80;
/// Categories below this score are risks.
pub const RISK_THRESHOLD: u8 = 40;

/// Published weight of a category, in percent. The weights sum to 100.
#[must_use]
pub fn weight(category: Category) -> u32 {
    match category {
        Category::Documentation | Category::Ci | Category::Dependencies | Category::Quality => 15,
        Category::Security | Category::License | Category::Community | Category::OpenSsf => 10,
    }
}

/// Letter grade for an overall score. Lower bounds are inclusive.
#[must_use]
pub fn grade(score: u8) -> char {
    match score {
        85.. => 'A',
        70..=84 => 'B',
        55..=69 => 'C',
        40..=54 => 'D',
        _ => 'F',
    }
}

/// A suggested improvement: the first missing signal of a weak category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStep {
    pub category: Category,
    pub action: String,
}

/// Output of [`aggregate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub overall_score: u8,
    pub grade: char,
    pub strengths: Vec<Category>,
    pub risks: Vec<Category>,
    pub next_steps: Vec<NextStep>,
}

/// Weighted overall score, rounded half up.
#[must_use]
pub fn overall_score(categories: &[CategoryResult]) -> u8 {
    let weighted: u32 = categories
        .iter()
        .map(|c| weight(c.category) * u32::from(c.score.min(100)))
        .sum();
    ((weighted + 50) / 100).min(100) as u8
}

/// Combine category results into an overall score, grade and guidance.
///
/// `categories` is expected in registry order; strengths and risks are
/// reported in the order given.
#[must_use]
pub fn aggregate(categories: &[CategoryResult]) -> Aggregate {
    let overall_score = overall_score(categories);

    let strengths = categories
        .iter()
        .filter(|c| c.score >= STRENGTH_THRESHOLD)
        .map(|c| c.category)
        .collect();
    let risks = categories
        .iter()
        .filter(|c| c.score < RISK_THRESHOLD)
        .map(|c| c.category)
        .collect();

    let mut by_score: Vec<&CategoryResult> = categories.iter().collect();
    // Stable: equal scores keep registry order.
    by_score.sort_by_key(|c| c.score);
    let next_steps = by_score
        .into_iter()
        .filter_map(|c| {
            c.missing().next().map(|signal| NextStep {
                category: c.category,
                action: signal.name.clone(),
            })
        })
        .take(NEXT_STEP_COUNT)
        .collect();

    Aggregate {
        overall_score,
        grade: grade(overall_score),
        strengths,
        risks,
        next_steps,
    }
}
