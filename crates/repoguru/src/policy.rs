//! Pass/fail gates over an analysis report.
//!
//! A [`Policy`] is a list of rules, each comparing one number or one signal
//! of a report against an expectation. A policy passes when none of its
//! `error` rules fail; warnings and infos are reported but never block.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::Category;
use crate::report::AnalysisReport;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Unknown policy preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid policy: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "not-exists")]
    NotExists,
}

impl Operator {
    fn as_str(self) -> &'static str {
        match self {
            Operator::Gte => ">=",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Lt => "<",
            Operator::Eq => "==",
            Operator::Exists => "exists",
            Operator::NotExists => "not-exists",
        }
    }

    fn compare(self, actual: u8, expected: u8) -> bool {
        match self {
            Operator::Gte => actual >= expected,
            Operator::Gt => actual > expected,
            Operator::Lte => actual <= expected,
            Operator::Lt => actual < expected,
            Operator::Eq => actual == expected,
            // Presence operators only apply to signals.
            Operator::Exists | Operator::NotExists => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleKind {
    OverallScore,
    CategoryScore { category: Category },
    Signal { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: RuleKind,
    pub operator: Operator,
    /// Threshold for numeric kinds; ignored by presence operators.
    #[serde(default)]
    pub value: u8,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub passed: bool,
    pub actual: String,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub policy: String,
    pub passed: bool,
    pub outcomes: Vec<RuleOutcome>,
}

impl PolicyResult {
    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

impl Policy {
    /// Parse a policy from JSON.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a built-in preset by name.
    pub fn preset(name: &str) -> Result<Self, PolicyError> {
        match name {
            "open-source-ready" => Ok(open_source_ready()),
            "enterprise-grade" => Ok(enterprise_grade()),
            "beginner-friendly" => Ok(beginner_friendly()),
            other => Err(PolicyError::UnknownPreset(other.to_string())),
        }
    }

    /// Names of the built-in presets.
    pub const PRESETS: [&'static str; 3] =
        ["open-source-ready", "enterprise-grade", "beginner-friendly"];
}

fn evaluate_rule(report: &AnalysisReport, rule: &PolicyRule) -> RuleOutcome {
    let numeric = |actual: Option<u8>| match actual {
        Some(score) => (
            rule.operator.compare(score, rule.value),
            score.to_string(),
            format!("{} {}", rule.operator, rule.value),
        ),
        None => (
            false,
            "not found".to_string(),
            format!("{} {}", rule.operator, rule.value),
        ),
    };

    let (passed, actual, expected) = match &rule.kind {
        RuleKind::OverallScore => numeric(Some(report.overall_score)),
        RuleKind::CategoryScore { category } => {
            numeric(report.category(*category).map(|c| c.score))
        }
        RuleKind::Signal { name } => {
            let found = report
                .categories
                .iter()
                .flat_map(|c| &c.signals)
                .find(|s| s.name == *name)
                .map(|s| s.found);
            match found {
                None => (false, "not found".to_string(), rule.operator.to_string()),
                Some(found) => {
                    let passed = match rule.operator {
                        Operator::Exists => found,
                        Operator::NotExists => !found,
                        _ => rule.operator.compare(u8::from(found), rule.value),
                    };
                    let actual = if found { "present" } else { "absent" };
                    (passed, actual.to_string(), rule.operator.to_string())
                }
            }
        }
    };

    RuleOutcome {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        severity: rule.severity,
        passed,
        actual,
        expected,
    }
}

/// Evaluate every rule of `policy` against `report`.
#[must_use]
pub fn evaluate(report: &AnalysisReport, policy: &Policy) -> PolicyResult {
    let outcomes: Vec<RuleOutcome> = policy
        .rules
        .iter()
        .map(|rule| evaluate_rule(report, rule))
        .collect();
    let passed = !outcomes
        .iter()
        .any(|o| !o.passed && o.severity == Severity::Error);
    PolicyResult {
        policy: policy.name.clone(),
        passed,
        outcomes,
    }
}

fn rule(
    id: &str,
    name: &str,
    kind: RuleKind,
    operator: Operator,
    value: u8,
    severity: Severity,
) -> PolicyRule {
    PolicyRule {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        kind,
        operator,
        value,
        severity,
    }
}

fn signal(name: &str) -> RuleKind {
    RuleKind::Signal {
        name: name.to_string(),
    }
}

fn category(category: Category) -> RuleKind {
    RuleKind::CategoryScore { category }
}

fn open_source_ready() -> Policy {
    Policy {
        name: "open-source-ready".into(),
        description: "Baseline for publishing a project".into(),
        rules: vec![
            rule("oss-license", "Has a license file", signal("LICENSE file"), Operator::Exists, 0, Severity::Error),
            rule("oss-readme", "Has a README", signal("README exists"), Operator::Exists, 0, Severity::Error),
            rule("oss-contributing", "Has contribution guidelines", signal("CONTRIBUTING guide"), Operator::Exists, 0, Severity::Warning),
            rule("oss-coc", "Has a code of conduct", signal("Code of Conduct"), Operator::Exists, 0, Severity::Warning),
            rule("oss-security", "Has a security policy", signal("Security policy"), Operator::Exists, 0, Severity::Warning),
            rule("oss-docs", "Documentation score", category(Category::Documentation), Operator::Gte, 60, Severity::Error),
            rule("oss-overall", "Overall score", RuleKind::OverallScore, Operator::Gte, 55, Severity::Info),
        ],
    }
}

fn enterprise_grade() -> Policy {
    Policy {
        name: "enterprise-grade".into(),
        description: "Controls expected of production services".into(),
        rules: vec![
            rule("ent-overall", "Overall score", RuleKind::OverallScore, Operator::Gte, 70, Severity::Error),
            rule("ent-security", "Security score", category(Category::Security), Operator::Gte, 70, Severity::Error),
            rule("ent-ci", "CI/CD score", category(Category::Ci), Operator::Gte, 70, Severity::Error),
            rule("ent-codeowners", "Has CODEOWNERS", signal("CODEOWNERS file"), Operator::Exists, 0, Severity::Error),
            rule("ent-deps", "Automated dependency updates", signal("Dependency update tool"), Operator::Exists, 0, Severity::Error),
            rule("ent-secrets", "No committed secrets", signal("No exposed secret files"), Operator::Exists, 0, Severity::Error),
            rule("ent-openssf", "OpenSSF score", category(Category::OpenSsf), Operator::Gte, 50, Severity::Warning),
            rule("ent-lockfile", "Lockfile committed", signal("Lockfile present"), Operator::Exists, 0, Severity::Warning),
        ],
    }
}

fn beginner_friendly() -> Policy {
    Policy {
        name: "beginner-friendly".into(),
        description: "Welcoming to first-time contributors".into(),
        rules: vec![
            rule("bf-readme", "Has a README", signal("README exists"), Operator::Exists, 0, Severity::Error),
            rule("bf-examples", "README shows code", signal("Code examples in README"), Operator::Exists, 0, Severity::Warning),
            rule("bf-contributing", "Has contribution guidelines", signal("CONTRIBUTING guide"), Operator::Exists, 0, Severity::Error),
            rule("bf-issues", "Has issue templates", signal("Issue templates"), Operator::Exists, 0, Severity::Warning),
            rule("bf-community", "Community score", category(Category::Community), Operator::Gte, 50, Severity::Error),
            rule("bf-docs", "Documentation score", category(Category::Documentation), Operator::Gte, 50, Severity::Warning),
        ],
    }
}
