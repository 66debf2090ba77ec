use crate::snapshot::{RepoSnapshot, file_name_lower, is_workflow};

use super::quality::TEST_COMMANDS;
use super::{Signal, has_pr_triggered_workflow, workflow_texts};

const DOCKERFILE_PATHS: &[&str] = &["Dockerfile", "docker/Dockerfile", "Containerfile"];
const COMPOSE_PATHS: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];
const MAKEFILE_PATHS: &[&str] = &["Makefile", "makefile", "GNUmakefile", "justfile", "Justfile"];

const DELIVERY_MARKERS: &[&str] = &["deploy", "release", "publish"];

/// Workflow files at or above this count earn the multi-workflow signal.
pub(crate) const MIN_WORKFLOWS: usize = 2;

/// Build and lint invocations that make a workflow a CI workflow, on top of
/// the test runners in [`TEST_COMMANDS`].
const BUILD_COMMANDS: &[&str] = &[
    "cargo build",
    "cargo check",
    "cargo clippy",
    "npm run build",
    "npm run lint",
    "yarn build",
    "yarn lint",
    "pnpm build",
    "pnpm lint",
    "go build",
    "go vet",
    "golangci-lint",
    "make build",
    "make lint",
    "make check",
    "cmake --build",
    "mvn ",
    "gradle build",
    "./gradlew build",
    "dotnet build",
    "dotnet test",
    "tsc",
    "eslint",
    "ruff",
    "flake8",
    "mypy",
];

fn indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Shell commands of every `run:` step, including `|` and `>` blocks.
fn run_commands(workflow: &str) -> Vec<&str> {
    let mut commands = Vec::new();
    let mut lines = workflow.lines().peekable();
    while let Some(line) = lines.next() {
        let key = line.trim_start();
        let key = key.strip_prefix("- ").unwrap_or(key).trim_start();
        let Some(rest) = key.strip_prefix("run:").map(str::trim) else {
            continue;
        };
        if !(rest.is_empty() || rest.starts_with('|') || rest.starts_with('>')) {
            commands.push(rest);
            continue;
        }
        let step_indent = indent(line);
        while let Some(next) = lines.next_if(|l| l.trim().is_empty() || indent(l) > step_indent) {
            commands.push(next.trim());
        }
    }
    commands
}

fn has_ci_workflow(workflows: &[(String, String)]) -> bool {
    workflows.iter().any(|(_, text)| {
        run_commands(text).iter().any(|command| {
            TEST_COMMANDS
                .iter()
                .chain(BUILD_COMMANDS)
                .any(|c| command.contains(c))
        })
    })
}

fn has_delivery_workflow(snapshot: &RepoSnapshot, workflows: &[(String, String)]) -> bool {
    let by_name = snapshot.any_blob(|p| {
        is_workflow(p) && {
            let name = file_name_lower(p);
            DELIVERY_MARKERS.iter().any(|m| name.contains(m))
        }
    });
    by_name
        || workflows
            .iter()
            .any(|(_, text)| DELIVERY_MARKERS.iter().any(|m| text.contains(m)))
}

pub(crate) fn signals(snapshot: &RepoSnapshot) -> Vec<Signal> {
    let workflows = workflow_texts(snapshot);
    vec![
        Signal::new("GitHub Actions workflows", 20, snapshot.any_blob(is_workflow)),
        Signal::new(
            "Multiple workflows (>=2)",
            10,
            snapshot.blobs_matching(is_workflow).count() >= MIN_WORKFLOWS,
        ),
        Signal::new("CI workflow", 20, has_ci_workflow(&workflows)),
        Signal::new(
            "Deploy/release workflow",
            15,
            has_delivery_workflow(snapshot, &workflows),
        ),
        Signal::new("PR-triggered checks", 15, has_pr_triggered_workflow(snapshot)),
        Signal::new("Dockerfile", 10, snapshot.has_any(DOCKERFILE_PATHS)),
        Signal::new("Docker Compose", 5, snapshot.has_any(COMPOSE_PATHS)),
        Signal::new("Build automation", 5, snapshot.has_any(MAKEFILE_PATHS)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Category, CategoryResult};
    use crate::snapshot::test_support::snapshot;

    fn analyze(snap: &RepoSnapshot) -> CategoryResult {
        CategoryResult::from_signals(Category::Ci, signals(snap))
    }

    #[test]
    fn workflow_presence_without_content_earns_base_points() {
        let result = analyze(&snapshot(&[".github/workflows/ci.yml"], &[]));
        assert_eq!(result.score, 20);
    }

    #[test]
    fn release_workflow_detected_by_file_name() {
        let result = analyze(&snapshot(&[".github/workflows/release.yml"], &[]));
        assert!(
            result
                .signal("Deploy/release workflow")
                .is_some_and(|s| s.found)
        );
    }

    #[test]
    fn complete_pipeline_scores_one_hundred() {
        let snap = snapshot(
            &[
                ".github/workflows/ci.yml",
                ".github/workflows/docs.yml",
                "Dockerfile",
                "docker-compose.yml",
                "Makefile",
            ],
            &[(
                ".github/workflows/ci.yml",
                "on: [push, pull_request]\njobs:\n  test:\n    steps:\n      - run: make test\n  publish:\n    steps:\n      - run: make release\n",
            )],
        );
        assert_eq!(analyze(&snap).score, 100);
    }

    #[test]
    fn workflow_count_threshold_is_inclusive() {
        let name = "Multiple workflows (>=2)";
        let paths: Vec<String> = (0..MIN_WORKFLOWS)
            .map(|i| format!(".github/workflows/w{i}.yml"))
            .collect();
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();

        let result = analyze(&snapshot(&paths, &[]));
        assert!(result.signal(name).is_some_and(|s| s.found));

        let result = analyze(&snapshot(&paths[..MIN_WORKFLOWS - 1], &[]));
        assert!(result.signal(name).is_some_and(|s| !s.found));
    }

    #[test]
    fn checkout_alone_is_not_a_ci_workflow() {
        let greeter = "\
on: issues
jobs:
  greet:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - run: echo hello
";
        let path = ".github/workflows/greet.yml";
        let result = analyze(&snapshot(&[path], &[(path, greeter)]));
        assert!(result.signal("CI workflow").is_some_and(|s| !s.found));
        assert!(result.signal("GitHub Actions workflows").is_some_and(|s| s.found));
    }

    #[test]
    fn multi_line_run_block_counts_as_ci() {
        let workflow = "\
on: push
jobs:
  build:
    steps:
      - uses: actions/checkout@v4
      - name: Build
        run: |
          npm ci
          npm run build
      - run: echo done
";
        let path = ".github/workflows/build.yml";
        let result = analyze(&snapshot(&[path], &[(path, workflow)]));
        assert!(result.signal("CI workflow").is_some_and(|s| s.found));
    }

    #[test]
    fn run_commands_stop_at_the_next_step() {
        let text = "      - run: |\n          cargo test\n\n          cargo build\n      - uses: x\n      - run: echo hi\n";
        assert_eq!(run_commands(text), ["cargo test", "", "cargo build", "echo hi"]);
    }

    #[test]
    fn non_github_ci_does_not_count_as_actions() {
        let result = analyze(&snapshot(&[".travis.yml"], &[]));
        assert_eq!(result.score, 0);
    }
}
