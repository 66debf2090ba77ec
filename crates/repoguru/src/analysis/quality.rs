use crate::snapshot::{RepoSnapshot, file_name_lower};

use super::{Signal, has_file_named, workflow_texts};

const LINTER_FILES: &[&str] = &[
    ".eslintrc",
    ".eslintrc.js",
    ".eslintrc.cjs",
    ".eslintrc.json",
    ".eslintrc.yml",
    ".eslintrc.yaml",
    "eslint.config.js",
    "eslint.config.mjs",
    "eslint.config.cjs",
    "eslint.config.ts",
    "biome.json",
    ".golangci.yml",
    ".golangci.yaml",
    "clippy.toml",
    ".clippy.toml",
    ".flake8",
    "ruff.toml",
    ".ruff.toml",
    ".pylintrc",
    ".rubocop.yml",
    ".stylelintrc",
    "phpstan.neon",
];

const FORMATTER_FILES: &[&str] = &[
    ".prettierrc",
    ".prettierrc.js",
    ".prettierrc.json",
    ".prettierrc.yml",
    ".prettierrc.yaml",
    "prettier.config.js",
    "prettier.config.mjs",
    "biome.json",
    "rustfmt.toml",
    ".rustfmt.toml",
    ".clang-format",
    ".black",
    ".php-cs-fixer.php",
];

const TYPED_FILES: &[&str] = &["tsconfig.json", "Cargo.toml", "go.mod", "mypy.ini", ".mypy.ini"];

const HOOK_FILES: &[&str] = &[
    ".pre-commit-config.yaml",
    ".pre-commit-config.yml",
    "lefthook.yml",
    "lefthook.yaml",
    ".lintstagedrc",
    ".lintstagedrc.json",
    "lint-staged.config.js",
];

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "e2e"];

/// Workflow commands that run a test suite.
pub(crate) const TEST_COMMANDS: &[&str] = &[
    "npm test",
    "npm run test",
    "yarn test",
    "pnpm test",
    "cargo test",
    "cargo nextest",
    "go test",
    "pytest",
    "tox",
    "mvn test",
    "gradle test",
    "./gradlew test",
    "rspec",
    "bundle exec rake",
    "phpunit",
    "make test",
    "vitest",
    "jest",
];

fn pyproject_declares(snapshot: &RepoSnapshot, marker: &str) -> bool {
    snapshot
        .text("pyproject.toml")
        .is_some_and(|t| t.contains(marker))
}

fn package_json_declares(snapshot: &RepoSnapshot, marker: &str) -> bool {
    snapshot
        .text("package.json")
        .is_some_and(|t| t.contains(marker))
}

fn has_linter(snapshot: &RepoSnapshot) -> bool {
    has_file_named(snapshot, LINTER_FILES)
        || pyproject_declares(snapshot, "[tool.ruff")
        || pyproject_declares(snapshot, "[tool.pylint")
        || package_json_declares(snapshot, "\"eslintConfig\"")
}

fn has_formatter(snapshot: &RepoSnapshot) -> bool {
    has_file_named(snapshot, FORMATTER_FILES)
        || pyproject_declares(snapshot, "[tool.black")
        || pyproject_declares(snapshot, "[tool.ruff.format")
        || package_json_declares(snapshot, "\"prettier\"")
}

fn has_type_system(snapshot: &RepoSnapshot) -> bool {
    snapshot.has_any(TYPED_FILES)
        || snapshot.any_blob(|p| file_name_lower(p) == "py.typed")
        || pyproject_declares(snapshot, "[tool.mypy")
}

fn has_git_hooks(snapshot: &RepoSnapshot) -> bool {
    snapshot.has_dir(".husky")
        || snapshot.has_any(HOOK_FILES)
        || package_json_declares(snapshot, "\"lint-staged\"")
}

/// JUnit naming: `FooTest.java`, `FooTests.java` or `TestFoo.java`, case-sensitive.
fn is_java_test(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    let Some(stem) = name.strip_suffix(".java") else {
        return false;
    };
    stem.ends_with("Test")
        || stem.ends_with("Tests")
        || stem
            .strip_prefix("Test")
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
}

fn is_test_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    let in_test_dir = lower
        .split('/')
        .rev()
        .skip(1)
        .any(|segment| TEST_DIRS.contains(&segment));
    if in_test_dir {
        return true;
    }
    let name = file_name_lower(path);
    name.ends_with("_test.go")
        || name.ends_with("_test.py")
        || (name.starts_with("test_") && name.ends_with(".py"))
        || name.contains(".test.")
        || name.contains(".spec.")
        || name.ends_with("_spec.rb")
        || is_java_test(path)
}

fn ci_runs_tests(snapshot: &RepoSnapshot) -> bool {
    workflow_texts(snapshot)
        .iter()
        .any(|(_, text)| TEST_COMMANDS.iter().any(|c| text.contains(c)))
}

pub(crate) fn signals(snapshot: &RepoSnapshot) -> Vec<Signal> {
    vec![
        Signal::new("Linter configured", 20, has_linter(snapshot)),
        Signal::new("Formatter configured", 15, has_formatter(snapshot)),
        Signal::new("Type system", 15, has_type_system(snapshot)),
        Signal::new("Git hooks", 10, has_git_hooks(snapshot)),
        Signal::new("Tests present", 20, snapshot.any_blob(is_test_path)),
        Signal::new("CI runs tests", 10, ci_runs_tests(snapshot)),
        Signal::new("EditorConfig", 10, snapshot.has_file(".editorconfig")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Category, CategoryResult};
    use crate::snapshot::test_support::snapshot;

    fn analyze(snap: &RepoSnapshot) -> CategoryResult {
        CategoryResult::from_signals(Category::Quality, signals(snap))
    }

    #[test]
    fn recognises_test_layouts() {
        for path in [
            "tests/integration.rs",
            "src/__tests__/app.tsx",
            "pkg/server_test.go",
            "app/test_models.py",
            "src/button.test.tsx",
            "spec/models/user_spec.rb",
        ] {
            assert!(is_test_path(path), "{path}");
        }
        assert!(!is_test_path("src/main.rs"));
        assert!(!is_test_path("tests"));
        assert!(!is_test_path("src/contest.rs"));
    }

    #[test]
    fn java_tests_need_junit_names() {
        for path in [
            "src/main/java/app/ParserTest.java",
            "src/main/java/app/ParserTests.java",
            "src/main/java/app/TestParser.java",
        ] {
            assert!(is_test_path(path), "{path}");
        }
        for path in [
            "src/main/Latest.java",
            "src/main/Greatest.java",
            "src/main/Contest.java",
            "src/main/Testament.java",
        ] {
            assert!(!is_test_path(path), "{path}");
        }
    }

    #[test]
    fn nested_config_files_count_by_name() {
        let result = analyze(&snapshot(&["web/.eslintrc.json", "web/.prettierrc"], &[]));
        assert_eq!(result.score, 35);
    }

    #[test]
    fn pyproject_tool_tables_count() {
        let snap = snapshot(
            &["pyproject.toml"],
            &[("pyproject.toml", "[tool.ruff]\nline-length = 100\n[tool.black]\n[tool.mypy]\n")],
        );
        let result = analyze(&snap);
        assert_eq!(result.score, 50);
    }

    #[test]
    fn rust_project_with_everything_scores_one_hundred() {
        let snap = snapshot(
            &[
                "Cargo.toml",
                "clippy.toml",
                "rustfmt.toml",
                ".husky/pre-commit",
                "tests/cli.rs",
                ".github/workflows/ci.yml",
                ".editorconfig",
            ],
            &[(".github/workflows/ci.yml", "steps:\n  - run: cargo test --all\n")],
        );
        assert_eq!(analyze(&snap).score, 100);
    }
}
