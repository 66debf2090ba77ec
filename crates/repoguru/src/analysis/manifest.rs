//! Dependency extraction from package manifests.
//!
//! Only direct dependency names are extracted; versions and resolution are
//! out of scope. JSON manifests go through `serde_json`, TOML manifests
//! through `toml_edit`, and the line-oriented formats are scanned by hand.
//! A manifest that fails to parse yields `None` rather than an error.

use serde_json::Value;
use toml_edit::{DocumentMut, Item};

use crate::snapshot::RepoSnapshot;

/// Root manifest paths recognised for dependency counting, in priority order.
pub const MANIFEST_PATHS: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "go.mod",
    "requirements.txt",
    "pyproject.toml",
    "Pipfile",
    "setup.py",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "composer.json",
];

/// Lockfiles recognised anywhere at the repository root.
pub const LOCKFILE_PATHS: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "bun.lock",
    "Cargo.lock",
    "go.sum",
    "poetry.lock",
    "Pipfile.lock",
    "uv.lock",
    "Gemfile.lock",
    "composer.lock",
    "gradle.lockfile",
];

/// Direct dependencies declared by one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedManifest {
    pub path: &'static str,
    pub dependencies: Vec<String>,
}

/// Parse every fetched manifest that has a parser.
#[must_use]
pub fn parse_manifests(snapshot: &RepoSnapshot) -> Vec<ParsedManifest> {
    MANIFEST_PATHS
        .iter()
        .filter_map(|&path| {
            let text = snapshot.text(path)?;
            let dependencies = match path {
                "package.json" => package_json(&text)?,
                "composer.json" => composer_json(&text)?,
                "Cargo.toml" => cargo_toml(&text)?,
                "pyproject.toml" => pyproject_toml(&text)?,
                "Pipfile" => pipfile(&text)?,
                "go.mod" => go_mod(&text),
                "requirements.txt" => requirements_txt(&text),
                "Gemfile" => gemfile(&text),
                "pom.xml" => pom_xml(&text),
                "build.gradle" | "build.gradle.kts" => gradle(&text),
                _ => return None,
            };
            Some(ParsedManifest { path, dependencies })
        })
        .collect()
}

/// Names of a JSON object's keys under each of `sections`.
fn json_sections(text: &str, sections: &[&str]) -> Option<Vec<String>> {
    let json: Value = serde_json::from_str(text).ok()?;
    let mut names = Vec::new();
    for section in sections {
        if let Some(map) = json.get(section).and_then(Value::as_object) {
            names.extend(map.keys().cloned());
        }
    }
    Some(names)
}

/// `dependencies`, `devDependencies`, `peerDependencies` and `optionalDependencies`.
#[must_use]
pub fn package_json(text: &str) -> Option<Vec<String>> {
    json_sections(
        text,
        &[
            "dependencies",
            "devDependencies",
            "peerDependencies",
            "optionalDependencies",
        ],
    )
}

/// `require` and `require-dev`, minus platform requirements (`php`, `ext-*`).
#[must_use]
pub fn composer_json(text: &str) -> Option<Vec<String>> {
    let names = json_sections(text, &["require", "require-dev"])?;
    Some(
        names
            .into_iter()
            .filter(|n| n != "php" && !n.starts_with("ext-"))
            .collect(),
    )
}

fn table_keys(item: Option<&Item>) -> Vec<String> {
    item.and_then(Item::as_table_like)
        .map(|t| t.iter().map(|(k, _)| k.to_string()).collect())
        .unwrap_or_default()
}

/// Dependency tables of a Cargo manifest, including `[workspace.dependencies]`.
#[must_use]
pub fn cargo_toml(text: &str) -> Option<Vec<String>> {
    let doc: DocumentMut = text.parse().ok()?;
    let mut names = Vec::new();
    for section in ["dependencies", "dev-dependencies", "build-dependencies"] {
        names.extend(table_keys(doc.get(section)));
    }
    names.extend(table_keys(
        doc.get("workspace").and_then(|w| w.get("dependencies")),
    ));
    names.sort();
    names.dedup();
    Some(names)
}

/// PEP 621 `[project]` dependencies plus Poetry tables.
#[must_use]
pub fn pyproject_toml(text: &str) -> Option<Vec<String>> {
    let doc: DocumentMut = text.parse().ok()?;
    let mut names: Vec<String> = Vec::new();

    let project = doc.get("project");
    if let Some(array) = project
        .and_then(|p| p.get("dependencies"))
        .and_then(Item::as_array)
    {
        names.extend(
            array
                .iter()
                .filter_map(|v| v.as_str())
                .map(requirement_name)
                .filter(|n| !n.is_empty()),
        );
    }
    if let Some(groups) = project
        .and_then(|p| p.get("optional-dependencies"))
        .and_then(Item::as_table_like)
    {
        for (_, group) in groups.iter() {
            if let Some(array) = group.as_array() {
                names.extend(
                    array
                        .iter()
                        .filter_map(|v| v.as_str())
                        .map(requirement_name)
                        .filter(|n| !n.is_empty()),
                );
            }
        }
    }

    let poetry = doc.get("tool").and_then(|t| t.get("poetry"));
    names.extend(
        table_keys(poetry.and_then(|p| p.get("dependencies")))
            .into_iter()
            .filter(|n| n != "python"),
    );
    names.extend(table_keys(poetry.and_then(|p| p.get("dev-dependencies"))));

    names.sort();
    names.dedup();
    Some(names)
}

/// `[packages]` and `[dev-packages]` of a Pipfile.
#[must_use]
pub fn pipfile(text: &str) -> Option<Vec<String>> {
    let doc: DocumentMut = text.parse().ok()?;
    let mut names = table_keys(doc.get("packages"));
    names.extend(table_keys(doc.get("dev-packages")));
    Some(names)
}

/// Project name of a PEP 508 requirement string.
fn requirement_name(spec: &str) -> String {
    let spec = spec.trim();
    let end = spec
        .find(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | ';' | '[' | '@' | ' ' | '('))
        .unwrap_or(spec.len());
    spec[..end].trim().to_string()
}

/// One requirement per line; comments, options and includes are skipped.
#[must_use]
pub fn requirements_txt(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .map(requirement_name)
        .filter(|n| !n.is_empty())
        .collect()
}

/// Module paths of `require` directives, block or single-line.
#[must_use]
pub fn go_mod(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut in_block = false;
    for line in text.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        if in_block {
            if line == ")" {
                in_block = false;
            } else if let Some(module) = line.split_whitespace().next() {
                names.push(module.to_string());
            }
        } else if line == "require (" || line == "require(" {
            in_block = true;
        } else if let Some(rest) = line.strip_prefix("require ")
            && let Some(module) = rest.split_whitespace().next()
        {
            names.push(module.to_string());
        }
    }
    names
}

/// `gem "name"` lines.
#[must_use]
pub fn gemfile(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("gem "))
        .filter_map(|rest| {
            let rest = rest.trim_start();
            let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
            let inner = &rest[1..];
            inner.find(quote).map(|end| inner[..end].to_string())
        })
        .collect()
}

/// `artifactId`s of `<dependency>` elements.
#[must_use]
pub fn pom_xml(text: &str) -> Vec<String> {
    text.split("<dependency>")
        .skip(1)
        .filter_map(|chunk| {
            let chunk = chunk.split("</dependency>").next()?;
            let start = chunk.find("<artifactId>")? + "<artifactId>".len();
            let end = chunk[start..].find("</artifactId>")? + start;
            Some(chunk[start..end].trim().to_string())
        })
        .collect()
}

/// Coordinates passed to the usual Gradle dependency configurations.
#[must_use]
pub fn gradle(text: &str) -> Vec<String> {
    const CONFIGURATIONS: &[&str] = &[
        "implementation",
        "api",
        "compileOnly",
        "runtimeOnly",
        "testImplementation",
        "testRuntimeOnly",
        "kapt",
        "annotationProcessor",
    ];
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let config = CONFIGURATIONS.iter().find(|c| {
                line.strip_prefix(**c)
                    .is_some_and(|rest| rest.starts_with('(') || rest.starts_with(' '))
            })?;
            let rest = &line[config.len()..];
            let start = rest.find(['"', '\''])? + 1;
            let end = rest[start..].find(['"', '\''])? + start;
            Some(rest[start..end].to_string())
        })
        .collect()
}
