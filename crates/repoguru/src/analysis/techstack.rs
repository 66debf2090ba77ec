//! Technology detection from manifests and tree paths.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::manifest::parse_manifests;
use crate::snapshot::{RepoSnapshot, file_name_lower};

/// What kind of technology an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechKind {
    Language,
    Framework,
    Infrastructure,
    Cloud,
}

/// One detected technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechItem {
    pub name: String,
    pub kind: TechKind,
}

/// Evidence a detector looks for.
enum Evidence {
    /// Any of these root files exists.
    Files(&'static [&'static str]),
    /// A declared dependency equals one of these names or starts with one
    /// ending in `/` or `-`.
    Dependency(&'static [&'static str]),
    /// Some blob path satisfies the predicate.
    Path(fn(&str) -> bool),
}

struct Detector {
    name: &'static str,
    kind: TechKind,
    evidence: &'static [Evidence],
}

use Evidence::{Dependency, Files, Path};
use TechKind::{Cloud, Framework, Infrastructure, Language};

fn has_extension(path: &str, ext: &str) -> bool {
    path.rsplit_once('.').is_some_and(|(_, e)| e == ext)
}

fn is_typescript(path: &str) -> bool {
    (has_extension(path, "ts") || has_extension(path, "tsx")) && !path.ends_with(".d.ts")
}

fn is_terraform(path: &str) -> bool {
    has_extension(path, "tf")
}

fn is_helm_chart(path: &str) -> bool {
    file_name_lower(path) == "chart.yaml"
}

fn is_kubernetes_manifest(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    (lower.starts_with("k8s/") || lower.contains("/k8s/") || lower.starts_with("kubernetes/"))
        || file_name_lower(path) == "kustomization.yaml"
}

fn is_dockerfile(path: &str) -> bool {
    let name = file_name_lower(path);
    name == "dockerfile" || name.starts_with("dockerfile.") || name.ends_with(".dockerfile")
}

const DETECTORS: &[Detector] = &[
    // Languages and runtimes
    Detector {
        name: "Node.js",
        kind: Language,
        evidence: &[Files(&["package.json"])],
    },
    Detector {
        name: "TypeScript",
        kind: Language,
        evidence: &[
            Files(&["tsconfig.json"]),
            Dependency(&["typescript"]),
            Path(is_typescript),
        ],
    },
    Detector {
        name: "Rust",
        kind: Language,
        evidence: &[Files(&["Cargo.toml"])],
    },
    Detector {
        name: "Go",
        kind: Language,
        evidence: &[Files(&["go.mod"])],
    },
    Detector {
        name: "Python",
        kind: Language,
        evidence: &[Files(&[
            "requirements.txt",
            "pyproject.toml",
            "setup.py",
            "Pipfile",
        ])],
    },
    Detector {
        name: "Java",
        kind: Language,
        evidence: &[Files(&["pom.xml", "build.gradle", "build.gradle.kts"])],
    },
    Detector {
        name: "PHP",
        kind: Language,
        evidence: &[Files(&["composer.json"])],
    },
    Detector {
        name: "Ruby",
        kind: Language,
        evidence: &[Files(&["Gemfile"])],
    },
    // Frameworks
    Detector {
        name: "React",
        kind: Framework,
        evidence: &[Dependency(&["react"])],
    },
    Detector {
        name: "Next.js",
        kind: Framework,
        evidence: &[Dependency(&["next"]), Files(&["next.config.js", "next.config.mjs"])],
    },
    Detector {
        name: "Vue",
        kind: Framework,
        evidence: &[Dependency(&["vue"])],
    },
    Detector {
        name: "Nuxt",
        kind: Framework,
        evidence: &[Dependency(&["nuxt"])],
    },
    Detector {
        name: "Svelte",
        kind: Framework,
        evidence: &[Dependency(&["svelte", "@sveltejs/"])],
    },
    Detector {
        name: "Angular",
        kind: Framework,
        evidence: &[Dependency(&["@angular/"]), Files(&["angular.json"])],
    },
    Detector {
        name: "Express",
        kind: Framework,
        evidence: &[Dependency(&["express"])],
    },
    Detector {
        name: "NestJS",
        kind: Framework,
        evidence: &[Dependency(&["@nestjs/"])],
    },
    Detector {
        name: "Vite",
        kind: Framework,
        evidence: &[Dependency(&["vite"])],
    },
    Detector {
        name: "Tailwind CSS",
        kind: Framework,
        evidence: &[
            Dependency(&["tailwindcss"]),
            Files(&["tailwind.config.js", "tailwind.config.ts"]),
        ],
    },
    Detector {
        name: "Electron",
        kind: Framework,
        evidence: &[Dependency(&["electron"])],
    },
    Detector {
        name: "Django",
        kind: Framework,
        evidence: &[Dependency(&["django"]), Files(&["manage.py"])],
    },
    Detector {
        name: "Flask",
        kind: Framework,
        evidence: &[Dependency(&["flask"])],
    },
    Detector {
        name: "FastAPI",
        kind: Framework,
        evidence: &[Dependency(&["fastapi"])],
    },
    Detector {
        name: "Rails",
        kind: Framework,
        evidence: &[Dependency(&["rails"])],
    },
    Detector {
        name: "Laravel",
        kind: Framework,
        evidence: &[Dependency(&["laravel/"])],
    },
    Detector {
        name: "Spring",
        kind: Framework,
        evidence: &[Dependency(&["spring-boot-", "org.springframework"])],
    },
    Detector {
        name: "Tokio",
        kind: Framework,
        evidence: &[Dependency(&["tokio"])],
    },
    Detector {
        name: "Axum",
        kind: Framework,
        evidence: &[Dependency(&["axum"])],
    },
    Detector {
        name: "Actix Web",
        kind: Framework,
        evidence: &[Dependency(&["actix-web"])],
    },
    Detector {
        name: "Gin",
        kind: Framework,
        evidence: &[Dependency(&["github.com/gin-gonic/gin"])],
    },
    // Infrastructure
    Detector {
        name: "Docker",
        kind: Infrastructure,
        evidence: &[
            Path(is_dockerfile),
            Files(&[
                "docker-compose.yml",
                "docker-compose.yaml",
                "compose.yml",
                "compose.yaml",
            ]),
        ],
    },
    Detector {
        name: "Kubernetes",
        kind: Infrastructure,
        evidence: &[Path(is_kubernetes_manifest)],
    },
    Detector {
        name: "Helm",
        kind: Infrastructure,
        evidence: &[Path(is_helm_chart)],
    },
    Detector {
        name: "Terraform",
        kind: Infrastructure,
        evidence: &[Path(is_terraform)],
    },
    // Cloud providers
    Detector {
        name: "AWS",
        kind: Cloud,
        evidence: &[
            Dependency(&["@aws-sdk/", "aws-sdk", "aws-cdk-lib", "boto3", "aws-config"]),
            Files(&["cdk.json", "serverless.yml", "samconfig.toml", "template.yaml"]),
        ],
    },
    Detector {
        name: "Azure",
        kind: Cloud,
        evidence: &[
            Dependency(&["@azure/", "azure-"]),
            Files(&["azure-pipelines.yml", "azure.yaml"]),
        ],
    },
    Detector {
        name: "GCP",
        kind: Cloud,
        evidence: &[
            Dependency(&["@google-cloud/", "google-cloud-", "firebase"]),
            Files(&["app.yaml", "cloudbuild.yaml", "firebase.json"]),
        ],
    },
];

fn dependency_matches(dep: &str, pattern: &str) -> bool {
    let dep = dep.to_ascii_lowercase();
    if pattern.ends_with('/') || pattern.ends_with('-') {
        dep.starts_with(pattern)
    } else {
        dep == pattern || dep.starts_with(&format!("{pattern}-"))
    }
}

/// Detect languages, frameworks, infrastructure and cloud providers.
///
/// Results follow detector order and contain no duplicates.
#[must_use]
pub fn detect_tech_stack(snapshot: &RepoSnapshot) -> Vec<TechItem> {
    let dependencies: Vec<String> = parse_manifests(snapshot)
        .into_iter()
        .flat_map(|m| m.dependencies)
        .collect();

    let mut seen = HashSet::new();
    DETECTORS
        .iter()
        .filter(|detector| {
            detector.evidence.iter().any(|evidence| match evidence {
                Files(paths) => snapshot.has_any(paths),
                Dependency(patterns) => dependencies
                    .iter()
                    .any(|d| patterns.iter().any(|p| dependency_matches(d, p))),
                Path(pred) => snapshot.any_blob(pred),
            })
        })
        .filter(|detector| seen.insert(detector.name))
        .map(|detector| TechItem {
            name: detector.name.to_string(),
            kind: detector.kind,
        })
        .collect()
}
