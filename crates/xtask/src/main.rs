use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Crates the pure domain must never depend on.
const FORBIDDEN_DOMAIN_DEPS: &[&str] = &[
    "tokio",
    "tokio-util",
    "async-trait",
    "futures-util",
    "tracing",
    "tracing-subscriber",
    "rand",
    "chrono",
    "dotenvy",
];

const DOMAIN_PACKAGE: &str = "turnwright-domain";

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
    workspace_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    name: String,
    kind: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("arch-check") => arch_check(),
        Some(cmd) => anyhow::bail!("Unknown xtask command: {cmd}"),
        None => anyhow::bail!("Usage: cargo xtask <command>\n\nCommands:\n  arch-check"),
    }
}

fn arch_check() -> anyhow::Result<()> {
    let output = std::process::Command::new("cargo")
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .context("running cargo metadata")?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed")
    }

    let metadata: Metadata =
        serde_json::from_slice(&output.stdout).context("parsing cargo metadata")?;

    let mut violations = dependency_violations(&metadata)?;
    violations.extend(source_violations(
        &metadata.workspace_root.join("crates/domain/src"),
    )?);

    if violations.is_empty() {
        println!("arch-check: {DOMAIN_PACKAGE} is free of runtime dependencies");
        return Ok(());
    }

    for violation in &violations {
        eprintln!("arch-check: {violation}");
    }
    anyhow::bail!("{} architecture violation(s)", violations.len())
}

fn dependency_violations(metadata: &Metadata) -> anyhow::Result<Vec<String>> {
    let domain = metadata
        .packages
        .iter()
        .find(|p| p.name == DOMAIN_PACKAGE)
        .with_context(|| format!("{DOMAIN_PACKAGE} not found in workspace"))?;

    Ok(domain
        .dependencies
        .iter()
        // dev-dependencies are allowed to pull in test runtimes
        .filter(|d| d.kind.as_deref() != Some("dev"))
        .filter(|d| FORBIDDEN_DOMAIN_DEPS.contains(&d.name.as_str()))
        .map(|d| format!("{DOMAIN_PACKAGE} depends on `{}`", d.name))
        .collect())
}

fn source_violations(dir: &Path) -> anyhow::Result<Vec<String>> {
    let pattern = regex_lite::Regex::new(r"\b(async\s+fn|\.await\b|tokio::|tracing::)")
        .context("compiling source pattern")?;
    let mut violations = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("rs") {
                continue;
            }
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            for (line_no, line) in source.lines().enumerate() {
                if line.trim_start().starts_with("//") {
                    continue;
                }
                if let Some(found) = pattern.find(line) {
                    violations.push(format!(
                        "{}:{}: `{}` in the domain crate",
                        path.display(),
                        line_no + 1,
                        found.as_str()
                    ));
                }
            }
        }
    }

    Ok(violations)
}
