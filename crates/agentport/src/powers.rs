//! Skills → powers: each `SKILL.md` directory becomes
//! `<output>/power-<slug>/POWER.md` plus a `steering/` copy of its other files.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use walkdir::WalkDir;

use crate::batch::{ConversionFailure, Mode};
use crate::convert::compile_regex;
use crate::error::{ConvertError, Result};
use crate::model::{dedupe_identifiers, normalize_identifier};
use crate::parser::DefinitionParser;
use crate::parser::skill_md::SkillMarkdownParser;

const MAX_KEYWORDS: usize = 4;
const STEERING_DIR: &str = "steering";
const POWER_FILE: &str = "POWER.md";

static TECH_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(concat!(
        r"\b(stripe|paypal|pci|gdpr|fastapi|nextjs|react|vue|angular|typescript|",
        r"javascript|python|rust|go|java|aws|azure|gcp|docker|kubernetes|terraform|",
        r"helm|istio|linkerd|prometheus|grafana|postgres|mysql|mongodb|redis|graphql|",
        r"rest|grpc|oauth|jwt|webpack|tailwind|jest|cypress|playwright|gitlab|github|",
        r"unity|godot|solidity|ethereum)\b"
    ))
});

#[derive(Debug, Clone)]
pub struct PowersSettings {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub mode: Mode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PowerFrontmatter<'a> {
    name: &'a str,
    display_name: &'a str,
    description: &'a str,
    keywords: &'a [String],
}

/// One skill ready to be written (or reported in preview).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerEntry {
    pub slug: String,
    pub display_name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub source_dir: PathBuf,
    pub power_dir: PathBuf,
    /// Sibling files of `SKILL.md`, copied into `steering/`.
    pub steering: Vec<PathBuf>,
    body: String,
}

#[derive(Debug, Clone)]
pub struct PowersReport {
    pub mode: Mode,
    pub discovered: usize,
    pub powers: Vec<PowerEntry>,
    pub failures: Vec<ConversionFailure>,
}

impl PowersReport {
    pub fn summary(&self) -> String {
        let verb = match self.mode {
            Mode::Preview => "would create",
            Mode::Commit => "created",
        };
        format!(
            "{verb} {} of {} powers ({} failed)",
            self.powers.len(),
            self.discovered,
            self.failures.len()
        )
    }
}

/// Every `SKILL.md` under `root`, sorted, hidden directories skipped.
pub fn discover_skills(root: &Path) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(root).map_err(|source| ConvertError::Discovery {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ConvertError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    let mut out = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        match entry {
            Ok(e) if e.file_type().is_file() && SkillMarkdownParser::supports(e.path()) => {
                out.push(e.into_path());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("skipping unreadable entry: {}", e),
        }
    }
    out.sort();
    Ok(out)
}

/// Keywords for a power: the first two name parts, known technology terms in
/// name and description, then name parts and path segments. Words of two
/// characters or fewer are dropped; at most four are kept.
pub fn extract_keywords(name: &str, description: &str, rel_dir: &Path) -> Vec<String> {
    let name_parts = split_words(name);
    let mut candidates: Vec<String> = name_parts.iter().take(2).cloned().collect();

    let combined = format!("{name} {description}").to_lowercase();
    candidates.extend(TECH_TERMS.find_iter(&combined).map(|m| m.as_str().to_string()));
    candidates.extend(name_parts.iter().cloned());
    for comp in rel_dir.components() {
        let Component::Normal(seg) = comp else {
            continue;
        };
        let seg = seg.to_string_lossy();
        if seg.contains("plugins") || seg.contains("skills") {
            continue;
        }
        candidates.extend(split_words(&seg));
    }

    let mut out: Vec<String> = Vec::new();
    for kw in candidates {
        if kw.chars().count() > 2 && !out.contains(&kw) {
            out.push(kw);
        }
        if out.len() == MAX_KEYWORDS {
            break;
        }
    }
    out
}

fn split_words(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render `POWER.md`: YAML frontmatter, a blank line, then the skill body.
pub fn render_power(entry: &PowerEntry) -> Result<String> {
    let header = PowerFrontmatter {
        name: &entry.slug,
        display_name: &entry.display_name,
        description: &entry.description,
        keywords: &entry.keywords,
    };
    let yaml = serde_yaml::to_string(&header)?;
    Ok(format!("---\n{yaml}---\n\n{}\n", entry.body))
}

fn plan_skill(skill_md: &Path, settings: &PowersSettings) -> Result<PowerEntry> {
    let skill_dir = skill_md.parent().unwrap_or(settings.source_root.as_path());
    let dir_name = skill_dir
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = fs::read_to_string(skill_md).map_err(|source| ConvertError::Read {
        path: skill_md.to_path_buf(),
        source,
    })?;
    let doc = SkillMarkdownParser::parse(&dir_name, &content)?;

    let display_name = doc.name.unwrap_or_else(|| dir_name.clone());
    let slug = normalize_identifier(&display_name);
    if slug.is_empty() {
        return Err(ConvertError::ConversionFailed {
            identifier: dir_name,
            reason: "skill name has no usable characters".to_string(),
        });
    }
    let description = doc.description.unwrap_or_else(|| {
        tracing::warn!("no description in {}", skill_md.display());
        format!("Converted from {display_name} skill")
    });
    let rel = skill_dir
        .strip_prefix(&settings.source_root)
        .unwrap_or(skill_dir);
    let keywords = extract_keywords(&display_name, &description, rel);

    let mut steering: Vec<PathBuf> = match fs::read_dir(skill_dir) {
        Ok(rd) => rd
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && !SkillMarkdownParser::supports(p))
            .collect(),
        Err(e) => {
            tracing::warn!("cannot list {}: {}", skill_dir.display(), e);
            Vec::new()
        }
    };
    steering.sort();

    Ok(PowerEntry {
        power_dir: settings.output_root.join(format!("power-{slug}")),
        slug,
        display_name,
        description,
        keywords,
        source_dir: skill_dir.to_path_buf(),
        steering,
        body: doc.body,
    })
}

fn write_power(entry: &PowerEntry) -> Result<()> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ConvertError::Write { path, source }
    };
    fs::create_dir_all(&entry.power_dir).map_err(write_err(&entry.power_dir))?;
    let power_md = entry.power_dir.join(POWER_FILE);
    fs::write(&power_md, render_power(entry)?).map_err(write_err(&power_md))?;

    if !entry.steering.is_empty() {
        let steering_dir = entry.power_dir.join(STEERING_DIR);
        fs::create_dir_all(&steering_dir).map_err(write_err(&steering_dir))?;
        for file in &entry.steering {
            let Some(fname) = file.file_name() else {
                continue;
            };
            let dest = steering_dir.join(fname);
            fs::copy(file, &dest).map_err(write_err(&dest))?;
        }
    }
    Ok(())
}

/// Convert every skill under the source root. Per-skill failures are
/// collected; only a missing or non-directory source root is an error.
pub fn convert_skills(settings: &PowersSettings) -> Result<PowersReport> {
    let skills = discover_skills(&settings.source_root)?;
    tracing::info!(
        count = skills.len(),
        root = %settings.source_root.display(),
        "discovered skills"
    );

    let mut report = PowersReport {
        mode: settings.mode,
        discovered: skills.len(),
        powers: Vec::new(),
        failures: Vec::new(),
    };

    let mut planned = Vec::new();
    for skill_md in &skills {
        match plan_skill(skill_md, settings) {
            Ok(entry) => planned.push(entry),
            Err(e) => {
                tracing::warn!("skipping {}: {}", skill_md.display(), e);
                report.failures.push(ConversionFailure {
                    identifier: skill_md.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let mut slugs: Vec<String> = planned.iter().map(|p| p.slug.clone()).collect();
    dedupe_identifiers(&mut slugs);
    for (entry, slug) in planned.iter_mut().zip(slugs) {
        if entry.slug != slug {
            entry.power_dir = settings.output_root.join(format!("power-{slug}"));
            entry.slug = slug;
        }
    }

    for entry in planned {
        match settings.mode {
            Mode::Preview => {
                tracing::info!(
                    keywords = ?entry.keywords,
                    "would create {}",
                    entry.power_dir.join(POWER_FILE).display()
                );
                report.powers.push(entry);
            }
            Mode::Commit => match write_power(&entry) {
                Ok(()) => {
                    tracing::debug!(
                        "converted {} -> {}",
                        entry.source_dir.display(),
                        entry.power_dir.display()
                    );
                    report.powers.push(entry);
                }
                Err(e) => {
                    tracing::warn!("failed to write {}: {}", entry.power_dir.display(), e);
                    report.failures.push(ConversionFailure {
                        identifier: entry.slug.clone(),
                        reason: e.to_string(),
                    });
                }
            },
        }
    }
    tracing::info!("{}", report.summary());
    Ok(report)
}
