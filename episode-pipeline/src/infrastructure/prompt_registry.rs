// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prompt template registry: loads versioned prompt files from disk, splits
//! YAML frontmatter from the template body, hashes the body (frontmatter is
//! excluded so cosmetic metadata edits don't force a re-run), and renders
//! `{{ var }}` placeholders.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use episode_pipeline_domain::services::{ContentHasher, Sha256ContentHasher};
use episode_pipeline_domain::{ContentHash, PipelineError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct Frontmatter {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    max_tokens: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub stage: String,
    pub version: String,
    pub body: String,
    pub content_hash: ContentHash,
    pub description: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
}

pub struct PromptRegistry {
    prompts_dir: PathBuf,
    hasher: Sha256ContentHasher,
}

impl PromptRegistry {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self { prompts_dir: prompts_dir.into(), hasher: Sha256ContentHasher }
    }

    fn template_path(&self, stage: &str, version: &str) -> PathBuf {
        self.prompts_dir.join(stage).join(format!("{version}.md"))
    }

    /// Splits a file of the form `---\n<yaml>\n---\n<body>` into frontmatter
    /// and body. A file with no leading `---` delimiter is treated as having
    /// no frontmatter at all.
    fn split_frontmatter(raw: &str) -> Result<(Option<Frontmatter>, &str), PipelineError> {
        let Some(rest) = raw.strip_prefix("---\n") else {
            return Ok((None, raw));
        };
        let Some(end) = rest.find("\n---\n") else {
            return Ok((None, raw));
        };
        let (yaml, body) = rest.split_at(end);
        let body = &body[5..];
        let fm: Frontmatter = serde_yaml::from_str(yaml)
            .map_err(|e| PipelineError::TemplateParseError(format!("{yaml}: {e}")))?;
        Ok((Some(fm), body))
    }

    pub fn load_template(&self, stage: &str, version: &str) -> Result<PromptTemplate, PipelineError> {
        let path = self.template_path(stage, version);
        let raw = std::fs::read_to_string(&path)
            .map_err(|_| PipelineError::TemplateNotFound(format!("{stage}/{version}")))?;
        let (frontmatter, body) = Self::split_frontmatter(&raw)?;
        let content_hash = self.hasher.hash_bytes(body.as_bytes());
        Ok(PromptTemplate {
            stage: stage.to_string(),
            version: version.to_string(),
            body: body.to_string(),
            content_hash,
            description: frontmatter.as_ref().and_then(|f| f.description.clone()),
            model: frontmatter.as_ref().and_then(|f| f.model.clone()),
            temperature: frontmatter.as_ref().and_then(|f| f.temperature),
            max_tokens: frontmatter.as_ref().and_then(|f| f.max_tokens),
        })
    }

    pub fn template_exists(&self, stage: &str, version: &str) -> bool {
        self.template_path(stage, version).exists()
    }

    pub fn stage_dir(&self, stage: &str) -> PathBuf {
        self.prompts_dir.join(stage)
    }

    /// Lists available `.md` template versions for a stage, sorted
    /// lexicographically (version strings are expected to sort meaningfully,
    /// e.g. `v1`, `v2`, `v10`... callers that need numeric ordering should
    /// normalize their own version naming).
    pub fn list_versions(&self, stage: &str) -> Result<Vec<String>, PipelineError> {
        let dir = self.stage_dir(stage);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(PipelineError::from)? {
            let entry = entry.map_err(PipelineError::from)?;
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                if entry.path().extension().and_then(|e| e.to_str()) == Some("md") {
                    versions.push(stem.to_string());
                }
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// Substitutes `{{ key }}` (whitespace around the key is ignored) with
    /// values from `vars`. Unresolved placeholders are left verbatim so a
    /// caller can detect and report them rather than silently losing text.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let key = after[..end].trim();
            match vars.get(key) {
                Some(value) => out.push_str(value),
                None => {
                    out.push_str("{{");
                    out.push_str(&after[..end]);
                    out.push_str("}}");
                }
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        out
    }
}

pub fn prompts_root(base: &Path) -> PathBuf {
    base.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_template(dir: &Path, stage: &str, version: &str, content: &str) {
        let stage_dir = dir.join(stage);
        fs::create_dir_all(&stage_dir).unwrap();
        fs::write(stage_dir.join(format!("{version}.md")), content).unwrap();
    }

    #[test]
    fn loads_template_without_frontmatter() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), "correct", "v1", "Fix punctuation in: {{ transcript }}");
        let registry = PromptRegistry::new(dir.path());
        let tpl = registry.load_template("correct", "v1").unwrap();
        assert_eq!(tpl.body, "Fix punctuation in: {{ transcript }}");
        assert!(tpl.description.is_none());
        assert!(tpl.model.is_none());
    }

    #[test]
    fn loads_template_with_frontmatter_and_hashes_body_only() {
        let dir = tempfile::tempdir().unwrap();
        write_template(
            dir.path(),
            "correct",
            "v1",
            "---\ndescription: fixes punctuation\nmodel: gpt-4o\ntemperature: 0.2\nmax_tokens: 2048\n---\nFix: {{ transcript }}",
        );
        let registry = PromptRegistry::new(dir.path());
        let tpl = registry.load_template("correct", "v1").unwrap();
        assert_eq!(tpl.description.as_deref(), Some("fixes punctuation"));
        assert_eq!(tpl.model.as_deref(), Some("gpt-4o"));
        assert_eq!(tpl.temperature, Some(0.2));
        assert_eq!(tpl.max_tokens, Some(2048));
        assert_eq!(tpl.body, "Fix: {{ transcript }}");

        let direct_hash = Sha256ContentHasher.hash_bytes(tpl.body.as_bytes());
        assert_eq!(tpl.content_hash, direct_hash);
    }

    #[test]
    fn missing_template_is_template_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PromptRegistry::new(dir.path());
        let err = registry.load_template("correct", "v9").unwrap_err();
        assert!(matches!(err, PipelineError::TemplateNotFound(_)));
    }

    #[test]
    fn render_substitutes_known_vars_and_preserves_unknown() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Ada".to_string());
        let out = PromptRegistry::render("Hello {{ name }}, status: {{ status }}", &vars);
        assert_eq!(out, "Hello Ada, status: {{ status }}");
    }
}
