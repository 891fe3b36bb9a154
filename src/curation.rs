use std::{collections::HashSet, path::Path};

use anyhow::Context;
use serde::Deserialize;

use crate::{models::Film, slug::slugify};

const BUNDLED: &str = include_str!("../curation/hidden_gem_exclusions.toml");

#[derive(Debug, Deserialize)]
struct ExclusionFile {
    name: String,
    version: u32,
    #[serde(default)]
    titles: Vec<String>,
}

/// Titles too well known to be surfaced as hidden gems on rating alone.
#[derive(Clone, Debug, Default)]
pub struct HiddenGemExclusions {
    pub name: String,
    pub version: u32,
    slugs: HashSet<String>,
}

impl HiddenGemExclusions {
    pub fn bundled() -> anyhow::Result<Self> {
        Self::parse(BUNDLED).context("bundled hidden gem exclusions")
    }

    /// Reads the list from `path`, or the copy compiled into the binary.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Self::bundled();
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let file: ExclusionFile = toml::from_str(raw)?;
        let slugs = file
            .titles
            .iter()
            .map(|t| slugify(t))
            .filter(|s| !s.is_empty())
            .collect();
        Ok(Self { name: file.name, version: file.version, slugs })
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }

    /// Matches on the stored slug, or on the title for rows that have none.
    pub fn excludes(&self, film: &Film) -> bool {
        let key = match film.slug.as_deref() {
            Some(slug) if !slug.is_empty() => slugify(slug),
            _ => slugify(&film.title),
        };
        self.slugs.contains(&key)
    }
}
