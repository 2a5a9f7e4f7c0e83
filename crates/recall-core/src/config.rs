//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars, then extracts a typed [`EngineSettings`]. Invalid combinations
//! (chunk overlap >= max length, zero dimensionality) are rejected at load
//! time so misconfiguration never reaches the chunker or index.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the full engine settings tree.
    pub fn settings(&self) -> anyhow::Result<EngineSettings> {
        let settings: EngineSettings = self.figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub index: IndexSettings,
    pub chunking: ChunkingSettings,
    pub fusion: FusionSettings,
    pub recommend: RecommendSettings,
    pub indexer: IndexerSettings,
}

impl EngineSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.dimension == 0 {
            anyhow::bail!("index.dimension must be positive");
        }
        if self.chunking.max_len == 0 {
            anyhow::bail!("chunking.max_len must be positive");
        }
        if self.chunking.overlap >= self.chunking.max_len {
            anyhow::bail!(
                "chunking.overlap ({}) must be smaller than chunking.max_len ({})",
                self.chunking.overlap,
                self.chunking.max_len
            );
        }
        if !(0.0..=1.0).contains(&self.fusion.diversity_factor) {
            anyhow::bail!("fusion.diversity_factor must be in [0, 1]");
        }
        if self.fusion.overfetch_factor == 0 {
            anyhow::bail!("fusion.overfetch_factor must be positive");
        }
        if self.recommend.overfetch_factor == 0 {
            anyhow::bail!("recommend.overfetch_factor must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub dimension: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { dimension: 384 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Soft chunk size in bytes of UTF-8 text.
    pub max_len: usize,
    /// Overlap seeded into the next chunk, in bytes. Must be < max_len.
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_len: 1200, overlap: 200 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    pub vector_weight: f32,
    pub lexical_weight: f32,
    pub diversity_factor: f32,
    /// Candidate multiplier ahead of fusion and diversification.
    pub overfetch_factor: usize,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self { vector_weight: 0.7, lexical_weight: 0.3, diversity_factor: 0.3, overfetch_factor: 2 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommendSettings {
    /// Over-fetch multiplier applied before the interaction-exclusion
    /// post-filter.
    pub overfetch_factor: usize,
    pub half_life_days: i64,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self { overfetch_factor: 3, half_life_days: 30 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexerSettings {
    /// Documents per sub-batch; larger operation lists are split
    /// transparently.
    pub max_batch_docs: usize,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self { max_batch_docs: 64 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after
/// expansion. If `p` is absolute, it's returned as-is.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
