//! TOML configuration.
//!
//! Every section is optional; a missing file means all defaults. See
//! `config/shortlist.example.toml` for a full example.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use shortlist_core::models::Taxonomy;

/// File name looked up inside the collection directory when `--config` is absent.
pub const COLLECTION_CONFIG_FILE: &str = "shortlist.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub taxonomies: Vec<CustomTaxonomyConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            url: None,
        }
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LabelConfig {
    #[serde(default = "default_label_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    /// Characters of passage text included in the prompt.
    #[serde(default = "default_prompt_chars")]
    pub prompt_chars: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            provider: default_label_provider(),
            model: None,
            url: None,
            max_chars: default_max_chars(),
            max_new_tokens: default_max_new_tokens(),
            prompt_chars: default_prompt_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_label_provider() -> String {
    "disabled".to_string()
}
fn default_max_chars() -> usize {
    shortlist_core::label::DEFAULT_LABEL_CHARS
}
fn default_max_new_tokens() -> u32 {
    20
}
fn default_prompt_chars() -> usize {
    512
}

impl LabelConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Directory, relative to the collection, holding the source documents.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
    /// Paragraphs with this many characters or fewer are dropped.
    #[serde(default = "default_min_passage_chars")]
    pub min_passage_chars: usize,
    #[serde(default = "default_input_file")]
    pub input_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            min_passage_chars: default_min_passage_chars(),
            input_file: default_input_file(),
            output_file: default_output_file(),
        }
    }
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("PDFs")
}
fn default_min_passage_chars() -> usize {
    50
}
fn default_input_file() -> String {
    "challenge1b_input.json".to_string()
}
fn default_output_file() -> String {
    "challenge1b_output.json".to_string()
}

/// A user-defined taxonomy, consulted before the built-in table.
#[derive(Debug, Deserialize, Clone)]
pub struct CustomTaxonomyConfig {
    pub name: String,
    #[serde(default)]
    pub request_ids: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub categories: Vec<CategoryConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    pub key: String,
    pub description: String,
}

impl CustomTaxonomyConfig {
    pub fn to_taxonomy(&self) -> Taxonomy {
        let pairs: Vec<(&str, &str)> = self
            .categories
            .iter()
            .map(|c| (c.key.as_str(), c.description.as_str()))
            .collect();
        Taxonomy::from_pairs(&self.name, &pairs)
    }
}

/// Pick the config file for a collection: explicit path, then
/// `<collection>/shortlist.toml`, then none.
pub fn resolve_config_path(explicit: Option<&Path>, collection_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let candidate = collection_dir.join(COLLECTION_CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the resolved config file, or defaults when there is none.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}

fn validate(config: &Config) -> Result<()> {
    match config.embedding.provider.as_str() {
        "local" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be local, openai, or ollama.",
            other
        ),
    }
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }
    if config.embedding.provider == "openai" && config.embedding.model.is_none() {
        bail!("embedding.model must be specified when provider is 'openai'");
    }

    match config.labels.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown label provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }
    if config.labels.is_enabled() && config.labels.model.is_none() {
        bail!(
            "labels.model must be specified when provider is '{}'",
            config.labels.provider
        );
    }
    if config.labels.max_chars == 0 {
        bail!("labels.max_chars must be > 0");
    }

    if config.extraction.min_passage_chars == 0 {
        bail!("extraction.min_passage_chars must be > 0");
    }

    let mut names = HashSet::new();
    for t in &config.taxonomies {
        if t.name.trim().is_empty() {
            bail!("taxonomies: every taxonomy needs a name");
        }
        if !names.insert(t.name.as_str()) {
            bail!("taxonomies: duplicate taxonomy name '{}'", t.name);
        }
        if t.categories.is_empty() {
            bail!("taxonomies.{}: at least one category is required", t.name);
        }
        if t.keywords.iter().any(|k| k.trim().is_empty()) {
            bail!("taxonomies.{}: empty keyword", t.name);
        }
        if t.request_ids.iter().any(|id| id.trim().is_empty()) {
            bail!("taxonomies.{}: empty request id", t.name);
        }
        if t.request_ids.is_empty() && t.keywords.is_empty() {
            bail!(
                "taxonomies.{}: set request_ids or keywords, otherwise it can never be selected",
                t.name
            );
        }
        if let Some(key) = t.to_taxonomy().duplicate_key() {
            bail!("taxonomies.{}: duplicate category key '{}'", t.name, key);
        }
    }

    Ok(())
}
