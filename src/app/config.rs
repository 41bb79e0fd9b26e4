use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use plugload::Depth;

use crate::app::cli::Cli;

#[derive(Deserialize, Debug)]
struct PresetsFile {
    #[serde(flatten)]
    presets: HashMap<String, PresetConfig>,
}

#[derive(Deserialize, Debug, Clone, Default)]
struct PresetConfig {
    ext: Option<String>,
    depth: Option<i64>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

/// Final options after merging a preset with CLI args. CLI wins field by
/// field; pattern lists are concatenated.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub root: PathBuf,
    pub ext: String,
    pub depth: Depth,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub tree: bool,
}

fn load_presets_file() -> Result<HashMap<String, PresetConfig>> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let config_path = home.join(".config").join("plugload").join("presets.toml");

    if !config_path.exists() {
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(&config_path)
        .context(format!("Failed to read config at {config_path:?}"))?;

    let parsed: PresetsFile = toml::from_str(&content).context("Failed to parse presets.toml")?;

    Ok(parsed.presets)
}

fn merge_vecs(preset_vec: Option<Vec<String>>, cli_vec: Option<Vec<String>>) -> Vec<String> {
    let mut combined = preset_vec.unwrap_or_default();
    if let Some(mut cli_items) = cli_vec {
        combined.append(&mut cli_items);
    }
    // Deduplicate while keeping order
    let mut seen = std::collections::HashSet::new();
    combined.retain(|item| seen.insert(item.clone()));
    combined
}

pub fn resolve_config(cli: Cli) -> Result<RuntimeConfig> {
    let presets = load_presets_file()?;

    let preset = cli
        .preset
        .as_deref()
        .and_then(|name| presets.get(name))
        .cloned()
        .unwrap_or_default();

    let depth_sentinel = cli.depth.or(preset.depth);
    let config = RuntimeConfig {
        root: PathBuf::from(cli.path),
        ext: cli
            .ext
            .or(preset.ext)
            .unwrap_or_else(|| std::env::consts::DLL_SUFFIX.to_string()),
        depth: depth_sentinel.map(Depth::from_sentinel).unwrap_or_default(),
        include: merge_vecs(preset.include, cli.include),
        exclude: merge_vecs(preset.exclude, cli.exclude),
        tree: cli.tree,
    };

    Ok(config)
}
