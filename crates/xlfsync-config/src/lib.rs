use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = "xlfsync.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct XlfSyncConfig {
    /// "external" (state attributes) or "tokens" (bracket markers).
    pub translation_mode: Option<String>,
    pub refresh: Option<RefreshCfg>,
    pub xliff: Option<XliffCfg>,
    pub cache: Option<CacheCfg>,
    pub query: Option<QueryCfg>,
    pub schema: Option<SchemaCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshCfg {
    pub match_translation: Option<bool>,
    pub match_from_own_file: Option<bool>,
    pub exact_match_state: Option<String>,
    pub suggestion_paths: Option<Vec<String>>,
    pub clear_hints_on_translated: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct XliffCfg {
    pub replace_self_closing_tags: Option<bool>,
    pub format_xml: Option<bool>,
    pub preserve_line_ending: Option<bool>,
    pub bom: Option<bool>,
    pub search_replace: Option<Vec<SearchReplaceCfg>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SearchReplaceCfg {
    pub search: String,
    pub replace: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheCfg {
    pub enabled: Option<bool>,
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryCfg {
    pub default_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaCfg {
    pub out_dir: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Search order: CWD/xlfsync.toml, then the user config dir. Earlier files win.
pub fn load_config() -> Result<XlfSyncConfig, ConfigError> {
    let mut merged = XlfSyncConfig::default();
    if let Ok(p) = std::env::current_dir() {
        if let Some(cfg) = read_config(&p.join(CONFIG_FILE))? {
            merged = merge(merged, cfg);
        }
    }
    if let Some(base) = dirs::config_dir() {
        if let Some(cfg) = read_config(&base.join("xlfsync").join(CONFIG_FILE))? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

/// Missing or unreadable files are skipped; bad TOML is an error.
pub fn read_config(path: &Path) -> Result<Option<XlfSyncConfig>, ConfigError> {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Ok(None);
    };
    toml::from_str::<XlfSyncConfig>(&s)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

pub fn merge(mut a: XlfSyncConfig, b: XlfSyncConfig) -> XlfSyncConfig {
    if a.translation_mode.is_none() {
        a.translation_mode = b.translation_mode;
    }
    a.refresh = merge_opt(a.refresh, b.refresh, merge_refresh);
    a.xliff = merge_opt(a.xliff, b.xliff, merge_xliff);
    a.cache = merge_opt(a.cache, b.cache, merge_cache);
    a.query = merge_opt(a.query, b.query, merge_query);
    a.schema = merge_opt(a.schema, b.schema, merge_schema);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_refresh(mut a: RefreshCfg, b: RefreshCfg) -> RefreshCfg {
    if a.match_translation.is_none() {
        a.match_translation = b.match_translation;
    }
    if a.match_from_own_file.is_none() {
        a.match_from_own_file = b.match_from_own_file;
    }
    if a.exact_match_state.is_none() {
        a.exact_match_state = b.exact_match_state;
    }
    if a.suggestion_paths.is_none() {
        a.suggestion_paths = b.suggestion_paths;
    }
    if a.clear_hints_on_translated.is_none() {
        a.clear_hints_on_translated = b.clear_hints_on_translated;
    }
    a
}
fn merge_xliff(mut a: XliffCfg, b: XliffCfg) -> XliffCfg {
    if a.replace_self_closing_tags.is_none() {
        a.replace_self_closing_tags = b.replace_self_closing_tags;
    }
    if a.format_xml.is_none() {
        a.format_xml = b.format_xml;
    }
    if a.preserve_line_ending.is_none() {
        a.preserve_line_ending = b.preserve_line_ending;
    }
    if a.bom.is_none() {
        a.bom = b.bom;
    }
    if a.search_replace.is_none() {
        a.search_replace = b.search_replace;
    }
    a
}
fn merge_cache(mut a: CacheCfg, b: CacheCfg) -> CacheCfg {
    if a.enabled.is_none() {
        a.enabled = b.enabled;
    }
    if a.capacity.is_none() {
        a.capacity = b.capacity;
    }
    a
}
fn merge_query(mut a: QueryCfg, b: QueryCfg) -> QueryCfg {
    if a.default_limit.is_none() {
        a.default_limit = b.default_limit;
    }
    a
}
fn merge_schema(mut a: SchemaCfg, b: SchemaCfg) -> SchemaCfg {
    if a.out_dir.is_none() {
        a.out_dir = b.out_dir;
    }
    a
}
