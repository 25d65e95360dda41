//! Turns the layered `xlfsync.toml` into the option structs the services take.
//! Command line flags win over file values.

use color_eyre::eyre::Result;
use std::path::PathBuf;
use xlfsync_config::XlfSyncConfig;
use xlfsync_core::{TargetState, TranslationMode};
use xlfsync_parsers_xml::{SearchReplace, SerializeOptions};
use xlfsync_services::{BatchOptions, CacheOptions, DocumentCache, RefreshOptions};

pub struct Settings {
    cfg: XlfSyncConfig,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let cfg = xlfsync_config::load_config()?;
        tracing::debug!(event = "config_loaded", mode = ?cfg.translation_mode);
        Ok(Self { cfg })
    }

    pub fn mode(&self, flag: Option<&str>) -> Result<TranslationMode> {
        match flag.or(self.cfg.translation_mode.as_deref()) {
            Some(m) => Ok(m.parse()?),
            None => Ok(TranslationMode::default()),
        }
    }

    pub fn refresh_options(
        &self,
        mode: Option<&str>,
        sort_only: bool,
        no_match: bool,
    ) -> Result<RefreshOptions> {
        let defaults = RefreshOptions::default();
        let r = self.cfg.refresh.clone().unwrap_or_default();
        let exact_match_state = match r.exact_match_state.as_deref() {
            Some(s) => Some(s.parse::<TargetState>()?),
            None => None,
        };
        Ok(RefreshOptions {
            mode: self.mode(mode)?,
            sort_only,
            match_translation: !no_match
                && r.match_translation.unwrap_or(defaults.match_translation),
            match_from_own_file: r
                .match_from_own_file
                .unwrap_or(defaults.match_from_own_file),
            exact_match_state,
            clear_hints_on_translated: r
                .clear_hints_on_translated
                .unwrap_or(defaults.clear_hints_on_translated),
        })
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        let defaults = SerializeOptions::default();
        let x = self.cfg.xliff.clone().unwrap_or_default();
        SerializeOptions {
            replace_self_closing_tags: x
                .replace_self_closing_tags
                .unwrap_or(defaults.replace_self_closing_tags),
            format_xml: x.format_xml.unwrap_or(defaults.format_xml),
            preserve_line_ending: x
                .preserve_line_ending
                .unwrap_or(defaults.preserve_line_ending),
            bom: x.bom.unwrap_or(defaults.bom),
            search_replace: x
                .search_replace
                .unwrap_or_default()
                .into_iter()
                .map(|sr| SearchReplace {
                    search: sr.search,
                    replace: sr.replace,
                })
                .collect(),
        }
    }

    pub fn batch_options(
        &self,
        refresh: RefreshOptions,
        extra_suggestions: Vec<PathBuf>,
        all_or_nothing: bool,
    ) -> BatchOptions {
        let mut suggestion_paths: Vec<PathBuf> = self
            .cfg
            .refresh
            .as_ref()
            .and_then(|r| r.suggestion_paths.clone())
            .unwrap_or_default()
            .into_iter()
            .map(PathBuf::from)
            .collect();
        suggestion_paths.extend(extra_suggestions);
        BatchOptions {
            refresh,
            serialize: self.serialize_options(),
            all_or_nothing,
            suggestion_paths,
        }
    }

    pub fn cache(&self) -> DocumentCache {
        let defaults = CacheOptions::default();
        let c = self.cfg.cache.clone().unwrap_or_default();
        DocumentCache::new(CacheOptions {
            enabled: c.enabled.unwrap_or(defaults.enabled),
            capacity: c.capacity.unwrap_or(defaults.capacity),
        })
    }

    /// `--limit` if given, else `[query] default_limit`, else unbounded.
    pub fn limit(&self, flag: Option<usize>) -> usize {
        flag.or_else(|| self.cfg.query.as_ref().and_then(|q| q.default_limit))
            .unwrap_or(0)
    }

    pub fn schema_dir(&self) -> Option<String> {
        self.cfg.schema.as_ref().and_then(|s| s.out_dir.clone())
    }
}
