//! Process-wide configuration: service endpoints, the retrieval row budget
//! and the link-probability threshold. Values come from an optional TOML
//! file overridden by environment variables; everything is read-only after
//! startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct LinkerSettings {
    pub jsru_url: String,
    pub tpta_url: String,
    pub solr_url: String,
    pub w2v_url: String,
    /// Retrieval row budget per cluster.
    pub solr_rows: usize,
    /// Minimum probability for emitting a link.
    pub min_prob: f64,
    /// Path to the model weight file.
    pub model_path: Option<PathBuf>,
}

impl Default for LinkerSettings {
    fn default() -> Self {
        Self {
            jsru_url: String::new(),
            tpta_url: String::new(),
            solr_url: String::new(),
            w2v_url: String::new(),
            solr_rows: 25,
            min_prob: 0.5,
            model_path: None,
        }
    }
}

impl LinkerSettings {
    /// Load settings: defaults, then config file, then environment.
    pub fn load() -> Self {
        let mut settings = Self::default();
        settings.apply_file(&load_config_file());
        settings.apply_env();
        settings
    }

    fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(endpoints) = &file.endpoints {
            if let Some(v) = &endpoints.jsru_url {
                self.jsru_url = v.clone();
            }
            if let Some(v) = &endpoints.tpta_url {
                self.tpta_url = v.clone();
            }
            if let Some(v) = &endpoints.solr_url {
                self.solr_url = v.clone();
            }
            if let Some(v) = &endpoints.w2v_url {
                self.w2v_url = v.clone();
            }
        }
        if let Some(linking) = &file.linking {
            if let Some(v) = linking.solr_rows {
                self.solr_rows = v;
            }
            if let Some(v) = linking.min_prob {
                self.min_prob = v;
            }
            if let Some(v) = &linking.model_path {
                self.model_path = Some(PathBuf::from(v));
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("JSRU_URL") {
            self.jsru_url = v;
        }
        if let Ok(v) = std::env::var("TPTA_URL") {
            self.tpta_url = v;
        }
        if let Ok(v) = std::env::var("SOLR_URL") {
            self.solr_url = v;
        }
        if let Ok(v) = std::env::var("W2V_URL") {
            self.w2v_url = v;
        }
        if let Some(v) = std::env::var("SOLR_ROWS").ok().and_then(|v| v.parse().ok()) {
            self.solr_rows = v;
        }
        if let Some(v) = std::env::var("MIN_PROB").ok().and_then(|v| v.parse().ok()) {
            self.min_prob = v;
        }
        if let Ok(v) = std::env::var("MODEL_PATH") {
            self.model_path = Some(PathBuf::from(v));
        }
    }
}

/// On-disk TOML configuration. All fields optional so partial configs work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub endpoints: Option<EndpointsConfig>,
    pub linking: Option<LinkingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub jsru_url: Option<String>,
    pub tpta_url: Option<String>,
    pub solr_url: Option<String>,
    pub w2v_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkingConfig {
    pub solr_rows: Option<usize>,
    pub min_prob: Option<f64>,
    pub model_path: Option<String>,
}

/// Platform config path: `<config_dir>/krantlink/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("krantlink").join("config.toml"))
}

/// Load config by cascading CWD `.krantlink.toml` over the platform config.
fn load_config_file() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".krantlink.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let b_end = base.endpoints.unwrap_or_default();
    let o_end = overlay.endpoints.unwrap_or_default();
    let b_link = base.linking.unwrap_or_default();
    let o_link = overlay.linking.unwrap_or_default();

    ConfigFile {
        endpoints: Some(EndpointsConfig {
            jsru_url: o_end.jsru_url.or(b_end.jsru_url),
            tpta_url: o_end.tpta_url.or(b_end.tpta_url),
            solr_url: o_end.solr_url.or(b_end.solr_url),
            w2v_url: o_end.w2v_url.or(b_end.w2v_url),
        }),
        linking: Some(LinkingConfig {
            solr_rows: o_link.solr_rows.or(b_link.solr_rows),
            min_prob: o_link.min_prob.or(b_link.min_prob),
            model_path: o_link.model_path.or(b_link.model_path),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = LinkerSettings::default();
        assert_eq!(settings.solr_rows, 25);
        assert_eq!(settings.min_prob, 0.5);
    }

    #[test]
    fn file_values_apply() {
        let file: ConfigFile = toml::from_str(
            r#"
            [endpoints]
            solr_url = "http://kb.example/solr"

            [linking]
            solr_rows = 10
            min_prob = 0.42
            "#,
        )
        .unwrap();
        let mut settings = LinkerSettings::default();
        settings.apply_file(&file);
        assert_eq!(settings.solr_url, "http://kb.example/solr");
        assert_eq!(settings.solr_rows, 10);
        assert_eq!(settings.min_prob, 0.42);
        assert!(settings.jsru_url.is_empty());
    }

    #[test]
    fn merge_overlay_wins() {
        let base: ConfigFile = toml::from_str("[linking]\nsolr_rows = 5\nmin_prob = 0.3\n").unwrap();
        let overlay: ConfigFile = toml::from_str("[linking]\nsolr_rows = 9\n").unwrap();
        let merged = merge(base, overlay);
        let linking = merged.linking.unwrap();
        assert_eq!(linking.solr_rows, Some(9));
        assert_eq!(linking.min_prob, Some(0.3));
    }
}
