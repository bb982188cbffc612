//! Workbench settings: defaults, `workbench.toml`, then environment
//! variables, each layer overriding the previous one.

use std::{collections::HashMap, fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Settings {
    pub window_title: String,
    pub log_filter: String,
    pub catalog_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_title: "Terminology Workbench".into(),
            log_filter: "info".into(),
            catalog_path: None,
            data_dir: None,
        }
    }
}

pub fn load_settings(config_path: Option<&PathBuf>) -> Settings {
    let mut settings = Settings::default();

    let path = config_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from("workbench.toml"));
    if let Ok(raw) = fs::read_to_string(&path) {
        apply_file(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("WORKBENCH_WINDOW_TITLE") {
        settings.window_title = v;
    }
    if let Ok(v) = std::env::var("WORKBENCH_LOG") {
        settings.log_filter = v;
    }
    if let Ok(v) = std::env::var("WORKBENCH_CATALOG") {
        settings.catalog_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("WORKBENCH_DATA_DIR") {
        settings.data_dir = Some(PathBuf::from(v));
    }

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        tracing::warn!("ignoring malformed workbench.toml");
        return;
    };
    if let Some(v) = file_cfg.get("window_title") {
        settings.window_title = v.clone();
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
    if let Some(v) = file_cfg.get("catalog_path") {
        settings.catalog_path = Some(PathBuf::from(v));
    }
    if let Some(v) = file_cfg.get("data_dir") {
        settings.data_dir = Some(PathBuf::from(v));
    }
}
