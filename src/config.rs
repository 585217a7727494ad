use crate::error::Result;
use crate::layout::TemplateLayout;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Organisation name used in file names and the document header.
    #[serde(default = "default_organization")]
    pub organization: String,
    /// Production-process column of the summary sheet. Defaults to
    /// "<organization> General process".
    #[serde(default)]
    pub process_label: Option<String>,
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// Cell coordinate table; the built-in one when unset.
    #[serde(default)]
    pub layout_path: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_organization() -> String {
    "ISOTEC".to_string()
}

fn default_template_path() -> PathBuf {
    PathBuf::from("templates/cbam_communication.xlsx")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            process_label: None,
            template_path: default_template_path(),
            export_dir: default_export_dir(),
            layout_path: None,
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn process_label(&self) -> String {
        self.process_label
            .clone()
            .unwrap_or_else(|| format!("{} General process", self.organization))
    }

    pub fn template_layout(&self) -> Result<TemplateLayout> {
        match &self.layout_path {
            Some(path) => TemplateLayout::load(path),
            None => TemplateLayout::builtin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.organization, "ISOTEC");
        assert_eq!(cfg.process_label(), "ISOTEC General process");
        assert_eq!(cfg.export_dir, PathBuf::from("exports"));
        assert_eq!(cfg.log_filter, "info");
        assert!(cfg.layout_path.is_none());
    }

    #[test]
    fn test_explicit_process_label_wins() {
        let cfg: Config = toml::from_str(
            r#"
organization = "Acme"
process_label = "Hot rolling"
log_filter = "cbam_report=debug"
"#,
        )
        .unwrap();
        assert_eq!(cfg.process_label(), "Hot rolling");
        assert_eq!(cfg.log_filter, "cbam_report=debug");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.organization, "ISOTEC");
    }

    #[test]
    fn test_layout_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        let builtin = TemplateLayout::builtin().unwrap();
        fs::write(&path, builtin.to_toml().unwrap()).unwrap();

        let cfg = Config {
            layout_path: Some(path),
            ..Default::default()
        };
        assert_eq!(cfg.template_layout().unwrap(), builtin);
    }
}
