//! Configuration file loading and command-line overrides.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub use trackscan_core::config::*;

/// Default config locations, searched in order.
pub const DEFAULT_PATHS: [&str; 3] = [
    "./trackscan.toml",
    "~/.config/trackscan/config.toml",
    "/etc/trackscan/config.toml",
];

/// Load configuration from a TOML file. Does not validate.
pub fn load_config(path: &Path) -> Result<ScanConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = ScanConfig::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<ScanConfig> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    match find_default_config() {
        Some(path) => {
            tracing::debug!("Using config file {:?}", path);
            load_config(&path)
        }
        None => Ok(ScanConfig::default()),
    }
}

/// First existing file among [`DEFAULT_PATHS`].
pub fn find_default_config() -> Option<PathBuf> {
    DEFAULT_PATHS.iter().find_map(|path_str| {
        let path = PathBuf::from(shellexpand::tilde(path_str).as_ref());
        path.exists().then_some(path)
    })
}

/// Validate configuration, failing on the first problem.
pub fn validate_config(config: &ScanConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    Ok(())
}

/// Values given on the command line, applied over the file config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub roots: Vec<PathBuf>,
    pub dry_run: bool,
    pub batch_size: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub no_csv: bool,
    pub lang_vid: Option<String>,
    pub lang_aud: Option<String>,
    pub lang_sub: Option<String>,
    pub target_codec: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Apply every set override. Language lists replace the top-level policy
    /// and every policy section.
    pub fn apply(&self, config: &mut ScanConfig) {
        if !self.roots.is_empty() {
            config.roots = self.roots.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if let Some(n) = self.batch_size {
            config.batch_size = n;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if self.no_csv {
            config.write_csv_file = false;
        }
        if let Some(secs) = self.timeout_secs {
            config.probe.timeout_secs = secs;
        }

        let policies = std::iter::once(&mut config.policy).chain(config.policy_sections.values_mut());
        for policy in policies {
            if let Some(list) = &self.lang_vid {
                policy.lang_vid = parse_lang_list(list);
            }
            if let Some(list) = &self.lang_aud {
                policy.lang_aud = parse_lang_list(list);
            }
            if let Some(list) = &self.lang_sub {
                policy.lang_sub = parse_lang_list(list);
            }
            if let Some(codec) = &self.target_codec {
                policy.target_codec = codec.clone();
            }
        }
    }
}

/// Split a comma-separated language list. An empty string yields an empty
/// list, which disables the check.
///
/// ```
/// use trackscan::config::parse_lang_list;
///
/// assert_eq!(parse_lang_list("eng, JPN"), vec!["eng", "jpn"]);
/// assert!(parse_lang_list("").is_empty());
/// ```
pub fn parse_lang_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|l| l.trim().to_ascii_lowercase())
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = 10\n[policy]\nlang_aud = [\"eng\", \"jpn\"]").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.policy.lang_aud, vec!["eng", "jpn"]);
    }

    #[test]
    fn parse_error_names_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = \"lots\"").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn missing_file_errors() {
        assert!(load_config(Path::new("/no/such/trackscan.toml")).is_err());
    }

    #[test]
    fn overrides_apply() {
        let mut config = ScanConfig::default();
        config
            .policy_sections
            .insert("anime".into(), LanguagePolicy::default());

        let overrides = ConfigOverrides {
            roots: vec![PathBuf::from("/media")],
            dry_run: true,
            batch_size: Some(25),
            no_csv: true,
            lang_sub: Some(String::new()),
            target_codec: Some("av1".into()),
            timeout_secs: Some(30),
            ..ConfigOverrides::default()
        };
        overrides.apply(&mut config);

        assert_eq!(config.roots, vec![PathBuf::from("/media")]);
        assert!(config.dry_run);
        assert_eq!(config.batch_size, 25);
        assert!(!config.write_csv_file);
        assert!(config.policy.lang_sub.is_empty());
        assert!(config.policy_sections["anime"].lang_sub.is_empty());
        assert_eq!(config.policy.lang_aud, vec!["eng"]);
        assert_eq!(config.policy.target_codec, "av1");
        assert_eq!(config.probe.timeout_secs, 30);
    }

    #[test]
    fn empty_overrides_change_nothing() {
        let mut config = ScanConfig::default();
        config.batch_size = 7;
        ConfigOverrides::default().apply(&mut config);
        assert_eq!(config.batch_size, 7);
        assert!(config.write_csv_file);
        assert!(!config.dry_run);
    }

    #[test]
    fn validate_wraps_core_error() {
        let mut config = ScanConfig::default();
        config.probe.timeout_secs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("timeout_secs"));
    }
}
