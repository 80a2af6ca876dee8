/*!
# Analyzer Configuration

Project layout and run options. Loaded from TOML or YAML; every field has
a default, so an empty file (or no file) is a valid configuration.

```toml
excluded_dirs = [".git", "bin", "Libs", "Reports"]
threads = 4
top_n = 5

[layout]
keywords_dir = "Keywords"
object_repository_dir = "Object Repository"
```
*/

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name picked up from the project root when no config is given
pub const DEFAULT_CONFIG_FILE: &str = "katalon-analyzer.toml";

/// Directory names of the project layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLayout {
    pub test_cases_dir: String,
    pub test_suites_dir: String,
    pub keywords_dir: String,
    pub object_repository_dir: String,
    pub profiles_dir: String,
    pub scripts_dir: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            test_cases_dir: "Test Cases".to_string(),
            test_suites_dir: "Test Suites".to_string(),
            keywords_dir: "Keywords".to_string(),
            object_repository_dir: "Object Repository".to_string(),
            profiles_dir: "Profiles".to_string(),
            scripts_dir: "Scripts".to_string(),
        }
    }
}

impl ProjectLayout {
    fn dirs(&self) -> [(&'static str, &str); 6] {
        [
            ("test_cases_dir", &self.test_cases_dir),
            ("test_suites_dir", &self.test_suites_dir),
            ("keywords_dir", &self.keywords_dir),
            ("object_repository_dir", &self.object_repository_dir),
            ("profiles_dir", &self.profiles_dir),
            ("scripts_dir", &self.scripts_dir),
        ]
    }
}

/// Options of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub layout: ProjectLayout,

    /// Directory names never descended into
    pub excluded_dirs: Vec<String>,

    pub follow_links: bool,

    /// Worker threads of the parse / resolve pool
    pub threads: usize,

    /// Length of most-used rankings
    pub top_n: usize,

    /// Length of the project-wide import frequency list
    pub top_imports: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            layout: ProjectLayout::default(),
            excluded_dirs: [".git", "bin", "Libs", "Reports", ".settings", "Drivers"]
                .iter()
                .map(|dir| dir.to_string())
                .collect(),
            follow_links: false,
            threads: num_cpus::get(),
            top_n: 10,
            top_imports: 20,
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration, the format is chosen by extension
    /// (`.yaml`/`.yml` is YAML, anything else TOML)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let is_yaml = matches!(
            path.as_ref().extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Self::load_from_yaml(path)
        } else {
            Self::load_from_toml(path)
        }
    }

    /// Load configuration from TOML file
    pub fn load_from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read analyzer config from {}", path.as_ref().display())
        })?;

        let config: Self = toml::from_str(&content).with_context(|| {
            format!("Failed to parse TOML config from {}", path.as_ref().display())
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from YAML file
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read analyzer config from {}", path.as_ref().display())
        })?;

        let config: Self = serde_yaml::from_str(&content).with_context(|| {
            format!("Failed to parse YAML config from {}", path.as_ref().display())
        })?;

        config.validate()?;
        Ok(config)
    }

    /// `katalon-analyzer.toml` from the project root, defaults when absent
    pub fn discover<P: AsRef<Path>>(project_root: P) -> Result<Self> {
        let candidate = project_root.as_ref().join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("Using config {}", candidate.display());
            Self::load_from_toml(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize analyzer config to TOML")?;

        std::fs::write(&path, content).with_context(|| {
            format!("Failed to write analyzer config to {}", path.as_ref().display())
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            bail!("threads must be greater than 0");
        }
        if self.top_n == 0 {
            bail!("top_n must be greater than 0");
        }
        if self.top_imports == 0 {
            bail!("top_imports must be greater than 0");
        }

        for (field, dir) in self.layout.dirs() {
            let trimmed = dir.trim_matches('/');
            if trimmed.is_empty() {
                bail!("layout.{} must not be empty", field);
            }
            if trimmed.contains('\\') || trimmed.split('/').any(|part| part == "..") {
                bail!("layout.{} must be a plain relative directory: {:?}", field, dir);
            }
        }

        if self.excluded_dirs.iter().any(|dir| dir.trim().is_empty()) {
            bail!("excluded_dirs must not contain empty names");
        }

        Ok(())
    }

    /// `true` if a directory with this name is never walked
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        self.excluded_dirs.iter().any(|excluded| excluded == dir_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.layout.test_cases_dir, "Test Cases");
        assert_eq!(config.top_n, 10);
        assert_eq!(config.top_imports, 20);
        assert!(config.threads > 0);
        assert!(config.is_excluded(".git"));
        assert!(!config.is_excluded("Keywords"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analyzer.toml");
        fs::write(&path, "top_n = 3\n\n[layout]\nkeywords_dir = \"Include/keywords\"\n").unwrap();

        let config = AnalyzerConfig::from_file(&path).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.layout.keywords_dir, "Include/keywords");
        assert_eq!(config.layout.profiles_dir, "Profiles");
        assert_eq!(config.top_imports, 20);
    }

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analyzer.yml");
        fs::write(&path, "threads: 2\nexcluded_dirs: [\".git\"]\n").unwrap();

        let config = AnalyzerConfig::from_file(&path).unwrap();
        assert_eq!(config.threads, 2);
        assert_eq!(config.excluded_dirs, vec![".git".to_string()]);
    }

    #[test]
    fn test_validation_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "top_n = 0\n").unwrap();
        let err = AnalyzerConfig::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("top_n"));

        let mut config = AnalyzerConfig::default();
        config.layout.scripts_dir = "../Scripts".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discover_and_save() {
        let dir = TempDir::new().unwrap();
        assert_eq!(AnalyzerConfig::discover(dir.path()).unwrap().top_n, 10);

        let mut config = AnalyzerConfig::default();
        config.top_imports = 7;
        config.save_to_file(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(AnalyzerConfig::discover(dir.path()).unwrap().top_imports, 7);
    }
}
