// FILE: src/cli/config.rs

use crate::codegen::SynthesisOptions;
use crate::error::{PipelineError, Result};
use crate::mapping::MappingConfig;
use crate::validator::ValidatorOptions;
use serde::{Deserialize, Serialize};
use std::fs;

/// Optional settings applied beneath command-line flags
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub mapping: Option<MappingConfig>,
    pub synthesis: Option<SynthesisOptions>,
    pub validator: Option<ValidatorOptions>,
    pub catalog: Option<String>,
    pub component_name: Option<String>,
    pub validate_output: Option<bool>,
    pub output_directory: Option<String>,
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    log::info!("Loading configuration from {}", config_path);
    let config_content = fs::read_to_string(config_path).map_err(|e| PipelineError::FileNotFound {
        path: format!("Config file {}: {}", config_path, e),
    })?;

    if config_path.ends_with(".json") {
        serde_json::from_str(&config_content).map_err(|e| PipelineError::InvalidFormat {
            message: format!("Invalid JSON config: {}", e),
        })
    } else if config_path.ends_with(".toml") {
        toml::from_str(&config_content).map_err(|e| PipelineError::InvalidFormat {
            message: format!("Invalid TOML config: {}", e),
        })
    } else {
        Err(PipelineError::InvalidFormat {
            message: "Config file must be .json or .toml format".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_toml_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("antforge.toml");
        fs::write(
            &path,
            "catalog = \"catalog.json\"\n\n[mapping]\nname_weight = 40\n\n[validator]\ncheck_performance = false\n",
        )
        .unwrap();

        let config = load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.catalog.as_deref(), Some("catalog.json"));

        let mapping = config.mapping.unwrap();
        assert_eq!(mapping.name_weight, 40);
        assert_eq!(mapping.type_weight, 20);

        let validator = config.validator.unwrap();
        assert!(!validator.check_performance);
        assert!(validator.check_imports);
        assert!(config.synthesis.is_none());
    }

    #[test]
    fn test_load_json_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("antforge.json");
        fs::write(&path, r#"{ "synthesis": { "indent_width": 4 }, "validate_output": false }"#).unwrap();

        let config = load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.synthesis.unwrap().indent_width, 4);
        assert_eq!(config.validate_output, Some(false));
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("antforge.yaml");
        fs::write(&path, "mapping: {}").unwrap();

        assert!(matches!(
            load(path.to_str().unwrap()),
            Err(PipelineError::InvalidFormat { .. })
        ));
    }
}
