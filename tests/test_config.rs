//! Tests for training configuration parsing
//!
//! This file tests the config module including:
//! - Loading valid JSON config files
//! - Defaults for missing optional fields
//! - Handling invalid JSON and missing files
//! - Range validation

use neural_graph::config::{load_config, TrainingConfig, DEFAULT_LEARNING_RATE};
use neural_graph::utils::SimpleRng;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp config");
    file
}

// ============================================================================
// Valid Config Loading Tests
// ============================================================================

mod valid_config_tests {
    use super::*;

    #[test]
    fn test_load_xor_training_config() {
        let config = load_config("config/xor_training.json").expect("Failed to load config");

        assert_eq!(config.backend.as_deref(), Some("software"));
        assert_eq!(config.parallel, Some(true));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.epochs, Some(5000));
        assert!((config.learning_rate() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let temp_file = write_temp_config("{}");
        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config, TrainingConfig::default());
        assert!(!config.parallel());
        assert_eq!(config.learning_rate(), DEFAULT_LEARNING_RATE);
        assert_eq!(config.backend().unwrap().name(), "software");
    }

    #[test]
    fn test_partial_config() {
        let temp_file = write_temp_config(r#"{ "epochs": 10, "target_error": 0.0 }"#);
        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config.epochs(), 10);
        assert_eq!(config.target_error(), 0.0);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = TrainingConfig {
            seed: Some(7),
            ..TrainingConfig::default()
        };
        let mut first = config.rng();
        let mut second = config.rng();
        for _ in 0..10 {
            assert_eq!(first.next_u64(), second.next_u64());
        }
    }

    #[test]
    fn test_unseeded_rng_differs_from_fixed_seeds() {
        let mut clock = TrainingConfig::default().rng();
        let mut fixed = SimpleRng::new(0);
        assert_ne!(clock.next_u64(), fixed.next_u64());
    }
}

// ============================================================================
// Invalid Config Tests
// ============================================================================

mod invalid_config_tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        assert!(load_config("config/nonexistent.json").is_err());
    }

    #[test]
    fn test_invalid_json() {
        let temp_file = write_temp_config("{ \"epochs\": ");
        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_wrong_field_type() {
        let temp_file = write_temp_config(r#"{ "parallel": "yes" }"#);
        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_non_positive_learning_rate() {
        for value in ["0.0", "-0.5"] {
            let temp_file = write_temp_config(&format!(r#"{{ "learning_rate": {value} }}"#));
            let err = load_config(temp_file.path()).unwrap_err();
            assert!(err.is_configuration());
        }
    }

    #[test]
    fn test_zero_epochs() {
        let temp_file = write_temp_config(r#"{ "epochs": 0 }"#);
        assert!(load_config(temp_file.path()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_negative_target_error() {
        let temp_file = write_temp_config(r#"{ "target_error": -1.0 }"#);
        assert!(load_config(temp_file.path()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_unknown_backend() {
        let temp_file = write_temp_config(r#"{ "backend": "gpu" }"#);
        assert!(load_config(temp_file.path()).unwrap_err().is_configuration());
    }
}
