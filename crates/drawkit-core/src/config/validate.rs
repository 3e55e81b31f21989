//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_alloc_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_alloc_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.canvas.max_width == 0 || self.canvas.max_height == 0 {
            return Err(ConfigError::ValidationError(
                "canvas.max_width and canvas.max_height must be > 0".into(),
            ));
        }
        if self.canvas.pixel_budget_multiplier == 0 {
            return Err(ConfigError::ValidationError(
                "canvas.pixel_budget_multiplier must be > 0".into(),
            ));
        }
        if self.output.quality > 100 {
            return Err(ConfigError::ValidationError(
                "output.quality must be between 0 and 100".into(),
            ));
        }
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_bounding_box() {
        let mut config = Config::default();
        config.canvas.max_height = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("canvas.max_height"));
    }

    #[test]
    fn test_validate_rejects_zero_multiplier() {
        let mut config = Config::default();
        config.canvas.pixel_budget_multiplier = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pixel_budget_multiplier"));
    }

    #[test]
    fn test_validate_rejects_quality_above_100() {
        let mut config = Config::default();
        config.output.quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.quality"));
    }

    #[test]
    fn test_validate_rejects_zero_alloc_ceiling() {
        let mut config = Config::default();
        config.limits.max_alloc_mb = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_alloc_mb"));
    }

    #[test]
    fn test_validate_rejects_zero_parallel_workers() {
        let mut config = Config::default();
        config.processing.parallel_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("parallel_workers"));
    }
}
