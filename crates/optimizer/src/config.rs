use serde::Serialize;

/// Routing thresholds for the placement optimizer
#[derive(Debug, Clone, Serialize)]
pub struct OptimizerConfig {
    /// Distribution scores below this route to single-point placement
    pub single_point_threshold: f64,

    /// Distribution scores above this route to a root placement
    pub distributed_threshold: f64,

    /// Weight of depth variance in the distribution score
    pub diversity_factor: f64,

    /// Efficiency that always qualifies a candidate for selective placement
    pub high_relevance_threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            single_point_threshold: 0.3,
            distributed_threshold: 0.7,
            diversity_factor: 0.5,
            high_relevance_threshold: 0.8,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.single_point_threshold > self.distributed_threshold {
            return Err(format!(
                "single_point_threshold ({}) cannot exceed distributed_threshold ({})",
                self.single_point_threshold, self.distributed_threshold
            ));
        }

        if self.diversity_factor < 0.0 {
            return Err("diversity_factor must be >= 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.high_relevance_threshold) {
            return Err(format!(
                "high_relevance_threshold ({}) must be within 0..=1",
                self.high_relevance_threshold
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(OptimizerConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let config = OptimizerConfig {
            single_point_threshold: 0.9,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("cannot exceed"));
    }
}
