//! `From` implementations bridging `shot_config` types to `shot_core` types.

use crate::config::AnalysisCfg;

// ── AnalysisCfg ──────────────────────────────────────────────────────────────

impl From<&shot_config::Analysis> for AnalysisCfg {
    fn from(c: &shot_config::Analysis) -> Self {
        Self {
            scale_delay_ms: c.scale_delay_ms,
            sensor_delay_ms: c.sensor_delay_ms,
            auto_sensor_delay: c.auto_sensor_delay,
        }
    }
}

impl From<&shot_config::Config> for AnalysisCfg {
    fn from(c: &shot_config::Config) -> Self {
        Self::from(&c.analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_agree() {
        let from_file = AnalysisCfg::from(&shot_config::Config::default());
        assert_eq!(from_file, AnalysisCfg::default());
    }

    #[test]
    fn fields_carry_over() {
        let a = shot_config::Analysis {
            scale_delay_ms: 650.0,
            sensor_delay_ms: 120.0,
            auto_sensor_delay: false,
        };
        let cfg = AnalysisCfg::from(&a);
        assert_eq!(cfg.scale_delay_ms, 650.0);
        assert_eq!(cfg.sensor_delay_ms, 120.0);
        assert!(!cfg.auto_sensor_delay);
    }
}
