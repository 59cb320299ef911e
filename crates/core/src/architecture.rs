//! Bank technical-configuration vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Technology a bank's reconciliation pipeline runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconTechnology {
    Redis,
    Pandas,
    Procedure,
}

impl ReconTechnology {
    /// The stored string form of this technology.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconTechnology::Redis => "redis",
            ReconTechnology::Pandas => "pandas",
            ReconTechnology::Procedure => "procedure",
        }
    }

    /// Parse a stored technology string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "redis" => Ok(ReconTechnology::Redis),
            "pandas" => Ok(ReconTechnology::Pandas),
            "procedure" => Ok(ReconTechnology::Procedure),
            other => Err(CoreError::Validation(format!(
                "Unknown recon technology '{other}' (expected redis, pandas, or procedure)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recon_technology_round_trips() {
        for tech in [
            ReconTechnology::Redis,
            ReconTechnology::Pandas,
            ReconTechnology::Procedure,
        ] {
            assert_eq!(ReconTechnology::parse(tech.as_str()).unwrap(), tech);
        }
    }

    #[test]
    fn unknown_recon_technology_rejected() {
        assert!(ReconTechnology::parse("spark").is_err());
        assert!(ReconTechnology::parse("REDIS").is_err()); // stored form is lowercase
    }
}
