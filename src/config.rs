use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::distance::CLOSE_RADIUS_KM;

const CATEGORIES: [&str; 15] = [
    "prodottitipici",
    "attrazionenaturale",
    "agriturismo",
    "monumento",
    "museo",
    "ufficioinformazionituristiche",
    "rifugio",
    "sitoarcheologico",
    "Prodottoenogatronomico",
    "Prodottodiartigianatolocale",
    "Caseificio",
    "infoturistiche/ufficioturistico",
    "teatro/opera/cinema",
    "Rifugio/Malga",
    "Attrazionenaturale",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Key of the translation picked out of every localized field.
    pub language: String,
    /// POIs in any other category are dropped before normalization.
    pub categories: Vec<String>,
    pub radius_km: f64,
    /// Skip and log records with bad coordinates or missing keys instead of
    /// failing the stage.
    pub skip_invalid: bool,
    pub threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "IT".to_string(),
            categories: CATEGORIES.iter().map(|x| x.to_string()).collect(),
            radius_km: CLOSE_RADIUS_KM,
            skip_invalid: false,
            threads: None,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = match path {
            Some(path) => serde_yaml::from_str(
                &fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
            )
            .with_context(|| format!("invalid config {}", path.display()))?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radius_km.is_finite() || self.radius_km < 0.0 {
            bail!("radius_km must be a non-negative number, got {}", self.radius_km);
        }
        if self.language.is_empty() {
            bail!("language can't be empty");
        }
        if self.threads == Some(0) {
            bail!("threads must be at least 1");
        }
        Ok(())
    }
}
