//! A6: loads and validates the JSON strategy config named by
//! `--strategy-config`. Grounded on the load-then-validate shape of
//! `config/mod.rs`'s `BotConfig::load`, adapted from YAML+env to the plain
//! JSON format SPEC_FULL.md §6 specifies for strategy files.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::errors::ConfigError;
use super::strategies::amm::AmmConfig;
use super::strategies::bands::Band;

#[derive(Debug, Deserialize)]
struct BandRaw {
    #[serde(rename = "minMargin")]
    min_margin: Decimal,
    #[serde(rename = "avgMargin")]
    avg_margin: Decimal,
    #[serde(rename = "maxMargin")]
    max_margin: Decimal,
    #[serde(rename = "minAmount")]
    min_amount: Decimal,
    #[serde(rename = "avgAmount")]
    avg_amount: Decimal,
    #[serde(rename = "maxAmount")]
    max_amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct BandsConfigRaw {
    bands: Vec<BandRaw>,
}

#[derive(Debug, Deserialize)]
struct AmmConfigRaw {
    p_min: Decimal,
    p_max: Decimal,
    spread: Decimal,
    delta: Decimal,
    depth: Decimal,
    max_collateral: Decimal,
}

/// Load `path` as a bands config: `{"bands": [{...}, ...]}`.
pub fn load_bands(path: &Path) -> Result<Vec<Band>, ConfigError> {
    let raw = read(path)?;
    let parsed: BandsConfigRaw = serde_json::from_str(&raw)?;

    parsed
        .bands
        .into_iter()
        .map(|b| {
            Band::new(
                b.min_margin,
                b.avg_margin,
                b.max_margin,
                b.min_amount,
                b.avg_amount,
                b.max_amount,
            )
        })
        .collect()
}

/// Load `path` as an AMM config: `{"p_min", "p_max", "spread", "delta", "depth", "max_collateral"}`.
pub fn load_amm(path: &Path) -> Result<AmmConfig, ConfigError> {
    let raw = read(path)?;
    let parsed: AmmConfigRaw = serde_json::from_str(&raw)?;

    if parsed.p_min >= parsed.p_max {
        return Err(ConfigError::InvalidAmmConfig(
            "p_min must be < p_max".into(),
        ));
    }
    if parsed.spread >= parsed.depth {
        return Err(ConfigError::InvalidAmmConfig(
            "spread must be < depth".into(),
        ));
    }
    if parsed.delta <= Decimal::ZERO {
        return Err(ConfigError::InvalidAmmConfig(
            "delta must be positive".into(),
        ));
    }
    if parsed.max_collateral <= Decimal::ZERO {
        return Err(ConfigError::InvalidAmmConfig(
            "max_collateral must be positive".into(),
        ));
    }

    Ok(AmmConfig {
        p_min: parsed.p_min,
        p_max: parsed.p_max,
        spread: parsed.spread,
        delta: parsed.delta,
        depth: parsed.depth,
        max_collateral: parsed.max_collateral,
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use std::io::Write;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{contents}").unwrap();
        f
    }

    #[test]
    fn rejects_overlapping_bands() {
        let file = write_temp(
            r#"{"bands": [
                {"minMargin":0.0,"avgMargin":0.02,"maxMargin":0.04,"minAmount":10,"avgAmount":20,"maxAmount":50},
                {"minMargin":0.03,"avgMargin":0.05,"maxMargin":0.07,"minAmount":10,"avgAmount":20,"maxAmount":50}
            ]}"#,
        );
        assert!(load_bands(file.path()).is_err());
    }

    #[test]
    fn accepts_disjoint_bands() {
        let file = write_temp(
            r#"{"bands": [
                {"minMargin":0.0,"avgMargin":0.01,"maxMargin":0.02,"minAmount":10,"avgAmount":20,"maxAmount":50}
            ]}"#,
        );
        assert_eq!(load_bands(file.path()).unwrap().len(), 1);
    }

    #[test]
    fn rejects_amm_config_with_inverted_price_bounds() {
        let file = write_temp(
            r#"{"p_min":0.9,"p_max":0.1,"spread":0.01,"delta":0.01,"depth":0.05,"max_collateral":200}"#,
        );
        assert!(load_amm(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = load_bands(Path::new("/nonexistent/path.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
