//! # Macro Sentiment Model
//!
//! Turns a snapshot of macro indicator readings (treasury yield, VIX,
//! CPI, ...) into per-sector sentiment scores on the 0-100 display scale.
//!
//! Each indicator carries a favourability band that maps its reading to a
//! raw signal in {+1, 0, -1}; the signal is weighted by the indicator's
//! per-sector impact (1-3) times its overall importance (default 1). The
//! sector score is the weighted mean of signals, rescaled from [-1, 1] to
//! [0, 100].
//!
//! The built-in seed carries the production impact grid, importance map and
//! bands; a TOML file may override bands and importance. Indicator
//! acquisition is out of scope, the model only consumes readings.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::weights::round2;

/// Whether a lower or a higher reading is the favourable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Lower,
    Higher,
}

/// Favourability band for one indicator.
///
/// `Lower`: readings at or below `favorable` signal +1, at or above
/// `unfavorable` signal -1. `Higher` mirrors the comparison.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Band {
    pub direction: Direction,
    pub favorable: f64,
    pub unfavorable: f64,
}

impl Band {
    /// Raw signal for a reading: +1 favourable, -1 unfavourable, 0 between.
    /// Non-finite readings are neutral.
    pub fn raw_signal(&self, value: f64) -> i32 {
        if !value.is_finite() {
            return 0;
        }
        match self.direction {
            Direction::Lower => {
                if value <= self.favorable {
                    1
                } else if value >= self.unfavorable {
                    -1
                } else {
                    0
                }
            }
            Direction::Higher => {
                if value >= self.favorable {
                    1
                } else if value <= self.unfavorable {
                    -1
                } else {
                    0
                }
            }
        }
    }
}

/// Per-indicator impact on each sector: a default for the whole universe
/// plus explicit per-sector overrides.
#[derive(Debug, Clone)]
struct ImpactRow {
    default: f64,
    overrides: BTreeMap<String, f64>,
}

impl ImpactRow {
    fn uniform(default: f64) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    fn with(default: f64, overrides: &[(&str, f64)]) -> Self {
        Self {
            default,
            overrides: overrides.iter().map(|(s, v)| (s.to_string(), *v)).collect(),
        }
    }

    fn for_sector(&self, sector: &str) -> f64 {
        self.overrides.get(sector).copied().unwrap_or(self.default)
    }
}

/// Optional TOML override for bands and importance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MacroModelConfig {
    #[serde(default)]
    pub importance: BTreeMap<String, f64>,
    #[serde(default)]
    pub bands: BTreeMap<String, Band>,
}

/// The sector scoring model: bands, importance and the impact grid over a
/// fixed sector universe.
#[derive(Debug, Clone)]
pub struct MacroModel {
    sectors: Vec<String>,
    bands: BTreeMap<String, Band>,
    importance: BTreeMap<String, f64>,
    impact: BTreeMap<String, ImpactRow>,
}

impl MacroModel {
    /// Built-in production tables over the given sector universe.
    pub fn seed(sectors: Vec<String>) -> Self {
        let mut bands = BTreeMap::new();
        for (name, direction, favorable, unfavorable) in [
            ("10Y_Treasury_Yield_%", Direction::Lower, 3.25, 4.00),
            ("VIX", Direction::Lower, 18.0, 25.0),
            ("NASDAQ_20d_gap_%", Direction::Higher, 4.0, -4.0),
            ("Fed_Funds_Rate_%", Direction::Lower, 4.5, 5.25),
            ("CPI_YoY_%", Direction::Lower, 3.0, 4.0),
            ("PCEPI_YoY_%", Direction::Lower, 3.0, 4.0),
            ("Real_GDP_Growth_%_SAAR", Direction::Higher, 2.5, 1.0),
            ("Real_PCE_YoY_%", Direction::Higher, 2.5, 1.0),
            ("Unemployment_%", Direction::Lower, 4.5, 5.5),
            ("Software_Dev_Job_Postings_YoY_%", Direction::Higher, 5.0, 0.0),
            ("PPI_Data_Processing_YoY_%", Direction::Higher, 5.0, 0.0),
            ("PPI_Software_Publishers_YoY_%", Direction::Higher, 5.0, 0.0),
            ("Consumer_Sentiment", Direction::Higher, 100.0, 90.0),
        ] {
            bands.insert(
                name.to_string(),
                Band {
                    direction,
                    favorable,
                    unfavorable,
                },
            );
        }

        let importance = [
            ("NASDAQ_20d_gap_%", 3.0),
            ("10Y_Treasury_Yield_%", 3.0),
            ("VIX", 3.0),
            ("Consumer_Sentiment", 3.0),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();

        let rate_sensitive: &[(&str, f64)] = &[
            ("SMB SaaS", 3.0),
            ("Enterprise SaaS", 3.0),
            ("Cloud Infrastructure", 3.0),
            ("Dev Tools / Analytics", 3.0),
            ("AI Infrastructure", 3.0),
            ("Vertical SaaS", 3.0),
            ("IT Services / Legacy Tech", 1.0),
        ];
        let consumer_heavy: &[(&str, f64)] = &[
            ("AdTech", 3.0),
            ("Consumer Internet", 3.0),
            ("eCommerce", 3.0),
            ("Semiconductors", 3.0),
            ("Hardware / Devices", 3.0),
        ];

        let mut impact = BTreeMap::new();
        impact.insert(
            "10Y_Treasury_Yield_%".to_string(),
            ImpactRow::with(2.0, rate_sensitive),
        );
        impact.insert("VIX".to_string(), ImpactRow::uniform(2.0));
        impact.insert(
            "NASDAQ_20d_gap_%".to_string(),
            ImpactRow::with(
                3.0,
                &[("IT Services / Legacy Tech", 2.0), ("Hardware / Devices", 2.0)],
            ),
        );
        impact.insert(
            "Fed_Funds_Rate_%".to_string(),
            ImpactRow::with(
                2.0,
                &[
                    ("SMB SaaS", 3.0),
                    ("Enterprise SaaS", 3.0),
                    ("Cloud Infrastructure", 3.0),
                    ("Dev Tools / Analytics", 3.0),
                    ("AI Infrastructure", 3.0),
                    ("Vertical SaaS", 3.0),
                    ("Fintech", 3.0),
                    ("IT Services / Legacy Tech", 1.0),
                ],
            ),
        );
        for name in [
            "CPI_YoY_%",
            "PCEPI_YoY_%",
            "Real_GDP_Growth_%_SAAR",
            "Real_PCE_YoY_%",
        ] {
            impact.insert(name.to_string(), ImpactRow::with(2.0, consumer_heavy));
        }
        impact.insert("Unemployment_%".to_string(), ImpactRow::uniform(2.0));
        impact.insert(
            "Software_Dev_Job_Postings_YoY_%".to_string(),
            ImpactRow::with(
                1.0,
                &[
                    ("SMB SaaS", 3.0),
                    ("Enterprise SaaS", 2.0),
                    ("Cloud Infrastructure", 3.0),
                    ("Cybersecurity", 3.0),
                    ("Dev Tools / Analytics", 3.0),
                    ("AI Infrastructure", 3.0),
                    ("Vertical SaaS", 3.0),
                ],
            ),
        );
        for name in ["PPI_Data_Processing_YoY_%", "PPI_Software_Publishers_YoY_%"] {
            impact.insert(
                name.to_string(),
                ImpactRow::with(
                    1.0,
                    &[("Cloud Infrastructure", 3.0), ("AI Infrastructure", 3.0)],
                ),
            );
        }
        impact.insert(
            "Consumer_Sentiment".to_string(),
            ImpactRow::with(
                1.0,
                &[
                    ("Consumer Internet", 3.0),
                    ("eCommerce", 3.0),
                    ("AdTech", 3.0),
                    ("Fintech", 2.0),
                    ("Hardware / Devices", 2.0),
                    ("Semiconductors", 2.0),
                    ("SMB SaaS", 2.0),
                ],
            ),
        );

        Self {
            sectors,
            bands,
            importance,
            impact,
        }
    }

    /// Apply a TOML override on top of the seed. Override entries for
    /// indicators the seed does not know are accepted; they only matter if
    /// the feed sends those series.
    pub fn with_overrides(mut self, cfg: MacroModelConfig) -> Self {
        for (name, imp) in cfg.importance {
            self.importance.insert(name, imp);
        }
        for (name, band) in cfg.bands {
            self.bands.insert(name, band);
        }
        self
    }

    /// Load an override file and layer it on the seed.
    pub fn seed_with_config_file(sectors: Vec<String>, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading macro model config {}", path.display()))?;
        let cfg: MacroModelConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing macro model config {}", path.display()))?;
        Ok(Self::seed(sectors).with_overrides(cfg))
    }

    pub fn sectors(&self) -> &[String] {
        &self.sectors
    }

    /// Score every sector from a snapshot of indicator readings.
    ///
    /// Indicators without a band are skipped with a warning (new upstream
    /// series must be banded before they count). Sector score is
    /// `Σ signal·impact·importance / Σ |impact·importance|` in [-1, 1],
    /// rescaled to the 0-100 display scale and rounded to 2 decimals.
    /// Sectors with no contributing indicator come out neutral (50).
    pub fn score_sectors(&self, macros: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        let mut sum: BTreeMap<&str, f64> = BTreeMap::new();
        let mut weight: BTreeMap<&str, f64> = BTreeMap::new();

        for (indicator, value) in macros {
            let Some(band) = self.bands.get(indicator) else {
                warn!(indicator = %indicator, "ignoring indicator without a favourability band");
                continue;
            };
            let signal = band.raw_signal(*value) as f64;
            let importance = self.importance.get(indicator).copied().unwrap_or(1.0);
            let row = self.impact.get(indicator);

            for sector in &self.sectors {
                let impact = row.map(|r| r.for_sector(sector)).unwrap_or(1.0);
                let w = impact * importance;
                *sum.entry(sector.as_str()).or_default() += signal * w;
                *weight.entry(sector.as_str()).or_default() += w.abs();
            }
        }

        self.sectors
            .iter()
            .map(|sector| {
                let w = weight.get(sector.as_str()).copied().unwrap_or(0.0);
                let raw = if w > 0.0 {
                    sum.get(sector.as_str()).copied().unwrap_or(0.0) / w
                } else {
                    0.0
                };
                (sector.clone(), round2((raw + 1.0) * 50.0))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sectors::SectorCatalog;

    fn model() -> MacroModel {
        MacroModel::seed(SectorCatalog::default_seed().sectors)
    }

    fn macros(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn lower_band_signals() {
        let band = Band {
            direction: Direction::Lower,
            favorable: 18.0,
            unfavorable: 25.0,
        };
        assert_eq!(band.raw_signal(15.0), 1);
        assert_eq!(band.raw_signal(18.0), 1);
        assert_eq!(band.raw_signal(20.0), 0);
        assert_eq!(band.raw_signal(25.0), -1);
        assert_eq!(band.raw_signal(40.0), -1);
    }

    #[test]
    fn higher_band_with_inverted_bounds() {
        // The NASDAQ gap band is favourable above +4% and unfavourable
        // below -4%.
        let band = Band {
            direction: Direction::Higher,
            favorable: 4.0,
            unfavorable: -4.0,
        };
        assert_eq!(band.raw_signal(5.0), 1);
        assert_eq!(band.raw_signal(0.0), 0);
        assert_eq!(band.raw_signal(-4.6), -1);
    }

    #[test]
    fn non_finite_reading_is_neutral() {
        let band = Band {
            direction: Direction::Lower,
            favorable: 3.0,
            unfavorable: 4.0,
        };
        assert_eq!(band.raw_signal(f64::NAN), 0);
    }

    #[test]
    fn empty_macros_score_neutral() {
        let scores = model().score_sectors(&BTreeMap::new());
        assert_eq!(scores.len(), 14);
        for v in scores.values() {
            assert_eq!(*v, 50.0);
        }
    }

    #[test]
    fn all_favourable_scores_100() {
        let m = macros(&[
            ("VIX", 10.0),
            ("CPI_YoY_%", 2.0),
            ("Real_GDP_Growth_%_SAAR", 3.0),
        ]);
        let scores = model().score_sectors(&m);
        for v in scores.values() {
            assert_eq!(*v, 100.0);
        }
    }

    #[test]
    fn all_unfavourable_scores_0() {
        let m = macros(&[("VIX", 40.0), ("CPI_YoY_%", 6.0)]);
        let scores = model().score_sectors(&m);
        for v in scores.values() {
            assert_eq!(*v, 0.0);
        }
    }

    #[test]
    fn mixed_signals_weighted_by_impact_and_importance() {
        // For AdTech: VIX at 15 signals +1 with impact 2 x importance 3;
        // CPI at 5 signals -1 with impact 3 x importance 1.
        // Raw = (6 - 3) / 9, rescaled = 66.67.
        let m = macros(&[("VIX", 15.0), ("CPI_YoY_%", 5.0)]);
        let scores = model().score_sectors(&m);
        assert_eq!(scores["AdTech"], 66.67);
    }

    #[test]
    fn unknown_indicator_is_ignored() {
        let with = model().score_sectors(&macros(&[("VIX", 10.0), ("Bogus_Series", 999.0)]));
        let without = model().score_sectors(&macros(&[("VIX", 10.0)]));
        assert_eq!(with, without);
    }

    #[test]
    fn override_replaces_band_and_importance() {
        let cfg: MacroModelConfig = toml::from_str(
            r#"
            [importance]
            "VIX" = 1.0

            [bands."VIX"]
            direction = "lower"
            favorable = 30.0
            unfavorable = 40.0
            "#,
        )
        .unwrap();
        let m = model().with_overrides(cfg);
        // 28 was unfavourable under the seed band (18/25); under the
        // widened override it is favourable.
        let scores = m.score_sectors(&macros(&[("VIX", 28.0)]));
        for v in scores.values() {
            assert_eq!(*v, 100.0);
        }
    }
}
