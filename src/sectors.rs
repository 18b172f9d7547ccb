//! # Sector Catalog
//!
//! Canonical names for the tracked technology sectors plus tolerant
//! resolution of the spelling variants that show up in feeds and configs
//! ("FinTech", "IT Services", "Hardware/Devices", ...).
//!
//! - Case-insensitive lookup with normalization of punctuation and dashes.
//! - Aliases map alternative spellings to canonical names.
//! - Unknown names can be matched to the closest canonical sector for
//!   "did you mean" hints.

use std::collections::HashMap;

use serde::Deserialize;

/// Similarity floor below which no suggestion is offered.
const SUGGESTION_MIN_SIMILARITY: f64 = 0.6;

/// The tracked sector universe with alias resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct SectorCatalog {
    /// Canonical sector names, display spelling.
    #[serde(default)]
    pub sectors: Vec<String>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl SectorCatalog {
    /// Catalog from an explicit sector list and alias table. Alias keys are
    /// normalized on construction so lookups stay cheap.
    pub fn new(sectors: Vec<String>, aliases: HashMap<String, String>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(k, v)| (normalize(&k), v))
            .collect();
        Self { sectors, aliases }
    }

    /// Built-in seed with the fourteen tracked technology sectors and the
    /// spelling variants observed in upstream data files.
    pub fn default_seed() -> Self {
        let sectors = [
            "SMB SaaS",
            "Enterprise SaaS",
            "Cloud Infrastructure",
            "AdTech",
            "Fintech",
            "Consumer Internet",
            "eCommerce",
            "Cybersecurity",
            "Dev Tools / Analytics",
            "Semiconductors",
            "AI Infrastructure",
            "Vertical SaaS",
            "IT Services / Legacy Tech",
            "Hardware / Devices",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let mut aliases = HashMap::new();
        for (a, c) in [
            ("it services", "IT Services / Legacy Tech"),
            ("legacy tech", "IT Services / Legacy Tech"),
            ("dev tools", "Dev Tools / Analytics"),
            ("hardware", "Hardware / Devices"),
            ("e commerce", "eCommerce"),
            ("fin tech", "Fintech"),
            ("cyber security", "Cybersecurity"),
            ("semis", "Semiconductors"),
            ("cloud", "Cloud Infrastructure"),
            ("ai infra", "AI Infrastructure"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self { sectors, aliases }
    }

    /// Resolve a possibly non-canonical name to its canonical spelling.
    ///
    /// Steps:
    /// 1. Alias lookup (normalized) → canonical.
    /// 2. Exact normalized match against the canonical list.
    ///
    /// No substring fallback: several canonical names share words
    /// ("SaaS", "Infrastructure"), so partial matches would be ambiguous.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let n = normalize(name);

        // 1) Alias resolution.
        if let Some(canon) = self.aliases.get(&n) {
            if let Some(found) = self
                .sectors
                .iter()
                .find(|s| normalize(s) == normalize(canon))
            {
                return Some(found.as_str());
            }
        }

        // 2) Exact normalized match.
        self.sectors
            .iter()
            .find(|s| normalize(s) == n)
            .map(|s| s.as_str())
    }

    /// Resolve to canonical spelling, or hand the name back untouched when
    /// it is not in the catalog (feeds may introduce new sectors).
    pub fn canonical_or_verbatim(&self, name: &str) -> String {
        match self.resolve(name) {
            Some(canon) => canon.to_string(),
            None => name.to_string(),
        }
    }

    /// Closest canonical sector for "did you mean" hints.
    pub fn suggest(&self, name: &str) -> Option<String> {
        closest_sector(name, self.sectors.iter().map(|s| s.as_str()))
    }
}

/// Pick the candidate most similar to `name`, if any clears the floor.
pub fn closest_sector<'a, I>(name: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let n = normalize(name);
    let mut best: Option<(f64, &str)> = None;

    for cand in candidates {
        let sim = strsim::normalized_levenshtein(&n, &normalize(cand));
        if sim >= SUGGESTION_MIN_SIMILARITY {
            match best {
                Some((b, _)) if b >= sim => {}
                _ => best = Some((sim, cand)),
            }
        }
    }

    best.map(|(_, cand)| cand.to_string())
}

/// Normalize input string: lowercase, replace punctuation/dashes with spaces,
/// collapse multiple spaces into one.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_ascii_lowercase();

    // Replace common separators with spaces.
    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }

    out = out.replace(['\n', '\r', '\t', '.', ',', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
