//! Low-stock report: which filaments to reorder.
//!
//! Stock is judged per filament product (vendor, name and diameter), summing
//! every non-archived spool of it, not spool by spool.

use spoolctl_core::spool::Spool;
use std::collections::BTreeMap;

/// Default threshold in grams.
pub const DEFAULT_LOW_THRESHOLD: f64 = 200.0;

/// Thresholds and exclusions for the low-stock report.
///
/// Pattern keys are either a filament name fragment or `vendor::name`
/// fragments, all matched case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct LowStockRules {
    /// Grams at or below which a filament is low; 0 disables the report
    pub threshold: f64,
    pub overrides: BTreeMap<String, f64>,
    pub ignore: Vec<String>,
}

impl Default for LowStockRules {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_LOW_THRESHOLD,
            overrides: BTreeMap::new(),
            ignore: Vec::new(),
        }
    }
}

impl LowStockRules {
    /// The threshold for a filament: the first matching positive override, else the default.
    pub fn threshold_for(&self, vendor: &str, name: &str) -> f64 {
        self.overrides
            .iter()
            .filter(|(_, grams)| **grams > 0.0)
            .find(|(pattern, _)| pattern_matches(pattern, vendor, name))
            .map(|(_, grams)| *grams)
            .unwrap_or(self.threshold)
    }

    pub fn is_ignored(&self, vendor: &str, name: &str) -> bool {
        self.ignore.iter().any(|p| pattern_matches(p, vendor, name))
    }

    fn is_low(&self, vendor: &str, name: &str, remaining: f64) -> bool {
        if self.is_ignored(vendor, name) {
            return false;
        }
        let threshold = self.threshold_for(vendor, name);
        threshold > 0.0 && remaining <= threshold + 1e-9
    }
}

fn pattern_matches(pattern: &str, vendor: &str, name: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    if pattern.is_empty() {
        return false;
    }
    let vendor = vendor.to_lowercase();
    let name = name.to_lowercase();
    match pattern.split_once("::") {
        Some((v, n)) => {
            let (v, n) = (v.trim(), n.trim());
            !v.is_empty() && !n.is_empty() && vendor.contains(v) && name.contains(n)
        }
        None => name.contains(&pattern),
    }
}

/// One filament product running low, with every spool of it.
#[derive(Debug, Clone, PartialEq)]
pub struct LowGroup {
    pub vendor: String,
    pub name: String,
    pub diameter: f64,
    pub remaining: f64,
    pub threshold: f64,
    pub spools: Vec<Spool>,
}

/// Group `spools` by filament product and keep the groups that are low.
///
/// Archived spools never count. Groups come back sorted by vendor then name.
pub fn low_stock(spools: &[Spool], rules: &LowStockRules) -> Vec<LowGroup> {
    let mut groups: BTreeMap<(String, String, String), LowGroup> = BTreeMap::new();
    for spool in spools.iter().filter(|s| !s.archived) {
        let vendor = spool.filament.vendor_name().to_string();
        let name = spool.filament.name.clone();
        let key = (
            vendor.clone(),
            name.clone(),
            format!("{:.2}", spool.filament.diameter),
        );
        let group = groups.entry(key).or_insert_with(|| LowGroup {
            vendor,
            name,
            diameter: spool.filament.diameter,
            remaining: 0.0,
            threshold: 0.0,
            spools: Vec::new(),
        });
        group.remaining += spool.remaining_weight;
        group.spools.push(spool.clone());
    }

    groups
        .into_values()
        .filter(|g| rules.is_low(&g.vendor, &g.name, g.remaining))
        .map(|mut g| {
            g.threshold = rules.threshold_for(&g.vendor, &g.name);
            g
        })
        .collect()
}

/// A single spool judged on its own, as a one-spool group when low.
pub fn low_spool(spool: &Spool, rules: &LowStockRules) -> Option<LowGroup> {
    let vendor = spool.filament.vendor_name();
    let name = &spool.filament.name;
    if spool.archived || !rules.is_low(vendor, name, spool.remaining_weight) {
        return None;
    }
    Some(LowGroup {
        vendor: vendor.to_string(),
        name: name.clone(),
        diameter: spool.filament.diameter,
        remaining: spool.remaining_weight,
        threshold: rules.threshold_for(vendor, name),
        spools: vec![spool.clone()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolctl_core::spool::{Filament, Vendor};

    fn spool(id: u64, vendor: &str, name: &str, remaining: f64) -> Spool {
        let mut filament = Filament::new(id, name, "PLA");
        filament.vendor = Some(Vendor {
            id: 1,
            name: vendor.into(),
        });
        filament.diameter = 1.75;
        Spool::new(id, filament).with_remaining(remaining)
    }

    #[test]
    fn filament_is_low_by_total_across_spools() {
        let spools = vec![
            spool(1, "Bambu", "Black", 150.0),
            spool(2, "Bambu", "Black", 120.0),
            spool(3, "Bambu", "White", 90.0),
            spool(4, "Bambu", "White", 900.0).archived(),
        ];
        let low = low_stock(&spools, &LowStockRules::default());
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "White");
        assert_eq!(low[0].remaining, 90.0);
        assert_eq!(low[0].spools.len(), 1);
    }

    #[test]
    fn overrides_and_ignores_match_vendor_and_name() {
        let mut rules = LowStockRules::default();
        rules.overrides.insert("bambu::black".into(), 500.0);
        rules.overrides.insert("silk".into(), 0.0);
        rules.ignore.push("Polymaker::".into());
        rules.ignore.push("sample".into());

        assert_eq!(rules.threshold_for("Bambu Lab", "PLA Black"), 500.0);
        assert_eq!(rules.threshold_for("Sunlu", "PLA Black"), DEFAULT_LOW_THRESHOLD);
        // non-positive overrides are ignored
        assert_eq!(rules.threshold_for("Sunlu", "Silk Gold"), DEFAULT_LOW_THRESHOLD);

        assert!(rules.is_ignored("Any", "Sample Pack"));
        // an incomplete vendor::name pattern matches nothing
        assert!(!rules.is_ignored("Polymaker", "PolyTerra"));

        let spools = vec![
            spool(1, "Bambu Lab", "PLA Black", 450.0),
            spool(2, "Any", "Sample Pack", 10.0),
        ];
        let low = low_stock(&spools, &rules);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].threshold, 500.0);
    }

    #[test]
    fn zero_threshold_disables_report() {
        let rules = LowStockRules {
            threshold: 0.0,
            ..LowStockRules::default()
        };
        let s = spool(1, "Bambu", "Black", 0.0);
        assert!(low_spool(&s, &rules).is_none());
        let low = low_spool(&s, &LowStockRules::default()).unwrap();
        assert_eq!(low.threshold, DEFAULT_LOW_THRESHOLD);
        assert_eq!(low.spools.len(), 1);
    }
}
