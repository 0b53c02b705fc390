//! Dataset sanity checks run after exclusions are applied.
//!
//! Problems are returned as data and never as `Err`: count mismatches become
//! warnings, a missing canary service becomes the report's error.

use serde::Serialize;

pub const DEFAULT_EXPECTED_SERVICES: usize = 24;
pub const DEFAULT_CANARY: &str = "AUTO TEST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityRules {
    pub expected_services: usize,
    /// Service whose sample count every other service must match.
    pub canary: String,
}

impl Default for QualityRules {
    fn default() -> Self {
        Self {
            expected_services: DEFAULT_EXPECTED_SERVICES,
            canary: DEFAULT_CANARY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQualityReport {
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.error.is_none()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// Assess `(service, total sample count)` pairs, already filtered by the
/// exclusion list. Services without samples do not count as present, and
/// names that only differ by surrounding whitespace are one service.
pub fn assess<'a, I>(rules: &QualityRules, services: I) -> DataQualityReport
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for (name, count) in services {
        if count == 0 {
            continue;
        }
        let name = name.trim();
        match counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, total)) => *total += count,
            None => counts.push((name, count)),
        }
    }

    let mut report = DataQualityReport::default();
    if counts.len() != rules.expected_services {
        report.warnings.push(format!(
            "Warning: dataset must include {} services, found {}.",
            rules.expected_services,
            counts.len()
        ));
    }

    let canary = normalize(&rules.canary);
    let Some(&(canary_name, reference)) = counts.iter().find(|(n, _)| normalize(n) == canary) else {
        report.error = Some(format!(
            "Error: dataset is missing required '{}' service.",
            rules.canary
        ));
        return report;
    };

    for &(name, count) in &counts {
        if name == canary_name || count == reference {
            continue;
        }
        report.warnings.push(format!(
            "Warning: {} has {} samples, {} has {}.",
            name, count, rules.canary, reference
        ));
    }
    report
}
