use serde::Serialize;

/// The four summary metrics, in artifact row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    Average,
    Max,
    Min,
    Median,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Average, Metric::Max, Metric::Min, Metric::Median];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Average => "Average",
            Self::Max => "Max",
            Self::Min => "Min",
            Self::Median => "Median",
        }
    }

    /// Column suffix in the per-service artifact (`<version>_avg`, ...).
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Average => "avg",
            Self::Max => "max",
            Self::Min => "min",
            Self::Median => "median",
        }
    }
}

/// Mean/max/min/median of one value sequence. All `None` when it is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub avg: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
}

impl Metrics {
    pub fn from_values(values: &[u64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        let n = sorted.len();
        let sum: f64 = sorted.iter().map(|&v| v as f64).sum();
        let mid = n / 2;
        let median = if n % 2 == 1 {
            sorted[mid] as f64
        } else {
            (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
        };

        Self {
            avg: Some(sum / n as f64),
            max: Some(sorted[n - 1] as f64),
            min: Some(sorted[0] as f64),
            median: Some(median),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Average => self.avg,
            Metric::Max => self.max,
            Metric::Min => self.min,
            Metric::Median => self.median,
        }
    }
}

/// Artifact cell text: whole numbers without a fraction, everything else
/// rounded to two decimals, missing values empty.
pub fn format_value(value: Option<f64>) -> String {
    let Some(v) = value else {
        return String::new();
    };
    let rounded = (v * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').to_string()
    }
}
