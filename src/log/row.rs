/// One `(service, loading_time_ms)` observation taken from a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub service: String,
    pub loading_time_ms: u64,
}

impl Sample {
    pub fn new(service: impl Into<String>, loading_time_ms: u64) -> Self {
        Self {
            service: service.into(),
            loading_time_ms,
        }
    }
}

/// All samples of one version, in file-then-line encounter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTable {
    pub version: String,
    pub samples: Vec<Sample>,
}

impl VersionTable {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            samples: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
