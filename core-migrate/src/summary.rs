//! Size summary printed at the end of a run.

use std::fmt;

const MIB: f64 = 1024.0 * 1024.0;
const GIB_BYTES: u64 = 1024 * 1024 * 1024;

/// Total declared size of the processed items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSummary {
    bytes: u64,
}

impl SizeSummary {
    pub fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Gigabytes are only used once the total is strictly above 1 GiB.
    pub fn uses_gigabytes(&self) -> bool {
        self.bytes > GIB_BYTES
    }

    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / MIB
    }

    pub fn gigabytes(&self) -> f64 {
        self.bytes as f64 / (MIB * 1024.0)
    }
}

impl fmt::Display for SizeSummary {
    // `{:?}` on f64 prints the shortest round-trip form, so 1 MiB reads "1.0".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uses_gigabytes() {
            write!(f, "Total size (GB): {:?}", self.gigabytes())
        } else {
            write!(f, "Total size (MB): {:?}", self.megabytes())
        }
    }
}
