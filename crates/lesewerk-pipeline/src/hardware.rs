// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hardware detection and worker pool sizing.

use std::fmt;

use tracing::info;

/// What the host offers and how many page workers the run uses.
///
/// Computed once when a run starts and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareProfile {
    /// Workers in the page pool. Also the number of pages in flight at once.
    pub worker_count: usize,
    /// Logical processing units available to this process.
    pub detected_core_count: usize,
    /// Operating system (`linux`, `macos`, ...).
    pub platform: &'static str,
    /// CPU architecture (`x86_64`, `aarch64`, ...).
    pub arch: &'static str,
}

impl HardwareProfile {
    /// Size the pool for `units` logical processors.
    ///
    /// One unit is left for the orchestrating task and I/O, so the pool gets
    /// `max(1, units - 1)` workers. A positive `override_count` wins.
    pub fn from_units(units: usize, override_count: Option<usize>) -> Self {
        let detected_core_count = units.max(1);
        let worker_count = match override_count {
            Some(count) if count > 0 => count,
            _ => detected_core_count.saturating_sub(1).max(1),
        };
        Self {
            worker_count,
            detected_core_count,
            platform: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }

    /// Inspect the host. Falls back to a single unit when the available
    /// parallelism cannot be determined.
    pub fn detect(override_count: Option<usize>) -> Self {
        let units = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        let profile = Self::from_units(units, override_count);
        info!(
            platform = profile.platform,
            arch = profile.arch,
            cores = profile.detected_core_count,
            workers = profile.worker_count,
            apple_silicon = profile.is_apple_silicon(),
            "Hardware detected"
        );
        profile
    }

    /// macOS on an ARM64 chip.
    pub fn is_apple_silicon(&self) -> bool {
        self.platform == "macos" && self.arch == "aarch64"
    }
}

impl fmt::Display for HardwareProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} cores, {} workers{}",
            self.platform,
            self.arch,
            self.detected_core_count,
            self.worker_count,
            if self.is_apple_silicon() {
                " (Apple Silicon)"
            } else {
                ""
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserves_one_unit() {
        assert_eq!(HardwareProfile::from_units(8, None).worker_count, 7);
        assert_eq!(HardwareProfile::from_units(2, None).worker_count, 1);
    }

    #[test]
    fn never_drops_below_one_worker() {
        assert_eq!(HardwareProfile::from_units(1, None).worker_count, 1);
        let zero = HardwareProfile::from_units(0, None);
        assert_eq!(zero.worker_count, 1);
        assert_eq!(zero.detected_core_count, 1);
    }

    #[test]
    fn explicit_count_takes_precedence() {
        let profile = HardwareProfile::from_units(4, Some(16));
        assert_eq!(profile.worker_count, 16);
        assert_eq!(profile.detected_core_count, 4);
    }

    #[test]
    fn zero_override_is_ignored() {
        assert_eq!(HardwareProfile::from_units(4, Some(0)).worker_count, 3);
    }

    #[test]
    fn detect_yields_positive_counts() {
        let profile = HardwareProfile::detect(None);
        assert!(profile.worker_count >= 1);
        assert!(profile.detected_core_count >= profile.worker_count);
    }
}
