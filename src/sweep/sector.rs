// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Per-motor angular sectors and their coverage invariant.
//!
//! Sectors must be contiguous, non-overlapping and together cover exactly
//! `[sweep_min, sweep_max]`. The check is a `const fn` so the static assignment in
//! [`crate::config`] is validated at compile time, and the same rules back the runtime
//! range check in [`SectorMap::check_range`].

use core::fmt;

/// Angular sub-range owned by one motor, in whole degrees.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sector {
    pub min: u16,
    pub max: u16,
}

impl Sector {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }
}

/// Why a sector assignment does not partition the sweep range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CoverageError {
    NoSectors,
    /// Sweep range has `min >= max`.
    EmptyRange,
    /// Sector `index` has `min >= max`.
    Inverted { index: usize },
    /// First sector does not start at the sweep minimum.
    StartMismatch,
    /// Last sector does not end at the sweep maximum.
    EndMismatch,
    /// Sector `index` starts after its predecessor ends.
    Gap { index: usize },
    /// Sector `index` starts before its predecessor ends.
    Overlap { index: usize },
    /// A commanded sweep bound would leave a sector with no angles.
    SectorEmptied { index: usize },
}

impl fmt::Display for CoverageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageError::NoSectors => f.write_str("no sectors"),
            CoverageError::EmptyRange => f.write_str("sweep min >= max"),
            CoverageError::Inverted { index } => write!(f, "sector {} min >= max", index),
            CoverageError::StartMismatch => f.write_str("first sector misses sweep min"),
            CoverageError::EndMismatch => f.write_str("last sector misses sweep max"),
            CoverageError::Gap { index } => write!(f, "gap before sector {}", index),
            CoverageError::Overlap { index } => write!(f, "overlap at sector {}", index),
            CoverageError::SectorEmptied { index } => write!(f, "sector {} emptied", index),
        }
    }
}

/// Check that `sectors` partitions `[sweep_min, sweep_max]`.
pub const fn check_coverage(
    sectors: &[Sector],
    sweep_min: u16,
    sweep_max: u16,
) -> Result<(), CoverageError> {
    if sectors.is_empty() {
        return Err(CoverageError::NoSectors);
    }
    if sweep_min >= sweep_max {
        return Err(CoverageError::EmptyRange);
    }
    if sectors[0].min != sweep_min {
        return Err(CoverageError::StartMismatch);
    }
    if sectors[sectors.len() - 1].max != sweep_max {
        return Err(CoverageError::EndMismatch);
    }

    let mut i = 0;
    while i < sectors.len() {
        if sectors[i].min >= sectors[i].max {
            return Err(CoverageError::Inverted { index: i });
        }
        if i > 0 {
            let prev_max = sectors[i - 1].max;
            if sectors[i].min > prev_max {
                return Err(CoverageError::Gap { index: i });
            }
            if sectors[i].min < prev_max {
                return Err(CoverageError::Overlap { index: i });
            }
        }
        i += 1;
    }
    Ok(())
}

/// Validated sector assignment for `N` motors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SectorMap<const N: usize> {
    sectors: [Sector; N],
}

impl<const N: usize> SectorMap<N> {
    /// Build a map, rejecting assignments that do not partition the sweep range.
    pub fn new(sectors: [Sector; N], sweep_min: u16, sweep_max: u16) -> Result<Self, CoverageError> {
        check_coverage(&sectors, sweep_min, sweep_max)?;
        Ok(Self { sectors })
    }

    /// Build a map from an assignment already checked at compile time.
    pub const fn from_checked(sectors: [Sector; N]) -> Self {
        Self { sectors }
    }

    #[inline]
    pub fn sectors(&self) -> &[Sector; N] {
        &self.sectors
    }

    /// Lower bound of the assignment (first sector's min).
    #[inline]
    pub fn span_min(&self) -> u16 {
        self.sectors[0].min
    }

    /// Upper bound of the assignment (last sector's max).
    #[inline]
    pub fn span_max(&self) -> u16 {
        self.sectors[N - 1].max
    }

    /// Check whether a commanded sweep range keeps every sector non-empty.
    ///
    /// The first and last sectors are clipped to the commanded bounds; inner sectors are
    /// fixed. A range that would push a bound past the far edge of an end sector, or leave
    /// the assignment entirely, is rejected.
    pub fn check_range(&self, sweep_min: u16, sweep_max: u16) -> Result<(), CoverageError> {
        if sweep_min >= sweep_max {
            return Err(CoverageError::EmptyRange);
        }
        if sweep_min >= self.sectors[0].max {
            return Err(CoverageError::SectorEmptied { index: 0 });
        }
        if sweep_max <= self.sectors[N - 1].min {
            return Err(CoverageError::SectorEmptied { index: N - 1 });
        }
        Ok(())
    }

    /// Sector containing `angle`.
    ///
    /// Inclusive min, exclusive max, except the last sector which also owns its max. Angles
    /// below the first sector belong to it, angles above the last belong to the last, which
    /// matches the clipping applied by [`check_range`](Self::check_range).
    pub fn locate(&self, angle: u16) -> usize {
        for (i, sector) in self.sectors.iter().enumerate().take(N - 1) {
            if angle < sector.max {
                return i;
            }
        }
        N - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR: [Sector; 4] = [
        Sector::new(0, 30),
        Sector::new(30, 60),
        Sector::new(60, 90),
        Sector::new(90, 120),
    ];

    #[test]
    fn contiguous_assignment_is_accepted() {
        assert_eq!(check_coverage(&FOUR, 0, 120), Ok(()));
        assert!(SectorMap::new(FOUR, 0, 120).is_ok());
    }

    #[test]
    fn gap_overlap_and_edges_are_rejected() {
        let mut gap = FOUR;
        gap[2].min = 62;
        assert_eq!(check_coverage(&gap, 0, 120), Err(CoverageError::Gap { index: 2 }));

        let mut overlap = FOUR;
        overlap[1].min = 25;
        assert_eq!(
            check_coverage(&overlap, 0, 120),
            Err(CoverageError::Overlap { index: 1 })
        );

        assert_eq!(check_coverage(&FOUR, 5, 120), Err(CoverageError::StartMismatch));
        assert_eq!(check_coverage(&FOUR, 0, 125), Err(CoverageError::EndMismatch));
        assert_eq!(check_coverage(&[], 0, 120), Err(CoverageError::NoSectors));

        let mut inverted = FOUR;
        inverted[3] = Sector::new(90, 90);
        inverted[2].max = 90;
        assert!(check_coverage(&inverted, 0, 90).is_err());
    }

    #[test]
    fn every_valid_assignment_partitions_the_range() {
        // Every angle in range lands in exactly one sector and sectors are ordered.
        let map = SectorMap::new(FOUR, 0, 120).unwrap();
        let mut last = 0;
        for angle in 0..=120u16 {
            let idx = map.locate(angle);
            assert!(idx >= last);
            last = idx;
            let s = map.sectors()[idx];
            assert!(angle >= s.min);
            assert!(angle < s.max || (idx == 3 && angle == s.max));
        }
    }

    #[test]
    fn locate_uses_inclusive_min_exclusive_max() {
        let map = SectorMap::from_checked(FOUR);
        assert_eq!(map.locate(0), 0);
        assert_eq!(map.locate(29), 0);
        assert_eq!(map.locate(30), 1);
        assert_eq!(map.locate(90), 3);
        assert_eq!(map.locate(120), 3);
        assert_eq!(map.locate(170), 3);
    }

    #[test]
    fn range_check_clips_end_sectors_only() {
        let map = SectorMap::from_checked(FOUR);
        assert_eq!(map.check_range(10, 110), Ok(()));
        assert_eq!(map.check_range(29, 91), Ok(()));
        assert_eq!(
            map.check_range(30, 120),
            Err(CoverageError::SectorEmptied { index: 0 })
        );
        assert_eq!(
            map.check_range(0, 90),
            Err(CoverageError::SectorEmptied { index: 3 })
        );
        assert_eq!(map.check_range(60, 60), Err(CoverageError::EmptyRange));
    }
}
