//! Mip level selection with clamped navigation.

/// Tracks which mip level is currently rendered.
///
/// Valid levels are `0..level_count`, finest first; the bound is fixed when
/// a volume is bound and refreshed on rebind. Requests outside the bound
/// never fail, they clamp and report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelNavigator {
    current: u32,
    level_count: u32,
}

impl LevelNavigator {
    pub fn new(level_count: u32) -> Self {
        debug_assert!(level_count > 0, "a bound volume always has a mip level");
        Self {
            current: 0,
            level_count,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    /// Select a level, clamping to the valid range.
    ///
    /// Returns `true` iff the request had to be adjusted. Stepping is a
    /// caller-side `set_level(current ± 1)`.
    pub fn set_level(&mut self, requested: i32) -> bool {
        let clamped = requested.clamp(0, self.level_count as i32 - 1);
        self.current = clamped as u32;
        clamped != requested
    }

    /// Adopt a rebuilt volume's level count, keeping the current selection
    /// where possible and re-clamping it where not.
    pub fn rebind(&mut self, level_count: u32) {
        debug_assert!(level_count > 0, "a bound volume always has a mip level");
        self.level_count = level_count;
        self.current = self.current.min(level_count - 1);
    }
}
