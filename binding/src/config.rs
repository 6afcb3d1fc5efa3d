//! Bounds for numeric and length validation rules.

use core::ops::{Bound, RangeBounds};

/// Bounds a value must fall within.
///
/// Used both for numeric rules (`Minimum`/`Maximum`, as `RangeCfg<f64>`) and for length rules
/// (`MinLength`/`MaxLength`, as `RangeCfg<usize>`).
///
/// # Examples
///
/// ```
/// use commonware_binding::config::{RangeCfg, Violation};
///
/// // Lengths between 1 and 10 (inclusive)
/// let cfg = RangeCfg::new(1..=10usize);
/// assert_eq!(cfg.check(&5), None);
/// assert_eq!(cfg.check(&0), Some(Violation::Below(1)));
/// assert_eq!(cfg.check(&11), Some(Violation::Above(10)));
///
/// // Bounds can be tightened one side at a time
/// let cfg = RangeCfg::<f64>::unbounded().with_min(0.5);
/// assert_eq!(cfg.min(), Some(0.5));
/// assert_eq!(cfg.max(), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeCfg<T: Copy + PartialOrd> {
    /// The lower bound of the range.
    start: Bound<T>,

    /// The upper bound of the range.
    end: Bound<T>,
}

/// The bound a value failed to respect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Violation<T> {
    /// The value is smaller than the lower bound.
    Below(T),
    /// The value is larger than the upper bound.
    Above(T),
}

impl<T: Copy + PartialOrd> Default for RangeCfg<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T: Copy + PartialOrd> From<core::ops::Range<T>> for RangeCfg<T> {
    fn from(r: core::ops::Range<T>) -> Self {
        Self::new(r)
    }
}

impl<T: Copy + PartialOrd> From<core::ops::RangeInclusive<T>> for RangeCfg<T> {
    fn from(r: core::ops::RangeInclusive<T>) -> Self {
        Self::new(r)
    }
}

impl<T: Copy + PartialOrd> From<core::ops::RangeFrom<T>> for RangeCfg<T> {
    fn from(r: core::ops::RangeFrom<T>) -> Self {
        Self::new(r)
    }
}

impl<T: Copy + PartialOrd> From<core::ops::RangeToInclusive<T>> for RangeCfg<T> {
    fn from(r: core::ops::RangeToInclusive<T>) -> Self {
        Self::new(r)
    }
}

impl<T: Copy + PartialOrd> RangeCfg<T> {
    /// Creates a new `RangeCfg` from any type implementing `RangeBounds<T>`.
    pub fn new(r: impl RangeBounds<T>) -> Self {
        RangeCfg {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Creates a `RangeCfg` that accepts every value.
    pub const fn unbounded() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// Returns a copy with an inclusive lower bound of `min`.
    pub fn with_min(self, min: T) -> Self {
        Self {
            start: Bound::Included(min),
            ..self
        }
    }

    /// Returns a copy with an inclusive upper bound of `max`.
    pub fn with_max(self, max: T) -> Self {
        Self {
            end: Bound::Included(max),
            ..self
        }
    }

    /// Returns the lower bound, if any.
    pub fn min(&self) -> Option<T> {
        match self.start {
            Bound::Included(s) | Bound::Excluded(s) => Some(s),
            Bound::Unbounded => None,
        }
    }

    /// Returns the upper bound, if any.
    pub fn max(&self) -> Option<T> {
        match self.end {
            Bound::Included(e) | Bound::Excluded(e) => Some(e),
            Bound::Unbounded => None,
        }
    }

    /// Returns true if neither side is bounded.
    pub fn is_unbounded(&self) -> bool {
        matches!(
            (&self.start, &self.end),
            (Bound::Unbounded, Bound::Unbounded)
        )
    }

    /// Returns true if the value is within this range.
    pub fn contains(&self, value: &T) -> bool {
        self.check(value).is_none()
    }

    /// Returns the bound `value` violates, checking the lower bound first.
    pub fn check(&self, value: &T) -> Option<Violation<T>> {
        // Exclude by start bound
        match self.start {
            Bound::Included(s) if *value < s => return Some(Violation::Below(s)),
            Bound::Excluded(s) if *value <= s => return Some(Violation::Below(s)),
            _ => {}
        }

        // Exclude by end bound
        match self.end {
            Bound::Included(e) if *value > e => return Some(Violation::Above(e)),
            Bound::Excluded(e) if *value >= e => return Some(Violation::Above(e)),
            _ => {}
        }
        None
    }
}

impl<T: Copy + PartialOrd> RangeBounds<T> for RangeCfg<T> {
    fn start_bound(&self) -> Bound<&T> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&T> {
        self.end.as_ref()
    }
}
