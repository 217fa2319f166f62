//! Limits applied while reading untrusted input.

use core::ops::{Bound, RangeBounds};

/// An allowed range of values, usually a length or element count.
///
/// # Examples
///
/// ```
/// use packetwire_codec::RangeCfg;
///
/// let cfg = RangeCfg::new(0..=1024);
/// assert!(cfg.contains(&500));
/// assert!(!cfg.contains(&2000));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeCfg<T: Copy + PartialOrd> {
    start: Bound<T>,
    end: Bound<T>,
}

impl<T: Copy + PartialOrd> RangeCfg<T> {
    /// Creates a new `RangeCfg` from any type implementing `RangeBounds<T>`.
    pub fn new(r: impl RangeBounds<T>) -> Self {
        Self {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Returns true if the value is within this range.
    pub fn contains(&self, value: &T) -> bool {
        let above_start = match &self.start {
            Bound::Included(s) => value >= s,
            Bound::Excluded(s) => value > s,
            Bound::Unbounded => true,
        };
        let below_end = match &self.end {
            Bound::Included(e) => value <= e,
            Bound::Excluded(e) => value < e,
            Bound::Unbounded => true,
        };
        above_start && below_end
    }
}

macro_rules! impl_from_range {
    ($($range:ty),*) => {
        $(
            impl<T: Copy + PartialOrd> From<$range> for RangeCfg<T> {
                fn from(r: $range) -> Self {
                    Self::new(r)
                }
            }
        )*
    };
}

impl_from_range!(
    core::ops::Range<T>,
    core::ops::RangeInclusive<T>,
    core::ops::RangeFrom<T>,
    core::ops::RangeTo<T>,
    core::ops::RangeToInclusive<T>
);

impl<T: Copy + PartialOrd> From<core::ops::RangeFull> for RangeCfg<T> {
    fn from(_: core::ops::RangeFull) -> Self {
        Self::new(..)
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

/// Configuration for a [crate::Serializer] and the [crate::Buffer]s it reads.
///
/// Every length or count read from the wire is checked against the matching
/// range before anything is allocated.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Allowed UTF-8 byte length of strings.
    pub string_len: RangeCfg<usize>,

    /// Allowed length of byte arrays.
    pub bytes_len: RangeCfg<usize>,

    /// Allowed element count of lists, sets, queues, maps and streamables.
    pub collection_len: RangeCfg<usize>,

    /// Whether resolved codecs are memoized per site.
    pub cache_codecs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            string_len: (..).into(),
            bytes_len: (..).into(),
            collection_len: (..).into(),
            cache_codecs: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::ops::Bound::{Excluded, Included, Unbounded};

    #[test]
    fn test_range_cfg_from() {
        let full: RangeCfg<usize> = (..).into();
        assert_eq!(
            full,
            RangeCfg {
                start: Unbounded,
                end: Unbounded
            }
        );

        let bounded: RangeCfg<usize> = (5..10).into();
        assert_eq!(
            bounded,
            RangeCfg {
                start: Included(5),
                end: Excluded(10)
            }
        );
    }

    #[test]
    fn test_range_cfg_contains() {
        let cfg: RangeCfg<usize> = (..=10).into();
        assert!(cfg.contains(&0));
        assert!(cfg.contains(&10));
        assert!(!cfg.contains(&11));

        let cfg: RangeCfg<usize> = (5..).into();
        assert!(!cfg.contains(&4));
        assert!(cfg.contains(&usize::MAX));

        let cfg = RangeCfg {
            start: Excluded(5),
            end: Excluded(10),
        };
        assert!(!cfg.contains(&5));
        assert!(cfg.contains(&6));
        assert!(!cfg.contains(&10));
    }

    #[test]
    fn test_contains_empty_range() {
        let cfg: RangeCfg<usize> = (5..5).into();
        assert!(!cfg.contains(&5));
    }

    #[test]
    fn test_default_config_is_unbounded() {
        let cfg = Config::default();
        assert!(cfg.string_len.contains(&usize::MAX));
        assert!(cfg.bytes_len.contains(&0));
        assert!(cfg.collection_len.contains(&1_000_000));
        assert!(cfg.cache_codecs);
    }
}
