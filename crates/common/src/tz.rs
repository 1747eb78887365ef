use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone};

/// Attaches a configured fixed civil offset to naive source timestamps.
///
/// The wall clock is preserved exactly: `2024-01-01T00:00:00` localized with
/// `-03:00` becomes `2024-01-01T00:00:00-03:00`, not a shifted instant. The
/// source connector emits zone-less timestamps, and the store wants
/// `timestamptz`; this is where the zone gets pinned on.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneNormalizer {
    offset: FixedOffset,
}

impl TimezoneNormalizer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parses an offset of the form `+09:00` / `-03:00`.
    pub fn parse(offset: &str) -> Result<Self, chrono::ParseError> {
        offset.parse::<FixedOffset>().map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<FixedOffset> {
        match self.offset.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
            // A fixed offset has no gaps; unreachable for well-formed input.
            LocalResult::None => DateTime::from_naive_utc_and_offset(naive - self.offset, self.offset),
        }
    }

    pub fn localize_opt(&self, naive: Option<NaiveDateTime>) -> Option<DateTime<FixedOffset>> {
        naive.map(|n| self.localize(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike};

    #[test]
    fn localize_keeps_wall_clock() {
        let tz = TimezoneNormalizer::parse("-03:00").unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let zoned = tz.localize(naive);
        assert_eq!(zoned.year(), 2024);
        assert_eq!(zoned.month(), 1);
        assert_eq!(zoned.day(), 1);
        assert_eq!(zoned.hour(), 0);
        assert_eq!(zoned.minute(), 0);
        assert_eq!(zoned.second(), 0);
        assert_eq!(zoned.offset().local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn localize_shifts_the_instant_not_the_clock() {
        let tz = TimezoneNormalizer::parse("+09:00").unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 30, 45)
            .unwrap();
        let zoned = tz.localize(naive);
        assert_eq!(zoned.naive_local(), naive);
        assert_eq!(zoned.naive_utc(), naive - chrono::Duration::hours(9));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(TimezoneNormalizer::parse("sao-paulo").is_err());
    }
}
