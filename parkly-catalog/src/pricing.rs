use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// A requested `[start, end)` reservation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Whole hours billed for this window; partial hours round up.
    pub fn billable_hours(&self) -> i64 {
        if !self.is_valid() {
            return 0;
        }
        let millis = (self.end - self.start).num_milliseconds();
        (millis + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR
    }

    /// "2 hrs 30 mins" style duration, `None` for an invalid window.
    pub fn duration_text(&self) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        let total_mins = (self.end - self.start).num_minutes();
        let hrs = total_mins / 60;
        let mins = total_mins % 60;
        Some(format!(
            "{} hr{} {} min{}",
            hrs,
            if hrs != 1 { "s" } else { "" },
            mins,
            if mins != 1 { "s" } else { "" },
        ))
    }
}

/// Total price in major units: `ceil(hours) * rate`, or zero for an invalid
/// window or a negative rate.
pub fn price(rate: Decimal, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let window = TimeWindow::new(start, end);
    if !window.is_valid() || rate.is_sign_negative() {
        return Decimal::ZERO;
    }
    rate * Decimal::from(window.billable_hours())
}

/// Convert a major-unit amount to the integer minor units the payment
/// endpoint expects. `None` if the amount does not fit.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64()
}

/// Price breakdown shown next to the booking form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub rate: Decimal,
    pub billable_hours: i64,
    pub total: Decimal,
}

impl Quote {
    pub fn for_window(rate: Decimal, window: &TimeWindow) -> Self {
        Self {
            rate,
            billable_hours: window.billable_hours(),
            total: price(rate, window.start, window.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_partial_hour_rounds_up() {
        // 10:00 -> 12:30 is 2.5h, billed as 3h
        assert_eq!(price(Decimal::from(100), at(10, 0), at(12, 30)), Decimal::from(300));
    }

    #[test]
    fn test_exact_hours_not_rounded() {
        assert_eq!(price(Decimal::from(100), at(10, 0), at(12, 0)), Decimal::from(200));
        assert_eq!(price(Decimal::from(100), at(10, 0), at(10, 1)), Decimal::from(100));
    }

    #[test]
    fn test_invalid_window_is_free() {
        assert_eq!(price(Decimal::from(100), at(12, 0), at(10, 0)), Decimal::ZERO);
        assert_eq!(price(Decimal::from(100), at(10, 0), at(10, 0)), Decimal::ZERO);
        assert_eq!(price(Decimal::from(-5), at(10, 0), at(11, 0)), Decimal::ZERO);
    }

    #[test]
    fn test_price_matches_ceil_formula_over_many_windows() {
        let rate = Decimal::new(1250, 2); // 12.50/hr
        let start = at(8, 0);
        for minutes in 1..=(48 * 60) {
            let end = start + Duration::minutes(minutes);
            let expected_hours = (minutes + 59) / 60;
            let total = price(rate, start, end);
            assert_eq!(total, rate * Decimal::from(expected_hours), "minutes = {}", minutes);
            assert!(!total.is_sign_negative());
        }
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(Decimal::from(300)), Some(30000));
        assert_eq!(to_minor_units(Decimal::new(1250, 2)), Some(1250));
    }

    #[test]
    fn test_duration_text() {
        assert_eq!(TimeWindow::new(at(10, 0), at(12, 30)).duration_text().unwrap(), "2 hrs 30 mins");
        assert_eq!(TimeWindow::new(at(10, 0), at(11, 1)).duration_text().unwrap(), "1 hr 1 min");
        assert!(TimeWindow::new(at(11, 0), at(10, 0)).duration_text().is_none());
    }

    #[test]
    fn test_quote() {
        let quote = Quote::for_window(Decimal::from(100), &TimeWindow::new(at(10, 0), at(12, 30)));
        assert_eq!(quote.billable_hours, 3);
        assert_eq!(quote.total, Decimal::from(300));
    }
}
