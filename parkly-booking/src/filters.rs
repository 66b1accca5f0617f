use chrono::{DateTime, Duration, Utc};
use std::str::FromStr;

use crate::models::{Booking, BookingStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(BookingStatus),
}

impl StatusFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => booking.status == *status,
        }
    }

    pub fn apply<'a>(&self, bookings: &'a [Booking]) -> Vec<&'a Booking> {
        bookings.iter().filter(|b| self.matches(b)).collect()
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Ok(StatusFilter::All),
            "CONFIRMED" => Ok(StatusFilter::Only(BookingStatus::Confirmed)),
            "COMPLETED" => Ok(StatusFilter::Only(BookingStatus::Completed)),
            "CANCELLED" => Ok(StatusFilter::Only(BookingStatus::Cancelled)),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}

/// Host-side filter on when a booking was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    All,
    Today,
    Yesterday,
    LastSevenDays,
}

impl DateFilter {
    /// Bookings without a creation date only pass `All`.
    pub fn matches(&self, booking: &Booking, now: DateTime<Utc>) -> bool {
        let created = match (self, booking.created_at) {
            (DateFilter::All, _) => return true,
            (_, None) => return false,
            (_, Some(created)) => created,
        };
        match self {
            DateFilter::All => true,
            DateFilter::Today => created.date_naive() == now.date_naive(),
            DateFilter::Yesterday => created.date_naive() == (now - Duration::days(1)).date_naive(),
            DateFilter::LastSevenDays => created >= now - Duration::days(7),
        }
    }
}

impl FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "ALL" => Ok(DateFilter::All),
            "TODAY" => Ok(DateFilter::Today),
            "YESTERDAY" => Ok(DateFilter::Yesterday),
            "LAST_7_DAYS" => Ok(DateFilter::LastSevenDays),
            other => Err(format!("unknown date filter: {}", other)),
        }
    }
}

/// Host listing view: both filters, soonest start first.
pub fn host_view(bookings: &[Booking], status: StatusFilter, date: DateFilter, now: DateTime<Utc>) -> Vec<Booking> {
    let mut view: Vec<Booking> = bookings
        .iter()
        .filter(|b| date.matches(b, now) && status.matches(b))
        .cloned()
        .collect();
    view.sort_by_key(|b| b.start_time);
    view
}
