use chrono::{DateTime, Duration, Utc};
use parkly_catalog::{
    price, AvailabilityError, AvailabilityKey, AvailabilityStatus, AvailabilityTicket, AvailabilityTracker,
    Resolution, TimeWindow,
};
use parkly_core::payment::PaymentMethod;
use rust_decimal::Decimal;
use tracing::debug;

use crate::orchestrator::CommitRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftStep {
    #[default]
    Details,
    Payment,
}

/// First rule a draft breaks, in the order the form checks them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select end date & time.")]
    MissingEndTime,

    #[error("End time must be after start time.")]
    InvalidWindow,

    #[error("Start time must be at least {lead_hours} hours from now.")]
    StartTooSoon { lead_hours: i64 },

    #[error("Selected time slot is not available.")]
    NotAvailable,

    #[error("Please enter your vehicle number.")]
    MissingVehicleNumber,

    #[error("Please select a payment card.")]
    MissingPaymentMethod,
}

impl ValidationError {
    /// Short heading for the alert that carries the message.
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::MissingEndTime => "Select End Time",
            ValidationError::InvalidWindow => "Invalid Time",
            ValidationError::StartTooSoon { .. } => "Invalid Start Time",
            ValidationError::NotAvailable => "Not Available",
            ValidationError::MissingVehicleNumber => "Missing Info",
            ValidationError::MissingPaymentMethod => "Select Payment Method",
        }
    }
}

/// An in-progress booking form for one listing.
///
/// Mutations that change the window hand back an [`AvailabilityTicket`] when
/// a fresh availability check is needed; the caller runs the query and feeds
/// the answer back through [`BookingDraft::apply_availability`].
#[derive(Debug)]
pub struct BookingDraft {
    parking_id: i64,
    rate: Option<Decimal>,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    vehicle_number: String,
    payment_method: Option<PaymentMethod>,
    availability: AvailabilityTracker,
    step: DraftStep,
    min_lead: Duration,
}

impl BookingDraft {
    pub fn new(parking_id: i64, now: DateTime<Utc>, min_lead: Duration) -> Self {
        Self {
            parking_id,
            rate: None,
            start: now,
            end: None,
            vehicle_number: String::new(),
            payment_method: None,
            availability: AvailabilityTracker::new(),
            step: DraftStep::Details,
            min_lead,
        }
    }

    pub fn parking_id(&self) -> i64 {
        self.parking_id
    }

    pub fn set_rate(&mut self, rate: Decimal) {
        self.rate = Some(rate);
    }

    pub fn rate(&self) -> Option<Decimal> {
        self.rate
    }

    /// Rejects a start inside the lead time and keeps the previous value.
    /// A start at or after the current end clears the end.
    pub fn set_start(
        &mut self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<AvailabilityTicket>, ValidationError> {
        if start < now + self.min_lead {
            return Err(self.start_too_soon());
        }
        self.start = start;
        if matches!(self.end, Some(end) if start >= end) {
            debug!("Start moved past end; clearing end time");
            self.end = None;
        }
        Ok(self.refresh_availability())
    }

    pub fn set_end(&mut self, end: DateTime<Utc>) -> Option<AvailabilityTicket> {
        self.end = Some(end);
        self.refresh_availability()
    }

    pub fn clear_end(&mut self) {
        self.end = None;
        self.availability.invalidate();
    }

    /// New ticket for the current window, or `None` when nothing is checkable.
    pub fn refresh_availability(&mut self) -> Option<AvailabilityTicket> {
        match self.window() {
            Some(window) if window.is_valid() => Some(self.availability.request(AvailabilityKey {
                parking_id: self.parking_id,
                window,
            })),
            _ => {
                self.availability.invalidate();
                None
            }
        }
    }

    pub fn apply_availability(
        &mut self,
        ticket: &AvailabilityTicket,
        result: Result<bool, AvailabilityError>,
    ) -> Resolution {
        self.availability.resolve(ticket, result)
    }

    pub fn set_vehicle_number(&mut self, vehicle_number: impl Into<String>) {
        self.vehicle_number = vehicle_number.into();
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
    }

    pub fn payment_method(&self) -> Option<&PaymentMethod> {
        self.payment_method.as_ref()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn window(&self) -> Option<TimeWindow> {
        self.end.map(|end| TimeWindow::new(self.start, end))
    }

    pub fn availability(&self) -> AvailabilityStatus {
        self.availability.status()
    }

    pub fn is_checking_availability(&self) -> bool {
        self.availability.is_checking()
    }

    pub fn availability_error(&self) -> Option<&str> {
        self.availability.last_error()
    }

    pub fn step(&self) -> DraftStep {
        self.step
    }

    /// Zero until both a rate and a valid window are known.
    pub fn total_price(&self) -> Decimal {
        match (self.rate, self.end) {
            (Some(rate), Some(end)) => price(rate, self.start, end),
            _ => Decimal::ZERO,
        }
    }

    pub fn duration_text(&self) -> Option<String> {
        self.window().and_then(|w| w.duration_text())
    }

    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let end = self.end.ok_or(ValidationError::MissingEndTime)?;
        if self.start >= end {
            return Err(ValidationError::InvalidWindow);
        }
        if self.start < now + self.min_lead {
            return Err(self.start_too_soon());
        }
        if self.availability.status() != AvailabilityStatus::Available {
            return Err(ValidationError::NotAvailable);
        }
        if self.vehicle_number.trim().is_empty() {
            return Err(ValidationError::MissingVehicleNumber);
        }
        Ok(())
    }

    pub fn can_submit(&self, now: DateTime<Utc>) -> bool {
        self.rate.is_some() && self.validate(now).is_ok()
    }

    pub fn proceed_to_payment(&mut self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.validate(now)?;
        self.step = DraftStep::Payment;
        Ok(())
    }

    pub fn back_to_details(&mut self) {
        self.step = DraftStep::Details;
    }

    /// Everything the committer needs; re-validates against `now`.
    pub fn commit_request(&self, user_id: i64, now: DateTime<Utc>) -> Result<CommitRequest, ValidationError> {
        self.validate(now)?;
        let method = self
            .payment_method
            .clone()
            .ok_or(ValidationError::MissingPaymentMethod)?;
        let window = self.window().ok_or(ValidationError::MissingEndTime)?;
        Ok(CommitRequest {
            user_id,
            parking_id: self.parking_id,
            window,
            vehicle_number: self.vehicle_number.trim().to_string(),
            total_price: self.total_price(),
            payment_method: method,
        })
    }

    fn start_too_soon(&self) -> ValidationError {
        ValidationError::StartTooSoon {
            lead_hours: self.min_lead.num_hours(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use parkly_shared::Masked;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, 6, 0, 0).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, hour, minute, 0).unwrap()
    }

    fn card() -> PaymentMethod {
        PaymentMethod {
            id: "local-1".into(),
            token: Masked::new("pm_123".to_string()),
            brand: "Visa".into(),
            last4: "4242".into(),
            exp_month: 12,
            exp_year: 2030,
        }
    }

    fn ready_draft() -> BookingDraft {
        let mut draft = BookingDraft::new(7, now(), Duration::hours(2));
        draft.set_rate(Decimal::from(100));
        draft.set_start(at(10, 0), now()).unwrap();
        let ticket = draft.set_end(at(12, 30)).unwrap();
        assert_eq!(draft.apply_availability(&ticket, Ok(true)), Resolution::Applied(AvailabilityStatus::Available));
        draft.set_vehicle_number("ABC-123");
        draft
    }

    #[test]
    fn test_ready_draft_can_submit() {
        let draft = ready_draft();
        assert!(draft.can_submit(now()));
        assert_eq!(draft.total_price(), Decimal::from(300));
        assert_eq!(draft.duration_text().as_deref(), Some("2 hrs 30 mins"));
    }

    #[test]
    fn test_unavailable_blocks_submit() {
        let mut draft = ready_draft();
        let ticket = draft.set_end(at(13, 0)).unwrap();
        assert_eq!(draft.availability(), AvailabilityStatus::Unknown);
        assert!(!draft.can_submit(now()));

        draft.apply_availability(&ticket, Ok(false));
        assert_eq!(draft.validate(now()), Err(ValidationError::NotAvailable));
    }

    #[test]
    fn test_blank_vehicle_number_blocks_submit() {
        let mut draft = ready_draft();
        draft.set_vehicle_number("   ");
        assert_eq!(draft.validate(now()), Err(ValidationError::MissingVehicleNumber));
        assert_eq!(draft.validate(now()).unwrap_err().title(), "Missing Info");
    }

    #[test]
    fn test_start_inside_lead_time_rejected() {
        let mut draft = ready_draft();
        let err = draft.set_start(at(7, 0), now()).unwrap_err();
        assert_eq!(err, ValidationError::StartTooSoon { lead_hours: 2 });
        assert_eq!(err.to_string(), "Start time must be at least 2 hours from now.");
        // Previous start kept, availability untouched.
        assert_eq!(draft.start(), at(10, 0));
        assert!(draft.can_submit(now()));
    }

    #[test]
    fn test_lead_time_rechecked_at_submit() {
        let draft = ready_draft();
        let later = at(9, 0);
        assert_eq!(draft.validate(later), Err(ValidationError::StartTooSoon { lead_hours: 2 }));
    }

    #[test]
    fn test_start_past_end_clears_end() {
        let mut draft = ready_draft();
        let ticket = draft.set_start(at(13, 0), now()).unwrap();
        assert!(ticket.is_none());
        assert!(draft.end().is_none());
        assert_eq!(draft.availability(), AvailabilityStatus::Unknown);
        assert_eq!(draft.validate(now()), Err(ValidationError::MissingEndTime));
        assert_eq!(draft.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_end_before_start_is_invalid_window() {
        let mut draft = ready_draft();
        assert!(draft.set_end(at(9, 0)).is_none());
        assert_eq!(draft.validate(now()), Err(ValidationError::InvalidWindow));
        assert_eq!(draft.validate(now()).unwrap_err().title(), "Invalid Time");
    }

    #[test]
    fn test_stale_answer_does_not_enable_submit() {
        let mut draft = ready_draft();
        let old = draft.set_end(at(14, 0)).unwrap();
        let new = draft.set_end(at(15, 0)).unwrap();

        assert_eq!(draft.apply_availability(&old, Ok(true)), Resolution::Stale);
        assert!(!draft.can_submit(now()));

        draft.apply_availability(&new, Ok(false));
        assert!(!draft.can_submit(now()));
    }

    #[test]
    fn test_missing_rate_blocks_submit() {
        let mut draft = BookingDraft::new(7, now(), Duration::hours(2));
        draft.set_start(at(10, 0), now()).unwrap();
        let ticket = draft.set_end(at(11, 0)).unwrap();
        draft.apply_availability(&ticket, Ok(true));
        draft.set_vehicle_number("ABC-123");
        assert!(draft.validate(now()).is_ok());
        assert!(!draft.can_submit(now()));
    }

    #[test]
    fn test_payment_step_and_commit_request() {
        let mut draft = ready_draft();
        draft.proceed_to_payment(now()).unwrap();
        assert_eq!(draft.step(), DraftStep::Payment);

        assert_eq!(draft.commit_request(5, now()).unwrap_err(), ValidationError::MissingPaymentMethod);

        draft.select_payment_method(card());
        draft.set_vehicle_number("  ABC-123 ");
        let request = draft.commit_request(5, now()).unwrap();
        assert_eq!(request.vehicle_number, "ABC-123");
        assert_eq!(request.total_price, Decimal::from(300));
        assert_eq!(request.window, TimeWindow::new(at(10, 0), at(12, 30)));

        draft.back_to_details();
        assert_eq!(draft.step(), DraftStep::Details);
    }

    #[test]
    fn test_proceed_reports_first_failure() {
        let mut draft = BookingDraft::new(7, now(), Duration::hours(2));
        assert_eq!(draft.proceed_to_payment(now()), Err(ValidationError::MissingEndTime));
        assert_eq!(draft.step(), DraftStep::Details);
    }
}
