//! Enrollment validation and pricing.
//!
//! Everything here is pure: the current instant is passed in by the caller,
//! so the same inputs always give the same terms.

use crate::domain::model::{EnrollmentRequest, EnrollmentTerms, Plan};
use crate::utils::error::{EnrollmentError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, Validate};
use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Timelike, Utc};
use rust_decimal::Decimal;

/// Offset-less shapes, read as UTC.
const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses an ISO-8601 date or date-time into UTC.
///
/// Accepts RFC 3339 with any offset, a date-time without offset and a bare
/// date (midnight).
pub fn parse_start_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(EnrollmentError::invalid_input(
            "start_date",
            "Start date is required",
        ));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(EnrollmentError::invalid_input(
        "start_date",
        format!("'{}' is not an ISO-8601 date", raw),
    ))
}

pub fn truncate_to_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    let past_the_hour = TimeDelta::seconds(i64::from(instant.minute() * 60 + instant.second()))
        + TimeDelta::nanoseconds(i64::from(instant.nanosecond()));
    instant - past_the_hour
}

/// Calendar-month addition; a day that does not exist in the target month
/// clamps to that month's last day.
pub fn add_months(start: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    start.checked_add_months(Months::new(months)).ok_or_else(|| {
        EnrollmentError::invalid_input(
            "plan.duration",
            format!("{} months after {} is out of range", months, start),
        )
    })
}

pub fn total_price(plan: &Plan) -> Result<Decimal> {
    plan.price
        .checked_mul(Decimal::from(plan.duration))
        .ok_or_else(|| EnrollmentError::invalid_input("plan.price", "Total price overflows"))
}

pub fn derive_enrollment(
    start_date_raw: &str,
    plan: &Plan,
    now: DateTime<Utc>,
) -> Result<EnrollmentTerms> {
    if plan.duration == 0 {
        return Err(EnrollmentError::invalid_input(
            "plan.duration",
            format!("Plan {} has no duration", plan.id),
        ));
    }

    let start_date = truncate_to_hour(parse_start_date(start_date_raw)?);
    if start_date < now {
        return Err(EnrollmentError::PastDate {
            start_date: start_date.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
    }

    Ok(EnrollmentTerms {
        start_date,
        end_date: add_months(start_date, plan.duration)?,
        price: total_price(plan)?,
    })
}

impl Validate for EnrollmentRequest {
    fn validate(&self) -> Result<()> {
        validate_positive_number("student_id", self.student_id.0, 1)?;
        validate_positive_number("plan_id", self.plan_id.0, 1)?;
        validate_non_empty_string("start_date", &self.start_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PlanId;
    use crate::utils::error::ErrorKind;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn plan(price: &str, duration: u32) -> Plan {
        Plan {
            id: PlanId(1),
            title: "Gold".to_string(),
            price: Decimal::from_str(price).unwrap(),
            duration,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_truncates_start_to_the_hour() {
        let now = utc(2024, 3, 1, 0, 0, 0);
        let terms = derive_enrollment("2024-03-15T10:47:33Z", &plan("100", 1), now).unwrap();
        assert_eq!(terms.start_date, utc(2024, 3, 15, 10, 0, 0));
    }

    #[test]
    fn test_drops_fractional_seconds() {
        let start = parse_start_date("2024-03-15T10:47:33.987Z").unwrap();
        assert_eq!(truncate_to_hour(start), utc(2024, 3, 15, 10, 0, 0));
    }

    #[test]
    fn test_quarterly_plan_example() {
        let now = utc(2024, 1, 1, 0, 0, 0);
        let terms = derive_enrollment("2024-01-10T09:00:00Z", &plan("129.90", 3), now).unwrap();

        assert_eq!(terms.price, Decimal::from_str("389.70").unwrap());
        assert_eq!(terms.price.to_string(), "389.70");
        assert_eq!(terms.end_date, utc(2024, 4, 10, 9, 0, 0));
    }

    #[test]
    fn test_month_overflow_clamps_to_month_end() {
        let leap = derive_enrollment("2024-01-31", &plan("10", 1), utc(2024, 1, 1, 0, 0, 0)).unwrap();
        assert_eq!(leap.end_date, utc(2024, 2, 29, 0, 0, 0));

        let common = derive_enrollment("2023-01-31", &plan("10", 1), utc(2023, 1, 1, 0, 0, 0)).unwrap();
        assert_eq!(common.end_date, utc(2023, 2, 28, 0, 0, 0));
    }

    #[test]
    fn test_year_rollover() {
        let end = add_months(utc(2024, 11, 30, 8, 0, 0), 3).unwrap();
        assert_eq!(end, utc(2025, 2, 28, 8, 0, 0));
    }

    #[test]
    fn test_rejects_past_start() {
        let now = utc(2024, 3, 15, 12, 0, 0);
        let err = derive_enrollment("2024-03-14T12:00:00Z", &plan("10", 1), now).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::PastDate));
    }

    #[test]
    fn test_rejects_start_earlier_in_the_current_hour() {
        // 10:47 truncates to 10:00, which is before 10:30.
        let now = utc(2024, 3, 15, 10, 30, 0);
        let err = derive_enrollment("2024-03-15T10:47:00Z", &plan("10", 1), now).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::PastDate));
    }

    #[test]
    fn test_accepts_start_equal_to_now() {
        let now = utc(2024, 3, 15, 10, 0, 0);
        let terms = derive_enrollment("2024-03-15T10:00:00Z", &plan("10", 1), now).unwrap();
        assert_eq!(terms.start_date, now);
    }

    #[test]
    fn test_normalizes_offsets_to_utc() {
        let start = parse_start_date("2024-03-15T10:47:33+02:00").unwrap();
        assert_eq!(start, utc(2024, 3, 15, 8, 47, 33));
    }

    #[test]
    fn test_accepts_naive_date_times() {
        assert_eq!(
            parse_start_date("2024-03-15T10:47:33").unwrap(),
            utc(2024, 3, 15, 10, 47, 33)
        );
        assert_eq!(
            parse_start_date("2024-03-15T10:47").unwrap(),
            utc(2024, 3, 15, 10, 47, 0)
        );
    }

    #[test]
    fn test_rejects_malformed_dates() {
        for raw in ["", "   ", "tomorrow", "2024-13-01", "2024-02-30T10:00:00Z", "15/03/2024"] {
            let err = parse_start_date(raw).unwrap_err();
            assert_eq!(err.kind(), Some(ErrorKind::InvalidInput), "input {:?}", raw);
        }
    }

    #[test]
    fn test_rejects_plan_without_duration() {
        let err = derive_enrollment("2030-01-01", &plan("10", 0), utc(2024, 1, 1, 0, 0, 0)).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_request_validation() {
        let request: EnrollmentRequest = serde_json::from_str(
            r#"{"student_id": 3, "plan_id": 1, "start_date": "2030-01-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let zero_student = EnrollmentRequest {
            student_id: crate::domain::model::StudentId(0),
            ..request.clone()
        };
        assert_eq!(
            zero_student.validate().unwrap_err().kind(),
            Some(ErrorKind::InvalidInput)
        );

        let blank_date = EnrollmentRequest {
            start_date: " ".to_string(),
            ..request
        };
        assert!(blank_date.validate().is_err());
    }

    #[test]
    fn test_request_rejects_client_supplied_derived_fields() {
        let payload = r#"{"student_id": 3, "plan_id": 1, "start_date": "2030-01-01", "price": "1.00"}"#;
        assert!(serde_json::from_str::<EnrollmentRequest>(payload).is_err());
    }

    #[test]
    fn test_price_is_exact_for_long_plans() {
        let terms = derive_enrollment("2030-01-01", &plan("0.10", 12), utc(2024, 1, 1, 0, 0, 0)).unwrap();
        assert_eq!(terms.price, Decimal::from_str("1.20").unwrap());
    }
}
