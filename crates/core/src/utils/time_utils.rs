use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Exchange timezone used to derive trade dates.
/// This is the canonical timezone used to convert UTC instants to trade dates.
/// Allocations are keyed to the US equity session, so America/New_York applies.
pub const EXCHANGE_TZ: Tz = chrono_tz::America::New_York;

/// Derives the trade date from a sent timestamp.
///
/// This is the single source of truth for converting instants to trade dates:
/// the UTC instant is projected into the exchange timezone and truncated to
/// the local calendar date.
pub fn trade_date_from_sent(sent_timestamp: DateTime<Utc>) -> NaiveDate {
    sent_timestamp.with_timezone(&EXCHANGE_TZ).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn mid_session_timestamp_maps_to_same_date() {
        let sent = Utc.with_ymd_and_hms(2024, 1, 15, 15, 1, 0).unwrap();
        assert_eq!(
            trade_date_from_sent(sent),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn utc_just_after_midnight_is_previous_eastern_date() {
        // 02:00 UTC is 21:00 (previous day) in New York during EST.
        let sent = Utc.with_ymd_and_hms(2024, 1, 16, 2, 0, 0).unwrap();
        assert_eq!(
            trade_date_from_sent(sent),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn dst_offset_is_respected() {
        // 03:30 UTC in July is 23:30 (previous day) EDT, not 22:30 EST.
        let sent = Utc.with_ymd_and_hms(2024, 7, 10, 3, 30, 0).unwrap();
        assert_eq!(
            trade_date_from_sent(sent),
            NaiveDate::from_ymd_opt(2024, 7, 9).unwrap()
        );
    }
}
