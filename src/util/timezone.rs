//! Site timezone policy.
//!
//! Every timestamp the service emits is rendered in one configured zone, and
//! date-only values from the content source are read as local midnight in
//! that same zone.

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::BorrowedFormatItem, format_description::well_known::{Rfc2822, Rfc3339},
    macros::format_description,
};

use crate::domain::error::DomainError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const MONTH_NAME_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none] [year]");
const MONTH_NAME_DATE_COMMA_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [year]");
const NAIVE_DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const NAIVE_DATETIME_SPACED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const OFFSET_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteTimezone {
    #[default]
    Utc,
    Fixed(UtcOffset),
    Named(Tz),
}

impl FromStr for SiteTimezone {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("utc") || value == "Z" {
            return Ok(SiteTimezone::Utc);
        }
        if value.starts_with('+') || value.starts_with('-') {
            return UtcOffset::parse(value, OFFSET_FORMAT)
                .map(SiteTimezone::Fixed)
                .map_err(|err| DomainError::validation(format!("invalid offset `{value}`: {err}")));
        }
        value
            .parse::<Tz>()
            .map(SiteTimezone::Named)
            .map_err(|err| DomainError::validation(format!("unknown timezone `{value}`: {err}")))
    }
}

impl fmt::Display for SiteTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteTimezone::Utc => f.write_str("UTC"),
            SiteTimezone::Fixed(offset) => {
                let (hours, minutes, _) = offset.as_hms();
                let sign = if offset.is_negative() { '-' } else { '+' };
                write!(f, "{sign}{:02}:{:02}", hours.abs(), minutes.abs())
            }
            SiteTimezone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl SiteTimezone {
    /// UTC offset in effect at `instant`.
    pub fn offset_at(&self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            SiteTimezone::Utc => UtcOffset::UTC,
            SiteTimezone::Fixed(offset) => *offset,
            SiteTimezone::Named(tz) => {
                let utc = instant.to_offset(UtcOffset::UTC);
                let naive = chrono::DateTime::<Utc>::from_timestamp(utc.unix_timestamp(), 0)
                    .map(|dt| dt.naive_utc())
                    .unwrap_or_default();
                let seconds = tz.offset_from_utc_datetime(&naive).fix().local_minus_utc();
                UtcOffset::from_whole_seconds(seconds).unwrap_or(UtcOffset::UTC)
            }
        }
    }

    /// Shift `instant` into the site zone.
    pub fn localize(&self, instant: OffsetDateTime) -> OffsetDateTime {
        instant.to_offset(self.offset_at(instant))
    }

    /// Interpret a wall-clock time as local to the site zone.
    pub fn assume_local(&self, local: PrimitiveDateTime) -> OffsetDateTime {
        match self {
            SiteTimezone::Utc => local.assume_utc(),
            SiteTimezone::Fixed(offset) => local.assume_offset(*offset),
            SiteTimezone::Named(tz) => {
                let offset = named_offset_for_local(*tz, local).unwrap_or(UtcOffset::UTC);
                local.assume_offset(offset)
            }
        }
    }

    /// Local midnight of `date` in the site zone.
    pub fn local_midnight(&self, date: Date) -> OffsetDateTime {
        self.assume_local(PrimitiveDateTime::new(date, Time::MIDNIGHT))
    }

    /// Parse a provider timestamp.
    ///
    /// Accepted forms are RFC 3339, RFC 2822, `2022-07-08`, `Jul 08 2022`,
    /// `Jul 8, 2022` and wall-clock datetimes without offset. Values without
    /// offset are site-local.
    pub fn parse_timestamp(&self, raw: &str) -> Option<OffsetDateTime> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
            return Some(parsed);
        }
        if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc2822) {
            return Some(parsed);
        }
        if let Ok(date) = Date::parse(raw, DATE_FORMAT)
            .or_else(|_| Date::parse(raw, MONTH_NAME_DATE_FORMAT))
            .or_else(|_| Date::parse(raw, MONTH_NAME_DATE_COMMA_FORMAT))
        {
            return Some(self.local_midnight(date));
        }
        PrimitiveDateTime::parse(raw, NAIVE_DATETIME_FORMAT)
            .or_else(|_| PrimitiveDateTime::parse(raw, NAIVE_DATETIME_SPACED_FORMAT))
            .ok()
            .map(|local| self.assume_local(local))
    }
}

fn named_offset_for_local(tz: Tz, local: PrimitiveDateTime) -> Option<UtcOffset> {
    let date = NaiveDate::from_ymd_opt(
        local.year(),
        u32::from(u8::from(local.month())),
        u32::from(local.day()),
    )?;
    let naive = date.and_hms_opt(
        u32::from(local.hour()),
        u32::from(local.minute()),
        u32::from(local.second()),
    )?;
    let resolved = tz.from_local_datetime(&naive);
    // Wall-clock times skipped by a DST jump fall back to the offset at
    // the same instant read as UTC.
    let seconds = match resolved.earliest() {
        Some(dt) => dt.offset().fix().local_minus_utc(),
        None => tz.offset_from_utc_datetime(&naive).fix().local_minus_utc(),
    };
    UtcOffset::from_whole_seconds(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};

    #[test]
    fn parses_supported_forms() {
        assert_eq!("UTC".parse::<SiteTimezone>().unwrap(), SiteTimezone::Utc);
        assert_eq!(
            "+09:00".parse::<SiteTimezone>().unwrap(),
            SiteTimezone::Fixed(offset!(+9))
        );
        assert_eq!(
            "Asia/Seoul".parse::<SiteTimezone>().unwrap(),
            SiteTimezone::Named(chrono_tz::Asia::Seoul)
        );
        assert!("Mars/Olympus".parse::<SiteTimezone>().is_err());
        assert!("+9".parse::<SiteTimezone>().is_err());
    }

    #[test]
    fn display_round_trips_fixed_offsets() {
        let tz: SiteTimezone = "-03:30".parse().unwrap();
        assert_eq!(tz.to_string(), "-03:30");
    }

    #[test]
    fn date_only_values_are_local_midnight() {
        let kst: SiteTimezone = "Asia/Seoul".parse().unwrap();
        let parsed = kst.parse_timestamp("2024-01-01").expect("date");
        assert_eq!(parsed, datetime!(2023-12-31 15:00 UTC));
        assert_eq!(parsed.offset(), offset!(+9));

        let utc = SiteTimezone::Utc.parse_timestamp("2024-01-01").expect("date");
        assert_eq!(utc, datetime!(2024-01-01 00:00 UTC));
    }

    #[test]
    fn rfc3339_values_keep_their_instant() {
        let kst: SiteTimezone = "+09:00".parse().unwrap();
        let parsed = kst
            .parse_timestamp("2024-03-05T10:20:30.000Z")
            .expect("rfc3339");
        assert_eq!(parsed, datetime!(2024-03-05 10:20:30 UTC));
        assert_eq!(kst.localize(parsed), datetime!(2024-03-05 19:20:30 +9));
    }

    #[test]
    fn named_zone_tracks_daylight_saving() {
        let ny: SiteTimezone = "America/New_York".parse().unwrap();
        assert_eq!(ny.offset_at(datetime!(2024-01-15 12:00 UTC)), offset!(-5));
        assert_eq!(ny.offset_at(datetime!(2024-07-15 12:00 UTC)), offset!(-4));
        assert_eq!(
            ny.local_midnight(date!(2024 - 07 - 15)),
            datetime!(2024-07-15 04:00 UTC)
        );
    }

    #[test]
    fn parses_month_name_dates() {
        let kst: SiteTimezone = "Asia/Seoul".parse().expect("zone");
        assert_eq!(
            SiteTimezone::Utc.parse_timestamp("Jul 08 2022"),
            Some(datetime!(2022-07-08 00:00 UTC))
        );
        assert_eq!(
            kst.parse_timestamp("Jul 8, 2022"),
            Some(datetime!(2022-07-08 00:00 +9))
        );
    }

    #[test]
    fn rfc2822_values_keep_their_instant() {
        let parsed = SiteTimezone::Utc
            .parse_timestamp("Fri, 08 Jul 2022 10:00:00 +0900")
            .expect("rfc2822");
        assert_eq!(parsed, datetime!(2022-07-08 01:00 UTC));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(SiteTimezone::Utc.parse_timestamp("next tuesday"), None);
        assert_eq!(SiteTimezone::Utc.parse_timestamp("  "), None);
    }
}
