use bon::Builder;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime};

use crate::cert::params::Validity;
use crate::error::{DevCertError, Result};

/// Longest leaf validity accepted by Apple platforms and most browsers.
pub const LEAF_MAX_DAYS: i64 = 825;
pub const ROOT_DEFAULT_YEARS: u32 = 10;

/// An explicit lifetime in calendar units. All zero means "use the default",
/// which is one year and one month.
#[derive(Debug, Clone, Copy, Default, Builder, PartialEq, Eq)]
pub struct LifetimeRequest {
    #[builder(default)]
    pub years: i32,
    #[builder(default)]
    pub months: i32,
    #[builder(default)]
    pub days: i32,
}

impl LifetimeRequest {
    pub fn is_default(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }
}

/// Which kind of certificate an issued validity window is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuedTier {
    Intermediate,
    Leaf,
}

/// A validity window after clamping against the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedValidity {
    pub validity: Validity,
    /// The requested notAfter was past the parent's and has been cut back to it.
    pub reduced: bool,
}

fn invalid_date(e: time::error::ComponentRange) -> DevCertError {
    DevCertError::ValidationError(format!("validity out of range: {e}"))
}

/// Calendar addition where overflowing months and days roll into the next unit,
/// so 31 January plus one month is 3 March (2 March in leap years).
pub fn add_date(at: OffsetDateTime, years: i32, months: i32, days: i32) -> Result<OffsetDateTime> {
    let total_months = at.year() as i64 * 12
        + (at.month() as i64 - 1)
        + years as i64 * 12
        + months as i64;
    let year = i32::try_from(total_months.div_euclid(12)).map_err(|_| {
        DevCertError::ValidationError(format!("{years} years is out of range"))
    })?;
    let month = Month::try_from((total_months.rem_euclid(12) + 1) as u8).map_err(invalid_date)?;
    let first = Date::from_calendar_date(year, month, 1).map_err(invalid_date)?;
    let offset_days = at.day() as i64 - 1 + days as i64;
    let date = first
        .checked_add(Duration::days(offset_days))
        .ok_or_else(|| DevCertError::ValidationError(format!("{days} days is out of range")))?;
    Ok(PrimitiveDateTime::new(date, at.time()).assume_offset(at.offset()))
}

fn whole_seconds(at: OffsetDateTime) -> Result<OffsetDateTime> {
    at.replace_nanosecond(0).map_err(invalid_date)
}

/// Validity for a self-signed root: `years` (default ten) from `now`, never clamped.
pub fn root_validity(now: OffsetDateTime, years: Option<u32>) -> Result<Validity> {
    let now = whole_seconds(now)?;
    let years = i32::try_from(years.filter(|y| *y != 0).unwrap_or(ROOT_DEFAULT_YEARS))
        .map_err(|_| DevCertError::ValidationError("root validity is out of range".to_string()))?;
    Ok(Validity {
        not_before: now,
        not_after: add_date(now, years, 0, 0)?,
    })
}

/// Validity for an intermediate or leaf signed by a parent expiring at `parent_not_after`.
///
/// Leaf requests above [`LEAF_MAX_DAYS`] are rejected before the parent clamp.
pub fn issued_validity(
    now: OffsetDateTime,
    tier: IssuedTier,
    request: &LifetimeRequest,
    parent_not_after: OffsetDateTime,
) -> Result<ClampedValidity> {
    let not_before = whole_seconds(now)?;
    let requested = if request.is_default() {
        add_date(not_before, 1, 1, 0)?
    } else {
        add_date(not_before, request.years, request.months, request.days)?
    };

    if requested <= not_before {
        return Err(DevCertError::ValidationError(format!(
            "requested validity ends at {requested}, which is not after {not_before}"
        )));
    }
    if tier == IssuedTier::Leaf && requested - not_before > Duration::days(LEAF_MAX_DAYS) {
        return Err(DevCertError::ValidationError(format!(
            "leaf certificates may be valid for at most {LEAF_MAX_DAYS} days"
        )));
    }

    let parent_not_after = whole_seconds(parent_not_after)?;
    let (not_after, reduced) = if requested > parent_not_after {
        (parent_not_after, true)
    } else {
        (requested, false)
    };
    if not_after <= not_before {
        return Err(DevCertError::ValidationError(format!(
            "the issuing certificate expired at {parent_not_after}"
        )));
    }

    Ok(ClampedValidity {
        validity: Validity {
            not_before,
            not_after,
        },
        reduced,
    })
}
