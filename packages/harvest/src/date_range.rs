//! Date preset → concrete date window.

use chrono::{Datelike as _, Days, NaiveDate};
use report_harvest_models::{DatePreset, PresetKind, ResolvedRange};

use crate::ConfigError;
use crate::clock::Clock;

/// Checks that `preset` carries the fields its kind requires.
///
/// # Errors
///
/// Returns [`ConfigError`] if a relative-days preset has no positive
/// `value`, or an explicit preset lacks `start` or `end`.
pub fn validate_preset(preset: &DatePreset) -> Result<(), ConfigError> {
    match preset.kind {
        PresetKind::RelativeDays => match preset.value {
            None => Err(ConfigError::MissingValue(preset.key.clone())),
            Some(0) => Err(ConfigError::NonPositiveValue(preset.key.clone())),
            Some(_) => Ok(()),
        },
        PresetKind::Explicit if preset.start.is_none() || preset.end.is_none() => {
            Err(ConfigError::MissingBounds(preset.key.clone()))
        }
        PresetKind::ThisPeriod | PresetKind::LastPeriod | PresetKind::Explicit => Ok(()),
    }
}

/// Resolves `preset` against `today`.
///
/// * relative-days(n): `today - (n - 1)` through `today`
/// * this-period: first of the current month through `today`
/// * last-period: the whole previous calendar month
/// * explicit: the configured `start`/`end`, in whatever order they were
///   given
///
/// # Errors
///
/// Returns [`ConfigError`] if the preset is malformed (see
/// [`validate_preset`]).
pub fn resolve_date_range(preset: &DatePreset, today: NaiveDate) -> Result<ResolvedRange, ConfigError> {
    validate_preset(preset)?;

    let range = match preset.kind {
        PresetKind::RelativeDays => {
            let n = preset
                .value
                .ok_or_else(|| ConfigError::MissingValue(preset.key.clone()))?;
            let start = today
                .checked_sub_days(Days::new(u64::from(n) - 1))
                .ok_or_else(|| ConfigError::NonPositiveValue(preset.key.clone()))?;
            ResolvedRange { start, end: today }
        }
        PresetKind::ThisPeriod => ResolvedRange {
            start: first_of_month(today),
            end: today,
        },
        PresetKind::LastPeriod => {
            let end = first_of_month(today) - Days::new(1);
            ResolvedRange {
                start: first_of_month(end),
                end,
            }
        }
        PresetKind::Explicit => match (preset.start, preset.end) {
            (Some(start), Some(end)) => ResolvedRange { start, end },
            _ => return Err(ConfigError::MissingBounds(preset.key.clone())),
        },
    };

    Ok(range)
}

/// Resolves `preset` against `clock`'s current date.
///
/// # Errors
///
/// See [`resolve_date_range`].
pub fn resolve_with_clock(preset: &DatePreset, clock: &impl Clock) -> Result<ResolvedRange, ConfigError> {
    resolve_date_range(preset, clock.today())
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}
