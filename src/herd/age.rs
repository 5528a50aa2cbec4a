use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::entities::animal::{self, Sex};

/// Average month length used to bucket weight observations by age.
pub const DAYS_PER_MONTH: f64 = 30.44;
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Animals younger than this are labelled calves regardless of sex.
pub const CALF_MAX_MONTHS: u32 = 12;
/// Females at or past this age count as cows even without recorded offspring.
pub const COW_MIN_MONTHS: u32 = 24;

/// Whole calendar months between `dob` and `today`.
///
/// `None` when the date of birth is unknown. A birth date in the future
/// yields 0 rather than a negative age.
pub fn age_in_months(dob: Option<NaiveDate>, today: NaiveDate) -> Option<u32> {
    let dob = dob?;
    let mut months =
        (today.year() - dob.year()) * 12 + today.month() as i32 - dob.month() as i32;
    if today.day() < dob.day() {
        months -= 1;
    }
    Some(months.max(0) as u32)
}

pub fn age_in_years(dob: NaiveDate, today: NaiveDate) -> f64 {
    (today - dob).num_days() as f64 / DAYS_PER_YEAR
}

/// Age bucket of an observation taken on `measured_at`; `None` if it predates birth.
pub fn age_months_at(dob: NaiveDate, measured_at: NaiveDate) -> Option<u32> {
    let days = (measured_at - dob).num_days();
    if days < 0 {
        return None;
    }
    Some((days as f64 / DAYS_PER_MONTH).floor() as u32)
}

/// Presentation-only label shown in herd summaries. Never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleLabel {
    Cow,
    Bull,
    Steer,
    Heifer,
    Calf,
}

pub fn role_label(animal: &animal::Model, has_offspring: bool, today: NaiveDate) -> RoleLabel {
    let months = age_in_months(animal.date_of_birth, today);
    if matches!(months, Some(m) if m < CALF_MAX_MONTHS) {
        return RoleLabel::Calf;
    }
    match animal.sex {
        Sex::Male if animal.castrated => RoleLabel::Steer,
        Sex::Male => RoleLabel::Bull,
        Sex::Female if has_offspring || matches!(months, Some(m) if m >= COW_MIN_MONTHS) => {
            RoleLabel::Cow
        }
        Sex::Female => RoleLabel::Heifer,
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
