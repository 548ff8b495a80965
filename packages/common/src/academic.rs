//! Closed vocabularies of the academic records: profiles, the weekly class
//! routine, schedules and coursework.

#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "male"))]
    Male,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "female"))]
    Female,
}

/// Which half of the teaching day a student attends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum Shift {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Day"))]
    Day,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Evening"))]
    Evening,
}

/// The kind of a piece of coursework announced to a cohort.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum CourseworkKind {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "assignment"))]
    Assignment,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "lab_report"))]
    LabReport,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "presentation"))]
    Presentation,
}

impl CourseworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::LabReport => "lab_report",
            Self::Presentation => "presentation",
        }
    }
}

/// A day of the weekly class routine. The academic week starts on Saturday.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum RoutineDay {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "sat"))]
    Sat,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "sun"))]
    Sun,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "mon"))]
    Mon,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "tue"))]
    Tue,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "wed"))]
    Wed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "thu"))]
    Thu,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "fri"))]
    Fri,
}

impl RoutineDay {
    /// Position in the academic week, Saturday first.
    pub fn position(&self) -> u8 {
        match self {
            Self::Sat => 0,
            Self::Sun => 1,
            Self::Mon => 2,
            Self::Tue => 3,
            Self::Wed => 4,
            Self::Thu => 5,
            Self::Fri => 6,
        }
    }
}

/// One of the fixed teaching periods of the routine grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum ClassPeriod {
    #[serde(rename = "08:00AMto09:15AM")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "08:00AMto09:15AM"))]
    First,
    #[serde(rename = "09:15AMto10:30AM")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "09:15AMto10:30AM"))]
    Second,
    #[serde(rename = "10:30AMto11:45AM")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "10:30AMto11:45AM"))]
    Third,
    #[serde(rename = "11:45AMto01:00PM")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "11:45AMto01:00PM"))]
    Fourth,
    #[serde(rename = "01:30PMto02:45PM")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "01:30PMto02:45PM"))]
    Fifth,
    #[serde(rename = "02:45PMto04:00PM")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "02:45PMto04:00PM"))]
    Sixth,
    #[serde(rename = "04:00PMto05:15PM")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "04:00PMto05:15PM"))]
    Seventh,
    #[serde(rename = "05:15PMto06:30PM")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "05:15PMto06:30PM"))]
    Eighth,
}

impl ClassPeriod {
    pub fn position(&self) -> u8 {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
            Self::Fourth => 3,
            Self::Fifth => 4,
            Self::Sixth => 5,
            Self::Seventh => 6,
            Self::Eighth => 7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// A recurring meeting of a schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TimeSlot {
    pub day: Weekday,
    /// 24-hour `H:MM` or `HH:MM`.
    #[serde(alias = "startTime")]
    #[schema(example = "08:00")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    #[schema(example = "09:15")]
    pub end_time: String,
    #[serde(default)]
    pub room: Option<String>,
}

/// Minutes since midnight of a 24-hour `H:MM`/`HH:MM` clock time.
pub fn clock_minutes(value: &str) -> Option<u16> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    if !hours.chars().chain(minutes.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

impl TimeSlot {
    /// Both ends are valid clock times and the slot does not end before it starts.
    pub fn is_well_formed(&self) -> bool {
        match (clock_minutes(&self.start_time), clock_minutes(&self.end_time)) {
            (Some(start), Some(end)) => start <= end,
            _ => false,
        }
    }
}
