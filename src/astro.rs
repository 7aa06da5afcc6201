//! Astronomical Calculator - lunar phase and illumination
//!
//! Mean synodic-month model anchored to the new moon of 2000-01-06 18:14 UT.
//! Pure and total over every valid date: no I/O, no ephemeris files.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::config::{CalendarConfig, ConfigurationError};
use crate::validation::POLAR_LATITUDE;

/// Mean synodic month in days.
pub const SYNODIC_MONTH: f64 = 29.530588853;

/// Julian day of the reference new moon (2000-01-06 18:14 UT).
pub const REFERENCE_NEW_MOON_JD: f64 = 2451550.26;

/// Illumination at or above which a day counts as "full moon" for the
/// full-moon-only display. Policy constant, not user-configurable.
pub const FULL_MOON_THRESHOLD: f64 = 0.95;

/// Half the moon's mean diurnal arc, in minutes.
const SEMI_DIURNAL_ARC_MINUTES: i64 = 372;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Nearest of the eight named phases for a phase angle in radians.
    pub fn from_angle(angle: f64) -> Self {
        let octant = ((angle.rem_euclid(TAU) / TAU) * 8.0 + 0.5).floor() as u32 % 8;
        match octant {
            0 => MoonPhase::New,
            1 => MoonPhase::WaxingCrescent,
            2 => MoonPhase::FirstQuarter,
            3 => MoonPhase::WaxingGibbous,
            4 => MoonPhase::Full,
            5 => MoonPhase::WaningGibbous,
            6 => MoonPhase::LastQuarter,
            _ => MoonPhase::WaningCrescent,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MoonPhase::New => "New moon",
            MoonPhase::WaxingCrescent => "Waxing crescent",
            MoonPhase::FirstQuarter => "First quarter",
            MoonPhase::WaxingGibbous => "Waxing gibbous",
            MoonPhase::Full => "Full moon",
            MoonPhase::WaningGibbous => "Waning gibbous",
            MoonPhase::LastQuarter => "Last quarter",
            MoonPhase::WaningCrescent => "Waning crescent",
        }
    }
}

/// Phase of the moon for one calendar day. Computed per render, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonSample {
    pub date: NaiveDate,
    /// Radians in `[0, 2π)`; 0 is new, π is full.
    pub phase_angle: f64,
    /// Lit fraction of the disc in `[0, 1]`.
    pub illumination: f64,
}

impl MoonSample {
    pub fn phase(&self) -> MoonPhase {
        MoonPhase::from_angle(self.phase_angle)
    }

    pub fn is_waxing(&self) -> bool {
        self.phase_angle < PI
    }

    pub fn is_near_full(&self) -> bool {
        self.illumination >= FULL_MOON_THRESHOLD
    }
}

/// Where and when the moon is observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude: f64,
    pub longitude: f64,
    /// `None` uses local solar time (longitude / 15 hours).
    pub utc_offset: Option<FixedOffset>,
    pub local_time: NaiveTime,
}

impl Observer {
    /// The configured observer, if the configuration has a location.
    pub fn from_config(config: &CalendarConfig) -> Result<Option<Self>, ConfigurationError> {
        let Some((latitude, longitude)) = config.location() else {
            return Ok(None);
        };
        Ok(Some(Self {
            latitude,
            longitude,
            utc_offset: config.utc_offset()?,
            local_time: config.parsed_observation_time()?,
        }))
    }

    /// Offset of local clock time from UTC, in minutes.
    pub fn offset_minutes(&self) -> i64 {
        match self.utc_offset {
            Some(offset) => i64::from(offset.local_minus_utc()) / 60,
            None => (self.longitude / 15.0 * 60.0).round() as i64,
        }
    }
}

/// Approximate local clock times of moonrise, transit and moonset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoonTiming {
    pub rise: NaiveTime,
    pub transit: NaiveTime,
    pub set: NaiveTime,
}

/// Julian day of an instant (Meeus, chapter 7).
pub fn julian_day(instant: DateTime<Utc>) -> f64 {
    let year = instant.year();
    let month = instant.month() as i32;
    let day = instant.day() as f64
        + instant.hour() as f64 / 24.0
        + instant.minute() as f64 / 1440.0
        + instant.second() as f64 / 86400.0;

    let (y, m) = if month <= 2 { (year - 1, month + 12) } else { (year, month) };

    let a = (y as f64 / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (y as f64 + 4716.0)).floor() + (30.6001 * (m as f64 + 1.0)).floor() + day + b - 1524.5
}

/// Fraction of the current lunation elapsed at `instant`, in `[0, 1)`.
pub fn lunation_fraction(instant: DateTime<Utc>) -> f64 {
    let elapsed = (julian_day(instant) - REFERENCE_NEW_MOON_JD) / SYNODIC_MONTH;
    let fraction = elapsed.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if fraction >= 1.0 { 0.0 } else { fraction }
}

/// `2π × (fractional elapsed synodic periods since the reference new moon)`.
pub fn phase_angle(instant: DateTime<Utc>) -> f64 {
    let angle = TAU * lunation_fraction(instant);
    if angle >= TAU { 0.0 } else { angle }
}

/// `(1 − cos(angle)) / 2`, clamped to `[0, 1]`.
pub fn illumination(angle: f64) -> f64 {
    ((1.0 - angle.cos()) / 2.0).clamp(0.0, 1.0)
}

/// UTC midnight without an observer, otherwise the observer's local
/// observation time on `date` converted to UTC.
pub fn observation_instant(date: NaiveDate, observer: Option<&Observer>) -> DateTime<Utc> {
    match observer {
        None => Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
        Some(obs) => {
            let local = date.and_time(obs.local_time);
            Utc.from_utc_datetime(&(local - Duration::minutes(obs.offset_minutes())))
        }
    }
}

pub fn moon_sample(date: NaiveDate, observer: Option<&Observer>) -> MoonSample {
    let angle = phase_angle(observation_instant(date, observer));
    MoonSample {
        date,
        phase_angle: angle,
        illumination: illumination(angle),
    }
}

/// One sample per day of `year`.
pub fn samples_for_year(year: i32, observer: Option<&Observer>) -> Vec<MoonSample> {
    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return vec![];
    };
    first
        .iter_days()
        .take_while(|d| d.year() == year)
        .map(|d| moon_sample(d, observer))
        .collect()
}

/// Rise/transit/set from the moon's lag behind the sun: it transits
/// `lunation_fraction × 24h` after local solar noon and stays up for a mean
/// semi-diurnal arc either side. Ignores declination, so expect errors of
/// an hour or more. `None` without an observer or at polar latitudes.
pub fn moon_timing(date: NaiveDate, observer: Option<&Observer>) -> Option<MoonTiming> {
    let obs = observer?;
    if obs.latitude.abs() > POLAR_LATITUDE {
        return None;
    }

    let noon = Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0)?);
    let fraction = lunation_fraction(noon);

    // Solar noon on the local clock: 12:00 shifted by zone offset minus longitude.
    let solar_noon = 720 + obs.offset_minutes() - (obs.longitude / 15.0 * 60.0).round() as i64;
    let transit = solar_noon + (fraction * 1440.0).round() as i64;

    Some(MoonTiming {
        rise: clock_time(transit - SEMI_DIURNAL_ARC_MINUTES)?,
        transit: clock_time(transit)?,
        set: clock_time(transit + SEMI_DIURNAL_ARC_MINUTES)?,
    })
}

fn clock_time(minutes: i64) -> Option<NaiveTime> {
    let wrapped = minutes.rem_euclid(1440) as u32;
    NaiveTime::from_hms_opt(wrapped / 60, wrapped % 60, 0)
}
