//! Display formatting shared by the project views.
//!
//! Numbers and dates follow Russian locale conventions: thousands are grouped
//! with a no-break space, the decimal separator is a comma, and long dates
//! use genitive month names followed by `г.`.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::Serialize;

use crate::models::ProjectStatus;

pub const CURRENCY_SUFFIX: &str = "₸";

const GROUP_SEPARATOR: char = '\u{a0}';
const DECIMAL_SEPARATOR: char = ',';
const MAX_FRACTION_DIGITS: usize = 3;

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Colour family used for badges and progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Emerald,
    Amber,
    Blue,
    Gray,
    Red,
}

impl Tone {
    fn name(&self) -> &'static str {
        match self {
            Tone::Emerald => "emerald",
            Tone::Amber => "amber",
            Tone::Blue => "blue",
            Tone::Gray => "gray",
            Tone::Red => "red",
        }
    }

    /// Class pair for a status badge, e.g. `bg-emerald-100 text-emerald-800`.
    pub fn badge_class(&self) -> String {
        format!("bg-{0}-100 text-{0}-800", self.name())
    }

    /// Class for a progress bar fill, e.g. `bg-red-500`.
    pub fn bar_class(&self) -> String {
        format!("bg-{}-500", self.name())
    }
}

pub fn status_label(status: &ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Building => "Строительство",
        ProjectStatus::Deposit => "Задаток",
        ProjectStatus::Built => "Построен",
        ProjectStatus::Unknown(_) => "Неизвестно",
    }
}

pub fn status_tone(status: &ProjectStatus) -> Tone {
    match status {
        ProjectStatus::Building => Tone::Emerald,
        ProjectStatus::Deposit => Tone::Amber,
        ProjectStatus::Built => Tone::Blue,
        ProjectStatus::Unknown(_) => Tone::Gray,
    }
}

/// Tier of a progress value: below 30 red, below 70 amber, otherwise emerald.
pub fn progress_tone(progress: f64) -> Tone {
    if progress < 30.0 {
        Tone::Red
    } else if progress < 70.0 {
        Tone::Amber
    } else {
        Tone::Emerald
    }
}

pub fn progress_label(progress: f64) -> String {
    format!("{}%", progress.round() as i64)
}

/// Group digits in threes, at most three fraction digits, trailing zeros dropped.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "не число".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + integer.len() / 3 + 1);
    if value < 0.0 && (integer != "0" || !fraction.is_empty()) {
        out.push('-');
    }
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(digit);
    }
    if !fraction.is_empty() {
        out.push(DECIMAL_SEPARATOR);
        out.push_str(fraction);
    }
    out
}

pub fn format_money(amount: f64) -> String {
    format!("{} {}", format_number(amount), CURRENCY_SUFFIX)
}

/// Long calendar date: `15 февраля 2024 г.`
pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{} {} {} г.",
        date.day(),
        MONTHS_GENITIVE[date.month0() as usize],
        date.year()
    )
}

/// Long calendar date of a timestamp as seen in `tz`.
pub fn format_date_in<Tz: TimeZone, Target: TimeZone>(
    moment: &DateTime<Tz>,
    tz: &Target,
) -> String {
    format_date(moment.with_timezone(tz).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn statuses_map_to_labels_and_tones() {
        assert_eq!(status_label(&ProjectStatus::Building), "Строительство");
        assert_eq!(status_label(&ProjectStatus::Deposit), "Задаток");
        assert_eq!(status_label(&ProjectStatus::Built), "Построен");
        assert_eq!(status_label(&ProjectStatus::parse("unknown_value")), "Неизвестно");

        assert_eq!(status_tone(&ProjectStatus::Building), Tone::Emerald);
        assert_eq!(status_tone(&ProjectStatus::Deposit), Tone::Amber);
        assert_eq!(status_tone(&ProjectStatus::Built), Tone::Blue);
        assert_eq!(status_tone(&ProjectStatus::parse("")), Tone::Gray);
        assert_eq!(Tone::Emerald.badge_class(), "bg-emerald-100 text-emerald-800");
    }

    #[test]
    fn progress_band_boundaries_belong_to_the_upper_band() {
        assert_eq!(progress_tone(0.0), Tone::Red);
        assert_eq!(progress_tone(29.99), Tone::Red);
        assert_eq!(progress_tone(30.0), Tone::Amber);
        assert_eq!(progress_tone(69.9), Tone::Amber);
        assert_eq!(progress_tone(70.0), Tone::Emerald);
        assert_eq!(progress_tone(100.0), Tone::Emerald);
        assert_eq!(progress_tone(30.0).bar_class(), "bg-amber-500");
    }

    #[test]
    fn progress_label_rounds_to_whole_percent() {
        assert_eq!(progress_label(33.333), "33%");
        assert_eq!(progress_label(66.5), "67%");
        assert_eq!(progress_label(100.0), "100%");
    }

    #[test]
    fn money_groups_thousands_and_appends_currency() {
        assert_eq!(format_money(1_500_000.0), "1\u{a0}500\u{a0}000 ₸");
        assert!(format_money(1_500_000.0).ends_with(CURRENCY_SUFFIX));
        assert_eq!(format_money(0.0), "0 ₸");
        assert_eq!(format_money(999.0), "999 ₸");
        assert_eq!(format_money(1000.0), "1\u{a0}000 ₸");
    }

    #[test]
    fn fractions_use_a_comma_and_at_most_three_digits() {
        assert_eq!(format_number(1234.5), "1\u{a0}234,5");
        assert_eq!(format_number(0.12345), "0,123");
        assert_eq!(format_number(-25_000.25), "-25\u{a0}000,25");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(format_number(f64::NAN), "не число");
    }

    #[test]
    fn dates_use_genitive_month_names() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        assert_eq!(format_date(date), "15 февраля 2024 г.");
        let date = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert_eq!(format_date(date), "1 мая 2023 г.");
    }

    #[test]
    fn dates_are_taken_in_the_target_zone() {
        let late_evening = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
        let almaty = FixedOffset::east_opt(5 * 3600).unwrap();
        assert_eq!(format_date_in(&late_evening, &Utc), "31 декабря 2024 г.");
        assert_eq!(format_date_in(&late_evening, &almaty), "1 января 2025 г.");
    }
}
