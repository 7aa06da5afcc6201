//! Month and weekday names
//!
//! Constant tables; unknown languages fall back to English.

use chrono::Weekday;

struct Names {
    language: &'static str,
    months: [&'static str; 12],
    /// Sunday first.
    weekdays: [&'static str; 7],
}

static NAMES: &[Names] = &[
    Names {
        language: "en",
        months: [
            "January", "February", "March", "April", "May", "June",
            "July", "August", "September", "October", "November", "December",
        ],
        weekdays: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
    },
    Names {
        language: "de",
        months: [
            "Januar", "Februar", "März", "April", "Mai", "Juni",
            "Juli", "August", "September", "Oktober", "November", "Dezember",
        ],
        weekdays: ["So", "Mo", "Di", "Mi", "Do", "Fr", "Sa"],
    },
    Names {
        language: "fr",
        months: [
            "janvier", "février", "mars", "avril", "mai", "juin",
            "juillet", "août", "septembre", "octobre", "novembre", "décembre",
        ],
        weekdays: ["dim", "lun", "mar", "mer", "jeu", "ven", "sam"],
    },
    Names {
        language: "es",
        months: [
            "enero", "febrero", "marzo", "abril", "mayo", "junio",
            "julio", "agosto", "septiembre", "octubre", "noviembre", "diciembre",
        ],
        weekdays: ["dom", "lun", "mar", "mié", "jue", "vie", "sáb"],
    },
];

fn names(language: &str) -> &'static Names {
    NAMES
        .iter()
        .find(|n| n.language == language)
        .unwrap_or(&NAMES[0])
}

/// `month` is 1-based.
pub fn month_name(language: &str, month: u32) -> &'static str {
    let index = (month.clamp(1, 12) - 1) as usize;
    names(language).months[index]
}

pub fn weekday_abbrev(language: &str, day: Weekday) -> &'static str {
    names(language).weekdays[day.num_days_from_sunday() as usize]
}

/// First letter only, for narrow cells.
pub fn weekday_initial(language: &str, day: Weekday) -> String {
    weekday_abbrev(language, day).chars().take(1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_fallback() {
        assert_eq!(month_name("en", 1), "January");
        assert_eq!(month_name("de", 3), "März");
        assert_eq!(month_name("xx", 12), "December");
        assert_eq!(weekday_abbrev("fr", Weekday::Mon), "lun");
        assert_eq!(weekday_initial("en", Weekday::Thu), "T");
    }
}
