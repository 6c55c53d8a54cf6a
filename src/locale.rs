//! Concrete default implementations of the verbalization primitives the settings schema treats as
//! pluggable: decimal/date parsing and number-to-words conversion. A caller building a
//! non-default [`crate::settings::Settings`] is free to swap these for other backends; nothing in
//! `transforms`/`splits` calls them directly, they're just what [`Settings::default_for`] wires
//! up by default.
use chrono::{Datelike, NaiveDate};
use num2words::{Lang, Num2Words};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Cheap pre-filter so the transform passes don't attempt a full parse on every leaf.
pub fn is_maybe_number(text: &str) -> bool {
    let mut saw_digit = false;
    for c in text.chars() {
        match c {
            '0'..='9' => saw_digit = true,
            '.' | ',' | '-' | '+' => {}
            _ => return false,
        }
    }
    saw_digit
}

/// Parses a decimal literal, tolerating `,` as a thousands separator (en/de swap the meaning of
/// `,`/`.` but the common case - a single decimal point, optional thousands commas - is the same
/// string shape either way once commas are stripped).
pub fn parse_decimal(text: &str, _locale: &str) -> Option<Decimal> {
    let cleaned: String = text.chars().filter(|&c| c != ',').collect();
    Decimal::from_str(&cleaned).ok()
}

/// Cheap pre-filter: contains a `/` separator and at least one digit.
pub fn is_maybe_date(text: &str) -> bool {
    text.contains('/') && text.chars().any(|c| c.is_ascii_digit())
}

/// `order` is a [`crate::settings::Settings::default_date_format`]-shaped string: one of `d`/`m`/
/// `y`/`O` per slash-separated field (`O`, ordinal day, counts as a day field here exactly like
/// `d` - the distinction only matters to [`Self::format_date_display`]-style verbalization, not to
/// parsing field position).
fn parse_date_fields(text: &str, order: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split('/').collect();
    let fields: Vec<char> = order.chars().filter(|c| matches!(c, 'd' | 'm' | 'y' | 'O')).collect();
    if parts.len() != fields.len() {
        return None;
    }
    let mut day = None;
    let mut month = None;
    let mut year = None;
    for (field, part) in fields.into_iter().zip(parts.iter()) {
        let n: i32 = part.parse().ok()?;
        match field {
            'd' | 'O' => day = Some(n),
            'm' => month = Some(n),
            'y' => year = Some(if n < 100 { 2000 + n } else { n }),
            _ => return None,
        }
    }
    // A format with no `y` field (e.g. a `<say-as format="md">` with no year in the source text)
    // still needs *some* year to build a valid NaiveDate; the value is never read back out since
    // verbalize_date only speaks the fields present in the format string.
    let year = year.unwrap_or(2000);
    NaiveDate::from_ymd_opt(year, month?.try_into().ok()?, day?.try_into().ok()?)
}

/// Parses `text` (slash-separated numeric fields) according to `order`. If `strict` is false and
/// the given order doesn't produce a valid calendar date, the two other common field orderings
/// are tried as a fallback - this is the retry a forced `<say-as interpret-as="date">` gets when
/// the locale-default order doesn't fit the literal text.
pub fn parse_date(text: &str, order: &str, strict: bool) -> Option<NaiveDate> {
    if let Some(d) = parse_date_fields(text, order) {
        return Some(d);
    }
    if strict {
        return None;
    }
    ["mdy", "dmy", "ymd"].iter().find_map(|alt| parse_date_fields(text, alt))
}

fn num2words_lang(lang: &str) -> Lang {
    match lang.split(['_', '-']).next().unwrap_or("en") {
        "de" => Lang::German,
        "es" => Lang::Spanish,
        "fr" => Lang::French,
        _ => Lang::English,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberMode {
    Cardinal,
    Ordinal,
    Year,
    Digits,
}

impl NumberMode {
    pub fn from_format(format: Option<&str>) -> Self {
        match format {
            Some("ordinal") => Self::Ordinal,
            Some("year") => Self::Year,
            Some("digits") => Self::Digits,
            _ => Self::Cardinal,
        }
    }
}

/// `Digits` mode is handled by the caller (one digit at a time). `Year` reads a 4-digit number as
/// two paired two-digit groups ("1999" -> "nineteen ninety-nine") the way dates are normally
/// spoken, falling back to a plain cardinal outside that range.
pub fn num_to_words(n: &Decimal, lang: &str, mode: NumberMode) -> Option<String> {
    let f: f64 = n.to_string().parse().ok()?;
    match mode {
        NumberMode::Ordinal => Num2Words::new(f).lang(num2words_lang(lang)).ordinal().to_words().ok(),
        NumberMode::Cardinal | NumberMode::Digits => {
            Num2Words::new(f).lang(num2words_lang(lang)).cardinal().to_words().ok()
        }
        NumberMode::Year => {
            let n_i64 = f as i64;
            if (1000..=9999).contains(&n_i64) {
                let high = n_i64 / 100;
                let low = n_i64 % 100;
                let high_words = Num2Words::new(high as f64)
                    .lang(num2words_lang(lang))
                    .cardinal()
                    .to_words()
                    .ok()?;
                if low == 0 {
                    return Some(format!("{} hundred", high_words));
                }
                let low_words = Num2Words::new(low as f64)
                    .lang(num2words_lang(lang))
                    .cardinal()
                    .to_words()
                    .ok()?;
                Some(format!("{} {}", high_words, low_words))
            } else {
                Num2Words::new(f).lang(num2words_lang(lang)).cardinal().to_words().ok()
            }
        }
    }
}

/// Full month name for the given locale; currently English-only, other locales fall back to the
/// numeric month as a cardinal which is at least speakable.
pub fn format_month(month: u32, lang: &str) -> String {
    const EN_MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    if lang.starts_with("en") {
        if let Some(name) = EN_MONTHS.get((month as usize).saturating_sub(1)) {
            return name.to_string();
        }
    }
    num_to_words(&Decimal::from(month), lang, NumberMode::Cardinal).unwrap_or_else(|| month.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mdy_for_english() {
        let date = parse_date("4/1/1999", "mOy", true).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1999, 4, 1).unwrap());
    }

    #[test]
    fn parses_forced_two_field_format() {
        let date = parse_date("4/1", "md", true).unwrap();
        assert_eq!(date.month(), 4);
        assert_eq!(date.day(), 1);
    }

    #[test]
    fn cardinal_number_in_english() {
        let n = Decimal::from_str("10").unwrap();
        assert_eq!(num_to_words(&n, "en_US", NumberMode::Cardinal).unwrap(), "ten");
    }

    #[test]
    fn month_name_lookup() {
        assert_eq!(format_month(4, "en_US"), "April");
    }
}
