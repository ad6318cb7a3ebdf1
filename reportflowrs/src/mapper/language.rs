use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::LocaleConfig;
use crate::models::ReferenceType;

/// Language code plus the locale settings used to format display values.
#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub locale: LocaleConfig,
}

impl Default for Language {
    fn default() -> Self {
        Self::new(LocaleConfig::default())
    }
}

impl Language {
    pub fn new(locale: LocaleConfig) -> Self {
        Self { locale }
    }

    pub fn code(&self) -> &str {
        &self.locale.language
    }

    pub fn flag_label(&self, flag: bool) -> &str {
        if flag {
            &self.locale.yes_label
        } else {
            &self.locale.no_label
        }
    }

    /// `pattern` uses `#,##0.00` notation; without one the reference type decides.
    pub fn format_number(
        &self,
        value: Decimal,
        reference: ReferenceType,
        pattern: Option<&str>,
    ) -> String {
        let pattern = pattern
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| default_number_pattern(reference));
        NumberPattern::parse(pattern).format(
            value,
            self.locale.decimal_separator,
            self.locale.grouping_separator,
        )
    }

    /// `pattern` may be strftime (`%d/%m/%Y`) or `dd/MM/yyyy` notation.
    pub fn format_timestamp(
        &self,
        value: NaiveDateTime,
        reference: ReferenceType,
        pattern: Option<&str>,
    ) -> String {
        let fallback = match reference {
            ReferenceType::DateTime => &self.locale.date_time_pattern,
            ReferenceType::Time => &self.locale.time_pattern,
            _ => &self.locale.date_pattern,
        };
        let requested = pattern
            .filter(|p| !p.trim().is_empty())
            .map(to_strftime)
            .filter(|p| is_valid_strftime(p));
        let pattern = match requested {
            Some(pattern) => pattern,
            None if is_valid_strftime(fallback) => fallback.clone(),
            None => "%Y-%m-%d %H:%M:%S".to_string(),
        };
        value.format(&pattern).to_string()
    }
}

fn default_number_pattern(reference: ReferenceType) -> &'static str {
    match reference {
        ReferenceType::Integer | ReferenceType::Id => "#,##0",
        ReferenceType::Amount => "#,##0.00",
        ReferenceType::CostPrice => "#,##0.00####",
        _ => "#,##0.####",
    }
}

#[derive(Debug, Clone, PartialEq)]
struct NumberPattern {
    prefix: String,
    suffix: String,
    grouping: Option<usize>,
    min_integer: usize,
    min_fraction: u32,
    max_fraction: u32,
}

impl NumberPattern {
    fn parse(pattern: &str) -> Self {
        let positive = pattern.split(';').next().unwrap_or_default();
        let is_body = |c: char| matches!(c, '#' | '0' | ',' | '.');
        let start = positive.find(is_body).unwrap_or(positive.len());
        let end = positive.rfind(is_body).map(|i| i + 1).unwrap_or(start);
        let body = &positive[start..end];
        let (integer, fraction) = body.split_once('.').unwrap_or((body, ""));
        let grouping = integer
            .rfind(',')
            .map(|idx| integer.len() - idx - 1)
            .filter(|size| *size > 0);
        let min_fraction = fraction.chars().filter(|c| *c == '0').count() as u32;
        let optional = fraction.chars().filter(|c| *c == '#').count() as u32;
        Self {
            prefix: positive[..start].replace('\'', ""),
            suffix: positive[end..].replace('\'', ""),
            grouping,
            min_integer: integer.chars().filter(|c| *c == '0').count().max(1),
            min_fraction,
            max_fraction: min_fraction + optional,
        }
    }

    fn format(&self, value: Decimal, decimal_separator: char, grouping_separator: char) -> String {
        let rounded =
            value.round_dp_with_strategy(self.max_fraction, RoundingStrategy::MidpointNearestEven);
        let digits = rounded.abs().to_string();
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

        let mut fraction = fraction.trim_end_matches('0').to_string();
        while (fraction.len() as u32) < self.min_fraction {
            fraction.push('0');
        }

        let integer = integer.trim_start_matches('0');
        let mut integer = integer.to_string();
        while integer.len() < self.min_integer {
            integer.insert(0, '0');
        }
        if let Some(size) = self.grouping {
            integer = group_digits(&integer, size, grouping_separator);
        }

        let mut out = String::new();
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        out.push_str(&self.prefix);
        out.push_str(&integer);
        if !fraction.is_empty() {
            out.push(decimal_separator);
            out.push_str(&fraction);
        }
        out.push_str(&self.suffix);
        out
    }
}

fn group_digits(digits: &str, size: usize, separator: char) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / size);
    for (idx, c) in chars.iter().enumerate() {
        if idx > 0 && (chars.len() - idx) % size == 0 {
            out.push(separator);
        }
        out.push(*c);
    }
    out
}

fn is_valid_strftime(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Translate `dd/MM/yyyy HH:mm` style patterns; strftime input passes through.
fn to_strftime(pattern: &str) -> String {
    if pattern.contains('%') {
        return pattern.to_string();
    }
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut idx = 0;
    while idx < chars.len() {
        let c = chars[idx];
        if c == '\'' {
            idx += 1;
            while idx < chars.len() && chars[idx] != '\'' {
                out.push(chars[idx]);
                idx += 1;
            }
            idx += 1;
            continue;
        }
        let mut run = 1;
        while idx + run < chars.len() && chars[idx + run] == c {
            run += 1;
        }
        let token = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', _) => "%M",
            ('s', _) => "%S",
            ('S', _) => "%3f",
            ('a', _) => "%p",
            ('E', n) if n >= 4 => "%A",
            ('E', _) => "%a",
            _ => {
                for _ in 0..run {
                    out.push(c);
                }
                idx += run;
                continue;
            }
        };
        out.push_str(token);
        idx += run;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn amounts_use_two_decimals_and_grouping() {
        let language = Language::default();
        assert_eq!(
            language.format_number(Decimal::new(1234567, 1), ReferenceType::Amount, None),
            "123,456.70"
        );
        assert_eq!(
            language.format_number(Decimal::new(-5, 0), ReferenceType::Amount, None),
            "-5.00"
        );
        assert_eq!(
            language.format_number(Decimal::from(1500), ReferenceType::Integer, None),
            "1,500"
        );
    }

    #[test]
    fn optional_fraction_digits_are_trimmed() {
        let language = Language::default();
        assert_eq!(
            language.format_number(Decimal::new(25, 1), ReferenceType::Quantity, None),
            "2.5"
        );
        assert_eq!(
            language.format_number(Decimal::new(123456, 5), ReferenceType::Number, None),
            "1.2346"
        );
        assert_eq!(
            language.format_number(Decimal::new(5, 1), ReferenceType::Number, None),
            "0.5"
        );
    }

    #[test]
    fn locale_separators_and_patterns() {
        let mut locale = LocaleConfig::default();
        locale.decimal_separator = ',';
        locale.grouping_separator = '.';
        let language = Language::new(locale);
        assert_eq!(
            language.format_number(Decimal::new(123456789, 2), ReferenceType::Amount, None),
            "1.234.567,89"
        );
        assert_eq!(
            language.format_number(Decimal::new(5, 1), ReferenceType::Number, Some("0.000 'kg'")),
            "0,500 kg"
        );
    }

    #[test]
    fn dates_follow_locale_or_item_pattern() {
        let language = Language::default();
        assert_eq!(
            language.format_timestamp(ts(), ReferenceType::Date, None),
            "03/07/2024"
        );
        assert_eq!(
            language.format_timestamp(ts(), ReferenceType::DateTime, Some("dd.MM.yyyy HH:mm")),
            "07.03.2024 14:05"
        );
        assert_eq!(
            language.format_timestamp(ts(), ReferenceType::Date, Some("%Y/%m/%d")),
            "2024/03/07"
        );
        assert_eq!(
            language.format_timestamp(ts(), ReferenceType::Date, Some("%Q")),
            "03/07/2024"
        );
    }
}
