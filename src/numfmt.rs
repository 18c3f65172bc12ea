//! Number format application for cell display text.
//!
//! Excel number format codes are a mini-language. The preview covers what a
//! reader needs to recognise the value: section selection by sign, fixed and
//! optional digits, thousands grouping and scaling, percent, scientific
//! notation, quoted literals, and date/time tokens. Anything it cannot read
//! falls back to the General rendering of the value.
//!
//! Format codes can have up to 4 sections separated by semicolons:
//! `positive;negative;zero;text`.

/// Built-in number format IDs (0-49 are predefined by Excel)
/// See: ECMA-376 Part 1, Section 18.8.30
pub const fn builtin_format(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        5 => Some("$#,##0_);($#,##0)"),
        6 => Some("$#,##0_);[Red]($#,##0)"),
        7 => Some("$#,##0.00_);($#,##0.00)"),
        8 => Some("$#,##0.00_);[Red]($#,##0.00)"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("mm-dd-yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}

pub fn format_boolean(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Check if a format code formats dates or times.
pub fn is_date_format(format_code: &str) -> bool {
    let Some(section) = split_sections(format_code).into_iter().next() else {
        return false;
    };
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut bracket = String::new();
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '\\' => {
                chars.next();
            }
            '[' => {
                in_brackets = true;
                bracket.clear();
            }
            ']' => {
                in_brackets = false;
                // Elapsed-time codes like [h] or [mm]
                let lower = bracket.to_ascii_lowercase();
                if !lower.is_empty() && lower.chars().all(|c| matches!(c, 'h' | 'm' | 's')) {
                    return true;
                }
            }
            _ if in_brackets => bracket.push(c),
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' => return true,
            'm' | 'M' if !section.contains(['0', '#']) => return true,
            's' | 'S' if section.contains(':') => return true,
            _ => {}
        }
    }
    false
}

/// Format a numeric value using a format code.
pub fn format_value(value: f64, format_code: &str, date1904: bool) -> String {
    let code = format_code.trim();
    if code.is_empty() || code.eq_ignore_ascii_case("General") || code == "@" {
        return format_general(value);
    }
    if !value.is_finite() {
        return "#NUM!".to_string();
    }

    let sections = split_sections(code);
    let (section, value) = pick_section(&sections, value);
    let (section, _color) = strip_brackets(section);

    if section.eq_ignore_ascii_case("General") {
        return format_general(value);
    }
    if is_date_format(format_code) {
        return format_date(value, &section, date1904).unwrap_or_else(|| format_general(value));
    }
    if section.contains('/') && section.contains('?') {
        return format_fraction(value, &section);
    }
    format_numeric(value, &section)
}

/// General format: integers as-is, otherwise up to 10 significant decimals.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
pub fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return "#NUM!".to_string();
    }
    if value == value.trunc() && value.abs() < 1e11 {
        format!("{}", value as i64)
    } else if value.abs() >= 1e11 || value.abs() < 1e-4 {
        format!("{value:.5E}")
    } else {
        let s = format!("{value:.10}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Split a format code on `;` outside quotes and escapes.
fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                sections.push(code.get(start..i).unwrap_or(""));
                start = i + 1;
            }
            _ => {}
        }
    }
    sections.push(code.get(start..).unwrap_or(""));
    sections
}

/// Choose the section for a value. A dedicated negative section receives the
/// absolute value since the sign is part of its literal text.
#[allow(clippy::float_cmp)]
fn pick_section<'a>(sections: &[&'a str], value: f64) -> (&'a str, f64) {
    let first = sections.first().copied().unwrap_or("General");
    match (sections.get(1), sections.get(2)) {
        (Some(neg), _) if value < 0.0 => (*neg, value.abs()),
        (_, Some(zero)) if value == 0.0 => (*zero, value),
        _ => (first, value),
    }
}

/// Remove `[Red]`, `[>100]`, `[$-409]` style prefixes. Elapsed-time brackets
/// (`[h]`) are kept. Returns the remaining code and the first color name.
fn strip_brackets(section: &str) -> (String, Option<String>) {
    let mut out = String::with_capacity(section.len());
    let mut color = None;
    let mut rest = section;
    while let Some(open) = rest.find('[') {
        out.push_str(rest.get(..open).unwrap_or(""));
        let after = rest.get(open + 1..).unwrap_or("");
        let Some(close) = after.find(']') else {
            rest = "";
            break;
        };
        let inner = after.get(..close).unwrap_or("");
        let lower = inner.to_ascii_lowercase();
        if !lower.is_empty() && lower.chars().all(|c| matches!(c, 'h' | 'm' | 's')) {
            out.push('[');
            out.push_str(inner);
            out.push(']');
        } else if let Some(currency) = inner.strip_prefix('$') {
            // [$€-407] -> €
            out.push_str(currency.split('-').next().unwrap_or(""));
        } else if color.is_none() && inner.chars().all(|c| c.is_ascii_alphanumeric()) {
            color = Some(inner.to_string());
        }
        rest = after.get(close + 1..).unwrap_or("");
    }
    out.push_str(rest);
    (out, color)
}

/// A format section tokenised into literals and one numeric placeholder run.
struct NumericPattern {
    prefix: String,
    suffix: String,
    int_zeros: usize,
    decimals: usize,
    min_decimals: usize,
    grouping: bool,
    scale_thousands: i32,
    percent: bool,
    exponent: Option<usize>,
}

fn parse_numeric_pattern(section: &str) -> NumericPattern {
    let mut pattern = NumericPattern {
        prefix: String::new(),
        suffix: String::new(),
        int_zeros: 0,
        decimals: 0,
        min_decimals: 0,
        grouping: false,
        scale_thousands: 0,
        percent: false,
        exponent: None,
    };
    let mut seen_digits = false;
    let mut done_digits = false;
    let mut in_fraction = false;
    let mut pending_commas = 0;
    let mut chars = section.chars().peekable();

    while let Some(c) = chars.next() {
        let literal = match c {
            '0' | '#' | '?' if !done_digits => {
                if pending_commas > 0 {
                    pattern.grouping = true;
                    pending_commas = 0;
                }
                seen_digits = true;
                if in_fraction {
                    pattern.decimals += 1;
                    if c == '0' {
                        pattern.min_decimals += 1;
                    }
                } else if c == '0' {
                    pattern.int_zeros += 1;
                }
                None
            }
            '.' if !done_digits && !in_fraction => {
                in_fraction = true;
                seen_digits = true;
                None
            }
            ',' if seen_digits && !done_digits => {
                pending_commas += 1;
                None
            }
            'E' | 'e' if seen_digits && !done_digits && matches!(chars.peek(), Some('+' | '-')) => {
                chars.next();
                let mut digits = 0;
                while matches!(chars.peek(), Some('0' | '#')) {
                    chars.next();
                    digits += 1;
                }
                pattern.exponent = Some(digits.max(1));
                done_digits = true;
                None
            }
            '%' => {
                pattern.percent = true;
                Some('%'.to_string())
            }
            '"' => {
                let mut text = String::new();
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                    text.push(q);
                }
                Some(text)
            }
            '\\' => chars.next().map(String::from),
            // `_x` reserves the width of x; `*x` repeats x to fill the cell.
            '_' => {
                chars.next();
                Some(" ".to_string())
            }
            '*' => {
                chars.next();
                None
            }
            _ => Some(c.to_string()),
        };

        if let Some(text) = literal {
            if seen_digits {
                done_digits = true;
                pattern.suffix.push_str(&text);
            } else {
                pattern.prefix.push_str(&text);
            }
        }
    }
    // Trailing commas after the last placeholder scale by 1000 each.
    pattern.scale_thousands = pending_commas;
    pattern
}

#[allow(clippy::cast_possible_truncation)]
fn format_numeric(value: f64, section: &str) -> String {
    let pattern = parse_numeric_pattern(section);
    let mut v = value;
    if pattern.percent {
        v *= 100.0;
    }
    if pattern.scale_thousands > 0 {
        v /= 1000f64.powi(pattern.scale_thousands);
    }

    let negative = v < 0.0;
    let body = if let Some(exp_digits) = pattern.exponent {
        format_scientific(v.abs(), pattern.decimals, exp_digits)
    } else {
        let rounded = format!("{:.*}", pattern.decimals, v.abs());
        let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
        let frac = trim_optional_decimals(frac_part, pattern.min_decimals);
        let int_part = int_part.trim_start_matches('0');
        let int_part = format!("{int_part:0>width$}", width = pattern.int_zeros);
        let int_part = if pattern.grouping {
            group_thousands(&int_part)
        } else {
            int_part
        };
        if frac.is_empty() {
            int_part
        } else {
            format!("{int_part}.{frac}")
        }
    };

    let sign = if negative && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{}{body}{}", pattern.prefix, pattern.suffix)
}

/// `# ?/?` style fractions: whole part plus the closest fraction whose
/// denominator has as many digits as the `?` run after the slash.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn format_fraction(value: f64, section: &str) -> String {
    let den_digits = section
        .split_once('/')
        .map_or(1, |(_, den)| den.chars().filter(|&c| c == '?').count())
        .clamp(1, 3);
    let max_den = 10u64.pow(u32::try_from(den_digits).unwrap_or(1)) - 1;
    let abs = value.abs();
    let whole = abs.trunc();
    let frac = abs - whole;

    let (mut best_num, mut best_den, mut best_err) = (0u64, 1u64, f64::MAX);
    for den in 1..=max_den {
        let num = (frac * den as f64).round() as u64;
        let err = (frac - num as f64 / den as f64).abs();
        if err < best_err {
            (best_num, best_den, best_err) = (num, den, err);
        }
    }
    let mut whole = whole as u64;
    if best_num == best_den {
        whole += 1;
        best_num = 0;
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match (whole, best_num) {
        (w, 0) => format!("{sign}{w}"),
        (0, n) => format!("{sign}{n}/{best_den}"),
        (w, n) => format!("{sign}{w} {n}/{best_den}"),
    }
}

fn trim_optional_decimals(frac: &str, min_decimals: usize) -> &str {
    let mut end = frac.len();
    while end > min_decimals && frac.as_bytes().get(end - 1) == Some(&b'0') {
        end -= 1;
    }
    frac.get(..end).unwrap_or(frac)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_scientific(value: f64, decimals: usize, exp_digits: usize) -> String {
    let formatted = format!("{value:.decimals$E}");
    let (mantissa, exponent) = formatted.split_once('E').unwrap_or((formatted.as_str(), "0"));
    let exp: i32 = exponent.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!(
        "{mantissa}E{sign}{:0>width$}",
        exp.unsigned_abs(),
        width = exp_digits
    )
}

// ============================================================================
// Dates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct DateParts {
    year: i64,
    month: u32,
    day: u32,
    weekday: u32, // 0 = Sunday
    hour: u32,
    minute: u32,
    second: u32,
}

/// Convert an Excel serial number to calendar parts.
///
/// The 1900 system keeps Excel's phantom 29 February 1900 (serial 60).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn serial_to_parts(serial: f64, date1904: bool) -> Option<DateParts> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_466.0 {
        return None;
    }
    let mut days = serial.floor() as i64;
    let mut secs = ((serial - serial.floor()) * 86_400.0).round() as i64;
    if secs >= 86_400 {
        days += 1;
        secs -= 86_400;
    }

    let (year, month, day) = if date1904 {
        civil_from_days(days_from_civil(1904, 1, 1) + days)
    } else if days == 60 {
        (1900, 2, 29)
    } else if days == 0 {
        (1900, 1, 0)
    } else {
        let offset = if days < 60 { days } else { days - 1 };
        civil_from_days(days_from_civil(1899, 12, 31) + offset)
    };
    // 1970-01-01 was a Thursday
    let weekday = (days_from_civil(year, month, day.max(1)) + 4).rem_euclid(7) as u32;

    Some(DateParts {
        year,
        month,
        day,
        weekday,
        hour: (secs / 3600) as u32,
        minute: ((secs % 3600) / 60) as u32,
        second: (secs % 60) as u32,
    })
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = i64::from(month);
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, PartialEq)]
enum DateToken {
    Year(usize),
    Month(usize),
    Minute(usize),
    Day(usize),
    Hour(usize),
    ElapsedHours,
    Second(usize),
    AmPm,
    Literal(String),
}

fn tokenize_date(section: &str) -> Vec<DateToken> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        let run = chars
            .get(i..)
            .map_or(0, |rest| rest.iter().take_while(|x| x.eq_ignore_ascii_case(&c)).count())
            .max(1);
        let token = match c.to_ascii_lowercase() {
            'y' => DateToken::Year(run),
            'd' => DateToken::Day(run),
            'h' => DateToken::Hour(run),
            's' => DateToken::Second(run),
            'm' => DateToken::Month(run),
            'a' if section
                .get(i..)
                .is_some_and(|r| r.to_ascii_lowercase().starts_with("am/pm")) =>
            {
                i += 5;
                tokens.push(DateToken::AmPm);
                continue;
            }
            '[' => {
                let close = chars
                    .get(i..)
                    .and_then(|rest| rest.iter().position(|&x| x == ']'))
                    .map_or(chars.len(), |p| i + p);
                let inner: String = chars.get(i + 1..close).unwrap_or(&[]).iter().collect();
                i = close + 1;
                tokens.push(match inner.to_ascii_lowercase().chars().next() {
                    Some('h') => DateToken::ElapsedHours,
                    Some('m') => DateToken::Minute(2),
                    Some('s') => DateToken::Second(2),
                    _ => DateToken::Literal(String::new()),
                });
                continue;
            }
            '"' => {
                let text: String = chars
                    .get(i + 1..)
                    .unwrap_or(&[])
                    .iter()
                    .take_while(|&&x| x != '"')
                    .collect();
                i += text.chars().count() + 2;
                tokens.push(DateToken::Literal(text));
                continue;
            }
            '\\' => {
                let text = chars.get(i + 1).map(|x| x.to_string()).unwrap_or_default();
                i += 2;
                tokens.push(DateToken::Literal(text));
                continue;
            }
            '_' | '*' => {
                i += 2;
                continue;
            }
            _ => {
                i += 1;
                tokens.push(DateToken::Literal(c.to_string()));
                continue;
            }
        };
        i += run;
        tokens.push(token);
    }

    // `m` after an hour or before a second means minutes.
    for idx in 0..tokens.len() {
        let Some(DateToken::Month(n)) = tokens.get(idx).cloned() else {
            continue;
        };
        if n > 2 {
            continue;
        }
        let prev_is_hour = tokens
            .get(..idx)
            .and_then(|before| before.iter().rev().find(|t| !matches!(t, DateToken::Literal(_))))
            .is_some_and(|t| matches!(t, DateToken::Hour(_) | DateToken::ElapsedHours));
        let next_is_second = tokens
            .get(idx + 1..)
            .and_then(|after| after.iter().find(|t| !matches!(t, DateToken::Literal(_))))
            .is_some_and(|t| matches!(t, DateToken::Second(_)));
        if prev_is_hour || next_is_second {
            if let Some(slot) = tokens.get_mut(idx) {
                *slot = DateToken::Minute(n);
            }
        }
    }
    tokens
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn format_date(value: f64, section: &str, date1904: bool) -> Option<String> {
    let parts = serial_to_parts(value, date1904)?;
    let tokens = tokenize_date(section);
    let twelve_hour = tokens.contains(&DateToken::AmPm);
    let month_name = MONTHS.get(parts.month.saturating_sub(1) as usize).copied()?;
    let weekday_name = WEEKDAYS.get(parts.weekday as usize).copied()?;

    let mut out = String::new();
    for token in &tokens {
        match token {
            DateToken::Year(n) if *n <= 2 => out.push_str(&format!("{:02}", parts.year % 100)),
            DateToken::Year(_) => out.push_str(&format!("{:04}", parts.year)),
            DateToken::Month(1) => out.push_str(&parts.month.to_string()),
            DateToken::Month(2) => out.push_str(&format!("{:02}", parts.month)),
            DateToken::Month(3) => out.push_str(month_name.get(..3).unwrap_or(month_name)),
            DateToken::Month(5) => out.push_str(month_name.get(..1).unwrap_or(month_name)),
            DateToken::Month(_) => out.push_str(month_name),
            DateToken::Day(1) => out.push_str(&parts.day.to_string()),
            DateToken::Day(2) => out.push_str(&format!("{:02}", parts.day)),
            DateToken::Day(3) => out.push_str(weekday_name.get(..3).unwrap_or(weekday_name)),
            DateToken::Day(_) => out.push_str(weekday_name),
            DateToken::Hour(n) => {
                let hour = if twelve_hour {
                    match parts.hour % 12 {
                        0 => 12,
                        h => h,
                    }
                } else {
                    parts.hour
                };
                if *n >= 2 {
                    out.push_str(&format!("{hour:02}"));
                } else {
                    out.push_str(&hour.to_string());
                }
            }
            DateToken::ElapsedHours => {
                let hours = (value * 24.0).floor() as u64;
                out.push_str(&hours.to_string());
            }
            DateToken::Minute(n) if *n >= 2 => out.push_str(&format!("{:02}", parts.minute)),
            DateToken::Minute(_) => out.push_str(&parts.minute.to_string()),
            DateToken::Second(n) if *n >= 2 => out.push_str(&format!("{:02}", parts.second)),
            DateToken::Second(_) => out.push_str(&parts.second.to_string()),
            DateToken::AmPm => out.push_str(if parts.hour < 12 { "AM" } else { "PM" }),
            DateToken::Literal(text) => out.push_str(text),
        }
    }
    Some(out)
}
