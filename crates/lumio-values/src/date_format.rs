//! Moment-style date formats.
//!
//! A display format such as `DD.MM.YYYY HH:mm` decides three things:
//! - how a date is rendered ([`format_date`]),
//! - how typed text is read back ([`parse_with_format`], forgiving like the
//!   web client: separators are searched for, not required),
//! - which calendar fields take part in comparisons ([`reset_unused_part`]).
//!
//! Dates are handled as [`NaiveDateTime`] wall-clock values inside a
//! [`DateFrame`]; the frame knows its offset from UTC and converts to and from
//! the stored ISO form.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use lumio_model::LanguageTag;

// ============================================================================
// Frame
// ============================================================================

/// Wall-clock frame: UTC shifted by `offset_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateFrame {
    pub offset_minutes: i32,
}

impl DateFrame {
    pub fn utc() -> Self {
        Self::default()
    }

    pub fn with_offset(offset_minutes: Option<i32>) -> Self {
        Self {
            offset_minutes: offset_minutes.unwrap_or(0),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.from_utc(Utc::now().naive_utc())
    }

    pub fn from_utc(&self, utc: NaiveDateTime) -> NaiveDateTime {
        utc + Duration::minutes(i64::from(self.offset_minutes))
    }

    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        local - Duration::minutes(i64::from(self.offset_minutes))
    }

    /// `2019-05-19T23:15:00.000Z`
    pub fn to_iso_string(&self, local: NaiveDateTime) -> String {
        format!("{}Z", self.to_utc(local).format("%Y-%m-%dT%H:%M:%S%.3f"))
    }

    pub fn timestamp_millis(&self, local: NaiveDateTime) -> i64 {
        self.to_utc(local).and_utc().timestamp_millis()
    }
}

// ============================================================================
// Tokens
// ============================================================================

const FIELD_TOKENS: [&str; 41] = [
    "YYYY", "GGGG", "gggg", "MMMM", "dddd", "SSS", "MMM", "ddd", "YY", "GG", "gg", "MM", "DD", "Do",
    "dd", "WW", "ww", "HH", "hh", "kk", "mm", "ss", "SS", "Y", "Q", "M", "D", "d", "E", "e", "W",
    "w", "H", "h", "k", "m", "s", "S", "A", "a", "X",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Field(&'static str),
    Literal(String),
}

fn tokenize(format: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = format;
    while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                tokens.push(Token::Literal(rest[1..end].to_string()));
                rest = &rest[end + 1..];
                continue;
            }
        }
        // `x` is the only single-letter token missing from the table above.
        if c == 'x' {
            tokens.push(Token::Field("x"));
            rest = &rest[1..];
            continue;
        }
        match FIELD_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            Some(field) => {
                tokens.push(Token::Field(field));
                rest = &rest[field.len()..];
            }
            None => {
                tokens.push(Token::Literal(c.to_string()));
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    tokens
}

// ============================================================================
// Granularity
// ============================================================================

/// Calendar fields a format displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeOptions {
    pub year: bool,
    pub quarter: bool,
    pub month: bool,
    pub week: bool,
    pub day_of_week: bool,
    pub day: bool,
    pub hours: bool,
    pub minutes: bool,
    pub seconds: bool,
    pub milliseconds: bool,
}

impl DateTimeOptions {
    fn everything() -> Self {
        Self {
            year: true,
            quarter: true,
            month: true,
            week: true,
            day_of_week: true,
            day: true,
            hours: true,
            minutes: true,
            seconds: true,
            milliseconds: true,
        }
    }

    pub fn has_date_part(&self) -> bool {
        self.year || self.quarter || self.month || self.week || self.day_of_week || self.day
    }

    pub fn has_time_part(&self) -> bool {
        self.hours || self.minutes || self.seconds || self.milliseconds
    }
}

pub fn date_time_options(format: &str) -> DateTimeOptions {
    let mut options = DateTimeOptions::default();
    for token in tokenize(format) {
        let Token::Field(field) = token else {
            continue;
        };
        match field.chars().next() {
            Some('Y' | 'G' | 'g') => options.year = true,
            Some('Q') => options.quarter = true,
            Some('M') => options.month = true,
            Some('W' | 'w') => options.week = true,
            Some('d' | 'E' | 'e') => options.day_of_week = true,
            Some('D') => options.day = true,
            Some('H' | 'h' | 'k') => options.hours = true,
            Some('m') => options.minutes = true,
            Some('s') => options.seconds = true,
            Some('S') => options.milliseconds = true,
            Some('X' | 'x') => return DateTimeOptions::everything(),
            _ => {}
        }
    }
    options
}

/// True for formats like `HH:mm` that show a time of day and no date.
pub fn has_only_time_format(format: Option<&str>) -> bool {
    let Some(format) = format else {
        return false;
    };
    let options = date_time_options(format);
    options.has_time_part() && !options.has_date_part()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// The finest unit a format displays; drives increment and decrement.
pub fn smallest_unit(format: &str) -> Option<DateUnit> {
    let fields: Vec<char> = tokenize(format)
        .into_iter()
        .filter_map(|t| match t {
            Token::Field(f) => f.chars().next(),
            Token::Literal(_) => None,
        })
        .collect();
    let has = |set: &[char]| fields.iter().any(|c| set.contains(c));
    if has(&['S', 'x']) {
        Some(DateUnit::Millisecond)
    } else if has(&['s', 'X']) {
        Some(DateUnit::Second)
    } else if has(&['m']) {
        Some(DateUnit::Minute)
    } else if has(&['H', 'h', 'k']) {
        Some(DateUnit::Hour)
    } else if has(&['d', 'D', 'e', 'E']) {
        Some(DateUnit::Day)
    } else if has(&['g', 'G', 'w', 'W']) {
        Some(DateUnit::Week)
    } else if has(&['M']) {
        Some(DateUnit::Month)
    } else if has(&['Q', 'Y']) {
        Some(DateUnit::Year)
    } else {
        None
    }
}

/// Adds `amount` units; months and years clamp the day of month.
pub fn add_unit(date: NaiveDateTime, unit: DateUnit, amount: i32) -> Option<NaiveDateTime> {
    let amount64 = i64::from(amount);
    match unit {
        DateUnit::Millisecond => date.checked_add_signed(Duration::milliseconds(amount64)),
        DateUnit::Second => date.checked_add_signed(Duration::seconds(amount64)),
        DateUnit::Minute => date.checked_add_signed(Duration::minutes(amount64)),
        DateUnit::Hour => date.checked_add_signed(Duration::hours(amount64)),
        DateUnit::Day => date.checked_add_signed(Duration::days(amount64)),
        DateUnit::Week => date.checked_add_signed(Duration::weeks(amount64)),
        DateUnit::Month => add_months(date, amount),
        DateUnit::Year => add_months(date, amount.saturating_mul(12)),
    }
}

fn add_months(date: NaiveDateTime, months: i32) -> Option<NaiveDateTime> {
    if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

pub fn start_of_day(date: NaiveDateTime) -> NaiveDateTime {
    date.date().and_time(NaiveTime::MIN)
}

pub fn start_of_month(date: NaiveDateTime) -> NaiveDateTime {
    start_of_day(date.with_day(1).unwrap_or(date))
}

fn ymd_clamped(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (1..=day.max(1))
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

fn with_date(date: NaiveDateTime, new_date: Option<NaiveDate>) -> NaiveDateTime {
    new_date.map(|d| d.and_time(date.time())).unwrap_or(date)
}

/// Snaps to the Monday of the ISO week, or to its Thursday in week one so the
/// week stays inside its own year.
pub fn reset_week(date: NaiveDateTime) -> NaiveDateTime {
    let iso = date.iso_week();
    let weekday = if iso.week() == 1 {
        Weekday::Thu
    } else {
        Weekday::Mon
    };
    with_date(
        date,
        NaiveDate::from_isoywd_opt(iso.year(), iso.week(), weekday),
    )
}

fn reset_year(date: NaiveDateTime, keep_day_of_week: bool) -> NaiveDateTime {
    if keep_day_of_week {
        let diff_years = i64::from(date.year() - 1970);
        let mut shifted = date - Duration::weeks(diff_years * 52);
        if shifted.year() == 1971 {
            shifted -= Duration::weeks(52);
        } else if shifted.year() == 1969 {
            shifted += Duration::weeks(52);
        }
        return shifted;
    }
    with_date(date, ymd_clamped(1970, date.month(), date.day()))
}

fn reset_day_of_week(date: NaiveDateTime) -> NaiveDateTime {
    let iso = date.iso_week();
    with_date(
        date,
        NaiveDate::from_isoywd_opt(iso.year(), 2, date.weekday()),
    )
}

fn reset_quarter(date: NaiveDateTime) -> NaiveDateTime {
    let month = (date.month0() / 3) * 3 + 1;
    start_of_day(with_date(date, NaiveDate::from_ymd_opt(date.year(), month, 1)))
}

/// Zeroes every calendar field the format does not display, so comparisons
/// follow the display granularity.
pub fn reset_unused_part(date: NaiveDateTime, format: Option<&str>) -> NaiveDateTime {
    let Some(format) = format.filter(|f| !f.is_empty()) else {
        return date;
    };
    let options = date_time_options(format);

    let mut copy = date;
    if !options.year {
        copy = reset_year(copy, options.day_of_week);
    }
    if !options.month && !options.week && !options.quarter && !options.day_of_week {
        copy = with_date(copy, ymd_clamped(copy.year(), 1, copy.day()));
    }
    if !options.day && !options.week && !options.day_of_week {
        copy = with_date(copy, NaiveDate::from_ymd_opt(copy.year(), copy.month(), 1));
    }
    if options.day_of_week && !options.month {
        copy = reset_day_of_week(copy);
    }
    if options.quarter && !options.month && !options.day {
        copy = reset_quarter(copy);
    }
    if options.week {
        copy = reset_week(date);
    }

    let hour = if options.hours { copy.hour() } else { 0 };
    let minute = if options.minutes { copy.minute() } else { 0 };
    let second = if options.seconds { copy.second() } else { 0 };
    let milli = if options.milliseconds {
        copy.nanosecond() / 1_000_000
    } else {
        0
    };
    NaiveTime::from_hms_milli_opt(hour, minute, second, milli)
        .map(|time| copy.date().and_time(time))
        .unwrap_or(copy)
}

// ============================================================================
// Localized names
// ============================================================================

struct Names {
    months: [&'static str; 12],
    months_short: [&'static str; 12],
    /// Sunday first.
    weekdays: [&'static str; 7],
    weekdays_short: [&'static str; 7],
    weekdays_min: [&'static str; 7],
    english_ordinals: bool,
}

const EN: Names = Names {
    months: [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ],
    months_short: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    weekdays: [
        "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
    ],
    weekdays_short: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
    weekdays_min: ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
    english_ordinals: true,
};

const SK: Names = Names {
    months: [
        "január", "február", "marec", "apríl", "máj", "jún", "júl", "august", "september",
        "október", "november", "december",
    ],
    months_short: [
        "jan", "feb", "mar", "apr", "máj", "jún", "júl", "aug", "sep", "okt", "nov", "dec",
    ],
    weekdays: [
        "nedeľa", "pondelok", "utorok", "streda", "štvrtok", "piatok", "sobota",
    ],
    weekdays_short: ["ne", "po", "ut", "st", "št", "pi", "so"],
    weekdays_min: ["ne", "po", "ut", "st", "št", "pi", "so"],
    english_ordinals: false,
};

const CS: Names = Names {
    months: [
        "ledna", "února", "března", "dubna", "května", "června", "července", "srpna", "září",
        "října", "listopadu", "prosince",
    ],
    months_short: [
        "led", "úno", "bře", "dub", "kvě", "čvn", "čvc", "srp", "zář", "říj", "lis", "pro",
    ],
    weekdays: [
        "neděle", "pondělí", "úterý", "středa", "čtvrtek", "pátek", "sobota",
    ],
    weekdays_short: ["ne", "po", "út", "st", "čt", "pá", "so"],
    weekdays_min: ["ne", "po", "út", "st", "čt", "pá", "so"],
    english_ordinals: false,
};

const DE: Names = Names {
    months: [
        "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
        "Oktober", "November", "Dezember",
    ],
    months_short: [
        "Jan.", "Feb.", "März", "Apr.", "Mai", "Juni", "Juli", "Aug.", "Sep.", "Okt.", "Nov.",
        "Dez.",
    ],
    weekdays: [
        "Sonntag", "Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag",
    ],
    weekdays_short: ["So.", "Mo.", "Di.", "Mi.", "Do.", "Fr.", "Sa."],
    weekdays_min: ["So", "Mo", "Di", "Mi", "Do", "Fr", "Sa"],
    english_ordinals: false,
};

fn names(language: LanguageTag) -> &'static Names {
    match language.language() {
        "sk" => &SK,
        "cs" => &CS,
        "de" => &DE,
        _ => &EN,
    }
}

fn english_ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

// ============================================================================
// Formatting
// ============================================================================

pub fn format_date(
    date: NaiveDateTime,
    format: &str,
    language: LanguageTag,
    frame: DateFrame,
) -> String {
    let names = names(language);
    let mut out = String::new();
    for token in tokenize(format) {
        match token {
            Token::Literal(text) => out.push_str(&text),
            Token::Field(field) => out.push_str(&render_field(field, date, names, frame)),
        }
    }
    out
}

fn render_field(field: &str, date: NaiveDateTime, names: &Names, frame: DateFrame) -> String {
    let sunday_index = date.weekday().num_days_from_sunday() as usize;
    let hour12 = match date.hour() % 12 {
        0 => 12,
        h => h,
    };
    match field {
        "YYYY" => format!("{:04}", date.year()),
        "YY" => format!("{:02}", date.year().rem_euclid(100)),
        "Y" => date.year().to_string(),
        "GGGG" | "gggg" => format!("{:04}", date.iso_week().year()),
        "GG" | "gg" => format!("{:02}", date.iso_week().year().rem_euclid(100)),
        "Q" => (date.month0() / 3 + 1).to_string(),
        "MMMM" => names.months[date.month0() as usize].to_string(),
        "MMM" => names.months_short[date.month0() as usize].to_string(),
        "MM" => format!("{:02}", date.month()),
        "M" => date.month().to_string(),
        "DD" => format!("{:02}", date.day()),
        "D" => date.day().to_string(),
        "Do" if names.english_ordinals => english_ordinal(date.day()),
        "Do" => format!("{}.", date.day()),
        "dddd" => names.weekdays[sunday_index].to_string(),
        "ddd" => names.weekdays_short[sunday_index].to_string(),
        "dd" => names.weekdays_min[sunday_index].to_string(),
        "d" | "e" => sunday_index.to_string(),
        "E" => date.weekday().number_from_monday().to_string(),
        "WW" | "ww" => format!("{:02}", date.iso_week().week()),
        "W" | "w" => date.iso_week().week().to_string(),
        "HH" => format!("{:02}", date.hour()),
        "H" => date.hour().to_string(),
        "hh" => format!("{:02}", hour12),
        "h" => hour12.to_string(),
        "kk" => format!("{:02}", if date.hour() == 0 { 24 } else { date.hour() }),
        "k" => (if date.hour() == 0 { 24 } else { date.hour() }).to_string(),
        "mm" => format!("{:02}", date.minute()),
        "m" => date.minute().to_string(),
        "ss" => format!("{:02}", date.second()),
        "s" => date.second().to_string(),
        "SSS" | "SS" | "S" => {
            let millis = format!("{:03}", date.nanosecond() / 1_000_000);
            millis[..field.len()].to_string()
        }
        "A" => (if date.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "a" => (if date.hour() < 12 { "am" } else { "pm" }).to_string(),
        "X" => (frame.timestamp_millis(date).div_euclid(1000)).to_string(),
        "x" => frame.timestamp_millis(date).to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Formats tried after ISO when the configured format does not fit.
pub const FALLBACK_FORMATS: [&str; 6] = [
    "DD.MM.YYYY",
    "YYYY-MM-DD",
    "DD/MM/YYYY",
    "MM/DD/YYYY",
    "YYYY",
    "DD.MM.",
];

/// Configured format first, then ISO 8601, then [`FALLBACK_FORMATS`].
pub fn parse_date(
    text: &str,
    expected_format: Option<&str>,
    language: LanguageTag,
    frame: DateFrame,
) -> Option<NaiveDateTime> {
    if text.trim().is_empty() {
        return None;
    }
    if let Some(format) = expected_format.filter(|f| !f.is_empty()) {
        if let Some(date) = parse_with_format(text, format, language, frame) {
            return Some(date);
        }
    }
    parse_iso(text, frame).or_else(|| {
        FALLBACK_FORMATS
            .iter()
            .find_map(|format| parse_with_format(text, format, language, frame))
    })
}

/// `2019-05-19T23:15:00.000` prefix check used for stored values.
pub fn looks_like_iso(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() < 23 {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    digits(0..4)
        && bytes[4] == b'-'
        && digits(5..7)
        && bytes[7] == b'-'
        && digits(8..10)
        && bytes[10] == b'T'
        && digits(11..13)
        && bytes[13] == b':'
        && digits(14..16)
        && bytes[16] == b':'
        && digits(17..19)
        && digits(20..23)
}

/// `YYYY-MM[-DD][(T| )HH[:mm[:ss[.fff]]]][Z|±hh[:mm]]`. Without a zone the
/// value is taken as wall-clock time of the frame.
pub fn parse_iso(text: &str, frame: DateFrame) -> Option<NaiveDateTime> {
    let text = text.trim();
    let mut scanner = Scanner::new(text);
    let year = scanner.fixed_digits(4)?;
    scanner.expect('-')?;
    let month = scanner.fixed_digits(2)?;
    let day = if scanner.eat('-') {
        scanner.fixed_digits(2)?
    } else {
        1
    };
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;

    let mut time = NaiveTime::MIN;
    let mut zone_minutes: Option<i64> = None;
    if scanner.eat('T') || scanner.eat(' ') {
        let hour = scanner.fixed_digits(2)?;
        let mut minute = 0;
        let mut second = 0;
        let mut milli = 0;
        if scanner.eat(':') {
            minute = scanner.fixed_digits(2)?;
            if scanner.eat(':') {
                second = scanner.fixed_digits(2)?;
                if scanner.eat('.') || scanner.eat(',') {
                    let fraction = scanner.digits(usize::MAX);
                    if fraction.is_empty() {
                        return None;
                    }
                    milli = fraction_millis(&fraction);
                }
            }
        }
        time = NaiveTime::from_hms_milli_opt(hour, minute, second, milli)?;
        scanner.skip_whitespace();
        if scanner.eat('Z') {
            zone_minutes = Some(0);
        } else if let Some(sign) = scanner.eat_any(&['+', '-']) {
            let hours = i64::from(scanner.fixed_digits(2)?);
            scanner.eat(':');
            let minutes = if scanner.at_end() {
                0
            } else {
                i64::from(scanner.fixed_digits(2)?)
            };
            let total = hours * 60 + minutes;
            zone_minutes = Some(if sign == '-' { -total } else { total });
        }
    }
    if !scanner.at_end() {
        return None;
    }

    let local = date.and_time(time);
    Some(match zone_minutes {
        Some(zone) => frame.from_utc(local - Duration::minutes(zone)),
        None => local,
    })
}

fn fraction_millis(fraction: &str) -> u32 {
    let padded: String = fraction.chars().chain("000".chars()).take(3).collect();
    padded.parse().unwrap_or(0)
}

#[derive(Debug, Default)]
struct ParsedFields {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    milli: Option<u32>,
    week: Option<u32>,
    iso_weekday: Option<u32>,
    quarter: Option<u32>,
    pm: Option<bool>,
    timestamp_millis: Option<i64>,
    matched: bool,
    invalid: bool,
}

/// Forgiving parse against a single format: each field is searched for in the
/// remaining text, missing fields default like the web client does.
pub fn parse_with_format(
    text: &str,
    format: &str,
    language: LanguageTag,
    frame: DateFrame,
) -> Option<NaiveDateTime> {
    let names = names(language);
    let mut scanner = Scanner::new(text);
    let mut fields = ParsedFields::default();

    for token in tokenize(format) {
        match token {
            Token::Literal(literal) => scanner.skip_past(&literal),
            Token::Field(field) => parse_field(field, &mut scanner, &mut fields, names),
        }
        if fields.invalid {
            return None;
        }
    }

    if let Some(millis) = fields.timestamp_millis {
        let utc = chrono::DateTime::from_timestamp_millis(millis)?.naive_utc();
        return Some(frame.from_utc(utc));
    }
    if !fields.matched {
        return None;
    }
    build_date(&fields, frame.now())
}

fn parse_field(field: &str, scanner: &mut Scanner, fields: &mut ParsedFields, names: &Names) {
    match field {
        "YYYY" | "GGGG" | "gggg" => {
            if let Some((value, len)) = scanner.search_number(4) {
                fields.year = Some(if len <= 2 { two_digit_year(value) } else { value as i32 });
                fields.matched = true;
            }
        }
        "YY" | "GG" | "gg" => {
            if let Some((value, _)) = scanner.search_number(2) {
                fields.year = Some(two_digit_year(value));
                fields.matched = true;
            }
        }
        "Y" => {
            if let Some(value) = scanner.search_signed() {
                fields.year = i32::try_from(value).ok();
                fields.invalid |= fields.year.is_none();
                fields.matched = true;
            }
        }
        "Q" => set_number(scanner, 1, &mut fields.quarter, &mut fields.matched),
        "MM" | "M" => set_number(scanner, 2, &mut fields.month, &mut fields.matched),
        "MMMM" | "MMM" => {
            if let Some(word) = scanner.search_word() {
                match month_from_name(&word, names) {
                    Some(month) => {
                        fields.month = Some(month);
                        fields.matched = true;
                    }
                    None => fields.invalid = true,
                }
            }
        }
        "DD" | "D" => set_number(scanner, 2, &mut fields.day, &mut fields.matched),
        "Do" => {
            set_number(scanner, 2, &mut fields.day, &mut fields.matched);
            scanner.skip_while(|c| c.is_alphabetic() || c == '.');
        }
        "dddd" | "ddd" | "dd" => {
            scanner.search_word();
        }
        "d" | "e" => {
            if let Some((value, _)) = scanner.search_number(1) {
                fields.iso_weekday = Some(if value == 0 { 7 } else { value });
            }
        }
        "E" => set_number(scanner, 1, &mut fields.iso_weekday, &mut false),
        "WW" | "W" | "ww" | "w" => set_number(scanner, 2, &mut fields.week, &mut fields.matched),
        "HH" | "H" | "kk" | "k" => set_number(scanner, 2, &mut fields.hour, &mut fields.matched),
        "hh" | "h" => set_number(scanner, 2, &mut fields.hour, &mut fields.matched),
        "mm" | "m" => set_number(scanner, 2, &mut fields.minute, &mut fields.matched),
        "ss" | "s" => set_number(scanner, 2, &mut fields.second, &mut fields.matched),
        "SSS" | "SS" | "S" => {
            let digits = scanner.search_digits(field.len());
            if !digits.is_empty() {
                fields.milli = Some(fraction_millis(&digits));
                fields.matched = true;
            }
        }
        "A" | "a" => {
            if let Some(word) = scanner.search_word() {
                match word.to_lowercase().as_str() {
                    "am" | "a" => fields.pm = Some(false),
                    "pm" | "p" => fields.pm = Some(true),
                    _ => {}
                }
            }
        }
        "X" => {
            if let Some(seconds) = scanner.search_signed() {
                fields.timestamp_millis = seconds.checked_mul(1000);
            }
        }
        "x" => fields.timestamp_millis = scanner.search_signed(),
        _ => {}
    }
}

fn set_number(scanner: &mut Scanner, max_digits: usize, target: &mut Option<u32>, matched: &mut bool) {
    if let Some((value, _)) = scanner.search_number(max_digits) {
        *target = Some(value);
        *matched = true;
    }
}

fn two_digit_year(value: u32) -> i32 {
    let value = value as i32;
    if value > 68 {
        1900 + value
    } else {
        2000 + value
    }
}

fn iso_weekday(number: u32) -> Weekday {
    match number {
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        7 => Weekday::Sun,
        _ => Weekday::Mon,
    }
}

fn month_from_name(word: &str, names: &Names) -> Option<u32> {
    let lower = word.to_lowercase();
    let find = |list: &[&str; 12]| {
        list.iter()
            .position(|m| m.to_lowercase().trim_end_matches('.') == lower.trim_end_matches('.'))
    };
    find(&names.months)
        .or_else(|| find(&names.months_short))
        .or_else(|| find(&EN.months))
        .or_else(|| find(&EN.months_short))
        .map(|index| index as u32 + 1)
}

fn build_date(fields: &ParsedFields, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let mut hour = fields.hour.unwrap_or(0);
    match fields.pm {
        Some(true) if hour < 12 => hour += 12,
        Some(false) if hour == 12 => hour = 0,
        _ => {}
    }
    let time = NaiveTime::from_hms_milli_opt(
        hour,
        fields.minute.unwrap_or(0),
        fields.second.unwrap_or(0),
        fields.milli.unwrap_or(0),
    )?;

    if let Some(week) = fields.week {
        let year = fields.year.unwrap_or_else(|| now.iso_week().year());
        let weekday = iso_weekday(fields.iso_weekday.unwrap_or(1));
        return NaiveDate::from_isoywd_opt(year, week, weekday).map(|d| d.and_time(time));
    }

    let month = fields
        .month
        .or_else(|| fields.quarter.map(|q| q.saturating_sub(1) * 3 + 1));
    // Leading missing parts come from today; once a part is given, the rest
    // start at their minimum.
    let (year, month, day) = match (fields.year, month, fields.day) {
        (None, None, None) => (now.year(), now.month(), now.day()),
        (None, None, Some(day)) => (now.year(), now.month(), day),
        (None, Some(month), day) => (now.year(), month, day.unwrap_or(1)),
        (Some(year), month, day) => (year, month.unwrap_or(1), day.unwrap_or(1)),
    };
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(time))
}

// ============================================================================
// Scanner
// ============================================================================

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, set: &[char]) -> Option<char> {
        let c = self.peek().filter(|c| set.contains(c))?;
        self.pos += 1;
        Some(c)
    }

    fn expect(&mut self, c: char) -> Option<()> {
        self.eat(c).then_some(())
    }

    fn skip_whitespace(&mut self) {
        self.skip_while(char::is_whitespace);
    }

    fn skip_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.pos += 1;
        }
    }

    fn digits(&mut self, max: usize) -> String {
        let mut out = String::new();
        while out.len() < max {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    out.push(c);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        out
    }

    fn fixed_digits(&mut self, count: usize) -> Option<u32> {
        let digits = self.digits(count);
        if digits.len() == count {
            digits.parse().ok()
        } else {
            None
        }
    }

    /// Advances to the next digit and reads up to `max` digits.
    fn search_digits(&mut self, max: usize) -> String {
        let Some(offset) = self.chars[self.pos..].iter().position(char::is_ascii_digit) else {
            return String::new();
        };
        self.pos += offset;
        self.digits(max)
    }

    fn search_number(&mut self, max: usize) -> Option<(u32, usize)> {
        let digits = self.search_digits(max);
        let len = digits.len();
        digits.parse().ok().map(|value| (value, len))
    }

    fn search_signed(&mut self) -> Option<i64> {
        let offset = self.chars[self.pos..].iter().position(char::is_ascii_digit)?;
        let digit_pos = self.pos + offset;
        let negative = digit_pos > self.pos && self.chars[digit_pos - 1] == '-';
        self.pos = digit_pos;
        let digits = self.digits(usize::MAX);
        let value: i64 = digits.parse().ok()?;
        Some(if negative { -value } else { value })
    }

    fn search_word(&mut self) -> Option<String> {
        let offset = self.chars[self.pos..].iter().position(|c| c.is_alphabetic())?;
        self.pos += offset;
        let mut word = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_alphabetic() || *c == '.') {
            word.push(c);
            self.pos += 1;
        }
        Some(word)
    }

    /// Moves past the next occurrence of `literal`; stays put when absent.
    fn skip_past(&mut self, literal: &str) {
        let needle: Vec<char> = literal.chars().collect();
        if needle.is_empty() || self.pos >= self.chars.len() {
            return;
        }
        let haystack = &self.chars[self.pos..];
        if let Some(offset) = haystack.windows(needle.len()).position(|w| w == needle.as_slice()) {
            self.pos += offset + needle.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn formats_tokens() {
        let date = dt(2020, 4, 24, 14, 5);
        let frame = DateFrame::utc();
        assert_eq!(format_date(date, "DD.MM.YYYY HH:mm", LanguageTag::USA, frame), "24.04.2020 14:05");
        assert_eq!(format_date(date, "YYYY.MMMM.DD", LanguageTag::Slovak, frame), "2020.apríl.24");
        assert_eq!(format_date(date, "YYYY.MMMM.DD", LanguageTag::Czech, frame), "2020.dubna.24");
        assert_eq!(format_date(date, "Do MMM [at] h A", LanguageTag::USA, frame), "24th Apr at 2 PM");
        assert_eq!(format_date(date, "Q/YY", LanguageTag::USA, frame), "2/20");
    }

    #[test]
    fn parses_forgiving_input() {
        let frame = DateFrame::utc();
        assert_eq!(
            parse_with_format("19.05.2019 23:15", "DD.MM.YYYY HH:mm", LanguageTag::USA, frame),
            Some(dt(2019, 5, 19, 23, 15))
        );
        let week = parse_with_format("22.2020", "WW.YYYY", LanguageTag::USA, frame).unwrap();
        assert_eq!(format_date(week, "WW.YYYY", LanguageTag::USA, frame), "22.2020");
        assert!(parse_with_format("abc", "DD.MM.YYYY", LanguageTag::USA, frame).is_none());
        assert!(parse_with_format("45.13.2019", "DD.MM.YYYY", LanguageTag::USA, frame).is_none());
    }

    #[test]
    fn parses_iso_with_zone() {
        let frame = DateFrame::with_offset(Some(60));
        assert_eq!(parse_iso("2020-01-01T10:00:00.000Z", frame), Some(dt(2020, 1, 1, 11, 0)));
        assert_eq!(parse_iso("2020-01-01", frame), Some(dt(2020, 1, 1, 0, 0)));
        assert_eq!(frame.to_iso_string(dt(2020, 1, 1, 11, 0)), "2020-01-01T10:00:00.000Z");
        assert!(looks_like_iso("2020-01-01T10:00:00.000Z"));
        assert!(!looks_like_iso("2020-01-01"));
    }

    #[test]
    fn resets_by_granularity() {
        let date = dt(2019, 11, 20, 10, 20);
        assert_eq!(reset_unused_part(date, Some("Y")), dt(2019, 1, 1, 0, 0));
        assert_eq!(reset_unused_part(date, Some("MM Y")), dt(2019, 11, 1, 0, 0));
        assert_eq!(reset_unused_part(date, Some("D.MM.YYYY")), dt(2019, 11, 20, 0, 0));
        assert_eq!(reset_unused_part(date, Some("HH:mm")), dt(1970, 1, 1, 10, 20));
        assert_eq!(reset_unused_part(date, None), date);
        // 2019-11-20 is a Wednesday of ISO week 47.
        assert_eq!(reset_unused_part(date, Some("WW.YYYY")), dt(2019, 11, 18, 0, 0));
    }

    #[test]
    fn smallest_units() {
        assert_eq!(smallest_unit("DD.MM.YYYY HH:mm"), Some(DateUnit::Minute));
        assert_eq!(smallest_unit("MM Y"), Some(DateUnit::Month));
        assert_eq!(smallest_unit("[Week] W"), Some(DateUnit::Week));
        assert_eq!(smallest_unit(""), None);
        assert_eq!(
            add_unit(dt(2020, 1, 31, 0, 0), DateUnit::Month, 1),
            Some(dt(2020, 2, 29, 0, 0))
        );
    }
}
