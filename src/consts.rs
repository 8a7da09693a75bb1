/// Minimum valid year (inclusive)
pub const MIN_YEAR: u16 = 1;
/// Maximum valid year (inclusive)
pub const MAX_YEAR: u16 = 9999;

/// First day of month, used for lower bounds
pub const MIN_DAY: u8 = 1;

/// Month index for January (months are 0-indexed internally)
pub const JANUARY: u8 = 0;
/// Month index for February
pub const FEBRUARY: u8 = 1;
/// Month index for December
pub const DECEMBER: u8 = 11;

/// Days in February for non-leap years
pub const FEBRUARY_DAYS: u8 = 28;
/// Days in February for leap years
pub const FEBRUARY_DAYS_LEAP: u8 = 29;

/// Maximum days in each month, indexed by 0-based month.
/// February shows 28 days (non-leap year default)
pub const DAYS_IN_MONTH: [u8; 12] = [
    31, // January
    28, // February (non-leap, adjusted by is_leap_year check)
    31, // March
    30, // April
    31, // May
    30, // June
    31, // July
    31, // August
    30, // September
    31, // October
    30, // November
    31, // December
];

/// Leap year occurs every 4 years
pub(crate) const LEAP_YEAR_CYCLE: u16 = 4;
/// Century years are not leap years unless...
pub(crate) const CENTURY_CYCLE: u16 = 100;
/// ...they are divisible by 400 (Gregorian calendar correction)
pub(crate) const GREGORIAN_CYCLE: u16 = 400;

pub const MAX_HOUR: u8 = 23;
pub const MAX_MINUTE: u8 = 59;
pub const MAX_SECOND: u8 = 59;
/// Hours between the AM and PM halves of a day
pub const HALF_DAY_HOURS: u8 = 12;

/// Year entry multiplies the typed digit by this (millennium digit only)
pub const YEAR_DIGIT_SCALE: u16 = 1000;

/// Character shown in an empty variable slot
pub const BLANK: char = ' ';

// Mask templates: `#` is a digit slot, `a` is an AM/PM letter slot,
// everything else is a literal.
pub const DIGIT_SLOT: char = '#';
pub const AMPM_SLOT: char = 'a';

pub const DATE_TEMPLATE: &str = "##/##/####";
pub const TIME_TEMPLATE: &str = "##:## aM";
pub const PHONE_TEMPLATE: &str = "(###)###-####";
pub const SSN_TEMPLATE: &str = "###-##-####";
pub const CURRENCY_TEMPLATE: &str = "$######.##";
pub const PERCENT_TEMPLATE: &str = "###.##%";
