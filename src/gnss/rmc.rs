//! Recommended-minimum (RMC) sentence decoding.
//!
//! ```text
//! $GNRMC,101530,A,4807.038,N,01131.000,E,005.5,,150324,,,A*00
//!    0      1   2     3    4     5     6   7   8   9
//! ```
//!
//! | Index | Field |
//! |-------|-------|
//! | 1 | time `hhmmss[.ss]` |
//! | 2 | status, `A` valid / `V` void |
//! | 3, 4 | latitude `DDMM.MMMM`, `N`/`S` |
//! | 5, 6 | longitude `DDDMM.MMMM`, `E`/`W` |
//! | 7 | speed over ground, knots |
//! | 8 | course (ignored) |
//! | 9 | date `DDMMYY` |
//!
//! The checksum after `*` is not verified; parsing simply stops there.

use crate::config::KNOTS_TO_KPH;
use crate::gnss::Fix;

/// Sentence prefixes accepted (GPS-only and multi-constellation talkers).
pub const RMC_PREFIXES: [&str; 2] = ["$GPRMC,", "$GNRMC,"];

/// Fields beyond this many bytes are truncated before decoding.
pub const FIELD_MAX: usize = 15;

const FIELD_TIME: usize = 1;
const FIELD_STATUS: usize = 2;
const FIELD_LAT: usize = 3;
const FIELD_LAT_HEMI: usize = 4;
const FIELD_LON: usize = 5;
const FIELD_LON_HEMI: usize = 6;
const FIELD_SPEED: usize = 7;
const FIELD_DATE: usize = 9;
const FIELD_COUNT: usize = FIELD_DATE + 1;

const LAT_MAX: f64 = 90.0;
const LON_MAX: f64 = 180.0;

/// Decode one RMC line into a [`Fix`].
///
/// Returns `None` for other sentence types, for lines that end before the date
/// field, when any non-empty numeric field fails to parse, and for coordinates
/// outside the globe. A void status
/// or a missing coordinate still yields a `Fix`, just with `valid == false`.
pub fn parse_rmc(line: &str) -> Option<Fix> {
    if !RMC_PREFIXES.iter().any(|p| line.starts_with(p)) {
        return None;
    }

    let body = line.split('*').next().unwrap_or(line);
    let mut fields = [""; FIELD_COUNT];
    let mut count = 0;
    for (slot, field) in fields.iter_mut().zip(body.split(',')) {
        *slot = truncate(field);
        count += 1;
    }
    if count < FIELD_COUNT {
        return None;
    }

    let time_min = parse_time(fields[FIELD_TIME])?;
    let lat = parse_coordinate(fields[FIELD_LAT], fields[FIELD_LAT_HEMI], 'S', LAT_MAX)?;
    let lon = parse_coordinate(fields[FIELD_LON], fields[FIELD_LON_HEMI], 'W', LON_MAX)?;
    let knots = parse_number::<f32>(fields[FIELD_SPEED])?.unwrap_or(0.0);
    let date = parse_date(fields[FIELD_DATE])?;

    let status_ok = fields[FIELD_STATUS] == "A";
    let (valid, lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => (status_ok, lat, lon),
        _ => (false, 0.0, 0.0),
    };

    Some(Fix {
        lat,
        lon,
        speed_kph: knots * KNOTS_TO_KPH,
        valid,
        time_min,
        date,
    })
}

// =============================================================================
// Field Decoders
// =============================================================================
//
// Each decoder returns `None` for a malformed non-empty field (the whole line is
// rejected) and `Some(..)` otherwise, with an inner default for empty fields.

/// Limit a field to [`FIELD_MAX`] bytes on a char boundary.
fn truncate(field: &str) -> &str {
    if field.len() <= FIELD_MAX {
        return field;
    }
    let mut end = FIELD_MAX;
    while !field.is_char_boundary(end) {
        end -= 1;
    }
    &field[..end]
}

/// Plain decimal only: `nan`, `inf` and exponents are malformed.
fn parse_number<T: core::str::FromStr>(field: &str) -> Option<Option<T>> {
    if field.is_empty() {
        return Some(None);
    }
    if !field.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+')) {
        return None;
    }
    field.parse().ok().map(Some)
}

/// `DDMM.MMMM` / `DDDMM.MMMM` to signed decimal degrees.
///
/// Values beyond `max_degrees` are malformed.
fn parse_coordinate(
    field: &str,
    hemisphere: &str,
    negative: char,
    max_degrees: f64,
) -> Option<Option<f64>> {
    let Some(raw) = parse_number::<f64>(field)? else {
        return Some(None);
    };
    let degrees = libm::trunc(raw / 100.0);
    let minutes = raw - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;
    if !decimal.is_finite() || decimal.abs() > max_degrees {
        return None;
    }
    let signed = if hemisphere.starts_with(negative) { -decimal } else { decimal };
    Some(Some(signed))
}

/// `hhmm[ss[.ss]]` to minutes since midnight; seconds are discarded.
fn parse_time(field: &str) -> Option<u16> {
    if field.is_empty() {
        return Some(0);
    }
    let digits = field.as_bytes().get(..4)?;
    let hh = two_digits(&digits[..2])?;
    let mm = two_digits(&digits[2..])?;
    if hh > 23 || mm > 59 {
        return Some(0);
    }
    Some(u16::from(hh) * 60 + u16::from(mm))
}

/// `DDMMYY` to `YYYYMMDD`, assuming 20YY. Out-of-range day or month gives 0.
fn parse_date(field: &str) -> Option<u32> {
    if field.is_empty() {
        return Some(0);
    }
    let b = field.as_bytes();
    if b.len() != 6 {
        return None;
    }
    let dd = two_digits(&b[..2])?;
    let mm = two_digits(&b[2..4])?;
    let yy = two_digits(&b[4..])?;
    if !(1..=31).contains(&dd) || !(1..=12).contains(&mm) {
        return Some(0);
    }
    let year = 2000 + u32::from(yy);
    Some(year * 10_000 + u32::from(mm) * 100 + u32::from(dd))
}

fn two_digits(b: &[u8]) -> Option<u8> {
    match b {
        [hi, lo] if hi.is_ascii_digit() && lo.is_ascii_digit() => Some((hi - b'0') * 10 + (lo - b'0')),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
