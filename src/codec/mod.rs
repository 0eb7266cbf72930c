//! Time-based build version encoding
//!
//! Packs a UTC timestamp into the last two fields of a `Build.Major.Minor.Revision`
//! version so that every CI build gets a monotonically increasing, human-decodable
//! version without any shared counter.
//!
//! ## Layout
//!
//! ```text
//! elapsed  = whole seconds since <year>-01-01T00:00:00Z
//! shifted  = elapsed >> 6                  (64-second buckets)
//! Revision = shifted & 0xFFFF
//! Minor    = (shifted >> 16) + year * 10
//! ```
//!
//! A year holds at most 494,100 buckets, so `shifted >> 16` never exceeds 7 and the
//! year stays readable in `Minor` (`20250`..`20257` for 2025).
//!
//! The encoding is lossy: the low 6 bits of `elapsed` are dropped, so decoding yields
//! the start of the 64-second bucket, never later than the original instant.
//!
//! The 3-field form (`Build.Minor.Revision`) is for version fields that only accept three
//! components. It drops `Major`; decoding it assumes `Major` was 0.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};

use crate::error::{ModkitError, Result};

/// Largest year whose `year * 10` still leaves room in a 16-bit display field
pub const MAX_YEAR: i32 = 6553;

/// Number of low bits of elapsed seconds discarded by the encoding
pub const GRANULARITY_BITS: u32 = 6;

/// Width of one encoding bucket in seconds
pub const BUCKET_SECONDS: i64 = 1 << GRANULARITY_BITS;

const REVISION_BITS: u32 = 16;
const REVISION_MASK: u64 = 0xFFFF;

/// A 4-field build version carrying an encoded timestamp in `minor` and `revision`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildVersion {
    pub build: i32,
    pub major: i32,
    pub minor: i32,
    pub revision: u16,
}

/// The 3-field relabelling of [`BuildVersion`]: `major` holds the encoded `Minor`
/// and `minor` holds the encoded `Revision`. The original `Major` is not represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompactVersion {
    pub build: i32,
    pub major: i32,
    pub minor: i32,
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.build, self.major, self.minor, self.revision
        )
    }
}

impl fmt::Display for CompactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.build, self.major, self.minor)
    }
}

impl FromStr for BuildVersion {
    type Err = ModkitError;

    fn from_str(s: &str) -> Result<Self> {
        let fields = parse_fields(s, 4)?;
        let revision = u16::try_from(fields[3]).map_err(|_| {
            ModkitError::invalid_argument(format!("revision {} does not fit 16 bits", fields[3]))
        })?;
        Ok(BuildVersion {
            build: fields[0],
            major: fields[1],
            minor: fields[2],
            revision,
        })
    }
}

impl FromStr for CompactVersion {
    type Err = ModkitError;

    fn from_str(s: &str) -> Result<Self> {
        let fields = parse_fields(s, 3)?;
        Ok(CompactVersion {
            build: fields[0],
            major: fields[1],
            minor: fields[2],
        })
    }
}

fn parse_fields(s: &str, expected: usize) -> Result<Vec<i32>> {
    let fields = s
        .trim()
        .split('.')
        .map(|part| {
            part.parse::<i32>().map_err(|e| {
                ModkitError::invalid_argument(format!("'{s}' is not a version: {part}: {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if fields.len() != expected {
        return Err(ModkitError::invalid_argument(format!(
            "'{s}' has {} fields, expected {expected}",
            fields.len()
        )));
    }
    Ok(fields)
}

fn start_of_year(year: i32) -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ModkitError::Range {
            message: format!("year {year} is not representable"),
        })
}

/// Encode `at` into a 4-field build version.
///
/// `build` and `major` are passed through untouched.
///
/// # Errors
///
/// `Range` if the year is after [`MAX_YEAR`], `InvalidArgument` if it is before year 1.
pub fn encode(build: i32, major: i32, at: DateTime<Utc>) -> Result<BuildVersion> {
    let year = at.year();
    if year > MAX_YEAR {
        return Err(ModkitError::Range {
            message: format!("year {year} is after {MAX_YEAR}"),
        });
    }
    if year < 1 {
        return Err(ModkitError::invalid_argument(format!(
            "year {year} is before year 1"
        )));
    }

    let elapsed = u64::try_from((at - start_of_year(year)?).num_seconds()).map_err(|_| {
        ModkitError::invalid_argument(format!("{at} precedes the start of its year"))
    })?;
    let shifted = elapsed >> GRANULARITY_BITS;
    let high = i32::try_from(shifted >> REVISION_BITS).map_err(|_| ModkitError::Range {
        message: format!("{elapsed} seconds overflow the minor field"),
    })?;
    #[allow(clippy::cast_possible_truncation)]
    let revision = (shifted & REVISION_MASK) as u16;

    Ok(BuildVersion {
        build,
        major,
        minor: high + year * 10,
        revision,
    })
}

/// Decode a 4-field build version back to the start of its 64-second bucket.
///
/// The result is at most 63 seconds (plus any sub-second part) earlier than the
/// instant that was encoded.
pub fn decode(version: &BuildVersion) -> Result<DateTime<Utc>> {
    if version.minor < 10 {
        return Err(ModkitError::invalid_argument(format!(
            "{version} does not carry an encoded timestamp"
        )));
    }
    let year = version.minor / 10;
    let high = i64::from(version.minor - year * 10);
    let shifted = (high << REVISION_BITS) | i64::from(version.revision);
    let elapsed = shifted << GRANULARITY_BITS;

    let start = start_of_year(year)?;
    start
        .checked_add_signed(TimeDelta::seconds(elapsed))
        .ok_or_else(|| ModkitError::Range {
            message: format!("{version} decodes past the representable range"),
        })
}

/// Encode `at` into the 3-field form with `Major` fixed at 0
pub fn encode_compact(build: i32, at: DateTime<Utc>) -> Result<CompactVersion> {
    let full = encode(build, 0, at)?;
    Ok(CompactVersion {
        build: full.build,
        major: full.minor,
        minor: i32::from(full.revision),
    })
}

/// Decode the 3-field form, assuming the original `Major` was 0.
///
/// Versions encoded with a nonzero `Major` must be decoded with [`decode`].
pub fn decode_compact(version: &CompactVersion) -> Result<DateTime<Utc>> {
    let revision = u16::try_from(version.minor).map_err(|_| {
        ModkitError::invalid_argument(format!("{version}: minor does not fit 16 bits"))
    })?;
    decode(&BuildVersion {
        build: version.build,
        major: 0,
        minor: version.major,
        revision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_encode_start_of_2025() {
        let v = encode(1, 0, utc(2025, 1, 1, 0, 0, 0)).unwrap();
        assert_eq!(v.minor, 20250);
        assert_eq!(v.revision, 0);
        assert_eq!(v.to_string(), "1.0.20250.0");
    }

    #[test]
    fn test_encode_one_bucket_later() {
        let v = encode(1, 0, utc(2025, 1, 1, 0, 1, 4)).unwrap();
        assert_eq!(v.revision, 1);
        assert_eq!(v.to_string(), "1.0.20250.1");
    }

    #[test]
    fn test_encode_carries_into_minor() {
        // 65536 buckets of 64s = 4194304s, about 48.5 days in
        let at = utc(2025, 1, 1, 0, 0, 0) + TimeDelta::seconds(65_536 * 64);
        let v = encode(3, 2, at).unwrap();
        assert_eq!(v.minor, 20251);
        assert_eq!(v.revision, 0);
        assert_eq!((v.build, v.major), (3, 2));
    }

    #[test]
    fn test_encode_end_of_leap_year_stays_in_year() {
        let v = encode(1, 0, utc(2024, 12, 31, 23, 59, 59)).unwrap();
        assert_eq!(v.minor / 10, 2024);
        assert!(v.minor - 20240 <= 7);
    }

    #[test]
    fn test_year_bounds() {
        assert!(encode(1, 0, utc(6553, 12, 31, 23, 59, 59)).is_ok());
        let err = encode(1, 0, utc(6554, 1, 1, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, ModkitError::Range { .. }));
    }

    #[test]
    fn test_encode_rejects_year_zero() {
        let err = encode(1, 0, utc(0, 6, 1, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, ModkitError::InvalidArgument { .. }));
    }

    #[test]
    fn test_decode_returns_bucket_start() {
        let at = utc(2025, 3, 14, 15, 9, 26);
        let decoded = decode(&encode(1, 0, at).unwrap()).unwrap();
        assert!(decoded <= at);
        assert!(at - decoded < TimeDelta::seconds(BUCKET_SECONDS));
        assert_eq!(decoded.timestamp() % BUCKET_SECONDS, 0);
    }

    #[test]
    fn test_decode_rejects_plain_versions() {
        let err = decode(&"1.2.3.4".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ModkitError::InvalidArgument { .. }));
    }

    #[test]
    fn test_compact_round_trip_assumes_zero_major() {
        let at = utc(2030, 7, 4, 12, 0, 0);
        let compact = encode_compact(9, at).unwrap();
        let full = encode(9, 0, at).unwrap();
        assert_eq!(compact.major, full.minor);
        assert_eq!(compact.minor, i32::from(full.revision));
        assert_eq!(decode_compact(&compact).unwrap(), decode(&full).unwrap());
    }

    #[test]
    fn test_parse_versions() {
        let v: BuildVersion = "1.0.20250.17".parse().unwrap();
        assert_eq!(v.revision, 17);
        let c: CompactVersion = "1.20250.17".parse().unwrap();
        assert_eq!(c.major, 20250);
        assert!("1.0.20250".parse::<BuildVersion>().is_err());
        assert!("1.0.20250.70000".parse::<BuildVersion>().is_err());
        assert!("a.b.c".parse::<CompactVersion>().is_err());
    }

    fn year_and_offset() -> impl Strategy<Value = DateTime<Utc>> {
        (1i32..=MAX_YEAR, 0i64..(366 * 86_400)).prop_map(|(year, offset)| {
            let start = start_of_year(year).unwrap();
            let next = start_of_year(year + 1).unwrap();
            let len = (next - start).num_seconds();
            start + TimeDelta::seconds(offset % len)
        })
    }

    proptest! {
        #[test]
        fn prop_decode_is_within_one_bucket(at in year_and_offset()) {
            let decoded = decode(&encode(1, 0, at).unwrap()).unwrap();
            prop_assert!(decoded <= at);
            prop_assert!(at - decoded <= TimeDelta::seconds(BUCKET_SECONDS - 1));
            prop_assert_eq!(decoded.year(), at.year());
        }

        #[test]
        fn prop_same_bucket_encodes_identically(at in year_and_offset(), delta in 0i64..BUCKET_SECONDS) {
            let bucket_start = decode(&encode(1, 0, at).unwrap()).unwrap();
            let other = bucket_start + TimeDelta::seconds(delta);
            prop_assume!(other.year() == at.year());
            prop_assert_eq!(encode(4, 5, at).unwrap(), encode(4, 5, other).unwrap());
        }

        #[test]
        fn prop_encoding_is_monotonic(at in year_and_offset(), step in 0i64..10_000_000) {
            let later = at + TimeDelta::seconds(step);
            prop_assume!(later.year() <= MAX_YEAR);
            prop_assert!(encode(1, 0, at).unwrap() <= encode(1, 0, later).unwrap());
        }
    }
}
