use super::Payload;
use crate::datetime::decode_decimal;
use crate::{Asn1DateTime, Asn1TimeZone, Error, Result, Tag};

/// Decode a UTCTime value: `YYMMDDhhmm[ss](Z|±hhmm)`.
///
/// X.680 section 47 restricts UniversalTime to a VisibleString of that
/// shape; the timezone designator is mandatory. The two-digit year is kept
/// as read; interpretation of the century is left to the caller.
pub(crate) fn decode_utc(bytes: &[u8]) -> Result<Payload> {
    let (year, month, day, hour, minute, rem) = match bytes {
        [year1, year2, mon1, mon2, day1, day2, hour1, hour2, min1, min2, rem @ ..] => {
            let year = decode_decimal(Tag::UtcTime, *year1, *year2)?;
            let month = decode_decimal(Tag::UtcTime, *mon1, *mon2)?;
            let day = decode_decimal(Tag::UtcTime, *day1, *day2)?;
            let hour = decode_decimal(Tag::UtcTime, *hour1, *hour2)?;
            let minute = decode_decimal(Tag::UtcTime, *min1, *min2)?;
            (year, month, day, hour, minute, rem)
        }
        _ => return Err(Tag::UtcTime.invalid_value("malformed time string (not yymmddhhmm)")),
    };
    // check for optional seconds
    let (second, rem) = match rem {
        [sec1, sec2, rem @ ..] if sec1.is_ascii_digit() => {
            (decode_decimal(Tag::UtcTime, *sec1, *sec2)?, rem)
        }
        _ => (0, rem),
    };
    check_clock(Tag::UtcTime, month, day, hour, minute, second)?;
    let tz = match rem {
        [b'Z'] => Asn1TimeZone::Z,
        [b'+', h1, h2, m1, m2] => {
            let hh = decode_decimal(Tag::UtcTime, *h1, *h2)?;
            let mm = decode_decimal(Tag::UtcTime, *m1, *m2)?;
            Asn1TimeZone::Offset(hh as i8, mm as u8)
        }
        [b'-', h1, h2, m1, m2] => {
            let hh = decode_decimal(Tag::UtcTime, *h1, *h2)?;
            let mm = decode_decimal(Tag::UtcTime, *m1, *m2)?;
            Asn1TimeZone::Offset(-(hh as i8), mm as u8)
        }
        _ => return Err(Tag::UtcTime.invalid_value("malformed time string: no time zone")),
    };
    Ok(Payload::UtcTime(Asn1DateTime::new(
        year as u32,
        month,
        day,
        hour,
        minute,
        second,
        None,
        tz,
    )))
}

pub(crate) fn encode_utc(payload: &Payload) -> Result<Vec<u8>> {
    let dt = match payload {
        Payload::UtcTime(dt) => dt,
        _ => return Err(Error::BerTypeError),
    };
    // fold a full year back to the two-digit form
    let year = match dt.year {
        y @ 0..=99 => y,
        y @ 1950..=1999 => y - 1900,
        y @ 2000..=2049 => y - 2000,
        _ => return Err(Error::InvalidDateTime),
    };
    let mut s = format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}",
        year, dt.month, dt.day, dt.hour, dt.minute, dt.second
    );
    push_zone(&mut s, &dt.tz, true);
    Ok(s.into_bytes())
}

/// Decode a GeneralizedTime value: `YYYYMMDDhhmm[ss[.fff]][Z|±hhmm]`.
pub(crate) fn decode_generalized(bytes: &[u8]) -> Result<Payload> {
    let (year, month, day, hour, minute, rem) = match bytes {
        [y1, y2, y3, y4, mon1, mon2, day1, day2, hour1, hour2, min1, min2, rem @ ..] => {
            let century = decode_decimal(Tag::GeneralizedTime, *y1, *y2)?;
            let year = decode_decimal(Tag::GeneralizedTime, *y3, *y4)?;
            let month = decode_decimal(Tag::GeneralizedTime, *mon1, *mon2)?;
            let day = decode_decimal(Tag::GeneralizedTime, *day1, *day2)?;
            let hour = decode_decimal(Tag::GeneralizedTime, *hour1, *hour2)?;
            let minute = decode_decimal(Tag::GeneralizedTime, *min1, *min2)?;
            (
                u32::from(century) * 100 + u32::from(year),
                month,
                day,
                hour,
                minute,
                rem,
            )
        }
        _ => {
            return Err(
                Tag::GeneralizedTime.invalid_value("malformed time string (not yyyymmddhhmm)")
            )
        }
    };
    let (second, rem) = match rem {
        [sec1, sec2, rem @ ..] if sec1.is_ascii_digit() => {
            (decode_decimal(Tag::GeneralizedTime, *sec1, *sec2)?, rem)
        }
        _ => (0, rem),
    };
    // fractional seconds, up to millisecond precision
    let (millisecond, rem) = match rem {
        [b'.', rem @ ..] => {
            let digits = rem.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits == 0 || digits > 3 {
                return Err(Tag::GeneralizedTime.invalid_value("invalid fractional seconds"));
            }
            let mut frac = 0u32;
            for b in &rem[..digits] {
                frac = frac * 10 + u32::from(b - b'0');
            }
            for _ in digits..3 {
                frac *= 10;
            }
            (Some(frac), &rem[digits..])
        }
        _ => (None, rem),
    };
    check_clock(Tag::GeneralizedTime, month, day, hour, minute, second)?;
    let tz = match rem {
        [] => Asn1TimeZone::Undefined,
        [b'Z'] => Asn1TimeZone::Z,
        [b'+', h1, h2, m1, m2] => {
            let hh = decode_decimal(Tag::GeneralizedTime, *h1, *h2)?;
            let mm = decode_decimal(Tag::GeneralizedTime, *m1, *m2)?;
            Asn1TimeZone::Offset(hh as i8, mm as u8)
        }
        [b'-', h1, h2, m1, m2] => {
            let hh = decode_decimal(Tag::GeneralizedTime, *h1, *h2)?;
            let mm = decode_decimal(Tag::GeneralizedTime, *m1, *m2)?;
            Asn1TimeZone::Offset(-(hh as i8), mm as u8)
        }
        _ => return Err(Tag::GeneralizedTime.invalid_value("malformed time string")),
    };
    Ok(Payload::GeneralizedTime(Asn1DateTime::new(
        year,
        month,
        day,
        hour,
        minute,
        second,
        millisecond,
        tz,
    )))
}

pub(crate) fn encode_generalized(payload: &Payload) -> Result<Vec<u8>> {
    let dt = match payload {
        Payload::GeneralizedTime(dt) => dt,
        _ => return Err(Error::BerTypeError),
    };
    if dt.year > 9999 {
        return Err(Error::InvalidDateTime);
    }
    let mut s = format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
    );
    if let Some(ms) = dt.millisecond {
        s.push_str(&format!(".{:03}", ms));
    }
    push_zone(&mut s, &dt.tz, false);
    Ok(s.into_bytes())
}

fn push_zone(s: &mut String, tz: &Asn1TimeZone, zone_required: bool) {
    match tz {
        Asn1TimeZone::Z => s.push('Z'),
        Asn1TimeZone::Undefined => {
            if zone_required {
                s.push('Z');
            }
        }
        Asn1TimeZone::Offset(hours, minutes) => {
            let sign = if *hours < 0 { '-' } else { '+' };
            s.push_str(&format!("{}{:02}{:02}", sign, hours.unsigned_abs(), minutes));
        }
    }
}

fn check_clock(tag: Tag, month: u16, day: u16, hour: u16, minute: u16, second: u16) -> Result<()> {
    if month == 0 || month > 12 || day == 0 || day > 31 || hour > 23 || minute > 59 || second > 59
    {
        Err(tag.invalid_value("time components with invalid values"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utctime_codec() {
        let decoded = decode_utc(b"990102123456Z").expect("decoding failed");
        let dt = decoded.as_datetime().expect("not a time value");
        assert_eq!((dt.year, dt.month, dt.day), (99, 1, 2));
        assert_eq!((dt.hour, dt.minute, dt.second), (12, 34, 56));
        assert_eq!(dt.tz, Asn1TimeZone::Z);
        assert_eq!(encode_utc(&decoded).unwrap(), b"990102123456Z");

        // without seconds
        let decoded = decode_utc(b"9901021234Z").expect("decoding failed");
        assert_eq!(decoded.as_datetime().map(|dt| dt.second), Some(0));

        // with offset
        let decoded = decode_utc(b"990102123456-0500").expect("decoding failed");
        assert_eq!(
            decoded.as_datetime().map(|dt| dt.tz),
            Some(Asn1TimeZone::Offset(-5, 0))
        );
        assert_eq!(encode_utc(&decoded).unwrap(), b"990102123456-0500");

        // timezone is mandatory
        assert!(decode_utc(b"990102123456").is_err());
        assert!(decode_utc(b"9901").is_err());
        // out-of-range components
        assert!(decode_utc(b"991302123456Z").is_err());
    }

    #[test]
    fn utctime_encode_year_folding() {
        let dt = Asn1DateTime::new(1999, 1, 2, 3, 4, 5, None, Asn1TimeZone::Z);
        assert_eq!(
            encode_utc(&Payload::UtcTime(dt)).unwrap(),
            b"990102030405Z"
        );
        let dt = Asn1DateTime::new(2023, 1, 2, 3, 4, 5, None, Asn1TimeZone::Z);
        assert_eq!(
            encode_utc(&Payload::UtcTime(dt)).unwrap(),
            b"230102030405Z"
        );
        let dt = Asn1DateTime::new(2080, 1, 2, 3, 4, 5, None, Asn1TimeZone::Z);
        assert!(encode_utc(&Payload::UtcTime(dt)).is_err());
        // a GeneralizedTime payload is not valid under the UTCTime tag
        let dt = Asn1DateTime::new(1999, 1, 2, 3, 4, 5, None, Asn1TimeZone::Z);
        assert!(encode_utc(&Payload::GeneralizedTime(dt)).is_err());
    }

    #[test]
    fn generalizedtime_codec() {
        let decoded = decode_generalized(b"20021213142923Z").expect("decoding failed");
        let dt = decoded.as_datetime().expect("not a time value");
        assert_eq!((dt.year, dt.month, dt.day), (2002, 12, 13));
        assert_eq!(dt.tz, Asn1TimeZone::Z);
        assert_eq!(encode_generalized(&decoded).unwrap(), b"20021213142923Z");

        // local time with fractional seconds
        let decoded = decode_generalized(b"19851106210627.3").expect("decoding failed");
        let dt = decoded.as_datetime().expect("not a time value");
        assert_eq!(dt.millisecond, Some(300));
        assert_eq!(dt.tz, Asn1TimeZone::Undefined);
        assert_eq!(encode_generalized(&decoded).unwrap(), b"19851106210627.300");

        // UTC with fractional seconds
        let decoded = decode_generalized(b"19851106210627.3Z").expect("decoding failed");
        assert_eq!(decoded.as_datetime().map(|dt| dt.tz), Some(Asn1TimeZone::Z));

        // without seconds
        let decoded = decode_generalized(b"200212131429Z").expect("decoding failed");
        assert_eq!(decoded.as_datetime().map(|dt| dt.second), Some(0));

        assert!(decode_generalized(b"2002121314").is_err());
        assert!(decode_generalized(b"20021213142923.Z").is_err());
    }
}
