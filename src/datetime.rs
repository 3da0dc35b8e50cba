use crate::{Result, Tag};

/// Timezone attached to an ASN.1 time value
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Asn1TimeZone {
    /// No timezone provided
    Undefined,
    /// Coordinated universal time
    Z,
    /// Offset to coordinated universal time: signed hours, minutes
    Offset(i8, u8),
}

/// Wall-clock instant carried by UTCTime and GeneralizedTime values
///
/// Components are stored as read from (or destined for) the text encoding;
/// in particular, a UTCTime year is the raw two-digit value.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Asn1DateTime {
    pub year: u32,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub millisecond: Option<u32>,
    pub tz: Asn1TimeZone,
}

impl Asn1DateTime {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        year: u32,
        month: u16,
        day: u16,
        hour: u16,
        minute: u16,
        second: u16,
        millisecond: Option<u32>,
        tz: Asn1TimeZone,
    ) -> Self {
        Asn1DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
            tz,
        }
    }

    /// Return a ISO 8601 combined date and time with time zone.
    ///
    /// An `Undefined` timezone is interpreted as UTC.
    #[cfg(feature = "datetime")]
    #[cfg_attr(docsrs, doc(cfg(feature = "datetime")))]
    pub fn to_datetime(&self) -> Result<time::OffsetDateTime> {
        use crate::Error;
        use core::convert::TryFrom;
        use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};

        let month = Month::try_from(self.month as u8).map_err(|_| Error::InvalidDateTime)?;
        let date = Date::from_calendar_date(self.year as i32, month, self.day as u8)
            .map_err(|_| Error::InvalidDateTime)?;
        let micro = self.millisecond.unwrap_or(0).saturating_mul(1000);
        let time = Time::from_hms_micro(self.hour as u8, self.minute as u8, self.second as u8, micro)
            .map_err(|_| Error::InvalidDateTime)?;
        let offset = match self.tz {
            Asn1TimeZone::Undefined | Asn1TimeZone::Z => UtcOffset::UTC,
            Asn1TimeZone::Offset(hours, minutes) => {
                let minutes = if hours < 0 {
                    -(minutes as i8)
                } else {
                    minutes as i8
                };
                UtcOffset::from_hms(hours, minutes, 0).map_err(|_| Error::InvalidDateTime)?
            }
        };
        Ok(PrimitiveDateTime::new(date, time).assume_offset(offset))
    }
}

/// Decode 2-digit decimal value
pub(crate) fn decode_decimal(tag: Tag, hi: u8, lo: u8) -> Result<u16> {
    if hi.is_ascii_digit() && lo.is_ascii_digit() {
        Ok((hi - b'0') as u16 * 10 + (lo - b'0') as u16)
    } else {
        Err(tag.invalid_value("expected digit"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_digits() {
        assert_eq!(decode_decimal(Tag::UtcTime, b'4', b'2'), Ok(42));
        assert!(decode_decimal(Tag::UtcTime, b'x', b'2').is_err());
    }
}
