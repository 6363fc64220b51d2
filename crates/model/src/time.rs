use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid time of day: {0:?}")]
pub struct TimeParseError(pub String);

/// Parses `HH:mm` or `HH:mm:ss`. Anything else is rejected.
pub fn parse_time(value: &str) -> Result<NaiveTime, TimeParseError> {
    let err = || TimeParseError(value.to_owned());
    let parts = value.split(':').collect::<Vec<_>>();
    if !(parts.len() == 2 || parts.len() == 3) {
        return Err(err());
    }
    if parts
        .iter()
        .any(|part| part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(err());
    }

    let hour = parts[0].parse::<u32>().map_err(|_| err())?;
    let minute = parts[1].parse::<u32>().map_err(|_| err())?;
    let second = match parts.get(2) {
        Some(second) => second.parse::<u32>().map_err(|_| err())?,
        None => 0,
    };
    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(err)
}

pub fn fmt_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_long() {
        assert_eq!(
            parse_time("10:00").unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time("07:45:30").unwrap(),
            NaiveTime::from_hms_opt(7, 45, 30).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "10", "1:00", "10:0", "25:00", "10:60", "10:00:00:00", "aa:bb", "10-00"] {
            assert!(parse_time(bad).is_err(), "{bad} must be rejected");
        }
    }

    #[test]
    fn test_fmt_time() {
        assert_eq!(fmt_time(NaiveTime::from_hms_opt(9, 5, 59).unwrap()), "09:05");
    }
}
