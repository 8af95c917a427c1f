use serde::Serializer;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

/// Formats a timestamp as `HH:MM:SS` for transcript listings.
pub fn clock(datetime: OffsetDateTime) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        datetime.hour(),
        datetime.minute(),
        datetime.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn serialize_rfc3339() {
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::new(&mut out);
        serialize(&datetime!(2025-02-19 0:00:00 UTC), &mut serializer).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#""2025-02-19T00:00:00Z""#);
    }

    #[test]
    fn clock_format() {
        assert_eq!(clock(datetime!(2025-02-19 7:05:09 UTC)), "07:05:09");
    }
}
