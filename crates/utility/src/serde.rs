pub mod date_time {
    use chrono::{DateTime, FixedOffset, Local};
    use serde::{de::Error, Deserialize as _, Deserializer};

    /// Parses RFC 3339 as well as the `YYYY-MM-DD HH:MM:SS[.f]+TZ` form
    /// postgres emits for `timestamptz` columns rendered as text.
    pub fn parse_flexible(s: &str) -> Option<DateTime<Local>> {
        DateTime::parse_from_rfc3339(s)
            .or_else(|_| DateTime::<FixedOffset>::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"))
            .ok()
            .map(|date_time| date_time.with_timezone(&Local))
    }

    pub fn deserialize_flexible<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_flexible(&s).ok_or_else(|| Error::custom(format!("invalid timestamp `{}`", s)))
    }
}

pub mod string {
    use serde::{Deserialize as _, Deserializer};

    /// Maps missing, empty and whitespace-only strings to `None`.
    pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.filter(|s| !s.trim().is_empty()))
    }
}
