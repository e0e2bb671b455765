use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer};

/// Deserialize any `FromStr` value from its string form
pub(super) fn from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse()
        .map_err(|e: T::Err| serde::de::Error::custom(format!("invalid value '{raw}': {e}")))
}
