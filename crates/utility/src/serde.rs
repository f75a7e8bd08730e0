/// Used with `#[serde(default = "...")]` for flags that are on unless the
/// submitter says otherwise.
pub fn default_true() -> bool {
    true
}

pub mod trimmed {
    use serde::{Deserialize as _, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.trim().to_owned())
    }

    /// Blank strings are treated like a missing value.
    pub fn deserialize_option<'de, D>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()))
    }
}
