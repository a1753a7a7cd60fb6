//! Explicit partial-update field.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One field of a partial update.
///
/// In JSON a missing key is [`Patch::Keep`], an explicit `null` is
/// [`Patch::Clear`] and any other value is [`Patch::Set`]. Fields using this
/// type must be annotated `#[serde(default)]` so a missing key reaches
/// `Default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the stored value unchanged.
    Keep,
    /// Remove the stored value.
    Clear,
    /// Replace the stored value.
    Set(T),
}

impl<T> Patch<T> {
    /// Apply this patch to the current value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Keep => current,
            Patch::Clear => None,
            Patch::Set(value) => Some(value),
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// `Some` sets, `None` keeps.
    fn from(value: Option<T>) -> Self {
        value.map_or(Patch::Keep, Patch::Set)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Set(value) => value.serialize(serializer),
            Patch::Keep | Patch::Clear => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Doc {
        #[serde(default)]
        age: Patch<i32>,
    }

    #[test]
    fn missing_key_keeps() {
        let doc: Doc = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.age, Patch::Keep);
    }

    #[test]
    fn null_clears() {
        let doc: Doc = serde_json::from_str(r#"{"age": null}"#).unwrap();
        assert_eq!(doc.age, Patch::Clear);
    }

    #[test]
    fn value_sets() {
        let doc: Doc = serde_json::from_str(r#"{"age": 30}"#).unwrap();
        assert_eq!(doc.age, Patch::Set(30));
    }

    #[test]
    fn apply_semantics() {
        assert_eq!(Patch::Keep.apply(Some(1)), Some(1));
        assert_eq!(Patch::<i32>::Clear.apply(Some(1)), None);
        assert_eq!(Patch::Set(2).apply(None), Some(2));
    }
}
