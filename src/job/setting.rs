//! Tri-state job fields.
//!
//! A job may leave a field out (fall back to the process defaults), switch it
//! off with `false`, or give it a value. `Setting` keeps those three apart so
//! resolution never has to guess from falsy values.

use crate::job::redacted::RedactedString;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::result;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Setting<T> {
    #[default]
    Unset,
    Disabled,
    Value(T),
}

impl<T> Setting<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Setting::Unset)
    }
}

impl<T: Clone> Setting<T> {
    /// Job value wins, `Disabled` wins as "none", `Unset` takes the fallback.
    pub fn resolve(&self, fallback: Option<&T>) -> Option<T> {
        match self {
            Setting::Unset => fallback.cloned(),
            Setting::Disabled => None,
            Setting::Value(v) => Some(v.clone()),
        }
    }
}

impl<T> From<T> for Setting<T> {
    fn from(value: T) -> Self {
        Setting::Value(value)
    }
}

impl From<&str> for Setting<String> {
    fn from(value: &str) -> Self {
        Setting::Value(value.into())
    }
}

impl From<&str> for Setting<RedactedString> {
    fn from(value: &str) -> Self {
        Setting::Value(value.into())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSetting<T> {
    Flag(bool),
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Setting<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        match Option::<RawSetting<T>>::deserialize(deserializer)? {
            None => Ok(Setting::Unset),
            Some(RawSetting::Flag(false)) => Ok(Setting::Disabled),
            Some(RawSetting::Flag(true)) => Err(D::Error::custom(
                "`true` is not a valid setting, give a value or `false`",
            )),
            Some(RawSetting::Value(v)) => Ok(Setting::Value(v)),
        }
    }
}

impl<T: Serialize> Serialize for Setting<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        match self {
            Setting::Unset => serializer.serialize_none(),
            Setting::Disabled => serializer.serialize_bool(false),
            Setting::Value(v) => v.serialize(serializer),
        }
    }
}
