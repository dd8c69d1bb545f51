//! Holder for a job's `dest_key`.
//!
//! The key is read from the job config and written once, single-quoted, into the
//! rendered script's environment lines. Everywhere else (tracing, `{:?}` of a job,
//! a plan dump) it prints as [`REDACTED_SECRET`].

use bon::Builder;
use derive_more::From;
use getset::Getters;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Formatter};
use std::result;
use zeroize::Zeroize;

/// Printed in place of a destination key.
pub static REDACTED_SECRET: &str = "###REDACTED_SECRET###";

/// Destination secret key. `inner()` is the only way to the real value; only
/// `build_environment` calls it, when emitting the credential assignment.
#[derive(Clone, Zeroize, From, Builder, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RedactedString {
    #[builder(into)]
    inner: String,
}

impl From<&str> for RedactedString {
    fn from(value: &str) -> Self {
        RedactedString::builder().inner(value).build()
    }
}

impl Debug for RedactedString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", REDACTED_SECRET)
    }
}

impl Serialize for RedactedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED_SECRET)
    }
}

impl<'de> Deserialize<'de> for RedactedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        deserializer.deserialize_str(RedactedStringVisitor)
    }
}

impl Drop for RedactedString {
    fn drop(&mut self) {
        self.zeroize();
    }
}

struct RedactedStringVisitor;

impl Visitor<'_> for RedactedStringVisitor {
    type Value = RedactedString;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, v: &str) -> result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(RedactedString::from(v))
    }
}
