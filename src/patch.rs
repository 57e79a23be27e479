//! Helpers for partial-update request bodies.
//!
//! A nullable field in a patch body has three states: absent (leave the
//! column alone), `null` (clear it) and a value (set it). Declare such fields
//! as `Option<Option<T>>` with
//! `#[serde(default, deserialize_with = "crate::patch::nullable")]`.

use serde::{Deserialize, Deserializer};

pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
