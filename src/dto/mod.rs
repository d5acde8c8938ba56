use serde::{Deserialize, Deserializer};

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod products;
pub mod users;

/// Lets a patch field tell "absent" (`None`) apart from an explicit
/// `null` (`Some(None)`). Use with `#[serde(default, deserialize_with = ...)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
