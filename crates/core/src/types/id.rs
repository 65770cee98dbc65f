//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing a catalog id with a user id or a sale id.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around an integer type with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `get()`
/// - `From` conversions to and from the inner integer
/// - `Display` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use pokestore_core::define_id;
/// define_id!(TrainerId, i32);
/// define_id!(BadgeId, i32);
///
/// let trainer = TrainerId::new(1);
/// let badge = BadgeId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: TrainerId = badge;
/// assert_eq!(trainer.get(), badge.get());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Create a new ID from its integer value.
            #[must_use]
            pub const fn new(id: $inner) -> Self {
                Self(id)
            }

            /// Get the underlying integer value.
            #[must_use]
            pub const fn get(&self) -> $inner {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<$inner>().map(Self)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Catalog number of a product (the Pokédex number on the remote API).
define_id!(ProductId, i64);
// Numeric user id carried in the bearer token claims.
define_id!(UserId, i64);
// Sale record id, derived from the creation timestamp in milliseconds.
define_id!(SaleId, i64);

impl UserId {
    /// The owner key used to namespace a user's persisted sales.
    #[must_use]
    pub fn owner_key(&self) -> String {
        self.0.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_trims_whitespace() {
        let id: ProductId = " 25 ".parse().unwrap();
        assert_eq!(id, ProductId::new(25));
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("pikachu".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_owner_key_is_decimal_id() {
        let user = UserId::new(42);
        assert_eq!(user.owner_key(), "42");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&SaleId::new(1_700_000_000_000)).unwrap();
        assert_eq!(json, "1700000000000");
    }

    #[test]
    fn test_ordering_follows_inner_value() {
        assert!(SaleId::new(1) < SaleId::new(2));
    }
}
