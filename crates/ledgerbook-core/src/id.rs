//! Opaque identifiers for accounts, groups and transactions.
//!
//! Ids come from the external store and are never interpreted by the engine.
//! Each id wraps an `Arc<str>` so that cloning one into a lookup table or a
//! derived view is a reference-count bump rather than a string copy.
//!
//! # Example
//!
//! ```
//! use ledgerbook_core::AccountId;
//!
//! let a = AccountId::new("acc-1");
//! let b: AccountId = "acc-1".into();
//!
//! assert_eq!(a, b);
//! assert_eq!(a.as_str(), "acc-1");
//! ```

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create a new id from any string-like value.
            pub fn new(s: impl Into<Arc<str>>) -> Self {
                Self(s.into())
            }

            /// Get the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::new(s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self::new(s.as_str())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.as_str() == *other
            }
        }
    };
}

opaque_id!(
    /// Identity of an [`Account`](crate::Account).
    AccountId
);

opaque_id!(
    /// Identity of an [`AccountGroup`](crate::AccountGroup).
    GroupId
);

opaque_id!(
    /// Identity of a [`Transaction`](crate::Transaction).
    TransactionId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_equality_and_display() {
        let a = AccountId::new("1200");
        let b = AccountId::from(String::from("1200"));
        assert_eq!(a, b);
        assert_eq!(a, "1200");
        assert_eq!(format!("{a}"), "1200");
    }

    #[test]
    fn test_borrowed_lookup() {
        let mut map: HashMap<GroupId, u32> = HashMap::new();
        map.insert(GroupId::new("g1"), 7);
        assert_eq!(map.get("g1"), Some(&7));
        assert_eq!(map.get("g2"), None);
    }

    #[test]
    fn test_serde_transparent() {
        let id = TransactionId::new("tx-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"tx-42\"");
        let back: TransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ordering() {
        let mut ids = vec![AccountId::new("b"), AccountId::new("a"), AccountId::new("c")];
        ids.sort();
        let strs: Vec<&str> = ids.iter().map(AccountId::as_str).collect();
        assert_eq!(strs, vec!["a", "b", "c"]);
    }
}
