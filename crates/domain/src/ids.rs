use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

/// Keys issued by the host application (tokens, actors, users).
///
/// These are opaque strings we never mint ourselves, so they get an ordered
/// string newtype rather than a UUID.
macro_rules! define_key {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

// Encounter IDs
define_id!(CombatId);
define_id!(CombatantId);
define_id!(SceneId);

// Host references
define_key!(TokenId);
define_key!(ActorId);
define_key!(UserId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ids_order_lexicographically() {
        let mut ids = vec![TokenId::from("c"), TokenId::from("A"), TokenId::from("b")];
        ids.sort();
        assert_eq!(
            ids.iter().map(TokenId::as_str).collect::<Vec<_>>(),
            vec!["A", "b", "c"]
        );
    }

    #[test]
    fn test_key_serializes_as_plain_string() {
        let json = serde_json::to_string(&TokenId::from("tok-1")).unwrap();
        assert_eq!(json, "\"tok-1\"");
    }
}
