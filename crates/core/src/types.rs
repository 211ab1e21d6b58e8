//! Small newtype wrappers shared across the authorization path.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Defines a `String`-backed newtype with the conversions the rest of the
/// crate expects (`Display`, `Deref<Target = str>`, `From<String>`/`From<&str>`).
macro_rules! newtype_string {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[cfg_attr(feature = "openapi", schema(value_type = String))]
        pub struct $name(String);

        impl $name {
            /// Build a new value from anything convertible to `String`.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(SecretId, "Identity of a `Secret` in the catalog.");
newtype_string!(Username, "The owning/authenticated principal's username.");
newtype_string!(PolicyName, "Identity of a `Policy` within its owner's set.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_string() {
        let id = SecretId::new("sec-1");
        assert_eq!(id.as_str(), "sec-1");
        assert_eq!(id.to_string(), "sec-1");
        assert_eq!(&*id, "sec-1");
    }

    #[test]
    fn serializes_as_plain_string() {
        let name = PolicyName::from("allow-read");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"allow-read\"");
        let back: PolicyName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
