//! Strongly typed identifiers, one per entity kind.
//!
//! All of them are opaque strings on the wire; the newtypes only exist so a
//! `NicId` can never be passed where a `VmId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
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

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Virtual machine identifier.
    VmId
);
define_id!(
    /// Network interface identifier. Only meaningful together with its VM.
    NicId
);
define_id!(
    /// Template identifier.
    TemplateId
);
define_id!(
    /// Logical network identifier.
    NetworkId
);
define_id!(
    /// VNIC profile identifier.
    VnicProfileId
);
