//! Type-safe identifier wrappers around the numeric keys used by the
//! gene, experiment, and taxon stores.
//!
//! Each collaborator hands out plain integer primary keys. Wrapping them
//! prevents passing an experiment id where a gene id is expected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around a `u64` key with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw store key.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the inner key.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of a gene record in the gene-metadata store.
    GeneId
}

define_id! {
    /// Identifier of an expression experiment (data set).
    ExperimentId
}

define_id! {
    /// Identifier of a taxon (species).
    TaxonId
}
