//! Strongly typed identifier wrappers.
//!
//! Both ids are thin `u32` wrappers: `Copy + Ord + Hash`, usable as map keys
//! without ceremony.  `ClientId` is issued by whoever owns the callback
//! objects — the schedulers treat it as opaque.  `RecurringId` is allocated
//! by the recurring scheduler and never reused, so two live handles compare
//! equal exactly when they name the same registration (no reliance on
//! object identity).

use std::fmt;

/// Generate a typed id wrapper with a short display prefix.
macro_rules! minder_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident, $prefix:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub u32);

        impl $name {
            /// Sentinel meaning "no valid id".
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized ids are
            /// visibly invalid.
            #[inline]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

minder_id! {
    /// Identifies one callback-owning subsystem (a weapon, a construction
    /// site, a research slot).  Issued by the client registry; opaque to
    /// the schedulers.
    pub struct ClientId, "c";
}

minder_id! {
    /// Opaque handle to one recurring registration: a (client, span) binding.
    /// Allocated monotonically and never reused, so a stale handle can never
    /// alias a later registration.
    pub struct RecurringId, "r";
}
