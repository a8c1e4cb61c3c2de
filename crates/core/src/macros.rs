// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Display macro for the closed enums stored in the ledger.

/// `Display` for a field-less enum, one string per variant.
///
/// ```ignore
/// crate::simple_display! {
///     ShutdownReason {
///         Manual => "manual",
///         IdleTimeout => "idle_timeout",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident => $label:literal ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant => $label, )+
                })
            }
        }
    };
}
