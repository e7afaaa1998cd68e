//! Macro for implementing Display and FromStr for status enums
//!
//! Status enums are persisted as text columns and exchanged with providers as
//! strings. The macro gives each enum a single canonical spelling for
//! `Display` and a case-insensitive `FromStr`.
//!
//! # Example
//!
//! ```rust
//! use bergerie_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum RunState {
//!     Idle,
//!     Syncing,
//! }
//!
//! impl_domain_status_conversions!(RunState {
//!     Idle => "idle",
//!     Syncing => "syncing",
//! });
//!
//! assert_eq!(RunState::Syncing.to_string(), "syncing");
//! assert_eq!("IDLE".parse::<RunState>(), Ok(RunState::Idle));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - Display writes the canonical string exactly as given
/// - FromStr compares ASCII case-insensitively, so canonical strings may be
///   upper- or lowercase
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string form.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
