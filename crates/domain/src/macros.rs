//! Macro for implementing Display and FromStr for wire-named enums
//!
//! Several small enums travel over the wire or through configuration as
//! fixed strings (`"GET"`, `"UserPerson"`, `"installation"`). The macro maps
//! each variant to its canonical spelling for `Display` and parses it back
//! case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use bunq_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Region {
//!     Netherlands,
//!     Germany,
//! }
//!
//! impl_wire_name_conversions!(Region {
//!     Netherlands => "nl_NL",
//!     Germany => "de_DE",
//! });
//!
//! assert_eq!(Region::Germany.to_string(), "de_DE");
//! assert_eq!("NL_nl".parse::<Region>().unwrap(), Region::Netherlands);
//! ```

/// Implements `Display`, `FromStr` and `as_str` for an enum of wire names
///
/// Parsing ignores ASCII case; output always uses the canonical spelling.
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical wire spelling
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

            fn from_str(s: &str) -> Result<Self, Self::Err> {
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
