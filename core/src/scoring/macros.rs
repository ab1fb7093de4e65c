//! Macro for declaring scored feature axes

/// Declares a feature-axis enum with a code, display label and point value per variant
///
/// Every variant is listed once, so an unmapped option is a compile error
/// rather than a runtime string mismatch.
macro_rules! scored_choice {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => ($code:literal, $label:literal, $points:expr) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            /// Every option of this axis, in display order
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Returns the code stored in measurement records
            pub fn code(&self) -> &'static str {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            /// Returns the display label
            pub fn label(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Returns the point value of this option
            pub fn points(&self) -> u8 {
                match self {
                    $( $name::$variant => $points ),+
                }
            }

            /// Parses an option from its code (or label), ignoring case
            pub fn from_code(code: &str) -> Option<Self> {
                let code = code.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.code().eq_ignore_ascii_case(code) || v.label().eq_ignore_ascii_case(code))
            }

            /// Label lookup used by organ schemas
            pub fn label_for(code: &str) -> Option<&'static str> {
                Self::from_code(code).map(|v| v.label())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.label())
            }
        }
    };
}

pub(crate) use scored_choice;
