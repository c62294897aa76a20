//! Declarative macros shared by the score types.
//!
//! Every score type stores its levels as `i64` fields listed from highest
//! to lowest priority. The macros below derive ordering, arithmetic and
//! parsing from that field list.

/// Implements lexicographic `Ord`/`PartialOrd` and the `std::ops`
/// arithmetic for a level-based score type.
///
/// The plain operators follow `i64` semantics. The scoring sink never uses
/// them; it goes through the checked methods from `score_level_methods!`.
///
/// ```ignore
/// impl_level_ops!(HardSoftScore { hard, soft } => of);
/// ```
macro_rules! impl_level_ops {
    ($type:ident { $($field:ident),+ } => $ctor:ident) => {
        impl Ord for $type {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                std::cmp::Ordering::Equal
                    $( .then_with(|| self.$field.cmp(&other.$field)) )+
            }
        }

        impl PartialOrd for $type {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl std::ops::Add for $type {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                $type::$ctor( $(self.$field + other.$field),+ )
            }
        }

        impl std::ops::Sub for $type {
            type Output = Self;

            fn sub(self, other: Self) -> Self {
                $type::$ctor( $(self.$field - other.$field),+ )
            }
        }

        impl std::ops::Neg for $type {
            type Output = Self;

            fn neg(self) -> Self {
                $type::$ctor( $(-self.$field),+ )
            }
        }
    };
}

/// Generates the level accessors and the checked arithmetic of the
/// `Score` trait. Use inside the `impl Score` block.
///
/// A level leaving the `i64` range yields `WeightError::Overflow` instead
/// of wrapping or panicking.
macro_rules! score_level_methods {
    ($type:ident { $($field:ident),+ } => $ctor:ident) => {
        fn to_level_numbers(&self) -> Vec<i64> {
            vec![ $(self.$field),+ ]
        }

        fn checked_add(self, other: Self) -> Result<Self, $crate::error::WeightError> {
            Ok($type::$ctor( $(
                self.$field
                    .checked_add(other.$field)
                    .ok_or($crate::error::WeightError::Overflow)?
            ),+ ))
        }

        fn checked_sub(self, other: Self) -> Result<Self, $crate::error::WeightError> {
            Ok($type::$ctor( $(
                self.$field
                    .checked_sub(other.$field)
                    .ok_or($crate::error::WeightError::Overflow)?
            ),+ ))
        }

        fn checked_neg(self) -> Result<Self, $crate::error::WeightError> {
            Ok($type::$ctor( $(
                self.$field
                    .checked_neg()
                    .ok_or($crate::error::WeightError::Overflow)?
            ),+ ))
        }
    };
}

/// Generates `scale` for a score with integer levels. Fractional match
/// weights are rejected. Use inside the `impl Score` block.
macro_rules! integer_scale {
    ($type:ident { $($field:ident),+ } => $ctor:ident) => {
        fn scale(
            &self,
            weight: &$crate::score::weight::MatchWeight,
        ) -> Result<Self, $crate::error::WeightError> {
            let factor = weight.to_integral()?;
            Ok($type::$ctor(
                $( $crate::score::weight::scale_level(self.$field, factor)? ),+
            ))
        }
    };
}

/// Implements `ParseableScore` for the `"<n>hard/<n>soft"` style, one
/// suffix per level.
macro_rules! impl_suffixed_parse {
    ($type:ident { $($field:ident => $suffix:literal),+ } => $ctor:ident) => {
        impl $crate::score::traits::ParseableScore for $type {
            fn parse(s: &str) -> Result<Self, $crate::score::traits::ScoreParseError> {
                let s = s.trim();
                let mut parts = s.split('/');
                $(
                    let $field = $crate::score::traits::parse_level(
                        parts.next(),
                        $suffix,
                        s,
                    )?;
                )+
                if parts.next().is_some() {
                    return Err($crate::score::traits::ScoreParseError::new(format!(
                        "{} '{}' has too many levels",
                        stringify!($type),
                        s
                    )));
                }
                Ok($type::$ctor( $($field),+ ))
            }

            fn to_string_repr(&self) -> String {
                self.to_string()
            }
        }
    };
}
