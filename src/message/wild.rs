use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A field that is either a concrete value or a wildcard.
/// [Wild::Any] sorts before any concrete value and is never equal
/// to one: use [Wild::matches] to compare with wildcard semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Wild<T> {
    /// Matches any value
    Any,
    /// Concrete value
    Is(T),
}

impl<T> Default for Wild<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl<T> From<T> for Wild<T> {
    fn from(value: T) -> Self {
        Self::Is(value)
    }
}

impl<T: PartialEq> Wild<T> {
    /// True if either side is a wildcard, or both values are equal.
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => true,
            (Self::Is(lhs), Self::Is(rhs)) => lhs == rhs,
        }
    }
}

impl<T> Wild<T> {
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Returns concrete value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Any => None,
            Self::Is(value) => Some(value),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Wild<U> {
        match self {
            Self::Any => Wild::Any,
            Self::Is(value) => Wild::Is(f(value)),
        }
    }
}

impl<T: Copy> Wild<T> {
    /// Returns concrete value, if any
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Wild<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Is(value) => write!(f, "{}", value),
        }
    }
}

impl<T: FromStr> FromStr for Wild<T> {
    type Err = T::Err;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" || s.eq_ignore_ascii_case("any") {
            Ok(Self::Any)
        } else {
            Ok(Self::Is(T::from_str(s)?))
        }
    }
}

#[cfg(test)]
mod test {
    use super::Wild;
    use std::str::FromStr;

    #[test]
    fn wildcard_matching() {
        let any = Wild::<u8>::Any;
        let zero = Wild::Is(0_u8);
        let one = Wild::Is(1_u8);

        assert!(any.matches(&zero));
        assert!(zero.matches(&any));
        assert!(zero.matches(&zero));
        assert!(!zero.matches(&one));

        // wildcard is a value of its own, never the zero sentinel
        assert_ne!(any, zero);
        assert!(any < zero);
        assert!(zero < one);
    }

    #[test]
    fn wildcard_parsing() {
        for (desc, expected) in [
            ("*", Wild::Any),
            ("any", Wild::Any),
            ("ANY", Wild::Any),
            ("0", Wild::Is(0)),
            (" 12 ", Wild::Is(12)),
        ] {
            let parsed = Wild::<u8>::from_str(desc).unwrap();
            assert_eq!(parsed, expected, "failed to parse \"{}\"", desc);
        }
        assert!(Wild::<u8>::from_str("g").is_err());
        assert_eq!(Wild::Is(3).to_string(), "3");
        assert_eq!(Wild::<u8>::Any.to_string(), "*");
    }
}
