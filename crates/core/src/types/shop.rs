//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The store handle contains characters other than `a-z`, `0-9` and `-`.
    #[error("shop domain contains invalid characters")]
    InvalidCharacters,
    /// The host is not a `myshopify.com` domain.
    #[error("shop domain must end with .{}", ShopDomain::SUFFIX)]
    ForeignDomain,
}

/// A Shopify store host, e.g. `playmakers.myshopify.com`.
///
/// ## Constraints
///
/// - Always lowercase and always ends with `.myshopify.com`
/// - The store handle uses only `a-z`, `0-9` and `-`, and does not start
///   with a hyphen
///
/// A bare handle (`playmakers`) is expanded to the full host, and an
/// `https://` prefix or trailing `/` is stripped, so the values merchants
/// paste into install links are accepted.
///
/// ## Examples
///
/// ```
/// use playmakers_core::ShopDomain;
///
/// let shop = ShopDomain::parse("playmakers").unwrap();
/// assert_eq!(shop.as_str(), "playmakers.myshopify.com");
///
/// assert!(ShopDomain::parse("https://Playmakers.myshopify.com/").is_ok());
/// assert!(ShopDomain::parse("evil.example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Host suffix shared by every Shopify store.
    pub const SUFFIX: &'static str = "myshopify.com";

    /// Maximum length of a DNS name.
    pub const MAX_LENGTH: usize = 253;

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty (after trimming scheme and slashes)
    /// - Is longer than 253 characters
    /// - Is a host outside `myshopify.com`
    /// - Has a store handle with characters other than `a-z`, `0-9`, `-`
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let trimmed = s.trim();
        let host = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed)
            .trim_end_matches('/')
            .to_ascii_lowercase();

        if host.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if host.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let handle = if host.contains('.') {
            host.strip_suffix(Self::SUFFIX)
                .and_then(|rest| rest.strip_suffix('.'))
                .ok_or(ShopDomainError::ForeignDomain)?
        } else {
            host.as_str()
        };

        if handle.is_empty()
            || handle.starts_with('-')
            || !handle
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ShopDomainError::InvalidCharacters);
        }

        Ok(Self(format!("{handle}.{}", Self::SUFFIX)))
    }

    /// Returns the host as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the store handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.split('.').next().unwrap_or("")
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
