//! Proxied REST resource paths.

use core::fmt;

/// Errors that can occur when parsing a [`ResourcePath`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourcePathError {
    /// The path is empty.
    #[error("resource path cannot be empty")]
    Empty,
    /// The request path is not of the form `/shopify/<resource>.json`.
    #[error("not a proxied resource path: {0}")]
    NotProxied(String),
    /// A segment is empty (leading, trailing or doubled `/`).
    #[error("resource path contains an empty segment")]
    EmptySegment,
    /// A segment contains a character outside `A-Z a-z 0-9 _ -`.
    #[error("resource path segment {0:?} contains invalid characters")]
    InvalidSegment(String),
}

/// The `<resource>` part of a proxied `<resource>.json` REST path.
///
/// For `/shopify/products/42/metafields.json` this is
/// `products/42/metafields`. Segments are restricted to
/// `A-Z a-z 0-9 _ -`, which rules out dots, `..` traversal and query
/// injection before the path is spliced into the upstream URL.
///
/// ## Examples
///
/// ```
/// use playmakers_core::ResourcePath;
///
/// let path = ResourcePath::from_proxy_path("/shopify/custom_resource.json").unwrap();
/// assert_eq!(path.as_str(), "custom_resource");
/// assert_eq!(path.to_json_path(), "custom_resource.json");
///
/// assert!(ResourcePath::parse("products/../shop").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// Prefix under which the app exposes the proxy.
    pub const PROXY_PREFIX: &'static str = "/shopify/";

    /// Suffix of every REST resource path.
    pub const JSON_SUFFIX: &'static str = ".json";

    /// Parse a bare resource path such as `products/42/metafields`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty, has an empty segment, or a
    /// segment contains characters outside `A-Z a-z 0-9 _ -`.
    pub fn parse(s: &str) -> Result<Self, ResourcePathError> {
        if s.is_empty() {
            return Err(ResourcePathError::Empty);
        }

        for segment in s.split('/') {
            validate_segment(segment)?;
        }

        Ok(Self(s.to_owned()))
    }

    /// Extract the resource from a request path `/shopify/<resource>.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourcePathError::NotProxied`] if the prefix or the
    /// `.json` suffix is missing, otherwise the errors of [`Self::parse`].
    pub fn from_proxy_path(path: &str) -> Result<Self, ResourcePathError> {
        let inner = path
            .strip_prefix(Self::PROXY_PREFIX)
            .and_then(|rest| rest.strip_suffix(Self::JSON_SUFFIX))
            .ok_or_else(|| ResourcePathError::NotProxied(path.to_owned()))?;
        Self::parse(inner)
    }

    /// The product list resource (`products`).
    #[must_use]
    pub fn products() -> Self {
        Self("products".to_owned())
    }

    /// The metafields of one product (`products/<id>/metafields`).
    ///
    /// # Errors
    ///
    /// Returns an error if `product_id` is not a valid path segment.
    pub fn product_metafields(product_id: &str) -> Result<Self, ResourcePathError> {
        validate_segment(product_id)?;
        Ok(Self(format!("products/{product_id}/metafields")))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the upstream file name, `<resource>.json`.
    #[must_use]
    pub fn to_json_path(&self) -> String {
        format!("{}{}", self.0, Self::JSON_SUFFIX)
    }
}

fn validate_segment(segment: &str) -> Result<(), ResourcePathError> {
    if segment.is_empty() {
        return Err(ResourcePathError::EmptySegment);
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ResourcePathError::InvalidSegment(segment.to_owned()));
    }
    Ok(())
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ResourcePath {
    type Err = ResourcePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
