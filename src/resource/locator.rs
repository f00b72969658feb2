//! Resource addressing.
//!
//! Downstream resources are addressed two ways: as URI paths in record
//! fields (`/generic/buyer/42/`) and as dotted paths in code
//! (`generic.buyer`). [`ResourceLocator`] is the common form both parse
//! into: ordered path segments plus an optional record id.

use std::fmt;

/// A parsed downstream resource address.
///
/// Parsing never fails: any string decomposes into segments, and a
/// trailing all-digit segment is lifted out as the record id. Query
/// strings and fragments are not part of a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    segments: Vec<String>,
    id: Option<String>,
}

impl ResourceLocator {
    /// Parses a URI path into a locator.
    ///
    /// Empty segments from leading, trailing, or doubled slashes are
    /// dropped. If the last remaining segment is all digits it becomes
    /// the record id.
    ///
    /// # Examples
    ///
    /// ```
    /// use payfront::resource::ResourceLocator;
    ///
    /// let locator = ResourceLocator::parse("/generic/buyer/42/");
    /// assert_eq!(locator.dotted(), "generic.buyer");
    /// assert_eq!(locator.id(), Some("42"));
    /// ```
    #[must_use]
    pub fn parse(uri: &str) -> Self {
        let mut segments: Vec<String> = uri
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();

        let tail_is_id = segments
            .last()
            .is_some_and(|last| last.bytes().all(|b| b.is_ascii_digit()));
        let id = if tail_is_id { segments.pop() } else { None };

        Self { segments, id }
    }

    /// Builds a locator from a dotted path like `"generic.buyer"`.
    #[must_use]
    pub fn from_dotted(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
            id: None,
        }
    }

    /// Returns this locator narrowed to a single record.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The ordered path segments, without the id.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The record id, if this locator addresses a single record.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The dotted form of the path, without the id.
    #[must_use]
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Renders the relative URL path, with a trailing slash.
    ///
    /// The result has no leading slash so it can be joined onto a base
    /// URL that carries its own path prefix.
    #[must_use]
    pub fn url_path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push_str(segment);
            path.push('/');
        }
        if let Some(id) = &self.id {
            path.push_str(id);
            path.push('/');
        }
        path
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())?;
        if let Some(id) = &self.id {
            write!(f, "({id})")?;
        }
        Ok(())
    }
}
