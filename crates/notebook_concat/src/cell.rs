//! Cell identity: a URI-like value with a scheme and a fragment.

use url::Url;

/// A cell's stable identifier. Wraps a URI the way `red_knot_server` wraps
/// `lsp_types::Url` as the key for its notebook cell index, but owned by
/// value here rather than passed by reference, since cells outlive no
/// external borrow in this engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellId(Url);

impl CellId {
    pub fn new(uri: Url) -> Self {
        Self(uri)
    }

    pub fn parse(s: &str) -> std::result::Result<Self, url::ParseError> {
        Ok(Self(Url::parse(s)?))
    }

    pub fn uri(&self) -> &Url {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// The integer ordering key. `-1` for the interactive input cell;
    /// otherwise the leading run of ASCII digits found in the URI fragment,
    /// or `0` if the fragment is absent or has no leading digits.
    pub fn fragment(&self, interactive_scheme: &str) -> i64 {
        if self.0.scheme() == interactive_scheme {
            return -1;
        }
        let frag = self.0.fragment().unwrap_or("");
        let digits: String = frag
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(0)
    }

    /// Whether this cell's fragment marks it as belonging to an untitled
    /// (unsaved) notebook.
    pub fn is_untitled(&self) -> bool {
        self.0.fragment().is_some_and(|f| f.contains("untitled"))
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
