/// The PackURI value type: absolute part names inside a package.
use crate::ooxml::opc::error::{OpcError, Result};

/// An absolute, normalized part name within an OPC package.
///
/// PackURIs always begin with a forward slash, use forward slashes as separators
/// and never contain `.` or `..` segments. The ZIP member for a part is its
/// PackURI with the leading slash stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

/// The package pseudo-partname, the source of package-level relationships.
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml item
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

impl PackURI {
    /// Create a PackURI from an absolute path, normalizing `.` and `..` segments.
    pub fn new<S: AsRef<str>>(uri: S) -> Result<Self> {
        let uri = uri.as_ref();
        if !uri.starts_with('/') {
            return Err(OpcError::InvalidPackUri(format!(
                "PackURI must begin with slash, got '{}'",
                uri
            )));
        }
        Ok(PackURI {
            uri: normalize_path(uri),
        })
    }

    /// Create a PackURI from a ZIP member name (no leading slash).
    pub fn from_membername(membername: &str) -> Result<Self> {
        Self::new(format!("/{}", membername.trim_start_matches('/')))
    }

    /// Resolve a raw relationship target against the directory of its source.
    ///
    /// Absolute targets (leading slash) resolve to themselves; relative targets
    /// are joined onto `base_uri` and normalized.
    ///
    /// ```
    /// use deckweave::ooxml::opc::PackURI;
    /// let uri = PackURI::from_rel_ref("/ppt/slides", "../slideLayouts/slideLayout1.xml").unwrap();
    /// assert_eq!(uri.as_str(), "/ppt/slideLayouts/slideLayout1.xml");
    /// ```
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        if relative_ref.is_empty() {
            return Err(OpcError::InvalidPackUri(format!(
                "empty relationship target from '{}'",
                base_uri
            )));
        }
        if relative_ref.starts_with('/') {
            return Self::new(relative_ref);
        }
        let joined = if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(joined)
    }

    /// Directory portion, e.g. "/ppt/slides" for "/ppt/slides/slide1.xml".
    ///
    /// For the package pseudo-partname "/", returns "/".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Filename portion, e.g. "slide1.xml".
    pub fn filename(&self) -> &str {
        self.uri.rfind('/').map_or("", |pos| &self.uri[pos + 1..])
    }

    /// Extension without the leading period.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        filename.rfind('.').map_or("", |pos| &filename[pos + 1..])
    }

    /// The ZIP member name: the URI with the leading slash stripped.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this part.
    ///
    /// For example "../slideLayouts/slideLayout1.xml" from "/ppt/slides".
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from_parts: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to_parts: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();

        // The filename never counts as a shared directory.
        let dir_len = to_parts.len().saturating_sub(1);
        let common = from_parts
            .iter()
            .zip(to_parts[..dir_len].iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut segments: Vec<&str> = vec![".."; from_parts.len() - common];
        segments.extend_from_slice(&to_parts[common..]);
        segments.join("/")
    }

    /// The PackURI of the `.rels` item holding this part's relationships.
    ///
    /// "/ppt/_rels/presentation.xml.rels" for "/ppt/presentation.xml" and
    /// "/_rels/.rels" for the package pseudo-partname.
    pub fn rels_uri(&self) -> PackURI {
        let uri = if self.uri == PACKAGE_URI {
            "/_rels/.rels".to_string()
        } else {
            let base_uri = self.base_uri();
            let prefix = if base_uri == "/" { "" } else { base_uri };
            format!("{}/_rels/{}.rels", prefix, self.filename())
        };
        PackURI { uri }
    }

    /// Whether this URI names a relationships item.
    pub fn is_rels(&self) -> bool {
        self.ext().eq_ignore_ascii_case("rels")
            && self.base_uri().rsplit('/').next() == Some("_rels")
    }

    /// For a relationships item, the source part it belongs to.
    ///
    /// "/ppt/slides/_rels/slide1.xml.rels" -> "/ppt/slides/slide1.xml";
    /// "/_rels/.rels" -> "/".
    pub fn rels_source(&self) -> Option<PackURI> {
        if !self.is_rels() {
            return None;
        }
        let source_name = self.filename().strip_suffix(".rels")?;
        let source_dir = self.base_uri().strip_suffix("_rels")?.trim_end_matches('/');
        let uri = if source_name.is_empty() {
            PACKAGE_URI.to_string()
        } else {
            format!("{}/{}", source_dir, source_name)
        };
        PackURI::new(uri).ok()
    }

    /// Get the full URI string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

/// Collapse empty, `.` and `..` segments of an absolute path.
///
/// `..` at the root stays at the root.
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            _ => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}
