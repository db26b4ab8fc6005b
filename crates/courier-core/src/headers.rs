//! Case-insensitive view over response headers.

use encoding_rs::{Encoding, UTF_8};
use indexmap::IndexMap;

/// Response header map: name to every received value, in arrival order.
pub type HeaderValues = IndexMap<String, Vec<String>>;

/// Response headers with case-insensitive lookup.
///
/// Multi-valued headers are preserved. Lookups compare names ignoring ASCII
/// case; the stored names are left as received.
///
/// # Example
///
/// ```
/// use courier_core::ResponseHeaders;
///
/// let headers = ResponseHeaders::from_pairs([
///     ("Content-Type", "application/problem+json; charset=ISO-8859-1"),
///     ("Set-Cookie", "a=1"),
///     ("set-cookie", "b=2"),
/// ]);
///
/// assert!(headers.is_json());
/// assert_eq!(headers.content_charset().name(), "windows-1252");
/// assert_eq!(headers.get_all("SET-COOKIE"), vec!["a=1", "b=2"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    values: HeaderValues,
}

impl ResponseHeaders {
    /// Wraps a raw multi-valued header map.
    #[must_use]
    pub fn new(values: HeaderValues) -> Self {
        Self { values }
    }

    /// Builds headers from name/value pairs. Repeated names accumulate.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut headers = Self::default();
        for (name, value) in pairs {
            headers.append(name, value);
        }
        headers
    }

    /// Appends a value under `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// Returns the first value of the header, ignoring name case.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter())
            .map(String::as_str)
            .next()
    }

    /// Returns every value of the header, ignoring name case.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter())
            .map(String::as_str)
            .collect()
    }

    /// Returns true if a header with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.first(name).is_some()
    }

    /// Returns the `Content-Type` value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.first("Content-Type")
    }

    /// Returns the charset named by the `Content-Type` `charset=` parameter.
    ///
    /// Falls back to UTF-8 when the parameter is absent or names an unknown
    /// encoding.
    #[must_use]
    pub fn content_charset(&self) -> &'static Encoding {
        self.content_type()
            .and_then(|ct| {
                ct.split(';').map(str::trim).find_map(|param| {
                    let (key, value) = param.split_once('=')?;
                    key.trim()
                        .eq_ignore_ascii_case("charset")
                        .then(|| value.trim().trim_matches('"'))
                })
            })
            .filter(|label| !label.is_empty())
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8)
    }

    /// Returns true if the content type is `application/json` or a `+json` type.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("application/json") || ct.contains("+json")
        })
    }

    /// Returns true if `Content-Encoding` mentions gzip.
    #[must_use]
    pub fn is_gzip(&self) -> bool {
        self.first("Content-Encoding")
            .is_some_and(|enc| enc.to_ascii_lowercase().contains("gzip"))
    }

    /// Decodes `bytes` using [`content_charset`](Self::content_charset).
    #[must_use]
    pub fn decode_text(&self, bytes: &[u8]) -> String {
        let (text, _) = self
            .content_charset()
            .decode_without_bom_handling(bytes);
        text.into_owned()
    }

    /// Iterates over every header name with its values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no headers were received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &HeaderValues {
        &self.values
    }
}

impl From<HeaderValues> for ResponseHeaders {
    fn from(values: HeaderValues) -> Self {
        Self::new(values)
    }
}
