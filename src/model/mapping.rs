//! Header handling for sheets whose column names drift over time.
//!
//! A `Mapping` is built once per sheet from its header row. Headers are trimmed at that point, so
//! everything downstream (in particular the `ColumnResolver`) sees `" Importo Totale "` and
//! `"Importo Totale"` as the same column.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;

/// The ordered header row of a sheet.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<Header>,
    /// Lookup key (see `Header::key`) -> leftmost column index carrying that header.
    header_map: HashMap<String, usize>,
}

impl Mapping {
    /// Create a new `Mapping` from a header row. Each header is trimmed. When two headers trim to
    /// the same name, lookups resolve to the leftmost one.
    pub fn new<S, I>(headers: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<Header> = headers.into_iter().map(Header::new).collect();
        let mut header_map = HashMap::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            header_map.entry(header.key()).or_insert(idx);
        }
        Self {
            headers,
            header_map,
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Returns the index of the leftmost column whose header matches `name`, ignoring case and
    /// surrounding whitespace.
    pub fn header_index(&self, name: &str) -> Option<usize> {
        self.header_map.get(&Header::new(name).key()).copied()
    }
}

impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.headers.len()))?;
        for header in &self.headers {
            seq.serialize_element(header.as_ref())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items: Vec<String> = Vec::deserialize(deserializer)?;
        Ok(Mapping::new(items))
    }
}

/// Represents a (trimmed) header in a sheet, for example, `Importo Totale`
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(String);

impl Header {
    pub fn new(s: impl Into<String>) -> Self {
        let s = s.into();
        Self(s.trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The case-folded form used for matching.
    fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for Header {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Header {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Header::new(s))
    }
}

/// A column that was found in a sheet: its position and the header text as it appears there.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    index: usize,
    header: Header,
}

impl ColumnRef {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn header(&self) -> &Header {
        &self.header
    }
}

/// Picks columns out of a `Mapping` by ordered lists of candidate names.
#[derive(Debug, Clone, Copy)]
pub struct ColumnResolver<'a> {
    mapping: &'a Mapping,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(mapping: &'a Mapping) -> Self {
        Self { mapping }
    }

    /// Returns the first of `candidates` that is present in the sheet. The candidates' order is
    /// the priority order; the sheet's column order does not matter. `None` means the caller has
    /// to fall back to a default.
    pub fn resolve<S: AsRef<str>>(&self, candidates: &[S]) -> Option<ColumnRef> {
        candidates.iter().find_map(|candidate| {
            self.mapping
                .header_index(candidate.as_ref())
                .map(|index| ColumnRef {
                    index,
                    header: self.mapping.headers[index].clone(),
                })
        })
    }
}

/// Convenience form of `ColumnResolver::resolve` for a bare header row.
pub fn resolve<H, S>(headers: &[H], candidates: &[S]) -> Option<ColumnRef>
where
    H: AsRef<str>,
    S: AsRef<str>,
{
    let mapping = Mapping::new(headers.iter().map(|h| h.as_ref()));
    ColumnResolver::new(&mapping).resolve(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICE: &[&str] = &["Importo Totale", "Totale", "Prezzo", "Costo"];

    #[test]
    fn test_headers_are_trimmed() {
        let mapping = Mapping::new(vec![" Oggetto", "Importo Totale  ", "Note"]);
        let headers: Vec<&str> = mapping.headers().iter().map(|h| h.as_ref()).collect();
        assert_eq!(headers, vec!["Oggetto", "Importo Totale", "Note"]);
    }

    #[test]
    fn test_resolve_with_stray_whitespace() {
        let clean = resolve(&["Oggetto", "Importo Totale"], PRICE).unwrap();
        let messy = resolve(&["Oggetto", " Importo Totale "], PRICE).unwrap();
        assert_eq!(clean, messy);
        assert_eq!(messy.header().as_ref(), "Importo Totale");
        assert_eq!(messy.index(), 1);
    }

    #[test]
    fn test_resolve_follows_candidate_priority_not_sheet_order() {
        let found = resolve(&["Costo", "Oggetto", "Importo Totale"], PRICE).unwrap();
        assert_eq!(found.header().as_ref(), "Importo Totale");
        assert_eq!(found.index(), 2);
    }

    #[test]
    fn test_resolve_ignores_case() {
        let found = resolve(&["IMPORTO totale"], PRICE).unwrap();
        assert_eq!(found.index(), 0);
    }

    #[test]
    fn test_resolve_none_when_absent() {
        assert!(resolve(&["Oggetto", "Note"], PRICE).is_none());
        let empty: Vec<String> = Vec::new();
        assert!(resolve(&empty[..], PRICE).is_none());
    }

    #[test]
    fn test_duplicate_headers_resolve_leftmost() {
        let mapping = Mapping::new(vec!["Costo", "Note", " costo"]);
        assert_eq!(mapping.header_index("Costo"), Some(0));
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_empty_headers_never_match() {
        let mapping = Mapping::new(vec!["", "Note"]);
        assert_eq!(mapping.header_index(""), None);
    }

    #[test]
    fn test_mapping_serde() {
        let original_json = r##"["Oggetto","Importo Totale","Acquista S/N"]"##;
        let mapping: Mapping = serde_json::from_str(original_json).unwrap();
        let serialized = serde_json::to_string(&mapping).unwrap();
        assert_eq!(original_json, serialized);
    }
}
