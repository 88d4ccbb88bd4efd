//! Opaque keyset cursors.
//!
//! A cursor is the base64url (unpadded) encoding of a small JSON envelope:
//!
//! ```text
//! { "v": format version, "s": sort signature, "p": primary sort field,
//!   "k": [sort values of the last row], "i": id of the last row }
//! ```
//!
//! Callers must treat the token as a black box. The envelope embeds the
//! format version so the layout can evolve, and a signature of the sort
//! so a cursor cannot be replayed against a different ordering.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use folio_core::{field_or_null, Document, FolioError, FolioResult, SortSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Tokens longer than this are rejected before decoding.
const MAX_TOKEN_LEN: usize = 4096;

/// Computes a short, stable signature of a sort specification.
///
/// Field names and directions both contribute, so `{createdAt: -1}` and
/// `{createdAt: 1}` have different signatures.
#[must_use]
pub fn sort_signature(sort: &SortSpec) -> String {
    let canonical = sort
        .fields()
        .iter()
        .map(|f| format!("{}:{}", f.field, f.direction.as_i8()))
        .collect::<Vec<_>>()
        .join("|");
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(&digest[..8])
}

/// Decoded cursor contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "v")]
    pub format_version: u32,
    #[serde(rename = "s")]
    pub sort_signature: String,
    #[serde(rename = "p")]
    pub primary_field: String,
    /// Values of every non-id sort field, in sort order.
    #[serde(rename = "k")]
    pub sort_values: Vec<Value>,
    #[serde(rename = "i")]
    pub id: Value,
}

impl Cursor {
    /// Captures the position of `doc` under `sort`.
    ///
    /// `sort` is expected to be normalized, i.e. to end with `id_field`.
    pub fn from_document(
        doc: &Document,
        sort: &SortSpec,
        id_field: &str,
        format_version: u32,
    ) -> FolioResult<Self> {
        let id = doc
            .get(id_field)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| FolioError::internal(format!("document has no '{}' field", id_field)))?;

        let primary_field = sort
            .primary()
            .map(|f| f.field.clone())
            .ok_or(FolioError::MissingSort)?;

        let sort_values = sort
            .field_names()
            .filter(|name| *name != id_field)
            .map(|name| field_or_null(doc, name))
            .collect();

        Ok(Self {
            format_version,
            sort_signature: sort_signature(sort),
            primary_field,
            sort_values,
            id,
        })
    }

    /// Serializes the cursor into an opaque, URL-safe token.
    pub fn encode(&self) -> FolioResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Parses a token. Any malformation is an [`FolioError::InvalidCursor`].
    pub fn decode(token: &str) -> FolioResult<Self> {
        if token.is_empty() {
            return Err(FolioError::invalid_cursor("cursor is empty"));
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(FolioError::invalid_cursor("cursor is too long"));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| FolioError::invalid_cursor(format!("not valid base64: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| FolioError::invalid_cursor(format!("malformed envelope: {}", e)))
    }

    /// Fails unless the cursor was produced by the expected format version.
    pub fn validate_version(&self, expected: u32) -> FolioResult<()> {
        if self.format_version != expected {
            return Err(FolioError::CursorVersionMismatch {
                expected,
                found: self.format_version,
            });
        }
        Ok(())
    }

    /// Fails unless the cursor was produced under the same sort fields and
    /// directions as `sort`.
    pub fn validate_sort(&self, sort: &SortSpec, id_field: &str) -> FolioResult<()> {
        let expected_values = sort.field_names().filter(|name| *name != id_field).count();
        if self.sort_signature != sort_signature(sort) || self.sort_values.len() != expected_values {
            return Err(FolioError::CursorSortMismatch);
        }
        Ok(())
    }
}

/// Cursor encoding bound to one format version and id field.
#[derive(Debug, Clone)]
pub struct CursorCodec {
    format_version: u32,
    id_field: String,
}

impl CursorCodec {
    #[must_use]
    pub fn new(format_version: u32, id_field: impl Into<String>) -> Self {
        Self {
            format_version,
            id_field: id_field.into(),
        }
    }

    #[must_use]
    pub const fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Encodes the position of `doc` under a normalized `sort`.
    pub fn encode(&self, doc: &Document, sort: &SortSpec) -> FolioResult<String> {
        Cursor::from_document(doc, sort, &self.id_field, self.format_version)?.encode()
    }

    /// Decodes a token and checks it against this codec's version and the
    /// caller's current sort.
    pub fn decode_for(&self, token: &str, sort: &SortSpec) -> FolioResult<Cursor> {
        let cursor = Cursor::decode(token)?;
        cursor.validate_version(self.format_version)?;
        cursor.validate_sort(sort, &self.id_field)?;
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn created_desc() -> SortSpec {
        SortSpec::new().desc("createdAt").desc("_id")
    }

    #[test]
    fn test_encode_decode() {
        let codec = CursorCodec::new(1, "_id");
        let sort = created_desc();
        let token = codec
            .encode(&doc(json!({"_id": "a1", "createdAt": "2024-05-01", "title": "x"})), &sort)
            .unwrap();

        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let cursor = codec.decode_for(&token, &sort).unwrap();
        assert_eq!(cursor.format_version, 1);
        assert_eq!(cursor.primary_field, "createdAt");
        assert_eq!(cursor.sort_values, vec![json!("2024-05-01")]);
        assert_eq!(cursor.id, json!("a1"));
    }

    #[test]
    fn test_missing_sort_field_is_captured_as_null() {
        let sort = SortSpec::new().asc("publishedAt").asc("_id");
        let cursor = Cursor::from_document(&doc(json!({"_id": 7})), &sort, "_id", 1).unwrap();
        assert_eq!(cursor.sort_values, vec![Value::Null]);
        assert_eq!(cursor.id, json!(7));
    }

    #[test]
    fn test_document_without_id_is_rejected() {
        let sort = SortSpec::new().asc("_id");
        let result = Cursor::from_document(&doc(json!({"name": "x"})), &sort, "_id", 1);
        assert!(matches!(result, Err(FolioError::Internal(_))));
    }

    #[test]
    fn test_version_mismatch() {
        let sort = created_desc();
        let token = CursorCodec::new(1, "_id")
            .encode(&doc(json!({"_id": "a", "createdAt": 1})), &sort)
            .unwrap();

        let err = CursorCodec::new(2, "_id").decode_for(&token, &sort).unwrap_err();
        assert!(matches!(err, FolioError::CursorVersionMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn test_sort_direction_change_is_rejected() {
        let codec = CursorCodec::new(1, "_id");
        let token = codec
            .encode(&doc(json!({"_id": "a", "createdAt": 1})), &created_desc())
            .unwrap();

        let flipped = SortSpec::new().asc("createdAt").asc("_id");
        let err = codec.decode_for(&token, &flipped).unwrap_err();
        assert!(matches!(err, FolioError::CursorSortMismatch));
    }

    #[test]
    fn test_sort_field_change_is_rejected() {
        let codec = CursorCodec::new(1, "_id");
        let token = codec
            .encode(&doc(json!({"_id": "a", "createdAt": 1})), &created_desc())
            .unwrap();

        let other = SortSpec::new().desc("updatedAt").desc("_id");
        assert!(matches!(codec.decode_for(&token, &other), Err(FolioError::CursorSortMismatch)));
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "%%%not-base64%%%", "bm90IGpzb24"] {
            let err = Cursor::decode(token).unwrap_err();
            assert!(matches!(err, FolioError::InvalidCursor(_)), "token {:?}", token);
            assert!(err.is_client_error());
        }
        assert!(matches!(
            Cursor::decode(&"A".repeat(MAX_TOKEN_LEN + 1)),
            Err(FolioError::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_signature_depends_on_direction_and_order() {
        let a = sort_signature(&SortSpec::new().desc("createdAt"));
        let b = sort_signature(&SortSpec::new().asc("createdAt"));
        let c = sort_signature(&SortSpec::new().asc("a").asc("b"));
        let d = sort_signature(&SortSpec::new().asc("b").asc("a"));
        assert_ne!(a, b);
        assert_ne!(c, d);
        assert_eq!(a, sort_signature(&SortSpec::new().desc("createdAt")));
        assert_eq!(a.len(), 16);
    }
}
