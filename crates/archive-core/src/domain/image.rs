//! Image references and uploads.
//!
//! Posts embed images as plain strings: either the storage key of the object
//! (`<owner_id>/<file>`) or the public URL the object store handed out for it.
//! Everything that compares references goes through [`ObjectKey`] so both forms
//! name the same object.

use std::fmt;

use chrono::Utc;
use percent_encoding::percent_decode_str;
use uuid::Uuid;

use crate::error::DomainError;

/// Default upper bound for a single uploaded image.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A validated key of an object in the object store.
///
/// The first path segment is the owning user's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Parse a raw storage key. Returns `None` for malformed keys.
    pub fn parse(raw: &str) -> Option<Self> {
        let segments: Vec<&str> = raw.split('/').collect();
        if segments.len() < 2 {
            return None;
        }

        let malformed = segments.iter().any(|segment| {
            segment.is_empty()
                || *segment == "."
                || *segment == ".."
                || segment.chars().any(char::is_control)
        });
        if malformed {
            return None;
        }

        Some(Self(raw.to_string()))
    }

    /// Resolve an image reference as stored on a post.
    ///
    /// URLs must live under `public_base`; anything else (foreign hosts,
    /// other buckets, blank strings) resolves to `None`. URL paths are
    /// percent-decoded so they match the object names the store lists.
    pub fn from_reference(reference: &str, public_base: &str) -> Option<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        if reference.contains("://") {
            let base = public_base.trim_end_matches('/');
            let path = reference.strip_prefix(base)?.strip_prefix('/')?;
            let path = path.split(['?', '#']).next().unwrap_or_default();
            return Self::parse(&decode_path(path)?);
        }

        Self::parse(reference)
    }

    /// Generate a fresh key in the owner's namespace for an upload.
    pub fn generate(owner_id: Uuid, filename: &str, content_type: &str) -> Self {
        let extension = extension_of(filename)
            .or_else(|| extension_of_content_type(content_type))
            .unwrap_or_else(|| "bin".to_string());

        Self(format!(
            "{}/{}-{}.{}",
            owner_id,
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension
        ))
    }

    /// The namespace (owner id) segment.
    pub fn owner(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    pub fn belongs_to(&self, owner_id: Uuid) -> bool {
        self.owner() == owner_id.to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn decode_path(path: &str) -> Option<String> {
    let segments = path
        .split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8().ok()?;
            (!decoded.contains('/')).then(|| decoded.into_owned())
        })
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    sanitize_extension(ext)
}

fn extension_of_content_type(content_type: &str) -> Option<String> {
    let (_, subtype) = content_type.split_once('/')?;
    let subtype: String = subtype
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    sanitize_extension(&subtype)
}

fn sanitize_extension(ext: &str) -> Option<String> {
    if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// An image file received from a client.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Limits applied to every image upload before it reaches the object store.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, file: &UploadFile) -> Result<(), DomainError> {
        if !file.content_type.to_ascii_lowercase().starts_with("image/") {
            return Err(DomainError::Validation(format!(
                "Unsupported content type '{}', expected an image",
                file.content_type
            )));
        }
        if file.bytes.is_empty() {
            return Err(DomainError::Validation("Uploaded file is empty".to_string()));
        }
        if file.bytes.len() > self.max_bytes {
            return Err(DomainError::Validation(format!(
                "Image exceeds the {} byte upload limit",
                self.max_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://files.example.org/storage/v1/object/public/post-images";

    #[test]
    fn test_parse_accepts_namespaced_keys() {
        let key = ObjectKey::parse("6f1c/cover.png").unwrap();
        assert_eq!(key.owner(), "6f1c");
        assert_eq!(key.as_str(), "6f1c/cover.png");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for raw in ["", "cover.png", "/cover.png", "owner/", "owner//x.png", "owner/../x.png"] {
            assert!(ObjectKey::parse(raw).is_none(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_url_and_key_resolve_to_same_object() {
        let from_url =
            ObjectKey::from_reference(&format!("{BASE}/abc/photo.jpg?width=200"), BASE).unwrap();
        let from_key = ObjectKey::from_reference("abc/photo.jpg", BASE).unwrap();
        assert_eq!(from_url, from_key);
    }

    #[test]
    fn test_encoded_url_resolves_to_listed_name() {
        let from_url =
            ObjectKey::from_reference(&format!("{BASE}/5d0f/class%20photo.png"), BASE).unwrap();
        assert_eq!(Some(from_url), ObjectKey::parse("5d0f/class photo.png"));
    }

    #[test]
    fn test_encoded_separators_and_bad_utf8_are_ignored() {
        assert!(ObjectKey::from_reference(&format!("{BASE}/5d0f%2Fphoto.png"), BASE).is_none());
        assert!(ObjectKey::from_reference(&format!("{BASE}/5d0f/a%2Fb.png"), BASE).is_none());
        assert!(ObjectKey::from_reference(&format!("{BASE}/5d0f/%FF.png"), BASE).is_none());
        assert!(ObjectKey::from_reference(&format!("{BASE}/5d0f/%2E%2E"), BASE).is_none());
    }

    #[test]
    fn test_foreign_urls_and_blanks_are_ignored() {
        assert!(ObjectKey::from_reference("https://elsewhere.net/abc/photo.jpg", BASE).is_none());
        assert!(
            ObjectKey::from_reference(
                "https://files.example.org/storage/v1/object/public/avatars/abc/me.png",
                BASE
            )
            .is_none()
        );
        assert!(ObjectKey::from_reference("   ", BASE).is_none());
    }

    #[test]
    fn test_generate_uses_owner_namespace_and_extension() {
        let owner = Uuid::new_v4();
        let key = ObjectKey::generate(owner, "Holiday.JPG", "image/jpeg");
        assert!(key.belongs_to(owner));
        assert!(key.as_str().ends_with(".jpg"));

        let fallback = ObjectKey::generate(owner, "blob", "image/svg+xml");
        assert!(fallback.as_str().ends_with(".svg"));
    }

    #[test]
    fn test_upload_policy() {
        let policy = UploadPolicy { max_bytes: 4 };
        let file = |content_type: &str, bytes: &[u8]| UploadFile {
            filename: "a.png".to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        };

        assert!(policy.check(&file("image/png", b"abcd")).is_ok());
        assert!(policy.check(&file("text/plain", b"abcd")).is_err());
        assert!(policy.check(&file("image/png", b"")).is_err());
        assert!(policy.check(&file("image/png", b"abcde")).is_err());
    }
}
