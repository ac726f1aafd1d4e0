//! Helper toolkit for axum request handlers.
//!
//! Bundles the small utilities most JSON/file-serving handlers end up
//! needing: secure random tokens, multipart file uploads with content-type
//! sniffing, slug generation, forced-download responses, and JSON
//! request/response helpers including an outbound POST. Every operation is
//! self-contained and runs within the calling task; the toolkit keeps no
//! state across calls.

pub mod error;
pub mod files;
pub mod json;
pub mod random;
pub mod remote;
pub mod slug;
pub mod sniff;
pub mod upload;

pub use error::ToolkitError;
pub use files::{create_dir_if_not_exist, download_static_file};
pub use json::JsonResponse;
pub use random::secure_token;
pub use slug::slugify;
pub use sniff::detect_content_type;
pub use upload::{UploadError, UploadedFile};

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024; // 1 GiB
const DEFAULT_MAX_JSON_BYTES: usize = 1024 * 1024; // 1 MiB

/// Limits and policy applied by the configurable operations.
///
/// A zero limit means "use the built-in default"; an empty allow-list means
/// every sniffed content type is accepted.
#[derive(Debug, Clone, Default)]
pub struct ToolkitConfig {
    /// Upper bound on a whole multipart upload body. 0 = 1 GiB.
    pub max_upload_bytes: u64,
    /// Sniffed content types accepted by the upload handler. Empty = all.
    pub allowed_mime_types: Vec<String>,
    /// Upper bound on a JSON request body. 0 = 1 MiB.
    pub max_json_bytes: usize,
    /// Tolerate JSON object keys the target type does not declare.
    pub allow_unknown_json_fields: bool,
}

impl ToolkitConfig {
    pub(crate) fn effective_max_upload_bytes(&self) -> u64 {
        if self.max_upload_bytes == 0 {
            DEFAULT_MAX_UPLOAD_BYTES
        } else {
            self.max_upload_bytes
        }
    }

    pub(crate) fn effective_max_json_bytes(&self) -> usize {
        if self.max_json_bytes == 0 {
            DEFAULT_MAX_JSON_BYTES
        } else {
            self.max_json_bytes
        }
    }

    pub(crate) fn is_mime_allowed(&self, detected: &str) -> bool {
        if self.allowed_mime_types.is_empty() {
            return true;
        }
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(detected))
    }
}

/// Entry point for the configurable operations.
///
/// Cheap to clone; a clone shares nothing with the original, so concurrent
/// handlers can each hold their own copy.
#[derive(Debug, Clone, Default)]
pub struct Toolkit {
    pub config: ToolkitConfig,
}

impl Toolkit {
    pub fn new(config: ToolkitConfig) -> Self {
        Self { config }
    }
}
