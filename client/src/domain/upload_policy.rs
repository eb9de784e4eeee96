//! Size and type rules applied to files before they leave the client.

use std::fmt;
use std::io;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;

use super::{Error, OpportunityId};

const MIB: u64 = 1024 * 1024;

/// Extensions accepted for application documents and resumes.
pub const DOCUMENT_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// Where an upload is headed; determines the ceiling and accepted types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadContext {
    /// Supporting document for an application.
    ApplicationDocument {
        /// Opportunity the document supports.
        opportunity_id: OpportunityId,
    },
    /// Profile photo.
    ProfilePhoto,
    /// Curriculum vitae attached to the profile.
    Resume,
}

impl UploadContext {
    /// Maximum accepted size in bytes.
    pub const fn max_bytes(&self) -> u64 {
        match self {
            Self::ApplicationDocument { .. } | Self::Resume => 10 * MIB,
            Self::ProfilePhoto => 5 * MIB,
        }
    }

    /// Short label used in messages and logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ApplicationDocument { .. } => "document",
            Self::ProfilePhoto => "profile photo",
            Self::Resume => "resume",
        }
    }

    fn accepts(&self, file: &UploadFile) -> bool {
        match self {
            Self::ApplicationDocument { .. } | Self::Resume => file
                .extension()
                .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str())),
            Self::ProfilePhoto => file.content_type.starts_with("image/"),
        }
    }
}

/// File selected for upload, held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name, used as the display name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    /// Build a file, inferring the MIME type from the name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_for_name(&file_name).to_owned();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read a file from disk through a capability-scoped handle on its
    /// parent directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the path has no file name or cannot be read.
    pub fn from_path(path: &Utf8Path) -> io::Result<Self> {
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("{path} has no file name"))
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
        let bytes = dir.read(file_name)?;
        Ok(Self::new(file_name, bytes))
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }

    /// Lowercased extension, when the name has one.
    pub fn extension(&self) -> Option<String> {
        Utf8Path::new(&self.file_name)
            .extension()
            .map(str::to_ascii_lowercase)
    }
}

/// MIME type for a file name, by extension.
pub fn mime_for_name(file_name: &str) -> &'static str {
    let extension = Utf8Path::new(file_name)
        .extension()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Reasons a file is refused before transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    /// File exceeds the ceiling.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Ceiling in bytes.
        limit: u64,
    },
    /// Type not accepted for the context.
    UnsupportedType {
        /// Reported MIME type.
        content_type: String,
    },
}

/// Check `file` against the rules for `context`.
///
/// Size is checked before type.
///
/// # Examples
/// ```
/// use portal_client::domain::{check_upload, UploadContext, UploadFile};
///
/// let photo = UploadFile::new("me.pdf", vec![0; 16]);
/// assert!(check_upload(&UploadContext::ProfilePhoto, &photo).is_err());
/// ```
pub fn check_upload(context: &UploadContext, file: &UploadFile) -> Result<(), UploadRejection> {
    let limit = context.max_bytes();
    if file.size() > limit {
        return Err(UploadRejection::TooLarge {
            size: file.size(),
            limit,
        });
    }
    if !context.accepts(file) {
        return Err(UploadRejection::UnsupportedType {
            content_type: file.content_type.clone(),
        });
    }
    Ok(())
}

/// Render a rejection as a domain error naming the file.
pub fn rejection_to_error(context: &UploadContext, file: &UploadFile, rejection: &UploadRejection) -> Error {
    match rejection {
        UploadRejection::TooLarge { limit, .. } => Error::file_too_large(format!(
            "{} must be less than {}MB",
            file.file_name,
            limit / MIB
        )),
        UploadRejection::UnsupportedType { content_type } => match context {
            UploadContext::ProfilePhoto => Error::unsupported_type(format!(
                "{} is not an image ({content_type})",
                file.file_name
            )),
            _ => Error::unsupported_type(format!(
                "{} must be one of: {}",
                file.file_name,
                DOCUMENT_EXTENSIONS.join(", ")
            )),
        },
    }
}
