//! FCPXML error types.

/// Document-level failures. Everything below the document level is reported
/// as a diagnostic instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FcpxmlError {
    /// Input is not well-formed XML.
    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// The root element is not `<fcpxml>`.
    #[error("Root element must be <fcpxml>, found <{0}>")]
    NotFcpxml(String),
}

/// Type alias for document-level results.
pub type FcpxmlResult<T> = Result<T, FcpxmlError>;

/// Failures while resolving a frame rate through the resource table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceLookupError {
    /// No resource with this ID exists.
    #[error("No resource with id '{0}'")]
    MissingResource(String),

    /// The resource does not lead to a format.
    #[error("Resource '{0}' does not reference a format")]
    NotAFormat(String),

    /// The format has no frameDuration.
    #[error("Format '{0}' has no frameDuration")]
    MissingFrameDuration(String),

    /// The frame duration does not match a known rate.
    #[error("Format '{id}' frameDuration {frame_duration} is not a known frame rate")]
    UnknownFrameRate { id: String, frame_duration: String },
}

impl ResourceLookupError {
    /// The resource ID the lookup failed on.
    pub fn id(&self) -> &str {
        match self {
            Self::MissingResource(id)
            | Self::NotAFormat(id)
            | Self::MissingFrameDuration(id)
            | Self::UnknownFrameRate { id, .. } => id,
        }
    }
}
