//! Confirmation artifact rendering seam.
//!
//! The coordinator hands the artifact payload to a renderer and returns
//! whatever comes back to the web client for display as a scannable code.
//! Actual QR image generation is an external collaborator; the default
//! renderer ships the bare payload and lets the frontend draw the code.

use serde::{Deserialize, Serialize};

/// Error from artifact rendering.
#[derive(Debug, thiserror::Error)]
#[error("Failed to render confirmation artifact: {0}")]
pub struct RenderError(pub String);

/// A scannable confirmation artifact.
///
/// `payload` is what the scanning device presents back to the system. The
/// current protocol encodes only the spot identifier, not a per-request
/// nonce, so anyone who knows the spot id can forge a scan. Known gap,
/// kept on purpose; see DESIGN.md.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrArtifact {
    /// Token payload (the spot id).
    pub payload: String,
    /// Rendered image bytes, when the renderer produces one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<u8>>,
    /// MIME type of `media`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Renders a token payload into a scannable artifact.
pub trait QrRenderer: Send + Sync {
    fn render(&self, payload: &str) -> Result<QrArtifact, RenderError>;
}

/// Default renderer: passes the payload through without producing media.
#[derive(Debug, Default, Clone)]
pub struct PayloadRenderer;

impl QrRenderer for PayloadRenderer {
    fn render(&self, payload: &str) -> Result<QrArtifact, RenderError> {
        Ok(QrArtifact {
            payload: payload.to_string(),
            media: None,
            content_type: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_renderer_carries_spot_id_through() {
        let artifact = PayloadRenderer.render("A12").unwrap();
        assert_eq!(artifact.payload, "A12");
        assert!(artifact.media.is_none());
        assert!(artifact.content_type.is_none());
    }
}
