//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::face::{FaceConfig, FaceVerifier};
use crate::services::qr::{PayloadRenderer, QrRenderer};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Confirmation artifact renderer
    pub renderer: Arc<dyn QrRenderer>,
    /// Face verification strategy chain
    pub verifier: Arc<FaceVerifier>,
}

impl AppState {
    /// Create application state with the default renderer and the face
    /// chain configured from the environment.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            renderer: Arc::new(PayloadRenderer),
            verifier: Arc::new(FaceVerifier::from_config(FaceConfig::from_env())),
        }
    }

    /// Create application state from explicit collaborators.
    pub fn with_parts(
        repository: Arc<dyn FullRepository>,
        renderer: Arc<dyn QrRenderer>,
        verifier: Arc<FaceVerifier>,
    ) -> Self {
        Self {
            repository,
            renderer,
            verifier,
        }
    }
}
