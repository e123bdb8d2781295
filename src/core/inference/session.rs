//! Helpers for working directly with ONNX Runtime sessions.

use crate::core::errors::{DeployError, SimpleError};
use ort::session::{Session, builder::SessionBuilder};
use std::path::Path;

const SESSION_CREATION_FAILURE: &str = "failed to create ONNX session";
const SESSION_CONFIGURATION_FAILURE: &str =
    "failed to configure ONNX session (threads, optimization or execution providers)";

/// Checks that a model artifact exists and is a regular file.
pub(crate) fn check_artifact(path: &Path, kind: &str) -> Result<(), DeployError> {
    if !path.exists() {
        return Err(DeployError::model_load_error(
            path,
            format!("{kind} not found"),
            Some("check the model directory and file names"),
            None::<SimpleError>,
        ));
    }
    if !path.is_file() {
        return Err(DeployError::model_load_error(
            path,
            format!("{kind} is not a regular file"),
            None,
            None::<SimpleError>,
        ));
    }
    Ok(())
}

/// Builds a session using a caller-provided builder configuration.
pub(crate) fn load_session_with<F>(
    model_path: impl AsRef<Path>,
    configure_builder: F,
    suggestion: Option<&str>,
) -> Result<Session, DeployError>
where
    F: FnOnce(SessionBuilder) -> Result<SessionBuilder, ort::Error>,
{
    let path = model_path.as_ref();
    let builder = Session::builder()?;
    let builder = configure_builder(builder).map_err(|e| {
        DeployError::model_load_error(path, SESSION_CONFIGURATION_FAILURE, suggestion, Some(e))
    })?;
    let session = builder.commit_from_file(path).map_err(|e| {
        DeployError::model_load_error(path, SESSION_CREATION_FAILURE, suggestion, Some(e))
    })?;
    Ok(session)
}
