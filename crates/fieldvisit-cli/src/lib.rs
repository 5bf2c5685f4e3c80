use std::path::PathBuf;
use std::sync::Arc;

use fieldvisit_core::validation::{validate_image_filename, validate_image_size};
use fieldvisit_core::{AppError, Attachment, Config, ErrorMetadata, LogLevel};
use fieldvisit_storage::{create_uploader, RemoteUploader};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Read picked photo files, rejecting anything that is not a non-empty JPEG/PNG file.
pub async fn load_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>, AppError> {
    let mut attachments = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid photo path: {}", path.display())))?
            .to_string();
        validate_image_filename(&name)?;

        let data = tokio::fs::read(path).await.map_err(|e| {
            AppError::InvalidInput(format!("Cannot read photo {}: {}", path.display(), e))
        })?;
        validate_image_size(&name, data.len())?;

        attachments.push(Attachment::new(name, data));
    }
    Ok(attachments)
}

/// The configured uploader, or a configuration error when uploads are disabled.
pub fn required_uploader(config: &Config) -> Result<Arc<dyn RemoteUploader>, AppError> {
    create_uploader(config)?.ok_or_else(|| {
        AppError::Config("Uploads are disabled; set UPLOAD_ENABLED=true".to_string())
    })
}

/// Log an error at its own level and print what the user should see.
pub fn report_error(err: &AppError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, code = err.error_code(), "Command failed"),
        LogLevel::Warn => tracing::warn!(error = %err, code = err.error_code(), "Command failed"),
        LogLevel::Error => tracing::error!(error = %err, code = err.error_code(), "Command failed"),
    }

    eprintln!("Error: {}", err.client_message());
    if let Some(action) = err.suggested_action() {
        eprintln!("Hint: {}", action);
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
