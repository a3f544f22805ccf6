use thiserror::Error;

// ============================================================================
// Rendering / Asset Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to create PDF: {0}")]
    PdfError(String),
    #[error("Failed to create Word document: {0}")]
    DocxError(String),
    #[error("Failed to generate QR code: {0}")]
    QrError(String),
    #[error("Failed to load logo: {0}")]
    LogoError(String),
    #[error("Failed to load font: {0}")]
    FontError(String),
    #[error("Invalid date format: {0}")]
    DateError(String),
    #[error("Invalid worksheet request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// ============================================================================
// AI Provider Errors
// ============================================================================

/// Every variant is recoverable: the service turns it into a notice and
/// switches to the template generator.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} is not available")]
    NotConfigured { provider: String },
    #[error("{provider} request timed out")]
    Timeout { provider: String },
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },
    #[error("{provider} returned an unexpected response: {message}")]
    BadResponse { provider: String, message: String },
    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },
}

// ============================================================================
// File Ingestion Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to read PDF text: {0}")]
    Pdf(String),
    #[error("Failed to read Word document: {0}")]
    Docx(String),
    #[error("No text found in document")]
    Empty,
}
