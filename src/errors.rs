use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request error during {operation}: {source}")]
    Http {
        operation: String,
        source: reqwest::Error,
    },

    #[error("Report server returned HTTP {status} for {operation}: {body}")]
    HttpStatus {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation} failed: {message}")]
    SoapFault {
        operation: String,
        code: Option<String>,
        message: String,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed {operation} response: {reason}")]
    MalformedResponse { operation: String, reason: String },

    #[error("Could not read report definition {path}: {reason}")]
    ReportRead { path: String, reason: String },

    #[error("Only reports with a single datasource are supported. This report has {0} datasources")]
    UnsupportedDataSources(usize),
}

impl AppError {
    /// Server-side error code carried by a SOAP fault, e.g. `rsItemNotFound`.
    pub fn fault_code(&self) -> Option<&str> {
        match self {
            AppError::SoapFault { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
