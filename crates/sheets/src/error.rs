/// Error type for sheet operations.
#[derive(Debug)]
pub enum SheetsError {
    /// Required configuration is missing
    NotConfigured(String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// Response body could not be parsed
    Parse(String),
    /// The API answered with an error payload
    Api(String),
}

impl std::fmt::Display for SheetsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsError::NotConfigured(msg) => write!(f, "Not configured: {}", msg),
            SheetsError::Network(msg) => write!(f, "Network error: {}", msg),
            SheetsError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            SheetsError::Parse(msg) => write!(f, "Parse error: {}", msg),
            SheetsError::Api(msg) => write!(f, "API error: {}", msg),
        }
    }
}

impl std::error::Error for SheetsError {}
