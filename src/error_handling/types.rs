use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadAddressFormatting(String),
    EmptyValue(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadAddressFormatting(e) => write!(f, "Address formatting error: {}", e),
            ConfigError::EmptyValue(e) => write!(f, "Missing value: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failures reported by the messaging client library.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    ConnectFailed(String),
    RequestFailed(String),
    NotConnected,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::ConnectFailed(e) => write!(f, "Connection failed: {}", e),
            ClientError::RequestFailed(e) => write!(f, "{}", e),
            ClientError::NotConnected => write!(f, "Connection Closed"),
        }
    }
}

impl std::error::Error for ClientError {}

#[derive(Debug)]
pub enum CredentialError {
    IoError(std::io::Error),
    SerializationFailed(String),
    WriteFailed,
    ReadFailed,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::IoError(e) => write!(f, "Credential IO error: {}", e),
            CredentialError::SerializationFailed(e) => {
                write!(f, "Credential serialization failed: {}", e)
            }
            CredentialError::WriteFailed => write!(f, "Credential write failed"),
            CredentialError::ReadFailed => write!(f, "Credential read failed"),
        }
    }
}

impl std::error::Error for CredentialError {}

impl From<std::io::Error> for CredentialError {
    fn from(err: std::io::Error) -> Self {
        CredentialError::IoError(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    PayloadTooLong(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::PayloadTooLong(e) => write!(f, "QR payload cannot be encoded: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

#[derive(Debug)]
pub enum SessionError {
    MissingPhoneNumber,
    InvalidPhoneNumber(String),
    CreationFailed(ClientError),
    PairingFailed(ClientError),
    NotFound(String),
}

impl SessionError {
    /// Whether the error was caused by the caller's input rather than by the client library.
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            SessionError::MissingPhoneNumber | SessionError::InvalidPhoneNumber(_)
        )
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::MissingPhoneNumber => write!(f, "Phone number required"),
            SessionError::InvalidPhoneNumber(_) => write!(
                f,
                "Invalid phone number. Include country code (e.g., 12345678901)"
            ),
            SessionError::CreationFailed(e) => write!(f, "Failed to create session: {}", e),
            SessionError::PairingFailed(e) => write!(f, "Failed to generate pairing code: {}", e),
            SessionError::NotFound(id) => write!(f, "Session {} not found or expired", id),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Web server bind failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    CredentialError(CredentialError),
    WebError(WebError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::CredentialError(e) => write!(f, "Credential store error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web interface error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<CredentialError> for ControllerError {
    fn from(err: CredentialError) -> Self {
        ControllerError::CredentialError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}
