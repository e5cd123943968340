//! Metered service types

use serde::{Deserialize, Serialize};

/// The individually metered AI tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// CV optimization
    Cv,
    /// Cover letter generation
    CoverLetter,
    /// Email preparation
    Email,
    /// Interview coaching
    Interview,
}

impl Service {
    /// All metered services
    pub const ALL: [Service; 4] = [
        Service::Cv,
        Service::CoverLetter,
        Service::Email,
        Service::Interview,
    ];

    /// Get the service name string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cv => "cv",
            Self::CoverLetter => "cover_letter",
            Self::Email => "email",
            Self::Interview => "interview",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Service {
    type Err = ServiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cv" => Ok(Self::Cv),
            "cover_letter" => Ok(Self::CoverLetter),
            "email" => Ok(Self::Email),
            "interview" => Ok(Self::Interview),
            _ => Err(ServiceParseError(s.to_string())),
        }
    }
}

/// Error parsing a service string
#[derive(Debug, Clone)]
pub struct ServiceParseError(pub String);

impl std::fmt::Display for ServiceParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid service: {}", self.0)
    }
}

impl std::error::Error for ServiceParseError {}
