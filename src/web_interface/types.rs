use serde::{Deserialize, Serialize};

use crate::session_management::{CreateOutcome, PairingOutcome, QrReport, StatusReport};

/// Parameters of `/api/session`, from the JSON body (POST) or the query string (GET).
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    pub action: Option<String>,
    pub session_id: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Pair,
    Status,
    Destroy,
    Qr,
}

impl Action {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "create" => Some(Action::Create),
            "pair" => Some(Action::Pair),
            "status" => Some(Action::Status),
            "destroy" => Some(Action::Destroy),
            "qr" => Some(Action::Qr),
            _ => None,
        }
    }
}

/// API error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub success: bool,
    pub session_id: String,
    pub status: String,
    pub qr: Option<String>,
    pub message: String,
}

impl From<CreateOutcome> for CreateResponse {
    fn from(outcome: CreateOutcome) -> Self {
        let message = format!(
            "Session created. Use GET /api/session?action=status&sessionId={} to check status",
            outcome.session_id
        );
        Self {
            success: true,
            status: outcome.status.to_string(),
            session_id: outcome.session_id,
            qr: outcome.qr,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairResponse {
    pub success: bool,
    pub session_id: String,
    pub phone_number: String,
    pub pairing_code: String,
    pub raw_code: String,
    pub instructions: Vec<String>,
    pub message: String,
}

impl From<PairingOutcome> for PairResponse {
    fn from(outcome: PairingOutcome) -> Self {
        Self {
            success: true,
            session_id: outcome.session_id,
            phone_number: outcome.phone_number,
            pairing_code: outcome.pairing_code,
            raw_code: outcome.raw_code,
            instructions: outcome.instructions,
            message: outcome.message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub session_id: String,
    pub status: String,
    #[serde(rename = "hasQR")]
    pub has_qr: bool,
    pub has_pairing_code: bool,
    pub connected: bool,
}

impl From<StatusReport> for StatusResponse {
    fn from(report: StatusReport) -> Self {
        Self {
            success: true,
            session_id: report.session_id,
            status: report.status.to_string(),
            has_qr: report.has_qr,
            has_pairing_code: report.has_pairing_code,
            connected: report.connected,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrResponse {
    pub success: bool,
    pub session_id: String,
    pub qr: Option<String>,
}

impl From<QrReport> for QrResponse {
    fn from(report: QrReport) -> Self {
        Self {
            success: true,
            session_id: report.session_id,
            qr: report.qr,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundResponse {
    pub success: bool,
    pub session_id: String,
    pub status: String,
    pub message: String,
}

impl NotFoundResponse {
    pub fn new(session_id: &str) -> Self {
        Self {
            success: false,
            session_id: session_id.to_string(),
            status: String::from("not_found"),
            message: String::from("Session not found or expired"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyResponse {
    pub success: bool,
    pub session_id: String,
    pub message: String,
}

impl DestroyResponse {
    pub fn new(session_id: &str) -> Self {
        Self {
            success: true,
            session_id: session_id.to_string(),
            message: String::from("Session destroyed"),
        }
    }
}
