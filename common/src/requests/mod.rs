use serde::{Deserialize, Serialize};

/// Request payload for the generation start endpoint.
/// References a previously analyzed session plus the layout options.
#[derive(Serialize, Deserialize)]
pub struct StartGenerateRequest {
    pub session_id: String,
    #[serde(default = "default_qr_position")]
    pub qr_position: String,
    #[serde(default = "default_sig_position")]
    pub sig_position: String,
}

fn default_qr_position() -> String {
    "bottom-right".to_string()
}

fn default_sig_position() -> String {
    "bottom-center".to_string()
}
