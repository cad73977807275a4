use serde::{Deserialize, Serialize};
use validator::Validate;

/// Gateway callback body. Field names follow the aggregator convention
/// (camelCase form fields); `text` is the full accumulated input and is
/// absent or empty on the first callback of a conversation.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UssdRequestDto {
    #[serde(rename = "sessionId")]
    #[validate(length(min = 1, message = "sessionId is required"))]
    pub session_id: String,

    #[serde(rename = "phoneNumber")]
    #[validate(length(min = 4, message = "phoneNumber is required"))]
    pub phone_number: String,

    #[serde(default)]
    pub text: Option<String>,
}
