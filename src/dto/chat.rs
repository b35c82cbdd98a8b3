use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ChatMessage;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageList {
    pub items: Vec<ChatMessage>,
}
