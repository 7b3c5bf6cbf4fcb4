use crate::gateway::InferenceGateway;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<InferenceGateway>,
    /// Shown to the caller whenever the inference call fails
    pub fallback_reply: Arc<str>,
}

impl AppState {
    pub fn new(gateway: InferenceGateway, fallback_reply: impl Into<Arc<str>>) -> Self {
        Self {
            gateway: Arc::new(gateway),
            fallback_reply: fallback_reply.into(),
        }
    }
}
