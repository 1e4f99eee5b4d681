//! Environment configuration request/response types.

use archboard_storage::{EnvDraft, EnvVarId, EnvVariable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ListEnvResponse {
    pub variables: Vec<EnvVariable>,
}

/// Insert (no id, or a `temp-` id) or update one variable.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveEnvRequest {
    #[serde(default)]
    pub id: Option<EnvVarId>,
    #[serde(flatten)]
    pub draft: EnvDraft,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteEnvResponse {
    pub deleted: bool,
}
