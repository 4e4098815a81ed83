use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lifecycle of a driver call. There is no terminal state, every call ends
/// up in `Idle` again.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum CallState {
    #[default]
    Idle,
    AwaitingConfirmation,
    Active,
}
