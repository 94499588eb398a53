use serde::Serialize;
use ts_rs::TS;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    /// Stable machine-readable category, e.g. `forbidden`.
    code: &'static str,
    message: String,
}

impl ErrorResponse {
    pub(super) fn new(code: &'static str, message: String) -> Self {
        Self { code, message }
    }
}
