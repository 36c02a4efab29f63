use super::{Oracle, OracleError, OracleRequest, ResponseMode};
use async_trait::async_trait;

const MAX_ECHO_CHARS: usize = 200;

/// A network-free oracle for development and transport tests.
///
/// Free-text requests echo the last user message back (so the learner turns
/// into a perfect parrot), structured requests yield an empty question list.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineOracle;

#[async_trait]
impl Oracle for OfflineOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        match request.mode {
            ResponseMode::StructuredJson => Ok(r#"{"questions": []}"#.to_string()),
            ResponseMode::FreeText => {
                let echo: String = request
                    .last_user_message()
                    .unwrap_or_default()
                    .trim()
                    .chars()
                    .take(MAX_ECHO_CHARS)
                    .collect();
                if echo.is_empty() {
                    Ok("...".to_string())
                } else {
                    Ok(echo)
                }
            }
        }
    }
}
