use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload. Possession of a correctly signed, unexpired token is the
/// whole authorization story; nothing is tracked server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // user ID
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}
