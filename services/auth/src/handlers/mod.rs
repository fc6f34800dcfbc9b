use serde::Serialize;

pub mod health;
pub mod login;
pub mod otp;
pub mod profile;
pub mod register;

/// `{success: true, message}` body shared by the account-lifecycle endpoints.
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    pub fn ok(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}
