use rand::RngExt;

use crate::domain::types::OTP_LEN;

pub mod login;
pub mod otp;
pub mod profile;
pub mod register;

/// Six decimal digits drawn uniformly from `100000..=999999`.
pub fn generate_otp_code() -> String {
    let code = rand::rng().random_range(100_000..=999_999u32);
    debug_assert_eq!(code.to_string().len(), OTP_LEN);
    code.to_string()
}

/// Trimmed value of a request field, or `None` when absent or blank.
pub(crate) fn present(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}
