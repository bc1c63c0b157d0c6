//! Signed-in user context and national identity number checks.
//!
//! The OIDC login itself happens upstream of this service.

pub mod personal_number;
pub mod session;

pub use personal_number::{Gender, PersonalNumber, PersonalNumberError};
pub use session::{SessionContext, SessionRejection, SessionRole};
