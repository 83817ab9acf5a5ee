//! NNTP command builders and response parsers

// Module declarations
pub mod article;
pub mod group;
pub mod response;

// Re-export all public items for backward compatibility
pub use article::*;
pub use group::*;
pub use response::*;

// Authentication and connection management commands

/// Build AUTHINFO USER command
pub fn authinfo_user(username: &str) -> String {
    format!("AUTHINFO USER {}\r\n", username)
}

/// Build AUTHINFO PASS command
pub fn authinfo_pass(password: &str) -> String {
    format!("AUTHINFO PASS {}\r\n", password)
}

/// Build QUIT command
pub fn quit() -> &'static str {
    "QUIT\r\n"
}
