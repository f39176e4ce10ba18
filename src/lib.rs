//! # SecurePass (Credential Vault & Two-Factor Authentication)
//!
//! `securepass` is a credential vault service. Users register with a username
//! and password, enroll a TOTP second factor from the provisioning secret
//! returned at registration, and authenticate with password + TOTP code to
//! manage per-site credential records under their own identity.
//!
//! ## Identity Model
//!
//! - **Usernames** are unique and immutable; the account keeps a single TOTP
//!   secret generated once at registration.
//! - **Vault entries** belong exclusively to one user, keep their insertion
//!   order, and are only ever appended or deleted — never updated in place.
//!
//! ## Authentication
//!
//! Passwords are stored as Argon2id hashes. Login requires username, password
//! and a current TOTP code; success mints an HS256-signed session token that
//! every `/passwords` request must present as a bearer credential.
//!
//! Failed logins return the same `401` for an unknown username and for a wrong
//! password so accounts cannot be enumerated; a wrong TOTP code is reported
//! separately.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
