use secrecy::SecretString;

/// Process-wide configuration shared by the authentication gate and the
/// token verifier. Read-only after startup.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub jwt_secret: SecretString,
    pub issuer: String,
    pub token_ttl_seconds: i64,
    pub frontend_url: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(
        jwt_secret: SecretString,
        issuer: String,
        token_ttl_seconds: i64,
        frontend_url: String,
    ) -> Self {
        Self {
            jwt_secret,
            issuer,
            token_ttl_seconds,
            frontend_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            SecretString::from("signing-secret".to_string()),
            "SecurePass".to_string(),
            86_400,
            "http://localhost:3000".to_string(),
        );
        assert_eq!(args.jwt_secret.expose_secret(), "signing-secret");
        assert_eq!(args.issuer, "SecurePass");
        assert_eq!(args.token_ttl_seconds, 86_400);
        assert_eq!(args.frontend_url, "http://localhost:3000");
    }
}
