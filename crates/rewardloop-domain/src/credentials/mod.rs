use crate::shared::DomainError;

/// What the user pasted when importing an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialInput {
    /// A raw long-lived refresh secret, usable as-is.
    RefreshToken(String),
    /// An exchange code extracted from an authorization-callback URL; must go
    /// through the one-time code exchange before the account can run.
    ExchangeCode(String),
}

impl CredentialInput {
    /// Refresh secrets carry a recognizable prefix.
    pub const TOKEN_PREFIX: &'static str = "M.";
    /// Anything shorter cannot be a real secret.
    pub const MIN_TOKEN_LEN: usize = 50;

    /// Parse pasted input.
    ///
    /// Strategy:
    /// 1. A string with the token prefix and plausible length is taken as the
    ///    refresh secret itself.
    /// 2. Otherwise look for a `code` query/fragment parameter, the shape an
    ///    authorization callback URL carries.
    /// 3. Everything else is rejected.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidCredentials(
                "Credential input is empty".to_string(),
            ));
        }

        if trimmed.starts_with(Self::TOKEN_PREFIX) && trimmed.len() >= Self::MIN_TOKEN_LEN {
            return Ok(CredentialInput::RefreshToken(trimmed.to_string()));
        }

        if let Some(code) = extract_code_param(trimmed) {
            return Ok(CredentialInput::ExchangeCode(code));
        }

        Err(DomainError::InvalidCredentials(
            "Expected a refresh token or an authorization callback URL".to_string(),
        ))
    }
}

/// Pull the `code` parameter out of a callback URL, its query string, or its
/// fragment. Works on bare fragments too ("code=...&state=...").
fn extract_code_param(input: &str) -> Option<String> {
    let after_scheme = input
        .split_once('?')
        .map(|(_, rest)| rest)
        .unwrap_or(input);

    for section in after_scheme.split('#') {
        for pair in section.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                if key.trim() == "code" && !value.trim().is_empty() {
                    return Some(value.trim().to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "M.R3_BAY.abcdefghijklmnopqrstuvwxyz0123456789abcdefghijk";

    #[test]
    fn test_parse_raw_refresh_token() {
        assert_eq!(
            CredentialInput::parse(&format!("  {TOKEN}  ")).unwrap(),
            CredentialInput::RefreshToken(TOKEN.to_string())
        );
    }

    #[test]
    fn test_short_prefixed_string_rejected() {
        assert!(CredentialInput::parse("M.short").is_err());
    }

    #[test]
    fn test_parse_callback_url() {
        let url = "https://login.example.com/callback?code=M.C507_BAY.2.U.abc123&state=xyz";
        assert_eq!(
            CredentialInput::parse(url).unwrap(),
            CredentialInput::ExchangeCode("M.C507_BAY.2.U.abc123".to_string())
        );
    }

    #[test]
    fn test_parse_bare_query_fragment() {
        assert_eq!(
            CredentialInput::parse("code=abc123").unwrap(),
            CredentialInput::ExchangeCode("abc123".to_string())
        );
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(CredentialInput::parse("hello world").is_err());
        assert!(CredentialInput::parse("").is_err());
        assert!(CredentialInput::parse("https://example.com/?state=only").is_err());
    }
}
