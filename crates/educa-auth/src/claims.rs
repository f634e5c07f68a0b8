use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JWT claims for access tokens.
///
/// `role` holds the wire name of the user's role (`ADMINISTRADOR`,
/// `PROFESSOR`, `ALUNO`, `GESTOR` or `RESPONSAVEL`); authorization middleware
/// parses it and checks it against route allow-lists without touching the
/// database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize() {
        let claims = Claims {
            sub: "user-id-123".to_string(),
            email: "prof@escola.br".to_string(),
            role: "PROFESSOR".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""sub":"user-id-123""#));
        assert!(serialized.contains(r#""role":"PROFESSOR""#));
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"user-id-456","email":"aluno@escola.br","role":"ALUNO","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user-id-456");
        assert_eq!(claims.role, "ALUNO");
        assert_eq!(claims.exp, 9999999999);
    }

    #[test]
    fn test_claims_missing_role_rejected() {
        let json = r#"{"sub":"x","email":"x@y.z","exp":1,"iat":1}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }
}
