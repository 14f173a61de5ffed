use rewardloop_domain::shared::DomainError;

/// Maps low-level persistence errors into domain errors with call-site
/// context.
pub struct RepositoryErrorMapper;

impl RepositoryErrorMapper {
    pub fn map_sqlx_error(error: sqlx::Error, context: &str) -> DomainError {
        match &error {
            sqlx::Error::RowNotFound => DomainError::NotFound(format!("{context}: row not found")),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DomainError::DataIntegrity(format!("{context}: unique constraint violated"))
            }
            _ => DomainError::Repository(format!("{context}: {error}")),
        }
    }

    pub fn map_json_error(error: serde_json::Error, context: &str) -> DomainError {
        DomainError::Serialization(format!("{context}: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = RepositoryErrorMapper::map_sqlx_error(sqlx::Error::RowNotFound, "Find account");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err = RepositoryErrorMapper::map_json_error(json_err, "Deserialize logs");
        assert!(matches!(err, DomainError::Serialization(_)));
    }
}
