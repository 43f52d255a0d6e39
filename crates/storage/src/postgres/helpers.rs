//! Shared helper functions for PostgreSQL row conversion.

use facilitator_core::error::{StorageError, StorageResult};

/// Convert a `Vec<u8>` to a fixed-size 32-byte array.
///
/// Returns an error naming the offending column if the length doesn't match.
pub fn bytes_to_hash32(bytes: Vec<u8>, field_name: &str) -> StorageResult<[u8; 32]> {
    bytes.try_into().map_err(|v: Vec<u8>| {
        StorageError::SerializationError(format!(
            "{} has invalid length: expected 32, got {}",
            field_name,
            v.len()
        ))
    })
}

/// Convert a `Vec<u8>` to a fixed-size 20-byte account address.
pub fn bytes_to_address(bytes: Vec<u8>, field_name: &str) -> StorageResult<[u8; 20]> {
    bytes.try_into().map_err(|v: Vec<u8>| {
        StorageError::SerializationError(format!(
            "{} has invalid length: expected 20, got {}",
            field_name,
            v.len()
        ))
    })
}

/// Convert an optional `Vec<u8>` to an optional 32-byte array.
pub fn bytes_to_optional_hash32(
    bytes: Option<Vec<u8>>,
    field_name: &str,
) -> StorageResult<Option<[u8; 32]>> {
    match bytes {
        Some(b) => Ok(Some(bytes_to_hash32(b, field_name)?)),
        None => Ok(None),
    }
}

/// Convert an optional `Vec<u8>` to an optional 20-byte address.
pub fn bytes_to_optional_address(
    bytes: Option<Vec<u8>>,
    field_name: &str,
) -> StorageResult<Option<[u8; 20]>> {
    match bytes {
        Some(b) => Ok(Some(bytes_to_address(b, field_name)?)),
        None => Ok(None),
    }
}

/// Build the error for a TEXT enum column holding a value no variant maps to.
pub fn unknown_enum_value(field_name: &str, value: &str) -> StorageError {
    StorageError::SerializationError(format!("{field_name} has unknown value: {value}"))
}

/// Map a sqlx error onto [`StorageError`], keeping unique-constraint
/// violations (SQLSTATE 23505) distinct from plain query failures.
pub fn map_sqlx_error(error: sqlx::Error) -> StorageError {
    match &error {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StorageError::ConstraintViolation(db.to_string())
        }
        _ => StorageError::QueryError(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: erreurs incluent le nom du champ pour debug
    #[test]
    fn test_error_includes_field_name() {
        let bad_bytes = vec![1u8; 16]; // mauvaise longueur
        let result = bytes_to_hash32(bad_bytes, "message.message_hash");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("message.message_hash"));
        assert!(err.contains("expected 32"));
    }

    #[test]
    fn test_hash32_accepts_exact_length() {
        let hash = bytes_to_hash32(vec![0xABu8; 32], "message.message_hash").unwrap();
        assert_eq!(hash, [0xABu8; 32]);
    }

    // Test critique: une adresse n'est jamais interchangeable avec un hash
    #[test]
    fn test_address_rejects_hash_sized_input() {
        let result = bytes_to_address(vec![0u8; 32], "message.sender");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("expected 20"));
        assert!(err.contains("32"));
    }

    #[test]
    fn test_optional_helpers_pass_through_none() {
        assert!(
            bytes_to_optional_hash32(None, "message.secret")
                .unwrap()
                .is_none()
        );
        assert!(
            bytes_to_optional_address(None, "message.sender")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_optional_helper_still_validates_some() {
        let result = bytes_to_optional_hash32(Some(vec![0u8; 5]), "message.hash_lock");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_enum_value_names_column_and_value() {
        let err = unknown_enum_value("message.source_status", "minted").to_string();
        assert!(err.contains("message.source_status"));
        assert!(err.contains("minted"));
    }
}
