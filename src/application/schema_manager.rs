// Schema manager - field-schema lifecycle and the locking rule
//
// Pure functions; persistence is the caller's responsibility.
use crate::domain::schema::{FieldSchema, SchemaError};

/// A schema is locked the instant its component has any data records.
/// Derived, never stored, so deleting the last record reopens the schema.
pub fn is_locked(record_count: usize) -> bool {
    record_count > 0
}

/// Validate a candidate schema against the current one.
///
/// Unlocked: the candidate fully replaces the current schema; only its own
/// structure (unique, non-empty names) is checked.
///
/// Locked: every current field must reappear with the same name and type,
/// in the same relative order, at the same or a later index. Only additions
/// are accepted; any removal, rename, or retype fails naming the offending
/// field.
pub fn propose_schema(
    current: &FieldSchema,
    candidate: FieldSchema,
    locked: bool,
) -> Result<FieldSchema, SchemaError> {
    candidate.check_structure()?;

    if !locked {
        return Ok(candidate);
    }

    let mut cursor = 0;
    for existing in current.fields() {
        let found = candidate.fields()[cursor..]
            .iter()
            .position(|f| f.name == existing.name);
        match found {
            Some(offset) => {
                let candidate_field = &candidate.fields()[cursor + offset];
                if candidate_field.kind != existing.kind {
                    return Err(SchemaError::Locked {
                        field: existing.name.clone(),
                    });
                }
                cursor += offset + 1;
            }
            // Missing past the cursor: removed, renamed, or reordered.
            None => {
                return Err(SchemaError::Locked {
                    field: existing.name.clone(),
                });
            }
        }
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{Field, FieldKind};

    fn schema(fields: &[(&str, FieldKind)]) -> FieldSchema {
        FieldSchema::new(
            fields
                .iter()
                .map(|(name, kind)| Field::new(*name, *kind))
                .collect(),
        )
    }

    #[test]
    fn test_is_locked_tracks_record_count() {
        assert!(!is_locked(0));
        assert!(is_locked(1));
        assert!(is_locked(50));
    }

    #[test]
    fn test_unlocked_replaces_freely() {
        let current = schema(&[("price", FieldKind::Number)]);
        let candidate = schema(&[("cost", FieldKind::String)]);
        let accepted = propose_schema(&current, candidate.clone(), false).unwrap();
        assert_eq!(accepted, candidate);
    }

    #[test]
    fn test_unlocked_still_checks_structure() {
        let current = FieldSchema::empty();
        let candidate = schema(&[("a", FieldKind::String), ("a", FieldKind::Number)]);
        assert_eq!(
            propose_schema(&current, candidate, false),
            Err(SchemaError::DuplicateField {
                field: "a".to_string()
            })
        );
    }

    #[test]
    fn test_locked_accepts_pure_append() {
        let current = schema(&[("price", FieldKind::Number)]);
        let candidate = schema(&[("price", FieldKind::Number), ("currency", FieldKind::String)]);
        assert!(propose_schema(&current, candidate, true).is_ok());
    }

    #[test]
    fn test_locked_accepts_insertion_before_existing_fields() {
        let current = schema(&[("a", FieldKind::String), ("b", FieldKind::Number)]);
        let candidate = schema(&[
            ("new", FieldKind::Boolean),
            ("a", FieldKind::String),
            ("b", FieldKind::Number),
        ]);
        assert!(propose_schema(&current, candidate, true).is_ok());
    }

    #[test]
    fn test_locked_rejects_removal() {
        let current = schema(&[("price", FieldKind::Number), ("qty", FieldKind::Number)]);
        let candidate = schema(&[("price", FieldKind::Number)]);
        assert_eq!(
            propose_schema(&current, candidate, true),
            Err(SchemaError::Locked {
                field: "qty".to_string()
            })
        );
    }

    #[test]
    fn test_locked_rejects_rename() {
        let current = schema(&[("price", FieldKind::Number)]);
        let candidate = schema(&[("cost", FieldKind::Number)]);
        assert_eq!(
            propose_schema(&current, candidate, true),
            Err(SchemaError::Locked {
                field: "price".to_string()
            })
        );
    }

    #[test]
    fn test_locked_rejects_retype() {
        let current = schema(&[("price", FieldKind::Number)]);
        let candidate = schema(&[("price", FieldKind::String)]);
        assert_eq!(
            propose_schema(&current, candidate, true),
            Err(SchemaError::Locked {
                field: "price".to_string()
            })
        );
    }

    #[test]
    fn test_locked_rejects_reorder_of_existing_fields() {
        let current = schema(&[("a", FieldKind::String), ("b", FieldKind::Number)]);
        let candidate = schema(&[("b", FieldKind::Number), ("a", FieldKind::String)]);
        // "a" is matched first, leaving "b" stranded behind the cursor.
        assert_eq!(
            propose_schema(&current, candidate, true),
            Err(SchemaError::Locked {
                field: "b".to_string()
            })
        );
    }
}
