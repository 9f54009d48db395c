//! Partial updates.
//!
//! A patch is a JSON object merged key by key over the serialized entity; the
//! result is deserialized back and re-validated by the caller. Creation bodies
//! go through [`create`], which holds them to the same field set.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::{Constraint, ValidationError};

/// Field → new value. `null` clears an optional field.
pub type Patch = Map<String, Value>;

pub(crate) const CONFIGURATION_READONLY: &[&str] = &["name", "proxies"];
pub(crate) const PROXY_READONLY: &[&str] = &["name", "kind", "acls", "targets", "servers"];
pub(crate) const SERVER_READONLY: &[&str] = &["name"];
pub(crate) const TARGET_READONLY: &[&str] = &["rank"];

/// Apply `patch` over `current`.
///
/// Read-only fields may be repeated with their current value but not changed;
/// unknown fields are rejected.
pub(crate) fn merge<T>(current: &T, patch: &Patch, readonly: &[&str]) -> Result<T, ValidationError>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(current).map_err(invalid)?;
    let Some(object) = value.as_object_mut() else {
        return Err(ValidationError::new(
            "body",
            Constraint::Invalid("entity is not an object".to_string()),
        ));
    };

    for (field, new) in patch {
        let Some(old) = object.get(field) else {
            return Err(ValidationError::new(
                field.as_str(),
                Constraint::Invalid("unknown field".to_string()),
            ));
        };
        if readonly.contains(&field.as_str()) {
            if old != new {
                return Err(ValidationError::new(field.as_str(), Constraint::ReadOnly));
            }
            continue;
        }
        object.insert(field.clone(), new.clone());
    }

    serde_json::from_value(value).map_err(invalid)
}

/// Deserialize a new entity from `body`.
///
/// Flattened option structs swallow unknown keys, so the body's keys are
/// checked against the fields the entity serializes back to.
pub(crate) fn create<T>(body: Patch) -> Result<T, ValidationError>
where
    T: Serialize + DeserializeOwned,
{
    let entity: T = serde_json::from_value(Value::Object(body.clone())).map_err(invalid)?;
    let value = serde_json::to_value(&entity).map_err(invalid)?;
    let known = value.as_object();
    if let Some(field) = body
        .keys()
        .find(|field| !known.is_some_and(|object| object.contains_key(field.as_str())))
    {
        return Err(ValidationError::new(
            field.as_str(),
            Constraint::Invalid("unknown field".to_string()),
        ));
    }
    Ok(entity)
}

fn invalid(e: serde_json::Error) -> ValidationError {
    ValidationError::new("body", Constraint::Invalid(e.to_string()))
}
