//! The type registry.
//!
//! Maps a type tag to the function that casts raw values into that type.
//! Three families of tags are known:
//!
//! - built-in casts (`string`, `int`, `color`, ...), fixed,
//! - platform entity kinds (`user`, `role`, `textChannel`, ...), delegated
//!   to the injected [`Resolver`],
//! - custom casts registered at runtime.
//!
//! [`TypeRegistry`] is a cheap, cloneable handle; clones share the same
//! table. [`TypeRegistry::shared`] returns the process-wide table that
//! parsers use unless told otherwise.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::{debug, trace};

use ember_core::{BoxError, EntityKind, Payload, Resolver};

use super::cast;
use super::value::ArgValue;
use crate::error::RegistryError;

/// A custom cast. Returning `Err` is a thrown value.
pub type CastFn = Arc<dyn Fn(&ArgValue) -> Result<ArgValue, BoxError> + Send + Sync>;

static SHARED: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::new);

/// A table of custom casts layered over the built-in ones.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    custom: Arc<RwLock<HashMap<String, CastFn>>>,
}

impl TypeRegistry {
    /// Creates an empty, independent registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the process-wide registry.
    pub fn shared() -> Self {
        SHARED.clone()
    }

    /// Returns `true` if `tag` names a built-in cast or an entity kind.
    pub fn is_builtin(tag: &str) -> bool {
        cast::builtin(tag).is_some() || tag.parse::<EntityKind>().is_ok()
    }

    /// Returns `true` if `tag` can be cast by this registry.
    pub fn contains(&self, tag: &str) -> bool {
        Self::is_builtin(tag) || self.custom.read().contains_key(tag)
    }

    /// Registers a custom cast, replacing any previous custom cast with the
    /// same tag.
    pub fn register<F>(&self, tag: impl Into<String>, cast: F) -> Result<(), RegistryError>
    where
        F: Fn(&ArgValue) -> Result<ArgValue, BoxError> + Send + Sync + 'static,
    {
        let tag = tag.into();
        if Self::is_builtin(&tag) {
            return Err(RegistryError::BuiltinType(tag));
        }
        debug!(tag = %tag, "registering custom argument type");
        self.custom.write().insert(tag, Arc::new(cast));
        Ok(())
    }

    /// Removes a custom cast. Returns whether one was registered.
    pub fn unregister(&self, tag: &str) -> Result<bool, RegistryError> {
        if Self::is_builtin(tag) {
            return Err(RegistryError::BuiltinType(tag.to_string()));
        }
        Ok(self.custom.write().remove(tag).is_some())
    }

    /// Casts `raw` into the type named `tag`.
    ///
    /// Unknown tags and entity kinds that cannot be resolved (no resolver,
    /// or the payload lacks the guild/channel context the kind needs) yield
    /// [`ArgValue::Null`]. Errors come only from custom casts and the
    /// resolver.
    pub async fn cast(
        &self,
        tag: &str,
        raw: &ArgValue,
        payload: &dyn Payload,
        resolver: Option<&dyn Resolver>,
    ) -> Result<ArgValue, BoxError> {
        if let Some(value) = cast::cast_builtin(tag, raw) {
            return Ok(value);
        }
        if let Ok(kind) = tag.parse::<EntityKind>() {
            return resolve_entity(kind, raw, payload, resolver).await;
        }
        let custom = self.custom.read().get(tag).cloned();
        match custom {
            Some(cast) => cast(raw),
            None => {
                trace!(tag, "unknown argument type");
                Ok(ArgValue::Null)
            }
        }
    }
}

async fn resolve_entity(
    kind: EntityKind,
    raw: &ArgValue,
    payload: &dyn Payload,
    resolver: Option<&dyn Resolver>,
) -> Result<ArgValue, BoxError> {
    if let ArgValue::Entity(value) = raw {
        return Ok(ArgValue::Entity(value.clone()));
    }
    let Some(resolver) = resolver else {
        return Ok(ArgValue::Null);
    };
    if !kind.is_satisfied_by(payload) {
        trace!(%kind, "payload lacks the context to resolve entity");
        return Ok(ArgValue::Null);
    }
    let Some(token) = raw.as_text() else {
        return Ok(ArgValue::Null);
    };
    let resolved = resolver.resolve(kind, &token, payload).await?;
    Ok(resolved.map_or(ArgValue::Null, ArgValue::Entity))
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let custom = self.custom.read();
        let mut tags: Vec<_> = custom.keys().collect();
        tags.sort();
        f.debug_struct("TypeRegistry").field("custom", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ember_core::{TextPayload, Thrown};
    use serde_json::{Value, json};

    struct Directory;

    #[async_trait]
    impl Resolver for Directory {
        async fn resolve(
            &self,
            kind: EntityKind,
            token: &str,
            _payload: &dyn Payload,
        ) -> Result<Option<Value>, BoxError> {
            Ok((token == "42").then(|| json!({ "kind": kind.tag(), "id": token })))
        }
    }

    #[tokio::test]
    async fn test_custom_type_lifecycle() {
        let types = TypeRegistry::new();
        let payload = TextPayload::new("");
        types
            .register("upper", |raw| {
                Ok(raw
                    .as_text()
                    .map_or(ArgValue::Null, |t| ArgValue::Str(t.to_uppercase())))
            })
            .unwrap();

        let value = types.cast("upper", &"abc".into(), &payload, None).await.unwrap();
        assert_eq!(value, ArgValue::from("ABC"));

        assert!(types.unregister("upper").unwrap());
        assert!(!types.unregister("upper").unwrap());
        let value = types.cast("upper", &"abc".into(), &payload, None).await.unwrap();
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn test_builtins_are_fixed() {
        let types = TypeRegistry::new();
        assert!(matches!(
            types.register("color", |_| Ok(ArgValue::Null)),
            Err(RegistryError::BuiltinType(_))
        ));
        assert!(types.unregister("member").is_err());
        assert!(types.contains("textChannel"));
    }

    #[tokio::test]
    async fn test_custom_cast_error_propagates() {
        let types = TypeRegistry::new();
        types
            .register("strict", |_| Err(Thrown::boxed("bad token")))
            .unwrap();
        let err = types
            .cast("strict", &"x".into(), &TextPayload::new(""), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bad token");
    }

    #[tokio::test]
    async fn test_entity_resolution() {
        let types = TypeRegistry::new();
        let in_guild = TextPayload::new("").guild("1").channel("2");
        let in_dm = TextPayload::new("").channel("2");

        let role = types
            .cast("role", &"42".into(), &in_guild, Some(&Directory))
            .await
            .unwrap();
        assert_eq!(role.as_entity(), Some(&json!({ "kind": "role", "id": "42" })));

        // roles need a guild
        let role = types
            .cast("role", &"42".into(), &in_dm, Some(&Directory))
            .await
            .unwrap();
        assert!(role.is_null());

        let user = types.cast("user", &"42".into(), &in_dm, None).await.unwrap();
        assert!(user.is_null());

        let user = types
            .cast("user", &"7".into(), &in_dm, Some(&Directory))
            .await
            .unwrap();
        assert!(user.is_null());
    }
}
