//! Domain error type shared by the engine and its collaborators.

/// Domain-level error for the planning engine.
///
/// Variants map one-to-one onto caller-facing statuses: `Validation`
/// is a 400, `NotFound` a 404, `Conflict` a 409, everything else a 500.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} '{ident}'")]
    NotFound { entity: &'static str, ident: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Chat client error: {0}")]
    Chat(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Construct a `NotFound` for the given entity and identifier.
    pub fn not_found(entity: &'static str, ident: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            ident: ident.into(),
        }
    }
}
