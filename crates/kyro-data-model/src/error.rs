use thiserror::Error;

/// Error for the reflection system
#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum ReflectionError {
    #[error("Type '{0}' is already registered")]
    DuplicateRegistration(&'static str),

    #[error("Type '{0}' not found in registry")]
    TypeNotFound(String),

    #[error("Type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Discriminator mismatch: expected '{expected}', found '{found}'")]
    DiscriminatorMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("Missing 'CLASS_TYPE' discriminator")]
    MissingDiscriminator,

    #[error("Member '{0}' not found on type '{1}'")]
    MemberNotFound(String, &'static str),

    #[error("Type '{0}' has no constructor")]
    MissingConstructor(&'static str),

    #[error("No serializer registered for type '{0}'")]
    MissingSerializer(&'static str),

    #[error("No deserializer registered for type '{0}'")]
    MissingDeserializer(&'static str),

    #[error("Resource type '{0}' has no resolver")]
    MissingResolver(&'static str),

    #[error("Resource '{0}' could not be resolved")]
    UnresolvedResource(String),

    #[error("Expected {expected} value for type '{type_name}'")]
    UnexpectedValue {
        expected: &'static str,
        type_name: &'static str,
    },

    #[error("Accessor invoked with wrong owner type, expected '{0}'")]
    InvalidOwner(&'static str),

    #[error("Serialization error: {0}")]
    ErrorSerde(#[from] serde_json::Error),
}
