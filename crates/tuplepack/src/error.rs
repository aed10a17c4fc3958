// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Top-level error type.
//!
//! Component errors (descriptor, registry, context, codec, compression,
//! value conversion) keep their own enums; this type wraps them and adds
//! the engine's encode/decode failures. None of these are retried or
//! recovered internally.

use crate::codec::CodecError;
use crate::compress::CompressError;
use crate::context::ContextError;
use crate::descriptor::DescriptorError;
use crate::registry::RegistryError;
use crate::value::ValueError;

/// Errors returned by encode, decode and declaration loading.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Encode Errors
    // ========================================================================
    /// The record's owning type has no registered descriptor.
    SchemaNotRegistered { owning_type: String },
    /// The schema (or a nested schema) has no index in the active context.
    SchemaNotInContext { schema: String, context: String },
    /// A record carries a populated field its descriptor does not define.
    UnknownField { schema: String, field: String },

    // ========================================================================
    // Decode Errors
    // ========================================================================
    /// Payload schema index is not declared in the active context.
    UnknownIndex { index: i64, context: String },
    /// Context resolved the name but this process has no such descriptor.
    SchemaNotFound { schema: String, context: String },
    /// Payload decoded but is not an `(index, tuple)` pair.
    MalformedPayload(String),
    /// Payload decoded to a different type than requested.
    TypeMismatch { expected: String, found: String },

    // ========================================================================
    // Component Errors
    // ========================================================================
    Descriptor(DescriptorError),
    Registry(RegistryError),
    Context(ContextError),
    Codec(CodecError),
    Compress(CompressError),
    Value(ValueError),

    // ========================================================================
    // Declaration I/O
    // ========================================================================
    Io(std::io::Error),
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
}

impl Error {
    /// True when encoder and decoder disagree on which schemas exist.
    ///
    /// These errors usually mean two processes run different schema
    /// versions or context tables, not that the payload is corrupt.
    pub fn is_version_skew(&self) -> bool {
        matches!(
            self,
            Error::SchemaNotFound { .. } | Error::UnknownIndex { .. }
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Encode
            Error::SchemaNotRegistered { owning_type } => {
                write!(f, "no schema registered for type {}", owning_type)
            }
            Error::SchemaNotInContext { schema, context } => {
                write!(f, "schema {} is not in context {}", schema, context)
            }
            Error::UnknownField { schema, field } => {
                write!(f, "schema {} has no field '{}'", schema, field)
            }
            // Decode
            Error::UnknownIndex { index, context } => {
                write!(f, "index {} is not declared in context {}", index, context)
            }
            Error::SchemaNotFound { schema, context } => write!(
                f,
                "schema {} (context {}) is not registered in this process",
                schema, context
            ),
            Error::MalformedPayload(msg) => write!(f, "malformed payload: {}", msg),
            Error::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            // Components
            Error::Descriptor(e) => write!(f, "descriptor: {}", e),
            Error::Registry(e) => write!(f, "registry: {}", e),
            Error::Context(e) => write!(f, "context: {}", e),
            Error::Codec(e) => write!(f, "codec: {}", e),
            Error::Compress(e) => write!(f, "compression: {}", e),
            Error::Value(e) => write!(f, "value: {}", e),
            // Declaration I/O
            Error::Io(e) => write!(f, "I/O error: {}", e),
            #[cfg(feature = "serde")]
            Error::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Descriptor(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Context(e) => Some(e),
            Error::Codec(e) => Some(e),
            Error::Compress(e) => Some(e),
            Error::Value(e) => Some(e),
            Error::Io(e) => Some(e),
            #[cfg(feature = "serde")]
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DescriptorError> for Error {
    fn from(e: DescriptorError) -> Self {
        Error::Descriptor(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

/// Lookup failures become the engine variants; construction failures stay
/// wrapped.
impl From<ContextError> for Error {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::NotInContext { context, schema } => {
                Error::SchemaNotInContext { schema, context }
            }
            ContextError::UnknownIndex { context, index } => Error::UnknownIndex { index, context },
            other => Error::Context(other),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e)
    }
}

impl From<CompressError> for Error {
    fn from(e: CompressError) -> Self {
        Error::Compress(e)
    }
}

impl From<ValueError> for Error {
    fn from(e: ValueError) -> Self {
        Error::Value(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

/// Convenient alias for results using the crate [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_lookup_errors_map_to_engine_variants() {
        let err: Error = ContextError::NotInContext {
            context: "shop".into(),
            schema: "Refund".into(),
        }
        .into();
        assert!(matches!(err, Error::SchemaNotInContext { ref schema, .. } if schema == "Refund"));

        let err: Error = ContextError::UnknownIndex {
            context: "shop".into(),
            index: 9,
        }
        .into();
        assert!(matches!(err, Error::UnknownIndex { index: 9, .. }));
        assert!(err.is_version_skew());

        let err: Error = ContextError::InvalidIndex {
            context: "shop".into(),
            index: 0,
        }
        .into();
        assert!(matches!(err, Error::Context(_)));
        assert!(!err.is_version_skew());
    }

    #[test]
    fn test_display_and_source() {
        use std::error::Error as _;

        let err = Error::SchemaNotFound {
            schema: "User".into(),
            context: "accounts".into(),
        };
        assert_eq!(
            err.to_string(),
            "schema User (context accounts) is not registered in this process"
        );
        assert!(err.source().is_none());

        let err = Error::from(CodecError::TrailingBytes { count: 2 });
        assert!(err.source().is_some());
    }
}
