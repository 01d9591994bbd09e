//! Error types for the host-interop bridge.
//!
//! Every failure a script can observe is a [`BridgeError`] and propagates as a
//! `Result` to the calling script frame. Failures raised by the host
//! introspector while discovering members are [`IntrospectionError`]s; the
//! member registry recovers from some of them (access denied) and wraps the
//! rest.

use thiserror::Error;

// ============================================================================
// Introspection Errors
// ============================================================================

/// Errors raised by a [`NativeTypeIntrospector`](crate::NativeTypeIntrospector).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectionError {
    /// The host refused to reflect on the type's members.
    #[error("access denied while introspecting '{type_name}'")]
    AccessDenied { type_name: String },

    /// The introspector has no information about the type.
    #[error("unknown native type '{type_name}'")]
    UnknownType { type_name: String },
}

// ============================================================================
// Bridge Errors
// ============================================================================

/// Errors raised by bridge operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// The name does not denote a member of the native type.
    #[error("'{name}' is not a member of '{type_name}'")]
    MemberNotFound { type_name: String, name: String },

    /// No overload accepts the supplied arguments.
    #[error("no overload of '{name}' matches arguments ({args})")]
    NoApplicableOverload { name: String, args: String },

    /// Two or more overloads are equally good for the supplied arguments.
    #[error("call to '{name}' with arguments ({args}) is ambiguous; candidates: {}", candidates.join(", "))]
    AmbiguousOverload {
        name: String,
        args: String,
        candidates: Vec<String>,
    },

    /// A script value cannot be converted to the requested native type.
    #[error("cannot convert {value} to {target}")]
    Conversion { value: String, target: String },

    /// An enum target received a name or ordinal that denotes no constant.
    #[error("{value} is not a constant of enum '{enum_name}'; valid values: {}", valid.join(", "))]
    IllegalEnumValue {
        enum_name: String,
        value: String,
        valid: Vec<String>,
    },

    /// Write to a final field, a read-only property or a method name.
    #[error("'{name}' of '{type_name}' is read-only")]
    ImmutableMemberWrite { type_name: String, name: String },

    /// The host could not provide an invocation handle for a member.
    #[error("member '{name}' of '{type_name}' is not accessible")]
    InaccessibleMember { type_name: String, name: String },

    /// An index write fell outside a fixed-size native container.
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// The native type has no accessible constructor.
    #[error("'{type_name}' cannot be constructed")]
    NotConstructible { type_name: String },

    /// The value cannot be called as a function.
    #[error("{value} is not callable")]
    NotCallable { value: String },

    /// The native call itself failed.
    #[error("native exception in '{member}': {message}")]
    NativeException { member: String, message: String },

    /// Member discovery failed.
    #[error(transparent)]
    Introspection(#[from] IntrospectionError),
}

impl BridgeError {
    /// Create a conversion error.
    pub fn conversion(value: impl Into<String>, target: impl Into<String>) -> Self {
        BridgeError::Conversion {
            value: value.into(),
            target: target.into(),
        }
    }

    /// Create a native exception error.
    pub fn native(member: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::NativeException {
            member: member.into(),
            message: message.into(),
        }
    }

    /// Check if this is a member-not-found error.
    pub fn is_member_not_found(&self) -> bool {
        matches!(self, BridgeError::MemberNotFound { .. })
    }

    /// Check if this is a conversion error of any kind.
    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            BridgeError::Conversion { .. } | BridgeError::IllegalEnumValue { .. }
        )
    }

    /// Check if this is an overload resolution failure.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            BridgeError::NoApplicableOverload { .. } | BridgeError::AmbiguousOverload { .. }
        )
    }
}

/// Result alias used throughout the bridge.
pub type BridgeResult<T> = Result<T, BridgeError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_overload_lists_candidates() {
        let err = BridgeError::AmbiguousOverload {
            name: "f".into(),
            args: "host.Object".into(),
            candidates: vec!["f(demo.A)".into(), "f(demo.B)".into()],
        };
        assert_eq!(
            err.to_string(),
            "call to 'f' with arguments (host.Object) is ambiguous; candidates: f(demo.A), f(demo.B)"
        );
        assert!(err.is_resolution());
    }

    #[test]
    fn illegal_enum_value_lists_valid_set() {
        let err = BridgeError::IllegalEnumValue {
            enum_name: "demo.Color".into(),
            value: "3".into(),
            valid: vec!["RED(0)".into(), "GREEN(1)".into()],
        };
        assert!(err.to_string().ends_with("valid values: RED(0), GREEN(1)"));
        assert!(err.is_conversion());
    }

    #[test]
    fn introspection_error_converts() {
        let err: BridgeError = IntrospectionError::AccessDenied {
            type_name: "demo.Secret".into(),
        }
        .into();
        assert_eq!(err.to_string(), "access denied while introspecting 'demo.Secret'");
    }

    #[test]
    fn helpers() {
        assert!(BridgeError::conversion("300", "byte").is_conversion());
        assert!(
            BridgeError::MemberNotFound {
                type_name: "demo.Point".into(),
                name: "z".into()
            }
            .is_member_not_found()
        );
        assert!(!BridgeError::native("run", "boom").is_conversion());
    }
}
