//! Error taxonomy for the authorization engine
//!
//! Three categories cover every failure an enforcer can surface:
//! - [`ConfigurationError`] - malformed model or policy definitions, detected
//!   at load time and never retried automatically
//! - [`EvaluationError`] - faults inside matcher evaluation at decision time
//! - [`EnforcerError`] - the boundary type returned by enforcer operations,
//!   wrapping the two above plus adapter (storage) failures
//!
//! Diagnostic logging failures belong to none of these categories: logger
//! implementations absorb their own sink errors and never propagate them.

use thiserror::Error;

/// Errors found while parsing or validating model and policy definitions
///
/// These are load-time failures. An operation that returns a
/// `ConfigurationError` has rejected its input; nothing was partially
/// applied and nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A model or policy source file could not be read
    #[error("Cannot read `{path}`: {reason}")]
    Read {
        /// The path that failed to load
        path: String,
        /// The underlying I/O failure, rendered as text
        reason: String,
    },

    /// A model line is not a section header, comment, or `key = value` pair
    #[error("Model line {line}: expected `key = value`, got `{text}`")]
    MalformedLine { line: usize, text: String },

    /// A `key = value` line appeared before any `[section]` header
    #[error("Model line {line}: `{text}` appears outside of any section")]
    OutsideSection { line: usize, text: String },

    /// A section header that is not part of the model grammar
    #[error("Model line {line}: unknown section `[{name}]`")]
    UnknownSection { line: usize, name: String },

    /// A key that does not belong in its section (e.g. `p` under `[matchers]`)
    #[error("Model line {line}: key `{key}` is not valid in `[{section}]`")]
    InvalidKey {
        line: usize,
        section: String,
        key: String,
    },

    /// The same key defined twice within one section
    #[error("Model line {line}: duplicate key `{key}` in `[{section}]`")]
    DuplicateKey {
        line: usize,
        section: String,
        key: String,
    },

    /// A required section is absent from the model
    #[error("Missing required section `[{name}]`")]
    MissingSection { name: String },

    /// A required key is absent from an otherwise present section
    #[error("Section `[{section}]` must define `{key}`")]
    MissingKey { section: String, key: String },

    /// A definition token that is not a valid identifier
    #[error("Definition `{key}` has invalid token `{token}`")]
    InvalidToken { key: String, token: String },

    /// A role definition whose value is not `_, _` or `_, _, _`
    #[error("Role definition `{key}` must be `_, _` or `_, _, _`, got `{value}`")]
    InvalidRoleDefinition { key: String, value: String },

    /// A policy effect rule outside the supported catalogue
    #[error("Unsupported policy effect rule `{rule}`")]
    UnsupportedEffect { rule: String },

    /// A matcher expression that failed to parse
    #[error("Matcher `{key}`: {reason}")]
    InvalidMatcher { key: String, reason: String },

    /// A policy row whose value count does not match its definition
    #[error("Policy row for `{key}` expects {expected} values, got {actual}")]
    RuleArity {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// A policy row referencing a type the model does not define
    #[error("No policy definition for type `{key}`")]
    UnknownPolicyType { key: String },

    /// No model source was configured before building an enforcer
    #[error("No model source configured")]
    MissingModel,
}

/// Faults raised while evaluating a matcher expression against a request
///
/// Evaluation errors indicate an internal inconsistency between the model,
/// the policy, and the request. They surface through
/// [`EnforcerError::Evaluation`] and are never converted to a deny decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The request argument count does not match the request definition
    #[error("Request expects {expected} arguments, got {actual}")]
    RequestArity { expected: usize, actual: usize },

    /// The matcher referenced an attribute with no binding
    #[error("Unknown attribute `{name}` in matcher")]
    UnknownAttribute { name: String },

    /// The matcher called a function that is not registered
    #[error("Unknown function `{name}` in matcher")]
    UnknownFunction { name: String },

    /// A function call with the wrong number of arguments
    #[error("Function `{name}` expects {expected} arguments, got {actual}")]
    FunctionArity {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A function failed while matching (e.g. an invalid pattern argument)
    #[error("Function `{name}`: {reason}")]
    Function { name: String, reason: String },

    /// The matcher produced a string where a boolean was required
    #[error("Matcher must evaluate to a boolean, got `{value}`")]
    NotBoolean { value: String },
}

/// Boundary error for enforcer operations
///
/// Every fallible enforcer operation returns this type, so callers can
/// distinguish bad definitions from storage failures from internal faults
/// with a single `match`.
#[derive(Debug, Error)]
pub enum EnforcerError {
    /// Malformed model or policy definitions
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The policy storage adapter failed to load, save, or update rules
    #[error("Adapter error: {0}")]
    Adapter(#[source] anyhow::Error),

    /// An internal fault during matcher evaluation
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
}
