//! Evaluation errors.
//!
//! Every evaluator entry point returns [`EvalResult`]. Errors are built
//! through the `#[cold]` factory functions below so the kind, the rendered
//! message and the offending name/type/index always agree.

use std::fmt;

use crate::Value;

/// Result of evaluation.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Structured error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// Identifier is neither a variable nor a function.
    NameNotFound { name: String },
    /// Value not convertible to a required type, or a stochasticity
    /// constraint was violated.
    TypeMismatch { expected: String, found: String },
    /// A required argument has neither a supplied nor a default value.
    MissingArgument { function: String, label: String },
    /// No overload of the function accepted the supplied arguments.
    NoMatchingOverload { function: String, arguments: String },
    /// A supplied argument that no rule consumed.
    UnexpectedArgument { function: String, argument: String },
    /// Index not an integer, below 1, or past the end.
    InvalidIndex { target: String, index: String },
    /// Member or method absent on the receiver.
    NoSuchMember { member: String, type_name: String },
    /// The left-hand side cannot be assigned in this way.
    IllegalAssignmentTarget { target: String },
    /// The right-hand side depends on the variable being assigned.
    CyclicDependency { name: String },
    /// Call syntax applied to a value that is not a function.
    NotCallable { name: String },
    IntegerOverflow { operation: String },
    RecursionLimitExceeded { limit: usize },
    Custom { message: String },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameNotFound { name } => write!(f, "no variable or function named '{name}'"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::MissingArgument { function, label } => {
                write!(f, "missing argument '{label}' in call to {function}")
            }
            Self::NoMatchingOverload {
                function,
                arguments,
            } => write!(f, "no overload of {function} accepts ({arguments})"),
            Self::UnexpectedArgument { function, argument } => {
                write!(f, "unexpected argument {argument} in call to {function}")
            }
            Self::InvalidIndex { target, index } => {
                write!(f, "invalid index {index} for {target}")
            }
            Self::NoSuchMember { member, type_name } => {
                write!(f, "{type_name} has no member or method '{member}'")
            }
            Self::IllegalAssignmentTarget { target } => {
                write!(f, "cannot assign to {target}")
            }
            Self::CyclicDependency { name } => {
                write!(f, "'{name}' would depend on itself")
            }
            Self::NotCallable { name } => write!(f, "'{name}' is not a function"),
            Self::IntegerOverflow { operation } => write!(f, "integer overflow in {operation}"),
            Self::RecursionLimitExceeded { limit } => {
                write!(f, "maximum call depth of {limit} exceeded")
            }
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Secondary context attached to an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalNote {
    pub message: String,
}

/// Chain of user-function calls active when an error was raised,
/// innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<String>,
}

impl EvalBacktrace {
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "  {i}: {frame}")?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` unless overridden.
    pub message: String,
    /// Additional context notes, outermost last.
    pub notes: Vec<EvalNote>,
    /// User functions the error unwound through.
    pub backtrace: EvalBacktrace,
}

impl EvalError {
    /// Create an error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
            notes: Vec::new(),
            backtrace: EvalBacktrace::default(),
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            notes: Vec::new(),
            backtrace: EvalBacktrace::default(),
        }
    }

    /// Replace the rendered message, keeping the kind.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach a context note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(EvalNote {
            message: note.into(),
        });
        self
    }

    /// Record that the error unwound through a call to `function`.
    #[must_use]
    pub fn with_frame(mut self, function: impl Into<String>) -> Self {
        self.backtrace.frames.push(function.into());
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {}", note.message)?;
        }
        if !self.backtrace.is_empty() {
            write!(f, "\ncall stack:\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

impl PartialEq for EvalError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

// Lookup

#[cold]
pub fn name_not_found(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NameNotFound {
        name: name.to_string(),
    })
}

/// An element of a vector variable that was never assigned.
#[cold]
pub fn unassigned_element(vector: &str, element: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NameNotFound {
        name: element.to_string(),
    })
    .with_message(format!(
        "cannot build vector variable '{vector}' because element '{element}' is empty"
    ))
}

#[cold]
pub fn not_callable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        name: name.to_string(),
    })
}

#[cold]
pub fn no_such_member(member: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoSuchMember {
        member: member.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn unknown_type(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NameNotFound {
        name: name.to_string(),
    })
    .with_message(format!("unknown type '{name}'"))
}

// Types

#[cold]
pub fn type_mismatch(expected: &str, found: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    })
}

/// A value of type `found` cannot be stored in `variable`, which requires `required`.
#[cold]
pub fn variable_type_mismatch(variable: &str, found: &str, required: &str) -> EvalError {
    type_mismatch(required, found).with_message(format!(
        "cannot assign a value of type {found} to variable '{variable}' because it requires type {required}"
    ))
}

/// A conversion that was expected to succeed rejected the data.
#[cold]
pub fn conversion_failed(value: &str, from: &str, to: &str) -> EvalError {
    type_mismatch(to, from).with_message(format!("cannot convert {value} of type {from} to {to}"))
}

#[cold]
pub fn argument_type_mismatch(function: &str, label: &str, expected: &str, found: &str) -> EvalError {
    type_mismatch(expected, found).with_message(format!(
        "argument '{label}' of {function} expects type {expected}, found {found}"
    ))
}

/// Argument violates a rule's stochasticity constraint.
#[cold]
pub fn stochasticity_mismatch(function: &str, label: &str, required: &str, found: &str) -> EvalError {
    type_mismatch(required, found).with_message(format!(
        "argument '{label}' of {function} must be a {required} variable, found a {found} one"
    ))
}

// Calls

#[cold]
pub fn missing_argument(function: &str, label: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingArgument {
        function: function.to_string(),
        label: label.to_string(),
    })
}

#[cold]
pub fn no_matching_overload(function: &str, arguments: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoMatchingOverload {
        function: function.to_string(),
        arguments: arguments.to_string(),
    })
}

#[cold]
pub fn unexpected_argument(function: &str, argument: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnexpectedArgument {
        function: function.to_string(),
        argument: argument.to_string(),
    })
}

#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::RecursionLimitExceeded { limit })
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

/// `from:to` asking for more elements than a range may hold.
#[cold]
pub fn range_too_long(from: i64, to: i64, max: u64) -> EvalError {
    custom(format!("range {from}:{to} is longer than {max} elements"))
}

// Indexing

#[cold]
pub fn invalid_index(target: &str, index: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidIndex {
        target: target.to_string(),
        index: index.to_string(),
    })
}

#[cold]
pub fn index_below_minimum(target: &str, index: i64) -> EvalError {
    invalid_index(target, &index.to_string())
        .with_message(format!("index {index} for {target} is smaller than 1"))
}

#[cold]
pub fn index_out_of_range(target: &str, index: usize, len: usize) -> EvalError {
    invalid_index(target, &index.to_string()).with_message(format!(
        "index {index} for {target} is out of range (size {len})"
    ))
}

#[cold]
pub fn non_integer_index(target: &str, type_name: &str) -> EvalError {
    invalid_index(target, type_name).with_message(format!(
        "index for {target} must be an integer, found {type_name}"
    ))
}

#[cold]
pub fn not_indexable(target: &str, type_name: &str) -> EvalError {
    invalid_index(target, type_name)
        .with_message(format!("{target} of type {type_name} cannot be indexed"))
}

// Assignment

#[cold]
pub fn illegal_assignment_target(target: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IllegalAssignmentTarget {
        target: target.to_string(),
    })
}

/// `x <-& y` where `y` already (transitively) refers back to `x`.
#[cold]
pub fn alias_cycle(target: &str, referenced: &str) -> EvalError {
    illegal_assignment_target(target).with_message(format!(
        "cannot make '{target}' a reference to '{referenced}': the references would form a cycle"
    ))
}

/// `f <- 1` where `f` names a registered function.
#[cold]
pub fn masks_function(name: &str) -> EvalError {
    illegal_assignment_target(name).with_message(format!(
        "'{name}' is a function and cannot be replaced by a non-function value"
    ))
}

/// Writing the value of a deterministic node in place.
#[cold]
pub fn not_settable(name: &str) -> EvalError {
    illegal_assignment_target(name).with_message(format!(
        "cannot set the value of '{name}': it is computed from other variables"
    ))
}

#[cold]
pub fn cyclic_dependency(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CyclicDependency {
        name: name.to_string(),
    })
}

#[cold]
pub fn custom(message: impl Into<String>) -> EvalError {
    EvalError::new(message)
}
