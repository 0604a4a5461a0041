use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;
use std::panic::Location;

use chrono::{DateTime, FixedOffset, Utc};

/// A single contextual value attached to a log call.
///
/// Mappers decide how each variant becomes envelope fields; values no
/// mapper claims are stringified with their [`Display`](fmt::Display) form.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Exception(ExceptionRecord),
    Json(serde_json::Value),
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Null => Ok(()),
            ContextValue::Bool(v) => write!(f, "{v}"),
            ContextValue::Int(v) => write!(f, "{v}"),
            ContextValue::UInt(v) => write!(f, "{v}"),
            ContextValue::Float(v) => write!(f, "{v}"),
            ContextValue::String(v) => f.write_str(v),
            ContextValue::DateTime(v) => f.write_str(&v.to_rfc3339()),
            ContextValue::Exception(v) => write!(f, "{v}"),
            ContextValue::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for ContextValue {
    fn from(v: bool) -> Self {
        ContextValue::Bool(v)
    }
}

impl From<i32> for ContextValue {
    fn from(v: i32) -> Self {
        ContextValue::Int(v.into())
    }
}

impl From<i64> for ContextValue {
    fn from(v: i64) -> Self {
        ContextValue::Int(v)
    }
}

impl From<u32> for ContextValue {
    fn from(v: u32) -> Self {
        ContextValue::UInt(v.into())
    }
}

impl From<u64> for ContextValue {
    fn from(v: u64) -> Self {
        ContextValue::UInt(v)
    }
}

impl From<f64> for ContextValue {
    fn from(v: f64) -> Self {
        ContextValue::Float(v)
    }
}

impl From<&str> for ContextValue {
    fn from(v: &str) -> Self {
        ContextValue::String(v.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(v: String) -> Self {
        ContextValue::String(v)
    }
}

impl From<DateTime<FixedOffset>> for ContextValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        ContextValue::DateTime(v)
    }
}

impl From<DateTime<Utc>> for ContextValue {
    fn from(v: DateTime<Utc>) -> Self {
        ContextValue::DateTime(v.fixed_offset())
    }
}

impl From<ExceptionRecord> for ContextValue {
    fn from(v: ExceptionRecord) -> Self {
        ContextValue::Exception(v)
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(v: serde_json::Value) -> Self {
        ContextValue::Json(v)
    }
}

impl<T: Into<ContextValue>> From<Option<T>> for ContextValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ContextValue::Null, Into::into)
    }
}

/// Snapshot of an error that can be attached to a log call.
///
/// Rust errors carry no class, code or stack of their own, so the record
/// captures what is available at the point the error is logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRecord {
    pub class: String,
    pub message: String,
    pub code: i64,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub stack_trace: String,
}

impl ExceptionRecord {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        ExceptionRecord {
            class: class.into(),
            message: message.into(),
            code: 0,
            file: None,
            line: None,
            stack_trace: String::new(),
        }
    }

    /// Capture a concrete error value.
    ///
    /// The class is the error's type name, the location is the caller of
    /// this function, and the stack trace lists the `source()` chain
    /// followed by a backtrace when `RUST_BACKTRACE` enables one.
    #[track_caller]
    pub fn capture<E: Error + 'static>(error: &E) -> Self {
        Self::capture_with_class(std::any::type_name::<E>(), error)
    }

    /// Capture an error known only as a trait object.
    #[track_caller]
    pub fn capture_dyn(error: &(dyn Error + 'static)) -> Self {
        Self::capture_with_class("dyn std::error::Error", error)
    }

    #[track_caller]
    fn capture_with_class(class: &str, error: &(dyn Error + 'static)) -> Self {
        let location = Location::caller();

        let mut trace = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            trace.push(format!("#{} caused by: {}", trace.len(), cause));
            source = cause.source();
        }

        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            trace.push(backtrace.to_string());
        }

        ExceptionRecord {
            class: class.to_string(),
            message: error.to_string(),
            code: 0,
            file: Some(location.file().to_string()),
            line: Some(location.line()),
            stack_trace: trace.join("\n"),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = stack_trace.into();
        self
    }
}

impl fmt::Display for ExceptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)?;
        if let (Some(file), Some(line)) = (&self.file, self.line) {
            write!(f, " in {file}:{line}")?;
        }
        if !self.stack_trace.is_empty() {
            write!(f, "\nStack trace:\n{}", self.stack_trace)?;
        }
        Ok(())
    }
}

/// Contextual key/value pairs of one log call, in insertion order.
///
/// Inserting a key that is already present replaces its value in place,
/// keeping the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Vec<(String, ContextValue)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`Context::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<ContextValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}
