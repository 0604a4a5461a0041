use std::collections::BTreeMap;

use crate::value::ContextValue;

mod datetime;
mod exception;
mod json;

pub use datetime::DateTimeMapper;
pub use exception::{ExceptionMapper, DEFAULT_EXCEPTION_KEY};
pub use json::JsonMapper;

/// Fields produced by a mapper for a single context entry.
pub type Fields = BTreeMap<String, ContextValue>;

/// Pluggable transformer from one context entry to envelope fields.
///
/// A [`MessageFactory`](crate::factory::MessageFactory) keeps mappers in
/// registration order and uses the first one whose `supports` returns
/// `true`. The chosen mapper's output replaces the original entry
/// entirely; unclaimed entries pass through under their own key.
///
/// Implementations must be pure. A mapper that panics in `map` is a bug
/// in the mapper and the panic is not caught.
pub trait Mapper: Send + Sync {
    /// Whether this mapper handles the given entry.
    fn supports(&self, key: &str, value: &ContextValue) -> bool;

    /// Turn the entry into one or more fields.
    ///
    /// The output may rename the key, split it into several keys, or emit
    /// reserved `@` fields such as `@exception`.
    fn map(&self, key: &str, value: &ContextValue) -> Fields;
}

impl<M: Mapper + ?Sized> Mapper for Box<M> {
    fn supports(&self, key: &str, value: &ContextValue) -> bool {
        (**self).supports(key, value)
    }

    fn map(&self, key: &str, value: &ContextValue) -> Fields {
        (**self).map(key, value)
    }
}
