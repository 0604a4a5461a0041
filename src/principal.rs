/// Source of the acting user attributed to a message as `@principal`.
///
/// Implement this to pull the identity from a session or request context.
/// Closures returning `Option<String>` implement it directly.
pub trait PrincipalProvider: Send + Sync {
    fn principal(&self) -> Option<String>;
}

/// Provider returning a fixed principal captured at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticPrincipal(Option<String>);

impl StaticPrincipal {
    pub fn new(principal: Option<String>) -> Self {
        StaticPrincipal(principal)
    }
}

impl PrincipalProvider for StaticPrincipal {
    fn principal(&self) -> Option<String> {
        self.0.clone()
    }
}

impl<F> PrincipalProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn principal(&self) -> Option<String> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_and_closure_providers() {
        assert_eq!(StaticPrincipal::default().principal(), None);
        assert_eq!(StaticPrincipal::new(Some("alice".into())).principal().as_deref(), Some("alice"));

        let session = || Some("bob".to_string());
        assert_eq!(session.principal().as_deref(), Some("bob"));
    }
}
