use crate::case::CaseSpec;
use crate::error::FixtureError;
use rustc_hash::FxHashSet;

/// Ordered collection of cases for one template type. Run order is
/// registration order.
pub struct Registry<T> {
    cases: Vec<Box<dyn CaseSpec<T>>>,
    names: FxHashSet<String>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            cases: Vec::new(),
            names: FxHashSet::default(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, case: impl CaseSpec<T> + 'static) -> Result<(), FixtureError> {
        if !self.names.insert(case.name().to_string()) {
            return Err(FixtureError::DuplicateName {
                name: case.name().to_string(),
            });
        }
        self.cases.push(Box::new(case));
        Ok(())
    }

    /// Builder form of [`Registry::register`].
    pub fn with(mut self, case: impl CaseSpec<T> + 'static) -> Result<Self, FixtureError> {
        self.register(case)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn CaseSpec<T>> {
        self.iter().find(|case| case.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn CaseSpec<T>> + '_ {
        self.cases.iter().map(|case| case.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|case| case.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::TestCase;

    fn text(&(s,): &(&'static str,)) -> String {
        s.to_string()
    }

    #[test]
    fn test_registration_order_is_kept() {
        let registry = Registry::new()
            .with(TestCase::new("b", text).expect(("x",), "x"))
            .and_then(|r| r.with(TestCase::new("a", text).expect(("y",), "y")))
            .unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(registry.get("a").map(|c| c.steps()), Some(1));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = Registry::new();
        registry.register(TestCase::new("a", text)).unwrap();
        assert_eq!(
            registry.register(TestCase::new("a", text)),
            Err(FixtureError::DuplicateName {
                name: "a".to_string()
            })
        );
        assert_eq!(registry.len(), 1);
    }
}
