use crate::check::CheckFailure;
use rehydra_dom::{Document, NodeId};

/// Custom assertion run against the live container after a step.
pub type CheckFn = fn(&mut Document, NodeId) -> Result<(), CheckFailure>;

/// An argument tuple passed to a case's `render`.
pub trait Args {
    fn arity(&self) -> usize;
}

macro_rules! impl_args_for_tuple {
    ($n:expr; $($t:ident),*) => {
        impl<$($t),*> Args for ($($t,)*) {
            fn arity(&self) -> usize {
                $n
            }
        }
    };
}

impl_args_for_tuple!(0;);
impl_args_for_tuple!(1; A);
impl_args_for_tuple!(2; A, B);
impl_args_for_tuple!(3; A, B, C);
impl_args_for_tuple!(4; A, B, C, D);
impl_args_for_tuple!(5; A, B, C, D, E);
impl_args_for_tuple!(6; A, B, C, D, E, F);

/// Dynamically sized argument lists; the arity is the length.
impl<V> Args for Vec<V> {
    fn arity(&self) -> usize {
        self.len()
    }
}

pub struct Expectation<A> {
    pub args: A,
    pub html: &'static str,
    pub check: Option<CheckFn>,
}

/// One conformance case. `expectations[0]` drives the server render and
/// hydration; every later expectation is an update of the same live
/// subtree.
pub struct TestCase<A, T> {
    pub name: String,
    pub render: fn(&A) -> T,
    pub expectations: Vec<Expectation<A>>,
    pub stable_selectors: Vec<&'static str>,
    pub skip: bool,
}

impl<A, T> TestCase<A, T> {
    pub fn new(name: impl Into<String>, render: fn(&A) -> T) -> Self {
        Self {
            name: name.into(),
            render,
            expectations: Vec::new(),
            stable_selectors: Vec::new(),
            skip: false,
        }
    }

    pub fn expect(mut self, args: A, html: &'static str) -> Self {
        self.expectations.push(Expectation {
            args,
            html,
            check: None,
        });
        self
    }

    pub fn expect_checked(mut self, args: A, html: &'static str, check: CheckFn) -> Self {
        self.expectations.push(Expectation {
            args,
            html,
            check: Some(check),
        });
        self
    }

    pub fn stable(mut self, selectors: &[&'static str]) -> Self {
        self.stable_selectors.extend_from_slice(selectors);
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }
}

/// Object-safe view of a [`TestCase`], erasing its argument type so cases
/// of different arities share one registry.
pub trait CaseSpec<T> {
    fn name(&self) -> &str;
    fn is_skipped(&self) -> bool;
    fn stable_selectors(&self) -> &[&'static str];
    fn steps(&self) -> usize;
    fn arity(&self, step: usize) -> usize;
    fn render(&self, step: usize) -> T;
    fn expected_html(&self, step: usize) -> &'static str;
    fn check(&self, step: usize) -> Option<CheckFn>;
}

impl<A: Args, T> CaseSpec<T> for TestCase<A, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_skipped(&self) -> bool {
        self.skip
    }

    fn stable_selectors(&self) -> &[&'static str] {
        &self.stable_selectors
    }

    fn steps(&self) -> usize {
        self.expectations.len()
    }

    fn arity(&self, step: usize) -> usize {
        self.expectations[step].args.arity()
    }

    fn render(&self, step: usize) -> T {
        (self.render)(&self.expectations[step].args)
    }

    fn expected_html(&self, step: usize) -> &'static str {
        self.expectations[step].html
    }

    fn check(&self, step: usize) -> Option<CheckFn> {
        self.expectations[step].check
    }
}
