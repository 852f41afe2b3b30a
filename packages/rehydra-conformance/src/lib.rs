//! The hydration conformance corpus and the shim that runs it against
//! `rehydra-template`.
//!
//! ```no_run
//! use rehydra_conformance::{ReferenceSut, basic_cases};
//! use rehydra_harness::Runner;
//!
//! let registry = basic_cases().unwrap();
//! let reports = Runner::default().run(&registry, &mut ReferenceSut::new());
//! println!("{reports}");
//! ```

pub mod adapter;
pub mod basic;

pub use adapter::ReferenceSut;
pub use basic::basic_cases;
