pub mod client;
pub mod compile;
pub mod error;
pub mod ssr;
pub mod value;

pub use client::{Root, hydrate, render};
pub use error::TemplateError;
pub use ssr::{Renderer, SsrStream, render_to_string};
pub use value::{Listener, Template, Value};

/// Comment data opening a child binding in rendered markup.
pub const PART_START: &str = "part";
/// Comment data closing a child binding in rendered markup.
pub const PART_END: &str = "/part";

/// Builds a [`Template`] from its static pieces and the values bound
/// between them:
///
/// ```
/// use rehydra_template::html;
/// let t = html!(["<div class=", "></div>"], "big");
/// assert_eq!(t.values().len(), 1);
/// ```
#[macro_export]
macro_rules! html {
    ([$($s:literal),+ $(,)?] $(, $v:expr)* $(,)?) => {
        $crate::Template::new(&[$($s),+], vec![$($crate::Value::from($v)),*])
    };
}
