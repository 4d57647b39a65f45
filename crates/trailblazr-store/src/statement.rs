//! Parameter-bound statements.

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Float(f64),
}

/// Statement text plus its bound parameters, in placeholder order.
///
/// The text is `&'static str`: it is fixed at compile time and never built
/// from runtime input. Construct statements through [`crate::schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: &'static str,
    params: Vec<Param>,
}

impl Statement {
    pub(crate) fn new(text: &'static str, params: Vec<Param>) -> Self {
        Self { text, params }
    }

    /// The statement text with `$1..$n` placeholders.
    pub fn text(&self) -> &'static str {
        self.text
    }

    /// Bound parameters; `params()[0]` binds `$1`.
    pub fn params(&self) -> &[Param] {
        &self.params
    }
}
