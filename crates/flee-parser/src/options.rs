//! Tokenizer settings.

/// Culture-dependent parts of the expression syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Separates the integer and fractional parts of real literals.
    pub decimal_separator: char,
    /// Separates function arguments and `in` list items.
    pub argument_separator: char,
    /// Reject real literals such as `.5`.
    pub require_digits_before_decimal_point: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            argument_separator: ',',
            require_digits_before_decimal_point: false,
        }
    }
}

impl ParserOptions {
    /// Set the decimal separator.
    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    /// Set the argument separator.
    pub fn with_argument_separator(mut self, separator: char) -> Self {
        self.argument_separator = separator;
        self
    }

    /// Require digits before the decimal separator.
    pub fn with_require_digits_before_decimal_point(mut self, require: bool) -> Self {
        self.require_digits_before_decimal_point = require;
        self
    }
}
