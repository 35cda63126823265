//! Typed parameter resolution.

use super::ExecuteFunctions;
use crate::errors::ParameterError;

/// Resolves typed parameters for one item.
pub struct ParameterResolver<'a> {
    ctx: &'a dyn ExecuteFunctions,
    index: usize,
}

impl<'a> ParameterResolver<'a> {
    /// Creates a resolver for the item at `index`.
    #[must_use]
    pub fn new(ctx: &'a dyn ExecuteFunctions, index: usize) -> Self {
        Self { ctx, index }
    }

    /// The item index being resolved.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    fn raw(&self, name: &str) -> Result<Option<serde_json::Value>, ParameterError> {
        Ok(self
            .ctx
            .node_parameter(name, self.index)?
            .filter(|v| !v.is_null()))
    }

    /// A string parameter, empty when unset.
    pub fn string(&self, name: &str) -> Result<String, ParameterError> {
        self.string_or(name, "")
    }

    /// A string parameter with a default.
    pub fn string_or(&self, name: &str, default: &str) -> Result<String, ParameterError> {
        match self.raw(name)? {
            None => Ok(default.to_string()),
            Some(serde_json::Value::String(s)) => Ok(s),
            Some(_) => Err(ParameterError::invalid_type(name, "string")),
        }
    }

    /// An integer parameter with a default.
    ///
    /// Fractional numbers are truncated toward zero (`7.9` reads as `7`,
    /// `-2.5` as `-2`). Truncation is deliberate: the value is always whole
    /// before any range clamp. Numeric strings are parsed.
    #[allow(clippy::cast_possible_truncation)]
    pub fn integer_or(&self, name: &str, default: i64) -> Result<i64, ParameterError> {
        match self.raw(name)? {
            None => Ok(default),
            Some(serde_json::Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .ok_or_else(|| ParameterError::invalid_type(name, "number")),
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ParameterError::invalid_type(name, "number")),
            Some(_) => Err(ParameterError::invalid_type(name, "number")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticExecutionContext;

    fn ctx() -> StaticExecutionContext {
        StaticExecutionContext::with_item_count(1)
            .with_parameter("query", serde_json::json!("rust"))
            .with_parameter("num", serde_json::json!(25))
            .with_parameter("fraction", serde_json::json!(7.9))
            .with_parameter("text_num", serde_json::json!(" 12 "))
            .with_parameter("flag", serde_json::json!(true))
            .with_parameter("nothing", serde_json::Value::Null)
    }

    #[test]
    fn test_string_parameters() {
        let ctx = ctx();
        let params = ParameterResolver::new(&ctx, 0);

        assert_eq!(params.string("query").unwrap(), "rust");
        assert_eq!(params.string("missing").unwrap(), "");
        assert_eq!(params.string_or("nothing", "us").unwrap(), "us");
        assert!(matches!(
            params.string("flag"),
            Err(ParameterError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_integer_parameters() {
        let ctx = ctx();
        let params = ParameterResolver::new(&ctx, 0);

        assert_eq!(params.integer_or("num", 10).unwrap(), 25);
        assert_eq!(params.integer_or("missing", 10).unwrap(), 10);
        assert_eq!(params.integer_or("fraction", 10).unwrap(), 7);

        let negative_ctx = StaticExecutionContext::with_item_count(1)
            .with_parameter("num", serde_json::json!(-2.5));
        let negative = ParameterResolver::new(&negative_ctx, 0);
        assert_eq!(negative.integer_or("num", 10).unwrap(), -2);
        assert_eq!(params.integer_or("text_num", 10).unwrap(), 12);
        assert!(params.integer_or("query", 10).is_err());
    }

    #[test]
    fn test_out_of_range_index() {
        let ctx = ctx();
        let params = ParameterResolver::new(&ctx, 5);
        assert!(matches!(
            params.string("query"),
            Err(ParameterError::IndexOutOfRange { index: 5, len: 1 })
        ));
    }
}
