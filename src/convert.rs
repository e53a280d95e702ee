//! Token converters
//!
//! A converter turns a literal from the query text into the leaf value an AST carries.
//! The same grammar serves raw strings, category enums and bit values depending on
//! which converter the caller injects.

use std::marker::PhantomData;

use crate::attributes::Category;
use crate::error::QueryError;

pub trait TokenConverter {
    type Value;

    fn convert(&self, token: &str) -> Result<Self::Value, QueryError>;
}

/// Keeps tokens as strings
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl TokenConverter for Identity {
    type Value = String;

    fn convert(&self, token: &str) -> Result<String, QueryError> {
        Ok(token.to_string())
    }
}

/// Resolves tokens to a category value, rejecting unknown names
#[derive(Clone, Copy, Debug)]
pub struct CategoryConverter<C>(PhantomData<C>);

impl<C> CategoryConverter<C> {
    pub fn new() -> Self {
        CategoryConverter(PhantomData)
    }
}

impl<C> Default for CategoryConverter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Category> TokenConverter for CategoryConverter<C> {
    type Value = C;

    fn convert(&self, token: &str) -> Result<C, QueryError> {
        C::from_name(token).ok_or_else(|| QueryError::conversion(C::KIND, token))
    }
}

/// Any closure over a token is a converter
impl<T, F> TokenConverter for F
where
    F: Fn(&str) -> Result<T, QueryError>,
{
    type Value = T;

    fn convert(&self, token: &str) -> Result<T, QueryError> {
        self(token)
    }
}
