// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::BTreeMap,
          fmt::{Display, Formatter, Result}};

/// Functions that are always in scope in the reference language.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Builtin {
    Print,
    Sleep,
    Assert,
    Len,
}

/// Runtime values. Objects use a [`BTreeMap`] so that property listings, and therefore
/// member completions, come out in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    Path(String),
    Url(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Builtin(Builtin),
}

impl Value {
    #[must_use]
    pub fn is_nil(&self) -> bool { matches!(self, Value::Nil) }

    /// Properties are only defined on objects.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        match self {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => vec![],
        }
    }

    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil | Value::Bool(false) | Value::Int(0) => false,
            Value::Str(it) => !it.is_empty(),
            Value::List(it) => !it.is_empty(),
            _ => true,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Path(_) => "path",
            Value::Url(_) => "url",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Builtin(_) => "builtin",
        }
    }

    /// Convenience for building objects in tests and host setup code.
    #[must_use]
    pub fn object<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(it) => write!(f, "{it}"),
            Value::Int(it) => write!(f, "{it}"),
            Value::Str(it) => write!(f, "{it:?}"),
            Value::Path(it) | Value::Url(it) => write!(f, "{it}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (index, (key, value)) in map.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Builtin(it) => write!(f, "<builtin {it}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display() {
        let it = Value::object([
            ("name", Value::Str("repl".into())),
            ("tags", Value::List(vec![Value::Int(1), Value::Nil])),
        ]);
        pretty_assertions::assert_eq!(it.to_string(), r#"{name: "repl", tags: [1, nil]}"#);
    }

    #[test]
    fn test_property_lookup() {
        let it = Value::object([("b", Value::Int(2)), ("a", Value::Int(1))]);
        assert_eq!(it.property("a"), Some(&Value::Int(1)));
        assert_eq!(it.property("zz"), None);
        assert_eq!(it.property_names(), vec!["a", "b"]);
        assert!(Value::Int(3).property_names().is_empty());
    }

    #[test]
    fn test_builtin_names() {
        assert_eq!(Builtin::from_str("sleep").unwrap(), Builtin::Sleep);
        assert_eq!(Builtin::Print.to_string(), "print");
        assert!(Builtin::from_str("nope").is_err());
    }
}
