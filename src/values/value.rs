use crate::error::Result;
use crate::tpl::render_context::BlockResolver;
use crate::values::container::Container;
use std::collections::BTreeMap;
use std::fmt;

/// Flat substitution data for one template or one block instance.
pub type Data = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Data),
    Container(Container),
}

impl Value {
    /// Stringifies the value for a plain `{{tag}}`.
    ///
    /// Lists and maps contribute only their string elements, joined without a
    /// separator. Containers are expanded through `resolver`; without one they
    /// render empty.
    pub fn render(&self, resolver: Option<&dyn BlockResolver>) -> Result<String> {
        Ok(match self {
            Value::Null | Value::Bool(false) => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Str(s) => s.clone(),
            Value::List(items) => concat_strings(items.iter()),
            Value::Map(map) => concat_strings(map.values()),
            Value::Container(container) => return container.render(resolver),
        })
    }

    /// Integer coercion used to pick an option of a predefined tag.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Str(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
            }
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Value::Container(c) => Some(c),
            _ => None,
        }
    }
}

fn concat_strings<'a>(items: impl Iterator<Item = &'a Value>) -> String {
    items
        .filter_map(|item| match item {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

/// Renders the value with no render context, so Containers come out empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.render(None).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}
impl From<Data> for Value {
    fn from(v: Data) -> Self {
        Value::Map(v)
    }
}
impl From<Container> for Value {
    fn from(v: Container) -> Self {
        Value::Container(v)
    }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
