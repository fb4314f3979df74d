use crate::error::{Result, TemplateError};
use crate::values::value::{Data, Value};
use serde::Serialize;
use serde::ser::{
    SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant, SerializeTuple,
    SerializeTupleStruct, SerializeTupleVariant, Serializer,
};

/// Converts any serializable value into a [`Value`].
pub fn to_value<T: ?Sized + Serialize>(t: &T) -> Result<Value> {
    t.serialize(Plain)
}

/// Converts a serializable struct or map into substitution [`Data`].
///
/// `()` and `None` give empty data; any other non-mapping root is rejected.
pub fn to_data<T: ?Sized + Serialize>(t: &T) -> Result<Data> {
    match to_value(t)? {
        Value::Map(map) => Ok(map),
        Value::Null => Ok(Data::new()),
        other => Err(TemplateError::InvalidData(format!(
            "expected a mapping at the data root, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Int(_) => "an integer",
        Value::Float(_) => "a float",
        Value::Str(_) => "a string",
        Value::List(_) => "a list",
        Value::Map(_) => "a map",
        Value::Container(_) => "a container",
    }
}

/// Keys of substitution data are strings; integer keys are written out.
fn key_string(key: Value) -> Result<String> {
    match key {
        Value::Str(s) => Ok(s),
        Value::Int(i) => Ok(i.to_string()),
        other => Err(TemplateError::InvalidData(format!(
            "map key must be a string or an integer, got {}",
            kind(&other)
        ))),
    }
}

/// Serializer into the closed [`Value`] model. Enum variants keep only
/// their payload, unit variants their name.
struct Plain;

impl Serializer for Plain {
    type Ok = Value;
    type Error = TemplateError;
    type SerializeSeq = Items;
    type SerializeTuple = Items;
    type SerializeTupleStruct = Items;
    type SerializeTupleVariant = Items;
    type SerializeMap = Fields;
    type SerializeStruct = Fields;
    type SerializeStructVariant = Fields;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }
    fn serialize_i8(self, v: i8) -> Result<Value> {
        self.serialize_i64(v.into())
    }
    fn serialize_i16(self, v: i16) -> Result<Value> {
        self.serialize_i64(v.into())
    }
    fn serialize_i32(self, v: i32) -> Result<Value> {
        self.serialize_i64(v.into())
    }
    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Int(v))
    }
    fn serialize_u8(self, v: u8) -> Result<Value> {
        self.serialize_i64(v.into())
    }
    fn serialize_u16(self, v: u16) -> Result<Value> {
        self.serialize_i64(v.into())
    }
    fn serialize_u32(self, v: u32) -> Result<Value> {
        self.serialize_i64(v.into())
    }
    fn serialize_u64(self, v: u64) -> Result<Value> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| TemplateError::Serialize(format!("integer {v} out of range")))
    }
    fn serialize_f32(self, v: f32) -> Result<Value> {
        self.serialize_f64(v.into())
    }
    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Float(v))
    }
    fn serialize_char(self, v: char) -> Result<Value> {
        self.serialize_str(v.encode_utf8(&mut [0; 4]))
    }
    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::Str(v.to_string()))
    }
    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        self.serialize_str(&String::from_utf8_lossy(v))
    }
    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<Value> {
        self.serialize_unit()
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
    ) -> Result<Value> {
        self.serialize_str(variant)
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<Value> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<Value> {
        value.serialize(self)
    }
    fn serialize_seq(self, len: Option<usize>) -> Result<Items> {
        Ok(Items(Vec::with_capacity(len.unwrap_or(0))))
    }
    fn serialize_tuple(self, len: usize) -> Result<Items> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_struct(self, _: &'static str, len: usize) -> Result<Items> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        len: usize,
    ) -> Result<Items> {
        self.serialize_seq(Some(len))
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Fields> {
        Ok(Fields::default())
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Fields> {
        Ok(Fields::default())
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Fields> {
        Ok(Fields::default())
    }
}

/// Members of a sequence or tuple, in order.
struct Items(Vec<Value>);

impl Items {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.0.push(to_value(value)?);
        Ok(())
    }
}

impl SerializeSeq for Items {
    type Ok = Value;
    type Error = TemplateError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }
    fn end(self) -> Result<Value> {
        Ok(Value::List(self.0))
    }
}

impl SerializeTuple for Items {
    type Ok = Value;
    type Error = TemplateError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }
    fn end(self) -> Result<Value> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleStruct for Items {
    type Ok = Value;
    type Error = TemplateError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }
    fn end(self) -> Result<Value> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleVariant for Items {
    type Ok = Value;
    type Error = TemplateError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }
    fn end(self) -> Result<Value> {
        SerializeSeq::end(self)
    }
}

/// Members of a map or struct. A map key waits in `pending` for its value.
#[derive(Default)]
struct Fields {
    data: Data,
    pending: Option<String>,
}

impl Fields {
    fn insert<T: ?Sized + Serialize>(&mut self, key: String, value: &T) -> Result<()> {
        self.data.insert(key, to_value(value)?);
        Ok(())
    }
}

impl SerializeMap for Fields {
    type Ok = Value;
    type Error = TemplateError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.pending = Some(key_string(to_value(key)?)?);
        Ok(())
    }
    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self
            .pending
            .take()
            .ok_or_else(|| TemplateError::Serialize("map value without a key".into()))?;
        self.insert(key, value)
    }
    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.data))
    }
}

impl SerializeStruct for Fields {
    type Ok = Value;
    type Error = TemplateError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.insert(key.to_string(), value)
    }
    fn end(self) -> Result<Value> {
        SerializeMap::end(self)
    }
}

impl SerializeStructVariant for Fields {
    type Ok = Value;
    type Error = TemplateError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.insert(key.to_string(), value)
    }
    fn end(self) -> Result<Value> {
        SerializeMap::end(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Person {
        name: String,
        age: u8,
        tags: Vec<&'static str>,
        nickname: Option<String>,
    }

    #[derive(Serialize)]
    enum Role {
        Admin,
    }

    #[test]
    fn test_to_data_struct() {
        let person = Person {
            name: "Alice".into(),
            age: 30,
            tags: vec!["a", "b"],
            nickname: None,
        };
        let data = to_data(&person).unwrap();
        assert_eq!(data["name"], Value::Str("Alice".into()));
        assert_eq!(data["age"], Value::Int(30));
        assert_eq!(
            data["tags"],
            Value::List(vec![Value::Str("a".into()), Value::Str("b".into())])
        );
        assert_eq!(data["nickname"], Value::Null);
    }

    #[test]
    fn test_to_data_map_with_integer_keys() {
        let mut map = HashMap::new();
        map.insert(1, "one");
        let data = to_data(&map).unwrap();
        assert_eq!(data["1"], Value::Str("one".into()));
    }

    #[test]
    fn test_to_data_rejects_compound_keys() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");
        assert!(matches!(to_data(&map), Err(TemplateError::InvalidData(_))));
    }

    #[test]
    fn test_to_data_unit_is_empty() {
        assert!(to_data(&()).unwrap().is_empty());
    }

    #[test]
    fn test_to_data_rejects_non_mapping() {
        assert!(matches!(
            to_data(&vec![1, 2]),
            Err(TemplateError::InvalidData(_))
        ));
        assert!(matches!(to_data("text"), Err(TemplateError::InvalidData(_))));
    }

    #[test]
    fn test_to_value_variants_and_overflow() {
        assert_eq!(to_value(&Role::Admin).unwrap(), Value::Str("Admin".into()));
        assert_eq!(
            to_value(&(1, "x")).unwrap(),
            Value::List(vec![Value::Int(1), Value::Str("x".into())])
        );
        assert!(matches!(
            to_value(&u64::MAX),
            Err(TemplateError::Serialize(_))
        ));
    }
}
