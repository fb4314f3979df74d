pub mod container;
pub mod serializer;
pub mod value;
