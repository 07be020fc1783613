//! Field descriptors and typed field handles.
//!
//! A [`FieldDescriptor`] binds a logical field name to a read path on a
//! record type. Descriptors are plain data (a name, a [`ValueType`] and
//! function pointers), so they are `Copy` and can be shared freely between
//! threads once registered.
//!
//! A [`Field`] is a descriptor tagged with the Rust type of its values. The
//! builder's typed operations take `&Field<R, T>` and use the [`Ordered`]
//! and [`Text`] marker traits to reject, at compile time, ordering or
//! pattern operators on fields that cannot support them.

use std::fmt;
use std::marker::PhantomData;

use serde::{Serialize, Serializer};

use crate::error::{Result, SiftError};
use crate::value::{Number, Operand, Timestamp, Value, ValueType};

/// Reads a field value from a record.
pub type Accessor<R> = for<'a> fn(&'a R) -> Value<'a>;

/// Parses raw filter text into an operand; `None` rejects the text.
pub type ValueParser = fn(&str) -> Option<Operand>;

/// Metadata and accessor for one queryable field of `R`.
pub struct FieldDescriptor<R> {
    name: &'static str,
    value_type: ValueType,
    accessor: Accessor<R>,
    parser: Option<ValueParser>,
    variants: &'static [(&'static str, u32)],
}

impl<R> FieldDescriptor<R> {
    pub fn new(name: &'static str, value_type: ValueType, accessor: Accessor<R>) -> Self {
        FieldDescriptor {
            name,
            value_type,
            accessor,
            parser: None,
            variants: &[],
        }
    }

    /// Creates an enum field whose raw filter text is matched against
    /// `variants` by name (case-insensitive) or by discriminant.
    pub fn enumeration(
        name: &'static str,
        variants: &'static [(&'static str, u32)],
        accessor: Accessor<R>,
    ) -> Self {
        FieldDescriptor {
            variants,
            ..FieldDescriptor::new(name, ValueType::Enum, accessor)
        }
    }

    /// Replaces the default parser for this field's value type.
    pub fn with_parser(mut self, parser: ValueParser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn variants(&self) -> &'static [(&'static str, u32)] {
        self.variants
    }

    /// Reads this field from a record.
    pub fn read<'a>(&self, record: &'a R) -> Value<'a> {
        (self.accessor)(record)
    }

    /// Parses raw filter text into an operand of this field's type.
    pub fn parse(&self, raw: &str) -> Option<Operand> {
        if let Some(parser) = self.parser {
            return parser(raw);
        }
        match self.value_type {
            ValueType::String => Some(Operand::String(raw.to_string())),
            ValueType::Number => Number::parse(raw).map(Operand::Number),
            ValueType::Timestamp => Timestamp::parse(raw).map(Operand::Timestamp),
            ValueType::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Operand::Bool(true)),
                "false" => Some(Operand::Bool(false)),
                _ => None,
            },
            ValueType::Enum => self.parse_variant(raw.trim()).map(Operand::Enum),
        }
    }

    fn parse_variant(&self, raw: &str) -> Option<u32> {
        if let Some((_, discriminant)) = self
            .variants
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(raw))
        {
            return Some(*discriminant);
        }
        let discriminant = raw.parse::<u32>().ok()?;
        if self.variants.is_empty() || self.variants.iter().any(|(_, d)| *d == discriminant) {
            Some(discriminant)
        } else {
            None
        }
    }

    /// Checks that `operand` has this field's value type.
    pub(crate) fn check_operand(&self, operand: &Operand) -> Result<()> {
        if operand.value_type() == self.value_type {
            Ok(())
        } else {
            Err(SiftError::TypeMismatch {
                field: self.name.to_string(),
                operator: None,
                value_type: self.value_type,
                expected: operand.value_type().as_str(),
            })
        }
    }
}

impl<R> Clone for FieldDescriptor<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for FieldDescriptor<R> {}

// Accessors are function pointers, which have no meaningful equality;
// two descriptors are the same field if name and type agree.
impl<R> PartialEq for FieldDescriptor<R> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value_type == other.value_type
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish()
    }
}

impl<R> Serialize for FieldDescriptor<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// Rust types usable as the value type of a typed [`Field`].
///
/// Implement this for your own enums to use them with typed fields:
///
/// ```
/// use sift::{FieldType, Operand, ValueType};
///
/// #[derive(Clone, Copy)]
/// enum Genre {
///     Fiction = 0,
///     Poetry = 1,
/// }
///
/// impl FieldType for Genre {
///     const VALUE_TYPE: ValueType = ValueType::Enum;
///
///     fn into_operand(self) -> Operand {
///         Operand::Enum(self as u32)
///     }
/// }
/// ```
pub trait FieldType {
    const VALUE_TYPE: ValueType;

    fn into_operand(self) -> Operand;
}

/// Field types with a total order.
pub trait Ordered: FieldType {}

/// Field types that support pattern matching.
pub trait Text: Ordered {}

impl FieldType for String {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn into_operand(self) -> Operand {
        Operand::String(self)
    }
}

impl Ordered for String {}
impl Text for String {}

impl FieldType for i64 {
    const VALUE_TYPE: ValueType = ValueType::Number;

    fn into_operand(self) -> Operand {
        Operand::Number(Number::I64(self))
    }
}

impl Ordered for i64 {}

impl FieldType for u64 {
    const VALUE_TYPE: ValueType = ValueType::Number;

    fn into_operand(self) -> Operand {
        Operand::Number(Number::U64(self))
    }
}

impl Ordered for u64 {}

impl FieldType for f64 {
    const VALUE_TYPE: ValueType = ValueType::Number;

    fn into_operand(self) -> Operand {
        Operand::Number(Number::F64(self))
    }
}

impl Ordered for f64 {}

impl FieldType for Timestamp {
    const VALUE_TYPE: ValueType = ValueType::Timestamp;

    fn into_operand(self) -> Operand {
        Operand::Timestamp(self)
    }
}

impl Ordered for Timestamp {}

impl FieldType for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;

    fn into_operand(self) -> Operand {
        Operand::Bool(self)
    }
}

/// A field descriptor tagged with the Rust type of its values.
pub struct Field<R, T> {
    descriptor: FieldDescriptor<R>,
    _marker: PhantomData<fn() -> T>,
}

impl<R, T: FieldType> Field<R, T> {
    /// Wraps a descriptor, checking that its declared type matches `T`.
    pub fn new(descriptor: FieldDescriptor<R>) -> Result<Self> {
        if descriptor.value_type() != T::VALUE_TYPE {
            return Err(SiftError::TypeMismatch {
                field: descriptor.name().to_string(),
                operator: None,
                value_type: descriptor.value_type(),
                expected: T::VALUE_TYPE.as_str(),
            });
        }
        Ok(Field {
            descriptor,
            _marker: PhantomData,
        })
    }
}

impl<R, T> Field<R, T> {
    pub fn descriptor(&self) -> &FieldDescriptor<R> {
        &self.descriptor
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name()
    }
}

impl<R, T> From<Field<R, T>> for FieldDescriptor<R> {
    fn from(field: Field<R, T>) -> Self {
        field.descriptor
    }
}

impl<R, T> From<&Field<R, T>> for FieldDescriptor<R> {
    fn from(field: &Field<R, T>) -> Self {
        field.descriptor
    }
}

impl<R> From<&FieldDescriptor<R>> for FieldDescriptor<R> {
    fn from(descriptor: &FieldDescriptor<R>) -> Self {
        *descriptor
    }
}

impl<R, T> Clone for Field<R, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, T> Copy for Field<R, T> {}

impl<R, T> fmt::Debug for Field<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.descriptor).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Book {
        title: String,
        pages: u32,
        format: u32,
    }

    const FORMATS: &[(&str, u32)] = &[("hardcover", 0), ("paperback", 1)];

    fn title(book: &Book) -> Value<'_> {
        Value::String(&book.title)
    }

    fn pages(book: &Book) -> Value<'_> {
        Value::Number(Number::U64(book.pages as u64))
    }

    fn format(book: &Book) -> Value<'_> {
        Value::Enum(book.format)
    }

    fn book() -> Book {
        Book {
            title: "Dune".into(),
            pages: 412,
            format: 1,
        }
    }

    #[test]
    fn read_uses_accessor() {
        let field = FieldDescriptor::new("title", ValueType::String, title);
        assert_eq!(field.read(&book()), Value::String("Dune"));
    }

    #[test]
    fn default_parsers_by_type() {
        let pages = FieldDescriptor::new("pages", ValueType::Number, pages);
        assert_eq!(pages.parse("12"), Some(Operand::Number(Number::I64(12))));
        assert_eq!(pages.parse("twelve"), None);

        let flag = FieldDescriptor::<Book>::new("flag", ValueType::Bool, |_| Value::None);
        assert_eq!(flag.parse("TRUE"), Some(Operand::Bool(true)));
        assert_eq!(flag.parse("yes"), None);
    }

    #[test]
    fn enum_parse_by_name_or_discriminant() {
        let field = FieldDescriptor::enumeration("format", FORMATS, format);
        assert_eq!(field.parse("Paperback"), Some(Operand::Enum(1)));
        assert_eq!(field.parse("0"), Some(Operand::Enum(0)));
        assert_eq!(field.parse("7"), None);
        assert_eq!(field.parse("scroll"), None);
    }

    #[test]
    fn custom_parser_overrides_default() {
        fn upper(raw: &str) -> Option<Operand> {
            Some(Operand::String(raw.to_uppercase()))
        }
        let field = FieldDescriptor::new("title", ValueType::String, title).with_parser(upper);
        assert_eq!(field.parse("dune"), Some(Operand::String("DUNE".into())));
    }

    #[test]
    fn equality_ignores_accessor() {
        let a = FieldDescriptor::new("title", ValueType::String, title);
        let b = FieldDescriptor::<Book>::new("title", ValueType::String, |_| Value::None);
        let c = FieldDescriptor::new("pages", ValueType::Number, pages);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn typed_field_checks_value_type() {
        let pages = FieldDescriptor::new("pages", ValueType::Number, pages);
        assert!(Field::<Book, u64>::new(pages).is_ok());

        let err = Field::<Book, String>::new(pages).unwrap_err();
        assert!(matches!(err, SiftError::TypeMismatch { expected: "string", .. }));
    }

    #[test]
    fn check_operand_type() {
        let field = FieldDescriptor::new("title", ValueType::String, title);
        assert!(field.check_operand(&Operand::from("x")).is_ok());
        assert!(field.check_operand(&Operand::from(1i64)).is_err());
    }
}
