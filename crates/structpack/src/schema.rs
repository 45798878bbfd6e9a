//! The schema language.
//!
//! A [`Candidate`] is anything that may name a schema: a registered name, a raw
//! field layout or an already built [`Schema`]. Composite schemas keep their
//! children as candidates and resolve them through the registry at pack/unpack
//! time, so named schemas may refer to each other before they are registered.
//!
//! Every schema and candidate renders to a canonical string through
//! [`Display`](fmt::Display), e.g. `object({name:string('uint8'),year:'uint16'})`.

use std::{borrow::Cow, fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{
    array,
    bytes::Cursor,
    context::Context,
    depend::{self, Operator},
    enums,
    errors::Result,
    extension::Extension,
    number::Number,
    object,
    parse::{self, Transcoder},
    string,
    together::Selector,
    value::Value,
};

/// Shared handle to an immutable schema.
pub type SchemaRef = Arc<Schema>;

/// Byte footprint of a schema when it is known without looking at data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Fixed(usize),
    Dynamic,
}

/// Element count of an array-like schema.
#[derive(Clone)]
pub enum Count {
    /// A literal number of elements.
    Static(usize),
    /// The count is stored on the wire right before the elements, encoded
    /// with the given numeric schema.
    Prefixed(Candidate),
    /// Unpack consumes the rest of the input; pack writes every element
    /// without a prefix.
    Auto,
}

impl From<usize> for Count {
    fn from(value: usize) -> Self {
        Count::Static(value)
    }
}

impl From<i32> for Count {
    fn from(value: i32) -> Self {
        Count::Static(value.max(0) as usize)
    }
}

impl From<&str> for Count {
    fn from(value: &str) -> Self {
        Count::Prefixed(value.into())
    }
}

impl From<Candidate> for Count {
    fn from(value: Candidate) -> Self {
        Count::Prefixed(value)
    }
}

impl From<Number> for Count {
    fn from(value: Number) -> Self {
        Count::Prefixed(value.into())
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Count::Static(n) => write!(f, "{n}"),
            Count::Prefixed(schema) => write!(f, "{schema}"),
            Count::Auto => f.write_str("null"),
        }
    }
}

/// Something that resolves to a schema.
#[derive(Clone)]
pub enum Candidate {
    /// A registered name, an alias, or a pattern such as `uint8[4]`.
    Name(String),
    /// A raw field layout; resolves to an implicit `object`.
    Fields(Layout),
    /// A concrete schema; resolves to itself.
    Schema(SchemaRef),
}

impl Candidate {
    /// The identifier reported when this candidate fails to resolve.
    pub fn identifier(&self) -> String {
        match self {
            Candidate::Name(name) => name.clone(),
            other => other.to_string(),
        }
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Candidate::Name(value.to_string())
    }
}

impl From<String> for Candidate {
    fn from(value: String) -> Self {
        Candidate::Name(value)
    }
}

impl From<&Candidate> for Candidate {
    fn from(value: &Candidate) -> Self {
        value.clone()
    }
}

impl From<Layout> for Candidate {
    fn from(value: Layout) -> Self {
        Candidate::Fields(value)
    }
}

impl From<Schema> for Candidate {
    fn from(value: Schema) -> Self {
        Candidate::Schema(Arc::new(value))
    }
}

impl From<SchemaRef> for Candidate {
    fn from(value: SchemaRef) -> Self {
        Candidate::Schema(value)
    }
}

impl From<Number> for Candidate {
    fn from(value: Number) -> Self {
        Schema::Number(value).into()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Name(name) => write!(f, "'{name}'"),
            Candidate::Fields(layout) => write!(f, "{layout}"),
            Candidate::Schema(schema) => write!(f, "{schema}"),
        }
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Candidate({self})")
    }
}

/// Ordered field list of an object or union body. Field order is the wire
/// order.
#[derive(Clone)]
pub enum Layout {
    /// Fields addressed by name; packs from and unpacks to an object.
    Named(IndexMap<String, Candidate>),
    /// Fields addressed by position; packs from and unpacks to an array.
    Positional(Vec<Candidate>),
}

impl Layout {
    pub fn named() -> Self {
        Layout::Named(IndexMap::new())
    }

    pub fn positional() -> Self {
        Layout::Positional(vec![])
    }

    /// Appends a field. Positional layouts ignore the name.
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<Candidate>) -> Self {
        match &mut self {
            Layout::Named(fields) => {
                fields.insert(name.into(), schema.into());
            }
            Layout::Positional(items) => items.push(schema.into()),
        }
        self
    }

    /// Appends a field under the next positional key.
    pub fn item(self, schema: impl Into<Candidate>) -> Self {
        let key = self.len().to_string();
        self.field(key, schema)
    }

    pub fn len(&self) -> usize {
        match self {
            Layout::Named(fields) => fields.len(),
            Layout::Positional(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks a field up by name, or by decimal position for positional
    /// layouts.
    pub fn get(&self, key: &str) -> Option<&Candidate> {
        match self {
            Layout::Named(fields) => fields.get(key),
            Layout::Positional(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        }
    }

    /// Fields in wire order with their lookup keys.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (Cow<'_, str>, &Candidate)> + '_> {
        match self {
            Layout::Named(fields) => Box::new(
                fields
                    .iter()
                    .map(|(key, schema)| (Cow::Borrowed(key.as_str()), schema)),
            ),
            Layout::Positional(items) => Box::new(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, schema)| (Cow::Owned(i.to_string()), schema)),
            ),
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Layout::Positional(_))
    }
}

impl<C: Into<Candidate>> FromIterator<C> for Layout {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Layout::Positional(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<Candidate>> for Layout {
    fn from(value: Vec<Candidate>) -> Self {
        Layout::Positional(value)
    }
}

impl From<IndexMap<String, Candidate>> for Layout {
    fn from(value: IndexMap<String, Candidate>) -> Self {
        Layout::Named(value)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Named(fields) => {
                f.write_str("{")?;
                for (i, (key, schema)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{key}:{schema}")?;
                }
                f.write_str("}")
            }
            Layout::Positional(items) => {
                f.write_str("[")?;
                for (i, schema) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{schema}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A concrete schema. The set of kinds is closed; plugins hook in through
/// [`Schema::Custom`].
pub enum Schema {
    Number(Number),
    Array {
        item: Candidate,
        count: Count,
    },
    String {
        size: Count,
    },
    CString {
        size: Count,
    },
    Object(Layout),
    Union {
        layout: Layout,
        size: usize,
    },
    Enums {
        map: Vec<(String, i64)>,
        base: Candidate,
    },
    Depend {
        field: String,
        selector: Selector,
    },
    Link {
        field: String,
        item: Candidate,
    },
    Virtual {
        operator: Operator,
        value: Value,
    },
    Exit,
    Parse {
        encode: Transcoder,
        decode: Transcoder,
        inner: Candidate,
        size: Count,
    },
    Custom(Arc<dyn Extension>),
}

impl Schema {
    /// Tag naming the constructor kind.
    pub fn namespace(&self) -> &str {
        match self {
            Schema::Number(_) => "number",
            Schema::Array { .. } => "array",
            Schema::String { .. } => "string",
            Schema::CString { .. } => "cstring",
            Schema::Object(_) => "object",
            Schema::Union { .. } => "union",
            Schema::Enums { .. } => "enums",
            Schema::Depend { .. } => "depend",
            Schema::Link { .. } => "link",
            Schema::Virtual { .. } => "virtual",
            Schema::Exit => "exit",
            Schema::Parse { .. } => "parse",
            Schema::Custom(extension) => extension.namespace(),
        }
    }

    pub fn size(&self) -> Size {
        match self {
            Schema::Number(number) => Size::Fixed(number.size()),
            Schema::Array {
                item: Candidate::Schema(item),
                count: Count::Static(n),
            } => match item.size() {
                Size::Fixed(size) => Size::Fixed(size * n),
                Size::Dynamic => Size::Dynamic,
            },
            Schema::String {
                size: Count::Static(n),
            }
            | Schema::CString {
                size: Count::Static(n),
            }
            | Schema::Parse {
                size: Count::Static(n),
                ..
            } => Size::Fixed(*n),
            Schema::Union { size, .. } => Size::Fixed(*size),
            Schema::Virtual { .. } | Schema::Exit => Size::Fixed(0),
            Schema::Custom(extension) => extension.size(),
            _ => Size::Dynamic,
        }
    }

    /// Reads one value at the cursor, advancing it past the consumed bytes.
    pub fn unpack(&self, ctx: &mut Context<'_, '_>, cursor: &mut Cursor<'_>) -> Result<Value> {
        match self {
            Schema::Number(number) => number.unpack(cursor, ctx.little_endian()),
            Schema::Array { item, count } => array::unpack(ctx, item, count, cursor),
            Schema::String { size } => string::unpack(ctx, size, cursor),
            Schema::CString { size } => string::unpack_cstring(ctx, size, cursor),
            Schema::Object(layout) => object::unpack(ctx, layout, cursor),
            Schema::Union { layout, size } => object::unpack_union(ctx, layout, *size, cursor),
            Schema::Enums { map, base } => enums::unpack(ctx, map, base, cursor),
            Schema::Depend { field, selector } => depend::unpack(ctx, field, selector, cursor),
            Schema::Link { field, item } => depend::unpack_link(ctx, field, item, cursor),
            Schema::Virtual { operator, value } => Ok(operator.apply(value)),
            Schema::Exit => depend::exit_scope(ctx).map(|()| Value::Null),
            Schema::Parse {
                decode,
                inner,
                size,
                ..
            } => parse::unpack(ctx, decode, inner, size, cursor),
            Schema::Custom(extension) => extension.unpack(ctx, cursor),
        }
    }

    /// Appends the encoding of `value` to `out`.
    pub fn pack(&self, ctx: &mut Context<'_, '_>, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Schema::Number(number) => number.pack(value, ctx.little_endian(), out),
            Schema::Array { item, count } => array::pack(ctx, item, count, value, out),
            Schema::String { size } => string::pack(ctx, size, value, out),
            Schema::CString { size } => string::pack_cstring(ctx, size, value, out),
            Schema::Object(layout) => object::pack(ctx, layout, value, out),
            Schema::Union { layout, size } => object::pack_union(ctx, layout, *size, value, out),
            Schema::Enums { map, base } => enums::pack(ctx, map, base, value, out),
            Schema::Depend { field, selector } => depend::pack(ctx, field, selector, value, out),
            Schema::Link { field, item } => depend::pack_link(ctx, field, item, value, out),
            Schema::Virtual { .. } => Ok(()),
            Schema::Exit => depend::exit_scope(ctx),
            Schema::Parse {
                encode,
                inner,
                size,
                ..
            } => parse::pack(ctx, encode, inner, size, value, out),
            Schema::Custom(extension) => extension.pack(ctx, value, out),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Number(number) => write!(f, "{number}"),
            Schema::Array { item, count } => write!(f, "array({item},{count})"),
            Schema::String { size } => write!(f, "string({size})"),
            Schema::CString { size } => write!(f, "cstring({size})"),
            Schema::Object(layout) => write!(f, "object({layout})"),
            Schema::Union { layout, size } => write!(f, "union({layout},{size})"),
            Schema::Enums { map, base } => {
                f.write_str("enums({")?;
                for (i, (name, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{name}:{value}")?;
                }
                write!(f, "}},{base})")
            }
            Schema::Depend { field, selector } => write!(f, "depend('{field}',{selector})"),
            Schema::Link { field, item } => write!(f, "link('{field}',{item})"),
            Schema::Virtual { operator, value } => write!(f, "virtual({operator},{value})"),
            Schema::Exit => f.write_str("exit()"),
            Schema::Parse {
                encode,
                decode,
                inner,
                size,
            } => write!(f, "parse({encode},{decode},{inner},{size})"),
            Schema::Custom(extension) => f.write_str(extension.namespace()),
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({self})")
    }
}

/// Canonical string form of a schema or candidate.
pub fn stringify(schema: impl Into<Candidate>) -> String {
    schema.into().to_string()
}
