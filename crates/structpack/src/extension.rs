//! Hooks for schemas defined outside this crate.
//!
//! An [`Extension`] is wrapped in [`Schema::Custom`] and registered like any
//! other schema, usually from a plugin passed to [`Registry::install`]:
//!
//! ```
//! use std::sync::Arc;
//!
//! use structpack::{
//!     Context, Cursor, Extension, Registry, Result, Schema, Value,
//! };
//!
//! /// One byte holding a boolean.
//! struct Flag;
//!
//! impl Extension for Flag {
//!     fn namespace(&self) -> &str {
//!         "flag"
//!     }
//!
//!     fn unpack(&self, _: &mut Context<'_, '_>, cursor: &mut Cursor<'_>) -> Result<Value> {
//!         Ok(Value::Int((cursor.take(1)?[0] != 0).into()))
//!     }
//!
//!     fn pack(&self, _: &mut Context<'_, '_>, value: &Value, out: &mut Vec<u8>) -> Result<()> {
//!         out.push(u8::from(value.as_i64().unwrap_or(0) != 0));
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.install(|registry| {
//!     registry.register("flag", Schema::Custom(Arc::new(Flag)));
//! });
//! assert_eq!(registry.pack("flag", &Value::Int(5)).unwrap(), vec![1]);
//! ```
//!
//! [`Schema::Custom`]: crate::schema::Schema::Custom
//! [`Registry::install`]: crate::registry::Registry::install

use crate::{bytes::Cursor, context::Context, errors::Result, schema::Size, value::Value};

pub trait Extension: Send + Sync {
    /// Kind tag; also the schema string of the extension.
    fn namespace(&self) -> &str;

    fn size(&self) -> Size {
        Size::Dynamic
    }

    /// Reads one value, advancing `cursor` past the consumed bytes.
    fn unpack(&self, ctx: &mut Context<'_, '_>, cursor: &mut Cursor<'_>) -> Result<Value>;

    fn pack(&self, ctx: &mut Context<'_, '_>, value: &Value, out: &mut Vec<u8>) -> Result<()>;
}
