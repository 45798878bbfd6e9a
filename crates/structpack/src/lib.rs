//! # structpack
//!
//! Declarative binary layouts. Describe a wire format as a composition of
//! schemas (numbers, arrays, strings, objects, unions, enums and fields that
//! depend on earlier fields), then pack structured [`Value`]s into bytes and
//! unpack bytes back into values.
//!
//! Schemas are registered by name in a [`Registry`] and may refer to each
//! other by name; names resolve when a schema is used, not when it is built.
//!
//! ## Example
//!
//! ```
//! use structpack::{
//!     Registry, Value,
//!     array::array,
//!     depend::depend,
//!     object::object,
//!     schema::Layout,
//!     together::Selector,
//! };
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     "packet",
//!     object(
//!         Layout::named()
//!             .field("size", "uint8")
//!             .field(
//!                 "data",
//!                 depend("size", Selector::function(|n| {
//!                     Ok(array("uint8", n.as_usize().unwrap_or(0)))
//!                 })),
//!             ),
//!     ),
//! );
//!
//! let packet: Value = [("size", Value::from(3)), ("data", Value::from(vec![1, 2, 3]))]
//!     .into_iter()
//!     .collect();
//! let bytes = registry.pack("packet", &packet).unwrap();
//! assert_eq!(bytes, vec![3, 1, 2, 3]);
//! assert_eq!(registry.unpack("packet", &bytes).unwrap(), packet);
//! ```

pub mod array;
pub mod bytes;
pub mod context;
pub mod depend;
pub mod enums;
pub mod errors;
pub mod extension;
pub mod number;
pub mod object;
pub mod options;
pub mod parse;
pub mod registry;
pub mod schema;
pub mod string;
pub mod together;
pub mod value;

#[cfg(test)]
mod test_util;

pub use bytes::Cursor;
pub use context::{Context, Scope};
pub use errors::{Error, ErrorKind, Result};
pub use extension::Extension;
pub use number::Number;
pub use options::{Encoding, Options, OptionsDef};
pub use registry::Registry;
pub use schema::{Candidate, Count, Layout, Schema, Size, stringify};
pub use value::Value;
