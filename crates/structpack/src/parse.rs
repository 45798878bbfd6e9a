//! `parse`: a raw byte region run through a transcoder before the inner
//! schema sees it.

use std::{fmt, sync::Arc};

use crate::{
    array::{pack_raw, unpack_raw},
    bytes::Cursor,
    context::Context,
    errors::{Error, Result},
    schema::{Candidate, Count, Schema},
    together::{Arg, Constructor, take_args},
    value::Value,
};

type TranscodeFn = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync>;

/// A named byte-to-byte transform. The name is what the schema string shows.
#[derive(Clone)]
pub struct Transcoder {
    name: String,
    apply: TranscodeFn,
}

impl Transcoder {
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        (self.apply)(bytes)
    }
}

impl fmt::Display for Transcoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.name)
    }
}

impl fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transcoder").field(&self.name).finish()
    }
}

/// Packs `inner`, encodes the bytes and stores them as a region sized by
/// `size`; unpacking reverses the steps.
pub fn parse(
    encode: Transcoder,
    decode: Transcoder,
    inner: impl Into<Candidate>,
    size: impl Into<Count>,
) -> Candidate {
    Schema::Parse {
        encode,
        decode,
        inner: inner.into(),
        size: size.into(),
    }
    .into()
}

pub static PARSE: Constructor = Constructor {
    namespace: "parse",
    arity: 4,
    build: build_parse,
};

fn transcoder(arg: Arg) -> Result<Transcoder> {
    match arg {
        Arg::Transcoder(transcoder) => Ok(transcoder),
        other => Err(Error::invalid(
            "parse",
            format!("expected a transcoder, found {other}"),
        )),
    }
}

fn build_parse(args: Vec<Arg>) -> Result<Candidate> {
    let [encode, decode, inner, size] = take_args("parse", args)?;
    Ok(parse(
        transcoder(encode)?,
        transcoder(decode)?,
        inner.into_candidate("parse")?,
        size.into_count("parse")?,
    ))
}

pub(crate) fn unpack(
    ctx: &mut Context<'_, '_>,
    decode: &Transcoder,
    inner: &Candidate,
    size: &Count,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let raw = unpack_raw(ctx, size, cursor)?;
    let decoded = decode.apply(raw)?;
    ctx.unpack(inner, &mut Cursor::new(&decoded))
}

pub(crate) fn pack(
    ctx: &mut Context<'_, '_>,
    encode: &Transcoder,
    inner: &Candidate,
    size: &Count,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut plain = vec![];
    ctx.pack(inner, value, &mut plain)?;
    let encoded = encode.apply(&plain)?;
    pack_raw(ctx, size, &encoded, out)
}
