//! Partial application of schema constructors.
//!
//! A [`Constructor`] has a fixed arity. Feeding it arguments through
//! [`Partial::apply`] accumulates them until the arity is reached, so
//! `array('uint8', 4)`, `array('uint8')(4)` and `array()('uint8')(4)` all build
//! the same schema. An incomplete [`Partial`] is what `depend` and `cases`
//! expect as a selector: the dependent value becomes its last argument.

use std::{fmt, sync::Arc};

use crate::{
    depend::Operator,
    errors::{Error, Result},
    number::Number,
    parse::Transcoder,
    schema::{Candidate, Count, Layout},
    value::Value,
};

/// One constructor argument.
#[derive(Clone)]
pub enum Arg {
    /// A literal: a count, a field name, a size or `null`. Strings also name
    /// schemas where a schema is expected.
    Value(Value),
    Schema(Candidate),
    /// `[matchValue, schema]` pairs for `cases`.
    Cases(Vec<(Value, Candidate)>),
    Selector(Selector),
    Operator(Operator),
    Transcoder(Transcoder),
}

impl Arg {
    pub(crate) fn into_candidate(self, constructor: &'static str) -> Result<Candidate> {
        match self {
            Arg::Value(Value::String(name)) => Ok(Candidate::Name(name)),
            Arg::Schema(candidate) => Ok(candidate),
            other => Err(Error::invalid(
                constructor,
                format!("expected a schema, found {other}"),
            )),
        }
    }

    pub(crate) fn into_count(self, constructor: &'static str) -> Result<Count> {
        match self {
            Arg::Value(Value::Null) => Ok(Count::Auto),
            Arg::Value(Value::String(name)) => Ok(Count::Prefixed(Candidate::Name(name))),
            Arg::Value(value) if value.is_number() => value
                .as_usize()
                .map(Count::Static)
                .ok_or_else(|| Error::invalid(constructor, format!("bad count {value}"))),
            Arg::Schema(candidate) => Ok(Count::Prefixed(candidate)),
            other => Err(Error::invalid(
                constructor,
                format!("expected a count, found {other}"),
            )),
        }
    }

    pub(crate) fn into_usize(self, constructor: &'static str) -> Result<usize> {
        match self {
            Arg::Value(value) => value.as_usize().ok_or_else(|| {
                Error::invalid(constructor, format!("expected a size, found {value}"))
            }),
            other => Err(Error::invalid(
                constructor,
                format!("expected a size, found {other}"),
            )),
        }
    }

    pub(crate) fn into_field(self, constructor: &'static str) -> Result<String> {
        match self {
            Arg::Value(Value::String(field)) => Ok(field),
            other => Err(Error::invalid(
                constructor,
                format!("field must be a string, found {other}"),
            )),
        }
    }

    pub(crate) fn into_layout(self, constructor: &'static str) -> Result<Layout> {
        match self {
            Arg::Schema(Candidate::Fields(layout)) => Ok(layout),
            other => Err(Error::invalid(
                constructor,
                format!("expected a field layout, found {other}"),
            )),
        }
    }

    pub(crate) fn into_selector(self, constructor: &'static str) -> Result<Selector> {
        match self {
            Arg::Selector(selector) => Ok(selector),
            other => Err(Error::invalid(
                constructor,
                format!("expected a selector, found {other}"),
            )),
        }
    }

    pub(crate) fn into_value(self, constructor: &'static str) -> Result<Value> {
        match self {
            Arg::Value(value) => Ok(value),
            other => Err(Error::invalid(
                constructor,
                format!("expected a value, found {other}"),
            )),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Value(value.into())
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Value(value.into())
    }
}

impl From<usize> for Arg {
    fn from(value: usize) -> Self {
        Arg::Value(value.into())
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Value(value.into())
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Value(value.into())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Value(value.into())
    }
}

impl From<Candidate> for Arg {
    fn from(value: Candidate) -> Self {
        Arg::Schema(value)
    }
}

impl From<Layout> for Arg {
    fn from(value: Layout) -> Self {
        Arg::Schema(Candidate::Fields(value))
    }
}

impl From<Number> for Arg {
    fn from(value: Number) -> Self {
        Arg::Schema(value.into())
    }
}

impl From<Vec<(Value, Candidate)>> for Arg {
    fn from(value: Vec<(Value, Candidate)>) -> Self {
        Arg::Cases(value)
    }
}

impl From<Partial> for Arg {
    fn from(value: Partial) -> Self {
        Arg::Selector(Selector::Partial(value))
    }
}

impl From<Selector> for Arg {
    fn from(value: Selector) -> Self {
        Arg::Selector(value)
    }
}

impl From<Operator> for Arg {
    fn from(value: Operator) -> Self {
        Arg::Operator(value)
    }
}

impl From<Transcoder> for Arg {
    fn from(value: Transcoder) -> Self {
        Arg::Transcoder(value)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => write!(f, "{value}"),
            Arg::Schema(candidate) => write!(f, "{candidate}"),
            Arg::Cases(patterns) => {
                f.write_str("[")?;
                for (i, (value, schema)) in patterns.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "[{value},{schema}]")?;
                }
                f.write_str("]")
            }
            Arg::Selector(selector) => write!(f, "{selector}"),
            Arg::Operator(operator) => write!(f, "{operator}"),
            Arg::Transcoder(transcoder) => write!(f, "{transcoder}"),
        }
    }
}

/// Splits the collected arguments of a complete application.
pub(crate) fn take_args<const N: usize>(
    constructor: &'static str,
    args: Vec<Arg>,
) -> Result<[Arg; N]> {
    let found = args.len();
    <[Arg; N]>::try_from(args)
        .map_err(|_| Error::invalid(constructor, format!("takes {N} arguments, got {found}")))
}

/// A schema constructor of fixed arity.
pub struct Constructor {
    /// Kind tag, also used when the constructor is stringified.
    pub namespace: &'static str,
    pub arity: usize,
    /// Builds the schema once exactly `arity` arguments are collected.
    pub build: fn(Vec<Arg>) -> Result<Candidate>,
}

impl Constructor {
    /// The constructor with no arguments applied yet.
    pub fn partial(&'static self) -> Partial {
        Partial {
            constructor: self,
            args: vec![],
        }
    }

    pub fn call(&'static self, args: impl IntoIterator<Item = Arg>) -> Result<Applied> {
        self.partial().apply(args)
    }
}

/// A constructor with some of its arguments collected.
#[derive(Clone)]
pub struct Partial {
    constructor: &'static Constructor,
    args: Vec<Arg>,
}

impl Partial {
    pub fn namespace(&self) -> &'static str {
        self.constructor.namespace
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Arguments still missing.
    pub fn remaining(&self) -> usize {
        self.constructor.arity.saturating_sub(self.args.len())
    }

    /// Collects one more argument without building.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Collects `args`; builds the schema once the arity is reached.
    pub fn apply(&self, args: impl IntoIterator<Item = Arg>) -> Result<Applied> {
        let mut list = self.args.clone();
        list.extend(args);

        let arity = self.constructor.arity;
        if list.len() > arity {
            return Err(Error::invalid(
                self.constructor.namespace,
                format!("takes {arity} arguments, got {}", list.len()),
            ));
        }
        if list.len() < arity {
            return Ok(Applied::Partial(Partial {
                constructor: self.constructor,
                args: list,
            }));
        }

        (self.constructor.build)(list).map(Applied::Complete)
    }
}

/// Writes `ns(arg,...)`. With no arguments collected it writes the quoted
/// constructor name, e.g. `'bytes'`. Constructors are not registry entries, so
/// that string names no schema and does not resolve back.
impl fmt::Display for Partial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "'{}'", self.constructor.namespace);
        }

        write!(f, "{}(", self.constructor.namespace)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Outcome of applying arguments to a [`Partial`].
pub enum Applied {
    Partial(Partial),
    Complete(Candidate),
}

impl Applied {
    /// Applies further arguments.
    pub fn then(self, args: impl IntoIterator<Item = Arg>) -> Result<Applied> {
        match self {
            Applied::Partial(partial) => partial.apply(args),
            Applied::Complete(candidate) => {
                let mut args = args.into_iter().peekable();
                if args.peek().is_some() {
                    return Err(Error::invalid("together", format!("{candidate} is complete")));
                }
                Ok(Applied::Complete(candidate))
            }
        }
    }

    pub fn into_candidate(self) -> Result<Candidate> {
        match self {
            Applied::Complete(candidate) => Ok(candidate),
            Applied::Partial(partial) => Err(Error::invalid(
                partial.namespace(),
                format!("{} more arguments required", partial.remaining()),
            )),
        }
    }
}

impl fmt::Display for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Applied::Partial(partial) => write!(f, "{partial}"),
            Applied::Complete(candidate) => write!(f, "{candidate}"),
        }
    }
}

/// Selector function of `depend`.
pub type SelectorFn = Arc<dyn Fn(&Value) -> Result<Candidate> + Send + Sync>;

/// Chooses a schema from the value of a sibling field.
#[derive(Clone)]
pub enum Selector {
    /// Completed by the sibling value as its last argument.
    Partial(Partial),
    Function(SelectorFn),
}

impl Selector {
    pub fn function<F>(select: F) -> Self
    where
        F: Fn(&Value) -> Result<Candidate> + Send + Sync + 'static,
    {
        Selector::Function(Arc::new(select))
    }

    pub fn select(&self, value: &Value) -> Result<Candidate> {
        match self {
            Selector::Partial(partial) => partial
                .apply([Arg::Value(value.clone())])?
                .into_candidate(),
            Selector::Function(select) => select(value),
        }
    }
}

impl From<Partial> for Selector {
    fn from(value: Partial) -> Self {
        Selector::Partial(value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Partial(partial) => write!(f, "{partial}"),
            Selector::Function(_) => f.write_str("$fn"),
        }
    }
}
