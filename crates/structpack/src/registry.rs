//! Name table, resolution patterns and the `pack`/`unpack` entry points.

use std::{collections::HashSet, sync::Arc};

use indexmap::IndexMap;
use log::{Level, debug, log_enabled, trace};

use crate::{
    bytes::Cursor,
    context::Context,
    errors::{Error, Result},
    number::Number,
    options::{Options, OptionsDef},
    schema::{Candidate, Count, Schema, SchemaRef},
    string,
    value::Value,
};

/// A resolution rule: rewrites a candidate into another candidate, or
/// returns `None` when it does not apply.
pub type Pattern = Arc<dyn Fn(&Registry, &Candidate) -> Option<Candidate> + Send + Sync>;

#[derive(Clone)]
enum Entry {
    Schema(SchemaRef),
    Alias(String),
}

/// Schema table plus the ordered resolution patterns.
///
/// Registration takes `&mut self`; packing and unpacking only need `&self`, so
/// a registry built during setup can be shared across threads afterwards.
#[derive(Clone)]
pub struct Registry {
    entries: IndexMap<String, Entry>,
    patterns: Vec<Pattern>,
    defaults: Options,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry holding the numeric primitives, their aliases, the string
    /// presets and the built-in patterns.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.patterns.push(Arc::new(alias_pattern));
        registry.patterns.push(Arc::new(layout_pattern));
        registry.patterns.push(Arc::new(array_shorthand_pattern));

        for number in Number::ALL {
            registry.register(number.name(), number);
            for alias in number.aliases() {
                registry.alias(*alias, number.name());
            }
        }
        string::install_presets(&mut registry);

        registry
    }

    /// A registry with no names and no patterns.
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
            patterns: vec![],
            defaults: Options::default(),
        }
    }

    /// Registers `schema` under `name`, silently replacing any previous entry.
    /// A bare name registers an alias.
    pub fn register(&mut self, name: impl Into<String>, schema: impl Into<Candidate>) -> &mut Self {
        let name = name.into();
        let entry = match schema.into() {
            Candidate::Name(target) => Entry::Alias(target),
            Candidate::Fields(layout) => Entry::Schema(Arc::new(Schema::Object(layout))),
            Candidate::Schema(schema) => Entry::Schema(schema),
        };
        debug!("registered `{name}`");
        self.entries.insert(name, entry);
        self
    }

    pub fn alias(&mut self, name: impl Into<String>, target: impl Into<String>) -> &mut Self {
        let (name, target) = (name.into(), target.into());
        debug!("aliased `{name}` to `{target}`");
        self.entries.insert(name, Entry::Alias(target));
        self
    }

    /// Appends a resolution pattern; it runs after every existing one.
    pub fn push_pattern<F>(&mut self, pattern: F) -> &mut Self
    where
        F: Fn(&Registry, &Candidate) -> Option<Candidate> + Send + Sync + 'static,
    {
        debug!("pushed resolution pattern #{}", self.patterns.len());
        self.patterns.push(Arc::new(pattern));
        self
    }

    /// Runs a plugin that registers its own schemas and patterns.
    pub fn install(&mut self, plugin: impl FnOnce(&mut Registry)) -> &mut Self {
        plugin(self);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolves a registered name to a schema candidate.
    pub fn schema(&self, name: &str) -> Result<Candidate> {
        self.resolve(&Candidate::from(name)).map(Candidate::Schema)
    }

    pub fn default_options(&self) -> &Options {
        &self.defaults
    }

    pub fn set_default_options(&mut self, options: Options) -> &mut Self {
        self.defaults = options;
        self
    }

    /// The default options with caller overrides applied.
    pub fn options(&self, overrides: &OptionsDef) -> Result<Options> {
        self.defaults.merged(overrides)
    }

    /// Rewrites `candidate` through the patterns until a schema emerges.
    ///
    /// After a pattern rewrites the candidate the scan restarts from the first
    /// pattern, skipping the one that just fired. A candidate that comes back
    /// around is a cycle and fails like an unknown name.
    pub fn resolve(&self, candidate: &Candidate) -> Result<SchemaRef> {
        if let Candidate::Schema(schema) = candidate {
            return Ok(schema.clone());
        }

        let mut current = candidate.clone();
        let mut seen: Option<HashSet<String>> = None;
        let mut fired = None;
        let mut i = 0;
        while i < self.patterns.len() {
            if fired == Some(i) {
                i += 1;
                continue;
            }
            let Some(next) = (self.patterns[i])(self, &current) else {
                i += 1;
                continue;
            };
            if let Candidate::Schema(schema) = next {
                return Ok(schema);
            }

            let seen = seen.get_or_insert_with(|| HashSet::from([current.to_string()]));
            if !seen.insert(next.to_string()) {
                debug!("resolution of `{}` cycles at `{next}`", candidate.identifier());
                break;
            }
            current = next;
            fired = Some(i);
            i = 0;
        }

        debug!("`{}` did not resolve", candidate.identifier());
        Err(Error::UnregisteredSchema(candidate.identifier()))
    }

    pub fn pack(&self, schema: impl Into<Candidate>, value: &Value) -> Result<Vec<u8>> {
        self.pack_with(schema, value, &self.defaults)
    }

    pub fn pack_with(
        &self,
        schema: impl Into<Candidate>,
        value: &Value,
        options: &Options,
    ) -> Result<Vec<u8>> {
        let schema = schema.into();
        if log_enabled!(Level::Trace) {
            trace!("pack {schema} (little_endian: {})", options.little_endian);
        }

        let mut out = vec![];
        Context::new(self, options).pack(&schema, value, &mut out)?;

        Ok(out)
    }

    pub fn unpack(&self, schema: impl Into<Candidate>, data: impl AsRef<[u8]>) -> Result<Value> {
        self.unpack_with(schema, data, &self.defaults)
    }

    pub fn unpack_with(
        &self,
        schema: impl Into<Candidate>,
        data: impl AsRef<[u8]>,
        options: &Options,
    ) -> Result<Value> {
        let schema = schema.into();
        let data = data.as_ref();
        if log_enabled!(Level::Trace) {
            trace!(
                "unpack {schema} from {} bytes (little_endian: {})",
                data.len(),
                options.little_endian
            );
        }

        let mut cursor = Cursor::new(data);
        Context::new(self, options).unpack(&schema, &mut cursor)
    }
}

/// Follows registered names and aliases. An alias chain that revisits a name
/// resolves to nothing.
fn alias_pattern(registry: &Registry, candidate: &Candidate) -> Option<Candidate> {
    let Candidate::Name(start) = candidate else {
        return None;
    };

    let mut visited = HashSet::from([start.as_str()]);
    let mut name = start.as_str();
    loop {
        match registry.entries.get(name) {
            Some(Entry::Schema(schema)) => return Some(Candidate::Schema(schema.clone())),
            Some(Entry::Alias(target)) => {
                if !visited.insert(target.as_str()) {
                    return None;
                }
                name = target.as_str();
            }
            None if name != start => return Some(Candidate::Name(name.to_string())),
            None => return None,
        }
    }
}

/// A raw field layout is an implicit `object`.
fn layout_pattern(_: &Registry, candidate: &Candidate) -> Option<Candidate> {
    match candidate {
        Candidate::Fields(layout) => Some(Schema::Object(layout.clone()).into()),
        _ => None,
    }
}

/// `item[N]` is a static array; `item[.]`, `item[..]` and `item[....]` are
/// arrays prefixed with a uint8, uint16 or uint32 count.
fn array_shorthand_pattern(_: &Registry, candidate: &Candidate) -> Option<Candidate> {
    let Candidate::Name(name) = candidate else {
        return None;
    };
    let (item, rest) = name.strip_suffix(']')?.split_once('[')?;
    if item.is_empty() || !item.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    let count = match rest {
        "." => Count::Prefixed(Number::Uint8.into()),
        ".." => Count::Prefixed(Number::Uint16.into()),
        "...." => Count::Prefixed(Number::Uint32.into()),
        digits if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            Count::Static(digits.parse().ok()?)
        }
        _ => return None,
    };

    Some(
        Schema::Array {
            item: item.into(),
            count,
        }
        .into(),
    )
}
