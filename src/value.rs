//! The in-memory NBT tree: [`Value`], [`Compound`] and [`Node`].

use crate::Tag;

/// A complete NBT value. It owns its data; compounds and lists nest
/// recursively. There is no `End` variant — End is purely the wire
/// sentinel that terminates a compound, so it can never appear in a tree.
///
/// A `List` keeps the content kind it declared on the wire. That matters
/// only when the list is empty: historically encoders wrote both
/// `(End, 0)` and `(Int8, 0)` for empty lists, and keeping the kind lets a
/// decoded document re-encode to the identical bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Int8Array(Vec<i8>),
    String(String),
    List(Tag, Vec<Value>),
    Compound(Compound),
    Int32Array(Vec<i32>),
    Int64Array(Vec<i64>),
}

impl Value {
    /// The tag kind this value writes as.
    pub fn tag(&self) -> Tag {
        match self {
            Value::Int8(_) => Tag::Int8,
            Value::Int16(_) => Tag::Int16,
            Value::Int32(_) => Tag::Int32,
            Value::Int64(_) => Tag::Int64,
            Value::Float32(_) => Tag::Float32,
            Value::Float64(_) => Tag::Float64,
            Value::Int8Array(_) => Tag::Int8Array,
            Value::String(_) => Tag::String,
            Value::List(_, _) => Tag::List,
            Value::Compound(_) => Tag::Compound,
            Value::Int32Array(_) => Tag::Int32Array,
            Value::Int64Array(_) => Tag::Int64Array,
        }
    }

    /// An empty list. Written as `(End, 0)`, matching the reference
    /// encoder.
    pub fn empty_list() -> Value {
        Value::List(Tag::End, Vec::new())
    }

    /// Build a list from values, taking the content kind from the first
    /// element. Returns `None` if the elements are not homogeneous.
    pub fn list_of(items: Vec<Value>) -> Option<Value> {
        match items.first() {
            None => Some(Value::empty_list()),
            Some(first) => {
                let content = first.tag();
                if items.iter().all(|v| v.tag() == content) {
                    Some(Value::List(content, items))
                } else {
                    None
                }
            }
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int8(v) => Some(v as i64),
            Value::Int16(v) => Some(v as i64),
            Value::Int32(v) => Some(v as i64),
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float32(v) => Some(v as f64),
            Value::Float64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Value::Compound(c) => Some(c),
            _ => None,
        }
    }
}

macro_rules! from {
    ($type:ty, $variant:ident $(, $($part:tt)+)?) => {
        impl From<$type> for Value {
            fn from(val: $type) -> Self {
                Self::$variant(val$($($part)+)?)
            }
        }
    };
}
from!(i8, Int8);
from!(i16, Int16);
from!(i32, Int32);
from!(i64, Int64);
from!(f32, Float32);
from!(f64, Float64);
from!(String, String);
from!(&str, String, .to_owned());
from!(Vec<i8>, Int8Array);
from!(Vec<i32>, Int32Array);
from!(Vec<i64>, Int64Array);
from!(Compound, Compound);

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Self::Int8(i8::from(val))
    }
}

/// An insertion-ordered mapping of unique names to values.
///
/// NBT compounds are written back in the order they were read, which is
/// what makes decode-then-encode byte-exact; a hash map would shuffle the
/// entries. Lookups scan — compounds in real documents are small.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    entries: Vec<(String, Value)>,
}

impl Compound {
    pub fn new() -> Self {
        Compound::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Insert a value, replacing in place if the name already exists.
    /// Returns the previous value, if any. Replacement keeps the entry's
    /// original position, so names stay unique by construction.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Compound {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut c = Compound::new();
        for (name, value) in iter {
            c.insert(name, value);
        }
        c
    }
}

/// A value together with the name it carried, if it had one. Whole-tree
/// reads produce the root as a `Node`; the filtered reader yields every
/// accepted subtree as one. List elements have no name on the wire, so
/// `name` is `None` for them.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub value: Value,
}

impl Node {
    pub fn new(name: impl Into<Option<String>>, value: Value) -> Self {
        Node {
            name: name.into(),
            value,
        }
    }
}
