//! Writing: the tree walker and the [`NbtWriter`] entry point.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::GzEncoder;

use crate::error::{Error, Result};
use crate::value::Value;
use crate::{mutf8, xml, Tag};

pub(crate) trait WriteNbt: Write {
    fn write_tag(&mut self, tag: Tag) -> Result<()> {
        self.write_u8(tag as u8)?;
        Ok(())
    }

    /// Length-prefixed Modified UTF-8. The u16 prefix counts encoded
    /// bytes, not characters, so the limit check happens after encoding.
    fn write_nbt_string(&mut self, s: &str) -> Result<()> {
        let encoded = mutf8::encode(s);
        let len: u16 = encoded.len().try_into().map_err(|_| {
            Error::out_of_range(format!(
                "string encodes to {} bytes, limit is 65535",
                encoded.len()
            ))
        })?;
        self.write_u16::<BigEndian>(len)?;
        self.write_all(&encoded)?;
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len: i32 = len
            .try_into()
            .map_err(|_| Error::out_of_range(format!("length {len} does not fit in i32")))?;
        self.write_i32::<BigEndian>(len)?;
        Ok(())
    }
}

impl<T> WriteNbt for T where T: Write {}

/// Emit a value's payload. Compound entries are `kind, name, payload`
/// runs closed by an End byte; list elements are bare payloads.
pub(crate) fn write_value<W: Write>(out: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::Int8(v) => out.write_i8(*v)?,
        Value::Int16(v) => out.write_i16::<BigEndian>(*v)?,
        Value::Int32(v) => out.write_i32::<BigEndian>(*v)?,
        Value::Int64(v) => out.write_i64::<BigEndian>(*v)?,
        Value::Float32(v) => out.write_f32::<BigEndian>(*v)?,
        Value::Float64(v) => out.write_f64::<BigEndian>(*v)?,
        Value::String(s) => out.write_nbt_string(s)?,
        Value::Int8Array(v) => {
            out.write_len(v.len())?;
            for b in v {
                out.write_i8(*b)?;
            }
        }
        Value::Int32Array(v) => {
            out.write_len(v.len())?;
            for i in v {
                out.write_i32::<BigEndian>(*i)?;
            }
        }
        Value::Int64Array(v) => {
            out.write_len(v.len())?;
            for i in v {
                out.write_i64::<BigEndian>(*i)?;
            }
        }
        Value::List(content, items) => {
            // An element disagreeing with the declared content kind is
            // refused rather than silently re-typed. End content can only
            // ever pass this check empty.
            for item in items {
                if item.tag() != *content {
                    return Err(Error::ListContentMismatch);
                }
            }
            out.write_tag(*content)?;
            out.write_len(items.len())?;
            for item in items {
                write_value(out, item)?;
            }
        }
        Value::Compound(compound) => {
            for (name, child) in compound.iter() {
                out.write_tag(child.tag())?;
                out.write_nbt_string(name)?;
                write_value(out, child)?;
            }
            out.write_tag(Tag::End)?;
        }
    }
    Ok(())
}

enum Output<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Write for Output<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Output::Plain(w) => w.write(buf),
            Output::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Output::Plain(w) => w.flush(),
            Output::Gzip(w) => w.flush(),
        }
    }
}

/// Writes NBT documents to a byte sink, optionally GZip-compressed.
///
/// The writer owns the sink; call [`finish`](NbtWriter::finish) to
/// complete the GZip member (when compressing) and get the sink back.
/// No guarantee is made about partial output once a write fails.
pub struct NbtWriter<W: Write> {
    out: Output<W>,
}

impl<W: Write> NbtWriter<W> {
    pub fn open(sink: W, compressed: bool) -> Self {
        let out = if compressed {
            Output::Gzip(GzEncoder::new(sink, flate2::Compression::default()))
        } else {
            Output::Plain(sink)
        };
        NbtWriter { out }
    }

    /// Write a named root: kind byte, name, payload. Minecraft-style
    /// files use the empty name.
    pub fn write_tree(&mut self, name: &str, root: &Value) -> Result<()> {
        self.out.write_tag(root.tag())?;
        self.out.write_nbt_string(name)?;
        write_value(&mut self.out, root)
    }

    /// Write an unnamed root: kind byte then payload, as embedded in
    /// network frames.
    pub fn write_bare_tree(&mut self, root: &Value) -> Result<()> {
        self.out.write_tag(root.tag())?;
        write_value(&mut self.out, root)
    }

    /// Write the document an XML element tree describes. The root is
    /// named iff the element carries a `Name` attribute.
    pub fn write_xml(&mut self, root: &xml::Element) -> Result<()> {
        let (name, value) = xml::from_element(root)?;
        match name {
            Some(name) => self.write_tree(&name, &value),
            None => self.write_bare_tree(&value),
        }
    }

    /// Flush everything, complete the GZip member if compressing, and
    /// return the sink.
    pub fn finish(self) -> Result<W> {
        match self.out {
            Output::Plain(w) => Ok(w),
            Output::Gzip(enc) => Ok(enc.finish()?),
        }
    }
}
