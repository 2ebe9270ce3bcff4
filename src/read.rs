//! Reading: the per-kind dispatcher and the [`NbtReader`] entry point.
//!
//! Each tag kind supports three operations against the stream: read its
//! metadata (only lists have any), materialize its payload, or skip its
//! payload. Skips never allocate for the skipped data; on seekable input
//! they turn into native seeks.

use std::io::{Read, Seek};

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::io::Input;
use crate::stream::{NodeFilter, Nodes};
use crate::value::{Compound, Node, Value};
use crate::{mutf8, xml, Tag};

/// How [`NbtReader::open`] treats the byte source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// The stream is raw NBT.
    None,
    /// The stream is a GZip member wrapping NBT.
    Gzip,
    /// Probe the first two bytes for the GZip magic (`1F 8B`), rewind,
    /// and pick accordingly. Requires the probe's seek.
    Detect,
}

/// Reads NBT documents from a seekable byte source.
///
/// The reader owns the source for its lifetime; dropping the reader (or
/// calling [`into_inner`](NbtReader::into_inner)) releases it. A reader is
/// not meant for use from multiple threads — every operation takes
/// `&mut self`.
pub struct NbtReader<R: Read + Seek> {
    input: Input<R>,
}

impl<R: Read + Seek> NbtReader<R> {
    /// Create a reader over `source`, decompressing according to
    /// `compression`.
    pub fn open(source: R, compression: Compression) -> Result<Self> {
        let input = match compression {
            Compression::None => Input::plain(source),
            Compression::Gzip => Input::gzip(source),
            Compression::Detect => Input::detect(source)?,
        };
        Ok(NbtReader { input })
    }

    /// Read the whole document as a tree. `has_name` says whether the
    /// root carries a name on the wire; Minecraft files always name their
    /// root (usually `""`), embedded network NBT does not. The root kind
    /// is not constrained — non-compound roots are legal.
    pub fn read_tree(&mut self, has_name: bool) -> Result<Node> {
        let (tag, name) = self.read_root_header(has_name)?;
        let value = read_value(&mut self.input, tag)?;
        Ok(Node { name, value })
    }

    /// Read the whole document and materialize it as an XML element tree
    /// per the bridge mapping. The root element carries a `Name`
    /// attribute iff `has_name`.
    pub fn read_xml(&mut self, has_name: bool) -> Result<xml::Element> {
        let node = self.read_tree(has_name)?;
        Ok(xml::to_element(&node.value, node.name.as_deref()))
    }

    /// Lazily read nodes the filter accepts, skipping everything else.
    /// See the [`stream`](crate::stream) module for the traversal rules.
    pub fn read_filtered<F: NodeFilter>(&mut self, filter: F, has_name: bool) -> Nodes<'_, R, F> {
        Nodes::new(&mut self.input, filter, has_name)
    }

    /// Consume the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }

    fn read_root_header(&mut self, has_name: bool) -> Result<(Tag, Option<String>)> {
        let tag = read_tag(&mut self.input)?;
        if tag == Tag::End {
            return Err(Error::format("end tag as document root"));
        }
        let name = if has_name {
            Some(read_string(&mut self.input)?)
        } else {
            None
        };
        Ok((tag, name))
    }
}

pub(crate) fn read_tag<R: Read + Seek>(input: &mut Input<R>) -> Result<Tag> {
    let b = input.read_u8()?;
    Tag::try_from(b).map_err(|_| Error::InvalidTagKind(b))
}

pub(crate) fn read_string<R: Read + Seek>(input: &mut Input<R>) -> Result<String> {
    let len = input.read_u16::<BigEndian>()? as usize;
    let mut buf = vec![0; len];
    input.read_exact(&mut buf[..])?;
    Ok(mutf8::decode(&buf)?.into_owned())
}

/// List metadata: the content kind byte and the element count.
pub(crate) fn read_list_header<R: Read + Seek>(input: &mut Input<R>) -> Result<(Tag, i32)> {
    let content = read_tag(input)?;
    let len = input.read_i32::<BigEndian>()?;
    if len < 0 {
        return Err(Error::out_of_range(format!("negative list length {len}")));
    }
    if content == Tag::End && len > 0 {
        return Err(Error::ListContentMismatch);
    }
    Ok((content, len))
}

fn read_array_len<R: Read + Seek>(input: &mut Input<R>) -> Result<i32> {
    let len = input.read_i32::<BigEndian>()?;
    if len < 0 {
        return Err(Error::out_of_range(format!("negative array length {len}")));
    }
    Ok(len)
}

/// Fully materialize a payload of the given kind, metadata included.
pub(crate) fn read_value<R: Read + Seek>(input: &mut Input<R>, tag: Tag) -> Result<Value> {
    match tag {
        Tag::End => Err(Error::format("end tag in value position")),
        Tag::Int8 => Ok(Value::Int8(input.read_i8()?)),
        Tag::Int16 => Ok(Value::Int16(input.read_i16::<BigEndian>()?)),
        Tag::Int32 => Ok(Value::Int32(input.read_i32::<BigEndian>()?)),
        Tag::Int64 => Ok(Value::Int64(input.read_i64::<BigEndian>()?)),
        Tag::Float32 => Ok(Value::Float32(input.read_f32::<BigEndian>()?)),
        Tag::Float64 => Ok(Value::Float64(input.read_f64::<BigEndian>()?)),
        Tag::String => Ok(Value::String(read_string(input)?)),
        Tag::Int8Array => {
            let len = read_array_len(input)?;
            let mut buf = vec![0u8; len as usize];
            input.read_exact(&mut buf[..])?;
            Ok(Value::Int8Array(vec_u8_into_i8(buf)))
        }
        Tag::Int32Array => {
            let len = read_array_len(input)?;
            let mut buf = vec![0i32; len as usize];
            for slot in buf.iter_mut() {
                *slot = input.read_i32::<BigEndian>()?;
            }
            Ok(Value::Int32Array(buf))
        }
        Tag::Int64Array => {
            let len = read_array_len(input)?;
            let mut buf = vec![0i64; len as usize];
            for slot in buf.iter_mut() {
                *slot = input.read_i64::<BigEndian>()?;
            }
            Ok(Value::Int64Array(buf))
        }
        Tag::List => {
            let (content, len) = read_list_header(input)?;
            read_list_payload(input, content, len)
        }
        Tag::Compound => read_compound_payload(input),
    }
}

/// Materialize a list body whose metadata has already been read.
pub(crate) fn read_list_payload<R: Read + Seek>(
    input: &mut Input<R>,
    content: Tag,
    len: i32,
) -> Result<Value> {
    let mut items = Vec::with_capacity(len as usize);
    for _ in 0..len {
        items.push(read_value(input, content)?);
    }
    Ok(Value::List(content, items))
}

/// Materialize a compound body: `(kind, name, payload)` entries up to the
/// End byte, names unique.
pub(crate) fn read_compound_payload<R: Read + Seek>(input: &mut Input<R>) -> Result<Value> {
    let mut compound = Compound::new();
    loop {
        let tag = read_tag(input)?;
        if tag == Tag::End {
            break;
        }
        let name = read_string(input)?;
        if compound.contains(&name) {
            return Err(Error::DuplicateName(name));
        }
        let value = read_value(input, tag)?;
        compound.insert(name, value);
    }
    Ok(Value::Compound(compound))
}

/// Advance past a payload of the given kind without constructing it.
pub(crate) fn skip_value<R: Read + Seek>(input: &mut Input<R>, tag: Tag) -> Result<()> {
    match tag {
        Tag::End => Err(Error::format("end tag in value position")),
        Tag::Int8 => input.skip(1),
        Tag::Int16 => input.skip(2),
        Tag::Int32 | Tag::Float32 => input.skip(4),
        Tag::Int64 | Tag::Float64 => input.skip(8),
        Tag::String => {
            let len = input.read_u16::<BigEndian>()?;
            input.skip(u64::from(len))
        }
        Tag::Int8Array => {
            let len = read_array_len(input)?;
            input.skip(len as u64)
        }
        Tag::Int32Array => {
            let len = read_array_len(input)?;
            input.skip(len as u64 * 4)
        }
        Tag::Int64Array => {
            let len = read_array_len(input)?;
            input.skip(len as u64 * 8)
        }
        Tag::List => {
            let (content, len) = read_list_header(input)?;
            skip_list_payload(input, content, len)
        }
        Tag::Compound => skip_compound_payload(input),
    }
}

pub(crate) fn skip_list_payload<R: Read + Seek>(
    input: &mut Input<R>,
    content: Tag,
    len: i32,
) -> Result<()> {
    // Fixed-width content collapses to a single bounded jump.
    if let Some(size) = content.fixed_size() {
        return input.skip(len as u64 * size);
    }
    for _ in 0..len {
        skip_value(input, content)?;
    }
    Ok(())
}

pub(crate) fn skip_compound_payload<R: Read + Seek>(input: &mut Input<R>) -> Result<()> {
    loop {
        let tag = read_tag(input)?;
        if tag == Tag::End {
            return Ok(());
        }
        // Child names are skipped, not decoded.
        let name_len = input.read_u16::<BigEndian>()?;
        input.skip(u64::from(name_len))?;
        skip_value(input, tag)?;
    }
}

/// Reinterpret the buffer in place; u8 and i8 share size and alignment.
/// `Vec::into_raw_parts` would express this directly but is unstable.
fn vec_u8_into_i8(v: Vec<u8>) -> Vec<i8> {
    let mut v = std::mem::ManuallyDrop::new(v);
    let (ptr, len, cap) = (v.as_mut_ptr(), v.len(), v.capacity());
    unsafe { Vec::from_raw_parts(ptr as *mut i8, len, cap) }
}
