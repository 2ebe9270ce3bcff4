//! nbtx reads and writes the NBT format used by *Minecraft: Java Edition*
//! save files: a self-describing, tagged binary tree, optionally wrapped in
//! GZip.
//!
//! * For whole-tree reads and writes see [`NbtReader`] and [`NbtWriter`].
//! * For the in-memory tree see [`Value`] and [`Compound`].
//! * For selective, allocation-bounded reads of large files see
//!   [`NbtReader::read_filtered`] and the [`stream`] module.
//! * For the XML materialization see [`Element`] and
//!   [`NbtReader::read_xml`] / [`NbtWriter::write_xml`].
//!
//! ```toml
//! [dependencies]
//! nbtx = "0.1"
//! ```
//!
//! # Quick example
//!
//! Read a player dat file, print the inventory list, and write the tree
//! back out uncompressed:
//!
//! ```no_run
//! use nbtx::{Compression, NbtReader, NbtWriter, Value};
//!
//! fn main() -> nbtx::Result<()> {
//!     let file = std::fs::File::open("player.dat")?;
//!     let mut reader = NbtReader::open(file, Compression::Detect)?;
//!     let root = reader.read_tree(true)?;
//!
//!     if let Value::Compound(data) = &root.value {
//!         println!("{:?}", data.get("Inventory"));
//!     }
//!
//!     let out = std::fs::File::create("player-copy.dat")?;
//!     let mut writer = NbtWriter::open(out, false);
//!     writer.write_tree(root.name.as_deref().unwrap_or(""), &root.value)?;
//!     writer.finish()?;
//!     Ok(())
//! }
//! ```
//!
//! # Filtered streaming
//!
//! [`NbtReader::read_filtered`] walks the document without materializing
//! anything the supplied filter does not ask for. Skipped subtrees are
//! seeked over on seekable input, so pulling one string out of a file
//! containing megabytes of chunk data touches almost none of it:
//!
//! ```no_run
//! use nbtx::{stream::filters, Compression, NbtReader};
//!
//! # fn main() -> nbtx::Result<()> {
//! let file = std::fs::File::open("level.dat")?;
//! let mut reader = NbtReader::open(file, Compression::Detect)?;
//! for node in reader.read_filtered(filters::name_anywhere("LevelName"), true) {
//!     println!("{:?}", node?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Strings
//!
//! NBT does not use standard UTF-8 on the wire. Strings are encoded in the
//! JVM's "Modified UTF-8": NUL becomes the two-byte sequence `C0 80`, and
//! code points above the Basic Multilingual Plane are written as CESU-8
//! surrogate pairs. The [`mutf8`] module implements this codec directly;
//! feeding NBT strings through a standard UTF-8 routine silently corrupts
//! both cases.

pub mod error;
pub mod mutf8;
pub mod stream;
pub mod xml;

mod io;
mod read;
mod value;
mod write;

pub use error::{Error, Result};
pub use read::{Compression, NbtReader};
pub use value::{Compound, Node, Value};
pub use write::NbtWriter;
pub use xml::Element;

#[cfg(test)]
mod test;

use std::convert::TryFrom;

/// An NBT tag kind. This does not carry the value or the name of the data.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[repr(u8)]
pub enum Tag {
    /// Terminates a Compound on the wire. Never materialized as a value.
    End = 0,
    /// Single signed byte.
    Int8 = 1,
    /// Big-endian signed 16-bit integer.
    Int16 = 2,
    /// Big-endian signed 32-bit integer.
    Int32 = 3,
    /// Big-endian signed 64-bit integer.
    Int64 = 4,
    /// Big-endian IEEE 754 single.
    Float32 = 5,
    /// Big-endian IEEE 754 double.
    Float64 = 6,
    /// Length-prefixed run of signed bytes.
    Int8Array = 7,
    /// Length-prefixed Modified UTF-8 string.
    String = 8,
    /// Homogeneous sequence of bare payloads of a declared content kind.
    List = 9,
    /// Named entries terminated by an End byte.
    Compound = 10,
    /// Length-prefixed run of big-endian 32-bit integers.
    Int32Array = 11,
    /// Length-prefixed run of big-endian 64-bit integers.
    Int64Array = 12,
}

// Crates exist to generate this code for us, but would add to our compile
// times. The tag set is frozen, so writing it out is no burden.
impl TryFrom<u8> for Tag {
    type Error = ();

    fn try_from(value: u8) -> std::result::Result<Self, ()> {
        use Tag::*;
        Ok(match value {
            0 => End,
            1 => Int8,
            2 => Int16,
            3 => Int32,
            4 => Int64,
            5 => Float32,
            6 => Float64,
            7 => Int8Array,
            8 => String,
            9 => List,
            10 => Compound,
            11 => Int32Array,
            12 => Int64Array,
            13..=u8::MAX => return Err(()),
        })
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> Self {
        tag as u8
    }
}

impl Tag {
    /// The identifier used in the XML materialization, without the `T`
    /// element-name prefix.
    pub fn name(self) -> &'static str {
        match self {
            Tag::End => "End",
            Tag::Int8 => "Int8",
            Tag::Int16 => "Int16",
            Tag::Int32 => "Int32",
            Tag::Int64 => "Int64",
            Tag::Float32 => "Float32",
            Tag::Float64 => "Float64",
            Tag::Int8Array => "Int8Array",
            Tag::String => "String",
            Tag::List => "List",
            Tag::Compound => "Compound",
            Tag::Int32Array => "Int32Array",
            Tag::Int64Array => "Int64Array",
        }
    }

    /// Parse the XML identifier back into a kind.
    pub fn from_name(name: &str) -> Option<Tag> {
        Some(match name {
            "End" => Tag::End,
            "Int8" => Tag::Int8,
            "Int16" => Tag::Int16,
            "Int32" => Tag::Int32,
            "Int64" => Tag::Int64,
            "Float32" => Tag::Float32,
            "Float64" => Tag::Float64,
            "Int8Array" => Tag::Int8Array,
            "String" => Tag::String,
            "List" => Tag::List,
            "Compound" => Tag::Compound,
            "Int32Array" => Tag::Int32Array,
            "Int64Array" => Tag::Int64Array,
            _ => return None,
        })
    }

    /// Payload size in bytes for kinds whose payload is a single
    /// fixed-width primitive.
    pub(crate) fn fixed_size(self) -> Option<u64> {
        match self {
            Tag::Int8 => Some(1),
            Tag::Int16 => Some(2),
            Tag::Int32 | Tag::Float32 => Some(4),
            Tag::Int64 | Tag::Float64 => Some(8),
            _ => None,
        }
    }

    pub(crate) fn is_container(self) -> bool {
        matches!(self, Tag::List | Tag::Compound)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
