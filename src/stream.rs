//! Filtered streaming of NBT data without materializing the whole tree.
//!
//! [`Nodes`] walks the document in pre-order and asks a [`NodeFilter`],
//! once per node, what to do with it: materialize it and yield it
//! ([`Decision::Accept`]), advance past it without building anything
//! ([`Decision::Ignore`]), or descend and ask again for each child
//! ([`Decision::TestChildren`]). The filter sees the node's header — kind,
//! name, list metadata — plus the stack of container ancestors, before any
//! payload bytes are touched, so skipping a hundred-megabyte array costs a
//! seek.
//!
//! Memory use is bounded by the depth of the spine being descended plus
//! whatever single subtree is currently being accepted.
//!
//! ```
//! use nbtx::stream::filters;
//! use nbtx::{Compression, NbtReader, Value};
//! use std::io::Cursor;
//!
//! # fn main() -> nbtx::Result<()> {
//! // Compound "" { Int32 "answer" = 42 }
//! let bytes = [
//!     0x0A, 0x00, 0x00, // Compound, name ""
//!     0x03, 0x00, 0x06, b'a', b'n', b's', b'w', b'e', b'r', // Int32 "answer"
//!     0x00, 0x00, 0x00, 0x2A, // 42
//!     0x00, // End
//! ];
//!
//! let mut reader = NbtReader::open(Cursor::new(&bytes[..]), Compression::None)?;
//! let found: Vec<_> = reader
//!     .read_filtered(filters::name_anywhere("answer"), true)
//!     .collect::<nbtx::Result<Vec<_>>>()?;
//!
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].value, Value::Int32(42));
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Seek};

use crate::error::{Error, Result};
use crate::io::Input;
use crate::read::{
    read_list_header, read_list_payload, read_string, read_tag, read_value, skip_list_payload,
    skip_value,
};
use crate::value::Node;
use crate::Tag;

/// What the traversal should do with the node just presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Skip the node's payload entirely; nothing is built.
    Ignore,
    /// Materialize the node (subtree and all) and yield it. The filter is
    /// not consulted for its descendants, and iteration resumes at the
    /// node's successor.
    Accept,
    /// Descend into a container and present each child in turn. On a
    /// non-container this is the same as `Ignore`.
    TestChildren,
}

/// A node whose header has been read but whose payload has not: its kind,
/// its name (absent for list elements and unnamed roots), and, for lists,
/// the declared content kind and length.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHead {
    pub tag: Tag,
    pub name: Option<String>,
    pub list: Option<(Tag, i32)>,
}

impl NodeHead {
    /// The node's name, or `""` if it has none. Convenient for path
    /// comparisons.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Decides, per node, whether the streaming reader materializes, skips,
/// or descends. `parents` is the container spine from the root down to
/// the node's immediate parent.
pub trait NodeFilter {
    fn decide(&mut self, parents: &[NodeHead], node: &NodeHead) -> Decision;
}

impl<F> NodeFilter for F
where
    F: FnMut(&[NodeHead], &NodeHead) -> Decision,
{
    fn decide(&mut self, parents: &[NodeHead], node: &NodeHead) -> Decision {
        self(parents, node)
    }
}

/// Ready-made filters.
pub mod filters {
    use super::{Decision, NodeFilter, NodeHead};

    /// Accept every node presented, which means yielding exactly the root.
    pub fn accept_all() -> impl NodeFilter {
        |_parents: &[NodeHead], _node: &NodeHead| Decision::Accept
    }

    /// Accept the node whose name path from the root equals `parts`
    /// exactly, descending only along matching prefixes. The root's name
    /// is the first part; Minecraft roots are usually named `""`.
    pub fn absolute_path<I, S>(parts: I) -> impl NodeFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        move |parents: &[NodeHead], node: &NodeHead| {
            let depth = parents.len();
            if depth + 1 > parts.len() {
                return Decision::Ignore;
            }
            if node.name.as_deref() != Some(parts[depth].as_str()) {
                return Decision::Ignore;
            }
            if depth + 1 == parts.len() {
                Decision::Accept
            } else {
                Decision::TestChildren
            }
        }
    }

    /// Accept every node with the given name, wherever it sits; recurse
    /// into everything else.
    pub fn name_anywhere(name: impl Into<String>) -> impl NodeFilter {
        let name = name.into();
        move |_parents: &[NodeHead], node: &NodeHead| {
            if node.name.as_deref() == Some(name.as_str()) {
                Decision::Accept
            } else {
                Decision::TestChildren
            }
        }
    }
}

/// Iterator over the nodes a filter accepts, in pre-order.
///
/// Produced by [`NbtReader::read_filtered`](crate::NbtReader::read_filtered).
/// The first error fuses the iterator; the underlying reader is left at an
/// unspecified position and should be discarded.
pub struct Nodes<'r, R: Read + Seek, F> {
    input: &'r mut Input<R>,
    filter: F,
    has_name: bool,
    started: bool,
    done: bool,
    /// Containers currently being iterated, root first. Presented to the
    /// filter as the parent stack.
    parents: Vec<NodeHead>,
    /// Elements left to yield for List frames, in lockstep with
    /// `parents`. Compound frames hold -1; they end on the End byte
    /// instead of a count.
    cursors: Vec<i32>,
}

impl<'r, R: Read + Seek, F: NodeFilter> Nodes<'r, R, F> {
    pub(crate) fn new(input: &'r mut Input<R>, filter: F, has_name: bool) -> Self {
        Nodes {
            input,
            filter,
            has_name,
            started: false,
            done: false,
            parents: Vec::new(),
            cursors: Vec::new(),
        }
    }

    fn advance(&mut self) -> Result<Option<Node>> {
        let mut pending = if self.started {
            None
        } else {
            self.started = true;
            Some(self.read_root()?)
        };

        loop {
            let head = match pending.take() {
                Some(head) => head,
                None => match self.next_child()? {
                    Some(head) => head,
                    None => return Ok(None),
                },
            };

            match self.filter.decide(&self.parents, &head) {
                Decision::Accept => {
                    let value = match head.list {
                        Some((content, len)) => read_list_payload(self.input, content, len)?,
                        None => read_value(self.input, head.tag)?,
                    };
                    return Ok(Some(Node {
                        name: head.name,
                        value,
                    }));
                }
                Decision::TestChildren if head.tag.is_container() => self.push_frame(head),
                Decision::TestChildren | Decision::Ignore => match head.list {
                    Some((content, len)) => skip_list_payload(self.input, content, len)?,
                    None => skip_value(self.input, head.tag)?,
                },
            }
        }
    }

    /// Produce the next child header of the innermost open container,
    /// popping exhausted containers as they finish. `None` means the
    /// whole document has been consumed.
    fn next_child(&mut self) -> Result<Option<NodeHead>> {
        loop {
            let list_content = match self.parents.last() {
                None => return Ok(None),
                Some(head) => head.list.map(|(content, _)| content),
            };

            match list_content {
                // List frame: a fixed count of nameless elements.
                Some(content) => {
                    let remaining = match self.cursors.last_mut() {
                        Some(r) => r,
                        None => unreachable!("cursor pushed with every frame"),
                    };
                    if *remaining == 0 {
                        self.pop_frame();
                        continue;
                    }
                    *remaining -= 1;
                    return Ok(Some(self.read_head(content, None)?));
                }
                // Compound frame: named children until the End byte.
                None => {
                    let tag = read_tag(self.input)?;
                    if tag == Tag::End {
                        self.pop_frame();
                        continue;
                    }
                    let name = read_string(self.input)?;
                    return Ok(Some(self.read_head(tag, Some(name))?));
                }
            }
        }
    }

    fn read_root(&mut self) -> Result<NodeHead> {
        let tag = read_tag(self.input)?;
        if tag == Tag::End {
            return Err(Error::format("end tag as document root"));
        }
        let name = if self.has_name {
            Some(read_string(self.input)?)
        } else {
            None
        };
        self.read_head(tag, name)
    }

    /// Complete a header whose kind and name are known by reading the
    /// list metadata, if any.
    fn read_head(&mut self, tag: Tag, name: Option<String>) -> Result<NodeHead> {
        let list = if tag == Tag::List {
            Some(read_list_header(self.input)?)
        } else {
            None
        };
        Ok(NodeHead { tag, name, list })
    }

    fn push_frame(&mut self, head: NodeHead) {
        self.cursors.push(head.list.map(|(_, len)| len).unwrap_or(-1));
        self.parents.push(head);
    }

    fn pop_frame(&mut self) {
        self.parents.pop();
        self.cursors.pop();
    }
}

impl<'r, R: Read + Seek, F: NodeFilter> Iterator for Nodes<'r, R, F> {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'r, R: Read + Seek, F: NodeFilter> std::iter::FusedIterator for Nodes<'r, R, F> {}
