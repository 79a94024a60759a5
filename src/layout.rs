//! tmux layout descriptor parsing
//!
//! tmux describes a window's pane geometry with a compact string such as
//! `b25f,159x48,0,0{79x48,0,0,1,79x48,80,0,2}`:
//!
//! - `b25f,` = optional 4-hex-digit checksum, ignored
//! - `159x48,0,0` = cell dimensions and position of the node
//! - `,1` = pane ID, for a leaf
//! - `{...}` = panes side by side (horizontal split)
//! - `[...]` = panes stacked top to bottom (vertical split)
//!
//! Children of a group are full descriptors separated by commas, so the
//! parser is a recursive-descent cursor rather than a comma split.

use crate::types::TmuxPaneId;
use std::collections::HashSet;

/// Direction in which a split arranges its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitAxis {
    /// Children side by side, left to right (`{...}`, `split-window -h`)
    Horizontal,
    /// Children stacked, top to bottom (`[...]`, `split-window -v`)
    Vertical,
}

/// Position and size of a layout node, in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub x: usize,
    pub y: usize,
}

/// A node in the tmux layout tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutNode {
    /// A single pane
    Leaf {
        width: usize,
        height: usize,
        x: usize,
        y: usize,
        pane_id: TmuxPaneId,
    },
    /// Children side by side, in left-to-right order
    HorizontalSplit {
        width: usize,
        height: usize,
        x: usize,
        y: usize,
        children: Vec<LayoutNode>,
    },
    /// Children stacked, in top-to-bottom order
    VerticalSplit {
        width: usize,
        height: usize,
        x: usize,
        y: usize,
        children: Vec<LayoutNode>,
    },
}

impl LayoutNode {
    /// Parse a layout descriptor; see [`LayoutParser::parse`].
    pub fn parse(descriptor: &str) -> Option<Self> {
        LayoutParser::parse(descriptor)
    }

    /// Geometry of this node
    pub fn geometry(&self) -> Geometry {
        match *self {
            Self::Leaf {
                width,
                height,
                x,
                y,
                ..
            }
            | Self::HorizontalSplit {
                width,
                height,
                x,
                y,
                ..
            }
            | Self::VerticalSplit {
                width,
                height,
                x,
                y,
                ..
            } => Geometry {
                width,
                height,
                x,
                y,
            },
        }
    }

    /// Split axis of this node, `None` for a leaf
    pub fn axis(&self) -> Option<SplitAxis> {
        match self {
            Self::Leaf { .. } => None,
            Self::HorizontalSplit { .. } => Some(SplitAxis::Horizontal),
            Self::VerticalSplit { .. } => Some(SplitAxis::Vertical),
        }
    }

    /// Child nodes, empty for a leaf
    pub fn children(&self) -> &[LayoutNode] {
        match self {
            Self::Leaf { .. } => &[],
            Self::HorizontalSplit { children, .. } | Self::VerticalSplit { children, .. } => {
                children
            }
        }
    }

    /// Pane ID if this node is a leaf
    pub fn pane_id(&self) -> Option<TmuxPaneId> {
        match self {
            Self::Leaf { pane_id, .. } => Some(*pane_id),
            _ => None,
        }
    }

    /// Every leaf's pane ID, depth first in descriptor order
    pub fn all_pane_ids(&self) -> Vec<TmuxPaneId> {
        let mut ids = Vec::new();
        self.collect_pane_ids(&mut ids);
        ids
    }

    fn collect_pane_ids(&self, ids: &mut Vec<TmuxPaneId>) {
        match self {
            Self::Leaf { pane_id, .. } => ids.push(*pane_id),
            _ => {
                for child in self.children() {
                    child.collect_pane_ids(ids);
                }
            }
        }
    }

    /// Whether the tree contains a leaf for `pane_id`
    pub fn contains_pane(&self, pane_id: TmuxPaneId) -> bool {
        self.find_pane(pane_id).is_some()
    }

    /// The leaf node for `pane_id`
    pub fn find_pane(&self, pane_id: TmuxPaneId) -> Option<&LayoutNode> {
        match self {
            Self::Leaf { pane_id: id, .. } if *id == pane_id => Some(self),
            Self::Leaf { .. } => None,
            _ => self
                .children()
                .iter()
                .find_map(|child| child.find_pane(pane_id)),
        }
    }

    /// Axis of the nearest split enclosing `pane_id`.
    ///
    /// Returns `None` when the pane is the sole root leaf or is not in the tree.
    pub fn parent_axis(&self, pane_id: TmuxPaneId) -> Option<SplitAxis> {
        let axis = self.axis()?;
        for child in self.children() {
            if child.pane_id() == Some(pane_id) {
                return Some(axis);
            }
            if let Some(nested) = child.parent_axis(pane_id) {
                return Some(nested);
            }
        }
        None
    }
}

/// Recursive-descent parser over a layout descriptor.
pub struct LayoutParser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

/// Deepest split nesting accepted. tmux layouts stay far below this; the
/// limit keeps hostile input from exhausting the stack.
const MAX_LAYOUT_DEPTH: usize = 64;

impl<'a> LayoutParser<'a> {
    /// Parse a tmux layout descriptor into a tree.
    ///
    /// Any malformation (empty input, unbalanced brackets, non-numeric
    /// fields, trailing text, a pane ID used twice) yields `None`; a
    /// partial tree is never returned.
    pub fn parse(descriptor: &str) -> Option<LayoutNode> {
        let descriptor = strip_checksum(descriptor.trim());
        if descriptor.is_empty() {
            return None;
        }

        let mut parser = LayoutParser {
            input: descriptor.as_bytes(),
            pos: 0,
            depth: 0,
        };
        let root = parser.parse_node()?;
        if parser.pos != parser.input.len() {
            return None;
        }

        let ids = root.all_pane_ids();
        let unique: HashSet<_> = ids.iter().collect();
        if unique.len() != ids.len() {
            crate::debug_error!("TMUX", "Layout lists a pane twice: {}", descriptor);
            return None;
        }

        Some(root)
    }

    /// `WIDTHxHEIGHT,X,Y` followed by `,PANE`, `{...}` or `[...]`
    fn parse_node(&mut self) -> Option<LayoutNode> {
        let width = self.parse_number()?;
        self.expect(b'x')?;
        let height = self.parse_number()?;
        self.expect(b',')?;
        let x = self.parse_number()?;
        self.expect(b',')?;
        let y = self.parse_number()?;

        match self.peek()? {
            b',' => {
                self.pos += 1;
                let pane_id = self.parse_number()? as TmuxPaneId;
                Some(LayoutNode::Leaf {
                    width,
                    height,
                    x,
                    y,
                    pane_id,
                })
            }
            b'{' => {
                self.pos += 1;
                let children = self.parse_children(b'}')?;
                Some(LayoutNode::HorizontalSplit {
                    width,
                    height,
                    x,
                    y,
                    children,
                })
            }
            b'[' => {
                self.pos += 1;
                let children = self.parse_children(b']')?;
                Some(LayoutNode::VerticalSplit {
                    width,
                    height,
                    x,
                    y,
                    children,
                })
            }
            _ => None,
        }
    }

    /// Comma-separated child descriptors up to and including `close`.
    fn parse_children(&mut self, close: u8) -> Option<Vec<LayoutNode>> {
        if self.depth >= MAX_LAYOUT_DEPTH {
            crate::debug_error!("TMUX", "Layout nested deeper than {}", MAX_LAYOUT_DEPTH);
            return None;
        }
        self.depth += 1;
        let children = self.parse_child_list(close);
        self.depth -= 1;
        children
    }

    fn parse_child_list(&mut self, close: u8) -> Option<Vec<LayoutNode>> {
        let mut children = Vec::new();
        loop {
            children.push(self.parse_node()?);
            match self.peek()? {
                b',' => self.pos += 1,
                c if c == close => {
                    self.pos += 1;
                    return Some(children);
                }
                _ => return None,
            }
        }
    }

    fn parse_number(&mut self) -> Option<usize> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        if self.peek()? == byte {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }
}

/// Drop a leading `xxxx,` checksum (four hex digits) if present.
fn strip_checksum(descriptor: &str) -> &str {
    let bytes = descriptor.as_bytes();
    if bytes.len() > 5 && bytes[4] == b',' && bytes[..4].iter().all(u8::is_ascii_hexdigit) {
        &descriptor[5..]
    } else {
        descriptor
    }
}
