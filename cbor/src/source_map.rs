//! Byte-range records for hex-to-value visualization.

/// One decoded node and the input bytes that produced it.
///
/// `path` is the node's stable identifier: `""` for the root, then `[i]` per
/// array element and `.key` (text keys) or `[<diag>]` (other keys) per map
/// value. A tagged value and its content are a single node spanning the tag
/// header through the end of the content; map keys are not separately
/// addressable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceMapEntry {
    pub path: String,
    /// Offset of the node's first byte.
    pub start: u32,
    /// Offset one past the node's last byte.
    pub end: u32,
    /// Major type of the node's initial byte.
    pub major_type: u8,
    pub type_label: &'static str,
    /// Diagnostic notation, truncated to a fixed budget.
    pub value_repr: String,
    /// `None` for the root.
    pub parent: Option<String>,
    /// Paths of child nodes, in input order.
    pub children: Vec<String>,
}

/// Builds the entry list in pre-order: an entry is appended when its node's
/// first byte is reached, and filled in once the node has been fully parsed.
pub(crate) struct Recorder {
    entries: Vec<SourceMapEntry>,
    open: Vec<usize>,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder {
            entries: Vec::new(),
            open: Vec::new(),
        }
    }

    pub fn open(&mut self, path: String, start: usize) -> usize {
        let parent = self.open.last().map(|&i| {
            self.entries[i].children.push(path.clone());
            self.entries[i].path.clone()
        });
        let index = self.entries.len();
        self.entries.push(SourceMapEntry {
            path,
            start: start as u32,
            end: start as u32,
            major_type: 0,
            type_label: "",
            value_repr: String::new(),
            parent,
            children: Vec::new(),
        });
        self.open.push(index);
        index
    }

    pub fn close(
        &mut self,
        index: usize,
        end: usize,
        major_type: u8,
        type_label: &'static str,
        value_repr: String,
    ) {
        debug_assert_eq!(self.open.last(), Some(&index));
        let entry = &mut self.entries[index];
        entry.end = end as u32;
        entry.major_type = major_type;
        entry.type_label = type_label;
        entry.value_repr = value_repr;
        self.open.pop();
    }

    pub fn into_entries(self) -> Vec<SourceMapEntry> {
        self.entries
    }
}
