//! Source buffers and locations.
//!
//! The crate parses one already-preprocessed translation unit, so the
//! location model is deliberately small: a buffer index, a byte offset, and a
//! length. Line and column are never stored on tokens; they are derived on
//! demand from the byte offset via per-file line-start tables.

use std::path::PathBuf;

/// Index of a registered source buffer. Slot 0 is the synthetic `<builtin>`
/// entry used for seeded typedef names and end-of-file fallbacks; real
/// buffers follow. A 16-bit index is plenty for a parser that sees one
/// translation unit at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceId(u16);

impl SourceId {
    pub(crate) const BUILTIN: SourceId = SourceId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A buffer plus a byte offset into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLoc {
    pub source_id: SourceId,
    pub offset: u32,
}

impl Default for SourceLoc {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceLoc {
    pub(crate) fn new(source_id: SourceId, offset: u32) -> Self {
        SourceLoc { source_id, offset }
    }

    /// Location in the synthetic builtin buffer.
    pub(crate) fn builtin() -> Self {
        SourceLoc::new(SourceId::BUILTIN, 0)
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// A contiguous byte range inside one source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    source_id: SourceId,
    offset: u32,
    length: u32,
}

impl Default for SourceSpan {
    fn default() -> Self {
        Self::empty()
    }
}

impl SourceSpan {
    pub(crate) fn new(start: SourceLoc, end: SourceLoc) -> Self {
        // A span cannot straddle buffers; without a preprocessor the only way
        // to ask for one is a bug upstream, so degrade to zero length.
        let length = if start.source_id == end.source_id {
            end.offset.saturating_sub(start.offset)
        } else {
            0
        };
        SourceSpan {
            source_id: start.source_id,
            offset: start.offset,
            length,
        }
    }

    pub(crate) fn empty() -> Self {
        SourceSpan::new(SourceLoc::builtin(), SourceLoc::builtin())
    }

    pub fn start(&self) -> SourceLoc {
        SourceLoc::new(self.source_id, self.offset)
    }

    pub fn end(&self) -> SourceLoc {
        SourceLoc::new(self.source_id, self.offset + self.length)
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    /// Smallest span covering both inputs. Spans from different buffers do
    /// not merge; the left-hand span wins.
    pub(crate) fn merge(self, other: SourceSpan) -> SourceSpan {
        if self.source_id != other.source_id {
            return self;
        }
        let offset = self.offset.min(other.offset);
        let end = (self.offset + self.length).max(other.offset + other.length);
        SourceSpan {
            source_id: self.source_id,
            offset,
            length: end - offset,
        }
    }
}

/// A registered source buffer with its line-start table.
struct SourceFile {
    path: PathBuf,
    buffer: Vec<u8>,
    // Byte offsets of the first character of every line, line_starts[0] == 0.
    line_starts: Vec<u32>,
}

/// Owns all source buffers and answers location queries.
pub struct SourceManager {
    files: Vec<SourceFile>,
}

impl Default for SourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceManager {
    pub fn new() -> Self {
        // Slot 0 is the builtin pseudo-file (seeded typedefs, synthetic EOF).
        SourceManager {
            files: vec![SourceFile {
                path: PathBuf::from("<builtin>"),
                buffer: Vec::new(),
                line_starts: vec![0],
            }],
        }
    }

    /// Register a source buffer and return its id.
    pub fn add_buffer(&mut self, path: impl Into<PathBuf>, text: impl Into<Vec<u8>>) -> SourceId {
        let buffer = text.into();
        let mut line_starts = vec![0u32];
        for (i, &b) in buffer.iter().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        self.files.push(SourceFile {
            path: path.into(),
            buffer,
            line_starts,
        });
        let id = self.files.len() - 1;
        assert!(id <= u16::MAX as usize, "too many source buffers");
        SourceId(id as u16)
    }

    pub fn get_buffer(&self, id: SourceId) -> &[u8] {
        &self.files[id.index()].buffer
    }

    pub fn get_path(&self, id: SourceId) -> &std::path::Path {
        &self.files[id.index()].path
    }

    /// 1-based line and column for a location.
    pub fn line_col(&self, loc: SourceLoc) -> (u32, u32) {
        let file = &self.files[loc.source_id.index()];
        let line_idx = match file.line_starts.binary_search(&loc.offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = loc.offset - file.line_starts[line_idx];
        (line_idx as u32 + 1, col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_lookup() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("test.c", "int a;\nint b;\n");
        assert_eq!(sm.line_col(SourceLoc::new(id, 0)), (1, 1));
        assert_eq!(sm.line_col(SourceLoc::new(id, 4)), (1, 5));
        assert_eq!(sm.line_col(SourceLoc::new(id, 7)), (2, 1));
        assert_eq!(sm.line_col(SourceLoc::new(id, 11)), (2, 5));
    }

    #[test]
    fn builtin_slot_is_reserved() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("test.c", "int a;");
        assert_ne!(id, SourceId::BUILTIN);
        assert_eq!(sm.line_col(SourceLoc::builtin()), (1, 1));
    }

    #[test]
    fn span_covers_its_range() {
        let id = SourceId(1);
        let span = SourceSpan::new(SourceLoc::new(id, 10), SourceLoc::new(id, 25));
        assert_eq!(span.start().offset, 10);
        assert_eq!(span.end().offset, 25);
        assert_eq!(span.source_id(), id);
    }

    #[test]
    fn merge_covers_both_spans() {
        let id = SourceId(1);
        let a = SourceSpan::new(SourceLoc::new(id, 10), SourceLoc::new(id, 12));
        let b = SourceSpan::new(SourceLoc::new(id, 20), SourceLoc::new(id, 30));
        let merged = a.merge(b);
        assert_eq!(merged.start().offset, 10);
        assert_eq!(merged.end().offset, 30);
    }

    #[test]
    fn cross_buffer_spans_degrade() {
        let a = SourceId(1);
        let b = SourceId(2);
        let span = SourceSpan::new(SourceLoc::new(a, 10), SourceLoc::new(b, 20));
        assert_eq!(span.start().offset, 10);
        assert_eq!(span.end().offset, 10);

        let left = SourceSpan::new(SourceLoc::new(a, 0), SourceLoc::new(a, 5));
        let right = SourceSpan::new(SourceLoc::new(b, 0), SourceLoc::new(b, 5));
        assert_eq!(left.merge(right), left);
    }
}
