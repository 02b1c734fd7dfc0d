//! Block-scope resolution
//!
//! Answers "is line L lexically inside a construct of kind K". Two strategies
//! sit behind [`ScopeResolver`]:
//!
//! - [`ScopeTree`]: a frame arena built in one forward pass over the line
//!   shapes. Each frame has a parent link, so containment is a walk up the
//!   chain from the innermost frame at the line.
//! - [`BackwardScan`]: the older depth-counting walk from the line back to the
//!   top of the file. Kept as a selectable reference strategy.

use serde::{Deserialize, Serialize};

use crate::syntax::{continuation_kind, BlockKind, LineShape};

/// Construct kinds a containment query can ask about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Function,
    Loop,
    ClassLike,
}

/// Which resolver the analyzer consults for containment queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeStrategy {
    #[default]
    Tree,
    BackwardScan,
}

impl ScopeStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => Some(ScopeStrategy::Tree),
            "backward-scan" | "backward_scan" | "scan" => Some(ScopeStrategy::BackwardScan),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScopeStrategy::Tree => "tree",
            ScopeStrategy::BackwardScan => "backward-scan",
        }
    }
}

/// Lexical containment oracle
pub trait ScopeResolver {
    /// Is `line` inside a construct of `kind`
    fn contains(&self, line: usize, kind: ScopeKind) -> bool;
}

impl<R: ScopeResolver + ?Sized> ScopeResolver for &R {
    fn contains(&self, line: usize, kind: ScopeKind) -> bool {
        (**self).contains(line, kind)
    }
}

/// Index of a frame in a [`ScopeTree`]
pub type FrameId = usize;

/// One block in the scope tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: BlockKind,
    pub name: Option<String>,
    pub header_line: usize,
    /// Line of the closing `end` (or the continuation that closed it)
    pub end_line: Option<usize>,
    pub parent: Option<FrameId>,
}

impl Frame {
    pub fn is_open(&self) -> bool {
        self.end_line.is_none()
    }
}

/// Frame arena built from line shapes
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    frames: Vec<Frame>,
    /// Innermost enclosing frame per line (`None` is file scope)
    innermost: Vec<Option<FrameId>>,
    /// Frame opened on each line
    opened: Vec<Option<FrameId>>,
}

impl ScopeTree {
    pub fn build(shapes: &[LineShape]) -> Self {
        let mut tree = ScopeTree {
            frames: Vec::new(),
            innermost: Vec::with_capacity(shapes.len()),
            opened: vec![None; shapes.len()],
        };
        let mut stack: Vec<FrameId> = Vec::new();

        for (line, shape) in shapes.iter().enumerate() {
            match shape {
                LineShape::Opener { kind, name } => {
                    let parent = stack.last().copied();
                    tree.innermost.push(parent);
                    let id = tree.push(*kind, name.clone(), line, parent);
                    stack.push(id);
                }
                LineShape::Continuation { keyword } => {
                    let top = stack.last().copied();
                    let continues = top.filter(|id| tree.frames[*id].kind.is_branching());
                    let parent = match continues {
                        Some(id) => {
                            stack.pop();
                            tree.frames[id].end_line = Some(line);
                            tree.frames[id].parent
                        }
                        None => top,
                    };
                    tree.innermost.push(parent);
                    let id = tree.push(continuation_kind(*keyword), None, line, parent);
                    stack.push(id);
                }
                LineShape::Terminator => {
                    let top = stack.pop();
                    tree.innermost.push(top);
                    if let Some(id) = top {
                        tree.frames[id].end_line = Some(line);
                    }
                }
                LineShape::Blank | LineShape::Statement => {
                    tree.innermost.push(stack.last().copied());
                }
            }
        }

        tree
    }

    fn push(
        &mut self,
        kind: BlockKind,
        name: Option<String>,
        line: usize,
        parent: Option<FrameId>,
    ) -> FrameId {
        let id = self.frames.len();
        self.frames.push(Frame {
            kind,
            name,
            header_line: line,
            end_line: None,
            parent,
        });
        self.opened[line] = Some(id);
        id
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id]
    }

    pub fn line_count(&self) -> usize {
        self.innermost.len()
    }

    /// Innermost frame enclosing a line. Header lines belong to the parent of
    /// the frame they open; `end` lines belong to the frame they close.
    pub fn innermost(&self, line: usize) -> Option<FrameId> {
        self.innermost.get(line).copied().flatten()
    }

    /// The frame a header line opens
    pub fn frame_opened_at(&self, line: usize) -> Option<FrameId> {
        self.opened.get(line).copied().flatten()
    }

    /// Frames from `start` up to the outermost ancestor
    pub fn ancestors(&self, start: Option<FrameId>) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: start,
        }
    }

    /// Nearest function or constructor frame around a line
    pub fn enclosing_function(&self, line: usize) -> Option<FrameId> {
        self.ancestors(self.innermost(line))
            .find(|id| self.frames[*id].kind.is_function())
    }

    /// Nearest class-like frame around a line
    pub fn enclosing_class(&self, line: usize) -> Option<FrameId> {
        self.ancestors(self.innermost(line))
            .find(|id| self.frames[*id].kind.is_class_like())
    }

    /// Is `ancestor` (or file scope for `None`) equal to or above `frame`
    pub fn is_ancestor_or_self(&self, ancestor: Option<FrameId>, frame: Option<FrameId>) -> bool {
        match ancestor {
            None => true,
            Some(target) => self.ancestors(frame).any(|id| id == target),
        }
    }

    /// Lines strictly between the header and its closing line
    pub fn body_lines(&self, id: FrameId) -> std::ops::Range<usize> {
        let frame = &self.frames[id];
        let end = frame.end_line.unwrap_or(self.innermost.len());
        (frame.header_line + 1)..end.max(frame.header_line + 1)
    }

    /// Frames never closed before end of file
    pub fn unclosed(&self) -> impl Iterator<Item = FrameId> + '_ {
        (0..self.frames.len()).filter(move |id| self.frames[*id].is_open())
    }

    pub fn has_unclosed(&self) -> bool {
        self.frames.iter().any(Frame::is_open)
    }

    /// Direct children of a frame (or of file scope)
    pub fn children(&self, parent: Option<FrameId>) -> impl Iterator<Item = FrameId> + '_ {
        (0..self.frames.len()).filter(move |id| self.frames[*id].parent == parent)
    }
}

impl ScopeResolver for ScopeTree {
    fn contains(&self, line: usize, kind: ScopeKind) -> bool {
        let mut passed_function = false;
        for id in self.ancestors(self.innermost(line)) {
            let frame_kind = self.frames[id].kind;
            match kind {
                ScopeKind::Function => {
                    if frame_kind.is_function() {
                        return true;
                    }
                    if frame_kind.is_class_like() {
                        return false;
                    }
                }
                ScopeKind::Loop => {
                    if frame_kind == BlockKind::Loop {
                        return true;
                    }
                    if frame_kind.is_function() || frame_kind.is_class_like() {
                        return false;
                    }
                }
                ScopeKind::ClassLike => {
                    if frame_kind.is_function() {
                        passed_function = true;
                    } else if frame_kind.is_class_like() {
                        return passed_function;
                    }
                }
            }
        }
        false
    }
}

/// Iterator over a frame and its parents
pub struct Ancestors<'t> {
    tree: &'t ScopeTree,
    next: Option<FrameId>,
}

impl Iterator for Ancestors<'_> {
    type Item = FrameId;

    fn next(&mut self) -> Option<FrameId> {
        let current = self.next?;
        self.next = self.tree.frames[current].parent;
        Some(current)
    }
}

/// Depth-counting backward walk over line shapes.
///
/// A ClassLike query matches the first class, enum or record header reached
/// at depth zero after a function header. The header's name is not compared
/// with anything, so the older name continuity check between the method and
/// its class is not performed.
#[derive(Debug, Clone, Copy)]
pub struct BackwardScan<'s> {
    shapes: &'s [LineShape],
}

impl<'s> BackwardScan<'s> {
    pub fn new(shapes: &'s [LineShape]) -> Self {
        Self { shapes }
    }
}

impl ScopeResolver for BackwardScan<'_> {
    fn contains(&self, line: usize, kind: ScopeKind) -> bool {
        let mut depth = 0usize;
        let mut passed_function = false;
        let end = line.min(self.shapes.len());

        for shape in self.shapes[..end].iter().rev() {
            let block = match shape {
                LineShape::Terminator => {
                    depth += 1;
                    continue;
                }
                LineShape::Opener { kind, .. } => *kind,
                // closes one branch and opens the next
                LineShape::Continuation { .. } | LineShape::Blank | LineShape::Statement => {
                    continue
                }
            };

            if depth > 0 {
                depth -= 1;
                continue;
            }

            match kind {
                ScopeKind::Function => {
                    if block.is_function() {
                        return true;
                    }
                    if block.is_class_like() {
                        return false;
                    }
                }
                ScopeKind::Loop => {
                    if block == BlockKind::Loop {
                        return true;
                    }
                    if block.is_function() || block.is_class_like() {
                        return false;
                    }
                }
                ScopeKind::ClassLike => {
                    if block.is_function() {
                        passed_function = true;
                    } else if block.is_class_like() {
                        return passed_function;
                    }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_line;
    use crate::syntax::classify;

    fn shapes(src: &str) -> Vec<LineShape> {
        src.lines().map(|l| classify(&lex_line(l))).collect()
    }

    const NESTED: &str = "\
class Shape:
    func area() -> Float:
        for i in items:
            if i > 0:
                break
            end
        end
        return 0.0
    end
end
this";

    #[test]
    fn test_tree_frames() {
        let tree = ScopeTree::build(&shapes(NESTED));
        assert_eq!(tree.frames().len(), 4);
        assert!(!tree.has_unclosed());
        assert_eq!(tree.innermost(0), None);
        assert_eq!(tree.innermost(4), Some(3));
        assert_eq!(tree.enclosing_function(4), Some(1));
        assert_eq!(tree.enclosing_class(7), Some(0));
        assert_eq!(tree.body_lines(1), 2..8);
    }

    #[test]
    fn test_tree_and_scan_agree_on_nested_code() {
        let shapes = shapes(NESTED);
        let tree = ScopeTree::build(&shapes);
        let scan = BackwardScan::new(&shapes);
        for (line, kind, expected) in [
            (4, ScopeKind::Loop, true),
            (4, ScopeKind::Function, true),
            (4, ScopeKind::ClassLike, true),
            (7, ScopeKind::Loop, false),
            (7, ScopeKind::Function, true),
            (10, ScopeKind::Function, false),
            (10, ScopeKind::ClassLike, false),
        ] {
            assert_eq!(tree.contains(line, kind), expected, "tree line {line} {kind:?}");
            assert_eq!(scan.contains(line, kind), expected, "scan line {line} {kind:?}");
        }
    }

    #[test]
    fn test_continuations_make_siblings() {
        let src = "\
if a:
    x
elif b:
    y
else:
    z
end";
        let tree = ScopeTree::build(&shapes(src));
        assert_eq!(tree.frames().len(), 3);
        assert_eq!(tree.frame(0).end_line, Some(2));
        assert_eq!(tree.frame(1).parent, None);
        assert_eq!(tree.innermost(5), Some(2));
        assert_eq!(tree.frame(2).end_line, Some(6));
    }

    #[test]
    fn test_loop_does_not_cross_function() {
        let src = "\
for x in xs:
    func inner():
        break
    end
end";
        let shapes = shapes(src);
        let tree = ScopeTree::build(&shapes);
        assert!(!tree.contains(2, ScopeKind::Loop));
        assert!(tree.contains(2, ScopeKind::Function));
        assert!(!BackwardScan::new(&shapes).contains(2, ScopeKind::Loop));
    }

    #[test]
    fn test_scan_class_like_takes_any_header_name() {
        let src = "\
enum Color:
    func label():
        if this:
            print(1)
        end
    end
end
func free():
    this
end";
        let shapes = shapes(src);
        let scan = BackwardScan::new(&shapes);
        assert!(scan.contains(3, ScopeKind::ClassLike));
        assert!(!scan.contains(8, ScopeKind::ClassLike));
        assert!(!scan.contains(1, ScopeKind::ClassLike));
    }

    #[test]
    fn test_unclosed_frames() {
        let tree = ScopeTree::build(&shapes("func f():\n    return 1"));
        assert_eq!(tree.unclosed().collect::<Vec<_>>(), vec![0]);
        assert_eq!(tree.body_lines(0), 1..2);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(ScopeStrategy::parse("Tree"), Some(ScopeStrategy::Tree));
        assert_eq!(
            ScopeStrategy::parse("backward-scan"),
            Some(ScopeStrategy::BackwardScan)
        );
        assert_eq!(ScopeStrategy::parse("other"), None);
    }
}
