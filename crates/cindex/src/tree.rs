//! Owned snapshots of the cursor tree.
//!
//! A snapshot copies kinds, names, types and locations out of a translation
//! unit so the result can be kept, compared and printed after the unit has
//! been reparsed or disposed.

use crate::cursor::Cursor;
use crate::error::Result;
use crate::kind::CursorKind;
use crate::translation_unit::TranslationUnit;
use std::fmt::{self, Write as _};

/// Source position of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeLocation {
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

/// One cursor and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub kind: CursorKind,
    pub spelling: String,
    /// Spelling of the cursor's type; empty when it has none.
    pub type_spelling: String,
    pub location: NodeLocation,
    pub is_definition: bool,
    pub children: Vec<AstNode>,
}

impl Cursor {
    /// Copy this cursor and its descendants.
    pub fn snapshot(&self) -> Result<AstNode> {
        let children = self
            .children()?
            .iter()
            .map(Cursor::snapshot)
            .collect::<Result<Vec<_>>>()?;
        self.snapshot_node(children)
    }

    fn snapshot_node(&self, children: Vec<AstNode>) -> Result<AstNode> {
        let ty = self.cursor_type()?;
        let type_spelling = if ty.is_valid() {
            ty.spelling()?
        } else {
            String::new()
        };
        let loc = self.location()?.spelling()?;
        let file = match loc.file {
            Some(file) => Some(file.name()?),
            None => None,
        };
        Ok(AstNode {
            kind: self.kind(),
            spelling: self.spelling()?,
            type_spelling,
            location: NodeLocation {
                file,
                line: loc.line,
                column: loc.column,
            },
            is_definition: self.is_definition()?,
            children,
        })
    }
}

impl TranslationUnit {
    /// Copy the whole cursor tree. With `main_file_only`, top-level
    /// declarations from included files are left out.
    pub fn snapshot(&self, main_file_only: bool) -> Result<AstNode> {
        let root = self.cursor()?;
        let mut children = Vec::new();
        for child in root.children()? {
            if main_file_only && !child.is_from_main_file()? {
                continue;
            }
            children.push(child.snapshot()?);
        }
        root.snapshot_node(children)
    }
}

impl AstNode {
    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(AstNode::count).sum::<usize>()
    }

    /// Every node of `kind` in this subtree, in pre-order.
    pub fn find_all(&self, kind: CursorKind) -> Vec<&AstNode> {
        let mut found = Vec::new();
        self.collect(kind, &mut found);
        found
    }

    fn collect<'a>(&'a self, kind: CursorKind, found: &mut Vec<&'a AstNode>) {
        if self.kind == kind {
            found.push(self);
        }
        for child in &self.children {
            child.collect(kind, found);
        }
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&AstNode> {
        self.children.iter().find(|c| c.spelling == name)
    }

    fn dump(&self, depth: usize, out: &mut String) -> fmt::Result {
        write!(out, "{:indent$}{:?} '{}'", "", self.kind, self.spelling, indent = depth * 2)?;
        if !self.type_spelling.is_empty() {
            write!(out, " : {}", self.type_spelling)?;
        }
        if self.location.line > 0 {
            write!(out, " <{}:{}>", self.location.line, self.location.column)?;
        }
        out.push('\n');
        for child in &self.children {
            child.dump(depth + 1, out)?;
        }
        Ok(())
    }
}

impl fmt::Display for AstNode {
    /// An indented outline, one node per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.dump(0, &mut out)?;
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: CursorKind, spelling: &str, line: u32, children: Vec<AstNode>) -> AstNode {
        AstNode {
            kind,
            spelling: spelling.to_string(),
            type_spelling: String::new(),
            location: NodeLocation {
                file: None,
                line,
                column: 1,
            },
            is_definition: true,
            children,
        }
    }

    #[test]
    fn test_count_and_find() {
        let tree = node(
            CursorKind::TRANSLATION_UNIT,
            "main.c",
            0,
            vec![
                node(CursorKind::FUNCTION_DECL, "f", 1, Vec::new()),
                node(
                    CursorKind::STRUCT_DECL,
                    "S",
                    2,
                    vec![node(CursorKind::FIELD_DECL, "x", 2, Vec::new())],
                ),
                node(CursorKind::FUNCTION_DECL, "g", 3, Vec::new()),
            ],
        );

        assert_eq!(tree.count(), 5);
        let functions: Vec<_> = tree
            .find_all(CursorKind::FUNCTION_DECL)
            .iter()
            .map(|n| n.spelling.as_str())
            .collect();
        assert_eq!(functions, ["f", "g"]);
        assert_eq!(tree.child("S").map(|s| s.children.len()), Some(1));
        assert!(tree.child("x").is_none());
    }

    #[test]
    fn test_display_outline() {
        let mut field = node(CursorKind::FIELD_DECL, "x", 2, Vec::new());
        field.type_spelling = "int".to_string();
        let tree = node(CursorKind::STRUCT_DECL, "S", 1, vec![field]);

        let text = tree.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("'S' <1:1>"));
        assert!(lines[1].starts_with("  "));
        assert!(lines[1].contains(": int"));
    }
}
