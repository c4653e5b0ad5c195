//! Parsed documentation comments.
//!
//! A `CXComment` points into the translation unit's AST, so the whole tree
//! is copied into owned [`Comment`] nodes while the cursor is checked.

use crate::cursor::Cursor;
use crate::error::Result;
use crate::kind::closed_enum;
use crate::string::cx_string_to_string;
use clang_sys::*;

closed_enum! {
    /// Kind of a comment node (`CXCommentKind`).
    pub enum CommentKind: CXCommentKind {
        Null = CXComment_Null,
        Text = CXComment_Text,
        InlineCommand = CXComment_InlineCommand,
        HtmlStartTag = CXComment_HTMLStartTag,
        HtmlEndTag = CXComment_HTMLEndTag,
        Paragraph = CXComment_Paragraph,
        BlockCommand = CXComment_BlockCommand,
        ParamCommand = CXComment_ParamCommand,
        TParamCommand = CXComment_TParamCommand,
        VerbatimBlockCommand = CXComment_VerbatimBlockCommand,
        VerbatimBlockLine = CXComment_VerbatimBlockLine,
        VerbatimLine = CXComment_VerbatimLine,
        FullComment = CXComment_FullComment,
    }
}

closed_enum! {
    /// Direction of a `\param` (`CXCommentParamPassDirection`).
    pub enum ParamDirection: CXCommentParamPassDirection {
        In = CXCommentParamPassDirection_In,
        Out = CXCommentParamPassDirection_Out,
        InOut = CXCommentParamPassDirection_InOut,
    }
}

/// One node of a parsed comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    /// Text for text and verbatim nodes, the command name for commands, the
    /// tag name for HTML tags and the parameter name for `\param`/`\tparam`.
    pub text: String,
    /// Arguments of an inline or block command.
    pub args: Vec<String>,
    /// Attributes of an HTML start tag.
    pub attrs: Vec<(String, String)>,
    /// Index of a `\param` in the function's parameter list, if it names one.
    pub param_index: Option<u32>,
    /// Direction of a `\param`, when written explicitly.
    pub direction: Option<ParamDirection>,
    pub is_whitespace: bool,
    pub children: Vec<Comment>,
}

impl Comment {
    /// The text of every text node below this one, one line per paragraph.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        match self.kind {
            CommentKind::Text | CommentKind::VerbatimLine | CommentKind::VerbatimBlockLine => {
                out.push_str(self.text.trim());
                out.push(' ');
            }
            _ => {}
        }
        for child in &self.children {
            child.collect_text(out);
        }
        if self.kind == CommentKind::Paragraph && !out.ends_with('\n') {
            let trimmed = out.trim_end().len();
            out.truncate(trimmed);
            out.push('\n');
        }
    }

    /// Depth-first search for `\param` nodes.
    pub fn params(&self) -> Vec<&Comment> {
        let mut found = Vec::new();
        self.walk(&mut |c| {
            if c.kind == CommentKind::ParamCommand {
                found.push(c);
            }
        });
        found
    }

    fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Comment)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

unsafe fn copy_comment(c: CXComment) -> Comment {
    let raw_kind = clang_Comment_getKind(c);
    let kind = CommentKind::from_raw(raw_kind).unwrap_or(CommentKind::Null);

    let mut text = String::new();
    let mut args = Vec::new();
    let mut attrs = Vec::new();
    let mut param_index = None;
    let mut direction = None;

    match kind {
        CommentKind::Text => text = cx_string_to_string(clang_TextComment_getText(c)),
        CommentKind::InlineCommand => {
            text = cx_string_to_string(clang_InlineCommandComment_getCommandName(c));
            args = (0..clang_InlineCommandComment_getNumArgs(c))
                .map(|i| cx_string_to_string(clang_InlineCommandComment_getArgText(c, i)))
                .collect();
        }
        CommentKind::HtmlStartTag => {
            text = cx_string_to_string(clang_HTMLTagComment_getTagName(c));
            attrs = (0..clang_HTMLStartTag_getNumAttrs(c))
                .map(|i| {
                    (
                        cx_string_to_string(clang_HTMLStartTag_getAttrName(c, i)),
                        cx_string_to_string(clang_HTMLStartTag_getAttrValue(c, i)),
                    )
                })
                .collect();
        }
        CommentKind::HtmlEndTag => text = cx_string_to_string(clang_HTMLTagComment_getTagName(c)),
        CommentKind::BlockCommand | CommentKind::VerbatimBlockCommand => {
            text = cx_string_to_string(clang_BlockCommandComment_getCommandName(c));
            args = (0..clang_BlockCommandComment_getNumArgs(c))
                .map(|i| cx_string_to_string(clang_BlockCommandComment_getArgText(c, i)))
                .collect();
        }
        CommentKind::ParamCommand => {
            text = cx_string_to_string(clang_ParamCommandComment_getParamName(c));
            if clang_ParamCommandComment_isParamIndexValid(c) != 0 {
                param_index = Some(clang_ParamCommandComment_getParamIndex(c));
            }
            if clang_ParamCommandComment_isDirectionExplicit(c) != 0 {
                direction = ParamDirection::from_raw(clang_ParamCommandComment_getDirection(c));
            }
        }
        CommentKind::TParamCommand => {
            text = cx_string_to_string(clang_TParamCommandComment_getParamName(c));
            if clang_TParamCommandComment_isParamPositionValid(c) != 0 {
                param_index = Some(clang_TParamCommandComment_getIndex(c, 0));
            }
        }
        CommentKind::VerbatimBlockLine => {
            text = cx_string_to_string(clang_VerbatimBlockLineComment_getText(c))
        }
        CommentKind::VerbatimLine => text = cx_string_to_string(clang_VerbatimLineComment_getText(c)),
        CommentKind::Null | CommentKind::Paragraph | CommentKind::FullComment => {}
    }

    let children = (0..clang_Comment_getNumChildren(c))
        .map(|i| copy_comment(clang_Comment_getChild(c, i)))
        .collect();

    Comment {
        kind,
        text,
        args,
        attrs,
        param_index,
        direction,
        is_whitespace: clang_Comment_isWhitespace(c) != 0,
        children,
    }
}

impl Cursor {
    fn full_comment(&self) -> Result<Option<CXComment>> {
        let raw = self.check()?;
        let comment = unsafe { clang_Cursor_getParsedComment(raw) };
        let kind = unsafe { clang_Comment_getKind(comment) };
        Ok((kind == CXComment_FullComment).then_some(comment))
    }

    /// The documentation comment attached to this declaration, parsed.
    pub fn parsed_comment(&self) -> Result<Option<Comment>> {
        Ok(self
            .full_comment()?
            .map(|comment| unsafe { copy_comment(comment) }))
    }

    /// The documentation comment rendered as an HTML fragment.
    pub fn comment_html(&self) -> Result<Option<String>> {
        Ok(self
            .full_comment()?
            .map(|comment| cx_string_to_string(unsafe { clang_FullComment_getAsHTML(comment) })))
    }

    /// The documentation comment rendered as XML.
    pub fn comment_xml(&self) -> Result<Option<String>> {
        Ok(self
            .full_comment()?
            .map(|comment| cx_string_to_string(unsafe { clang_FullComment_getAsXML(comment) })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: CommentKind, text: &str, children: Vec<Comment>) -> Comment {
        Comment {
            kind,
            text: text.to_string(),
            args: Vec::new(),
            attrs: Vec::new(),
            param_index: None,
            direction: None,
            is_whitespace: false,
            children,
        }
    }

    #[test]
    fn test_comment_kind_mapping() {
        assert_eq!(CommentKind::from_raw(0), Some(CommentKind::Null));
        assert_eq!(CommentKind::from_raw(12), Some(CommentKind::FullComment));
        assert_eq!(CommentKind::from_raw(13), None);
        assert_eq!(ParamDirection::InOut.to_raw(), 2);
    }

    #[test]
    fn test_plain_text_and_params() {
        let mut param = node(
            CommentKind::ParamCommand,
            "x",
            vec![node(
                CommentKind::Paragraph,
                "",
                vec![node(CommentKind::Text, " the input", Vec::new())],
            )],
        );
        param.param_index = Some(0);

        let full = node(
            CommentKind::FullComment,
            "",
            vec![
                node(
                    CommentKind::Paragraph,
                    "",
                    vec![node(CommentKind::Text, " Adds one.", Vec::new())],
                ),
                param,
            ],
        );

        assert_eq!(full.plain_text(), "Adds one.\nthe input");
        let params = full.params();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].text, "x");
        assert_eq!(params[0].param_index, Some(0));
    }
}
