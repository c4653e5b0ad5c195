//! Lexical tokens.
//!
//! `clang_tokenize` hands back one native array for a whole range, and it is
//! released as a unit: a [`TokenBatch`] is a disposable child of its
//! translation unit, and [`Token`]s borrow the batch.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::kind::TokenKind;
use crate::location::{SourceLocation, SourceRange};
use crate::registry::{Native, Registry, TuRef};
use crate::string::cx_string_to_string;
use crate::translation_unit::TranslationUnit;
use cindex_common::RawId;
use clang_sys::*;
use std::os::raw::c_uint;
use std::ptr;
use std::rc::Rc;

/// The tokens of one source range.
#[derive(Debug)]
pub struct TokenBatch {
    registry: Rc<Registry>,
    id: RawId,
    tu: TuRef,
}

/// One token in a [`TokenBatch`].
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    batch: &'a TokenBatch,
    raw: CXToken,
}

impl TranslationUnit {
    /// Split `range` into tokens. The range must come from this unit.
    pub fn tokenize(&self, range: &SourceRange) -> Result<TokenBatch> {
        let raw = self.raw()?;
        if let Some(tu) = &range.tu {
            tu.check("source range")?;
            if *tu != self.owner()? {
                return Err(Error::InvalidArgument("clang_tokenize"));
            }
        }

        let mut tokens: *mut CXToken = ptr::null_mut();
        let mut count: c_uint = 0;
        unsafe { clang_tokenize(raw, range.raw, &mut tokens, &mut count) };

        let id = self
            .registry()
            .wrap_child(self.id(), Native::Tokens { tu: raw, tokens, count })?;
        tracing::trace!(count, "tokenized range");
        Ok(TokenBatch {
            registry: self.registry().clone(),
            id,
            tu: self.owner()?,
        })
    }
}

impl TokenBatch {
    fn native(&self) -> Result<(CXTranslationUnit, &[CXToken])> {
        let (tokens, count) = self.registry.get(self.id)?.tokens();
        let tu = self.tu.check("token")?;
        if tokens.is_null() {
            return Ok((tu, &[]));
        }
        Ok((tu, unsafe { std::slice::from_raw_parts(tokens, count as usize) }))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.native()?.1.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, index: usize) -> Result<Token<'_>> {
        let (_, tokens) = self.native()?;
        tokens
            .get(index)
            .map(|raw| Token { batch: self, raw: *raw })
            .ok_or(Error::OutOfRange {
                what: "token",
                index,
                len: tokens.len(),
            })
    }

    pub fn tokens(&self) -> Result<Vec<Token<'_>>> {
        let (_, tokens) = self.native()?;
        Ok(tokens
            .iter()
            .map(|raw| Token { batch: self, raw: *raw })
            .collect())
    }

    /// The cursor each token belongs to, in token order.
    pub fn annotate(&self) -> Result<Vec<Cursor>> {
        let (tu, tokens) = self.native()?;
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        // libclang takes the array mutably but only reads it.
        let mut copy = tokens.to_vec();
        let mut cursors = vec![unsafe { clang_getNullCursor() }; copy.len()];
        unsafe {
            clang_annotateTokens(tu, copy.as_mut_ptr(), copy.len() as c_uint, cursors.as_mut_ptr())
        };
        Ok(cursors
            .into_iter()
            .map(|c| Cursor::from_raw(c, Some(self.tu.clone())))
            .collect())
    }

    pub fn is_live(&self) -> bool {
        self.registry.is_live(self.id)
    }

    /// Release the token array. Fails with `DoubleDispose` the second time.
    pub fn dispose(&self) -> Result<()> {
        Ok(self.registry.dispose(self.id)?)
    }
}

impl Drop for TokenBatch {
    fn drop(&mut self) {
        self.registry.dispose_on_drop(self.id);
    }
}

impl<'a> Token<'a> {
    fn tu(&self) -> Result<CXTranslationUnit> {
        Ok(self.batch.native()?.0)
    }

    pub fn kind(&self) -> Result<Option<TokenKind>> {
        self.tu()?;
        Ok(TokenKind::from_raw(unsafe { clang_getTokenKind(self.raw) }))
    }

    pub fn spelling(&self) -> Result<String> {
        let tu = self.tu()?;
        Ok(cx_string_to_string(unsafe { clang_getTokenSpelling(tu, self.raw) }))
    }

    pub fn location(&self) -> Result<SourceLocation> {
        let tu = self.tu()?;
        Ok(SourceLocation::from_raw(
            unsafe { clang_getTokenLocation(tu, self.raw) },
            Some(self.batch.tu.clone()),
        ))
    }

    pub fn extent(&self) -> Result<SourceRange> {
        let tu = self.tu()?;
        Ok(SourceRange::from_raw(
            unsafe { clang_getTokenExtent(tu, self.raw) },
            Some(self.batch.tu.clone()),
        ))
    }
}
