//! Types of AST entities.
//!
//! The layout queries (`size_of`, `align_of`, `offset_of`) return a byte or
//! bit count, or one of libclang's negative sentinels mapped to
//! [`LayoutError`].

use crate::cursor::Cursor;
use crate::error::{LayoutError, Result};
use crate::kind::{CallingConv, ExceptionSpecification, Nullability, RefQualifier, TypeKind};
use crate::registry::{check_owner, TuRef};
use crate::string::cx_string_to_string;
use clang_sys::*;
use std::ffi::CString;
use std::fmt;
use std::os::raw::c_uint;

/// The type of an AST entity.
#[derive(Clone)]
pub struct Type {
    pub(crate) raw: CXType,
    pub(crate) tu: Option<TuRef>,
}

impl Type {
    pub(crate) fn from_raw(raw: CXType, tu: Option<TuRef>) -> Self {
        Self { raw, tu }
    }

    fn derive(&self, raw: CXType) -> Type {
        Type::from_raw(raw, self.tu.clone())
    }

    fn check(&self) -> Result<CXType> {
        check_owner(&self.tu, "type")?;
        Ok(self.raw)
    }

    /// The kind is stored in the type itself and is always readable.
    pub fn kind(&self) -> TypeKind {
        TypeKind(self.raw.kind)
    }

    pub fn is_valid(&self) -> bool {
        self.kind() != TypeKind::INVALID
    }

    pub fn spelling(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_getTypeSpelling(raw) }))
    }

    pub fn canonical(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getCanonicalType(raw) }))
    }

    pub fn pointee(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getPointeeType(raw) }))
    }

    pub fn result_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getResultType(raw) }))
    }

    pub fn element_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getElementType(raw) }))
    }

    pub fn array_element_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getArrayElementType(raw) }))
    }

    /// The type named by an elaborated type, e.g. `struct S` -> `S`.
    pub fn named_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_Type_getNamedType(raw) }))
    }

    /// The class a member pointer type points into.
    pub fn class_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_Type_getClassType(raw) }))
    }

    /// The type with attributes such as nullability stripped.
    pub fn modified_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_Type_getModifiedType(raw) }))
    }

    /// The type without its const, volatile and restrict qualifiers.
    pub fn unqualified(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getUnqualifiedType(raw) }))
    }

    pub fn non_reference(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getNonReferenceType(raw) }))
    }

    pub fn declaration(&self) -> Result<Cursor> {
        let raw = self.check()?;
        Ok(Cursor::from_raw(
            unsafe { clang_getTypeDeclaration(raw) },
            self.tu.clone(),
        ))
    }

    pub fn typedef_name(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_getTypedefName(raw) }))
    }

    pub fn objc_encoding(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_Type_getObjCEncoding(raw) }))
    }

    pub fn is_const(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_isConstQualifiedType(raw) } != 0)
    }

    pub fn is_volatile(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_isVolatileQualifiedType(raw) } != 0)
    }

    pub fn is_restrict(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_isRestrictQualifiedType(raw) } != 0)
    }

    /// Address space number of a qualified pointer type.
    pub fn address_space(&self) -> Result<u32> {
        let raw = self.check()?;
        Ok(unsafe { clang_getAddressSpace(raw) })
    }

    pub fn is_pod(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_isPODType(raw) } != 0)
    }

    pub fn is_function_variadic(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_isFunctionTypeVariadic(raw) } != 0)
    }

    pub fn is_transparent_tag_typedef(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Type_isTransparentTagTypedef(raw) } != 0)
    }

    pub fn calling_conv(&self) -> Result<Option<CallingConv>> {
        let raw = self.check()?;
        Ok(CallingConv::from_raw(unsafe {
            clang_getFunctionTypeCallingConv(raw)
        }))
    }

    pub fn ref_qualifier(&self) -> Result<Option<RefQualifier>> {
        let raw = self.check()?;
        Ok(RefQualifier::from_raw(unsafe {
            clang_Type_getCXXRefQualifier(raw)
        }))
    }

    pub fn nullability(&self) -> Result<Option<Nullability>> {
        let raw = self.check()?;
        Ok(Nullability::from_raw(unsafe { clang_Type_getNullability(raw) }))
    }

    pub fn exception_specification(&self) -> Result<Option<ExceptionSpecification>> {
        let raw = self.check()?;
        Ok(ExceptionSpecification::from_raw(unsafe {
            clang_getExceptionSpecificationType(raw)
        }))
    }

    /// Parameter types of a function type; `None` for non-function types.
    pub fn argument_types(&self) -> Result<Option<Vec<Type>>> {
        let raw = self.check()?;
        let n = unsafe { clang_getNumArgTypes(raw) };
        if n < 0 {
            return Ok(None);
        }
        Ok(Some(
            (0..n as c_uint)
                .map(|i| self.derive(unsafe { clang_getArgType(raw, i) }))
                .collect(),
        ))
    }

    /// Template arguments of a specialization; `None` if not a specialization.
    pub fn template_arguments(&self) -> Result<Option<Vec<Type>>> {
        let raw = self.check()?;
        let n = unsafe { clang_Type_getNumTemplateArguments(raw) };
        if n < 0 {
            return Ok(None);
        }
        Ok(Some(
            (0..n as c_uint)
                .map(|i| self.derive(unsafe { clang_Type_getTemplateArgumentAsType(raw, i) }))
                .collect(),
        ))
    }

    /// Number of elements of an array or vector type.
    pub fn num_elements(&self) -> Result<Option<u64>> {
        let raw = self.check()?;
        let n = unsafe { clang_getNumElements(raw) };
        Ok((n >= 0).then_some(n as u64))
    }

    pub fn array_size(&self) -> Result<Option<u64>> {
        let raw = self.check()?;
        let n = unsafe { clang_getArraySize(raw) };
        Ok((n >= 0).then_some(n as u64))
    }

    /// Size of the type in bytes.
    pub fn size_of(&self) -> Result<u64> {
        let raw = self.check()?;
        Ok(LayoutError::check(unsafe { clang_Type_getSizeOf(raw) })?)
    }

    /// Alignment of the type in bytes.
    pub fn align_of(&self) -> Result<u64> {
        let raw = self.check()?;
        Ok(LayoutError::check(unsafe { clang_Type_getAlignOf(raw) })?)
    }

    /// Offset of `field` in bits from the start of this record type.
    pub fn offset_of(&self, field: &str) -> Result<u64> {
        let raw = self.check()?;
        let field = CString::new(field)?;
        Ok(LayoutError::check(unsafe {
            clang_Type_getOffsetOf(raw, field.as_ptr())
        })?)
    }

    /// Fields of a record type, in declaration order.
    pub fn fields(&self) -> Result<Vec<Cursor>> {
        let raw = self.check()?;
        crate::visit::collect_fields(raw, self.tu.clone())
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        unsafe { clang_equalTypes(self.raw, other.raw) != 0 }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Type");
        s.field("kind", &self.kind());
        if let Ok(spelling) = self.spelling() {
            s.field("spelling", &spelling);
        }
        s.finish()
    }
}
