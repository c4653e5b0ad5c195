//! Cursors: positions in the AST of a translation unit.
//!
//! A [`Cursor`] is a plain value copied out of libclang. It stays tied to the
//! translation unit it came from and is checked against that unit's epoch on
//! every query, so a cursor kept across a reparse fails with `StaleHandle`
//! instead of reading freed memory. The null cursor has no owner and answers
//! every query with an empty result.

use crate::error::{LayoutError, Result};
use crate::flags::{ObjCDeclQualifiers, ObjCPropertyAttributes};
use crate::kind::{
    AccessSpecifier, AvailabilityKind, CursorKind, ExceptionSpecification, Language, Linkage,
    StorageClass, TemplateArgumentKind, TlsKind, Visibility,
};
use crate::location::{File, SourceLocation, SourceRange};
use crate::registry::{check_owner, TuRef};
use crate::string::{cx_string_peek, cx_string_to_string, string_set_to_vec};
use crate::types::Type;
use cindex_common::{HandleClass, Release, Tracked};
use clang_sys::*;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::os::raw::{c_int, c_uint};
use std::ptr;

/// A position in the AST.
#[derive(Clone)]
pub struct Cursor {
    pub(crate) raw: CXCursor,
    pub(crate) tu: Option<TuRef>,
}

/// A version number in an availability attribute; negative parts are absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: i32,
    pub minor: i32,
    pub subminor: i32,
}

impl Version {
    fn from_raw(raw: CXVersion) -> Self {
        Self {
            major: raw.Major,
            minor: raw.Minor,
            subminor: raw.Subminor,
        }
    }

    pub fn is_set(&self) -> bool {
        self.major >= 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_set() {
            return Ok(());
        }
        write!(f, "{}", self.major)?;
        for part in [self.minor, self.subminor] {
            if part < 0 {
                break;
            }
            write!(f, ".{}", part)?;
        }
        Ok(())
    }
}

/// Availability of a declaration on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformAvailability {
    pub platform: String,
    pub introduced: Version,
    pub deprecated: Version,
    pub obsoleted: Version,
    pub unavailable: bool,
    pub message: String,
}

/// Availability attributes of a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    pub always_deprecated: bool,
    pub deprecated_message: String,
    pub always_unavailable: bool,
    pub unavailable_message: String,
    pub platforms: Vec<PlatformAvailability>,
}

/// Value of a constant expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    Int(i64),
    Unsigned(u64),
    Float(f64),
    StrLiteral(String),
    ObjCStrLiteral(String),
    CfStr(String),
    Other(String),
    Unexposed,
}

#[derive(Debug)]
struct NativeEvalResult(CXEvalResult);

impl Release for NativeEvalResult {
    const CLASS: HandleClass = HandleClass::Derived("evaluation result");

    fn release(&mut self) {
        unsafe { clang_EvalResult_dispose(self.0) }
    }
}

#[derive(Debug)]
struct OverriddenCursors(*mut CXCursor);

impl Release for OverriddenCursors {
    const CLASS: HandleClass = HandleClass::Derived("overridden cursors");

    fn release(&mut self) {
        if !self.0.is_null() {
            unsafe { clang_disposeOverriddenCursors(self.0) }
        }
    }
}

impl Cursor {
    pub(crate) fn from_raw(raw: CXCursor, tu: Option<TuRef>) -> Self {
        let tu = if unsafe { clang_Cursor_isNull(raw) } != 0 {
            None
        } else {
            tu
        };
        Self { raw, tu }
    }

    /// A cursor derived from this one, owned by the same translation unit.
    pub(crate) fn derive(&self, raw: CXCursor) -> Cursor {
        Cursor::from_raw(raw, self.tu.clone())
    }

    pub(crate) fn check(&self) -> Result<CXCursor> {
        check_owner(&self.tu, "cursor")?;
        Ok(self.raw)
    }

    pub(crate) fn owner(&self) -> Option<&TuRef> {
        self.tu.as_ref()
    }

    /// The null cursor.
    pub fn null() -> Self {
        Self {
            raw: unsafe { clang_getNullCursor() },
            tu: None,
        }
    }

    pub fn is_null(&self) -> bool {
        unsafe { clang_Cursor_isNull(self.raw) != 0 }
    }

    /// The kind is stored in the cursor itself and is always readable.
    pub fn kind(&self) -> CursorKind {
        CursorKind(self.raw.kind)
    }

    pub fn spelling(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_getCursorSpelling(raw) }))
    }

    /// Name with extra information such as parameter types, e.g. `add(int, int)`.
    pub fn display_name(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_getCursorDisplayName(raw) }))
    }

    /// Unified Symbol Resolution string.
    pub fn usr(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_getCursorUSR(raw) }))
    }

    pub fn mangling(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_Cursor_getMangling(raw) }))
    }

    /// All manglings of a C++ constructor or destructor.
    pub fn cxx_manglings(&self) -> Result<Vec<String>> {
        let raw = self.check()?;
        Ok(string_set_to_vec(unsafe { clang_Cursor_getCXXManglings(raw) }))
    }

    pub fn objc_manglings(&self) -> Result<Vec<String>> {
        let raw = self.check()?;
        Ok(string_set_to_vec(unsafe { clang_Cursor_getObjCManglings(raw) }))
    }

    pub fn raw_comment_text(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_Cursor_getRawCommentText(raw) }))
    }

    pub fn brief_comment_text(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_Cursor_getBriefCommentText(raw) }))
    }

    pub fn comment_range(&self) -> Result<SourceRange> {
        let raw = self.check()?;
        Ok(SourceRange::from_raw(
            unsafe { clang_Cursor_getCommentRange(raw) },
            self.tu.clone(),
        ))
    }

    pub fn location(&self) -> Result<SourceLocation> {
        let raw = self.check()?;
        Ok(SourceLocation::from_raw(
            unsafe { clang_getCursorLocation(raw) },
            self.tu.clone(),
        ))
    }

    pub fn extent(&self) -> Result<SourceRange> {
        let raw = self.check()?;
        Ok(SourceRange::from_raw(
            unsafe { clang_getCursorExtent(raw) },
            self.tu.clone(),
        ))
    }

    /// Range of one piece of the cursor's name (Objective-C selectors have several).
    pub fn spelling_name_range(&self, piece: u32) -> Result<SourceRange> {
        let raw = self.check()?;
        Ok(SourceRange::from_raw(
            unsafe { clang_Cursor_getSpellingNameRange(raw, piece, 0) },
            self.tu.clone(),
        ))
    }

    /// Range of the name of a reference, with `flags` from `CXNameRefFlags`.
    pub fn reference_name_range(&self, flags: u32, piece: u32) -> Result<SourceRange> {
        let raw = self.check()?;
        Ok(SourceRange::from_raw(
            unsafe { clang_getCursorReferenceNameRange(raw, flags as i32, piece) },
            self.tu.clone(),
        ))
    }

    pub fn is_from_main_file(&self) -> Result<bool> {
        self.location()?.is_from_main_file()
    }

    pub fn is_in_system_header(&self) -> Result<bool> {
        self.location()?.is_in_system_header()
    }

    pub fn hash_value(&self) -> u32 {
        unsafe { clang_hashCursor(self.raw) }
    }

    pub fn semantic_parent(&self) -> Result<Cursor> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getCursorSemanticParent(raw) }))
    }

    pub fn lexical_parent(&self) -> Result<Cursor> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getCursorLexicalParent(raw) }))
    }

    /// The entity a reference or expression refers to.
    pub fn referenced(&self) -> Result<Cursor> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getCursorReferenced(raw) }))
    }

    pub fn definition(&self) -> Result<Cursor> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getCursorDefinition(raw) }))
    }

    pub fn canonical(&self) -> Result<Cursor> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getCanonicalCursor(raw) }))
    }

    /// The template a specialization or instantiation was created from.
    pub fn specialized_template(&self) -> Result<Cursor> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_getSpecializedCursorTemplate(raw) }))
    }

    /// The kind of declaration a template would produce when instantiated.
    pub fn template_kind(&self) -> Result<CursorKind> {
        let raw = self.check()?;
        Ok(CursorKind(unsafe { clang_getTemplateCursorKind(raw) }))
    }

    pub fn is_definition(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_isCursorDefinition(raw) } != 0)
    }

    pub fn cursor_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(Type::from_raw(unsafe { clang_getCursorType(raw) }, self.tu.clone()))
    }

    pub fn result_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(Type::from_raw(
            unsafe { clang_getCursorResultType(raw) },
            self.tu.clone(),
        ))
    }

    pub fn typedef_underlying_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(Type::from_raw(
            unsafe { clang_getTypedefDeclUnderlyingType(raw) },
            self.tu.clone(),
        ))
    }

    pub fn enum_integer_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(Type::from_raw(
            unsafe { clang_getEnumDeclIntegerType(raw) },
            self.tu.clone(),
        ))
    }

    /// Type of the receiver of an Objective-C message or C++ member call.
    pub fn receiver_type(&self) -> Result<Type> {
        let raw = self.check()?;
        Ok(Type::from_raw(
            unsafe { clang_Cursor_getReceiverType(raw) },
            self.tu.clone(),
        ))
    }

    pub fn enum_constant_value(&self) -> Result<i64> {
        let raw = self.check()?;
        Ok(unsafe { clang_getEnumConstantDeclValue(raw) })
    }

    pub fn enum_constant_unsigned_value(&self) -> Result<u64> {
        let raw = self.check()?;
        Ok(unsafe { clang_getEnumConstantDeclUnsignedValue(raw) })
    }

    /// Width of a bit field, `None` for other cursors.
    pub fn field_bit_width(&self) -> Result<Option<u32>> {
        let raw = self.check()?;
        let width = unsafe { clang_getFieldDeclBitWidth(raw) };
        Ok((width >= 0).then_some(width as u32))
    }

    pub fn is_bit_field(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isBitField(raw) } != 0)
    }

    /// Offset of a field in bits from the start of its record.
    pub fn offset_of_field(&self) -> Result<u64> {
        let raw = self.check()?;
        Ok(LayoutError::check(unsafe { clang_Cursor_getOffsetOfField(raw) })?)
    }

    /// Number of arguments of a function or call, `None` for other cursors.
    pub fn num_arguments(&self) -> Result<Option<u32>> {
        let raw = self.check()?;
        let n = unsafe { clang_Cursor_getNumArguments(raw) };
        Ok((n >= 0).then_some(n as u32))
    }

    pub fn argument(&self, index: u32) -> Result<Cursor> {
        let raw = self.check()?;
        Ok(self.derive(unsafe { clang_Cursor_getArgument(raw, index) }))
    }

    pub fn arguments(&self) -> Result<Vec<Cursor>> {
        let n = self.num_arguments()?.unwrap_or(0);
        (0..n).map(|i| self.argument(i)).collect()
    }

    /// Number of template arguments of a specialization, `None` for other cursors.
    pub fn num_template_arguments(&self) -> Result<Option<u32>> {
        let raw = self.check()?;
        let n = unsafe { clang_Cursor_getNumTemplateArguments(raw) };
        Ok((n >= 0).then_some(n as u32))
    }

    pub fn template_argument_kind(&self, index: u32) -> Result<Option<TemplateArgumentKind>> {
        let raw = self.check()?;
        Ok(TemplateArgumentKind::from_raw(unsafe {
            clang_Cursor_getTemplateArgumentKind(raw, index)
        }))
    }

    pub fn template_argument_type(&self, index: u32) -> Result<Type> {
        let raw = self.check()?;
        Ok(Type::from_raw(
            unsafe { clang_Cursor_getTemplateArgumentType(raw, index) },
            self.tu.clone(),
        ))
    }

    pub fn template_argument_value(&self, index: u32) -> Result<i64> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_getTemplateArgumentValue(raw, index) })
    }

    pub fn template_argument_unsigned_value(&self, index: u32) -> Result<u64> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_getTemplateArgumentUnsignedValue(raw, index) })
    }

    /// Declarations an overloaded declaration reference may refer to.
    pub fn overloaded_decls(&self) -> Result<Vec<Cursor>> {
        let raw = self.check()?;
        let n = unsafe { clang_getNumOverloadedDecls(raw) };
        Ok((0..n)
            .map(|i| self.derive(unsafe { clang_getOverloadedDecl(raw, i) }))
            .collect())
    }

    /// Methods this method overrides.
    pub fn overridden(&self) -> Result<Vec<Cursor>> {
        let raw = self.check()?;
        let mut cursors: *mut CXCursor = ptr::null_mut();
        let mut count: c_uint = 0;
        unsafe { clang_getOverriddenCursors(raw, &mut cursors, &mut count) };

        let array = Tracked::acquire(OverriddenCursors(cursors));
        let native = array.get()?;
        if native.0.is_null() {
            return Ok(Vec::new());
        }
        let slice = unsafe { std::slice::from_raw_parts(native.0, count as usize) };
        Ok(slice.iter().map(|c| self.derive(*c)).collect())
    }

    /// The file an inclusion directive includes.
    pub fn included_file(&self) -> Result<Option<File>> {
        let raw = self.check()?;
        Ok(File::from_raw(
            unsafe { clang_getIncludedFile(raw) },
            self.tu.clone(),
        ))
    }

    pub fn linkage(&self) -> Result<Option<Linkage>> {
        let raw = self.check()?;
        Ok(Linkage::from_raw(unsafe { clang_getCursorLinkage(raw) }))
    }

    pub fn visibility(&self) -> Result<Option<Visibility>> {
        let raw = self.check()?;
        Ok(Visibility::from_raw(unsafe { clang_getCursorVisibility(raw) }))
    }

    pub fn availability(&self) -> Result<Option<AvailabilityKind>> {
        let raw = self.check()?;
        Ok(AvailabilityKind::from_raw(unsafe {
            clang_getCursorAvailability(raw)
        }))
    }

    pub fn access_specifier(&self) -> Result<Option<AccessSpecifier>> {
        let raw = self.check()?;
        Ok(AccessSpecifier::from_raw(unsafe {
            clang_getCXXAccessSpecifier(raw)
        }))
    }

    pub fn language(&self) -> Result<Option<Language>> {
        let raw = self.check()?;
        Ok(Language::from_raw(unsafe { clang_getCursorLanguage(raw) }))
    }

    pub fn tls_kind(&self) -> Result<Option<TlsKind>> {
        let raw = self.check()?;
        Ok(TlsKind::from_raw(unsafe { clang_getCursorTLSKind(raw) }))
    }

    pub fn storage_class(&self) -> Result<Option<StorageClass>> {
        let raw = self.check()?;
        Ok(StorageClass::from_raw(unsafe {
            clang_Cursor_getStorageClass(raw)
        }))
    }

    pub fn exception_specification(&self) -> Result<Option<ExceptionSpecification>> {
        let raw = self.check()?;
        Ok(ExceptionSpecification::from_raw(unsafe {
            clang_getCursorExceptionSpecificationType(raw)
        }))
    }

    /// Availability attributes, per platform.
    ///
    /// libclang is asked twice: once for the platform count and once to fill
    /// an array of that size. Every string it hands back is disposed here.
    pub fn platform_availability(&self) -> Result<Availability> {
        let raw = self.check()?;
        let mut always_deprecated: c_int = 0;
        let mut always_unavailable: c_int = 0;
        let mut deprecated_message: CXString = unsafe { std::mem::zeroed() };
        let mut unavailable_message: CXString = unsafe { std::mem::zeroed() };

        let count = unsafe {
            clang_getCursorPlatformAvailability(
                raw,
                &mut always_deprecated,
                &mut deprecated_message,
                &mut always_unavailable,
                &mut unavailable_message,
                ptr::null_mut(),
                0,
            )
        };

        let mut native: Vec<CXPlatformAvailability> = (0..count.max(0))
            .map(|_| unsafe { std::mem::zeroed() })
            .collect();
        if !native.is_empty() {
            unsafe {
                clang_getCursorPlatformAvailability(
                    raw,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    native.as_mut_ptr(),
                    native.len() as c_int,
                )
            };
        }

        let platforms = native
            .iter_mut()
            .map(|p| {
                let record = PlatformAvailability {
                    platform: cx_string_peek(&p.Platform),
                    introduced: Version::from_raw(p.Introduced),
                    deprecated: Version::from_raw(p.Deprecated),
                    obsoleted: Version::from_raw(p.Obsoleted),
                    unavailable: p.Unavailable != 0,
                    message: cx_string_peek(&p.Message),
                };
                unsafe { clang_disposeCXPlatformAvailability(p) };
                record
            })
            .collect();

        Ok(Availability {
            always_deprecated: always_deprecated != 0,
            deprecated_message: cx_string_to_string(deprecated_message),
            always_unavailable: always_unavailable != 0,
            unavailable_message: cx_string_to_string(unavailable_message),
            platforms,
        })
    }

    /// Evaluate the cursor as a constant expression.
    pub fn evaluate(&self) -> Result<Option<EvalResult>> {
        let raw = self.check()?;
        let result = unsafe { clang_Cursor_Evaluate(raw) };
        if result.is_null() {
            return Ok(None);
        }
        let result = Tracked::acquire(NativeEvalResult(result));
        let native = result.get()?.0;

        let value = unsafe {
            match clang_EvalResult_getKind(native) {
                CXEval_Int if clang_EvalResult_isUnsignedInt(native) != 0 => {
                    EvalResult::Unsigned(clang_EvalResult_getAsUnsigned(native))
                }
                CXEval_Int => EvalResult::Int(clang_EvalResult_getAsLongLong(native)),
                CXEval_Float => EvalResult::Float(clang_EvalResult_getAsDouble(native)),
                CXEval_StrLiteral => {
                    EvalResult::StrLiteral(crate::string::c_str_to_string(
                        clang_EvalResult_getAsStr(native),
                    ))
                }
                CXEval_ObjCStrLiteral => EvalResult::ObjCStrLiteral(
                    crate::string::c_str_to_string(clang_EvalResult_getAsStr(native)),
                ),
                CXEval_CFStr => {
                    EvalResult::CfStr(crate::string::c_str_to_string(clang_EvalResult_getAsStr(native)))
                }
                CXEval_Other => {
                    EvalResult::Other(crate::string::c_str_to_string(clang_EvalResult_getAsStr(native)))
                }
                _ => EvalResult::Unexposed,
            }
        };
        Ok(Some(value))
    }

    pub fn is_anonymous(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isAnonymous(raw) } != 0)
    }

    pub fn is_anonymous_record_decl(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isAnonymousRecordDecl(raw) } != 0)
    }

    pub fn is_inline_namespace(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isInlineNamespace(raw) } != 0)
    }

    pub fn is_virtual_base(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_isVirtualBase(raw) } != 0)
    }

    pub fn is_dynamic_call(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isDynamicCall(raw) } != 0)
    }

    pub fn is_variadic(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isVariadic(raw) } != 0)
    }

    pub fn is_macro_function_like(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isMacroFunctionLike(raw) } != 0)
    }

    pub fn is_macro_builtin(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isMacroBuiltin(raw) } != 0)
    }

    pub fn is_function_inlined(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isFunctionInlined(raw) } != 0)
    }

    pub fn has_attrs(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_hasAttrs(raw) } != 0)
    }

    pub fn is_scoped_enum(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_EnumDecl_isScoped(raw) } != 0)
    }

    pub fn is_abstract_record(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXRecord_isAbstract(raw) } != 0)
    }

    pub fn is_mutable_field(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXField_isMutable(raw) } != 0)
    }

    pub fn is_const_method(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXMethod_isConst(raw) } != 0)
    }

    pub fn is_static_method(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXMethod_isStatic(raw) } != 0)
    }

    pub fn is_virtual_method(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXMethod_isVirtual(raw) } != 0)
    }

    pub fn is_pure_virtual_method(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXMethod_isPureVirtual(raw) } != 0)
    }

    pub fn is_defaulted_method(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXMethod_isDefaulted(raw) } != 0)
    }

    pub fn is_deleted_method(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXMethod_isDeleted(raw) } != 0)
    }

    pub fn is_explicit_method(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXMethod_isExplicit(raw) } != 0)
    }

    pub fn is_copy_assignment_operator(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXMethod_isCopyAssignmentOperator(raw) } != 0)
    }

    pub fn is_move_assignment_operator(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXMethod_isMoveAssignmentOperator(raw) } != 0)
    }

    pub fn is_converting_constructor(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXConstructor_isConvertingConstructor(raw) } != 0)
    }

    pub fn is_copy_constructor(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXConstructor_isCopyConstructor(raw) } != 0)
    }

    pub fn is_default_constructor(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXConstructor_isDefaultConstructor(raw) } != 0)
    }

    pub fn is_move_constructor(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_CXXConstructor_isMoveConstructor(raw) } != 0)
    }

    pub fn objc_type_encoding(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe {
            clang_getDeclObjCTypeEncoding(raw)
        }))
    }

    pub fn objc_property_attributes(&self) -> Result<ObjCPropertyAttributes> {
        let raw = self.check()?;
        let bits = unsafe { clang_Cursor_getObjCPropertyAttributes(raw, 0) };
        Ok(ObjCPropertyAttributes::from_bits_retain(bits as u32))
    }

    pub fn objc_decl_qualifiers(&self) -> Result<ObjCDeclQualifiers> {
        let raw = self.check()?;
        let bits = unsafe { clang_Cursor_getObjCDeclQualifiers(raw) };
        Ok(ObjCDeclQualifiers::from_bits_retain(bits as u32))
    }

    pub fn objc_property_getter_name(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe {
            clang_Cursor_getObjCPropertyGetterName(raw)
        }))
    }

    pub fn objc_property_setter_name(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe {
            clang_Cursor_getObjCPropertySetterName(raw)
        }))
    }

    /// Index of the selector piece a message expression cursor points at.
    pub fn objc_selector_index(&self) -> Result<Option<u32>> {
        let raw = self.check()?;
        let index = unsafe { clang_Cursor_getObjCSelectorIndex(raw) };
        Ok((index >= 0).then_some(index as u32))
    }

    pub fn is_objc_optional(&self) -> Result<bool> {
        let raw = self.check()?;
        Ok(unsafe { clang_Cursor_isObjCOptional(raw) } != 0)
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        unsafe { clang_equalCursors(self.raw, other.raw) != 0 }
    }
}

impl Eq for Cursor {}

impl Hash for Cursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_value().hash(state);
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Cursor");
        s.field("kind", &self.kind());
        if let Ok(spelling) = self.spelling() {
            s.field("spelling", &spelling);
        }
        s.finish()
    }
}
