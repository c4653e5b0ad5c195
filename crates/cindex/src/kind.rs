//! Kind enumerations.
//!
//! Cursor and type kinds are open sets that grow with every libclang
//! release, so they are transparent newtypes with named constants. Closed
//! enumerations are plain Rust enums converted at the boundary.

use crate::string::cx_string_to_string;
use clang_sys::*;
use std::fmt;

macro_rules! open_kinds {
    ($ty:ident { $($name:ident = $raw:ident,)* }) => {
        impl $ty {
            $(pub const $name: $ty = $ty($raw);)*

            /// Name of the constant for a known kind.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $(x if x == $raw => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $repr:ty {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            /// Convert a native value; `None` for values this adapter does not know.
            pub fn from_raw(raw: $repr) -> Option<Self> {
                match raw {
                    $(x if x == $value => Some($name::$variant),)*
                    _ => None,
                }
            }

            pub fn to_raw(self) -> $repr {
                match self {
                    $($name::$variant => $value,)*
                }
            }
        }
    };
}

pub(crate) use closed_enum;

/// The kind of a cursor (`CXCursorKind`).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorKind(pub CXCursorKind);

open_kinds!(CursorKind {
    UNEXPOSED_DECL = CXCursor_UnexposedDecl,
    STRUCT_DECL = CXCursor_StructDecl,
    UNION_DECL = CXCursor_UnionDecl,
    CLASS_DECL = CXCursor_ClassDecl,
    ENUM_DECL = CXCursor_EnumDecl,
    FIELD_DECL = CXCursor_FieldDecl,
    ENUM_CONSTANT_DECL = CXCursor_EnumConstantDecl,
    FUNCTION_DECL = CXCursor_FunctionDecl,
    VAR_DECL = CXCursor_VarDecl,
    PARM_DECL = CXCursor_ParmDecl,
    OBJC_INTERFACE_DECL = CXCursor_ObjCInterfaceDecl,
    OBJC_CATEGORY_DECL = CXCursor_ObjCCategoryDecl,
    OBJC_PROTOCOL_DECL = CXCursor_ObjCProtocolDecl,
    OBJC_PROPERTY_DECL = CXCursor_ObjCPropertyDecl,
    OBJC_IVAR_DECL = CXCursor_ObjCIvarDecl,
    OBJC_INSTANCE_METHOD_DECL = CXCursor_ObjCInstanceMethodDecl,
    OBJC_CLASS_METHOD_DECL = CXCursor_ObjCClassMethodDecl,
    OBJC_IMPLEMENTATION_DECL = CXCursor_ObjCImplementationDecl,
    OBJC_CATEGORY_IMPL_DECL = CXCursor_ObjCCategoryImplDecl,
    TYPEDEF_DECL = CXCursor_TypedefDecl,
    CXX_METHOD = CXCursor_CXXMethod,
    NAMESPACE = CXCursor_Namespace,
    LINKAGE_SPEC = CXCursor_LinkageSpec,
    CONSTRUCTOR = CXCursor_Constructor,
    DESTRUCTOR = CXCursor_Destructor,
    CONVERSION_FUNCTION = CXCursor_ConversionFunction,
    TEMPLATE_TYPE_PARAMETER = CXCursor_TemplateTypeParameter,
    NON_TYPE_TEMPLATE_PARAMETER = CXCursor_NonTypeTemplateParameter,
    TEMPLATE_TEMPLATE_PARAMETER = CXCursor_TemplateTemplateParameter,
    FUNCTION_TEMPLATE = CXCursor_FunctionTemplate,
    CLASS_TEMPLATE = CXCursor_ClassTemplate,
    CLASS_TEMPLATE_PARTIAL_SPECIALIZATION = CXCursor_ClassTemplatePartialSpecialization,
    NAMESPACE_ALIAS = CXCursor_NamespaceAlias,
    USING_DIRECTIVE = CXCursor_UsingDirective,
    USING_DECLARATION = CXCursor_UsingDeclaration,
    TYPE_ALIAS_DECL = CXCursor_TypeAliasDecl,
    OBJC_SYNTHESIZE_DECL = CXCursor_ObjCSynthesizeDecl,
    OBJC_DYNAMIC_DECL = CXCursor_ObjCDynamicDecl,
    CXX_ACCESS_SPECIFIER = CXCursor_CXXAccessSpecifier,
    OBJC_SUPER_CLASS_REF = CXCursor_ObjCSuperClassRef,
    OBJC_PROTOCOL_REF = CXCursor_ObjCProtocolRef,
    OBJC_CLASS_REF = CXCursor_ObjCClassRef,
    TYPE_REF = CXCursor_TypeRef,
    CXX_BASE_SPECIFIER = CXCursor_CXXBaseSpecifier,
    TEMPLATE_REF = CXCursor_TemplateRef,
    NAMESPACE_REF = CXCursor_NamespaceRef,
    MEMBER_REF = CXCursor_MemberRef,
    LABEL_REF = CXCursor_LabelRef,
    OVERLOADED_DECL_REF = CXCursor_OverloadedDeclRef,
    VARIABLE_REF = CXCursor_VariableRef,
    INVALID_FILE = CXCursor_InvalidFile,
    NO_DECL_FOUND = CXCursor_NoDeclFound,
    NOT_IMPLEMENTED = CXCursor_NotImplemented,
    INVALID_CODE = CXCursor_InvalidCode,
    UNEXPOSED_EXPR = CXCursor_UnexposedExpr,
    DECL_REF_EXPR = CXCursor_DeclRefExpr,
    MEMBER_REF_EXPR = CXCursor_MemberRefExpr,
    CALL_EXPR = CXCursor_CallExpr,
    OBJC_MESSAGE_EXPR = CXCursor_ObjCMessageExpr,
    BLOCK_EXPR = CXCursor_BlockExpr,
    INTEGER_LITERAL = CXCursor_IntegerLiteral,
    FLOATING_LITERAL = CXCursor_FloatingLiteral,
    IMAGINARY_LITERAL = CXCursor_ImaginaryLiteral,
    STRING_LITERAL = CXCursor_StringLiteral,
    CHARACTER_LITERAL = CXCursor_CharacterLiteral,
    PAREN_EXPR = CXCursor_ParenExpr,
    UNARY_OPERATOR = CXCursor_UnaryOperator,
    ARRAY_SUBSCRIPT_EXPR = CXCursor_ArraySubscriptExpr,
    BINARY_OPERATOR = CXCursor_BinaryOperator,
    COMPOUND_ASSIGN_OPERATOR = CXCursor_CompoundAssignOperator,
    CONDITIONAL_OPERATOR = CXCursor_ConditionalOperator,
    CSTYLE_CAST_EXPR = CXCursor_CStyleCastExpr,
    COMPOUND_LITERAL_EXPR = CXCursor_CompoundLiteralExpr,
    INIT_LIST_EXPR = CXCursor_InitListExpr,
    ADDR_LABEL_EXPR = CXCursor_AddrLabelExpr,
    STMT_EXPR = CXCursor_StmtExpr,
    GENERIC_SELECTION_EXPR = CXCursor_GenericSelectionExpr,
    GNU_NULL_EXPR = CXCursor_GNUNullExpr,
    CXX_STATIC_CAST_EXPR = CXCursor_CXXStaticCastExpr,
    CXX_DYNAMIC_CAST_EXPR = CXCursor_CXXDynamicCastExpr,
    CXX_REINTERPRET_CAST_EXPR = CXCursor_CXXReinterpretCastExpr,
    CXX_CONST_CAST_EXPR = CXCursor_CXXConstCastExpr,
    CXX_FUNCTIONAL_CAST_EXPR = CXCursor_CXXFunctionalCastExpr,
    CXX_TYPEID_EXPR = CXCursor_CXXTypeidExpr,
    CXX_BOOL_LITERAL_EXPR = CXCursor_CXXBoolLiteralExpr,
    CXX_NULL_PTR_LITERAL_EXPR = CXCursor_CXXNullPtrLiteralExpr,
    CXX_THIS_EXPR = CXCursor_CXXThisExpr,
    CXX_THROW_EXPR = CXCursor_CXXThrowExpr,
    CXX_NEW_EXPR = CXCursor_CXXNewExpr,
    CXX_DELETE_EXPR = CXCursor_CXXDeleteExpr,
    UNARY_EXPR = CXCursor_UnaryExpr,
    OBJC_STRING_LITERAL = CXCursor_ObjCStringLiteral,
    OBJC_ENCODE_EXPR = CXCursor_ObjCEncodeExpr,
    OBJC_SELECTOR_EXPR = CXCursor_ObjCSelectorExpr,
    OBJC_PROTOCOL_EXPR = CXCursor_ObjCProtocolExpr,
    PACK_EXPANSION_EXPR = CXCursor_PackExpansionExpr,
    SIZE_OF_PACK_EXPR = CXCursor_SizeOfPackExpr,
    LAMBDA_EXPR = CXCursor_LambdaExpr,
    UNEXPOSED_STMT = CXCursor_UnexposedStmt,
    LABEL_STMT = CXCursor_LabelStmt,
    COMPOUND_STMT = CXCursor_CompoundStmt,
    CASE_STMT = CXCursor_CaseStmt,
    DEFAULT_STMT = CXCursor_DefaultStmt,
    IF_STMT = CXCursor_IfStmt,
    SWITCH_STMT = CXCursor_SwitchStmt,
    WHILE_STMT = CXCursor_WhileStmt,
    DO_STMT = CXCursor_DoStmt,
    FOR_STMT = CXCursor_ForStmt,
    GOTO_STMT = CXCursor_GotoStmt,
    INDIRECT_GOTO_STMT = CXCursor_IndirectGotoStmt,
    CONTINUE_STMT = CXCursor_ContinueStmt,
    BREAK_STMT = CXCursor_BreakStmt,
    RETURN_STMT = CXCursor_ReturnStmt,
    ASM_STMT = CXCursor_AsmStmt,
    CXX_CATCH_STMT = CXCursor_CXXCatchStmt,
    CXX_TRY_STMT = CXCursor_CXXTryStmt,
    CXX_FOR_RANGE_STMT = CXCursor_CXXForRangeStmt,
    NULL_STMT = CXCursor_NullStmt,
    DECL_STMT = CXCursor_DeclStmt,
    TRANSLATION_UNIT = CXCursor_TranslationUnit,
    UNEXPOSED_ATTR = CXCursor_UnexposedAttr,
    PACKED_ATTR = CXCursor_PackedAttr,
    PURE_ATTR = CXCursor_PureAttr,
    CONST_ATTR = CXCursor_ConstAttr,
    VISIBILITY_ATTR = CXCursor_VisibilityAttr,
    PREPROCESSING_DIRECTIVE = CXCursor_PreprocessingDirective,
    MACRO_DEFINITION = CXCursor_MacroDefinition,
    MACRO_EXPANSION = CXCursor_MacroExpansion,
    INCLUSION_DIRECTIVE = CXCursor_InclusionDirective,
    MODULE_IMPORT_DECL = CXCursor_ModuleImportDecl,
    TYPE_ALIAS_TEMPLATE_DECL = CXCursor_TypeAliasTemplateDecl,
    STATIC_ASSERT = CXCursor_StaticAssert,
    FRIEND_DECL = CXCursor_FriendDecl,
});

impl CursorKind {
    pub fn is_declaration(self) -> bool {
        unsafe { clang_isDeclaration(self.0) != 0 }
    }

    pub fn is_reference(self) -> bool {
        unsafe { clang_isReference(self.0) != 0 }
    }

    pub fn is_expression(self) -> bool {
        unsafe { clang_isExpression(self.0) != 0 }
    }

    pub fn is_statement(self) -> bool {
        unsafe { clang_isStatement(self.0) != 0 }
    }

    pub fn is_attribute(self) -> bool {
        unsafe { clang_isAttribute(self.0) != 0 }
    }

    pub fn is_invalid(self) -> bool {
        unsafe { clang_isInvalid(self.0) != 0 }
    }

    pub fn is_translation_unit(self) -> bool {
        unsafe { clang_isTranslationUnit(self.0) != 0 }
    }

    pub fn is_preprocessing(self) -> bool {
        unsafe { clang_isPreprocessing(self.0) != 0 }
    }

    pub fn is_unexposed(self) -> bool {
        unsafe { clang_isUnexposed(self.0) != 0 }
    }

    /// libclang's name for the kind, e.g. `FunctionDecl`.
    pub fn spelling(self) -> String {
        cx_string_to_string(unsafe { clang_getCursorKindSpelling(self.0) })
    }
}

impl fmt::Debug for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "CursorKind::{}", name),
            None => write!(f, "CursorKind({})", self.0),
        }
    }
}

/// The kind of a type (`CXTypeKind`).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKind(pub CXTypeKind);

open_kinds!(TypeKind {
    INVALID = CXType_Invalid,
    UNEXPOSED = CXType_Unexposed,
    VOID = CXType_Void,
    BOOL = CXType_Bool,
    CHAR_U = CXType_Char_U,
    UCHAR = CXType_UChar,
    CHAR16 = CXType_Char16,
    CHAR32 = CXType_Char32,
    USHORT = CXType_UShort,
    UINT = CXType_UInt,
    ULONG = CXType_ULong,
    ULONG_LONG = CXType_ULongLong,
    UINT128 = CXType_UInt128,
    CHAR_S = CXType_Char_S,
    SCHAR = CXType_SChar,
    WCHAR = CXType_WChar,
    SHORT = CXType_Short,
    INT = CXType_Int,
    LONG = CXType_Long,
    LONG_LONG = CXType_LongLong,
    INT128 = CXType_Int128,
    FLOAT = CXType_Float,
    DOUBLE = CXType_Double,
    LONG_DOUBLE = CXType_LongDouble,
    NULL_PTR = CXType_NullPtr,
    OVERLOAD = CXType_Overload,
    DEPENDENT = CXType_Dependent,
    OBJC_ID = CXType_ObjCId,
    OBJC_CLASS = CXType_ObjCClass,
    OBJC_SEL = CXType_ObjCSel,
    FLOAT128 = CXType_Float128,
    COMPLEX = CXType_Complex,
    POINTER = CXType_Pointer,
    BLOCK_POINTER = CXType_BlockPointer,
    LVALUE_REFERENCE = CXType_LValueReference,
    RVALUE_REFERENCE = CXType_RValueReference,
    RECORD = CXType_Record,
    ENUM = CXType_Enum,
    TYPEDEF = CXType_Typedef,
    OBJC_INTERFACE = CXType_ObjCInterface,
    OBJC_OBJECT_POINTER = CXType_ObjCObjectPointer,
    FUNCTION_NO_PROTO = CXType_FunctionNoProto,
    FUNCTION_PROTO = CXType_FunctionProto,
    CONSTANT_ARRAY = CXType_ConstantArray,
    VECTOR = CXType_Vector,
    INCOMPLETE_ARRAY = CXType_IncompleteArray,
    VARIABLE_ARRAY = CXType_VariableArray,
    DEPENDENT_SIZED_ARRAY = CXType_DependentSizedArray,
    MEMBER_POINTER = CXType_MemberPointer,
    AUTO = CXType_Auto,
    ELABORATED = CXType_Elaborated,
});

impl TypeKind {
    /// libclang's name for the kind, e.g. `Pointer`.
    pub fn spelling(self) -> String {
        cx_string_to_string(unsafe { clang_getTypeKindSpelling(self.0) })
    }
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "TypeKind::{}", name),
            None => write!(f, "TypeKind({})", self.0),
        }
    }
}

closed_enum! {
    /// Linkage of an entity (`CXLinkageKind`).
    pub enum Linkage: CXLinkageKind {
        Invalid = 0,
        NoLinkage = 1,
        Internal = 2,
        UniqueExternal = 3,
        External = 4,
    }
}

closed_enum! {
    /// Symbol visibility (`CXVisibilityKind`).
    pub enum Visibility: CXVisibilityKind {
        Invalid = 0,
        Hidden = 1,
        Protected = 2,
        Default = 3,
    }
}

closed_enum! {
    /// Availability of an entity (`CXAvailabilityKind`).
    pub enum AvailabilityKind: CXAvailabilityKind {
        Available = 0,
        Deprecated = 1,
        NotAvailable = 2,
        NotAccessible = 3,
    }
}

closed_enum! {
    /// C++ access control level (`CX_CXXAccessSpecifier`).
    pub enum AccessSpecifier: CX_CXXAccessSpecifier {
        Invalid = 0,
        Public = 1,
        Protected = 2,
        Private = 3,
    }
}

closed_enum! {
    /// Language an entity was declared in (`CXLanguageKind`).
    pub enum Language: CXLanguageKind {
        Invalid = 0,
        C = 1,
        ObjC = 2,
        CPlusPlus = 3,
    }
}

closed_enum! {
    /// Thread-local storage kind of a variable (`CXTLSKind`).
    pub enum TlsKind: CXTLSKind {
        None = 0,
        Dynamic = 1,
        Static = 2,
    }
}

closed_enum! {
    /// Storage class of a declaration (`CX_StorageClass`).
    pub enum StorageClass: CX_StorageClass {
        Invalid = 0,
        None = 1,
        Extern = 2,
        Static = 3,
        PrivateExtern = 4,
        OpenClWorkGroupLocal = 5,
        Auto = 6,
        Register = 7,
    }
}

closed_enum! {
    /// Calling convention of a function type (`CXCallingConv`).
    pub enum CallingConv: CXCallingConv {
        Default = 0,
        C = 1,
        X86StdCall = 2,
        X86FastCall = 3,
        X86ThisCall = 4,
        X86Pascal = 5,
        Aapcs = 6,
        AapcsVfp = 7,
        X86RegCall = 8,
        IntelOclBicc = 9,
        Win64 = 10,
        X86_64SysV = 11,
        X86VectorCall = 12,
        Swift = 13,
        PreserveMost = 14,
        PreserveAll = 15,
        AArch64VectorCall = 16,
        SwiftAsync = 17,
        AArch64SvePcs = 18,
        Invalid = 100,
        Unexposed = 200,
    }
}

closed_enum! {
    /// Reference qualifier of a C++ member function type (`CXRefQualifierKind`).
    pub enum RefQualifier: CXRefQualifierKind {
        None = 0,
        LValue = 1,
        RValue = 2,
    }
}

closed_enum! {
    /// Kind of a template argument (`CXTemplateArgumentKind`).
    pub enum TemplateArgumentKind: CXTemplateArgumentKind {
        Null = 0,
        Type = 1,
        Declaration = 2,
        NullPtr = 3,
        Integral = 4,
        Template = 5,
        TemplateExpansion = 6,
        Expression = 7,
        Pack = 8,
        Invalid = 9,
    }
}

closed_enum! {
    /// Exception specification of a function type (`CXCursor_ExceptionSpecificationKind`).
    pub enum ExceptionSpecification: i32 {
        None = 0,
        DynamicNone = 1,
        Dynamic = 2,
        MsAny = 3,
        BasicNoexcept = 4,
        ComputedNoexcept = 5,
        Unevaluated = 6,
        Uninstantiated = 7,
        Unparsed = 8,
        NoThrow = 9,
    }
}

closed_enum! {
    /// Nullability annotation of a pointer type (`CXTypeNullabilityKind`).
    pub enum Nullability: CXTypeNullabilityKind {
        NonNull = 0,
        Nullable = 1,
        Unspecified = 2,
        Invalid = 3,
        NullableResult = 4,
    }
}

closed_enum! {
    /// Kind of a lexical token (`CXTokenKind`).
    pub enum TokenKind: CXTokenKind {
        Punctuation = 0,
        Keyword = 1,
        Identifier = 2,
        Literal = 3,
        Comment = 4,
    }
}

closed_enum! {
    /// Kind of a constant evaluation result (`CXEvalResultKind`).
    pub enum EvalResultKind: CXEvalResultKind {
        Unexposed = 0,
        Int = 1,
        Float = 2,
        ObjCStrLiteral = 3,
        StrLiteral = 4,
        CfStr = 5,
        Other = 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_kind_constants_match_native_values() {
        assert_eq!(CursorKind::STRUCT_DECL.0, 2);
        assert_eq!(CursorKind::FUNCTION_DECL.0, 8);
        assert_eq!(CursorKind::TRANSLATION_UNIT.0, 350);
        assert_eq!(CursorKind::FUNCTION_DECL.name(), Some("FUNCTION_DECL"));
    }

    #[test]
    fn test_unknown_cursor_kind_is_kept() {
        let kind = CursorKind(9999);
        assert_eq!(kind.name(), None);
        assert_eq!(format!("{:?}", kind), "CursorKind(9999)");
        assert_eq!(format!("{:?}", CursorKind::VAR_DECL), "CursorKind::VAR_DECL");
    }

    #[test]
    fn test_type_kind_constants() {
        assert_eq!(TypeKind::INVALID.0, 0);
        assert_eq!(TypeKind::INT.0, 17);
        assert_eq!(TypeKind::POINTER.0, 101);
        assert_eq!(TypeKind::RECORD.name(), Some("RECORD"));
    }

    #[test]
    fn test_closed_enum_round_trip() {
        for raw in 0..=4 {
            assert_eq!(Linkage::from_raw(raw).map(Linkage::to_raw), Some(raw));
        }
        assert_eq!(Linkage::from_raw(17), None);
        assert_eq!(CallingConv::from_raw(200), Some(CallingConv::Unexposed));
        assert_eq!(StorageClass::Register.to_raw(), 7);
        assert_eq!(TokenKind::from_raw(2), Some(TokenKind::Identifier));
    }
}
