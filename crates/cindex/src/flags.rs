//! Bit sets passed to and returned from libclang.
//!
//! Bit values match the native enumerations exactly; they are passed across
//! the boundary with `bits()` and read back with `from_bits_retain`.

use crate::error::{Error, Result};

bitflags::bitflags! {
    /// Thread priority options for an index (`CXGlobalOptFlags`).
    #[repr(transparent)]
    #[derive(Default, Copy, Clone, Debug, Hash, PartialEq, Eq)]
    pub struct GlobalOptions: u32 {
        const THREAD_BACKGROUND_PRIORITY_FOR_INDEXING = 0x1;
        const THREAD_BACKGROUND_PRIORITY_FOR_EDITING = 0x2;
        const THREAD_BACKGROUND_PRIORITY_FOR_ALL = 0x3;
    }
}

bitflags::bitflags! {
    /// Options for parsing a translation unit (`CXTranslationUnit_Flags`).
    #[repr(transparent)]
    #[derive(Default, Copy, Clone, Debug, Hash, PartialEq, Eq)]
    pub struct TranslationUnitFlags: u32 {
        const DETAILED_PREPROCESSING_RECORD = 0x1;
        const INCOMPLETE = 0x2;
        const PRECOMPILED_PREAMBLE = 0x4;
        const CACHE_COMPLETION_RESULTS = 0x8;
        const FOR_SERIALIZATION = 0x10;
        const CXX_CHAINED_PCH = 0x20;
        const SKIP_FUNCTION_BODIES = 0x40;
        const INCLUDE_BRIEF_COMMENTS_IN_CODE_COMPLETION = 0x80;
        const CREATE_PREAMBLE_ON_FIRST_PARSE = 0x100;
        const KEEP_GOING = 0x200;
        const SINGLE_FILE_PARSE = 0x400;
        const LIMIT_SKIP_FUNCTION_BODIES_TO_PREAMBLE = 0x800;
        const INCLUDE_ATTRIBUTED_TYPES = 0x1000;
        const VISIT_IMPLICIT_ATTRIBUTES = 0x2000;
        const IGNORE_NON_ERRORS_FROM_INCLUDED_FILES = 0x4000;
        const RETAIN_EXCLUDED_CONDITIONAL_BLOCKS = 0x8000;
    }
}

impl TranslationUnitFlags {
    /// Flags used by editors: detailed preprocessing record, incomplete,
    /// precompiled preamble and cached completion results.
    pub fn editing() -> Self {
        Self::DETAILED_PREPROCESSING_RECORD
            | Self::INCOMPLETE
            | Self::PRECOMPILED_PREAMBLE
            | Self::CACHE_COMPLETION_RESULTS
    }

    /// Combine flags named in configuration.
    ///
    /// Names are matched case-insensitively against the constant names, so
    /// `skip_function_bodies` selects [`Self::SKIP_FUNCTION_BODIES`].
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        names.iter().try_fold(Self::empty(), |flags, name| {
            let name = name.as_ref();
            Self::from_name(&name.trim().to_ascii_uppercase())
                .map(|flag| flags | flag)
                .ok_or_else(|| Error::UnknownFlag(name.to_string()))
        })
    }
}

bitflags::bitflags! {
    /// Options for an indexing run (`CXIndexOptFlags`).
    #[repr(transparent)]
    #[derive(Default, Copy, Clone, Debug, Hash, PartialEq, Eq)]
    pub struct IndexOptions: u32 {
        const SUPPRESS_REDUNDANT_REFS = 0x1;
        const INDEX_FUNCTION_LOCAL_SYMBOLS = 0x2;
        const INDEX_IMPLICIT_TEMPLATE_INSTANTIATIONS = 0x4;
        const SUPPRESS_WARNINGS = 0x8;
        const SKIP_PARSED_BODIES_IN_SESSION = 0x10;
    }
}

bitflags::bitflags! {
    /// Roles of a symbol occurrence reported to the indexer (`CXSymbolRole`).
    #[repr(transparent)]
    #[derive(Default, Copy, Clone, Debug, Hash, PartialEq, Eq)]
    pub struct SymbolRoles: u32 {
        const DECLARATION = 1 << 0;
        const DEFINITION = 1 << 1;
        const REFERENCE = 1 << 2;
        const READ = 1 << 3;
        const WRITE = 1 << 4;
        const CALL = 1 << 5;
        const DYNAMIC = 1 << 6;
        const ADDRESS_OF = 1 << 7;
        const IMPLICIT = 1 << 8;
    }
}

bitflags::bitflags! {
    /// Parts of a diagnostic to include when formatting (`CXDiagnosticDisplayOptions`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
    pub struct DiagnosticDisplayOptions: u32 {
        const SOURCE_LOCATION = 0x01;
        const COLUMN = 0x02;
        const SOURCE_RANGES = 0x04;
        const OPTION = 0x08;
        const CATEGORY_ID = 0x10;
        const CATEGORY_NAME = 0x20;
    }
}

impl Default for DiagnosticDisplayOptions {
    /// The same set `clang_defaultDiagnosticDisplayOptions` returns.
    fn default() -> Self {
        Self::SOURCE_LOCATION | Self::COLUMN | Self::OPTION
    }
}

bitflags::bitflags! {
    /// Options for code completion (`CXCodeComplete_Flags`).
    #[repr(transparent)]
    #[derive(Default, Copy, Clone, Debug, Hash, PartialEq, Eq)]
    pub struct CodeCompleteFlags: u32 {
        const INCLUDE_MACROS = 0x01;
        const INCLUDE_CODE_PATTERNS = 0x02;
        const INCLUDE_BRIEF_COMMENTS = 0x04;
        const SKIP_PREAMBLE = 0x08;
        const INCLUDE_COMPLETIONS_WITH_FIX_ITS = 0x10;
    }
}

bitflags::bitflags! {
    /// Contexts a code completion result may appear in (`CXCompletionContext`).
    #[repr(transparent)]
    #[derive(Default, Copy, Clone, Debug, Hash, PartialEq, Eq)]
    pub struct CompletionContexts: u64 {
        const ANY_TYPE = 1 << 0;
        const ANY_VALUE = 1 << 1;
        const OBJC_OBJECT_VALUE = 1 << 2;
        const OBJC_SELECTOR_VALUE = 1 << 3;
        const CXX_CLASS_TYPE_VALUE = 1 << 4;
        const DOT_MEMBER_ACCESS = 1 << 5;
        const ARROW_MEMBER_ACCESS = 1 << 6;
        const OBJC_PROPERTY_ACCESS = 1 << 7;
        const ENUM_TAG = 1 << 8;
        const UNION_TAG = 1 << 9;
        const STRUCT_TAG = 1 << 10;
        const CLASS_TAG = 1 << 11;
        const NAMESPACE = 1 << 12;
        const NESTED_NAME_SPECIFIER = 1 << 13;
        const OBJC_INTERFACE = 1 << 14;
        const OBJC_PROTOCOL = 1 << 15;
        const OBJC_CATEGORY = 1 << 16;
        const OBJC_INSTANCE_MESSAGE = 1 << 17;
        const OBJC_CLASS_MESSAGE = 1 << 18;
        const OBJC_SELECTOR_NAME = 1 << 19;
        const MACRO_NAME = 1 << 20;
        const NATURAL_LANGUAGE = 1 << 21;
        const INCLUDED_FILE = 1 << 22;
        const UNKNOWN = (1 << 23) - 1;
    }
}

bitflags::bitflags! {
    /// Attributes of an Objective-C property (`CXObjCPropertyAttrKind`).
    #[repr(transparent)]
    #[derive(Default, Copy, Clone, Debug, Hash, PartialEq, Eq)]
    pub struct ObjCPropertyAttributes: u32 {
        const READONLY = 0x01;
        const GETTER = 0x02;
        const ASSIGN = 0x04;
        const READWRITE = 0x08;
        const RETAIN = 0x10;
        const COPY = 0x20;
        const NONATOMIC = 0x40;
        const SETTER = 0x80;
        const ATOMIC = 0x100;
        const WEAK = 0x200;
        const STRONG = 0x400;
        const UNSAFE_UNRETAINED = 0x800;
        const CLASS = 0x1000;
    }
}

bitflags::bitflags! {
    /// Qualifiers on an Objective-C method or parameter (`CXObjCDeclQualifierKind`).
    #[repr(transparent)]
    #[derive(Default, Copy, Clone, Debug, Hash, PartialEq, Eq)]
    pub struct ObjCDeclQualifiers: u32 {
        const IN = 0x1;
        const INOUT = 0x2;
        const OUT = 0x4;
        const BYCOPY = 0x8;
        const BYREF = 0x10;
        const ONEWAY = 0x20;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_unit_flag_values() {
        assert_eq!(TranslationUnitFlags::empty().bits(), 0);
        assert_eq!(TranslationUnitFlags::DETAILED_PREPROCESSING_RECORD.bits(), 1);
        assert_eq!(TranslationUnitFlags::SKIP_FUNCTION_BODIES.bits(), 64);
        assert_eq!(TranslationUnitFlags::KEEP_GOING.bits(), 512);
        assert_eq!(
            TranslationUnitFlags::RETAIN_EXCLUDED_CONDITIONAL_BLOCKS.bits(),
            32768
        );
        assert_eq!(TranslationUnitFlags::editing().bits(), 0xf);
    }

    #[test]
    fn test_global_options_all_is_union() {
        assert_eq!(
            GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_ALL,
            GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_INDEXING
                | GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_EDITING
        );
    }

    #[test]
    fn test_flags_from_names() {
        let flags =
            TranslationUnitFlags::from_names(&["skip_function_bodies", "Keep_Going"]).unwrap();
        assert_eq!(
            flags,
            TranslationUnitFlags::SKIP_FUNCTION_BODIES | TranslationUnitFlags::KEEP_GOING
        );
        let none: [&str; 0] = [];
        assert_eq!(
            TranslationUnitFlags::from_names(&none).unwrap(),
            TranslationUnitFlags::empty()
        );
    }

    #[test]
    fn test_unknown_flag_name() {
        let err = TranslationUnitFlags::from_names(&["fast_mode"]).unwrap_err();
        assert!(matches!(err, Error::UnknownFlag(name) if name == "fast_mode"));
    }

    #[test]
    fn test_unknown_native_bits_are_retained() {
        let raw = 0x1 | 0x40 | 0x8000_0000;
        let ctx = CompletionContexts::from_bits_retain(raw);
        assert!(ctx.contains(CompletionContexts::ANY_TYPE));
        assert_eq!(ctx.bits(), raw);
    }

    #[test]
    fn test_default_display_options() {
        assert_eq!(DiagnosticDisplayOptions::default().bits(), 0x0b);
    }
}
