//! Diagnostic message table for the lookup engine.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    pub const UNDEFINED_TYPE: u32 = 1001;
    pub const NOT_VISIBLE_TYPE: u32 = 1002;
    pub const AMBIGUOUS_TYPE: u32 = 1003;
    pub const INTERNAL_TYPE_NAME_PROVIDED: u32 = 1004;
    pub const UNDEFINED_FIELD: u32 = 1101;
    pub const NOT_VISIBLE_FIELD: u32 = 1102;
    pub const AMBIGUOUS_FIELD: u32 = 1103;
    pub const NON_STATIC_FIELD_FROM_STATIC_CONTEXT: u32 = 1104;
    pub const INSTANCE_FIELD_DURING_CONSTRUCTOR_INVOCATION: u32 = 1105;
    pub const INHERITED_FIELD_HIDES_ENCLOSING_NAME: u32 = 1106;
    pub const UNDEFINED_METHOD: u32 = 1201;
    pub const NOT_VISIBLE_METHOD: u32 = 1202;
    pub const AMBIGUOUS_METHOD: u32 = 1203;
    pub const NOT_A_FUNCTION: u32 = 1204;
    pub const RECEIVER_TYPE_NOT_VISIBLE: u32 = 1205;
    pub const UNDEFINED_NAME: u32 = 1301;
    pub const IMPORT_NOT_FOUND: u32 = 1302;
    pub const DUPLICATE_FIELD: u32 = 1401;
    pub const DUPLICATE_METHOD: u32 = 1402;
    pub const DUPLICATE_LOCAL_VARIABLE: u32 = 1403;
    pub const HIERARCHY_CIRCULARITY: u32 = 1501;
    pub const HIERARCHY_HAS_PROBLEMS: u32 = 1502;
    pub const SUPERCLASS_NOT_FOUND: u32 = 1503;
    pub const STATIC_AND_INSTANCE_CONFLICT: u32 = 1601;
    pub const VISIBILITY_CONFLICT: u32 = 1602;
    pub const INCOMPATIBLE_RETURN_TYPE: u32 = 1603;
    pub const UNIT_ABORTED: u32 = 1901;
}

pub mod diagnostic_messages {
    pub const UNDEFINED_TYPE: &str = "{0} cannot be resolved to a type";
    pub const NOT_VISIBLE_TYPE: &str = "The type {0} is not visible";
    pub const AMBIGUOUS_TYPE: &str = "The type {0} is ambiguous";
    pub const INTERNAL_TYPE_NAME_PROVIDED: &str =
        "The nested type {0} cannot be referenced using its binary name";
    pub const UNDEFINED_FIELD: &str = "{0} cannot be resolved or is not a field";
    pub const NOT_VISIBLE_FIELD: &str = "The field {0}.{1} is not visible";
    pub const AMBIGUOUS_FIELD: &str = "The field {0} is ambiguous";
    pub const NON_STATIC_FIELD_FROM_STATIC_CONTEXT: &str =
        "Cannot make a static reference to the non-static field {0}";
    pub const INSTANCE_FIELD_DURING_CONSTRUCTOR_INVOCATION: &str =
        "Cannot refer to an instance field {0} while explicitly invoking a constructor";
    pub const INHERITED_FIELD_HIDES_ENCLOSING_NAME: &str =
        "The field {0} is defined in an inherited type and an enclosing scope";
    pub const UNDEFINED_METHOD: &str = "The function {0} is undefined for the type {1}";
    pub const NOT_VISIBLE_METHOD: &str = "The function {0} from the type {1} is not visible";
    pub const AMBIGUOUS_METHOD: &str = "The function {0} is ambiguous for the type {1}";
    pub const NOT_A_FUNCTION: &str = "{0} is not a function";
    pub const RECEIVER_TYPE_NOT_VISIBLE: &str = "The type {0} of the receiver is not visible";
    pub const UNDEFINED_NAME: &str = "{0} cannot be resolved";
    pub const IMPORT_NOT_FOUND: &str = "The import {0} cannot be resolved";
    pub const DUPLICATE_FIELD: &str = "Duplicate field {0}.{1}";
    pub const DUPLICATE_METHOD: &str = "Duplicate function {0} in type {1}";
    pub const DUPLICATE_LOCAL_VARIABLE: &str = "Duplicate local variable {0}";
    pub const HIERARCHY_CIRCULARITY: &str =
        "Cycle detected: the type {0} cannot extend itself through {1}";
    pub const HIERARCHY_HAS_PROBLEMS: &str =
        "The hierarchy of the type {0} is inconsistent";
    pub const SUPERCLASS_NOT_FOUND: &str = "{1} cannot be resolved as the superclass of {0}";
    pub const STATIC_AND_INSTANCE_CONFLICT: &str =
        "The function {0} in {1} conflicts with the {2} function it overrides";
    pub const VISIBILITY_CONFLICT: &str =
        "Cannot reduce the visibility of the inherited function {0} from {1}";
    pub const INCOMPATIBLE_RETURN_TYPE: &str =
        "The return type of {0} is incompatible with the inherited function from {1}";
    pub const UNIT_ABORTED: &str = "Resolution of {0} was aborted: {1}";
}

const fn error(code: u32, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        category: DiagnosticCategory::Error,
        message,
    }
}

const fn warning(code: u32, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        category: DiagnosticCategory::Warning,
        message,
    }
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    error(diagnostic_codes::UNDEFINED_TYPE, diagnostic_messages::UNDEFINED_TYPE),
    error(diagnostic_codes::NOT_VISIBLE_TYPE, diagnostic_messages::NOT_VISIBLE_TYPE),
    error(diagnostic_codes::AMBIGUOUS_TYPE, diagnostic_messages::AMBIGUOUS_TYPE),
    error(
        diagnostic_codes::INTERNAL_TYPE_NAME_PROVIDED,
        diagnostic_messages::INTERNAL_TYPE_NAME_PROVIDED,
    ),
    error(diagnostic_codes::UNDEFINED_FIELD, diagnostic_messages::UNDEFINED_FIELD),
    error(diagnostic_codes::NOT_VISIBLE_FIELD, diagnostic_messages::NOT_VISIBLE_FIELD),
    error(diagnostic_codes::AMBIGUOUS_FIELD, diagnostic_messages::AMBIGUOUS_FIELD),
    error(
        diagnostic_codes::NON_STATIC_FIELD_FROM_STATIC_CONTEXT,
        diagnostic_messages::NON_STATIC_FIELD_FROM_STATIC_CONTEXT,
    ),
    error(
        diagnostic_codes::INSTANCE_FIELD_DURING_CONSTRUCTOR_INVOCATION,
        diagnostic_messages::INSTANCE_FIELD_DURING_CONSTRUCTOR_INVOCATION,
    ),
    warning(
        diagnostic_codes::INHERITED_FIELD_HIDES_ENCLOSING_NAME,
        diagnostic_messages::INHERITED_FIELD_HIDES_ENCLOSING_NAME,
    ),
    error(diagnostic_codes::UNDEFINED_METHOD, diagnostic_messages::UNDEFINED_METHOD),
    error(diagnostic_codes::NOT_VISIBLE_METHOD, diagnostic_messages::NOT_VISIBLE_METHOD),
    error(diagnostic_codes::AMBIGUOUS_METHOD, diagnostic_messages::AMBIGUOUS_METHOD),
    error(diagnostic_codes::NOT_A_FUNCTION, diagnostic_messages::NOT_A_FUNCTION),
    error(
        diagnostic_codes::RECEIVER_TYPE_NOT_VISIBLE,
        diagnostic_messages::RECEIVER_TYPE_NOT_VISIBLE,
    ),
    error(diagnostic_codes::UNDEFINED_NAME, diagnostic_messages::UNDEFINED_NAME),
    error(diagnostic_codes::IMPORT_NOT_FOUND, diagnostic_messages::IMPORT_NOT_FOUND),
    error(diagnostic_codes::DUPLICATE_FIELD, diagnostic_messages::DUPLICATE_FIELD),
    error(diagnostic_codes::DUPLICATE_METHOD, diagnostic_messages::DUPLICATE_METHOD),
    error(
        diagnostic_codes::DUPLICATE_LOCAL_VARIABLE,
        diagnostic_messages::DUPLICATE_LOCAL_VARIABLE,
    ),
    error(
        diagnostic_codes::HIERARCHY_CIRCULARITY,
        diagnostic_messages::HIERARCHY_CIRCULARITY,
    ),
    error(
        diagnostic_codes::HIERARCHY_HAS_PROBLEMS,
        diagnostic_messages::HIERARCHY_HAS_PROBLEMS,
    ),
    error(
        diagnostic_codes::SUPERCLASS_NOT_FOUND,
        diagnostic_messages::SUPERCLASS_NOT_FOUND,
    ),
    error(
        diagnostic_codes::STATIC_AND_INSTANCE_CONFLICT,
        diagnostic_messages::STATIC_AND_INSTANCE_CONFLICT,
    ),
    error(diagnostic_codes::VISIBILITY_CONFLICT, diagnostic_messages::VISIBILITY_CONFLICT),
    error(
        diagnostic_codes::INCOMPATIBLE_RETURN_TYPE,
        diagnostic_messages::INCOMPATIBLE_RETURN_TYPE,
    ),
    error(diagnostic_codes::UNIT_ABORTED, diagnostic_messages::UNIT_ABORTED),
];
