//! Shared naming utilities
//!
//! Identifier and file-name rules used by the backends.

use regex::Regex;
use std::sync::LazyLock;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new("[^a-zA-Z0-9]+").unwrap());
static LEADING_NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[^a-zA-Z0-9]+").unwrap());
static CAPS: LazyLock<Regex> = LazyLock::new(|| Regex::new("[A-Z]+").unwrap());
static TS_NOT_ALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9_$]+").unwrap());

/// Go keywords plus the predeclared type names that cannot be shadowed safely
pub const GO_KEYWORDS: &[&str] = &[
    "break", "default", "func", "interface", "select", "case", "defer", "go", "map", "struct",
    "chan", "else", "goto", "package", "switch", "const", "fallthrough", "if", "range", "type",
    "continue", "for", "import", "return", "var", "error", "string", "bool", "uint8", "uint16",
    "uint32", "uint64", "int8", "int16", "int32", "int64", "float32", "float64", "complex64",
    "complex128", "byte", "rune",
];

pub const TS_KEYWORDS: &[&str] = &[
    "break", "as", "any", "switch", "case", "if", "throw", "else", "var", "number", "string",
    "get", "module", "type", "instanceof", "typeof", "public", "private", "enum", "export",
    "finally", "for", "while", "void", "null", "super", "this", "new", "in", "return", "true",
    "false", "extends", "static", "let", "package", "implements", "interface", "function", "try",
    "yield", "const", "continue", "do", "catch",
];

/// Capitalize the first character
///
/// # Examples
/// ```
/// use wueste_gen::util::capitalize;
/// assert_eq!(capitalize("hello"), "Hello");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Exported Go identifier
///
/// Splits on non-alphanumeric runs and capitalizes every part. Names that
/// still do not start with an uppercase letter, or collide with a keyword,
/// get an `X_` prefix.
///
/// # Examples
/// ```
/// use wueste_gen::util::go_public_name;
/// assert_eq!(go_public_name("opt-sub"), "OptSub");
/// assert_eq!(go_public_name("default-float64"), "DefaultFloat64");
/// assert_eq!(go_public_name("1st"), "X_1st");
/// ```
pub fn go_public_name(name: &str) -> String {
    let joined: String = NON_ALNUM
        .split(name)
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect();
    if joined.is_empty() {
        return joined;
    }
    if !joined.starts_with(|c: char| c.is_ascii_uppercase())
        || GO_KEYWORDS.contains(&joined.as_str())
    {
        return format!("X_{}", joined);
    }
    joined
}

/// Unexported Go identifier
///
/// # Examples
/// ```
/// use wueste_gen::util::go_private_name;
/// assert_eq!(go_private_name("SimpleType"), "simpleType");
/// assert_eq!(go_private_name("string"), "_string");
/// ```
pub fn go_private_name(name: &str) -> String {
    let public = go_public_name(name);
    let mut chars = public.chars();
    let lowered: String = match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    };
    if GO_KEYWORDS.contains(&lowered.as_str()) {
        format!("_{}", lowered)
    } else {
        lowered
    }
}

/// Exported TypeScript identifier; keywords come back quoted
///
/// # Examples
/// ```
/// use wueste_gen::util::ts_public_name;
/// assert_eq!(ts_public_name("opt-Test"), "opt_Test");
/// assert_eq!(ts_public_name("string"), "\"string\"");
/// assert_eq!(ts_public_name("SimpleType$Sub"), "SimpleType$Sub");
/// ```
pub fn ts_public_name(name: &str) -> String {
    let replaced = TS_NOT_ALLOWED.replace_all(name, "_");
    let trimmed = replaced.trim_start_matches('_');
    if TS_KEYWORDS.contains(&trimmed) {
        quote(trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Private TypeScript identifier, always `_`-prefixed
///
/// # Examples
/// ```
/// use wueste_gen::util::ts_private_name;
/// assert_eq!(ts_private_name("opt-Test"), "_opt_Test");
/// ```
pub fn ts_private_name(name: &str) -> String {
    format!("_{}", TS_NOT_ALLOWED.replace_all(name, "_"))
}

/// Base file name for a schema title, without extension
///
/// # Examples
/// ```
/// use wueste_gen::util::file_stem;
/// assert_eq!(file_stem("SimpleType"), "simple_type");
/// assert_eq!(file_stem("NestedType$Sub"), "nested_type_sub");
/// assert_eq!(file_stem("HTTPServer"), "httpserver");
/// ```
pub fn file_stem(title: &str) -> String {
    let spaced = CAPS.replace_all(title, "_$0");
    let trimmed = LEADING_NON_ALNUM.replace(&spaced, "");
    NON_ALNUM.replace_all(&trimmed, "_").to_lowercase()
}

/// JSON string literal
pub fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
