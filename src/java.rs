//! Helpers for Java type names, descriptors and class name conventions.

const PRIMITIVE_TYPES: &[&str] = &[
    "byte", "short", "int", "long", "float", "double", "char", "boolean",
];

pub fn is_primitive_type(type_name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&type_name)
}

pub fn is_void_type(type_name: &str) -> bool {
    type_name == "void"
}

/// Converts an internal class name (`java/lang/String`) to the external
/// dot-separated form (`java.lang.String`). Names already in external form
/// pass through unchanged.
pub fn to_external_name(class_name: &str) -> String {
    class_name.replace('/', ".")
}

pub fn package_name(class_name: &str) -> String {
    let external = to_external_name(class_name);
    match external.rfind('.') {
        Some(pos) => external[..pos].to_string(),
        None => String::new(),
    }
}

/// Converts a JVM field descriptor to a Java source type name:
/// `I` -> `int`, `Ljava/lang/String;` -> `java.lang.String`, `[[I` -> `int[][]`.
/// Unknown descriptors are returned verbatim so malformed input stays visible
/// in report output instead of being swallowed.
pub fn descriptor_to_java_type(descriptor: &str) -> String {
    let mut dims = 0usize;
    let mut rest = descriptor;
    while let Some(stripped) = rest.strip_prefix('[') {
        dims += 1;
        rest = stripped;
    }

    let base = match rest {
        "B" => "byte".to_string(),
        "C" => "char".to_string(),
        "D" => "double".to_string(),
        "F" => "float".to_string(),
        "I" => "int".to_string(),
        "J" => "long".to_string(),
        "S" => "short".to_string(),
        "Z" => "boolean".to_string(),
        "V" => "void".to_string(),
        _ => match rest.strip_prefix('L').and_then(|r| r.strip_suffix(';')) {
            Some(name) => to_external_name(name),
            None => return descriptor.to_string(),
        },
    };

    let mut result = base;
    for _ in 0..dims {
        result.push_str("[]");
    }
    result
}
