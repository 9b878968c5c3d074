//! Database column types to target-language types.

use crate::language::SdkLanguage;

/// How a mapped type should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatatypeOptions {
    /// Wrap the type in the language's nullable form.
    pub nullable: bool,
}

impl DatatypeOptions {
    pub const NOT_NULL: Self = Self { nullable: false };
    pub const NULLABLE: Self = Self { nullable: true };
}

/// Prefix table entry: a lower-cased DB type prefix and its mapped types.
struct Mapping {
    prefix: &'static str,
    typescript: &'static str,
    python: &'static str,
    swift: &'static str,
}

const fn m(
    prefix: &'static str,
    typescript: &'static str,
    python: &'static str,
    swift: &'static str,
) -> Mapping {
    Mapping {
        prefix,
        typescript,
        python,
        swift,
    }
}

// Order matters: longer prefixes sharing a stem come first.
const MAPPINGS: &[Mapping] = &[
    m("tinyint(1)", "boolean", "bool", "Bool"),
    m("bit(1)", "boolean", "bool", "Bool"),
    m("bool", "boolean", "bool", "Bool"),
    m("tinyint", "number", "int", "Int"),
    m("smallint", "number", "int", "Int"),
    m("mediumint", "number", "int", "Int"),
    m("bigint", "number", "int", "Int"),
    m("int", "number", "int", "Int"),
    m("decimal", "number", "Decimal", "Decimal"),
    m("numeric", "number", "Decimal", "Decimal"),
    m("float", "number", "float", "Double"),
    m("double", "number", "float", "Double"),
    m("json", "JsonValue", "JsonValue", "JsonValue"),
    m("geometrycollection", "GeometryCollection", "GeometryCollection", "GeometryCollection"),
    m("geometry", "Geometry", "Geometry", "Geometry"),
    m("multipoint", "MultiPoint", "MultiPoint", "MultiPoint"),
    m("point", "Point", "Point", "Point"),
    m("multilinestring", "MultiLineString", "MultiLineString", "MultiLineString"),
    m("linestring", "LineString", "LineString", "LineString"),
    m("multipolygon", "MultiPolygon", "MultiPolygon", "MultiPolygon"),
    m("polygon", "Polygon", "Polygon", "Polygon"),
    // Temporal types only get dedicated classes in Python.
    m("datetime", "string", "DateTime", "String"),
    m("timestamp", "string", "DateTime", "String"),
    m("date", "string", "Date", "String"),
    m("time", "string", "Time", "String"),
    m("year", "number", "Year", "Int"),
];

/// Map a database column type to a target-language type.
pub fn map_datatype(db_type: &str, language: SdkLanguage, options: DatatypeOptions) -> String {
    let base = map_base_datatype(db_type, language);
    if options.nullable {
        wrap_nullable(base, language)
    } else {
        base.to_string()
    }
}

/// The mapped type before any nullable wrapping.
pub fn map_base_datatype(db_type: &str, language: SdkLanguage) -> &'static str {
    let db_type = db_type.trim().to_ascii_lowercase();
    let mapping = MAPPINGS.iter().find(|m| db_type.starts_with(m.prefix));
    match (mapping, language) {
        (Some(m), SdkLanguage::TypeScript) => m.typescript,
        (Some(m), SdkLanguage::Python) => m.python,
        (Some(m), SdkLanguage::Swift) => m.swift,
        (None, SdkLanguage::TypeScript) => "string",
        (None, SdkLanguage::Python) => "str",
        (None, SdkLanguage::Swift) => "String",
    }
}

/// Wrap a type in the language's nullable form.
///
/// Swift is left alone: optionality there is expressed by the declaration
/// (`T?`), which the caller renders.
pub fn wrap_nullable(datatype: &str, language: SdkLanguage) -> String {
    match language {
        SdkLanguage::TypeScript => format!("MaybeNull<{}>", datatype),
        SdkLanguage::Python => format!("Optional[{}]", datatype),
        SdkLanguage::Swift => datatype.to_string(),
    }
}

/// Strip one level of nullable wrapping, if present.
pub fn unwrap_nullable(datatype: &str, language: SdkLanguage) -> &str {
    let stripped = match language {
        SdkLanguage::TypeScript => datatype
            .strip_prefix("MaybeNull<")
            .and_then(|s| s.strip_suffix('>')),
        SdkLanguage::Python => datatype
            .strip_prefix("Optional[")
            .and_then(|s| s.strip_suffix(']')),
        SdkLanguage::Swift => None,
    };
    stripped.unwrap_or(datatype)
}

/// Whether `datatype` is a language primitive rather than a base-class type.
pub fn datatype_is_primitive(datatype: &str, language: SdkLanguage) -> bool {
    let primitives: &[&str] = match language {
        SdkLanguage::TypeScript => &["boolean", "number", "string"],
        SdkLanguage::Python => &["bool", "float", "int", "str"],
        SdkLanguage::Swift => &["Bool", "Double", "Int", "String"],
    };
    primitives.contains(&datatype)
}

/// Substitute the wrapper-field class for a Python primitive.
///
/// Used only in declarations derived from a table or view document; other
/// languages and non-primitive types pass through unchanged.
pub fn enhance(datatype: &str, language: SdkLanguage) -> String {
    if language != SdkLanguage::Python {
        return datatype.to_string();
    }
    let enhanced = match datatype {
        "bool" => "BoolField",
        "int" => "IntField",
        "float" => "FloatField",
        "str" => "StringField",
        other => other,
    };
    enhanced.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use SdkLanguage::*;

    fn base(db: &str, lang: SdkLanguage) -> &'static str {
        map_base_datatype(db, lang)
    }

    #[test]
    fn typescript_mapping() {
        assert_eq!(base("tinyint(1)", TypeScript), "boolean");
        assert_eq!(base("bit(1)", TypeScript), "boolean");
        for db in ["tinyint", "smallint", "mediumint", "int", "bigint(20)", "decimal(10,2)"] {
            assert_eq!(base(db, TypeScript), "number", "{}", db);
        }
        assert_eq!(base("numeric", TypeScript), "number");
        assert_eq!(base("double", TypeScript), "number");
        assert_eq!(base("json", TypeScript), "JsonValue");
        assert_eq!(base("GEOMETRY", TypeScript), "Geometry");
        assert_eq!(base("GEOMETRYCOLLECTION", TypeScript), "GeometryCollection");
        assert_eq!(base("POINT", TypeScript), "Point");
        assert_eq!(base("MULTIPOINT", TypeScript), "MultiPoint");
        assert_eq!(base("LINESTRING", TypeScript), "LineString");
        assert_eq!(base("MULTILINESTRING", TypeScript), "MultiLineString");
        assert_eq!(base("POLYGON", TypeScript), "Polygon");
        assert_eq!(base("MULTIPOLYGON", TypeScript), "MultiPolygon");
        assert_eq!(base("varchar(45)", TypeScript), "string");
        assert_eq!(base("datetime", TypeScript), "string");
    }

    #[test]
    fn python_mapping() {
        assert_eq!(base("tinyint(1)", Python), "bool");
        assert_eq!(base("int", Python), "int");
        assert_eq!(base("decimal(5,2)", Python), "Decimal");
        assert_eq!(base("float", Python), "float");
        assert_eq!(base("date", Python), "Date");
        assert_eq!(base("datetime", Python), "DateTime");
        assert_eq!(base("timestamp", Python), "DateTime");
        assert_eq!(base("time", Python), "Time");
        assert_eq!(base("year", Python), "Year");
        assert_eq!(base("varchar", Python), "str");
    }

    #[test]
    fn swift_mapping() {
        assert_eq!(base("bit(1)", Swift), "Bool");
        assert_eq!(base("int", Swift), "Int");
        assert_eq!(base("double", Swift), "Double");
        assert_eq!(base("text", Swift), "String");
    }

    #[test]
    fn nullable_round_trip() {
        for lang in SdkLanguage::ALL {
            for db in ["int", "json", "varchar(10)", "point", "datetime"] {
                let plain = map_datatype(db, lang, DatatypeOptions::NOT_NULL);
                let wrapped = map_datatype(db, lang, DatatypeOptions::NULLABLE);
                assert_eq!(unwrap_nullable(&wrapped, lang), plain);
            }
        }
        assert_eq!(
            map_datatype("int", TypeScript, DatatypeOptions::NULLABLE),
            "MaybeNull<number>"
        );
        assert_eq!(
            map_datatype("int", Python, DatatypeOptions::NULLABLE),
            "Optional[int]"
        );
        assert_eq!(map_datatype("int", Swift, DatatypeOptions::NULLABLE), "Int");
    }

    #[test]
    fn primitives() {
        assert!(datatype_is_primitive("number", TypeScript));
        assert!(!datatype_is_primitive("Unknown", TypeScript));
        assert!(datatype_is_primitive("str", Python));
        assert!(!datatype_is_primitive("Decimal", Python));
        assert!(datatype_is_primitive("Bool", Swift));
    }

    #[test]
    fn enhance_only_touches_python_primitives() {
        assert_eq!(enhance("int", Python), "IntField");
        assert_eq!(enhance("str", Python), "StringField");
        assert_eq!(enhance("Decimal", Python), "Decimal");
        assert_eq!(enhance("number", TypeScript), "number");
    }
}
