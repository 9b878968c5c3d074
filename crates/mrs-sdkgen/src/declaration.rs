//! Type declarations in each target language's surface syntax.
//!
//! Every function here is a pure renderer: it takes already-resolved names
//! and types and produces source text. Deciding *which* declarations exist is
//! the job of [`crate::interfaces`].

use crate::identifier::{GenerationScope, IdentifierKind, convert_case, generate_identifier};
use crate::language::SdkLanguage;
use std::fmt::Write;

/// A rendered type, possibly a list of that type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Single(String),
    List(String),
}

impl TypeRef {
    pub fn single(ty: impl Into<String>) -> Self {
        Self::Single(ty.into())
    }

    /// Render in `language` syntax.
    pub fn render(&self, language: SdkLanguage) -> String {
        match (self, language) {
            (Self::Single(t), _) => t.clone(),
            (Self::List(t), SdkLanguage::TypeScript) => format!("{}[]", t),
            (Self::List(t), SdkLanguage::Python) => format!("list[{}]", t),
            (Self::List(t), SdkLanguage::Swift) => format!("[{}]", t),
        }
    }
}

/// One field of a type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclField {
    pub name: String,
    pub ty: TypeRef,
    pub optional: bool,
}

impl DeclField {
    pub fn new(name: impl Into<String>, ty: TypeRef, optional: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            optional,
        }
    }
}

/// The named declarations derived from one stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// The stem itself: document class, row type or parameter set.
    Plain,
    Data,
    Details,
    Create,
    Update,
    Field,
    NestedField,
    Selectable,
    Sortable,
    Filterable,
    UniqueFilterable,
    Cursors,
    Out,
    ResultSet,
    Tagged,
}

/// Name of the `kind` declaration for `stem`, including the language's prefix.
pub fn declaration_name(language: SdkLanguage, stem: &str, kind: DeclarationKind) -> String {
    let p = language.interface_prefix();
    match kind {
        DeclarationKind::Plain => format!("{p}{stem}"),
        DeclarationKind::Data => format!("{p}{stem}Data"),
        DeclarationKind::Details => format!("{p}{stem}Details"),
        DeclarationKind::Create => format!("{p}New{stem}"),
        DeclarationKind::Update => format!("{p}Update{stem}"),
        DeclarationKind::Field => format!("{p}{stem}Field"),
        DeclarationKind::NestedField => format!("{p}{stem}NestedField"),
        DeclarationKind::Selectable => format!("{p}{stem}Selectable"),
        DeclarationKind::Sortable => format!("{p}{stem}Sortable"),
        DeclarationKind::Filterable => format!("{p}{stem}Filterable"),
        DeclarationKind::UniqueFilterable => format!("{p}{stem}UniqueFilterable"),
        DeclarationKind::Cursors => format!("{p}{stem}Cursors"),
        DeclarationKind::Out => format!("{p}{stem}Out"),
        DeclarationKind::ResultSet => format!("{p}{stem}ResultSet"),
        DeclarationKind::Tagged => format!("{p}Tagged{stem}"),
    }
}

/// A single field line.
///
/// With `convert_name`, the name is converted to the language's variable
/// case (snake_case for Python, lowerCamelCase for Swift).
pub fn generate_type_declaration_field(
    name: &str,
    ty: &TypeRef,
    optional: bool,
    language: SdkLanguage,
    convert_name: bool,
) -> String {
    let name = if convert_name && language != SdkLanguage::TypeScript {
        convert_case(name, IdentifierKind::Variable, language)
    } else {
        name.to_string()
    };
    let ty = ty.render(language);
    match language {
        SdkLanguage::TypeScript => {
            let marker = if optional { "?" } else { "" };
            format!("    {}{}: {},\n", name, marker, ty)
        }
        SdkLanguage::Python if optional => format!("    {}: NotRequired[{}]\n", name, ty),
        SdkLanguage::Python => format!("    {}: {}\n", name, ty),
        SdkLanguage::Swift => {
            let marker = if optional { "?" } else { "" };
            format!("    public var {}: {}{}\n", name, ty, marker)
        }
    }
}

/// Declaration of a type that exists only to be referenced (no fields).
pub fn generate_type_declaration_placeholder(name: &str, language: SdkLanguage) -> String {
    match language {
        SdkLanguage::TypeScript => format!("export type {} = never;\n\n", name),
        SdkLanguage::Python => format!("{}: TypeAlias = None\n\n\n", name),
        SdkLanguage::Swift => format!("public struct {}: Codable {{}}\n\n", name),
    }
}

/// An interface (TypeScript), `TypedDict` (Python) or struct (Swift).
///
/// Python declarations whose fields are all optional use `total=False`;
/// otherwise optional fields are marked `NotRequired`. Python parents must
/// themselves be `TypedDict`s and replace the `TypedDict` base. A Python
/// declaration without fields or parents collapses to a placeholder alias.
pub fn generate_type_declaration(
    name: &str,
    parents: &[&str],
    fields: &[DeclField],
    language: SdkLanguage,
) -> String {
    let mut out = String::new();
    match language {
        SdkLanguage::TypeScript => {
            let extends = if parents.is_empty() {
                String::new()
            } else {
                format!(" extends {}", parents.join(", "))
            };
            let _ = writeln!(out, "export interface {}{} {{", name, extends);
            for f in fields {
                out.push_str(&generate_type_declaration_field(
                    &f.name, &f.ty, f.optional, language, false,
                ));
            }
            out.push_str("}\n\n");
        }
        SdkLanguage::Python => {
            if fields.is_empty() {
                if parents.is_empty() {
                    return generate_type_declaration_placeholder(name, language);
                }
                let _ = writeln!(out, "class {}({}):\n    pass\n\n", name, parents.join(", "));
                return out;
            }
            let total = fields.iter().all(|f| f.optional);
            let mut bases = if parents.is_empty() {
                vec!["TypedDict"]
            } else {
                parents.to_vec()
            };
            if total {
                bases.push("total=False");
            }
            let _ = writeln!(out, "class {}({}):", name, bases.join(", "));
            for f in fields {
                out.push_str(&generate_type_declaration_field(
                    &f.name,
                    &f.ty,
                    f.optional && !total,
                    language,
                    false,
                ));
            }
            out.push_str("\n\n");
        }
        SdkLanguage::Swift => {
            let mut conformances = vec!["Codable"];
            conformances.extend_from_slice(parents);
            let _ = writeln!(out, "public struct {}: {} {{", name, conformances.join(", "));
            for f in fields {
                out.push_str(&generate_type_declaration_field(
                    &f.name, &f.ty, f.optional, language, false,
                ));
            }
            out.push_str("}\n\n");
        }
    }
    out
}

/// The Python `Details` class that the document class is typed against.
///
/// Other languages have no counterpart and get an empty string.
pub fn generate_details_class(name: &str, fields: &[DeclField], language: SdkLanguage) -> String {
    if language != SdkLanguage::Python {
        return String::new();
    }
    let mut out = format!("class {}(IMrsResourceDetails):\n", name);
    if fields.is_empty() {
        out.push_str("    pass\n");
    }
    for f in fields {
        out.push_str(&generate_type_declaration_field(
            &f.name, &f.ty, false, language, false,
        ));
    }
    out.push_str("\n\n");
    out
}

/// `name = target` type alias.
pub fn generate_type_alias(name: &str, target: &str, language: SdkLanguage) -> String {
    match language {
        SdkLanguage::TypeScript => format!("export type {} = {};\n\n", name, target),
        SdkLanguage::Python => format!("{}: TypeAlias = {}\n\n\n", name, target),
        SdkLanguage::Swift => format!("public typealias {} = {}\n\n", name, target),
    }
}

/// A union of string literals. Swift has no literal types and gets `String`.
pub fn generate_literal_type(values: &[String], language: SdkLanguage) -> String {
    match language {
        SdkLanguage::TypeScript => values
            .iter()
            .map(|v| format!("\"{}\"", v))
            .collect::<Vec<_>>()
            .join(" | "),
        SdkLanguage::Python => {
            let mut out = String::from("Literal[\n");
            for v in values {
                let _ = writeln!(out, "    \"{}\",", v);
            }
            out.push(']');
            out
        }
        SdkLanguage::Swift => "String".to_string(),
    }
}

/// An enumeration of string values (field names, nested field paths).
pub fn generate_enum(name: &str, values: &[String], language: SdkLanguage) -> String {
    if values.is_empty() {
        return match language {
            SdkLanguage::TypeScript => format!("export type {} = never;\n\n", name),
            SdkLanguage::Python => format!("{}: TypeAlias = None\n\n\n", name),
            SdkLanguage::Swift => format!("public typealias {} = Never\n\n", name),
        };
    }
    match language {
        SdkLanguage::TypeScript | SdkLanguage::Python => {
            generate_type_alias(name, &generate_literal_type(values, language), language)
        }
        SdkLanguage::Swift => {
            let mut scope = GenerationScope::with_seed(0);
            let mut out = format!("public enum {}: String, Codable, CaseIterable {{\n", name);
            for v in values {
                let case = generate_identifier(
                    v,
                    IdentifierKind::Variable,
                    language,
                    &mut scope,
                    &[],
                );
                let _ = writeln!(out, "    case {} = \"{}\"", swift_escape(&case), v);
            }
            out.push_str("}\n\n");
            out
        }
    }
}

/// A union over existing types.
pub fn generate_union(name: &str, members: &[String], language: SdkLanguage) -> String {
    match language {
        SdkLanguage::TypeScript if members.is_empty() => generate_type_alias(name, "never", language),
        SdkLanguage::Python if members.is_empty() => generate_type_alias(name, "None", language),
        SdkLanguage::TypeScript | SdkLanguage::Python => {
            generate_type_alias(name, &members.join(" | "), language)
        }
        SdkLanguage::Swift => {
            if members.is_empty() {
                return generate_type_alias(name, "Never", language);
            }
            let mut scope = GenerationScope::with_seed(0);
            let mut out = format!("public enum {}: Codable {{\n", name);
            for m in members {
                let case = generate_identifier(
                    m,
                    IdentifierKind::Variable,
                    language,
                    &mut scope,
                    &[],
                );
                let _ = writeln!(out, "    case {}({})", swift_escape(&case), m);
            }
            out.push_str("}\n\n");
            out
        }
    }
}

/// A fixed-length tuple of existing types.
pub fn generate_tuple(name: &str, members: &[String], language: SdkLanguage) -> String {
    let target = match language {
        SdkLanguage::TypeScript => format!("[{}]", members.join(", ")),
        SdkLanguage::Python => format!("tuple[{}]", members.join(", ")),
        SdkLanguage::Swift => format!("({})", members.join(", ")),
    };
    generate_type_alias(name, &target, language)
}

/// Inputs of the CRUD-capable document class of a table or view.
#[derive(Debug, Clone)]
pub struct DataClass<'a> {
    /// Name of the document class itself.
    pub name: &'a str,
    /// Name of the plain data shape the document wraps.
    pub data_type: &'a str,
    pub fields: &'a [DeclField],
    pub endpoint: &'a str,
    pub primary_key: Option<&'a str>,
    /// Emit the `update()` member.
    pub update: bool,
    /// Emit the `delete()` member.
    pub delete: bool,
}

/// The document class (TypeScript interface, Python dataclass, Swift class).
pub fn generate_data_class(class: &DataClass<'_>, language: SdkLanguage) -> String {
    match language {
        SdkLanguage::TypeScript => typescript_data_class(class),
        SdkLanguage::Python => python_data_class(class),
        SdkLanguage::Swift => swift_data_class(class),
    }
}

fn typescript_data_class(class: &DataClass<'_>) -> String {
    let mut out = format!(
        "export interface {} extends {} {{\n",
        class.name, class.data_type
    );
    if class.update {
        let _ = writeln!(out, "    update(): Promise<{}>;", class.name);
    }
    if class.delete {
        out.push_str("    delete(): Promise<void>;\n");
    }
    out.push_str("}\n\n");
    out
}

fn python_data_class(class: &DataClass<'_>) -> String {
    let mut out = String::new();
    out.push_str("@dataclass(init=False, repr=True)\n");
    let _ = writeln!(out, "class {}(MrsDocument[{}]):", class.name, class.data_type);
    let _ = writeln!(out, "    \"\"\"Document of the `{}` endpoint.\"\"\"\n", class.endpoint);
    out.push_str("    # For data attributes, `None` means \"NULL\" and\n");
    out.push_str("    # `UndefinedField` means \"not set or undefined\"\n");
    for f in class.fields {
        let _ = writeln!(
            out,
            "    {}: {} | UndefinedDataClassField",
            f.name,
            f.ty.render(SdkLanguage::Python)
        );
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "    def __init__(self, schema: MrsBaseSchema, data: {}) -> None:",
        class.data_type
    );
    let _ = writeln!(
        out,
        "        super().__init__(schema, data, obj_endpoint=\"{}\")\n",
        class.endpoint
    );
    let _ = writeln!(
        out,
        "    def _load_fields(self, data: {}) -> None:",
        class.data_type
    );
    if class.fields.is_empty() {
        out.push_str("        pass\n");
    }
    for f in class.fields {
        let _ = writeln!(
            out,
            "        self.{0} = data.get(\"{0}\", UndefinedField)",
            f.name
        );
    }
    out.push('\n');
    out.push_str("    @classmethod\n");
    out.push_str("    def get_primary_key_name(cls) -> Optional[str]:\n");
    match class.primary_key {
        Some(pk) => {
            let _ = writeln!(out, "        return \"{}\"", pk);
        }
        None => out.push_str("        return None\n"),
    }
    if class.update {
        out.push_str("\n    async def update(self) -> None:\n");
        out.push_str("        \"\"\"Persist the changes made to this document.\"\"\"\n");
        out.push_str("        await self._update()\n");
    }
    if class.delete {
        out.push_str("\n    async def delete(self) -> None:\n");
        out.push_str("        \"\"\"Delete the record behind this document.\"\"\"\n");
        out.push_str("        await self._delete()\n");
    }
    out.push_str("\n\n");
    out
}

fn swift_data_class(class: &DataClass<'_>) -> String {
    let mut out = format!(
        "public final class {}: MrsDocument<{}> {{\n",
        class.name, class.data_type
    );
    let _ = writeln!(
        out,
        "    public override class var endpoint: String {{ \"{}\" }}",
        class.endpoint
    );
    let pk = match class.primary_key {
        Some(pk) => format!("\"{}\"", pk),
        None => "nil".to_string(),
    };
    let _ = writeln!(
        out,
        "    public override class var primaryKey: String? {{ {} }}",
        pk
    );
    if class.update {
        let _ = write!(
            out,
            "\n    public func update() async throws -> {0} {{\n        try await self.put(as: {0}.self)\n    }}\n",
            class.name
        );
    }
    if class.delete {
        out.push_str("\n    public func delete() async throws {\n        try await self.remove()\n    }\n");
    }
    out.push_str("}\n\n");
    out
}

const SWIFT_KEYWORDS: &[&str] = &[
    "as", "case", "class", "default", "deinit", "else", "enum", "extension", "for", "func", "if",
    "import", "in", "init", "internal", "is", "let", "nil", "private", "protocol", "public",
    "return", "self", "static", "struct", "super", "switch", "throw", "true", "false", "try",
    "var", "where", "while",
];

fn swift_escape(ident: &str) -> String {
    if SWIFT_KEYWORDS.contains(&ident) {
        format!("`{}`", ident)
    } else {
        ident.to_string()
    }
}
