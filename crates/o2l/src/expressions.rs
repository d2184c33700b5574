use std::{fmt, rc::Rc};

/// (file, line, column) triple attached to every AST node.
///
/// The file name is shared via `Rc` so cloning locations while building
/// nested nodes stays cheap.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceLocation {
    pub file: Rc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: Rc<str>, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    /// Placeholder location for synthesized nodes (REPL input, native frames).
    pub fn unknown() -> Self {
        Self {
            file: Rc::from("<unknown>"),
            line: 0,
            column: 0,
        }
    }
}

/// Arithmetic operators of `BinaryOp` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CmpOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }
}

/// Short-circuit logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// Unary operators: numeric negation and boolean not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// A literal value as written in the source.
///
/// Kept detached from the runtime `Value` so the AST stays a pure
/// parse-time artifact; literals cross into runtime semantics in exactly
/// one place (the evaluator's literal case).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Char(u8),
    Text(String),
}

/// An expression with its source location.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExprLoc {
    pub location: SourceLocation,
    pub expr: Expr,
}

impl ExprLoc {
    pub fn new(location: SourceLocation, expr: Expr) -> Self {
        Self { location, expr }
    }
}

/// An expression in the AST. Every variant evaluates to a `Value`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Expr {
    Literal(Literal),
    /// Name to resolve in the environment, innermost scope first.
    Name(String),
    /// Dotted name resolved in the environment as a single key
    /// (namespaced objects such as `demo.Calculator`).
    QualifiedName(String),
    /// Yields the top of the `this` stack.
    This,
    /// Arithmetic: `left op right` with numeric promotion, plus `Text + Text`.
    Op {
        left: Box<ExprLoc>,
        op: BinOp,
        right: Box<ExprLoc>,
    },
    /// Comparison yielding `Bool`.
    CmpOp {
        left: Box<ExprLoc>,
        op: CmpOp,
        right: Box<ExprLoc>,
    },
    /// Short-circuit `&&` / `||` over `Bool` operands.
    Logic {
        left: Box<ExprLoc>,
        op: LogicOp,
        right: Box<ExprLoc>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<ExprLoc>,
    },
    /// Method call on an evaluated receiver.
    ///
    /// The call is *external* iff the receiver expression is not `this`;
    /// external calls require the method to be declared `@external`.
    MethodCall {
        object: Box<ExprLoc>,
        method: String,
        args: Vec<ExprLoc>,
    },
    /// Property, enum-member, or record-field access.
    MemberAccess {
        object: Box<ExprLoc>,
        member: String,
    },
    /// `new T(args)` - clones the declared object and runs its constructor.
    New {
        type_name: String,
        args: Vec<ExprLoc>,
    },
    /// `Result.success(expr)` / `Result.error(expr)`.
    ResultCall {
        success: bool,
        arg: Box<ExprLoc>,
    },
    /// Record instantiation: `Point(x = 1, y = 2)`.
    RecordInit {
        name: String,
        fields: Vec<(String, ExprLoc)>,
    },
    /// `[a, b, c]` - the element tag is taken from the first element.
    ListLiteral(Vec<ExprLoc>),
    /// `{k: v, ...}` - insertion-ordered; duplicate keys overwrite.
    MapLiteral(Vec<(ExprLoc, ExprLoc)>),
    /// `{a, b, c}` - unique membership.
    SetLiteral(Vec<ExprLoc>),
}

/// A method or constructor parameter: `name: Type`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

/// A method declaration inside an `Object`.
///
/// Constructor declarations reuse this shape under the name
/// `constructor`. Bodies are shared into object instances via `Rc` when
/// the declaration is evaluated.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: String,
    pub body: Vec<Node>,
    pub external: bool,
    pub location: SourceLocation,
}

/// A `property name: Type` declaration. Properties are set once (in the
/// constructor) and immutable afterwards.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PropertySpec {
    pub name: String,
    pub type_name: String,
    pub location: SourceLocation,
}

/// An `Object` declaration: named bag of methods and set-once properties.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ObjectDecl {
    pub name: String,
    /// Protocol this object declares conformance to (`Object Name: Proto`).
    pub protocol: Option<String>,
    pub properties: Vec<PropertySpec>,
    pub constructor: Option<MethodDecl>,
    pub methods: Vec<MethodDecl>,
    pub location: SourceLocation,
}

/// An `Enum` declaration: named integer constants.
///
/// Members without an explicit value continue counting from the previous
/// member (starting at 0).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<(String, Option<i32>)>,
    pub location: SourceLocation,
}

/// A `Record` declaration: named struct with fixed, typed fields.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<Parameter>,
    pub location: SourceLocation,
}

/// One required method signature inside a `Protocol`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SignatureDecl {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: String,
}

/// A `Protocol` declaration: a named set of method signatures that
/// objects satisfy structurally.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProtocolDecl {
    pub name: String,
    pub signatures: Vec<SignatureDecl>,
    pub location: SourceLocation,
}

/// A parsed import spec: `package.path.Object[.member | .*]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ImportPath {
    pub package: Vec<String>,
    pub object: String,
    /// `Some("*")` for wildcard imports, `Some(name)` for member imports.
    pub member: Option<String>,
    /// `true` for `@import` (user sources), `false` for `import` (libraries).
    pub user: bool,
}

impl ImportPath {
    /// The dotted form used in cycle diagnostics and cache keys.
    #[must_use]
    pub fn dotted(&self) -> String {
        let mut out = String::new();
        for part in &self.package {
            out.push_str(part);
            out.push('.');
        }
        out.push_str(&self.object);
        out
    }
}

impl fmt::Display for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.user {
            f.write_str("@import ")?;
        } else {
            f.write_str("import ")?;
        }
        f.write_str(&self.dotted())?;
        if let Some(member) = &self.member {
            write!(f, ".{member}")?;
        }
        Ok(())
    }
}

/// A statement or declaration in the AST.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Node {
    Expr(ExprLoc),
    /// `name: Type = expr`
    VarDecl {
        name: String,
        type_name: String,
        value: ExprLoc,
        location: SourceLocation,
    },
    /// `const name: Type = expr` - registers the name as a constant.
    ConstDecl {
        name: String,
        type_name: String,
        value: ExprLoc,
        location: SourceLocation,
    },
    /// `name = expr` - the name must exist and not be constant.
    Assign {
        name: String,
        value: ExprLoc,
        location: SourceLocation,
    },
    /// `this.prop = expr` - allowed exactly once per property.
    PropertyAssign {
        property: String,
        value: ExprLoc,
        location: SourceLocation,
    },
    If {
        condition: ExprLoc,
        then_block: Vec<Node>,
        elif_branches: Vec<(ExprLoc, Vec<Node>)>,
        else_block: Option<Vec<Node>>,
        location: SourceLocation,
    },
    While {
        condition: ExprLoc,
        body: Vec<Node>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Return {
        value: Option<ExprLoc>,
        location: SourceLocation,
    },
    Throw {
        value: ExprLoc,
        location: SourceLocation,
    },
    TryCatch {
        try_block: Vec<Node>,
        catch_name: String,
        catch_block: Vec<Node>,
        finally_block: Option<Vec<Node>>,
        location: SourceLocation,
    },
    Object(ObjectDecl),
    Enum(EnumDecl),
    Record(RecordDecl),
    Protocol(ProtocolDecl),
    /// `namespace a.b { ... }` - inner declarations bind under their
    /// qualified names.
    Namespace {
        path: Vec<String>,
        body: Vec<Node>,
        location: SourceLocation,
    },
    Import {
        path: ImportPath,
        location: SourceLocation,
    },
}

impl Node {
    /// The node's source location.
    #[must_use]
    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::Expr(e) => &e.location,
            Self::VarDecl { location, .. }
            | Self::ConstDecl { location, .. }
            | Self::Assign { location, .. }
            | Self::PropertyAssign { location, .. }
            | Self::If { location, .. }
            | Self::While { location, .. }
            | Self::Break { location }
            | Self::Continue { location }
            | Self::Return { location, .. }
            | Self::Throw { location, .. }
            | Self::TryCatch { location, .. }
            | Self::Namespace { location, .. }
            | Self::Import { location, .. } => location,
            Self::Object(decl) => &decl.location,
            Self::Enum(decl) => &decl.location,
            Self::Record(decl) => &decl.location,
            Self::Protocol(decl) => &decl.location,
        }
    }
}

// --- canonical source rendering -------------------------------------------
//
// `Display` emits source text that re-parses to a structurally equal AST
// (modulo locations). The CLI `parse` command and the round-trip tests
// rely on this.

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}l"),
            Self::Float(v) => {
                let mut buffer = ryu::Buffer::new();
                write!(f, "{}f", buffer.format(*v))
            }
            Self::Double(v) => {
                let mut buffer = ryu::Buffer::new();
                write!(f, "{}d", buffer.format(*v))
            }
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(c) => write!(f, "'{}'", *c as char),
            Self::Text(s) => {
                let mut escaped = String::with_capacity(s.len() + 2);
                escape_text(s, &mut escaped);
                write!(f, "\"{escaped}\"")
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Name(name) | Self::QualifiedName(name) => f.write_str(name),
            Self::This => f.write_str("this"),
            Self::Op { left, op, right } => write!(f, "({} {} {})", left.expr, op.symbol(), right.expr),
            Self::CmpOp { left, op, right } => write!(f, "({} {} {})", left.expr, op.symbol(), right.expr),
            Self::Logic { left, op, right } => write!(f, "({} {} {})", left.expr, op.symbol(), right.expr),
            Self::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "(-{})", operand.expr),
                UnaryOp::Not => write!(f, "(!{})", operand.expr),
            },
            Self::MethodCall { object, method, args } => {
                write!(f, "{}.{method}(", object.expr)?;
                write_comma_separated(f, args)?;
                f.write_str(")")
            }
            Self::MemberAccess { object, member } => write!(f, "{}.{member}", object.expr),
            Self::New { type_name, args } => {
                write!(f, "new {type_name}(")?;
                write_comma_separated(f, args)?;
                f.write_str(")")
            }
            Self::ResultCall { success, arg } => {
                let ctor = if *success { "success" } else { "error" };
                write!(f, "Result.{ctor}({})", arg.expr)
            }
            Self::RecordInit { name, fields } => {
                write!(f, "{name}(")?;
                for (i, (field, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field} = {}", value.expr)?;
                }
                f.write_str(")")
            }
            Self::ListLiteral(elements) => {
                f.write_str("[")?;
                write_comma_separated(f, elements)?;
                f.write_str("]")
            }
            Self::MapLiteral(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key.expr, value.expr)?;
                }
                f.write_str("}")
            }
            Self::SetLiteral(elements) => {
                f.write_str("{")?;
                write_comma_separated(f, elements)?;
                f.write_str("}")
            }
        }
    }
}

fn write_comma_separated(f: &mut fmt::Formatter<'_>, exprs: &[ExprLoc]) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", expr.expr)?;
    }
    Ok(())
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Parameter]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {}", param.name, param.type_name)?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &[Node], indent: usize) -> fmt::Result {
    writeln!(f, "{{")?;
    for node in block {
        node.fmt_indented(f, indent + 1)?;
        writeln!(f)?;
    }
    write!(f, "{}}}", "    ".repeat(indent))
}

impl MethodDecl {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "    ".repeat(indent);
        f.write_str(&pad)?;
        if self.external {
            f.write_str("@external ")?;
        }
        if self.name == "constructor" {
            f.write_str("constructor(")?;
            write_params(f, &self.params)?;
            f.write_str(") ")?;
        } else {
            write!(f, "method {}(", self.name)?;
            write_params(f, &self.params)?;
            write!(f, "): {} ", self.return_type)?;
        }
        write_block(f, &self.body, indent)
    }
}

impl Node {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "    ".repeat(indent);
        match self {
            Self::Expr(expr) => write!(f, "{pad}{}", expr.expr),
            Self::VarDecl {
                name, type_name, value, ..
            } => write!(f, "{pad}{name}: {type_name} = {}", value.expr),
            Self::ConstDecl {
                name, type_name, value, ..
            } => write!(f, "{pad}const {name}: {type_name} = {}", value.expr),
            Self::Assign { name, value, .. } => write!(f, "{pad}{name} = {}", value.expr),
            Self::PropertyAssign { property, value, .. } => {
                write!(f, "{pad}this.{property} = {}", value.expr)
            }
            Self::If {
                condition,
                then_block,
                elif_branches,
                else_block,
                ..
            } => {
                write!(f, "{pad}if ({}) ", condition.expr)?;
                write_block(f, then_block, indent)?;
                for (elif_condition, elif_block) in elif_branches {
                    write!(f, " else if ({}) ", elif_condition.expr)?;
                    write_block(f, elif_block, indent)?;
                }
                if let Some(else_block) = else_block {
                    f.write_str(" else ")?;
                    write_block(f, else_block, indent)?;
                }
                Ok(())
            }
            Self::While { condition, body, .. } => {
                write!(f, "{pad}while ({}) ", condition.expr)?;
                write_block(f, body, indent)
            }
            Self::Break { .. } => write!(f, "{pad}break"),
            Self::Continue { .. } => write!(f, "{pad}continue"),
            Self::Return { value, .. } => match value {
                Some(value) => write!(f, "{pad}return {}", value.expr),
                None => write!(f, "{pad}return"),
            },
            Self::Throw { value, .. } => write!(f, "{pad}throw {}", value.expr),
            Self::TryCatch {
                try_block,
                catch_name,
                catch_block,
                finally_block,
                ..
            } => {
                write!(f, "{pad}try ")?;
                write_block(f, try_block, indent)?;
                write!(f, " catch ({catch_name}) ")?;
                write_block(f, catch_block, indent)?;
                if let Some(finally_block) = finally_block {
                    f.write_str(" finally ")?;
                    write_block(f, finally_block, indent)?;
                }
                Ok(())
            }
            Self::Object(decl) => {
                write!(f, "{pad}Object {}", decl.name)?;
                if let Some(protocol) = &decl.protocol {
                    write!(f, ": {protocol}")?;
                }
                writeln!(f, " {{")?;
                for property in &decl.properties {
                    writeln!(
                        f,
                        "{pad}    property {}: {}",
                        property.name, property.type_name
                    )?;
                }
                if let Some(constructor) = &decl.constructor {
                    constructor.fmt_indented(f, indent + 1)?;
                    writeln!(f)?;
                }
                for method in &decl.methods {
                    method.fmt_indented(f, indent + 1)?;
                    writeln!(f)?;
                }
                write!(f, "{pad}}}")
            }
            Self::Enum(decl) => {
                writeln!(f, "{pad}Enum {} {{", decl.name)?;
                for (member, value) in &decl.members {
                    match value {
                        Some(value) => writeln!(f, "{pad}    {member} = {value}")?,
                        None => writeln!(f, "{pad}    {member}")?,
                    }
                }
                write!(f, "{pad}}}")
            }
            Self::Record(decl) => {
                writeln!(f, "{pad}Record {} {{", decl.name)?;
                for field in &decl.fields {
                    writeln!(f, "{pad}    {}: {}", field.name, field.type_name)?;
                }
                write!(f, "{pad}}}")
            }
            Self::Protocol(decl) => {
                writeln!(f, "{pad}Protocol {} {{", decl.name)?;
                for signature in &decl.signatures {
                    write!(f, "{pad}    method {}(", signature.name)?;
                    write_params(f, &signature.params)?;
                    writeln!(f, "): {}", signature.return_type)?;
                }
                write!(f, "{pad}}}")
            }
            Self::Namespace { path, body, .. } => {
                write!(f, "{pad}namespace {} ", path.join("."))?;
                write_block(f, body, indent)
            }
            Self::Import { path, .. } => write!(f, "{pad}{path}"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
