use std::rc::Rc;

use crate::{
    exception::Exception,
    expressions::{
        BinOp, CmpOp, EnumDecl, Expr, ExprLoc, ImportPath, Literal, LogicOp, MethodDecl, Node, ObjectDecl, Parameter,
        PropertySpec, ProtocolDecl, RecordDecl, SignatureDecl, SourceLocation, UnaryOp,
    },
    lex::{Lexer, Token, TokenKind},
};

/// Lexes and parses a whole source file into its top-level declarations.
pub fn parse_program(source: &str, filename: &str) -> Result<Vec<Node>, Exception> {
    let tokens = Lexer::new(source).tokenize_all()?;
    Parser::new(tokens, filename).parse()
}

/// Lexes and parses REPL input: statements are allowed at top level.
pub(crate) fn parse_repl_input(source: &str, filename: &str) -> Result<Vec<Node>, Exception> {
    let tokens = Lexer::new(source).tokenize_all()?;
    Parser::new(tokens, filename).parse_statements()
}

/// Recursive-descent parser over the token stream.
///
/// Newlines and semicolons act as statement separators and are skipped
/// freely between declarations and inside bracketed lists.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    file: Rc<str>,
}

type ParseResult<T> = Result<T, Exception>;

impl Parser {
    #[must_use]
    pub fn new(mut tokens: Vec<Token>, filename: &str) -> Self {
        if tokens.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line: 1,
                column: 1,
            });
        }
        Self {
            tokens,
            current: 0,
            file: Rc::from(filename),
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek(&self, offset: usize) -> &Token {
        let index = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn kind(&self) -> TokenKind {
        self.token().kind
    }

    fn location(&self) -> SourceLocation {
        let token = self.token();
        SourceLocation::new(self.file.clone(), token.line, token.column)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current.min(self.tokens.len() - 1)].clone();
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.error(&format!("Expected {expected}")))
        }
    }

    fn error(&self, message: &str) -> Exception {
        let token = self.token();
        if token.kind == TokenKind::Eof {
            Exception::syntax(format!("{message} at line {} (unexpected end of input)", token.line))
        } else {
            Exception::syntax(format!(
                "{message} at line {}, found '{}'",
                token.line, token.lexeme
            ))
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    // --- program structure ------------------------------------------------

    /// Parses the whole token stream as top-level declarations.
    pub fn parse(mut self) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_separators();
            if self.kind() == TokenKind::Eof {
                return Ok(nodes);
            }
            nodes.push(self.parse_top_level()?);
        }
    }

    /// Parses the token stream as a statement sequence (REPL input).
    pub(crate) fn parse_statements(mut self) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_separators();
            if self.kind() == TokenKind::Eof {
                return Ok(nodes);
            }
            if self.is_top_level_keyword() {
                nodes.push(self.parse_top_level()?);
            } else {
                nodes.push(self.parse_statement()?);
            }
        }
    }

    fn is_top_level_keyword(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Object
                | TokenKind::Enum
                | TokenKind::Record
                | TokenKind::Protocol
                | TokenKind::Namespace
                | TokenKind::Import
                | TokenKind::AtImport
        )
    }

    fn parse_top_level(&mut self) -> ParseResult<Node> {
        match self.kind() {
            TokenKind::Object => self.parse_object_declaration(),
            TokenKind::Enum => self.parse_enum_declaration(),
            TokenKind::Record => self.parse_record_declaration(),
            TokenKind::Protocol => self.parse_protocol_declaration(),
            TokenKind::Namespace => self.parse_namespace_declaration(),
            TokenKind::Import => self.parse_import(false),
            TokenKind::AtImport => self.parse_import(true),
            _ => Err(self.error(
                "Only object declarations, imports, enums, records, and protocols are allowed at top level",
            )),
        }
    }

    fn parse_import(&mut self, user: bool) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // import / @import

        let mut parts = vec![self.identifier_like("import path")?];
        let mut wildcard = false;
        while self.matches(TokenKind::Dot) {
            if self.matches(TokenKind::Star) {
                wildcard = true;
                break;
            }
            parts.push(self.identifier_like("import path component")?);
        }

        let path = split_import_parts(parts, wildcard, user);
        Ok(Node::Import { path, location })
    }

    fn parse_namespace_declaration(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // namespace
        let mut path = vec![self.identifier_like("namespace name")?];
        while self.matches(TokenKind::Dot) {
            path.push(self.identifier_like("namespace name component")?);
        }
        self.skip_separators();
        self.consume(TokenKind::LBrace, "'{' after namespace name")?;
        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if self.matches(TokenKind::RBrace) {
                break;
            }
            if self.kind() == TokenKind::Eof {
                return Err(self.error("Expected '}' to close namespace"));
            }
            body.push(self.parse_top_level()?);
        }
        Ok(Node::Namespace { path, body, location })
    }

    fn parse_object_declaration(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // Object
        let name = self.consume(TokenKind::Identifier, "object name")?.lexeme;

        let protocol = if self.matches(TokenKind::Colon) {
            Some(self.parse_type_name()?)
        } else {
            None
        };

        self.skip_separators();
        self.consume(TokenKind::LBrace, "'{' after object name")?;

        let mut properties = Vec::new();
        let mut constructor = None;
        let mut methods = Vec::new();

        loop {
            self.skip_separators();
            match self.kind() {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Property => {
                    let prop_location = self.location();
                    self.advance();
                    let prop_name = self.consume(TokenKind::Identifier, "property name")?.lexeme;
                    self.consume(TokenKind::Colon, "':' after property name")?;
                    let type_name = self.parse_type_name()?;
                    properties.push(PropertySpec {
                        name: prop_name,
                        type_name,
                        location: prop_location,
                    });
                }
                TokenKind::Constructor => {
                    if constructor.is_some() {
                        return Err(self.error("Object already declares a constructor"));
                    }
                    constructor = Some(self.parse_constructor_declaration()?);
                }
                TokenKind::AtExternal => {
                    self.advance();
                    methods.push(self.parse_method_declaration(true)?);
                }
                TokenKind::Method => {
                    methods.push(self.parse_method_declaration(false)?);
                }
                TokenKind::Eof => return Err(self.error("Expected '}' to close object declaration")),
                _ => {
                    return Err(self.error(
                        "Expected 'property', 'constructor', or 'method' in object declaration",
                    ));
                }
            }
        }

        Ok(Node::Object(ObjectDecl {
            name,
            protocol,
            properties,
            constructor,
            methods,
            location,
        }))
    }

    fn parse_constructor_declaration(&mut self) -> ParseResult<MethodDecl> {
        let location = self.location();
        self.advance(); // constructor
        self.consume(TokenKind::LParen, "'(' after 'constructor'")?;
        let params = self.parse_parameter_list()?;
        self.skip_separators();
        let body = self.parse_block()?;
        Ok(MethodDecl {
            name: "constructor".to_owned(),
            params,
            return_type: String::new(),
            body,
            external: false,
            location,
        })
    }

    fn parse_method_declaration(&mut self, external: bool) -> ParseResult<MethodDecl> {
        let location = self.location();
        self.consume(TokenKind::Method, "'method'")?;
        let name = self.identifier_like("method name")?;
        self.consume(TokenKind::LParen, "'(' after method name")?;
        let params = self.parse_parameter_list()?;
        self.consume(TokenKind::Colon, "':' before return type")?;
        let return_type = self.parse_type_name()?;
        self.skip_separators();
        let body = self.parse_block()?;
        Ok(MethodDecl {
            name,
            params,
            return_type,
            body,
            external,
            location,
        })
    }

    /// Parses `name: Type` pairs up to the closing parenthesis.
    fn parse_parameter_list(&mut self) -> ParseResult<Vec<Parameter>> {
        let mut params = Vec::new();
        self.skip_separators();
        if self.matches(TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            let name = self.consume(TokenKind::Identifier, "parameter name")?.lexeme;
            self.consume(TokenKind::Colon, "':' after parameter name")?;
            let type_name = self.parse_type_name()?;
            params.push(Parameter { name, type_name });
            self.skip_separators();
            if self.matches(TokenKind::Comma) {
                self.skip_separators();
                continue;
            }
            self.consume(TokenKind::RParen, "')' after parameters")?;
            return Ok(params);
        }
    }

    fn parse_enum_declaration(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // Enum
        let name = self.consume(TokenKind::Identifier, "enum name")?.lexeme;
        self.skip_separators();
        self.consume(TokenKind::LBrace, "'{' after enum name")?;

        let mut members = Vec::new();
        loop {
            self.skip_separators();
            if self.matches(TokenKind::RBrace) {
                break;
            }
            let member = self.consume(TokenKind::Identifier, "enum member name")?.lexeme;
            let value = if self.matches(TokenKind::Assign) {
                let negative = self.matches(TokenKind::Minus);
                let token = self.consume(TokenKind::Number, "integer value for enum member")?;
                let parsed: i32 = token
                    .lexeme
                    .parse()
                    .map_err(|_| Exception::syntax(format!("Invalid enum member value at line {}", token.line)))?;
                Some(if negative { -parsed } else { parsed })
            } else {
                None
            };
            members.push((member, value));
            self.matches(TokenKind::Comma);
        }
        Ok(Node::Enum(EnumDecl { name, members, location }))
    }

    fn parse_record_declaration(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // Record
        let name = self.consume(TokenKind::Identifier, "record name")?.lexeme;
        self.skip_separators();
        self.consume(TokenKind::LBrace, "'{' after record name")?;

        let mut fields = Vec::new();
        loop {
            self.skip_separators();
            if self.matches(TokenKind::RBrace) {
                break;
            }
            let field = self.consume(TokenKind::Identifier, "record field name")?.lexeme;
            self.consume(TokenKind::Colon, "':' after record field name")?;
            let type_name = self.parse_type_name()?;
            fields.push(Parameter {
                name: field,
                type_name,
            });
            self.matches(TokenKind::Comma);
        }
        Ok(Node::Record(RecordDecl { name, fields, location }))
    }

    fn parse_protocol_declaration(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // Protocol
        let name = self.consume(TokenKind::Identifier, "protocol name")?.lexeme;
        self.skip_separators();
        self.consume(TokenKind::LBrace, "'{' after protocol name")?;

        let mut signatures = Vec::new();
        loop {
            self.skip_separators();
            if self.matches(TokenKind::RBrace) {
                break;
            }
            self.consume(TokenKind::Method, "'method' in protocol body")?;
            let method = self.identifier_like("method name")?;
            self.consume(TokenKind::LParen, "'(' after method name")?;
            let params = self.parse_parameter_list()?;
            self.consume(TokenKind::Colon, "':' before return type")?;
            let return_type = self.parse_type_name()?;
            signatures.push(SignatureDecl {
                name: method,
                params,
                return_type,
            });
        }
        Ok(Node::Protocol(ProtocolDecl {
            name,
            signatures,
            location,
        }))
    }

    // --- statements -------------------------------------------------------

    fn parse_block(&mut self) -> ParseResult<Vec<Node>> {
        self.consume(TokenKind::LBrace, "'{'")?;
        let mut nodes = Vec::new();
        loop {
            self.skip_separators();
            if self.matches(TokenKind::RBrace) {
                return Ok(nodes);
            }
            if self.kind() == TokenKind::Eof {
                return Err(self.error("Expected '}' to close block"));
            }
            nodes.push(self.parse_statement()?);
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Node> {
        match self.kind() {
            TokenKind::Const => self.parse_const_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Break => {
                let location = self.location();
                self.advance();
                Ok(Node::Break { location })
            }
            TokenKind::Continue => {
                let location = self.location();
                self.advance();
                Ok(Node::Continue { location })
            }
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Throw => {
                let location = self.location();
                self.advance();
                let value = self.parse_expression()?;
                Ok(Node::Throw { value, location })
            }
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::This
                if self.peek(1).kind == TokenKind::Dot
                    && self.peek(2).kind == TokenKind::Identifier
                    && self.peek(3).kind == TokenKind::Assign =>
            {
                let location = self.location();
                self.advance(); // this
                self.advance(); // .
                let property = self.advance().lexeme;
                self.advance(); // =
                let value = self.parse_expression()?;
                Ok(Node::PropertyAssign {
                    property,
                    value,
                    location,
                })
            }
            TokenKind::Identifier if self.peek(1).kind == TokenKind::Colon => self.parse_variable_declaration(),
            TokenKind::Identifier if self.peek(1).kind == TokenKind::Assign => {
                let location = self.location();
                let name = self.advance().lexeme;
                self.advance(); // =
                let value = self.parse_expression()?;
                Ok(Node::Assign { name, value, location })
            }
            _ => {
                let expr = self.parse_expression()?;
                Ok(Node::Expr(expr))
            }
        }
    }

    fn parse_variable_declaration(&mut self) -> ParseResult<Node> {
        let location = self.location();
        let name = self.advance().lexeme;
        self.advance(); // :
        let type_name = self.parse_type_name()?;
        self.consume(TokenKind::Assign, "'=' in variable declaration")?;
        let value = self.parse_expression()?;
        Ok(Node::VarDecl {
            name,
            type_name,
            value,
            location,
        })
    }

    fn parse_const_declaration(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // const
        let name = self.consume(TokenKind::Identifier, "constant name")?.lexeme;
        self.consume(TokenKind::Colon, "':' after constant name")?;
        let type_name = self.parse_type_name()?;
        self.consume(TokenKind::Assign, "'=' in constant declaration")?;
        let value = self.parse_expression()?;
        Ok(Node::ConstDecl {
            name,
            type_name,
            value,
            location,
        })
    }

    fn parse_if_statement(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // if
        self.consume(TokenKind::LParen, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "')' after condition")?;
        self.skip_separators();
        let then_block = self.parse_block()?;

        let mut elif_branches = Vec::new();
        let mut else_block = None;
        loop {
            // `else` may sit on the line after the closing brace.
            let checkpoint = self.current;
            self.skip_separators();
            if !self.matches(TokenKind::Else) {
                self.current = checkpoint;
                break;
            }
            self.skip_separators();
            if self.matches(TokenKind::If) {
                self.consume(TokenKind::LParen, "'(' after 'else if'")?;
                let elif_condition = self.parse_expression()?;
                self.consume(TokenKind::RParen, "')' after condition")?;
                self.skip_separators();
                elif_branches.push((elif_condition, self.parse_block()?));
            } else {
                else_block = Some(self.parse_block()?);
                break;
            }
        }

        Ok(Node::If {
            condition,
            then_block,
            elif_branches,
            else_block,
            location,
        })
    }

    fn parse_while_statement(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // while
        self.consume(TokenKind::LParen, "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "')' after condition")?;
        self.skip_separators();
        let body = self.parse_block()?;
        Ok(Node::While {
            condition,
            body,
            location,
        })
    }

    fn parse_return_statement(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // return
        let value = if matches!(
            self.kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        Ok(Node::Return { value, location })
    }

    fn parse_try_statement(&mut self) -> ParseResult<Node> {
        let location = self.location();
        self.advance(); // try
        self.skip_separators();
        let try_block = self.parse_block()?;
        self.skip_separators();
        self.consume(TokenKind::Catch, "'catch' after try block")?;
        self.consume(TokenKind::LParen, "'(' after 'catch'")?;
        let catch_name = self.consume(TokenKind::Identifier, "catch binding name")?.lexeme;
        self.consume(TokenKind::RParen, "')' after catch binding")?;
        self.skip_separators();
        let catch_block = self.parse_block()?;

        let checkpoint = self.current;
        self.skip_separators();
        let finally_block = if self.matches(TokenKind::Finally) {
            self.skip_separators();
            Some(self.parse_block()?)
        } else {
            self.current = checkpoint;
            None
        };

        Ok(Node::TryCatch {
            try_block,
            catch_name,
            catch_block,
            finally_block,
            location,
        })
    }

    // --- expressions ------------------------------------------------------

    fn parse_expression(&mut self) -> ParseResult<ExprLoc> {
        self.parse_logic_or()
    }

    fn parse_logic_or(&mut self) -> ParseResult<ExprLoc> {
        let mut left = self.parse_logic_and()?;
        while self.kind() == TokenKind::OrOr {
            let location = left.location.clone();
            self.advance();
            let right = self.parse_logic_and()?;
            left = ExprLoc::new(
                location,
                Expr::Logic {
                    left: Box::new(left),
                    op: LogicOp::Or,
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_logic_and(&mut self) -> ParseResult<ExprLoc> {
        let mut left = self.parse_equality()?;
        while self.kind() == TokenKind::AndAnd {
            let location = left.location.clone();
            self.advance();
            let right = self.parse_equality()?;
            left = ExprLoc::new(
                location,
                Expr::Logic {
                    left: Box::new(left),
                    op: LogicOp::And,
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<ExprLoc> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.kind() {
                TokenKind::Equal => CmpOp::Eq,
                TokenKind::NotEqual => CmpOp::Ne,
                _ => return Ok(left),
            };
            let location = left.location.clone();
            self.advance();
            let right = self.parse_relational()?;
            left = ExprLoc::new(
                location,
                Expr::CmpOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            );
        }
    }

    fn parse_relational(&mut self) -> ParseResult<ExprLoc> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::Less => CmpOp::Lt,
                TokenKind::Greater => CmpOp::Gt,
                TokenKind::LessEqual => CmpOp::Le,
                TokenKind::GreaterEqual => CmpOp::Ge,
                _ => return Ok(left),
            };
            let location = left.location.clone();
            self.advance();
            let right = self.parse_additive()?;
            left = ExprLoc::new(
                location,
                Expr::CmpOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            );
        }
    }

    fn parse_additive(&mut self) -> ParseResult<ExprLoc> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            let location = left.location.clone();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = ExprLoc::new(
                location,
                Expr::Op {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            );
        }
    }

    fn parse_multiplicative(&mut self) -> ParseResult<ExprLoc> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => return Ok(left),
            };
            let location = left.location.clone();
            self.advance();
            let right = self.parse_unary()?;
            left = ExprLoc::new(
                location,
                Expr::Op {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            );
        }
    }

    fn parse_unary(&mut self) -> ParseResult<ExprLoc> {
        if self.kind() == TokenKind::Minus {
            let location = self.location();
            self.advance();
            let operand = self.parse_unary()?;
            // A leading minus on a numeric literal folds into the literal.
            if let Expr::Literal(literal) = &operand.expr {
                if let Some(negated) = negate_literal(literal) {
                    return Ok(ExprLoc::new(location, Expr::Literal(negated)));
                }
            }
            return Ok(ExprLoc::new(
                location,
                Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
            ));
        }
        if self.kind() == TokenKind::Not {
            let location = self.location();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(ExprLoc::new(
                location,
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<ExprLoc> {
        let mut expr = self.parse_primary()?;
        while self.kind() == TokenKind::Dot {
            let location = expr.location.clone();
            self.advance();
            let member = self.identifier_like("member name after '.'")?;
            if self.matches(TokenKind::LParen) {
                let args = self.parse_argument_list()?;
                expr = ExprLoc::new(
                    location,
                    Expr::MethodCall {
                        object: Box::new(expr),
                        method: member,
                        args,
                    },
                );
            } else {
                expr = ExprLoc::new(
                    location,
                    Expr::MemberAccess {
                        object: Box::new(expr),
                        member,
                    },
                );
            }
        }
        Ok(expr)
    }

    /// Parses comma-separated arguments up to the closing parenthesis.
    fn parse_argument_list(&mut self) -> ParseResult<Vec<ExprLoc>> {
        let mut args = Vec::new();
        self.skip_separators();
        if self.matches(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            self.skip_separators();
            if self.matches(TokenKind::Comma) {
                self.skip_separators();
                continue;
            }
            self.consume(TokenKind::RParen, "')' after arguments")?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> ParseResult<ExprLoc> {
        let location = self.location();
        match self.kind() {
            TokenKind::Number => {
                let token = self.advance();
                Ok(ExprLoc::new(location, Expr::Literal(parse_number(&token)?)))
            }
            TokenKind::String => {
                let token = self.advance();
                Ok(ExprLoc::new(location, Expr::Literal(Literal::Text(token.lexeme))))
            }
            TokenKind::Character => {
                let token = self.advance();
                let byte = token.lexeme.bytes().next().unwrap_or(b' ');
                Ok(ExprLoc::new(location, Expr::Literal(Literal::Char(byte))))
            }
            TokenKind::True => {
                self.advance();
                Ok(ExprLoc::new(location, Expr::Literal(Literal::Bool(true))))
            }
            TokenKind::False => {
                self.advance();
                Ok(ExprLoc::new(location, Expr::Literal(Literal::Bool(false))))
            }
            TokenKind::This => {
                self.advance();
                Ok(ExprLoc::new(location, Expr::This))
            }
            TokenKind::New => {
                self.advance();
                let type_name = self.parse_type_name()?;
                self.consume(TokenKind::LParen, "'(' after type name in 'new'")?;
                let args = self.parse_argument_list()?;
                Ok(ExprLoc::new(location, Expr::New { type_name, args }))
            }
            TokenKind::Result => self.parse_result_call(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RParen, "')' after expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::LBrace => self.parse_map_or_set_literal(),
            TokenKind::Identifier => {
                let name = self.advance().lexeme;
                if self.kind() == TokenKind::LParen {
                    self.advance();
                    let fields = self.parse_record_fields()?;
                    Ok(ExprLoc::new(location, Expr::RecordInit { name, fields }))
                } else {
                    Ok(ExprLoc::new(location, Expr::Name(name)))
                }
            }
            TokenKind::Invalid => {
                let token = self.token();
                Err(Exception::syntax(format!(
                    "Unexpected character '{}' at line {}",
                    token.lexeme, token.line
                )))
            }
            _ => Err(self.error("Expected expression")),
        }
    }

    /// `Result.success(expr)` / `Result.error(expr)`.
    fn parse_result_call(&mut self) -> ParseResult<ExprLoc> {
        let location = self.location();
        self.advance(); // Result
        self.consume(TokenKind::Dot, "'.' after 'Result'")?;
        let ctor = self.identifier_like("'success' or 'error' after 'Result.'")?;
        let success = match ctor.as_str() {
            "success" => true,
            "error" => false,
            _ => return Err(self.error("Expected 'success' or 'error' after 'Result.'")),
        };
        self.consume(TokenKind::LParen, "'(' after Result constructor")?;
        let arg = self.parse_expression()?;
        self.consume(TokenKind::RParen, "')' after Result argument")?;
        Ok(ExprLoc::new(
            location,
            Expr::ResultCall {
                success,
                arg: Box::new(arg),
            },
        ))
    }

    fn parse_list_literal(&mut self) -> ParseResult<ExprLoc> {
        let location = self.location();
        self.advance(); // [
        let mut elements = Vec::new();
        self.skip_separators();
        if self.matches(TokenKind::RBracket) {
            return Ok(ExprLoc::new(location, Expr::ListLiteral(elements)));
        }
        loop {
            elements.push(self.parse_expression()?);
            self.skip_separators();
            if self.matches(TokenKind::Comma) {
                self.skip_separators();
                continue;
            }
            self.consume(TokenKind::RBracket, "']' after list elements")?;
            return Ok(ExprLoc::new(location, Expr::ListLiteral(elements)));
        }
    }

    /// `{}` and `{k: v, ...}` are maps; `{a, b, ...}` is a set.
    fn parse_map_or_set_literal(&mut self) -> ParseResult<ExprLoc> {
        let location = self.location();
        self.advance(); // {
        self.skip_separators();
        if self.matches(TokenKind::RBrace) {
            return Ok(ExprLoc::new(location, Expr::MapLiteral(Vec::new())));
        }

        let first = self.parse_expression()?;
        self.skip_separators();
        if self.matches(TokenKind::Colon) {
            self.skip_separators();
            let first_value = self.parse_expression()?;
            let mut entries = vec![(first, first_value)];
            loop {
                self.skip_separators();
                if self.matches(TokenKind::Comma) {
                    self.skip_separators();
                    if self.matches(TokenKind::RBrace) {
                        return Ok(ExprLoc::new(location, Expr::MapLiteral(entries)));
                    }
                    let key = self.parse_expression()?;
                    self.skip_separators();
                    self.consume(TokenKind::Colon, "':' in map entry")?;
                    self.skip_separators();
                    let value = self.parse_expression()?;
                    entries.push((key, value));
                    continue;
                }
                self.consume(TokenKind::RBrace, "'}' after map entries")?;
                return Ok(ExprLoc::new(location, Expr::MapLiteral(entries)));
            }
        }

        let mut elements = vec![first];
        loop {
            self.skip_separators();
            if self.matches(TokenKind::Comma) {
                self.skip_separators();
                if self.matches(TokenKind::RBrace) {
                    return Ok(ExprLoc::new(location, Expr::SetLiteral(elements)));
                }
                elements.push(self.parse_expression()?);
                continue;
            }
            self.consume(TokenKind::RBrace, "'}' after set elements")?;
            return Ok(ExprLoc::new(location, Expr::SetLiteral(elements)));
        }
    }

    /// Record instantiation fields: `name = expr, ...`.
    fn parse_record_fields(&mut self) -> ParseResult<Vec<(String, ExprLoc)>> {
        let mut fields = Vec::new();
        self.skip_separators();
        if self.matches(TokenKind::RParen) {
            return Ok(fields);
        }
        loop {
            let name = self.consume(TokenKind::Identifier, "field name in record instantiation")?.lexeme;
            self.consume(TokenKind::Assign, "'=' after field name in record instantiation")?;
            let value = self.parse_expression()?;
            fields.push((name, value));
            self.skip_separators();
            if self.matches(TokenKind::Comma) {
                self.skip_separators();
                continue;
            }
            self.consume(TokenKind::RParen, "')' after record fields")?;
            return Ok(fields);
        }
    }

    // --- helpers ----------------------------------------------------------

    /// Accepts an identifier or a keyword used in name position (members
    /// and import paths may collide with keywords like `error`).
    fn identifier_like(&mut self, expected: &str) -> ParseResult<String> {
        let token = self.token();
        let keyword_like = !matches!(
            token.kind,
            TokenKind::Identifier
                | TokenKind::String
                | TokenKind::Character
                | TokenKind::Number
                | TokenKind::Newline
                | TokenKind::Invalid
                | TokenKind::Eof
        ) && token.lexeme.chars().next().is_some_and(char::is_alphabetic);
        if token.kind == TokenKind::Identifier || keyword_like {
            Ok(self.advance().lexeme)
        } else {
            Err(self.error(&format!("Expected {expected}")))
        }
    }

    /// Parses a (possibly dotted, possibly generic) type name and
    /// reconstructs it textually: `List<Int>`, `Map<Text, Int>`,
    /// `Result<Int, Error>`, `demo.Calculator`.
    fn parse_type_name(&mut self) -> ParseResult<String> {
        let mut name = match self.kind() {
            TokenKind::Identifier | TokenKind::Result | TokenKind::Error => self.advance().lexeme,
            _ => return Err(self.error("Expected type name")),
        };

        while self.kind() == TokenKind::Dot && self.peek(1).kind == TokenKind::Identifier {
            self.advance();
            name.push('.');
            name.push_str(&self.advance().lexeme);
        }

        if self.matches(TokenKind::Less) {
            name.push('<');
            loop {
                name.push_str(&self.parse_type_name()?);
                if self.matches(TokenKind::Comma) {
                    name.push_str(", ");
                    continue;
                }
                self.consume(TokenKind::Greater, "'>' to close generic type")?;
                name.push('>');
                break;
            }
        }
        Ok(name)
    }
}

/// Splits dotted import components into package path, object, and
/// optional member. A trailing lowercase member after an uppercase object
/// selects a single method; `*` selects everything.
fn split_import_parts(mut parts: Vec<String>, wildcard: bool, user: bool) -> ImportPath {
    if wildcard {
        let object = parts.pop().unwrap_or_default();
        return ImportPath {
            package: parts,
            object,
            member: Some("*".to_owned()),
            user,
        };
    }

    let member = if parts.len() >= 2 {
        let object_like = parts[parts.len() - 2]
            .chars()
            .next()
            .is_some_and(char::is_uppercase);
        let member_like = parts[parts.len() - 1].chars().next().is_some_and(char::is_lowercase);
        if object_like && member_like { parts.pop() } else { None }
    } else {
        None
    };

    let object = parts.pop().unwrap_or_default();
    ImportPath {
        package: parts,
        object,
        member,
        user,
    }
}

fn negate_literal(literal: &Literal) -> Option<Literal> {
    match literal {
        Literal::Int(v) => Some(Literal::Int(-v)),
        Literal::Long(v) => Some(Literal::Long(-v)),
        Literal::Float(v) => Some(Literal::Float(-v)),
        Literal::Double(v) => Some(Literal::Double(-v)),
        _ => None,
    }
}

/// Parses a numeric token into the literal kind its suffix selects:
/// `f`/`F` Float, `d`/`D` Double, `l`/`L` Long, a bare decimal point
/// Double, and plain digits Int.
fn parse_number(token: &Token) -> Result<Literal, Exception> {
    let text = &token.lexeme;
    let invalid = || Exception::syntax(format!("Invalid numeric literal '{text}' at line {}", token.line));

    if let Some(stripped) = text.strip_suffix(['f', 'F']) {
        return stripped.parse::<f32>().map(Literal::Float).map_err(|_| invalid());
    }
    if let Some(stripped) = text.strip_suffix(['d', 'D']) {
        return stripped.parse::<f64>().map(Literal::Double).map_err(|_| invalid());
    }
    if let Some(stripped) = text.strip_suffix(['l', 'L']) {
        return stripped.parse::<i64>().map(Literal::Long).map_err(|_| invalid());
    }
    if text.contains('.') {
        return text.parse::<f64>().map(Literal::Double).map_err(|_| invalid());
    }
    text.parse::<i32>().map(Literal::Int).map_err(|_| invalid())
}
