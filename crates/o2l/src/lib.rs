//! Tree-walking interpreter for the O²L object-oriented scripting
//! language: lexer, parser, evaluator, runtime object model, and module
//! loader, plus the native `system.io` / `system.os` / `math` /
//! `testing` modules the loader materializes.

mod eval;
mod exception;
mod expressions;
mod heap;
mod io;
mod lex;
mod loader;
mod modules;
mod namespace;
mod object;
mod parse;
mod repl;
mod run;
mod types;
mod value;

pub use crate::{
    exception::{ExcKind, Exception, StackFrame},
    expressions::{
        BinOp, CmpOp, EnumDecl, Expr, ExprLoc, ImportPath, Literal, LogicOp, MethodDecl, Node, ObjectDecl,
        Parameter, PropertySpec, ProtocolDecl, RecordDecl, SignatureDecl, SourceLocation, UnaryOp,
    },
    heap::HeapId,
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    lex::{Lexer, Token, TokenKind},
    parse::{Parser, parse_program},
    repl::ReplSession,
    run::{Interpreter, entrypoint_from_manifest},
    value::{EnumMember, ErrorValue, ResultValue, Value},
};
