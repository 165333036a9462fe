//! Markup parsing, the expression language and directive resolution.

pub mod compile;
pub mod error;
pub mod eval;
pub mod expr;
pub mod resolve;
pub mod template_ast;
pub mod template_parse;

pub use compile::{CompiledTemplate, Template, compile, evaluate_template};
pub use error::{EvalError, MarkupError, ParseError, ResolveError};
pub use eval::{Scope, evaluate, evaluate_program, try_evaluate};
pub use expr::{ForClause, Program, parse_for_clause, parse_program};
pub use resolve::resolve;
pub use template_ast::{Node, TemplateAttr};
pub use template_parse::parse_markup;
