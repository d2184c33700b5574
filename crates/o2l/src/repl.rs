use crate::{exception::Exception, expressions::Node, parse::parse_repl_input, run::Interpreter};

/// A persistent line-by-line evaluator.
///
/// Each input line is parsed as either a declaration or a statement
/// sequence and evaluated against one long-lived global environment, so
/// bindings survive across lines. Errors leave the session usable.
pub struct ReplSession {
    interp: Interpreter,
}

impl ReplSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interp: Interpreter::new("<repl>"),
        }
    }

    /// Evaluates one input line.
    ///
    /// Returns the rendered value for statements, `None` for
    /// declarations and imports (their effect is the binding).
    pub fn eval_line(&mut self, line: &str) -> Result<Option<String>, Exception> {
        let nodes = parse_repl_input(line, "<repl>")?;
        let mut rendered = None;
        for node in &nodes {
            let value = self.interp.eval_top_level(node)?;
            rendered = match node {
                Node::Object(_)
                | Node::Enum(_)
                | Node::Record(_)
                | Node::Protocol(_)
                | Node::Namespace { .. }
                | Node::Import { .. } => None,
                _ => Some(self.interp.display_value(&value)),
            };
        }
        Ok(rendered)
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_persist_across_lines() {
        let mut session = ReplSession::new();
        session.eval_line("x: Int = 20").unwrap();
        let result = session.eval_line("x + 22").unwrap();
        assert_eq!(result.as_deref(), Some("42"));
    }

    #[test]
    fn declarations_render_nothing() {
        let mut session = ReplSession::new();
        let result = session
            .eval_line("Object Greeter { @external method hi(): Text { return \"hi\" } }")
            .unwrap();
        assert_eq!(result, None);
        let call = session.eval_line("new Greeter().hi()").unwrap();
        assert_eq!(call.as_deref(), Some("hi"));
    }

    #[test]
    fn errors_leave_the_session_usable() {
        let mut session = ReplSession::new();
        assert!(session.eval_line("missing + 1").is_err());
        let result = session.eval_line("1 + 1").unwrap();
        assert_eq!(result.as_deref(), Some("2"));
    }
}
