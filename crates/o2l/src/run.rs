use std::{fs, path::Path};

use crate::{
    eval::{Flow, synthetic_location},
    exception::{Exception, RunError, RunResult, StackFrame},
    expressions::Node,
    heap::{Heap, HeapData, ListInstance},
    io::{PrintWriter, StdPrint},
    loader::ModuleLoader,
    namespace::Namespaces,
    parse::parse_program,
    value::Value,
};

/// Top-level orchestrator: owns the global environment, the heap, and
/// the module loader; runs programs and invokes `Main.main`.
pub struct Interpreter {
    pub(crate) namespaces: Namespaces,
    pub(crate) heap: Heap,
    pub(crate) loader: ModuleLoader,
    /// Diagnostic call stack; empty before and after `execute`.
    pub(crate) stack: Vec<StackFrame>,
    pub(crate) writer: Box<dyn PrintWriter>,
    /// Program arguments exposed via `system.os.args`; index 0 is the
    /// source file path.
    pub(crate) program_args: Vec<String>,
}

impl Interpreter {
    #[must_use]
    pub fn new(source_file: &str) -> Self {
        Self::with_writer(source_file, Box::new(StdPrint))
    }

    /// Builds an interpreter that routes print output through `writer`.
    #[must_use]
    pub fn with_writer(source_file: &str, writer: Box<dyn PrintWriter>) -> Self {
        Self {
            namespaces: Namespaces::new(),
            heap: Heap::new(),
            loader: ModuleLoader::new(),
            stack: Vec::new(),
            writer,
            program_args: vec![source_file.to_owned()],
        }
    }

    /// Replaces the program arguments (argv[0] should stay the source
    /// file path).
    pub fn set_program_args(&mut self, args: Vec<String>) {
        self.program_args = args;
    }

    /// Adds a directory to the module search paths (the entry file's
    /// directory, so relative imports resolve).
    pub fn add_module_search_path(&mut self, path: impl Into<std::path::PathBuf>) {
        self.loader.add_search_path(path);
    }

    /// Renders a value the way `toString` and `print` do.
    #[must_use]
    pub fn display_value(&self, value: &Value) -> String {
        value.display(&self.heap)
    }

    /// Parses and executes a source string; see [`Self::execute`].
    pub fn execute_source(&mut self, source: &str, filename: &str) -> Result<Value, Exception> {
        let nodes = parse_program(source, filename)?;
        self.execute(&nodes)
    }

    /// Evaluates top-level nodes in order, then invokes `Main.main`.
    ///
    /// The returned value is the program's result; an `Int` is meant to
    /// be used as the process exit code.
    pub fn execute(&mut self, nodes: &[Node]) -> Result<Value, Exception> {
        let result = self.execute_inner(nodes);
        debug_assert!(self.stack.is_empty(), "call stack must balance across execute");
        result.map_err(|e| self.into_exception(e))
    }

    fn execute_inner(&mut self, nodes: &[Node]) -> RunResult<Value> {
        for node in nodes {
            self.eval_node(node)?;
        }
        self.call_main()
    }

    /// Looks up the global `Main` object and invokes its `main` method.
    ///
    /// A `main` declared with one parameter receives the program
    /// arguments as a `List<Text>`.
    fn call_main(&mut self) -> RunResult<Value> {
        let main_value = self
            .namespaces
            .get("Main")
            .map_err(|_| self.eval_err("Program entry point 'Main.main' not found"))?;
        let Value::Ref(main_id) = main_value else {
            return Err(self.eval_err("Program entry point 'Main.main' not found"));
        };
        let entry = match self.heap.get(main_id) {
            HeapData::Object(object) => object.method("main").cloned(),
            _ => None,
        };
        let Some(entry) = entry else {
            return Err(self.eval_err("Program entry point 'Main.main' not found"));
        };

        let arity = match &entry.body {
            crate::object::MethodBody::User(decl) => decl.params.len(),
            crate::object::MethodBody::Native(_) => 0,
        };
        let mut args = crate::eval::ArgValues::new();
        if arity == 1 {
            let values: Vec<Value> = self.program_args.iter().map(Value::text).collect();
            let list = self
                .heap
                .allocate(HeapData::List(ListInstance::with_elements("Text", values)));
            args.push(Value::Ref(list));
        }

        let location = synthetic_location();
        self.invoke_method(main_id, "Main", "main", &entry, args, &location)
    }

    /// Converts the internal error channel into the public exception,
    /// rendering uncaught `throw` values with the heap still alive.
    pub(crate) fn into_exception(&self, err: RunError) -> Exception {
        match err {
            RunError::Exc(exc) => *exc,
            RunError::Thrown(thrown) => {
                let message = format!("Thrown: {}", thrown.value.display(&self.heap));
                Exception::evaluation(message).with_stack(&thrown.stack)
            }
        }
    }

    /// Evaluates one already-parsed statement in the global scope,
    /// returning its value. Used by the REPL.
    pub(crate) fn eval_top_level(&mut self, node: &Node) -> Result<Value, Exception> {
        let result = self.eval_node(node).map_err(|e| self.into_exception(e))?;
        Ok(match result {
            Flow::Value(value) | Flow::Return(value) => value,
            Flow::Break | Flow::Continue => Value::default(),
        })
    }
}

/// Reads the `entrypoint` key from an `o2l.toml` project manifest.
pub fn entrypoint_from_manifest(manifest: &Path) -> Result<String, Exception> {
    let text = fs::read_to_string(manifest).map_err(|_| {
        Exception::evaluation(format!("Cannot read manifest '{}'", manifest.display()))
    })?;
    let doc: toml_edit::DocumentMut = text
        .parse()
        .map_err(|e| Exception::evaluation(format!("Invalid o2l.toml: {e}")))?;
    doc.get("entrypoint")
        .and_then(toml_edit::Item::as_str)
        .map(str::to_owned)
        .ok_or_else(|| Exception::evaluation("Found o2l.toml but no entrypoint specified"))
}
