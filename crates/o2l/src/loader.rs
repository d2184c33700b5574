use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;

use crate::{
    exception::{Exception, RunResult},
    expressions::{ImportPath, Node},
    modules,
    namespace::Namespaces,
    parse::parse_program,
    run::Interpreter,
    value::Value,
};

/// Resolves import specs to native built-ins or lazily parsed-and-
/// evaluated source modules, with caching and cycle detection.
///
/// Two chains track in-flight work: `loading_chain` holds files being
/// loaded (file-level cycles), `resolution_chain` holds user import
/// specs being resolved (spec-level cycles). Both are unwound on every
/// exit path, so a failed import leaves the loader reusable.
#[derive(Debug, Default)]
pub(crate) struct ModuleLoader {
    user_search_paths: Vec<PathBuf>,
    library_search_paths: Vec<PathBuf>,
    /// Fully evaluated module file -> exported objects.
    loaded_modules: HashMap<PathBuf, IndexMap<String, Value>>,
    /// Owned ASTs of loaded modules; keeps declaration provenance for
    /// as long as the loader lives.
    ast_storage: HashMap<PathBuf, Vec<Node>>,
    loading_chain: Vec<PathBuf>,
    resolution_chain: Vec<String>,
}

impl ModuleLoader {
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            user_search_paths: vec![cwd.clone(), cwd.join("src")],
            library_search_paths: vec![cwd.join(".o2l").join("lib"), cwd.join("modules"), cwd.join("lib")],
            loaded_modules: HashMap::new(),
            ast_storage: HashMap::new(),
            loading_chain: Vec::new(),
            resolution_chain: Vec::new(),
        }
    }

    /// Adds a directory searched for both user and library modules
    /// (the entry file's directory, for relative imports).
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if path.is_dir() {
            self.user_search_paths.push(path.clone());
            self.library_search_paths.push(path);
        }
    }

    /// Locates the `.obq` file for an import spec.
    ///
    /// User imports search only local source directories; library
    /// imports search installed and system locations, including the
    /// `.o2l/lib/<name>/...` package layout.
    fn find_module_file(&self, path: &ImportPath) -> Result<PathBuf, Exception> {
        let relative: PathBuf = path
            .package
            .iter()
            .collect::<PathBuf>()
            .join(format!("{}.obq", path.object));

        if path.user {
            for search_path in &self.user_search_paths {
                let candidate = search_path.join(&relative);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
            return Err(Exception::evaluation(format!(
                "Local file not found: {} (use @import for local user files)",
                path.object
            )));
        }

        for search_path in &self.library_search_paths {
            // The package manager installs under lib/<name>/<package...>/<name>.obq.
            if search_path.ends_with(Path::new(".o2l").join("lib")) {
                let candidate = search_path.join(&path.object).join(&relative);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
            let candidate = search_path.join(&relative);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(Exception::evaluation(format!(
            "Library not found: {} (use import for installed libraries)",
            path.object
        )))
    }
}

/// The display name used in cycle diagnostics: file stem without `.obq`.
fn module_display_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl ModuleLoader {
    /// The stored AST of a loaded module, if that file has been loaded.
    pub(crate) fn module_ast(&self, file: &Path) -> Option<&[Node]> {
        self.ast_storage.get(file).map(Vec::as_slice)
    }
}

impl Interpreter {
    /// Evaluates an `import` / `@import` statement: resolves the spec
    /// and binds the result in the current scope.
    pub(crate) fn eval_import(&mut self, path: &ImportPath) -> RunResult<()> {
        let value = self.resolve_import(path)?;

        self.namespaces
            .define_variable(&path.object, value.clone())
            .map_err(|e| self.raise(e))?;
        // Package-qualified imports are also reachable under the dotted
        // name (`system.os.args()` alongside `os.args()`).
        if !path.package.is_empty() {
            self.namespaces
                .define_variable(&path.dotted(), value.clone())
                .map_err(|e| self.raise(e))?;
        }
        if let Some(member) = &path.member {
            if member != "*" {
                self.namespaces
                    .define_variable(&format!("{}_{member}", path.object), value)
                    .map_err(|e| self.raise(e))?;
            }
        }
        Ok(())
    }

    /// Resolves an import spec to a value, without binding it.
    pub(crate) fn resolve_import(&mut self, path: &ImportPath) -> RunResult<Value> {
        // Known built-ins are materialized by factories, never parsed.
        if modules::is_native_module(path) {
            let id = modules::create_native_module(&path.object, &mut self.heap)
                .expect("is_native_module implies a factory exists");
            return Ok(Value::Ref(id));
        }

        // Package-qualified library imports resolve against namespaced
        // declarations already in scope.
        if !path.user && !path.package.is_empty() {
            let qualified = path.dotted();
            if self.namespaces.has(&qualified) {
                return self.namespaces.get(&qualified).map_err(|e| self.raise(e));
            }
            return Err(self.eval_err(format!(
                "Namespace object '{qualified}' not found. Make sure the namespace is declared \
                 in the same file or imported from another module."
            )));
        }

        if path.user {
            let key = path.dotted();
            if let Some(position) = self.loader.resolution_chain.iter().position(|spec| spec == &key) {
                let mut chain = self.loader.resolution_chain[position..].join(" -> ");
                chain.push_str(" -> ");
                chain.push_str(&key);
                return Err(self.eval_err(format!("Circular @import detected: {chain}")));
            }
            self.loader.resolution_chain.push(key);
            let result = self.resolve_import_file(path);
            self.loader.resolution_chain.pop();
            result
        } else {
            self.resolve_import_file(path)
        }
    }

    fn resolve_import_file(&mut self, path: &ImportPath) -> RunResult<Value> {
        let file = self.loader.find_module_file(path).map_err(|e| self.raise(e))?;
        let exports = self.load_module_file(&file)?;

        let Some(value) = exports.get(&path.object) else {
            return Err(self.eval_err(format!("Object '{}' not found in module", path.object)));
        };
        let value = value.clone();

        if let Some(member) = &path.member {
            if member != "*" {
                let has_method = match &value {
                    Value::Ref(id) => match self.heap.get(*id) {
                        crate::heap::HeapData::Object(object) => object.has_method(member),
                        _ => false,
                    },
                    _ => false,
                };
                if !has_method {
                    return Err(self.eval_err(format!(
                        "Method '{member}' not found in object '{}'",
                        path.object
                    )));
                }
            }
        }
        Ok(value)
    }

    /// Loads, parses, and evaluates a module file in a fresh environment,
    /// returning its exports. Results are cached per file.
    pub(crate) fn load_module_file(&mut self, file: &Path) -> RunResult<IndexMap<String, Value>> {
        if let Some(cached) = self.loader.loaded_modules.get(file) {
            return Ok(cached.clone());
        }

        if self.loader.loading_chain.iter().any(|loading| loading.as_path() == file) {
            let mut chain: Vec<String> = self.loader.loading_chain.iter().map(|p| module_display_name(p)).collect();
            chain.push(module_display_name(file));
            return Err(self.eval_err(format!(
                "Circular @import detected: {}",
                chain.join(" -> ")
            )));
        }

        self.loader.loading_chain.push(file.to_path_buf());
        let result = self.load_module_contents(file);
        self.loader.loading_chain.pop();

        if let Ok(exports) = &result {
            self.loader.loaded_modules.insert(file.to_path_buf(), exports.clone());
        }
        result
    }

    fn load_module_contents(&mut self, file: &Path) -> RunResult<IndexMap<String, Value>> {
        let source = fs::read_to_string(file)
            .map_err(|_| self.eval_err(format!("Cannot open module file: {}", file.display())))?;
        let nodes = parse_program(&source, &file.display().to_string()).map_err(|e| self.raise(e))?;

        // Modules evaluate in a fresh environment: no variable
        // inheritance from the importing scope.
        let saved = std::mem::replace(&mut self.namespaces, Namespaces::new());
        let result = self.eval_module_nodes(&nodes);
        self.namespaces = saved;

        if result.is_ok() {
            self.loader.ast_storage.insert(file.to_path_buf(), nodes);
        }
        result
    }

    fn eval_module_nodes(&mut self, nodes: &[Node]) -> RunResult<IndexMap<String, Value>> {
        // First pass: resolve this module's imports so declarations can
        // reference them.
        for node in nodes {
            if let Node::Import { path, .. } = node {
                self.eval_import(path)?;
            }
        }

        // Second pass: evaluate declarations and collect the exports.
        let mut exports = IndexMap::new();
        for node in nodes {
            match node {
                Node::Import { .. } => {}
                Node::Namespace { .. } => {
                    self.eval_node(node)?;
                }
                _ => {
                    if let Some((name, value)) = self.eval_declaration(node)? {
                        self.namespaces
                            .define_variable(&name, value.clone())
                            .map_err(|e| self.raise(e))?;
                        exports.insert(name, value);
                    }
                }
            }
        }
        Ok(exports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::NoPrint;

    #[test]
    fn loaded_modules_keep_their_ast_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Helper.obq");
        fs::write(
            &file,
            "Object Helper {\n    @external method one(): Int {\n        return 1\n    }\n}\n",
        )
        .unwrap();

        let mut interp = Interpreter::with_writer("main.obq", Box::new(NoPrint));
        let exports = interp.load_module_file(&file).unwrap();
        assert!(exports.contains_key("Helper"));

        // The AST is owned by the loader for as long as it lives.
        let ast = interp.loader.module_ast(&file).expect("stored AST");
        assert_eq!(ast.len(), 1);

        // A second load is served from the cache.
        let again = interp.load_module_file(&file).unwrap();
        assert_eq!(again.len(), exports.len());
    }

    #[test]
    fn missing_files_report_the_import_kind() {
        let loader = ModuleLoader::new();
        let user = ImportPath {
            package: vec![],
            object: "Nowhere".to_owned(),
            member: None,
            user: true,
        };
        let err = loader.find_module_file(&user).unwrap_err();
        assert!(err.message().contains("use @import for local user files"));

        let library = ImportPath {
            user: false,
            ..user
        };
        let err = loader.find_module_file(&library).unwrap_err();
        assert!(err.message().contains("use import for installed libraries"));
    }
}
