use ahashmap::{AHashMap, AHashSet};
use swc_ecma_ast::{
    BindingIdent, CallExpr, Callee, ExportAll, Id, ImportDecl, ImportSpecifier, Lit, NamedExport,
    TsImportEqualsDecl,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Every import-like reference extracted from one module.
#[derive(Debug, Default, Clone)]
pub struct ModuleImports {
    /// Raw specifiers from static imports, re-exports, dynamic `import()`
    /// and literal `require()` calls.
    pub specifiers: AHashSet<String>,
    /// Script-local binding name of each default import, mapped to the
    /// specifier it was imported from.
    pub default_bindings: AHashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct ImportVisitor {
    imports: ModuleImports,
    require_identifiers: AHashSet<Id>,
}

impl ImportVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_imports(self) -> ModuleImports {
        self.imports
    }
}

impl Visit for ImportVisitor {
    fn visit_import_decl(&mut self, node: &ImportDecl) {
        node.visit_children_with(self);
        let specifier = node.src.value.to_string();
        for spec in &node.specifiers {
            if let ImportSpecifier::Default(default) = spec {
                self.imports
                    .default_bindings
                    .insert(default.local.sym.to_string(), specifier.clone());
            }
        }
        self.imports.specifiers.insert(specifier);
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        export.visit_children_with(self);
        if let Some(source) = &export.src {
            self.imports.specifiers.insert(source.value.to_string());
        }
    }

    fn visit_export_all(&mut self, export: &ExportAll) {
        export.visit_children_with(self);
        self.imports.specifiers.insert(export.src.value.to_string());
    }

    fn visit_ts_import_equals_decl(&mut self, decl: &TsImportEqualsDecl) {
        decl.visit_children_with(self);
        if let Some(module_ref) = decl.module_ref.as_ts_external_module_ref() {
            self.imports
                .specifiers
                .insert(module_ref.expr.value.to_string());
        }
    }

    // Bindings named `require` shadow the real one; the resolver pass run
    // before this visitor makes the contexts distinguishable.
    fn visit_binding_ident(&mut self, binding: &BindingIdent) {
        binding.visit_children_with(self);
        if &*binding.sym == "require" {
            self.require_identifiers.insert(binding.id.to_id());
        }
    }

    fn visit_call_expr(&mut self, expr: &CallExpr) {
        expr.visit_children_with(self);
        if let Callee::Import(_) = &expr.callee {
            if let Some(specifier) = extract_argument_value(expr) {
                self.imports.specifiers.insert(specifier);
            }
        }
        if let Callee::Expr(callee) = &expr.callee {
            if let Some(ident) = callee.as_ident() {
                if &*ident.sym == "require" && !self.require_identifiers.contains(&ident.to_id()) {
                    if let Some(specifier) = extract_argument_value(expr) {
                        self.imports.specifiers.insert(specifier);
                    }
                }
            }
        }
    }
}

// Only a literal string argument produces a tracked specifier; computed
// and template arguments contribute nothing.
fn extract_argument_value(expr: &CallExpr) -> Option<String> {
    let argument = expr.args.first()?;
    match argument.expr.as_lit() {
        Some(Lit::Str(value)) => Some(value.value.to_string()),
        _ => None,
    }
}
