use swc_common::errors::Handler;
use swc_common::sync::Lrc;
use swc_common::{FileName, Globals, Mark, SourceFile, SourceMap, GLOBALS};
use swc_ecma_parser::{lexer::Lexer, StringInput, Syntax};
use swc_ecma_parser::{Capturing, Parser, TsSyntax};
use swc_ecma_transforms::resolver;
use swc_ecma_visit::{FoldWith, VisitWith};
use thiserror::Error;

mod import_visitor;

pub use import_visitor::{ImportVisitor, ModuleImports};

#[derive(Debug, Error)]
#[error("error parsing {filepath}:\n {parser_errors}")]
pub struct ParseError {
    pub filepath: String,
    pub parser_errors: String,
}

/// Parses module source and extracts every import-like reference from it.
///
/// The file name is only used for error messages and for the tsx/jsx
/// lexer switch; the source itself is taken as given.
pub fn parse_module_imports(file_name: &str, source: &str) -> Result<ModuleImports, ParseError> {
    let cm = Lrc::<SourceMap>::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Custom(file_name.to_string())),
        source.to_string(),
    );

    let dst: Box<Vec<u8>> = Box::new(Vec::new());
    let handler = Handler::with_emitter_writer(dst, Some(cm.clone()));
    let lexer = create_lexer(&fm);
    let capturing = Capturing::new(lexer);
    let mut parser = Parser::new_from(capturing);

    let ts_module = match parser.parse_typescript_module() {
        Ok(module) => module,
        Err(error) => {
            let mut diagnostic = error.into_diagnostic(&handler);
            let message = diagnostic.message();
            diagnostic.cancel();
            return Err(ParseError {
                filepath: file_name.to_string(),
                parser_errors: message,
            });
        }
    };

    let recovered = parser.take_errors();
    if !recovered.is_empty() {
        let mut parser_errors: Vec<String> = Vec::new();
        for error in recovered {
            let mut diagnostic = error.into_diagnostic(&handler);
            parser_errors.push(diagnostic.message());
            diagnostic.cancel();
        }
        return Err(ParseError {
            filepath: file_name.to_string(),
            parser_errors: parser_errors.join("\n"),
        });
    }

    let mut visitor = ImportVisitor::new();

    let globals = Globals::new();
    GLOBALS.set(&globals, || {
        // The resolver pass gives each binding a syntax context, which is
        // what lets the visitor tell a shadowed `require` from the real one.
        let mut resolver = resolver(Mark::fresh(Mark::root()), Mark::fresh(Mark::root()), true);
        let resolved = ts_module.fold_with(&mut resolver);
        resolved.visit_with(&mut visitor);
    });

    Ok(visitor.into_imports())
}

fn create_lexer(fm: &SourceFile) -> Lexer<'_> {
    let filename = fm.name.to_string();
    Lexer::new(
        Syntax::Typescript(TsSyntax {
            tsx: filename.ends_with(".tsx") || filename.ends_with(".jsx"),
            decorators: true,
            ..Default::default()
        }),
        Default::default(),
        StringInput::from(fm),
        None,
    )
}
