//! Hover and go-to-definition
//!
//! A query names a word at a position and answers with the signature that
//! describes it. Lookup order:
//!
//! 1. keyword documentation
//! 2. `module.member` for a catalog module
//! 3. `receiver.member` against the receiver's inferred type
//! 4. user declarations visible at the position, else the first one in the file
//! 5. built-in globals, modules and types
//! 6. imported names, fetched through a [`ModuleResolver`]

use serde::{Deserialize, Serialize};

use crate::catalog::FunctionEntry;
use crate::document::{Document, Position, Range};
use crate::infer::{chain_start, TypeInference, Value};
use crate::model::SourceModel;
use crate::resolver::ModuleResolver;
use crate::symbol::{DeclKind, Declaration};
use crate::syntax::{ClassHeader, FunctionHeader, Import, Mutability, Param};
use crate::token::{Token, TokenKind};
use crate::types::Type;

/// Imports followed across modules before giving up
const MAX_IMPORT_HOPS: usize = 4;

/// Where a symbol is declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Set when the declaration lives in another document
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uri: Option<String>,
    pub range: Range,
}

/// Answer to a hover query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<Location>,
}

impl QueryResult {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            documentation: None,
            location: None,
        }
    }

    /// Attach documentation; blank text is dropped
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        let documentation = documentation.into();
        if !documentation.trim().is_empty() {
            self.documentation = Some(documentation);
        }
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

pub(crate) struct Query<'a> {
    inference: &'a TypeInference<'a, 'a>,
    resolver: &'a dyn ModuleResolver,
    hops: usize,
}

impl<'a> Query<'a> {
    pub(crate) fn new(inference: &'a TypeInference<'a, 'a>, resolver: &'a dyn ModuleResolver) -> Self {
        Self {
            inference,
            resolver,
            hops: 0,
        }
    }

    fn model(&self) -> &'a SourceModel<'a> {
        self.inference.model()
    }

    pub(crate) fn run(&self, position: Position, word: &str) -> Option<QueryResult> {
        let catalog = self.inference.catalog();
        if let Some(doc) = catalog.keyword_doc(word) {
            return Some(QueryResult::new(word).with_documentation(doc));
        }

        if let Some(answer) = self.member(position, word) {
            return answer;
        }

        self.declared(word, position.line)
            .or_else(|| self.builtin(word))
            .or_else(|| self.imported(word))
    }

    /// `Some(answer)` when the word follows a `.` on its line
    fn member(&self, position: Position, word: &str) -> Option<Option<QueryResult>> {
        let tokens = &self.model().lexed(position.line)?.tokens;
        let index = tokens.iter().position(|t| {
            t.text == word && t.start <= position.column && position.column <= t.end
        })?;
        let dot = index.checked_sub(1).filter(|&i| tokens[i].is(TokenKind::Dot))?;
        Some(self.member_of(tokens, dot, word, position.line))
    }

    fn member_of(&self, tokens: &[Token], dot: usize, word: &str, line: usize) -> Option<QueryResult> {
        let catalog = self.inference.catalog();
        let receiver = &tokens[chain_start(tokens, dot)..dot];

        if let [single] = receiver {
            if let Some(name) = single.ident() {
                if self.inference.is_module_reference(name, line) {
                    return module_member(self.inference, name, word);
                }
                if let Some(path) = self.whole_module_import(name) {
                    return self.in_module(&path, word);
                }
            }
        }

        let receiver_ty = self.inference.receiver_type(tokens, dot, line);
        if let Some((entry, function)) = catalog.method(&receiver_ty, word) {
            let bindings = entry.bindings(&receiver_ty);
            return Some(
                QueryResult::new(method_signature(&receiver_ty, word, function, &bindings))
                    .with_documentation(&function.doc),
            );
        }
        if let Some(decl) = self.inference.user_member(&receiver_ty, word) {
            return Some(describe(self.inference, decl));
        }

        let field = self.inference.member_type(&receiver_ty, word, 0);
        (!field.is_any()).then(|| QueryResult::new(format!("var {}: {}", word, field)))
    }

    fn declared(&self, word: &str, line: usize) -> Option<QueryResult> {
        match self.inference.value_of(word, line) {
            Some(Value::Decl(decl)) => return Some(describe(self.inference, decl)),
            Some(Value::Param { param, line }) => return Some(self.describe_param(&param, line)),
            None => {}
        }
        self.model()
            .symbols
            .lookup(word)
            .map(|decl| describe(self.inference, decl))
    }

    fn describe_param(&self, param: &Param, header_line: usize) -> QueryResult {
        let ty = self.inference.param_type(param, header_line, 0);
        QueryResult::new(format!("param {}: {}", param.name, ty)).at(Location {
            uri: self.model().document.uri().map(str::to_string),
            range: Range::new(
                header_line,
                param.column,
                param.column + param.name.chars().count(),
            ),
        })
    }

    fn builtin(&self, word: &str) -> Option<QueryResult> {
        let catalog = self.inference.catalog();
        if let Some(function) = catalog.global(word) {
            return Some(QueryResult::new(function.signature(word)).with_documentation(&function.doc));
        }
        if let Some(module) = catalog.module(word) {
            return Some(QueryResult::new(format!("module {}", word)).with_documentation(&module.doc));
        }
        let entry = catalog.type_entry(word)?;
        let signature = if entry.generics.is_empty() {
            format!("type {}", word)
        } else {
            format!("type {}<{}>", word, entry.generics.join(", "))
        };
        Some(QueryResult::new(signature).with_documentation(&entry.doc))
    }

    fn imported(&self, word: &str) -> Option<QueryResult> {
        let (import, member) = self.import_of(word)?;
        match member {
            Some(member) => self.in_module(&import.module, &member),
            None => {
                let module = self.resolver.resolve(&import.module)?;
                Some(QueryResult::new(format!("module {}", import.module)).at(Location {
                    uri: Some(module.uri),
                    range: Range::new(0, 0, 0),
                }))
            }
        }
    }

    /// The import line binding `local`, with the imported member name
    fn import_of(&self, local: &str) -> Option<(Import, Option<String>)> {
        self.model().lexed.iter().find_map(|lexed| {
            let import = Import::parse(lexed)?;
            let binding = import.bindings.iter().find(|b| b.local == local)?;
            let member = binding.member.clone();
            Some((import, member))
        })
    }

    fn whole_module_import(&self, local: &str) -> Option<String> {
        match self.import_of(local)? {
            (import, None) => Some(import.module),
            _ => None,
        }
    }

    /// Look up a top-level name in another module
    fn in_module(&self, path: &str, name: &str) -> Option<QueryResult> {
        if self.hops >= MAX_IMPORT_HOPS {
            return None;
        }
        let module = self.resolver.resolve(path)?;
        let document = Document::with_uri(module.uri, &module.text);
        let model = SourceModel::build(&document);
        let inference = TypeInference::new(&model, self.inference.catalog());
        let nested = Query {
            inference: &inference,
            resolver: self.resolver,
            hops: self.hops + 1,
        };
        match model.symbols.find_in(None, name, usize::MAX) {
            Some(decl) => Some(describe(&inference, decl)),
            None => nested.imported(name),
        }
    }
}

/// Signature, doc comment and location of a user declaration
pub(crate) fn describe(inference: &TypeInference<'_, '_>, decl: &Declaration) -> QueryResult {
    let model = inference.model();
    let mut result = QueryResult::new(declaration_signature(inference, decl)).at(Location {
        uri: model.document.uri().map(str::to_string),
        range: Range::new(decl.line, decl.column, decl.column + decl.name.chars().count()),
    });
    if let Some(doc) = model.doc_comment(decl.line) {
        result = result.with_documentation(doc);
    }
    result
}

/// `func f(a: Int) -> Int`, `class Box<T>`, `const limit: Int`
pub(crate) fn declaration_signature(inference: &TypeInference<'_, '_>, decl: &Declaration) -> String {
    let model = inference.model();
    match decl.kind {
        DeclKind::Function => match model.lexed(decl.line).and_then(FunctionHeader::parse) {
            Some(header) if header.return_annotation.is_none() => {
                format!("{} -> {}", header.signature(), inference.function_return_type(decl, 0))
            }
            Some(header) => header.signature(),
            None => format!("func {}", decl.name),
        },
        DeclKind::Variable => format!(
            "{} {}: {}",
            decl.mutability.map_or("var", Mutability::as_str),
            decl.name,
            inference.declaration_type(decl, 0)
        ),
        _ => model
            .lexed(decl.line)
            .and_then(ClassHeader::parse)
            .map(|header| header.signature())
            .unwrap_or_else(|| format!("{} {}", decl.kind.as_str(), decl.name)),
    }
}

fn module_member(inference: &TypeInference<'_, '_>, module: &str, member: &str) -> Option<QueryResult> {
    let catalog = inference.catalog();
    let qualified = format!("{}.{}", module, member);
    if let Some(function) = catalog.module_function(module, member) {
        return Some(QueryResult::new(function.signature(&qualified)).with_documentation(&function.doc));
    }
    let constant = catalog.module_constant(module, member)?;
    Some(
        QueryResult::new(format!("const {}: {}", qualified, constant.value_type()))
            .with_documentation(&constant.doc),
    )
}

/// `func Array<Int>.push(value: Int) -> Void`
pub(crate) fn method_signature(
    receiver: &Type,
    name: &str,
    function: &FunctionEntry,
    bindings: &[(String, Type)],
) -> String {
    let params = function
        .params
        .iter()
        .map(|param| match param.split_once(':') {
            Some((name, ty)) => format!("{}: {}", name.trim(), Type::parse(ty.trim()).substitute(bindings)),
            None => param.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "func {}.{}({}) -> {}",
        receiver,
        name,
        params,
        function.return_type().substitute(bindings)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::resolver::{MemoryResolver, NoopResolver};

    fn query_with(src: &str, line: usize, column: usize, resolver: &dyn ModuleResolver) -> Option<QueryResult> {
        let doc = Document::new(src);
        let model = SourceModel::build(&doc);
        let catalog = Catalog::builtin();
        let inference = TypeInference::new(&model, &catalog);
        let (word, _) = doc.word_at(Position::new(line, column))?;
        Query::new(&inference, resolver).run(Position::new(line, column), &word)
    }

    fn query(src: &str, line: usize, column: usize) -> Option<QueryResult> {
        query_with(src, line, column, &NoopResolver)
    }

    #[test]
    fn test_keyword() {
        let result = query("while true:\nend", 0, 2).unwrap();
        assert_eq!(result.signature, "while");
        assert!(result.documentation.unwrap().contains("Loop"));
    }

    #[test]
    fn test_function_with_inferred_return_and_docs() {
        let src = "// Adds one.\nfunc inc(n: Int):\n    return n + 1\nend\nprint(inc(2))";
        let result = query(src, 4, 7).unwrap();
        assert_eq!(result.signature, "func inc(n: Int) -> Int");
        assert_eq!(result.documentation.as_deref(), Some("Adds one."));
        assert_eq!(result.location.unwrap().range, Range::new(1, 5, 8));
    }

    #[test]
    fn test_variable_and_param() {
        let src = "const limit = 10\nfunc f(count: Int):\n    print(count + limit)\nend";
        assert_eq!(query(src, 2, 18).unwrap().signature, "const limit: Int");
        assert_eq!(query(src, 2, 11).unwrap().signature, "param count: Int");
    }

    #[test]
    fn test_catalog_module_member() {
        let result = query("var r = math.sqrt(2.0)", 0, 14).unwrap();
        assert!(result.signature.starts_with("func math.sqrt("));
        assert!(result.documentation.is_some());
    }

    #[test]
    fn test_generic_method_substitution() {
        let src = "var names = [\"a\", \"b\"]\nnames.push(\"c\")";
        let result = query(src, 1, 7).unwrap();
        assert_eq!(result.signature, "func Array<String>.push(item: String) -> Void");
        assert_eq!(result.documentation.as_deref(), Some("Appends an element."));
    }

    #[test]
    fn test_user_class_member() {
        let src = "\
class Point:
    var x: Int = 0
    func norm() -> Float:
        return 0.0
    end
end
var p = Point()
p.norm()";
        assert_eq!(query(src, 7, 3).unwrap().signature, "func norm() -> Float");
        assert_eq!(query(src, 6, 9).unwrap().signature, "class Point");
    }

    #[test]
    fn test_unknown_word() {
        assert!(query("print(mystery)", 0, 8).is_none());
    }

    #[test]
    fn test_imported_function() {
        let resolver = MemoryResolver::new().with_module(
            "util.text",
            "// Pads text.\nfunc pad(s: String, n: Int) -> String:\n    return s\nend",
        );
        let src = "from util.text import pad\npad(\"a\", 3)";
        let result = query_with(src, 1, 1, &resolver).unwrap();
        assert_eq!(result.signature, "func pad(s: String, n: Int) -> String");
        assert_eq!(result.documentation.as_deref(), Some("Pads text."));
        assert_eq!(
            result.location.unwrap().uri.as_deref(),
            Some("memory:///util/text.tl")
        );

        assert!(query(src, 1, 1).is_none());
    }

    #[test]
    fn test_member_of_imported_module() {
        let resolver = MemoryResolver::new().with_module("util.text", "func pad():\nend");
        let src = "import util.text\ntext.pad()";
        let result = query_with(src, 1, 6, &resolver).unwrap();
        assert_eq!(result.signature, "func pad() -> Void");
    }
}
