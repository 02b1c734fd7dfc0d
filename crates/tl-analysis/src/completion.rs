//! Completion candidates

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::document::{Document, Position};
use crate::infer::{chain_start, TypeInference};
use crate::model::SourceModel;
use crate::query::{declaration_signature, method_signature};
use crate::resolver::ModuleResolver;
use crate::symbol::{DeclKind, Declaration};
use crate::syntax::{ClassHeader, FunctionHeader, Import};
use crate::token::{Token, TokenKind};

/// Longest `extends` chain walked when listing members
const MAX_BASE_HOPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Keyword,
    Function,
    Method,
    Field,
    Variable,
    Constant,
    Class,
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    /// Signature or type
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub documentation: Option<String>,
}

impl CompletionItem {
    fn new(label: impl Into<String>, kind: CompletionKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
        }
    }

    fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn documentation(mut self, doc: &str) -> Self {
        if !doc.trim().is_empty() {
            self.documentation = Some(doc.to_string());
        }
        self
    }
}

/// Candidates at a position: members after `recv.`, otherwise everything
/// visible there plus the built-ins
pub(crate) fn completions(
    inference: &TypeInference<'_, '_>,
    resolver: &dyn ModuleResolver,
    position: Position,
) -> Vec<CompletionItem> {
    let model = inference.model();
    let Some(lexed) = model.lexed(position.line) else {
        return Vec::new();
    };
    let before: Vec<Token> = lexed
        .tokens
        .iter()
        .take_while(|t| t.end <= position.column)
        .cloned()
        .collect();

    let items = match member_dot(&before, position.column) {
        Some(dot) => members(inference, resolver, &before, dot, position.line),
        None => scope_items(inference, position.line),
    };

    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.label.clone()))
        .collect()
}

/// Index of the `.` the cursor completes after, if any
fn member_dot(tokens: &[Token], column: usize) -> Option<usize> {
    let last = tokens.len().checked_sub(1)?;
    if tokens[last].is(TokenKind::Dot) {
        return Some(last);
    }
    let partial = &tokens[last];
    if (partial.is_ident() || matches!(partial.kind, TokenKind::Keyword(_))) && partial.end == column {
        let dot = last.checked_sub(1)?;
        return tokens[dot].is(TokenKind::Dot).then_some(dot);
    }
    None
}

fn members(
    inference: &TypeInference<'_, '_>,
    resolver: &dyn ModuleResolver,
    tokens: &[Token],
    dot: usize,
    line: usize,
) -> Vec<CompletionItem> {
    let catalog = inference.catalog();
    let receiver = &tokens[chain_start(tokens, dot)..dot];

    if let [single] = receiver {
        if let Some(name) = single.ident() {
            if inference.is_module_reference(name, line) {
                return module_members(inference, name);
            }
            if let Some(path) = whole_module_import(inference.model(), name) {
                return imported_members(inference, resolver, &path);
            }
        }
    }

    let receiver_ty = inference.receiver_type(tokens, dot, line);
    let mut items = Vec::new();

    if let Some(name) = receiver_ty.name() {
        if let Some(entry) = catalog.type_entry(name) {
            let bindings = entry.bindings(&receiver_ty);
            for (method, function) in &entry.methods {
                items.push(
                    CompletionItem::new(method.clone(), CompletionKind::Method)
                        .detail(method_signature(&receiver_ty, method, function, &bindings))
                        .documentation(&function.doc),
                );
            }
        }
    }

    let symbols = &inference.model().symbols;
    let mut class_name = receiver_ty.name().map(str::to_string);
    for _ in 0..MAX_BASE_HOPS {
        let Some(class) = class_name.as_deref().and_then(|n| symbols.class_named(n)) else {
            break;
        };
        let Some(frame) = class.body else {
            break;
        };
        for member in symbols.members_of(frame) {
            items.push(declaration_item(inference, member, true));
        }
        class_name = inference
            .model()
            .lexed(class.line)
            .and_then(ClassHeader::parse)
            .and_then(|h| h.base);
    }

    items
}

fn module_members(inference: &TypeInference<'_, '_>, module: &str) -> Vec<CompletionItem> {
    let Some(entry) = inference.catalog().module(module) else {
        return Vec::new();
    };
    let functions = entry.functions.iter().map(|(name, function)| {
        CompletionItem::new(name.clone(), CompletionKind::Function)
            .detail(function.signature(name))
            .documentation(&function.doc)
    });
    let constants = entry.constants.iter().map(|(name, constant)| {
        CompletionItem::new(name.clone(), CompletionKind::Constant)
            .detail(constant.value_type().to_string())
            .documentation(&constant.doc)
    });
    functions.chain(constants).collect()
}

fn whole_module_import(model: &SourceModel<'_>, local: &str) -> Option<String> {
    model.lexed.iter().find_map(|lexed| {
        let import = Import::parse(lexed)?;
        import
            .bindings
            .iter()
            .any(|b| b.local == local && b.member.is_none())
            .then(|| import.module.clone())
    })
}

/// Top-level declarations of a module fetched through the resolver
fn imported_members(
    inference: &TypeInference<'_, '_>,
    resolver: &dyn ModuleResolver,
    path: &str,
) -> Vec<CompletionItem> {
    let Some(module) = resolver.resolve(path) else {
        return Vec::new();
    };
    let document = Document::with_uri(module.uri, &module.text);
    let model = SourceModel::build(&document);
    let nested = TypeInference::new(&model, inference.catalog());
    model
        .symbols
        .all()
        .iter()
        .filter(|d| d.frame.is_none())
        .map(|d| declaration_item(&nested, d, false))
        .collect()
}

fn scope_items(inference: &TypeInference<'_, '_>, line: usize) -> Vec<CompletionItem> {
    let model = inference.model();
    let catalog = inference.catalog();
    let mut items: Vec<CompletionItem> = model
        .symbols
        .visible_at(line, &model.tree)
        .into_iter()
        .map(|decl| declaration_item(inference, decl, false))
        .collect();

    let tree = &model.tree;
    for frame in tree.ancestors(tree.innermost(line)) {
        let frame = tree.frame(frame);
        if !frame.kind.is_function() {
            continue;
        }
        let Some(header) = model.lexed(frame.header_line).and_then(FunctionHeader::parse) else {
            continue;
        };
        for param in &header.params {
            let ty = inference.param_type(param, frame.header_line, 0);
            items.push(CompletionItem::new(param.name.clone(), CompletionKind::Variable).detail(ty.to_string()));
        }
    }

    for lexed in &model.lexed {
        if let Some(import) = Import::parse(lexed) {
            for binding in import.bindings {
                let kind = match binding.member {
                    Some(_) => CompletionKind::Function,
                    None => CompletionKind::Module,
                };
                items.push(CompletionItem::new(binding.local, kind).detail(format!("from {}", import.module)));
            }
        }
    }

    items.extend(catalog.globals.iter().map(|(name, function)| {
        CompletionItem::new(name.clone(), CompletionKind::Function)
            .detail(function.signature(name))
            .documentation(&function.doc)
    }));
    items.extend(catalog.modules.iter().map(|(name, module)| {
        CompletionItem::new(name.clone(), CompletionKind::Module)
            .detail(format!("module {}", name))
            .documentation(&module.doc)
    }));
    items.extend(catalog.types.iter().map(|(name, entry)| {
        CompletionItem::new(name.clone(), CompletionKind::Class)
            .detail(format!("type {}", name))
            .documentation(&entry.doc)
    }));
    items.extend(catalog.keywords.iter().map(|(word, doc)| {
        CompletionItem::new(word.clone(), CompletionKind::Keyword).documentation(doc)
    }));

    items
}

fn declaration_item(inference: &TypeInference<'_, '_>, decl: &Declaration, member: bool) -> CompletionItem {
    let kind = match decl.kind {
        DeclKind::Function if member => CompletionKind::Method,
        DeclKind::Function => CompletionKind::Function,
        DeclKind::Variable if member => CompletionKind::Field,
        DeclKind::Variable if decl.mutability.is_some_and(|m| m.is_immutable()) => CompletionKind::Constant,
        DeclKind::Variable => CompletionKind::Variable,
        _ => CompletionKind::Class,
    };
    let mut item = CompletionItem::new(decl.name.clone(), kind).detail(declaration_signature(inference, decl));
    if let Some(doc) = inference.model().doc_comment(decl.line) {
        item = item.documentation(&doc);
    }
    item
}
