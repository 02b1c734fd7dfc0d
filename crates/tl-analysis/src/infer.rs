//! Type inference
//!
//! Maps expression tokens to a [`Type`] without an expression grammar. Rules
//! are tried in order and the first that applies wins; anything unrecognised
//! is `Any`. Looser-binding operators are checked first, so `a + 1 > 2` is a
//! comparison rather than an addition.
//!
//! Function return types and variable initializers are inferred lazily and
//! memoized per run. Cycles (`func f(): return f()`, `var a = a`) are cut by
//! in-progress sets and fall back to `Any`.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::catalog::Catalog;
use crate::lexer::{lex_line, matching_close, matching_open, split_top_level, top_level_positions};
use crate::model::SourceModel;
use crate::scope::FrameId;
use crate::symbol::{Binding, DeclKind, Declaration};
use crate::syntax::{ClassHeader, FunctionHeader, Param};
use crate::token::{Keyword, Token, TokenKind};
use crate::types::Type;

/// Nesting limit for a single expression
const MAX_DEPTH: usize = 32;
/// Longest `extends` chain followed when looking up members
const MAX_BASE_HOPS: usize = 8;

/// Where a name visible at a line comes from
#[derive(Debug, Clone)]
pub enum Value<'m> {
    Decl(&'m Declaration),
    Param {
        param: Param,
        /// Header line of the function declaring the parameter
        line: usize,
    },
}

pub struct TypeInference<'m, 'd> {
    model: &'m SourceModel<'d>,
    catalog: &'m Catalog,
    returns: RefCell<HashMap<FrameId, Type>>,
    active_returns: RefCell<HashSet<FrameId>>,
    active_decls: RefCell<HashSet<(usize, usize)>>,
}

impl<'m, 'd> TypeInference<'m, 'd> {
    pub fn new(model: &'m SourceModel<'d>, catalog: &'m Catalog) -> Self {
        Self {
            model,
            catalog,
            returns: RefCell::new(HashMap::new()),
            active_returns: RefCell::new(HashSet::new()),
            active_decls: RefCell::new(HashSet::new()),
        }
    }

    pub fn catalog(&self) -> &'m Catalog {
        self.catalog
    }

    pub fn model(&self) -> &'m SourceModel<'d> {
        self.model
    }

    /// Infer the type of expression text as it would evaluate on `line`
    pub fn infer_type(&self, expr: &str, line: usize) -> Type {
        let tokens = lex_line(expr).tokens;
        self.infer_tokens(&tokens, line, 0)
    }

    pub fn infer_tokens(&self, tokens: &[Token], line: usize, depth: usize) -> Type {
        if tokens.is_empty() || depth > MAX_DEPTH {
            return Type::Any;
        }
        let last = tokens.len() - 1;

        if tokens[0].is(TokenKind::LeftParen) && matching_close(tokens, 0) == Some(last) {
            return self.infer_tokens(&tokens[1..last], line, depth + 1);
        }

        let boolean = top_level_positions(tokens, |t| t.kind.is_comparison() || t.kind.is_logical());
        if !boolean.is_empty() || tokens[0].is(TokenKind::Bang) {
            return Type::bool();
        }

        if !top_level_positions(tokens, |t| t.is(TokenKind::Ellipsis)).is_empty() {
            return Type::array(Type::int());
        }

        if let Some(ty) = self.infer_arithmetic(tokens, line, depth) {
            return ty;
        }

        self.infer_chain(tokens, line, depth).unwrap_or(Type::Any)
    }

    fn infer_arithmetic(&self, tokens: &[Token], line: usize, depth: usize) -> Option<Type> {
        let binary: Vec<usize> = top_level_positions(tokens, |t| t.kind.is_arithmetic())
            .into_iter()
            .filter(|&i| !is_unary(tokens, i))
            .collect();

        if binary.is_empty() {
            return match tokens[0].kind {
                TokenKind::Minus | TokenKind::Plus if tokens.len() > 1 => {
                    Some(self.infer_tokens(&tokens[1..], line, depth + 1))
                }
                _ => None,
            };
        }

        let mut operands = Vec::with_capacity(binary.len() + 1);
        let mut start = 0;
        for &op in &binary {
            operands.push(&tokens[start..op]);
            start = op + 1;
        }
        operands.push(&tokens[start..]);

        let types: Vec<Type> = operands
            .iter()
            .map(|operand| self.infer_tokens(operand, line, depth + 1))
            .collect();

        let concatenates = binary.iter().any(|&i| tokens[i].is(TokenKind::Plus));
        if concatenates && types.iter().any(|t| t.is_named("String")) {
            return Some(Type::string());
        }
        if types.iter().any(Type::is_floating) {
            return Some(Type::float());
        }
        if types.iter().all(|t| t.is_named("Int")) {
            return Some(Type::int());
        }
        Some(Type::Any)
    }

    /// Literal or name followed by any number of `.member`, `.call()`, `[i]`, `(args)`
    fn infer_chain(&self, tokens: &[Token], line: usize, depth: usize) -> Option<Type> {
        let (mut ty, mut index) = self.primary(tokens, line, depth)?;

        while index < tokens.len() {
            let token = &tokens[index];
            match token.kind {
                TokenKind::Dot => {
                    let member = tokens.get(index + 1)?;
                    let name = member_name(member)?;
                    match tokens.get(index + 2) {
                        Some(open) if open.is(TokenKind::LeftParen) => {
                            let close = matching_close(tokens, index + 2)?;
                            ty = self.infer_method_return_type(&ty, name, depth + 1);
                            index = close + 1;
                        }
                        _ => {
                            ty = self.member_type(&ty, name, depth + 1);
                            index += 2;
                        }
                    }
                }
                TokenKind::LeftBracket => {
                    let close = matching_close(tokens, index)?;
                    ty = ty.element_type();
                    index = close + 1;
                }
                TokenKind::LeftParen => {
                    let close = matching_close(tokens, index)?;
                    ty = Type::Any;
                    index = close + 1;
                }
                _ => return None,
            }
        }

        Some(ty)
    }

    fn primary(&self, tokens: &[Token], line: usize, depth: usize) -> Option<(Type, usize)> {
        let first = tokens.first()?;
        let literal = match first.kind {
            TokenKind::Str => Some(Type::string()),
            TokenKind::Int => Some(Type::int()),
            TokenKind::Float => Some(Type::float()),
            TokenKind::Keyword(Keyword::True | Keyword::False) => Some(Type::bool()),
            TokenKind::Keyword(Keyword::Null) => Some(Type::Any),
            TokenKind::Keyword(Keyword::This) => Some(self.this_type(line)),
            _ => None,
        };
        if let Some(ty) = literal {
            return Some((ty, 1));
        }

        match first.kind {
            TokenKind::LeftBracket => {
                let close = matching_close(tokens, 0)?;
                Some((self.infer_array(&tokens[1..close], line, depth), close + 1))
            }
            TokenKind::LeftBrace => {
                let close = matching_close(tokens, 0)?;
                Some((Type::map(Type::Any, Type::Any), close + 1))
            }
            TokenKind::LeftParen => {
                let close = matching_close(tokens, 0)?;
                Some((self.infer_tokens(&tokens[1..close], line, depth + 1), close + 1))
            }
            TokenKind::Ident => {
                let name = first.text.as_str();
                match tokens.get(1).map(|t| t.kind) {
                    Some(TokenKind::LeftParen) => {
                        let close = matching_close(tokens, 1)?;
                        Some((self.call_type(name, line, depth + 1), close + 1))
                    }
                    Some(TokenKind::Dot) if self.is_module_reference(name, line) => {
                        let member = tokens.get(2)?.ident()?;
                        match tokens.get(3) {
                            Some(open) if open.is(TokenKind::LeftParen) => {
                                let close = matching_close(tokens, 3)?;
                                let ty = self
                                    .catalog
                                    .module_function(name, member)
                                    .map(|f| f.return_type())
                                    .unwrap_or(Type::Any);
                                Some((ty, close + 1))
                            }
                            _ => Some((self.module_member_type(name, member), 3)),
                        }
                    }
                    _ => Some((self.identifier_type(name, line, depth), 1)),
                }
            }
            _ => None,
        }
    }

    fn infer_array(&self, inner: &[Token], line: usize, depth: usize) -> Type {
        let mut distinct: Vec<Type> = Vec::new();
        for element in split_top_level(inner, TokenKind::Comma) {
            if element.is_empty() {
                continue;
            }
            let ty = self.infer_tokens(element, line, depth + 1);
            if !distinct.contains(&ty) {
                distinct.push(ty);
            }
        }
        match distinct.as_slice() {
            [single] if !single.is_any() => Type::array(single.clone()),
            _ => Type::array(Type::Any),
        }
    }

    /// A catalog module name not shadowed by a local value
    pub fn is_module_reference(&self, name: &str, line: usize) -> bool {
        self.catalog.module(name).is_some() && self.value_of(name, line).is_none()
    }

    fn module_member_type(&self, module: &str, member: &str) -> Type {
        if let Some(constant) = self.catalog.module_constant(module, member) {
            return constant.value_type();
        }
        Type::Any
    }

    /// Type produced by calling `name(...)` on a line
    pub fn call_type(&self, name: &str, line: usize, depth: usize) -> Type {
        if is_capitalized(name) {
            return match self.catalog.type_entry(name) {
                Some(entry) => entry.open_instance(name),
                None => Type::named(name),
            };
        }

        match self.value_of(name, line) {
            Some(Value::Decl(decl)) if decl.kind == DeclKind::Function => {
                return self.function_return_type(decl, depth);
            }
            Some(_) => return Type::Any,
            None => {}
        }

        if let Some(decl) = self
            .model
            .symbols
            .lookup(name)
            .filter(|d| d.kind == DeclKind::Function)
        {
            return self.function_return_type(decl, depth);
        }

        self.catalog
            .global(name)
            .map(|f| f.return_type())
            .unwrap_or(Type::Any)
    }

    /// Resolve a name at a line: declarations frame by frame, innermost
    /// first, with the parameters of each enclosing function checked after
    /// the declarations made directly in its body.
    pub fn value_of(&self, name: &str, line: usize) -> Option<Value<'m>> {
        let tree = &self.model.tree;
        let frames = tree
            .ancestors(tree.innermost(line))
            .map(Some)
            .chain(std::iter::once(None));

        for frame in frames {
            if let Some(decl) = self.model.symbols.find_in(frame, name, line) {
                return Some(Value::Decl(decl));
            }
            let Some(id) = frame else {
                continue;
            };
            let header_line = tree.frame(id).header_line;
            if !tree.frame(id).kind.is_function() {
                continue;
            }
            let header = self
                .model
                .lexed(header_line)
                .and_then(FunctionHeader::parse);
            if let Some(param) = header.as_ref().and_then(|h| h.param(name)) {
                return Some(Value::Param {
                    param: param.clone(),
                    line: header_line,
                });
            }
        }
        None
    }

    fn identifier_type(&self, name: &str, line: usize, depth: usize) -> Type {
        match self.value_of(name, line) {
            Some(Value::Decl(decl)) => self.declaration_type(decl, depth),
            Some(Value::Param { param, line }) => self.param_type(&param, line, depth),
            None => Type::Any,
        }
    }

    pub fn param_type(&self, param: &Param, header_line: usize, depth: usize) -> Type {
        if let Some(annotation) = &param.annotation {
            return Type::parse(annotation);
        }
        match &param.default {
            Some(default) => {
                let tokens = lex_line(default).tokens;
                self.infer_tokens(&tokens, header_line, depth + 1)
            }
            None => Type::Any,
        }
    }

    /// Declared or inferred type of a declaration used as a value
    pub fn declaration_type(&self, decl: &Declaration, depth: usize) -> Type {
        match decl.kind {
            DeclKind::Function => return Type::Any,
            DeclKind::Variable => {}
            _ => return Type::named(decl.name.clone()),
        }

        if let Some(annotation) = &decl.annotation {
            return Type::parse(annotation);
        }

        let key = (decl.line, decl.column);
        if !self.active_decls.borrow_mut().insert(key) {
            return Type::Any;
        }

        let ty = match (&decl.binding, &decl.initializer) {
            (Binding::Loop { iterable }, _) => {
                self.infer_type_at(iterable, decl.line, depth).iteration_type()
            }
            (Binding::Catch, _) => Type::Any,
            (Binding::Declared, Some(init)) => self.infer_type_at(init, decl.line, depth),
            (Binding::Declared, None) => Type::Any,
        };

        self.active_decls.borrow_mut().remove(&key);
        ty
    }

    fn infer_type_at(&self, expr: &str, line: usize, depth: usize) -> Type {
        let tokens = lex_line(expr).tokens;
        self.infer_tokens(&tokens, line, depth + 1)
    }

    /// Annotated return type, else the inferred one
    pub fn function_return_type(&self, decl: &Declaration, depth: usize) -> Type {
        if let Some(annotation) = &decl.annotation {
            return Type::parse(annotation);
        }
        match decl.body {
            Some(frame) => self.infer_return_type(frame, depth),
            None => Type::Any,
        }
    }

    /// Union of the `return` expressions belonging to a function frame.
    ///
    /// Returns inside nested functions are skipped. No returns is `Void`,
    /// a bare `return` contributes `Void`, more than three distinct types is
    /// `Any`. Chains of calls deeper than the nesting limit are `Any`.
    pub fn infer_return_type(&self, function: FrameId, depth: usize) -> Type {
        if let Some(ty) = self.returns.borrow().get(&function) {
            return ty.clone();
        }
        if depth > MAX_DEPTH {
            return Type::Any;
        }
        if !self.active_returns.borrow_mut().insert(function) {
            return Type::Any;
        }

        let tree = &self.model.tree;
        let mut types = Vec::new();
        for line in tree.body_lines(function) {
            let Some(lexed) = self.model.lexed(line) else {
                break;
            };
            if !lexed.starts_with(Keyword::Return) || tree.enclosing_function(line) != Some(function)
            {
                continue;
            }
            let ty = if lexed.tokens.len() == 1 {
                Type::void()
            } else {
                self.infer_tokens(&lexed.tokens[1..], line, depth + 1)
            };
            types.push(ty);
        }

        self.active_returns.borrow_mut().remove(&function);
        let ty = Type::unify(types);
        self.returns.borrow_mut().insert(function, ty.clone());
        ty
    }

    /// Return type of `receiver.method(...)` for the receiver's inferred type
    pub fn infer_method_return_type(&self, receiver: &Type, method: &str, depth: usize) -> Type {
        if let Type::Union(members) = receiver {
            return Type::unify(
                members
                    .iter()
                    .map(|member| self.infer_method_return_type(member, method, depth)),
            );
        }

        if let Some((entry, function)) = self.catalog.method(receiver, method) {
            return function.return_type().substitute(&entry.bindings(receiver));
        }

        match self.user_member(receiver, method) {
            Some(decl) if decl.kind == DeclKind::Function => self.function_return_type(decl, depth),
            _ => Type::Any,
        }
    }

    /// Type of `receiver.member` without a call
    pub fn member_type(&self, receiver: &Type, member: &str, depth: usize) -> Type {
        if let Some((entry, function)) = self.catalog.method(receiver, member) {
            return function.return_type().substitute(&entry.bindings(receiver));
        }

        match self.user_member(receiver, member) {
            Some(decl) if decl.is_variable() => return self.declaration_type(decl, depth),
            Some(_) => return Type::Any,
            None => {}
        }

        self.assigned_field_type(receiver, member, depth)
            .unwrap_or(Type::Any)
    }

    /// Method or field declared in a user class body, following `extends`
    pub fn user_member(&self, receiver: &Type, member: &str) -> Option<&'m Declaration> {
        let mut class_name = receiver.name()?.to_string();
        for _ in 0..MAX_BASE_HOPS {
            let class = self.model.symbols.class_named(&class_name)?;
            let frame = class.body?;
            if let Some(decl) = self
                .model
                .symbols
                .members_of(frame)
                .find(|d| d.name == member)
            {
                return Some(decl);
            }
            class_name = self.base_class(class)?;
        }
        None
    }

    fn base_class(&self, class: &Declaration) -> Option<String> {
        let lexed = self.model.lexed(class.line)?;
        ClassHeader::parse(lexed)?.base
    }

    /// Type of a field only ever assigned as `this.field = expr` in the class body
    fn assigned_field_type(&self, receiver: &Type, field: &str, depth: usize) -> Option<Type> {
        let class = self.model.symbols.class_named(receiver.name()?)?;
        let frame = class.body?;
        for line in self.model.tree.body_lines(frame) {
            let tokens = &self.model.lexed(line)?.tokens;
            if let [this, dot, name, assign, value @ ..] = tokens.as_slice() {
                if this.is_keyword(Keyword::This)
                    && dot.is(TokenKind::Dot)
                    && name.text == field
                    && assign.is(TokenKind::Assign)
                {
                    return Some(self.infer_tokens(value, line, depth + 1));
                }
            }
        }
        None
    }

    /// `this` is the enclosing class
    pub fn this_type(&self, line: usize) -> Type {
        self.model
            .tree
            .enclosing_class(line)
            .and_then(|id| self.model.tree.frame(id).name.clone())
            .map(Type::Nominal)
            .unwrap_or(Type::Any)
    }

    /// Type of the receiver chain ending right before `tokens[dot]`
    pub fn receiver_type(&self, tokens: &[Token], dot: usize, line: usize) -> Type {
        let start = chain_start(tokens, dot);
        self.infer_tokens(&tokens[start..dot], line, 0)
    }
}

/// Start index of the postfix chain (`a.b(c)[d]`) that ends at `end` (exclusive)
pub fn chain_start(tokens: &[Token], end: usize) -> usize {
    let mut index = end.min(tokens.len());
    while index > 0 {
        let token = &tokens[index - 1];
        if token.kind.is_close() {
            match matching_open(tokens, index - 1) {
                Some(open) => index = open,
                None => break,
            }
        } else if token.is_ident()
            || token.is_keyword(Keyword::This)
            || matches!(
                token.kind,
                TokenKind::Dot | TokenKind::Str | TokenKind::Int | TokenKind::Float
            )
        {
            index -= 1;
        } else {
            break;
        }
    }
    index
}

fn member_name(token: &Token) -> Option<&str> {
    match token.kind {
        TokenKind::Ident | TokenKind::Keyword(_) => Some(token.text.as_str()),
        _ => None,
    }
}

/// A `+`/`-` with no left operand
fn is_unary(tokens: &[Token], index: usize) -> bool {
    if !matches!(tokens[index].kind, TokenKind::Minus | TokenKind::Plus) {
        return false;
    }
    match index.checked_sub(1).map(|i| tokens[i].kind) {
        None => true,
        Some(prev) => {
            prev.is_arithmetic()
                || prev.is_open()
                || prev.is_comparison()
                || prev.is_logical()
                || matches!(
                    prev,
                    TokenKind::Comma
                        | TokenKind::Assign
                        | TokenKind::CompoundAssign
                        | TokenKind::Colon
                        | TokenKind::Keyword(_)
                )
        }
    }
}

pub fn is_capitalized(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn infer_in(src: &str, expr: &str, line: usize) -> Type {
        let doc = Document::new(src);
        let model = SourceModel::build(&doc);
        let catalog = Catalog::builtin();
        let inference = TypeInference::new(&model, &catalog);
        inference.infer_type(expr, line)
    }

    fn infer(expr: &str) -> Type {
        infer_in("", expr, 0)
    }

    #[test]
    fn test_literals() {
        assert_eq!(infer("\"hi\""), Type::string());
        assert_eq!(infer("42"), Type::int());
        assert_eq!(infer("4.2"), Type::float());
        assert_eq!(infer("true"), Type::bool());
        assert_eq!(infer("nil"), Type::Any);
        assert_eq!(infer("-3"), Type::int());
        assert_eq!(infer("{\"a\": 1}"), Type::map(Type::Any, Type::Any));
    }

    #[test]
    fn test_arrays() {
        assert_eq!(infer("[1, 2, 3]"), Type::array(Type::int()));
        assert_eq!(infer("[1, \"a\"]"), Type::array(Type::Any));
        assert_eq!(infer("[]"), Type::array(Type::Any));
        assert_eq!(infer("[1, 2][0]"), Type::int());
    }

    #[test]
    fn test_operators() {
        assert_eq!(infer("1 + 2 * 3"), Type::int());
        assert_eq!(infer("1 + 2.5"), Type::float());
        assert_eq!(infer("\"n = \" + 1"), Type::string());
        assert_eq!(infer("a + 1 > 2"), Type::bool());
        assert_eq!(infer("!done"), Type::bool());
        assert_eq!(infer("x && y"), Type::bool());
        assert_eq!(infer("(1 + 2)"), Type::int());
        assert_eq!(infer("unknown * 2"), Type::Any);
        assert_eq!(infer("1...10"), Type::array(Type::int()));
    }

    #[test]
    fn test_calls() {
        assert_eq!(infer("Point(1, 2)"), Type::named("Point"));
        assert_eq!(infer("Array()"), Type::array(Type::Any));
        assert_eq!(infer("len(items)"), Type::int());
        assert_eq!(infer("math.sqrt(2.0)"), Type::float());
        assert_eq!(infer("math.PI"), Type::float());
        assert_eq!(infer("mystery()"), Type::Any);
    }

    #[test]
    fn test_variables_and_members() {
        let src = "\
var names: Array<String> = []
var ages = {}
var count = 3
var ratio = count * 1.5
var first = names.pop()
var table: Map<String, Int> = {}";
        assert_eq!(infer_in(src, "count", 5), Type::int());
        assert_eq!(infer_in(src, "ratio", 5), Type::float());
        assert_eq!(infer_in(src, "first", 5), Type::string());
        assert_eq!(infer_in(src, "names.length()", 5), Type::int());
        assert_eq!(infer_in(src, "table.get(\"a\")", 5), Type::int());
        assert_eq!(infer_in(src, "table.keys()", 5), Type::array(Type::string()));
        assert_eq!(infer_in(src, "names[0].upper()", 5), Type::string());
        assert_eq!(infer_in(src, "count + 1", 5), Type::int());
    }

    #[test]
    fn test_return_inference() {
        let src = "\
func nothing():
    print(1)
end
func one():
    return 1
end
func either(flag: Bool):
    if flag:
        return 1
    end
    return \"a\"
end
func nested() -> Int:
    func inner():
        return \"s\"
    end
    return 1
end
func loops():
    return loops()
end";
        assert_eq!(infer_in(src, "nothing()", 21), Type::void());
        assert_eq!(infer_in(src, "one()", 21), Type::int());
        assert_eq!(
            infer_in(src, "either(true)", 21),
            Type::Union(vec![Type::int(), Type::string()])
        );
        assert_eq!(infer_in(src, "nested()", 21), Type::int());
        assert_eq!(infer_in(src, "loops()", 21), Type::Any);
    }

    #[test]
    fn test_params_and_this() {
        let src = "\
class Counter:
    var step: Int = 1
    init(start: Int):
        this.value = start
    end
    func next(by = 2.0):
        return by
    end
    func twice():
        return this.step * 2
    end
end
var c = Counter(1)";
        assert_eq!(infer_in(src, "start", 3), Type::int());
        assert_eq!(infer_in(src, "this", 3), Type::named("Counter"));
        assert_eq!(infer_in(src, "c.next()", 12), Type::float());
        assert_eq!(infer_in(src, "c.twice()", 12), Type::int());
        assert_eq!(infer_in(src, "c.step", 12), Type::int());
        assert_eq!(infer_in(src, "c.value", 12), Type::int());
    }

    #[test]
    fn test_loop_variable() {
        let src = "var xs = [1, 2]\nfor x in xs:\n    print(x)\nend\nfor i in 0...3:\n    print(i)\nend";
        assert_eq!(infer_in(src, "x", 2), Type::int());
        assert_eq!(infer_in(src, "i", 5), Type::int());
    }

    #[test]
    fn test_self_referential_variable() {
        assert_eq!(infer_in("var a = a + 1", "a", 0), Type::Any);
    }

    #[test]
    fn test_chain_start() {
        let tokens = lex_line("x = items.get(0).name.").tokens;
        let dot = tokens.len() - 1;
        let start = chain_start(&tokens, dot);
        assert_eq!(tokens[start].text, "items");
    }
}
