//! Type system representation

use std::fmt;

use crate::lexer::{lex_line, split_type_level};
use crate::token::{Token, TokenKind};

/// Most members a union keeps before it collapses to `Any`
pub const MAX_UNION_MEMBERS: usize = 3;

/// Semantic type of an expression or declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// A named type (`Int`, `String`, `Shape`)
    Nominal(String),
    /// A named type with ordered type arguments (`Array<Int>`)
    Generic { name: String, args: Vec<Type> },
    /// Flat, de-duplicated union of two or three members
    Union(Vec<Type>),
    /// Unknown; compatible with everything
    Any,
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        Type::Nominal(name.into())
    }

    pub fn int() -> Self {
        Type::named("Int")
    }

    pub fn float() -> Self {
        Type::named("Float")
    }

    pub fn string() -> Self {
        Type::named("String")
    }

    pub fn bool() -> Self {
        Type::named("Bool")
    }

    pub fn void() -> Self {
        Type::named("Void")
    }

    pub fn array(element: Type) -> Self {
        Type::Generic {
            name: "Array".to_string(),
            args: vec![element],
        }
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Generic {
            name: "Map".to_string(),
            args: vec![key, value],
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    /// Name of a nominal or generic type
    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Nominal(name) | Type::Generic { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Type] {
        match self {
            Type::Generic { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_named(&self, expected: &str) -> bool {
        self.name() == Some(expected)
    }

    /// `Float` or `Double`
    pub fn is_floating(&self) -> bool {
        self.is_named("Float") || self.is_named("Double")
    }

    /// Combine types into one: unions are flattened and de-duplicated, `Any`
    /// absorbs everything, and more than three members collapse to `Any`.
    /// An empty input is `Void`.
    pub fn unify(types: impl IntoIterator<Item = Type>) -> Type {
        let mut members: Vec<Type> = Vec::new();
        for ty in types {
            let flat = match ty {
                Type::Union(inner) => inner,
                Type::Any => return Type::Any,
                other => vec![other],
            };
            for member in flat {
                if member.is_any() {
                    return Type::Any;
                }
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }

        match members.len() {
            0 => Type::void(),
            1 => members.remove(0),
            n if n <= MAX_UNION_MEMBERS => Type::Union(members),
            _ => Type::Any,
        }
    }

    /// Check if a value of this type can be stored where `target` is expected
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        if self.is_any() || target.is_any() {
            return true;
        }

        match (self, target) {
            (a, b) if a == b => true,

            (Type::Nominal(source), Type::Nominal(_)) if source == "Int" => target.is_floating(),

            (Type::Union(members), _) => members.iter().all(|m| m.is_assignable_to(target)),
            (_, Type::Union(members)) => members.iter().any(|m| self.is_assignable_to(m)),

            (
                Type::Generic { name: a, args: xs },
                Type::Generic { name: b, args: ys },
            ) => {
                a == b
                    && xs.len() == ys.len()
                    && xs.iter().zip(ys.iter()).all(|(x, y)| x.is_assignable_to(y))
            }

            // a bare `Array` annotation accepts any `Array<T>`
            (Type::Generic { name: a, .. }, Type::Nominal(b))
            | (Type::Nominal(a), Type::Generic { name: b, .. }) => a == b,

            _ => false,
        }
    }

    /// Replace type parameters (`T`, `K`, `V`) by their bindings
    pub fn substitute(&self, bindings: &[(String, Type)]) -> Type {
        match self {
            Type::Nominal(name) => bindings
                .iter()
                .find(|(param, _)| param == name)
                .map(|(_, bound)| bound.clone())
                .unwrap_or_else(|| self.clone()),
            Type::Generic { name, args } => Type::Generic {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            Type::Union(members) => Type::unify(members.iter().map(|m| m.substitute(bindings))),
            Type::Any => Type::Any,
        }
    }

    /// Type produced by indexing: `Array<T>` gives `T`, `Map<K, V>` gives `V`
    pub fn element_type(&self) -> Type {
        match self {
            Type::Generic { name, args } if name == "Array" => {
                args.first().cloned().unwrap_or(Type::Any)
            }
            Type::Generic { name, args } if name == "Map" => {
                args.get(1).cloned().unwrap_or(Type::Any)
            }
            Type::Nominal(name) if name == "String" => Type::string(),
            _ => Type::Any,
        }
    }

    /// Type bound by `for x in <self>`: map iteration yields keys
    pub fn iteration_type(&self) -> Type {
        match self {
            Type::Generic { name, args } if name == "Map" => {
                args.first().cloned().unwrap_or(Type::Any)
            }
            _ => self.element_type(),
        }
    }

    /// Parse a written type annotation. Malformed text yields `Any`.
    pub fn parse(text: &str) -> Type {
        let tokens = lex_line(text).tokens;
        parse_tokens(&tokens).unwrap_or(Type::Any)
    }

    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

fn parse_tokens(tokens: &[Token]) -> Option<Type> {
    if tokens.is_empty() {
        return None;
    }

    let alternatives = split_type_level(tokens, TokenKind::Pipe);
    if alternatives.len() > 1 {
        let members = alternatives
            .into_iter()
            .map(parse_tokens)
            .collect::<Option<Vec<_>>>()?;
        return Some(Type::unify(members));
    }

    let (name, rest) = tokens.split_first()?;
    let name = name.ident()?;
    if rest.is_empty() {
        return Some(if name == "Any" {
            Type::Any
        } else {
            Type::named(name)
        });
    }

    let (open, inner) = rest.split_first()?;
    let (close, inner) = inner.split_last()?;
    if !open.is(TokenKind::Less) || !close.is(TokenKind::Greater) || inner.is_empty() {
        return None;
    }
    let args = split_type_level(inner, TokenKind::Comma)
        .into_iter()
        .map(parse_tokens)
        .collect::<Option<Vec<_>>>()?;
    Some(Type::Generic {
        name: name.to_string(),
        args,
    })
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Nominal(name) => write!(f, "{}", name),
            Type::Generic { name, args } => {
                let args = args.iter().map(Type::to_string).collect::<Vec<_>>();
                write!(f, "{}<{}>", name, args.join(", "))
            }
            Type::Union(members) => {
                let members = members.iter().map(Type::to_string).collect::<Vec<_>>();
                write!(f, "{}", members.join(" | "))
            }
            Type::Any => write!(f, "Any"),
        }
    }
}
