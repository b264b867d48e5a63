//! Closed expression model for declaration initializers.
//!
//! The reference extractor works over this small sum type instead of the
//! full `syn` AST: it keeps exactly the shapes that matter for discovering
//! cross-declaration references and collapses everything else into
//! [`Expr::Opaque`] while retaining children, so traversal keeps recall
//! without coupling the graph stages to the host-language parser.

use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Token, UnOp};

/// Line and column of a lowered node, 1-based like rustc diagnostics.
///
/// Only the node kinds that can turn into dependency edges carry one, so
/// undefined-reference errors point at the reference itself rather than at
/// the owning declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprSpan {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl From<proc_macro2::Span> for ExprSpan {
    fn from(span: proc_macro2::Span) -> Self {
        let start = span.start();
        Self {
            line: start.line,
            column: start.column + 1,
        }
    }
}

/// One node of a lowered initializer expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Scalar literal (string, number, char). Booleans also land here.
    Lit(String),
    /// Function call by path: `data_bucket()`, `sub("...")`, `s3::bucket()`.
    Call {
        /// Path segments of the callee.
        path: Vec<String>,
        /// Lowered arguments.
        args: Vec<Expr>,
        /// Source position of the callee.
        span: ExprSpan,
    },
    /// Struct-like literal with named fields.
    Composite {
        /// Path segments of the struct type.
        type_path: Vec<String>,
        /// Field name and lowered value, in source order.
        fields: Vec<(String, Expr)>,
    },
    /// Array, `vec![...]`, or tuple literal.
    Sequence(Vec<Expr>),
    /// Indexing; only the base matters for reference discovery.
    Index(Box<Expr>),
    /// Transparent wrappers: parens, references, casts, `?`, unary ops.
    Wrapper(Box<Expr>),
    /// Name access by path: `Foo`, `s3::BUCKET_CLASS`.
    Name {
        /// Path segments of the name.
        path: Vec<String>,
        /// Source position of the name.
        span: ExprSpan,
    },
    /// Method or field access on a base expression: `execution_role().arn()`.
    Access {
        /// The receiver expression.
        base: Box<Expr>,
        /// Method or field name.
        attr: String,
        /// Method arguments (empty for field access).
        args: Vec<Expr>,
    },
    /// Any other shape; children are retained so traversal keeps recall.
    Opaque(Vec<Expr>),
}

impl Expr {
    /// Whether this node is a call to a bare (single-segment) name.
    #[must_use]
    pub fn as_bare_call(&self) -> Option<&str> {
        match self {
            Self::Call {
                path,
                ..
            } if path.len() == 1 => Some(&path[0]),
            _ => None,
        }
    }

    /// Source position, for the node kinds that carry one.
    #[must_use]
    pub const fn span(&self) -> Option<ExprSpan> {
        match self {
            Self::Call {
                span, ..
            }
            | Self::Name {
                span, ..
            } => Some(*span),
            _ => None,
        }
    }
}

fn path_segments(path: &syn::Path) -> Vec<String> {
    path.segments.iter().map(|s| s.ident.to_string()).collect()
}

/// Lower a `syn` expression into the closed model.
pub fn lower(expr: &syn::Expr) -> Expr {
    match expr {
        syn::Expr::Lit(lit) => Expr::Lit(lit_to_string(&lit.lit)),

        syn::Expr::Call(call) => match &*call.func {
            syn::Expr::Path(func) => Expr::Call {
                path: path_segments(&func.path),
                args: call.args.iter().map(lower).collect(),
                span: func.path.span().into(),
            },
            other => Expr::Opaque(
                std::iter::once(lower(other)).chain(call.args.iter().map(lower)).collect(),
            ),
        },

        syn::Expr::Struct(composite) => Expr::Composite {
            type_path: path_segments(&composite.path),
            fields: composite
                .fields
                .iter()
                .map(|field| (member_name(&field.member), lower(&field.expr)))
                .collect(),
        },

        syn::Expr::Array(array) => Expr::Sequence(array.elems.iter().map(lower).collect()),
        syn::Expr::Tuple(tuple) => Expr::Sequence(tuple.elems.iter().map(lower).collect()),

        syn::Expr::Macro(mac) => lower_macro(&mac.mac),

        syn::Expr::Index(index) => Expr::Index(Box::new(lower(&index.expr))),

        syn::Expr::Paren(inner) => Expr::Wrapper(Box::new(lower(&inner.expr))),
        syn::Expr::Group(inner) => Expr::Wrapper(Box::new(lower(&inner.expr))),
        syn::Expr::Reference(inner) => Expr::Wrapper(Box::new(lower(&inner.expr))),
        syn::Expr::Cast(inner) => Expr::Wrapper(Box::new(lower(&inner.expr))),
        syn::Expr::Try(inner) => Expr::Wrapper(Box::new(lower(&inner.expr))),
        syn::Expr::Unary(unary) => match unary.op {
            UnOp::Deref(_) | UnOp::Neg(_) | UnOp::Not(_) => {
                Expr::Wrapper(Box::new(lower(&unary.expr)))
            }
            _ => Expr::Opaque(vec![lower(&unary.expr)]),
        },

        syn::Expr::Path(path) => Expr::Name {
            path: path_segments(&path.path),
            span: path.path.span().into(),
        },

        syn::Expr::Field(field) => Expr::Access {
            base: Box::new(lower(&field.base)),
            attr: member_name(&field.member),
            args: Vec::new(),
        },

        syn::Expr::MethodCall(call) => Expr::Access {
            base: Box::new(lower(&call.receiver)),
            attr: call.method.to_string(),
            args: call.args.iter().map(lower).collect(),
        },

        // Everything else keeps its children for recall but loses shape.
        syn::Expr::Binary(binary) => Expr::Opaque(vec![lower(&binary.left), lower(&binary.right)]),
        syn::Expr::Block(block) => Expr::Opaque(lower_stmts(&block.block.stmts)),
        syn::Expr::If(if_expr) => {
            let mut children = lower_stmts(&if_expr.then_branch.stmts);
            children.insert(0, lower(&if_expr.cond));
            if let Some((_, else_branch)) = &if_expr.else_branch {
                children.push(lower(else_branch));
            }
            Expr::Opaque(children)
        }
        syn::Expr::Match(match_expr) => {
            let mut children = vec![lower(&match_expr.expr)];
            children.extend(match_expr.arms.iter().map(|arm| lower(&arm.body)));
            Expr::Opaque(children)
        }
        syn::Expr::Range(range) => Expr::Opaque(
            range
                .start
                .iter()
                .chain(range.end.iter())
                .map(|e| lower(e))
                .collect(),
        ),
        _ => Expr::Opaque(Vec::new()),
    }
}

/// Lower a function body.
///
/// Returns the lowered trailing expression (the initializer proper) plus any
/// other expressions found in preceding statements, which the extractor
/// scans without field-path tracking.
pub fn lower_body(block: &syn::Block) -> (Expr, Vec<Expr>) {
    let mut support = Vec::new();
    let mut trailing = None;

    for stmt in &block.stmts {
        match stmt {
            syn::Stmt::Expr(expr, None) => trailing = Some(lower(expr)),
            syn::Stmt::Expr(expr, Some(_)) => support.push(lower(expr)),
            syn::Stmt::Local(local) => {
                if let Some(init) = &local.init {
                    support.push(lower(&init.expr));
                }
            }
            syn::Stmt::Item(_) | syn::Stmt::Macro(_) => {}
        }
    }

    (trailing.unwrap_or(Expr::Opaque(Vec::new())), support)
}

fn lower_stmts(stmts: &[syn::Stmt]) -> Vec<Expr> {
    let mut out = Vec::new();
    for stmt in stmts {
        match stmt {
            syn::Stmt::Expr(expr, _) => out.push(lower(expr)),
            syn::Stmt::Local(local) => {
                if let Some(init) = &local.init {
                    out.push(lower(&init.expr));
                }
            }
            syn::Stmt::Item(_) | syn::Stmt::Macro(_) => {}
        }
    }
    out
}

/// `vec![a, b]` lowers to a sequence so element positions keep their field
/// paths; other macros become opaque (their tokens are not expression trees
/// we can interpret without expansion).
fn lower_macro(mac: &syn::Macro) -> Expr {
    let is_vec = mac.path.segments.last().is_some_and(|s| s.ident == "vec");
    if is_vec {
        if let Ok(elems) =
            mac.parse_body_with(Punctuated::<syn::Expr, Token![,]>::parse_terminated)
        {
            return Expr::Sequence(elems.iter().map(lower).collect());
        }
    }
    Expr::Opaque(Vec::new())
}

fn member_name(member: &syn::Member) -> String {
    match member {
        syn::Member::Named(ident) => ident.to_string(),
        syn::Member::Unnamed(index) => index.index.to_string(),
    }
}

fn lit_to_string(lit: &syn::Lit) -> String {
    match lit {
        syn::Lit::Str(s) => s.value(),
        syn::Lit::Int(i) => i.base10_digits().to_string(),
        syn::Lit::Float(f) => f.base10_digits().to_string(),
        syn::Lit::Bool(b) => b.value.to_string(),
        syn::Lit::Char(c) => c.value().to_string(),
        other => quote::quote!(#other).to_string(),
    }
}
