use crate::token::Token;

/// Stable identity for the expression nodes the resolver tracks.
///
/// Two textually identical expressions at different source locations get
/// distinct ids; the interpreter's depth side table is keyed by this.
pub type ExprId = usize;

#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal leaf; the token carries the interpreted value
    /// (`NUMBER`/`STRING` payloads, or the `TRUE`/`FALSE`/`NIL` kinds).
    Literal(Token),

    Grouping(Box<Expr>),

    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `and` / `or`; kept apart from `Binary` because evaluation
    /// short-circuits and returns the operand value itself.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// Closing parenthesis; supplies the line for call-site errors.
        paren: Token,
        arguments: Vec<Expr>,
    },

    Get {
        object: Box<Expr>,
        name: Token,
    },

    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}
