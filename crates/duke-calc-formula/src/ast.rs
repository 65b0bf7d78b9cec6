//! Formula Abstract Syntax Tree types

use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),

    // === References ===
    /// Cell reference text as lexed, e.g. `A1` or the range `A1:B3`
    CellRef(String),

    // === Operators ===
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<AstNode>,
    },
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    // === Function call ===
    FunctionCall { name: String, args: Vec<AstNode> },
}

impl AstNode {
    /// Build a binary node
    pub fn binary(op: BinaryOperator, left: AstNode, right: AstNode) -> Self {
        AstNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Build a unary node
    pub fn unary(op: UnaryOperator, operand: AstNode) -> Self {
        AstNode::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Direct children, left to right
    pub fn children(&self) -> Vec<&AstNode> {
        match self {
            AstNode::Number(_) | AstNode::String(_) | AstNode::CellRef(_) => Vec::new(),
            AstNode::UnaryOp { operand, .. } => vec![operand.as_ref()],
            AstNode::BinaryOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            AstNode::FunctionCall { args, .. } => args.iter().collect(),
        }
    }

    /// Height of the tree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(AstNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Every cell reference in the tree, in source order
    pub fn cell_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let AstNode::CellRef(text) = self {
            out.push(text);
        }
        for child in self.children() {
            child.collect_refs(out);
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    /// Floating-point remainder (`%`)
    Remainder,
    Power,
}

impl BinaryOperator {
    /// Map an operator token's text to an operator
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinaryOperator::Add),
            "-" => Some(BinaryOperator::Subtract),
            "*" => Some(BinaryOperator::Multiply),
            "/" => Some(BinaryOperator::Divide),
            "%" => Some(BinaryOperator::Remainder),
            "^" => Some(BinaryOperator::Power),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::Power => "^",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
}

impl fmt::Display for AstNode {
    /// Fully parenthesized form, handy for checking precedence
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Number(n) => write!(f, "{}", n),
            AstNode::String(s) => write!(f, "\"{}\"", s),
            AstNode::CellRef(r) => write!(f, "{}", r),
            AstNode::UnaryOp {
                op: UnaryOperator::Negate,
                operand,
            } => write!(f, "(-{})", operand),
            AstNode::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            AstNode::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
