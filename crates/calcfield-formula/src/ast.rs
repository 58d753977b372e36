//! Expression syntax tree

use std::fmt;

/// Parsed arithmetic expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    /// `cond ? a : b` or `IF(cond, a, b)`; only the selected branch is evaluated
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Call of a library function (name is uppercase)
    Function { name: String, args: Vec<Expr> },
}

impl Expr {
    pub(crate) fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub(crate) fn conditional(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// Depth of the tree (a lone number has depth 1)
    ///
    /// Walks with an explicit stack so arbitrarily deep trees are safe to measure.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(&Expr, usize)> = vec![(self, 1)];
        while let Some((expr, depth)) = stack.pop() {
            max = max.max(depth);
            match expr {
                Expr::Number(_) => {}
                Expr::BinaryOp { left, right, .. } => {
                    stack.push((&**left, depth + 1));
                    stack.push((&**right, depth + 1));
                }
                Expr::UnaryOp { operand, .. } => stack.push((&**operand, depth + 1)),
                Expr::Conditional {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    stack.push((&**condition, depth + 1));
                    stack.push((&**then_branch, depth + 1));
                    stack.push((&**else_branch, depth + 1));
                }
                Expr::Function { args, .. } => stack.extend(args.iter().map(|a| (a, depth + 1))),
            }
        }
        max
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // Comparison (yield 1 or 0)
    Equal,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    /// Source symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) if *n < 0.0 => write!(f, "({})", n),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand,
            } => write!(f, "-{}", operand),
            Expr::UnaryOp {
                op: UnaryOperator::Plus,
                operand,
            } => write!(f, "+{}", operand),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", condition, then_branch, else_branch),
            Expr::Function { name, args } => {
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
