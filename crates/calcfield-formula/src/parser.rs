//! Expression parser
//!
//! A recursive descent parser for rewritten (field-free) formula expressions
//! with C-style operator precedence.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{self, sugar::SugarFunction};

/// Maximum nesting of parentheses, calls, ternaries and unary operators
pub const MAX_NESTING_DEPTH: usize = 100;

/// Maximum number of tokens in one expression
pub const MAX_TOKENS: usize = 10_000;

/// Parse a rewritten expression into an AST
///
/// Expressions nested deeper than [`MAX_NESTING_DEPTH`] or longer than
/// [`MAX_TOKENS`] tokens are rejected instead of parsed.
///
/// # Example
/// ```rust
/// use calcfield_formula::parse_expression;
///
/// let ast = parse_expression("1 + 2 * 3").unwrap();
/// let ast = parse_expression("IF(2 > 1, SQRT(16), 0)").unwrap();
/// let ast = parse_expression("MOD(10, 3) == 1 ? 1 : 0").unwrap();
/// ```
pub fn parse_expression(input: &str) -> FormulaResult<Expr> {
    let mut parser = ExprParser::new(input)?;
    let expr = parser.parse_conditional()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),

    // Function names and constants
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqualEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Question,
    Colon,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

/// Expression parser
struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    tokens: usize,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            tokens: 0,
            depth: 0,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.tokens += 1;
        if self.tokens > MAX_TOKENS {
            return Err(FormulaError::MaxTokensExceeded(MAX_TOKENS));
        }
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '?' => Some(Token::Question),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Two-character operators
        if c == '<' || c == '>' {
            self.advance();
            let or_equal = self.peek_char() == Some('=');
            if or_equal {
                self.advance();
            }
            return Ok(match (c, or_equal) {
                ('<', false) => Token::LessThan,
                ('<', true) => Token::LessEqual,
                ('>', false) => Token::GreaterThan,
                _ => Token::GreaterEqual,
            });
        }

        if c == '=' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::EqualEqual);
            }
            return Err(FormulaError::Parse(format!(
                "Unexpected '=' at position {}, use '==' for comparison",
                self.pos
            )));
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier
        if c.is_ascii_alphabetic() || c == '_' {
            let start = self.pos;
            while self
                .peek_char()
                .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
            {
                self.advance();
            }
            return Ok(Token::Identifier(self.input[start..self.pos].to_string()));
        }

        Err(FormulaError::Parse(format!(
            "Unexpected character '{}' at position {}",
            c, self.pos
        )))
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let sign = self.peek_char_at(1).map_or(false, |c| c == '+' || c == '-');
            let digit_at = if sign { 2 } else { 1 };
            if self
                .peek_char_at(digit_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..digit_at {
                    self.advance();
                }
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", num_str)))
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> FormulaResult<T>) -> FormulaResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(FormulaError::MaxDepthExceeded(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Conditional: ? : (right associative)
    // 2. Equality: ==
    // 3. Relational: <, <=, >, >=
    // 4. Additive: +, -
    // 5. Multiplicative: *, /, %
    // 6. Unary: -, +
    // 7. Primary: numbers, function calls, constants, parentheses

    fn parse_conditional(&mut self) -> FormulaResult<Expr> {
        self.nested(Self::parse_conditional_level)
    }

    fn parse_conditional_level(&mut self) -> FormulaResult<Expr> {
        let condition = self.parse_equality()?;

        if matches!(self.current_token(), Token::Question) {
            self.consume()?;
            let then_branch = self.parse_conditional()?;
            self.expect(&Token::Colon)?;
            let else_branch = self.parse_conditional()?;
            return Ok(Expr::conditional(condition, then_branch, else_branch));
        }

        Ok(condition)
    }

    fn parse_equality(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_relational()?;

        while matches!(self.current_token(), Token::EqualEqual) {
            self.consume()?;
            let right = self.parse_relational()?;
            left = Expr::binary(BinaryOperator::Equal, left, right);
        }

        Ok(left)
    }

    fn parse_relational(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token() {
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_additive()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_primary(),
        };

        self.consume()?;
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume()?;
                Ok(Expr::Number(n))
            }

            Token::LeftParen => {
                self.consume()?;
                let expr = self.parse_conditional()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Identifier(name) => {
                self.consume()?;
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Self::parse_constant(name)
                }
            }

            token => Err(FormulaError::Parse(format!("Unexpected token: {:?}", token))),
        }
    }

    fn parse_constant(name: String) -> FormulaResult<Expr> {
        match functions::lookup(&name) {
            Some(def) if def.is_constant() => Ok(Expr::Function {
                name: def.name.to_string(),
                args: Vec::new(),
            }),
            _ => Err(FormulaError::UnknownFunction(name)),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<Expr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_conditional()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume()?;
                args.push(self.parse_conditional()?);
            }
        }

        self.expect(&Token::RightParen)?;

        if let Some(sugar) = SugarFunction::from_name(&name) {
            return Self::build_sugar_call(sugar, args);
        }

        let def = functions::lookup(&name).ok_or(FormulaError::UnknownFunction(name))?;
        if !def.accepts(args.len()) {
            return Err(FormulaError::ArgumentCount {
                function: def.name.to_string(),
                expected: def.arity_description(),
                actual: args.len(),
            });
        }

        Ok(Expr::Function {
            name: def.name.to_string(),
            args,
        })
    }

    fn build_sugar_call(sugar: SugarFunction, args: Vec<Expr>) -> FormulaResult<Expr> {
        if args.len() != sugar.arity() {
            return Err(FormulaError::ArgumentCount {
                function: sugar.name().to_string(),
                expected: sugar.arity().to_string(),
                actual: args.len(),
            });
        }

        let mut args = args.into_iter();
        let mut next = || args.next().unwrap_or(Expr::Number(0.0));
        Ok(match sugar {
            SugarFunction::Mod => {
                let left = next();
                let right = next();
                Expr::binary(BinaryOperator::Modulo, left, right)
            }
            SugarFunction::If => {
                let condition = next();
                let then_branch = next();
                let else_branch = next();
                Expr::conditional(condition, then_branch, else_branch)
            }
            SugarFunction::Sign | SugarFunction::Degrees | SugarFunction::Radians => {
                Expr::Function {
                    name: sugar.name().to_string(),
                    args: vec![next()],
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_expression("42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse_expression("3.14").unwrap(), Expr::Number(3.14));
        assert_eq!(parse_expression("1e3").unwrap(), Expr::Number(1000.0));
        assert_eq!(parse_expression(".5").unwrap(), Expr::Number(0.5));
        assert_eq!(parse_expression("2.5E-1").unwrap(), Expr::Number(0.25));
    }

    #[test]
    fn test_parse_precedence() {
        let ast = parse_expression("1+2*3").unwrap();
        // Should parse as 1+(2*3) due to precedence
        if let Expr::BinaryOp { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Add);
            assert_eq!(*left, Expr::Number(1.0));
            assert!(matches!(
                *right,
                Expr::BinaryOp {
                    op: BinaryOperator::Multiply,
                    ..
                }
            ));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_comparison_below_arithmetic() {
        let ast = parse_expression("1 + 1 == 2").unwrap();
        assert!(matches!(
            ast,
            Expr::BinaryOp {
                op: BinaryOperator::Equal,
                ..
            }
        ));

        let ast = parse_expression("3 <= 4").unwrap();
        assert!(matches!(
            ast,
            Expr::BinaryOp {
                op: BinaryOperator::LessEqual,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_ternary_right_associative() {
        let ast = parse_expression("1 ? 2 : 0 ? 3 : 4").unwrap();
        if let Expr::Conditional { else_branch, .. } = ast {
            assert!(matches!(*else_branch, Expr::Conditional { .. }));
        } else {
            panic!("Expected Conditional");
        }
    }

    #[test]
    fn test_parse_unary() {
        let ast = parse_expression("--5").unwrap();
        if let Expr::UnaryOp { op, operand } = ast {
            assert_eq!(op, UnaryOperator::Negate);
            assert!(matches!(*operand, Expr::UnaryOp { .. }));
        } else {
            panic!("Expected UnaryOp");
        }
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_expression("max(1, 2, 3)").unwrap();
        if let Expr::Function { name, args } = ast {
            assert_eq!(name, "MAX");
            assert_eq!(args.len(), 3);
        } else {
            panic!("Expected Function");
        }
    }

    #[test]
    fn test_parse_constants() {
        let bare = parse_expression("PI").unwrap();
        let called = parse_expression("pi()").unwrap();
        assert_eq!(bare, called);
        assert!(matches!(
            parse_expression("RANDOM"),
            Err(FormulaError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_parse_sugar() {
        let ast = parse_expression("MOD(7, 3)").unwrap();
        assert_eq!(
            ast,
            Expr::binary(BinaryOperator::Modulo, Expr::Number(7.0), Expr::Number(3.0))
        );

        let ast = parse_expression("IF(1, 2, 3)").unwrap();
        assert!(matches!(ast, Expr::Conditional { .. }));

        let ast = parse_expression("sign(-2)").unwrap();
        assert!(matches!(ast, Expr::Function { ref name, .. } if name == "SIGN"));
    }

    #[test]
    fn test_parse_nested_sugar() {
        let ast = parse_expression("IF(IF(1, 0, 1), MOD(MOD(9, 5), 3), 2)").unwrap();
        if let Expr::Conditional {
            condition,
            then_branch,
            ..
        } = ast
        {
            assert!(matches!(*condition, Expr::Conditional { .. }));
            assert!(matches!(
                *then_branch,
                Expr::BinaryOp {
                    op: BinaryOperator::Modulo,
                    ..
                }
            ));
        } else {
            panic!("Expected Conditional");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_expression("FOO(1)"),
            Err(FormulaError::UnknownFunction(name)) if name == "FOO"
        ));
        assert!(matches!(
            parse_expression("POW(2)"),
            Err(FormulaError::ArgumentCount { actual: 1, .. })
        ));
        assert!(matches!(
            parse_expression("IF(1, 2)"),
            Err(FormulaError::ArgumentCount { .. })
        ));
        assert!(matches!(parse_expression("1 = 1"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_expression("(1 + 2"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_expression("1 2"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_expression(""), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_expression("1 ? 2"), Err(FormulaError::Parse(_))));
    }

    #[test]
    fn test_parse_nesting_limit() {
        let nested = |levels: usize| format!("{}1{}", "(".repeat(levels), ")".repeat(levels));

        assert_eq!(parse_expression(&nested(MAX_NESTING_DEPTH - 1)).unwrap(), Expr::Number(1.0));
        assert_eq!(
            parse_expression(&nested(MAX_NESTING_DEPTH)),
            Err(FormulaError::MaxDepthExceeded(MAX_NESTING_DEPTH))
        );
        assert_eq!(
            parse_expression(&nested(100_000)),
            Err(FormulaError::MaxDepthExceeded(MAX_NESTING_DEPTH))
        );
        assert_eq!(
            parse_expression(&format!("{}1", "-".repeat(5_000))),
            Err(FormulaError::MaxDepthExceeded(MAX_NESTING_DEPTH))
        );
        assert_eq!(
            parse_expression(&format!("{}1{}", "ABS(".repeat(500), ")".repeat(500))),
            Err(FormulaError::MaxDepthExceeded(MAX_NESTING_DEPTH))
        );
    }

    #[test]
    fn test_parse_token_limit() {
        let long = vec!["1"; MAX_TOKENS].join("+");
        assert_eq!(
            parse_expression(&long),
            Err(FormulaError::MaxTokensExceeded(MAX_TOKENS))
        );
    }
}
