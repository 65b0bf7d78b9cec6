//! Formula parser
//!
//! A recursive descent parser over the lexer's token stream with operator
//! precedence. Precedence (lowest to highest):
//! 1. Addition/Subtraction: +, - (left associative)
//! 2. Multiplication/Division/Remainder: *, /, % (left associative)
//! 3. Exponentiation: ^ (right associative)
//! 4. Primary: literals, references, function calls, parentheses, unary minus
//!
//! Parsing stops at the first error; there is no recovery.

use crate::ast::{AstNode, BinaryOperator, UnaryOperator};
use crate::error::{FormulaResult, ParseError};
use crate::lexer::{tokenize, Token, TokenKind};

/// Default bound on formula nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parser limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest nesting accepted. Each parenthesis, function call, unary
    /// minus or chained `^` adds one level; a bare literal has depth 1.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use duke_calc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2*3").unwrap();
/// assert_eq!(ast.to_string(), "(1 + (2 * 3))");
///
/// let ast = parse_formula("=2^3^2").unwrap();
/// assert_eq!(ast.to_string(), "(2 ^ (3 ^ 2))");
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<AstNode> {
    parse_formula_with_options(formula, &ParseOptions::default())
}

/// Parse a formula string with explicit limits
pub fn parse_formula_with_options(
    formula: &str,
    options: &ParseOptions,
) -> FormulaResult<AstNode> {
    let tokens = tokenize(formula);
    Ok(parse_with_options(&tokens, options)?)
}

/// Parse a token stream into an AST
pub fn parse(tokens: &[Token]) -> Result<AstNode, ParseError> {
    parse_with_options(tokens, &ParseOptions::default())
}

/// Parse a token stream into an AST with explicit limits
pub fn parse_with_options(tokens: &[Token], options: &ParseOptions) -> Result<AstNode, ParseError> {
    let mut parser = FormulaParser::new(tokens, options.max_depth);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current().kind != TokenKind::Eof {
        return Err(parser.unexpected("EOF"));
    }

    Ok(expr)
}

/// Formula parser
struct FormulaParser<'a> {
    tokens: &'a [Token],
    index: usize,
    depth: usize,
    max_depth: usize,
    /// Returned once the slice runs out, in case the caller dropped the EOF
    eof: Token,
}

impl<'a> FormulaParser<'a> {
    fn new(tokens: &'a [Token], max_depth: usize) -> Self {
        let end = tokens
            .last()
            .map_or(0, |t| t.position + t.text.len());
        Self {
            tokens,
            index: 0,
            depth: 0,
            max_depth,
            eof: Token {
                kind: TokenKind::Eof,
                text: String::new(),
                position: end,
            },
        }
    }

    // === Helper methods ===

    fn current(&self) -> &Token {
        self.tokens.get(self.index).unwrap_or(&self.eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        token
    }

    fn current_is(&self, kind: TokenKind, text: &str) -> bool {
        self.current().is(kind, text)
    }

    fn expect(&mut self, kind: TokenKind, text: &str) -> Result<(), ParseError> {
        if self.current_is(kind, text) {
            self.consume();
            Ok(())
        } else {
            Err(self.unexpected(&format!("{} '{}'", kind, text)))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: token.kind,
            text: token.text.clone(),
            position: token.position,
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeep {
                max_depth: self.max_depth,
                position: self.current().position,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// The binary operator at the cursor, if it is one of `allowed`
    fn operator_in(&self, allowed: &[BinaryOperator]) -> Option<BinaryOperator> {
        let token = self.current();
        if token.kind != TokenKind::Operator {
            return None;
        }
        BinaryOperator::from_symbol(&token.text).filter(|op| allowed.contains(op))
    }

    // === Expression parsing with precedence ===

    fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_term()?;

        while let Some(op) = self.operator_in(&[BinaryOperator::Add, BinaryOperator::Subtract]) {
            self.consume();
            let right = self.parse_term()?;
            left = AstNode::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_factor()?;

        while let Some(op) = self.operator_in(&[
            BinaryOperator::Multiply,
            BinaryOperator::Divide,
            BinaryOperator::Remainder,
        ]) {
            self.consume();
            let right = self.parse_factor()?;
            left = AstNode::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<AstNode, ParseError> {
        let base = self.parse_primary()?;

        if self.operator_in(&[BinaryOperator::Power]).is_some() {
            self.consume();
            self.enter()?;
            let exponent = self.parse_factor()?; // Right associative
            self.leave();
            return Ok(AstNode::binary(BinaryOperator::Power, base, exponent));
        }

        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        self.enter()?;
        let node = self.parse_primary_inner()?;
        self.leave();
        Ok(node)
    }

    fn parse_primary_inner(&mut self) -> Result<AstNode, ParseError> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Number => {
                let value: f64 = token
                    .text
                    .parse()
                    .map_err(|_| self.unexpected("a valid number"))?;
                self.consume();
                Ok(AstNode::Number(value))
            }

            TokenKind::String => {
                self.consume();
                Ok(AstNode::String(token.text))
            }

            TokenKind::CellRef => {
                self.consume();
                Ok(AstNode::CellRef(token.text))
            }

            TokenKind::Function => {
                self.consume();
                self.parse_function_call(token.text)
            }

            TokenKind::Parenthesis if token.text == "(" => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Parenthesis, ")")?;
                Ok(expr)
            }

            TokenKind::Operator if token.text == "-" => {
                self.consume();
                let operand = self.parse_primary()?;
                Ok(AstNode::unary(UnaryOperator::Negate, operand))
            }

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_function_call(&mut self, name: String) -> Result<AstNode, ParseError> {
        self.expect(TokenKind::Parenthesis, "(")?;

        let mut args = Vec::new();

        // Parse arguments
        if !self.current_is(TokenKind::Parenthesis, ")") {
            args.push(self.parse_expression()?);

            while self.current().kind == TokenKind::Comma {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(TokenKind::Parenthesis, ")")?;

        Ok(AstNode::FunctionCall {
            name: name.to_uppercase(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaError;
    use pretty_assertions::assert_eq;

    fn shape(formula: &str) -> String {
        parse_formula(formula).unwrap().to_string()
    }

    fn parse_error(formula: &str) -> ParseError {
        match parse_formula(formula) {
            Err(FormulaError::Parse(e)) => e,
            other => panic!("Expected parse error for {formula}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_formula("=42").unwrap(), AstNode::Number(42.0));
        assert_eq!(parse_formula("=3.14").unwrap(), AstNode::Number(3.14));
        assert_eq!(parse_formula("=.5").unwrap(), AstNode::Number(0.5));
        assert_eq!(
            parse_formula("=\"Hello\"").unwrap(),
            AstNode::String("Hello".into())
        );
        assert_eq!(parse_formula("=B7").unwrap(), AstNode::CellRef("B7".into()));
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(shape("=1+2*3"), "(1 + (2 * 3))");
        assert_eq!(shape("=(1+2)*3"), "((1 + 2) * 3)");
        assert_eq!(shape("=2*3^2"), "(2 * (3 ^ 2))");
        assert_eq!(shape("=7%4+1"), "((7 % 4) + 1)");
    }

    #[test]
    fn test_parse_associativity() {
        assert_eq!(shape("=10-4-3"), "((10 - 4) - 3)");
        assert_eq!(shape("=8/4/2"), "((8 / 4) / 2)");
        assert_eq!(shape("=2^3^2"), "(2 ^ (3 ^ 2))");
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(shape("=-5"), "(-5)");
        assert_eq!(shape("=--A1"), "(-(-A1))");
        // Unary minus binds to the primary, so it is inside the power
        assert_eq!(shape("=-2^2"), "((-2) ^ 2)");
        assert_eq!(shape("=3*-2"), "(3 * (-2))");
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_formula("=SUM(1,A1,B1:B3)").unwrap();
        if let AstNode::FunctionCall { name, args } = ast {
            assert_eq!(name, "SUM");
            assert_eq!(args.len(), 3);
            assert_eq!(args[2], AstNode::CellRef("B1:B3".into()));
        } else {
            panic!("Expected FunctionCall");
        }

        assert_eq!(shape("=Sum()"), "SUM()");
        assert_eq!(shape("=IF(A1,SUM(B1,2),0)"), "IF(A1, SUM(B1, 2), 0)");
    }

    #[test]
    fn test_parse_missing_close_paren() {
        assert_eq!(
            parse_error("=(1+2"),
            ParseError::UnexpectedToken {
                expected: "PARENTHESIS ')'".into(),
                found: TokenKind::Eof,
                text: String::new(),
                position: 4,
            }
        );
        assert!(matches!(
            parse_error("=SUM(1,2"),
            ParseError::UnexpectedToken {
                found: TokenKind::Eof,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_function_without_parenthesis() {
        assert_eq!(
            parse_error("=SUM 1"),
            ParseError::UnexpectedToken {
                expected: "PARENTHESIS '('".into(),
                found: TokenKind::Number,
                text: "1".into(),
                position: 4,
            }
        );
    }

    #[test]
    fn test_parse_missing_operand() {
        assert!(matches!(
            parse_error("=1+"),
            ParseError::UnexpectedToken {
                found: TokenKind::Eof,
                ..
            }
        ));
        assert!(matches!(
            parse_error("=*3"),
            ParseError::UnexpectedToken {
                found: TokenKind::Operator,
                position: 0,
                ..
            }
        ));
        assert!(matches!(
            parse_error("=SUM(1,)"),
            ParseError::UnexpectedToken {
                found: TokenKind::Parenthesis,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_trailing_tokens() {
        assert_eq!(
            parse_error("=1 2"),
            ParseError::UnexpectedToken {
                expected: "EOF".into(),
                found: TokenKind::Number,
                text: "2".into(),
                position: 2,
            }
        );
        assert!(matches!(
            parse_error("=(1))"),
            ParseError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn test_parse_invalid_number() {
        assert!(matches!(
            parse_error("=1.2.3"),
            ParseError::UnexpectedToken {
                found: TokenKind::Number,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_empty_formula() {
        assert!(matches!(
            parse_error("="),
            ParseError::UnexpectedToken {
                found: TokenKind::Eof,
                ..
            }
        ));
    }

    #[test]
    fn test_depth_limit() {
        let options = ParseOptions { max_depth: 4 };
        assert!(parse_formula_with_options("=((1))", &options).is_ok());

        let err = parse_formula_with_options("=((((1))))", &options).unwrap_err();
        assert!(matches!(
            err,
            FormulaError::Parse(ParseError::TooDeep { max_depth: 4, .. })
        ));

        let err = parse_formula_with_options("=2^2^2^2^2", &options).unwrap_err();
        assert!(matches!(err, FormulaError::Parse(ParseError::TooDeep { .. })));
    }

    #[test]
    fn test_deep_nesting_fails_cleanly() {
        let formula = format!("={}1{}", "(".repeat(5_000), ")".repeat(5_000));
        assert!(matches!(
            parse_formula(&formula),
            Err(FormulaError::Parse(ParseError::TooDeep { .. }))
        ));
    }

    #[test]
    fn test_parse_without_eof_token() {
        let mut tokens = tokenize("=1+2");
        tokens.pop();
        assert_eq!(parse(&tokens).unwrap().to_string(), "(1 + 2)");
    }
}
