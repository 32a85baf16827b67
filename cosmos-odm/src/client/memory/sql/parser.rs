use super::lexer::{tokenize, Token};
use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Projection {
    All,
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OrderItem {
    pub(crate) path: Vec<String>,
    pub(crate) ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectQuery {
    pub(crate) top: Option<usize>,
    pub(crate) projection: Projection,
    pub(crate) filter: Option<Expr>,
    pub(crate) order_by: Vec<OrderItem>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Function {
    Contains,
    StartsWith,
    EndsWith,
    ArrayContains,
    IsDefined,
    IsNull,
}

impl Function {
    fn from_name(name: &str) -> Option<(Function, usize)> {
        match name.to_ascii_uppercase().as_str() {
            "CONTAINS" => Some((Function::Contains, 2)),
            "STARTSWITH" => Some((Function::StartsWith, 2)),
            "ENDSWITH" => Some((Function::EndsWith, 2)),
            "ARRAY_CONTAINS" => Some((Function::ArrayContains, 2)),
            "IS_DEFINED" => Some((Function::IsDefined, 1)),
            "IS_NULL" => Some((Function::IsNull, 1)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Path(Vec<String>),
    Parameter(String),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(CompareOp, Operand, Operand),
    Between(Operand, Operand, Operand),
    Call(Function, Vec<Operand>),
    /// A bare operand used as a predicate, e.g. `WHERE true` or `WHERE r.active`.
    Truthy(Operand),
}

/// Parses the query dialect emitted by the SQL generator.
///
/// ```text
/// SELECT [TOP n] (* | VALUE COUNT(1)) FROM ROOT alias
///     [WHERE expr] [ORDER BY path [ASC|DESC] {, path [ASC|DESC]}]
/// ```
pub(crate) fn parse(text: &str) -> CosmosResult<SelectQuery> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        alias: String::new(),
    };
    parser.select()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    alias: String,
}

impl Parser {
    fn select(&mut self) -> CosmosResult<SelectQuery> {
        self.expect_keyword("SELECT")?;

        let top = if self.eat_keyword("TOP") {
            match self.next() {
                Some(Token::Number(n)) => match n.as_u64() {
                    Some(n) => Some(n as usize),
                    None => return Err(self.error("TOP expects a non-negative integer")),
                },
                _ => return Err(self.error("TOP expects a number")),
            }
        } else {
            None
        };

        let projection = if self.eat(&Token::Star) {
            Projection::All
        } else if self.eat_keyword("VALUE") {
            self.expect_keyword("COUNT")?;
            self.expect(&Token::LParen)?;
            match self.next() {
                Some(Token::Number(_)) | Some(Token::Star) => {}
                _ => return Err(self.error("COUNT expects 1")),
            }
            self.expect(&Token::RParen)?;
            Projection::Count
        } else {
            return Err(self.error("expected '*' or VALUE COUNT(1)"));
        };

        self.expect_keyword("FROM")?;
        self.expect_keyword("ROOT")?;
        self.alias = match self.next() {
            Some(Token::Ident(alias)) => alias,
            _ => return Err(self.error("expected collection alias")),
        };

        let filter = if self.eat_keyword("WHERE") {
            Some(self.or_expr()?)
        } else {
            None
        };

        let mut order_by = Vec::new();
        if self.eat_keyword("ORDER") {
            self.expect_keyword("BY")?;
            loop {
                let path = self.path()?;
                let ascending = if self.eat_keyword("DESC") {
                    false
                } else {
                    self.eat_keyword("ASC");
                    true
                };
                order_by.push(OrderItem { path, ascending });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }

        if self.pos < self.tokens.len() {
            return Err(self.error("unexpected trailing input"));
        }

        Ok(SelectQuery {
            top,
            projection,
            filter,
            order_by,
        })
    }

    fn or_expr(&mut self) -> CosmosResult<Expr> {
        let mut left = self.and_expr()?;
        while self.eat_keyword("OR") {
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> CosmosResult<Expr> {
        let mut left = self.unary()?;
        while self.eat_keyword("AND") {
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> CosmosResult<Expr> {
        if self.eat_keyword("NOT") {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> CosmosResult<Expr> {
        if self.eat(&Token::LParen) {
            let expr = self.or_expr()?;
            self.expect(&Token::RParen)?;
            return Ok(expr);
        }

        if let Some(Token::Ident(name)) = self.peek() {
            if let Some((function, arity)) = Function::from_name(name) {
                if self.peek_at(1) == Some(&Token::LParen) {
                    self.pos += 2;
                    let mut args = Vec::with_capacity(arity);
                    loop {
                        args.push(self.operand()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect(&Token::RParen)?;
                    if args.len() != arity {
                        return Err(self.error(&format!(
                            "{:?} expects {} argument(s), got {}",
                            function,
                            arity,
                            args.len()
                        )));
                    }
                    return Ok(Expr::Call(function, args));
                }
            }
        }

        let left = self.operand()?;
        if self.eat_keyword("BETWEEN") {
            let low = self.operand()?;
            self.expect_keyword("AND")?;
            let high = self.operand()?;
            return Ok(Expr::Between(left, low, high));
        }

        let op = match self.peek() {
            Some(Token::Eq) => Some(CompareOp::Eq),
            Some(Token::Ne) => Some(CompareOp::Ne),
            Some(Token::Lt) => Some(CompareOp::Lt),
            Some(Token::Le) => Some(CompareOp::Le),
            Some(Token::Gt) => Some(CompareOp::Gt),
            Some(Token::Ge) => Some(CompareOp::Ge),
            _ => None,
        };

        match op {
            Some(op) => {
                self.pos += 1;
                let right = self.operand()?;
                Ok(Expr::Compare(op, left, right))
            }
            None => Ok(Expr::Truthy(left)),
        }
    }

    fn operand(&mut self) -> CosmosResult<Operand> {
        match self.peek().cloned() {
            Some(Token::Param(name)) => {
                self.pos += 1;
                Ok(Operand::Parameter(name))
            }
            Some(Token::Str(s)) => {
                self.pos += 1;
                Ok(Operand::Literal(Value::String(s)))
            }
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Operand::Literal(Value::Number(n)))
            }
            Some(token) if token.is_keyword("true") => {
                self.pos += 1;
                Ok(Operand::Literal(Value::Bool(true)))
            }
            Some(token) if token.is_keyword("false") => {
                self.pos += 1;
                Ok(Operand::Literal(Value::Bool(false)))
            }
            Some(token) if token.is_keyword("null") => {
                self.pos += 1;
                Ok(Operand::Literal(Value::Null))
            }
            Some(Token::Ident(_)) => Ok(Operand::Path(self.path()?)),
            _ => Err(self.error("expected operand")),
        }
    }

    fn path(&mut self) -> CosmosResult<Vec<String>> {
        match self.next() {
            Some(Token::Ident(alias)) if alias == self.alias => {}
            _ => return Err(self.error(&format!("expected path rooted at '{}'", self.alias))),
        }

        let mut segments = Vec::new();
        loop {
            if self.eat(&Token::Dot) {
                match self.next() {
                    Some(Token::Ident(segment)) => segments.push(segment),
                    _ => return Err(self.error("expected property name after '.'")),
                }
            } else if self.eat(&Token::LBracket) {
                match self.next() {
                    Some(Token::Str(segment)) => segments.push(segment),
                    _ => return Err(self.error("expected quoted property name")),
                }
                self.expect(&Token::RBracket)?;
            } else {
                break;
            }
        }

        if segments.is_empty() {
            return Err(self.error("expected property path"));
        }
        Ok(segments)
    }

    #[inline]
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> CosmosResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", token)))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> CosmosResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", keyword)))
        }
    }

    fn error(&self, message: &str) -> CosmosError {
        log::error!("Invalid query at token {}: {}", self.pos, message);
        CosmosError::new(
            &format!("Invalid query at token {}: {}", self.pos, message),
            ErrorKind::InvalidQuery,
        )
    }
}
