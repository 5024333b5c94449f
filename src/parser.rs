use crate::ast::{
    BinaryOp, Body, Callable, ElifBranch, Expr, FuncDef, Literal, LoopBody, MainEntry, PostfixOp,
    Program, ReplInput, Stmt, UnaryOp,
};
use crate::error::{NyaaError, Span};
use crate::lexer::{Token, TokenType};

/// Recursive-descent parser over a token vector ending in `Eof`.
///
/// Every binary tier is right-recursive, so `a - b - c` parses as
/// `a - (b - c)`. The additive tier holds `+ - or`, the multiplicative tier
/// holds `* / and`.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, NyaaError> {
        if self.is_at_end() {
            return Ok(Program {
                functions: Vec::new(),
                main: None,
            });
        }

        let mut functions = Vec::new();
        while self.match_types(&[TokenType::Def]) {
            functions.push(self.func_def()?);
        }

        self.consume_with_help(
            TokenType::Main,
            "Expected 'uWu_nyaa' main entry",
            "A program is a list of 'kawaii' definitions followed by: uWu_nyaa() => { ... }"
                .to_string(),
        )?;
        self.consume(TokenType::LeftParen, "Expected '(' after 'uWu_nyaa'")?;
        self.consume(TokenType::RightParen, "Expected ')' after 'uWu_nyaa('")?;
        self.consume(TokenType::Arrow, "Expected '=>' after 'uWu_nyaa()'")?;

        let main = if self.match_types(&[TokenType::LeftBrace]) {
            MainEntry::Block(self.block()?)
        } else if self.starts_statement() {
            let stmt = self.statement()?;
            self.match_types(&[TokenType::Semicolon]);
            MainEntry::Single(Box::new(stmt))
        } else {
            return Err(self.error_at_current(
                "Expected '{' or a statement after '=>'",
                Some("The main entry is either a block or a single statement.".to_string()),
            ));
        };

        if !self.is_at_end() {
            return Err(self.error_at_current("Expected end of input after main entry", None));
        }

        tracing::debug!(functions = functions.len(), "parsing finished");
        Ok(Program {
            functions,
            main: Some(main),
        })
    }

    /// Parses one line of interactive input: a function definition, a bare
    /// expression or a statement sequence.
    pub fn parse_repl(&mut self) -> Result<ReplInput, NyaaError> {
        if self.is_at_end() {
            return Ok(ReplInput::Empty);
        }

        if self.match_types(&[TokenType::Def]) {
            let func = self.func_def()?;
            if !self.is_at_end() {
                return Err(
                    self.error_at_current("Expected end of input after function definition", None)
                );
            }
            return Ok(ReplInput::FuncDef(func));
        }

        if self.peek().token_type.starts_expression() && !self.identifier_starts_statement() {
            let checkpoint = self.current;
            if let Ok(expr) = self.expression() {
                if self.is_at_end() {
                    return Ok(ReplInput::Expression(expr));
                }
            }
            self.current = checkpoint;
        }

        let body = self.body()?;
        if !self.is_at_end() {
            return Err(self.error_at_current(
                &format!("Expected statement, found {}", self.peek().describe()),
                None,
            ));
        }
        Ok(ReplInput::Statements(body))
    }

    fn func_def(&mut self) -> Result<FuncDef, NyaaError> {
        let start_span = self.previous().span.clone();
        let name = self
            .consume(TokenType::Identifier, "Expected function name after 'kawaii'")?
            .lexeme
            .clone();

        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after function name",
            format!("Function definitions look like: kawaii {}(a, b) {{ ... }}", name),
        )?;

        let mut params: Vec<String> = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let param = self.consume(TokenType::Identifier, "Expected parameter name")?;
                let (param_name, param_span, param_position) =
                    (param.lexeme.clone(), param.span.clone(), param.position);
                if params.contains(&param_name) {
                    return Err(NyaaError::parse_error(
                        param_span,
                        param_position,
                        format!("Duplicate parameter '{}' in function '{}'", param_name, name),
                    ));
                }
                params.push(param_name);

                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expected ')' after parameters")?;

        self.match_types(&[TokenType::Arrow]);

        let body = if self.match_types(&[TokenType::LeftBrace]) {
            self.block()?
        } else if self.starts_statement() {
            let stmt = self.statement()?;
            self.match_types(&[TokenType::Semicolon]);
            Body::new(vec![stmt])
        } else {
            return Err(self.error_at_current(
                &format!("Expected '{{' before body of function '{}'", name),
                None,
            ));
        };

        Ok(FuncDef {
            name,
            params,
            body,
            span: start_span.to(&self.previous().span),
        })
    }

    /// Statements up to and including the closing '}'. The opening '{' has
    /// already been consumed.
    fn block(&mut self) -> Result<Body, NyaaError> {
        let body = self.body()?;

        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after block",
            "Block statements must be closed with '}' after the opening '{'.".to_string(),
        )?;
        Ok(body)
    }

    fn body(&mut self) -> Result<Body, NyaaError> {
        let mut statements = Vec::new();

        while self.starts_statement() {
            statements.push(self.statement()?);

            // Make semicolon optional
            self.match_types(&[TokenType::Semicolon]);
        }

        Ok(Body::new(statements))
    }

    fn starts_statement(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::Pass
                | TokenType::Break
                | TokenType::Continue
                | TokenType::Return
                | TokenType::Identifier
                | TokenType::While
                | TokenType::If
                | TokenType::Try
                | TokenType::Print
                | TokenType::Input
        )
    }

    /// True when the current identifier begins an assignment or postfix
    /// statement rather than an expression.
    fn identifier_starts_statement(&self) -> bool {
        self.check(&TokenType::Identifier)
            && matches!(
                self.peek_next().token_type,
                TokenType::Assign | TokenType::PlusPlus | TokenType::MinusMinus
            )
    }

    fn statement(&mut self) -> Result<Stmt, NyaaError> {
        let token = self.advance().clone();
        let span = token.span.clone();

        match token.token_type {
            TokenType::Pass => Ok(Stmt::Pass { span }),
            TokenType::Break => Ok(Stmt::Break { span }),
            TokenType::Continue => Ok(Stmt::Continue { span }),
            TokenType::Return => self.return_statement(span),
            TokenType::Identifier => self.identifier_statement(token),
            TokenType::While => self.while_statement(span),
            TokenType::If => self.if_statement(span),
            TokenType::Try => self.try_statement(span),
            TokenType::Print => {
                let args = self.arguments("purinto")?;
                Ok(Stmt::Print {
                    args,
                    span: span.to(&self.previous().span),
                })
            }
            TokenType::Input => {
                let prompt = self.input_prompt()?;
                Ok(Stmt::Input {
                    prompt,
                    span: span.to(&self.previous().span),
                })
            }
            _ => Err(NyaaError::parse_error(
                span,
                token.position,
                format!("Expected statement, found {}", token.describe()),
            )),
        }
    }

    fn return_statement(&mut self, span: Span) -> Result<Stmt, NyaaError> {
        // purinto/ohayo after a bare sayonara start the next statement
        let value = if self.peek().token_type.starts_expression()
            && !matches!(self.peek().token_type, TokenType::Print | TokenType::Input)
            && !self.identifier_starts_statement()
        {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Stmt::Return {
            value,
            span: span.to(&self.previous().span),
        })
    }

    fn identifier_statement(&mut self, name: Token) -> Result<Stmt, NyaaError> {
        let span = name.span.clone();

        if self.match_types(&[TokenType::Assign]) {
            let value = self.expression()?;
            return Ok(Stmt::Assignment {
                target: name.lexeme,
                span: span.to(value.span()),
                value,
            });
        }

        if self.match_types(&[TokenType::PlusPlus, TokenType::MinusMinus]) {
            let op = match self.previous().token_type {
                TokenType::PlusPlus => PostfixOp::Increment,
                _ => PostfixOp::Decrement,
            };
            return Ok(Stmt::Postfix {
                name: name.lexeme,
                op,
                span: span.to(&self.previous().span),
            });
        }

        if self.check(&TokenType::LeftParen) {
            let args = self.arguments(&name.lexeme)?;
            return Ok(Stmt::Call {
                name: name.lexeme,
                args,
                span: span.to(&self.previous().span),
            });
        }

        Err(self.error_at_current(
            &format!(
                "Expected 'asain', '++', '--' or '(' after identifier '{}', found {}",
                name.lexeme,
                self.peek().describe()
            ),
            Some(format!(
                "Identifiers start an assignment ({0} asain 1), a postfix update ({0}++) or a call ({0}()).",
                name.lexeme
            )),
        ))
    }

    fn while_statement(&mut self, start_span: Span) -> Result<Stmt, NyaaError> {
        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after 'nani'",
            "While loops require parentheses around the condition: nani (condition) { ... }"
                .to_string(),
        )?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after while condition")?;

        let body = if self.match_types(&[TokenType::Break]) {
            LoopBody::Break
        } else if self.match_types(&[TokenType::Continue]) {
            LoopBody::Continue
        } else {
            self.consume_with_help(
                TokenType::LeftBrace,
                "Expected '{' before loop body",
                "A loop body is a block, or the bare keyword 'yamete' or 'motto'.".to_string(),
            )?;
            LoopBody::Body(self.block()?)
        };

        Ok(Stmt::While {
            condition,
            body,
            span: start_span.to(&self.previous().span),
        })
    }

    fn if_statement(&mut self, start_span: Span) -> Result<Stmt, NyaaError> {
        let (condition, then_body) = self.conditional_branch("nyan")?;

        let mut elifs = Vec::new();
        while self.match_types(&[TokenType::Elif]) {
            let (condition, body) = self.conditional_branch("nyanyan")?;
            elifs.push(ElifBranch { condition, body });
        }

        let else_body = if self.match_types(&[TokenType::Else]) {
            self.consume(TokenType::LeftBrace, "Expected '{' after 'baka'")?;
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_body,
            elifs,
            else_body,
            span: start_span.to(&self.previous().span),
        })
    }

    fn conditional_branch(&mut self, keyword: &str) -> Result<(Expr, Body), NyaaError> {
        self.consume_with_help(
            TokenType::LeftParen,
            &format!("Expected '(' after '{}'", keyword),
            format!(
                "Conditions must be enclosed in parentheses: {} (condition) {{ ... }}",
                keyword
            ),
        )?;
        let condition = self.expression()?;
        self.consume(
            TokenType::RightParen,
            &format!("Expected ')' after '{}' condition", keyword),
        )?;
        self.consume(
            TokenType::LeftBrace,
            &format!("Expected '{{' after '{}' condition", keyword),
        )?;
        let body = self.block()?;
        Ok((condition, body))
    }

    fn try_statement(&mut self, start_span: Span) -> Result<Stmt, NyaaError> {
        self.consume(TokenType::LeftBrace, "Expected '{' after 'ganbatte'")?;
        let try_body = self.block()?;

        self.consume_with_help(
            TokenType::Except,
            "Expected 'gomenasai' after 'ganbatte' block",
            "Every 'ganbatte { ... }' needs a handler: gomenasai { ... }".to_string(),
        )?;
        self.consume(TokenType::LeftBrace, "Expected '{' after 'gomenasai'")?;
        let except_body = self.block()?;

        Ok(Stmt::TryCatch {
            try_body,
            except_body,
            span: start_span.to(&self.previous().span),
        })
    }

    fn arguments(&mut self, callee: &str) -> Result<Vec<Expr>, NyaaError> {
        self.consume(
            TokenType::LeftParen,
            &format!("Expected '(' after '{}'", callee),
        )?;

        let mut args = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expected ')' after arguments")?;
        Ok(args)
    }

    fn input_prompt(&mut self) -> Result<Option<String>, NyaaError> {
        self.consume(TokenType::LeftParen, "Expected '(' after 'ohayo'")?;

        let prompt = if self.match_types(&[TokenType::String]) {
            match &self.previous().literal {
                Some(Literal::Str(text)) => Some(text.clone()),
                _ => Some(String::new()),
            }
        } else {
            None
        };

        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after input prompt",
            "'ohayo' takes at most one string literal prompt: ohayo(\"name? \")".to_string(),
        )?;
        Ok(prompt)
    }

    // expr: simple (relOp expr)?
    fn expression(&mut self) -> Result<Expr, NyaaError> {
        let left = self.simple()?;

        if self.match_types(&[
            TokenType::EqualEqual,
            TokenType::BangEqual,
            TokenType::Less,
            TokenType::LessEqual,
            TokenType::Greater,
            TokenType::GreaterEqual,
        ]) {
            let operator = self.binary_op()?;
            let right = self.expression()?;
            return Ok(Self::binary(left, operator, right));
        }

        Ok(left)
    }

    // simple: term (('+' | '-' | or) simple)?
    fn simple(&mut self) -> Result<Expr, NyaaError> {
        let left = self.term()?;

        if self.match_types(&[TokenType::Plus, TokenType::Minus, TokenType::Or]) {
            let operator = self.binary_op()?;
            let right = self.simple()?;
            return Ok(Self::binary(left, operator, right));
        }

        Ok(left)
    }

    // term: factor (('*' | '/' | and) term)?
    fn term(&mut self) -> Result<Expr, NyaaError> {
        let left = self.factor()?;

        if self.match_types(&[TokenType::Star, TokenType::Slash, TokenType::And]) {
            let operator = self.binary_op()?;
            let right = self.term()?;
            return Ok(Self::binary(left, operator, right));
        }

        Ok(left)
    }

    fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
        let span = left.span().to(right.span());
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        }
    }

    fn binary_op(&self) -> Result<BinaryOp, NyaaError> {
        let token = self.previous();
        let operator = match token.token_type {
            TokenType::Plus => BinaryOp::Add,
            TokenType::Minus => BinaryOp::Subtract,
            TokenType::Or => BinaryOp::Or,
            TokenType::Star => BinaryOp::Multiply,
            TokenType::Slash => BinaryOp::Divide,
            TokenType::And => BinaryOp::And,
            TokenType::EqualEqual => BinaryOp::Equal,
            TokenType::BangEqual => BinaryOp::NotEqual,
            TokenType::Less => BinaryOp::Less,
            TokenType::LessEqual => BinaryOp::LessEqual,
            TokenType::Greater => BinaryOp::Greater,
            TokenType::GreaterEqual => BinaryOp::GreaterEqual,
            _ => {
                return Err(NyaaError::parse_error(
                    token.span.clone(),
                    token.position,
                    format!("Expected operator, found {}", token.describe()),
                ))
            }
        };
        Ok(operator)
    }

    fn factor(&mut self) -> Result<Expr, NyaaError> {
        if self.is_at_end() {
            return Err(self.error_at_current("Expected expression, found end of input", None));
        }

        let token = self.advance().clone();
        let span = token.span.clone();

        match token.token_type {
            TokenType::Minus | TokenType::Not => {
                let operator = if token.token_type == TokenType::Minus {
                    UnaryOp::Negate
                } else {
                    UnaryOp::Not
                };
                let operand = self.factor()?;
                Ok(Expr::Unary {
                    operator,
                    span: span.to(operand.span()),
                    operand: Box::new(operand),
                })
            }
            TokenType::LeftParen => {
                let expr = self.expression()?;
                self.consume(TokenType::RightParen, "Expected ')' after expression")?;
                Ok(Expr::Grouping {
                    expr: Box::new(expr),
                    span: span.to(&self.previous().span),
                })
            }
            TokenType::Identifier => {
                if self.check(&TokenType::LeftParen) {
                    let args = self.arguments(&token.lexeme)?;
                    Ok(Expr::Call {
                        callable: Callable::Function {
                            name: token.lexeme,
                            args,
                        },
                        span: span.to(&self.previous().span),
                    })
                } else {
                    Ok(Expr::Identifier {
                        name: token.lexeme,
                        span,
                    })
                }
            }
            TokenType::Print => {
                let args = self.arguments("purinto")?;
                Ok(Expr::Call {
                    callable: Callable::Print { args },
                    span: span.to(&self.previous().span),
                })
            }
            TokenType::Input => {
                let prompt = self.input_prompt()?;
                Ok(Expr::Call {
                    callable: Callable::Input { prompt },
                    span: span.to(&self.previous().span),
                })
            }
            TokenType::True => Ok(Expr::Literal {
                value: Literal::Bool(true),
                span,
            }),
            TokenType::False => Ok(Expr::Literal {
                value: Literal::Bool(false),
                span,
            }),
            TokenType::Integer | TokenType::Float | TokenType::String => match token.literal.clone() {
                Some(value) => Ok(Expr::Literal { value, span }),
                None => Err(NyaaError::parse_error(
                    span,
                    token.position,
                    format!("Malformed literal {}", token.describe()),
                )),
            },
            _ => Err(NyaaError::parse_error_with_help(
                span,
                token.position,
                format!("Expected expression, found {}", token.describe()),
                "Expressions are literals, identifiers, calls, or operators applied to them."
                    .to_string(),
            )),
        }
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().token_type == token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, NyaaError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message, None))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: String,
    ) -> Result<&Token, NyaaError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message, Some(help)))
        }
    }

    fn error_at_current(&self, message: &str, help: Option<String>) -> NyaaError {
        let token = self.peek();

        // At EOF, point just past the last real token
        let error_span = if self.is_at_end() && self.current > 0 {
            Span::single(self.tokens[self.current - 1].span.end)
        } else {
            token.span.clone()
        };

        let message = if message.contains("found") {
            message.to_string()
        } else {
            format!("{}, found {}", message, token.describe())
        };

        match help {
            Some(help) => NyaaError::parse_error_with_help(error_span, token.position, message, help),
            None => NyaaError::parse_error(error_span, token.position, message),
        }
    }
}

/// Lexes and parses a whole program.
pub fn parse_program(source: &str) -> Result<Program, NyaaError> {
    let tokens = crate::lexer::tokenize(source)?;
    Parser::new(tokens).parse()
}
