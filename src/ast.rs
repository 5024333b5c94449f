use crate::error::Span;

/// Function definitions followed by the main entry. `main` is `None` only for
/// the empty program.
#[derive(Debug, Clone)]
pub struct Program {
    pub functions: Vec<FuncDef>,
    pub main: Option<MainEntry>,
}

impl Program {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.main.is_none()
    }
}

#[derive(Debug, Clone)]
pub enum MainEntry {
    Block(Body),
    Single(Box<Stmt>),
}

#[derive(Debug, Clone)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Body,
    pub span: Span,
}

impl FuncDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Body {
    pub statements: Vec<Stmt>,
}

impl Body {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

/// What a `nani` loop runs each iteration: a block, or the bare
/// `yamete`/`motto` keyword.
#[derive(Debug, Clone)]
pub enum LoopBody {
    Break,
    Continue,
    Body(Body),
}

#[derive(Debug, Clone)]
pub struct ElifBranch {
    pub condition: Expr,
    pub body: Body,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Pass {
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Assignment {
        target: String,
        value: Expr,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    While {
        condition: Expr,
        body: LoopBody,
        span: Span,
    },
    If {
        condition: Expr,
        then_body: Body,
        elifs: Vec<ElifBranch>,
        else_body: Option<Body>,
        span: Span,
    },
    TryCatch {
        try_body: Body,
        except_body: Body,
        span: Span,
    },
    Print {
        args: Vec<Expr>,
        span: Span,
    },
    Input {
        prompt: Option<String>,
        span: Span,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    Postfix {
        name: String,
        op: PostfixOp,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// The intrinsics and user calls that may also be used as a value.
#[derive(Debug, Clone)]
pub enum Callable {
    Print { args: Vec<Expr> },
    Input { prompt: Option<String> },
    Function { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: Literal,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    Grouping {
        expr: Box<Expr>,
        span: Span,
    },
    Call {
        callable: Callable,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Literal { span, .. } => span,
            Expr::Identifier { span, .. } => span,
            Expr::Unary { span, .. } => span,
            Expr::Binary { span, .. } => span,
            Expr::Grouping { span, .. } => span,
            Expr::Call { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Or,
    Multiply,
    Divide,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Or => "or",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::And => "and",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// One line of interactive input.
#[derive(Debug, Clone)]
pub enum ReplInput {
    Empty,
    FuncDef(FuncDef),
    Expression(Expr),
    Statements(Body),
}
