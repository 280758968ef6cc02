//! Restricted arithmetic formulas for mapping grid coordinates to values.
//!
//! Supported: number literals, the variables `BASE`, `FROM`, `TO`, `STEP`
//! and `I`, the operators `+ - * / ^` (with `^` right-associative), unary
//! minus, parentheses, and the functions `pow`, `exp`, `log` (natural),
//! `log10`, `sqrt`, `abs`, `floor`, `ceil`, `round`/`rint`, `min`, `max`.
//! Unknown names and wrong arities are rejected at compile time, so a
//! compiled [`Expression`] always evaluates to some `f64`.

use gs_types::ExpressionError;

/// Variable values for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bindings {
    pub base: f64,
    pub from: f64,
    pub to: f64,
    pub step: f64,
    pub i: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variable {
    Base,
    From,
    To,
    Step,
    I,
}

impl Variable {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "BASE" => Some(Self::Base),
            "FROM" => Some(Self::From),
            "TO" => Some(Self::To),
            "STEP" => Some(Self::Step),
            "I" => Some(Self::I),
            _ => None,
        }
    }

    fn value(self, b: &Bindings) -> f64 {
        match self {
            Self::Base => b.base,
            Self::From => b.from,
            Self::To => b.to,
            Self::Step => b.step,
            Self::I => b.i,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Pow,
    Exp,
    Log,
    Log10,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Round,
    Min,
    Max,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        let f = match name.to_ascii_lowercase().as_str() {
            "pow" => Self::Pow,
            "exp" => Self::Exp,
            "log" | "ln" => Self::Log,
            "log10" => Self::Log10,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" | "rint" => Self::Round,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        };
        Some(f)
    }

    fn arity(self) -> usize {
        match self {
            Self::Pow | Self::Min | Self::Max => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        match self {
            Self::Pow => args[0].powf(args[1]),
            Self::Exp => args[0].exp(),
            Self::Log => args[0].ln(),
            Self::Log10 => args[0].log10(),
            Self::Sqrt => args[0].sqrt(),
            Self::Abs => args[0].abs(),
            Self::Floor => args[0].floor(),
            Self::Ceil => args[0].ceil(),
            Self::Round => args[0].round_ties_even(),
            Self::Min => args[0].min(args[1]),
            Self::Max => args[0].max(args[1]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Variable(Variable),
    Negate(Box<Node>),
    Binary(char, Box<Node>, Box<Node>),
    Call(Function, Vec<Node>),
}

impl Node {
    fn eval(&self, b: &Bindings) -> f64 {
        match self {
            Node::Number(v) => *v,
            Node::Variable(var) => var.value(b),
            Node::Negate(inner) => -inner.eval(b),
            Node::Binary(op, lhs, rhs) => {
                let (l, r) = (lhs.eval(b), rhs.eval(b));
                match op {
                    '+' => l + r,
                    '-' => l - r,
                    '*' => l * r,
                    '/' => l / r,
                    _ => l.powf(r),
                }
            }
            Node::Call(func, args) => {
                let values: Vec<f64> = args.iter().map(|a| a.eval(b)).collect();
                func.apply(&values)
            }
        }
    }
}

/// A compiled formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    pub fn compile(source: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.expr()?;
        if let Some((token, position)) = parser.tokens.get(parser.pos) {
            return Err(ExpressionError::UnexpectedToken {
                token: token.to_string(),
                position: *position,
            });
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, bindings: &Bindings) -> f64 {
        self.root.eval(bindings)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    Open,
    Close,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(v) => write!(f, "{v}"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::Op(c) => write!(f, "{c}"),
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ExpressionError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push((Token::Op(c), start));
                i += 1;
            }
            '(' => {
                tokens.push((Token::Open, start));
                i += 1;
            }
            ')' => {
                tokens.push((Token::Close, start));
                i += 1;
            }
            ',' => {
                tokens.push((Token::Comma, start));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent part, e.g. 1e-3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::InvalidNumber { literal })?;
                tokens.push((Token::Number(value), start));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push((Token::Ident(chars[start..i].iter().collect()), start));
            }
            _ => return Err(ExpressionError::UnexpectedChar { ch: c, position: start }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Result<(Token, usize), ExpressionError> {
        let token = self.tokens.get(self.pos).cloned().ok_or(ExpressionError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExpressionError> {
        let (token, position) = self.next()?;
        if token != expected {
            return Err(ExpressionError::UnexpectedToken {
                token: token.to_string(),
                position,
            });
        }
        Ok(())
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Node, ExpressionError> {
        let mut node = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            node = Node::Binary(op, Box::new(node), Box::new(self.term()?));
        }
        Ok(node)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<Node, ExpressionError> {
        let mut node = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            node = Node::Binary(op, Box::new(node), Box::new(self.unary()?));
        }
        Ok(node)
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> Result<Node, ExpressionError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(Node::Negate(Box::new(self.unary()?)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := primary ('^' unary)?
    fn power(&mut self) -> Result<Node, ExpressionError> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Node::Binary('^', Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Node, ExpressionError> {
        let (token, position) = self.next()?;
        match token {
            Token::Number(v) => Ok(Node::Number(v)),
            Token::Open => {
                let node = self.expr()?;
                self.expect(Token::Close)?;
                Ok(node)
            }
            Token::Ident(name) => {
                if let Some(Token::Open) = self.peek() {
                    self.pos += 1;
                    self.call(name)
                } else {
                    Variable::lookup(&name)
                        .map(Node::Variable)
                        .ok_or(ExpressionError::UnknownVariable { name })
                }
            }
            other => Err(ExpressionError::UnexpectedToken {
                token: other.to_string(),
                position,
            }),
        }
    }

    fn call(&mut self, name: String) -> Result<Node, ExpressionError> {
        let func = Function::lookup(&name).ok_or_else(|| ExpressionError::UnknownFunction { name: name.clone() })?;

        let mut args = Vec::new();
        if let Some(Token::Close) = self.peek() {
            self.pos += 1;
        } else {
            loop {
                args.push(self.expr()?);
                let (token, position) = self.next()?;
                match token {
                    Token::Comma => continue,
                    Token::Close => break,
                    other => {
                        return Err(ExpressionError::UnexpectedToken {
                            token: other.to_string(),
                            position,
                        })
                    }
                }
            }
        }

        if args.len() != func.arity() {
            return Err(ExpressionError::Arity {
                name,
                expected: func.arity(),
                actual: args.len(),
            });
        }
        Ok(Node::Call(func, args))
    }
}
