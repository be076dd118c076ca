use crate::error::{CalcError, CalcResult};
use crate::format::format_precision;
use crate::traits::{Evaluator, Scalar};
use std::collections::HashMap;

/// Largest argument for which `factorial` stays finite in f64.
const MAX_FACTORIAL: f64 = 170.0;

/// Deepest expression tree the parser will build.
const MAX_DEPTH: usize = 256;

/// Built-in single-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    Cbrt,
    Abs,
    Exp,
    Ln,
    Log10,
    Log2,
    Ceil,
    Floor,
    Round,
    Sign,
    Factorial,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "sqrt" => Self::Sqrt,
            "cbrt" => Self::Cbrt,
            "abs" => Self::Abs,
            "exp" => Self::Exp,
            // `log` is the natural logarithm, as on most scientific keypads.
            "log" | "ln" => Self::Ln,
            "log10" => Self::Log10,
            "log2" => Self::Log2,
            "ceil" => Self::Ceil,
            "floor" => Self::Floor,
            "round" => Self::Round,
            "sign" => Self::Sign,
            "factorial" => Self::Factorial,
            _ => return None,
        };
        Some(func)
    }

    fn apply<T: Scalar>(self, a: T) -> T {
        match self {
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Asin => a.asin(),
            Self::Acos => a.acos(),
            Self::Atan => a.atan(),
            Self::Sinh => a.sinh(),
            Self::Cosh => a.cosh(),
            Self::Tanh => a.tanh(),
            Self::Sqrt => a.sqrt(),
            Self::Cbrt => a.cbrt(),
            Self::Abs => a.abs(),
            Self::Exp => a.exp(),
            Self::Ln => a.ln(),
            Self::Log10 => a.log10(),
            Self::Log2 => a.log2(),
            Self::Ceil => a.ceil(),
            Self::Floor => a.floor(),
            Self::Round => a.round(),
            Self::Sign => {
                if a.is_zero() {
                    a
                } else {
                    a.signum()
                }
            }
            Self::Factorial => {
                let n = a.to_f64().unwrap_or(f64::NAN);
                T::from_f64(factorial(n)).unwrap_or_else(T::nan)
            }
        }
    }
}

/// n! for non-negative integers up to 170; NaN otherwise.
fn factorial(n: f64) -> f64 {
    if !(0.0..=MAX_FACTORIAL).contains(&n) || n.fract() != 0.0 {
        return f64::NAN;
    }
    (2..=n as u32).fold(1.0, |acc, k| acc * k as f64)
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "tau" => Some(std::f64::consts::TAU),
        "phi" => Some(1.618_033_988_749_895),
        _ => None,
    }
}

/// OpCodes for the Stack-based Virtual Machine.
/// The VM operates on a stack of `Scalar` values.
#[derive(Debug, Clone, Copy)]
pub enum OpCode {
    /// Pushes a constant `f64` value onto the stack.
    LoadConst(f64),
    /// Pushes the value of a variable (by index) onto the stack.
    /// Indices correspond to the order variables were given to the compiler.
    LoadVar(usize),
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top two values (b, a), pushes (a / b).
    Div,
    /// Pops top two values (b, a), pushes the remainder of (a / b).
    Rem,
    /// Pops top two values (b, a), pushes (a ^ b).
    Pow,
    /// Pops top value (a), pushes -a.
    Neg,
    /// Pops top value (a), pushes f(a).
    Call(Function),
}

/// Represents a compiled sequence of operations.
#[derive(Debug, Clone, Default)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

impl Bytecode {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }
}

/// Stack-based Virtual Machine for evaluating compiled expressions.
///
/// The VM is stateless; `execute` takes all necessary context:
/// - `bytecode`: Instructions to run.
/// - `vars`: Variable values (read-only).
/// - `stack`: A mutable buffer for intermediate computations.
pub struct VM;

impl VM {
    pub fn execute<T: Scalar>(bytecode: &Bytecode, vars: &[T], stack: &mut Vec<T>) -> CalcResult<T> {
        stack.clear();

        for op in &bytecode.ops {
            match op {
                OpCode::LoadConst(val) => {
                    let value = T::from_f64(*val)
                        .ok_or_else(|| CalcError::Math(format!("constant {val} out of range")))?;
                    stack.push(value);
                }
                OpCode::LoadVar(idx) => {
                    let value = vars
                        .get(*idx)
                        .copied()
                        .ok_or_else(|| CalcError::Parse(format!("variable #{idx} not bound")))?;
                    stack.push(value);
                }
                OpCode::Add => binary(stack, |a, b| a + b)?,
                OpCode::Sub => binary(stack, |a, b| a - b)?,
                OpCode::Mul => binary(stack, |a, b| a * b)?,
                OpCode::Div => binary(stack, |a, b| a / b)?,
                OpCode::Rem => binary(stack, |a, b| a % b)?,
                OpCode::Pow => binary(stack, |a, b| a.powf(b))?,
                OpCode::Neg => {
                    let a = pop(stack)?;
                    stack.push(-a);
                }
                OpCode::Call(func) => {
                    let a = pop(stack)?;
                    stack.push(func.apply(a));
                }
            }
        }

        let result = pop(stack)?;
        if !stack.is_empty() {
            return Err(CalcError::Parse("malformed bytecode".to_string()));
        }
        Ok(result)
    }
}

fn pop<T: Scalar>(stack: &mut Vec<T>) -> CalcResult<T> {
    stack
        .pop()
        .ok_or_else(|| CalcError::Parse("stack underflow".to_string()))
}

fn binary<T: Scalar>(stack: &mut Vec<T>, op: impl Fn(T, T) -> T) -> CalcResult<()> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    stack.push(op(a, b));
    Ok(())
}

// --- AST & Parser ---

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary(Box<Expr>, char, Box<Expr>), // char is operator +, -, *, /, %, ^
    Unary(char, Box<Expr>),             // -
    Call(String, Box<Expr>),            // functions like sin(x)
}

/// Compiles an AST (`Expr`) into `Bytecode`.
/// Resolves variable names to indices and constants to their values.
pub struct Compiler {
    pub var_map: HashMap<String, usize>,
}

impl Compiler {
    pub fn new(var_names: &[String]) -> Self {
        let var_map = var_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { var_map }
    }

    pub fn compile(&self, expr: &Expr) -> CalcResult<Bytecode> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> CalcResult<()> {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Variable(name) => {
                if let Some(&idx) = self.var_map.get(name) {
                    ops.push(OpCode::LoadVar(idx));
                } else if let Some(value) = constant(name) {
                    ops.push(OpCode::LoadConst(value));
                } else {
                    return Err(CalcError::Parse(format!("unknown symbol: {name}")));
                }
            }
            Expr::Binary(left, op, right) => {
                self.compile_recursive(left, ops)?;
                self.compile_recursive(right, ops)?;
                let code = match op {
                    '+' => OpCode::Add,
                    '-' => OpCode::Sub,
                    '*' => OpCode::Mul,
                    '/' => OpCode::Div,
                    '%' => OpCode::Rem,
                    '^' => OpCode::Pow,
                    _ => return Err(CalcError::Parse(format!("unknown binary operator: {op}"))),
                };
                ops.push(code);
            }
            Expr::Unary(op, operand) => {
                self.compile_recursive(operand, ops)?;
                match op {
                    '-' => ops.push(OpCode::Neg),
                    _ => return Err(CalcError::Parse(format!("unknown unary operator: {op}"))),
                }
            }
            Expr::Call(func, arg) => {
                self.compile_recursive(arg, ops)?;
                let func = Function::from_name(func)
                    .ok_or_else(|| CalcError::Parse(format!("unknown function: {func}")))?;
                ops.push(OpCode::Call(func));
            }
        }
        Ok(())
    }
}

// --- Parser ---

/// Parses a string expression into an AST.
pub fn parse(input: &str) -> CalcResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CalcError::Parse("empty expression".to_string()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(CalcError::Parse(format!("unexpected token {token:?}"))),
    }
}

/// Parses and compiles `expression`, binding the given variable names in order.
pub fn compile_expression(expression: &str, var_names: &[String]) -> CalcResult<Bytecode> {
    let parsed = parse(expression)?;
    Compiler::new(var_names).compile(&parsed)
}

/// Evaluates a closed expression (no variables) to a finite value.
pub fn evaluate(expression: &str) -> CalcResult<f64> {
    let code = compile_expression(expression, &[])?;
    let mut stack: Vec<f64> = Vec::with_capacity(16);
    let value = VM::execute(&code, &[], &mut stack)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::Math(format!("{expression} has no finite value")))
    }
}

/// The in-crate implementation of the `Evaluator` contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator;

impl Evaluator for ExpressionEvaluator {
    fn evaluate(&self, expression: &str) -> CalcResult<f64> {
        evaluate(expression)
    }

    fn format(&self, value: f64, precision: usize) -> String {
        format_precision(value, precision)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> CalcResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Exponent suffix: 1e3, 2.5E-4. A bare `e` after a number is left
            // for the identifier branch (implicit multiplication by Euler's e).
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
                .map_err(|_| CalcError::Parse(format!("invalid number: {literal}")))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Identifier(chars[start..i].iter().collect()));
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '%' => Token::Percent,
                '^' => Token::Caret,
                '!' => Token::Bang,
                '(' => Token::LParen,
                ')' => Token::RParen,
                _ => return Err(CalcError::Parse(format!("unexpected character '{c}'"))),
            };
            tokens.push(token);
            i += 1;
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Upper bound on the depth of the tree built so far.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> CalcResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::Parse("expression nested too deeply".to_string()));
        }
        Ok(())
    }

    fn expect_rparen(&mut self) -> CalcResult<()> {
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            _ => Err(CalcError::Parse("expected ')'".to_string())),
        }
    }

    fn parse_expression(&mut self) -> CalcResult<Expr> {
        let saved = self.depth;
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => '+',
                Some(Token::Minus) => '-',
                _ => break,
            };
            self.consume();
            // Each link of a chain nests the left operand one level deeper.
            self.descend()?;
            let right = self.parse_term()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        self.depth = saved;
        Ok(left)
    }

    fn parse_term(&mut self) -> CalcResult<Expr> {
        let saved = self.depth;
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => '*',
                Some(Token::Slash) => '/',
                Some(Token::Percent) => '%',
                // Juxtaposition such as `2pi` or `3(4+1)` multiplies.
                Some(Token::Number(_) | Token::Identifier(_) | Token::LParen) => {
                    self.descend()?;
                    let right = self.parse_power()?;
                    left = Expr::Binary(Box::new(left), '*', Box::new(right));
                    continue;
                }
                _ => break,
            };
            self.consume();
            self.descend()?;
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        self.depth = saved;
        Ok(left)
    }

    fn parse_unary(&mut self) -> CalcResult<Expr> {
        self.descend()?;
        let expr = self.parse_signed()?;
        self.depth -= 1;
        Ok(expr)
    }

    fn parse_signed(&mut self) -> CalcResult<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary('-', Box::new(expr)))
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> CalcResult<Expr> {
        let base = self.parse_postfix()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            // Right-associative, and the exponent may carry its own sign: 2^-3.
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(Box::new(base), '^', Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> CalcResult<Expr> {
        let saved = self.depth;
        let mut expr = self.parse_primary()?;
        while let Some(Token::Bang) = self.peek() {
            self.consume();
            self.descend()?;
            expr = Expr::Call("factorial".to_string(), Box::new(expr));
        }
        self.depth = saved;
        Ok(expr)
    }

    fn parse_primary(&mut self) -> CalcResult<Expr> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.consume(); // eat '('
                    let arg = self.parse_expression()?;
                    self.expect_rparen()?;
                    Ok(Expr::Call(name, Box::new(arg)))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            Some(token) => Err(CalcError::Parse(format!("unexpected token {token:?}"))),
            None => Err(CalcError::Parse("unexpected end of expression".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(expression: &str, expected: f64) {
        let value = evaluate(expression).expect("expression should evaluate");
        assert!(
            (value - expected).abs() < 1e-9,
            "{expression} = {value}, expected {expected}"
        );
    }

    #[test]
    fn respects_operator_precedence() {
        approx("2+3*4", 14.0);
        approx("(2+3)*4", 20.0);
        approx("10-4-3", 3.0);
        approx("2^3^2", 512.0);
        approx("-2^2", -4.0);
        approx("2^-1", 0.5);
        approx("7%4", 3.0);
    }

    #[test]
    fn evaluates_functions_and_constants() {
        approx("sin(0)", 0.0);
        approx("cos(pi)", -1.0);
        approx("sqrt(16)", 4.0);
        approx("log(e)", 1.0);
        approx("log10(1000)", 3.0);
        approx("exp(0)", 1.0);
        approx("factorial(5)", 120.0);
        approx("4!", 24.0);
    }

    #[test]
    fn supports_implicit_multiplication_and_exponents() {
        approx("2pi", 2.0 * std::f64::consts::PI);
        approx("3(4+1)", 15.0);
        approx("2sin(0)", 0.0);
        approx("1e3", 1000.0);
        approx("2.5E-1", 0.25);
        approx("2e", 2.0 * std::f64::consts::E);
    }

    #[test]
    fn rejects_malformed_syntax() {
        assert!(matches!(evaluate("2+"), Err(CalcError::Parse(_))));
        assert!(matches!(evaluate("(1+2"), Err(CalcError::Parse(_))));
        assert!(matches!(evaluate("1+2)"), Err(CalcError::Parse(_))));
        assert!(matches!(evaluate("1.2.3"), Err(CalcError::Parse(_))));
        assert!(matches!(evaluate("2 # 3"), Err(CalcError::Parse(_))));
        assert!(matches!(evaluate(""), Err(CalcError::Parse(_))));
        assert!(matches!(evaluate("foo(2)"), Err(CalcError::Parse(_))));
        assert!(matches!(evaluate("x+1"), Err(CalcError::Parse(_))));
    }

    #[test]
    fn non_finite_results_are_math_errors() {
        assert!(matches!(evaluate("1/0"), Err(CalcError::Math(_))));
        assert!(matches!(evaluate("sqrt(-1)"), Err(CalcError::Math(_))));
        assert!(matches!(evaluate("factorial(-1)"), Err(CalcError::Math(_))));
        assert!(matches!(evaluate("factorial(2.5)"), Err(CalcError::Math(_))));
    }

    #[test]
    fn deep_nesting_is_a_parse_error() {
        let nested = format!("{}1{}", "sin(".repeat(20_000), ")".repeat(20_000));
        assert!(matches!(evaluate(&nested), Err(CalcError::Parse(_))));

        let unclosed = format!("{}1", "(".repeat(20_000));
        assert!(matches!(evaluate(&unclosed), Err(CalcError::Parse(_))));

        let negations = format!("{}1", "-".repeat(20_000));
        assert!(matches!(evaluate(&negations), Err(CalcError::Parse(_))));

        let chain = vec!["1"; 20_000].join("+");
        assert!(matches!(evaluate(&chain), Err(CalcError::Parse(_))));

        let bangs = format!("3{}", "!".repeat(20_000));
        assert!(matches!(evaluate(&bangs), Err(CalcError::Parse(_))));
    }

    #[test]
    fn moderate_nesting_still_evaluates() {
        approx(&format!("{}2{}", "(".repeat(50), ")".repeat(50)), 2.0);
        approx(&vec!["1"; 100].join("+"), 100.0);
        approx(&format!("{}0{}", "sin(".repeat(40), ")".repeat(40)), 0.0);
    }

    #[test]
    fn compiled_variables_bind_by_position() {
        let vars = vec!["x".to_string(), "y".to_string()];
        let code = compile_expression("x*10 + y", &vars).expect("should compile");
        let mut stack = Vec::new();
        let value = VM::execute(&code, &[2.0, 3.0], &mut stack).expect("should run");
        assert_eq!(value, 23.0);
    }

    #[test]
    fn evaluator_trait_formats_to_precision() {
        let evaluator = ExpressionEvaluator;
        let value = evaluator.evaluate("1/3").expect("should evaluate");
        assert_eq!(evaluator.format(value, 10), "0.3333333333");
    }
}
