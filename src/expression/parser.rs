//! 递归下降解析器
//! 优先级：WITH > AND > OR，运算符不区分大小写
use super::{ExpressionError, LicenseExpression};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Symbol(String),
    And,
    Or,
    With,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Symbol(s) => s.clone(),
            Token::And => "AND".into(),
            Token::Or => "OR".into(),
            Token::With => "WITH".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

/// (token, 在输入中的字符位置)
fn lex(input: &str) -> Vec<(Token, usize)> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push((Token::LParen, pos));
                chars.next();
            }
            ')' => {
                tokens.push((Token::RParen, pos));
                chars.next();
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "with" => Token::With,
                    _ => Token::Symbol(word),
                };
                tokens.push((token, pos));
            }
        }
    }
    tokens
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.cursor).map_or(0, |(_, p)| *p)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|(t, _)| t.clone());
        self.cursor += 1;
        token
    }

    fn unexpected(&self) -> ExpressionError {
        match self.peek() {
            Some(token) => ExpressionError::UnexpectedToken {
                token: token.describe(),
                position: self.position(),
            },
            None => ExpressionError::UnexpectedEnd,
        }
    }

    fn parse_or(&mut self) -> Result<LicenseExpression, ExpressionError> {
        let mut operands = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.advance();
            operands.push(self.parse_and()?);
        }
        Ok(group(operands, false))
    }

    fn parse_and(&mut self) -> Result<LicenseExpression, ExpressionError> {
        let mut operands = vec![self.parse_with()?];
        while self.peek() == Some(&Token::And) {
            self.advance();
            operands.push(self.parse_with()?);
        }
        Ok(group(operands, true))
    }

    fn parse_with(&mut self) -> Result<LicenseExpression, ExpressionError> {
        let base = self.parse_primary()?;
        if self.peek() != Some(&Token::With) {
            return Ok(base);
        }
        self.advance();
        let license = match base {
            LicenseExpression::Symbol(license) => license,
            other => return Err(ExpressionError::InvalidWith(other.render())),
        };
        match self.advance() {
            Some(Token::Symbol(exception)) => Ok(LicenseExpression::With { license, exception }),
            Some(other) => Err(ExpressionError::InvalidWith(format!(
                "{} WITH {}",
                license,
                other.describe()
            ))),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn parse_primary(&mut self) -> Result<LicenseExpression, ExpressionError> {
        match self.peek() {
            Some(Token::Symbol(_)) => match self.advance() {
                Some(Token::Symbol(key)) => Ok(LicenseExpression::Symbol(key)),
                _ => Err(ExpressionError::UnexpectedEnd),
            },
            Some(Token::LParen) => {
                let open_at = self.position();
                self.advance();
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExpressionError::UnbalancedParenthesis(open_at)),
                }
            }
            _ => Err(self.unexpected()),
        }
    }
}

/// 构造分组，同类运算符的子分组直接展开
fn group(operands: Vec<LicenseExpression>, is_and: bool) -> LicenseExpression {
    if operands.len() == 1 {
        return operands.into_iter().next().unwrap_or(LicenseExpression::Or(Vec::new()));
    }
    let mut flat = Vec::with_capacity(operands.len());
    for operand in operands {
        match (operand, is_and) {
            (LicenseExpression::And(inner), true) | (LicenseExpression::Or(inner), false) => {
                flat.extend(inner)
            }
            (other, _) => flat.push(other),
        }
    }
    if is_and {
        LicenseExpression::And(flat)
    } else {
        LicenseExpression::Or(flat)
    }
}

pub(super) fn parse(input: &str) -> Result<LicenseExpression, ExpressionError> {
    let tokens = lex(input);
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }
    let mut parser = Parser { tokens, cursor: 0 };
    let expression = parser.parse_or()?;
    if parser.cursor < parser.tokens.len() {
        return Err(match parser.peek() {
            Some(Token::RParen) => ExpressionError::UnbalancedParenthesis(parser.position()),
            _ => parser.unexpected(),
        });
    }
    Ok(expression)
}
