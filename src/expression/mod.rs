//! 许可证表达式引擎
//! 解析 `mit OR (apache-2.0 AND bsd-new)`、`gpl-2.0 WITH classpath-exception-2.0` 这类布尔表达式，
//! 提供规范化渲染、等价判断、包含判断以及原子许可证 key 提取
mod parser;

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// 表达式解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("empty license expression")]
    Empty,

    #[error("unexpected token {token:?} at position {position}")]
    UnexpectedToken { token: String, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parenthesis at position {0}")]
    UnbalancedParenthesis(usize),

    #[error("WITH must join a license key and an exception key, found: {0}")]
    InvalidWith(String),
}

/// 不可变的许可证表达式值
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LicenseExpression {
    /// 原子许可证 key
    Symbol(String),
    /// 许可证 + 例外条款，整体视为一个原子
    With { license: String, exception: String },
    /// 合取：需同时满足
    And(Vec<LicenseExpression>),
    /// 析取：任选其一
    Or(Vec<LicenseExpression>),
}

impl LicenseExpression {
    /// 规范化字符串形式：运算符大写，不同运算符的嵌套子表达式加括号
    pub fn render(&self) -> String {
        self.render_nested(false)
    }

    fn render_nested(&self, nested: bool) -> String {
        match self {
            LicenseExpression::Symbol(key) => key.clone(),
            LicenseExpression::With { license, exception } => {
                format!("{} WITH {}", license, exception)
            }
            LicenseExpression::And(args) => Self::render_group(args, " AND ", nested),
            LicenseExpression::Or(args) => Self::render_group(args, " OR ", nested),
        }
    }

    fn render_group(args: &[LicenseExpression], operator: &str, nested: bool) -> String {
        let joined = args
            .iter()
            .map(|arg| arg.render_nested(true))
            .collect::<Vec<_>>()
            .join(operator);
        if nested {
            format!("({})", joined)
        } else {
            joined
        }
    }

    /// 按出现顺序返回所有原子 key（WITH 的两侧都计入）
    pub fn license_keys(&self, unique: bool) -> Vec<String> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        if unique {
            let mut seen = BTreeSet::new();
            keys.retain(|k| seen.insert(k.clone()));
        }
        keys
    }

    fn collect_keys(&self, keys: &mut Vec<String>) {
        match self {
            LicenseExpression::Symbol(key) => keys.push(key.clone()),
            LicenseExpression::With { license, exception } => {
                keys.push(license.clone());
                keys.push(exception.clone());
            }
            LicenseExpression::And(args) | LicenseExpression::Or(args) => {
                for arg in args {
                    arg.collect_keys(keys);
                }
            }
        }
    }

    fn args(&self) -> &[LicenseExpression] {
        match self {
            LicenseExpression::And(args) | LicenseExpression::Or(args) => args,
            _ => &[],
        }
    }

    /// 规范化：展平同类嵌套、子项排序去重、单元素分组折叠
    pub fn normalized(&self) -> LicenseExpression {
        match self {
            LicenseExpression::And(args) => {
                Self::normalize_group(args, true)
            }
            LicenseExpression::Or(args) => {
                Self::normalize_group(args, false)
            }
            atom => atom.clone(),
        }
    }

    fn normalize_group(args: &[LicenseExpression], is_and: bool) -> LicenseExpression {
        let mut flat = BTreeSet::new();
        for arg in args {
            match (arg.normalized(), is_and) {
                (LicenseExpression::And(inner), true) | (LicenseExpression::Or(inner), false) => {
                    flat.extend(inner)
                }
                (other, _) => {
                    flat.insert(other);
                }
            }
        }
        let mut flat: Vec<_> = flat.into_iter().collect();
        if flat.len() == 1 {
            return flat.remove(0);
        }
        if is_and {
            LicenseExpression::And(flat)
        } else {
            LicenseExpression::Or(flat)
        }
    }

    /// 析取范式（每个合取项为原子集合）并做吸收化简：去掉包含其它项的超集项
    /// 展开项数超过 `limit` 时放弃，返回 None
    fn absorbed_dnf(&self, limit: usize) -> Option<BTreeSet<BTreeSet<String>>> {
        let terms = self.dnf(limit)?;
        Some(
            terms
                .iter()
                .filter(|term| {
                    !terms
                        .iter()
                        .any(|other| other != *term && other.is_subset(term))
                })
                .cloned()
                .collect(),
        )
    }

    fn dnf(&self, limit: usize) -> Option<BTreeSet<BTreeSet<String>>> {
        match self {
            LicenseExpression::Symbol(_) | LicenseExpression::With { .. } => {
                Some(BTreeSet::from([BTreeSet::from([self.render()])]))
            }
            LicenseExpression::Or(args) => {
                let mut terms = BTreeSet::new();
                for arg in args {
                    terms.extend(arg.dnf(limit)?);
                    if terms.len() > limit {
                        return None;
                    }
                }
                Some(terms)
            }
            LicenseExpression::And(args) => {
                let mut product: BTreeSet<BTreeSet<String>> = BTreeSet::from([BTreeSet::new()]);
                for arg in args {
                    let arg_terms = arg.dnf(limit)?;
                    if product.len().saturating_mul(arg_terms.len()) > limit {
                        return None;
                    }
                    product = product
                        .iter()
                        .flat_map(|left| {
                            arg_terms.iter().map(move |right| {
                                left.union(right).cloned().collect::<BTreeSet<String>>()
                            })
                        })
                        .collect();
                }
                Some(product)
            }
        }
    }

    /// 在规范化的树上逐层做吸收化简，不展开：
    /// `a AND (a OR b)` → `a`，`a OR (a AND b)` → `a`
    fn absorbed(&self) -> LicenseExpression {
        let (args, is_and) = match self {
            LicenseExpression::And(args) => (args, true),
            LicenseExpression::Or(args) => (args, false),
            atom => return atom.clone(),
        };
        let args: Vec<LicenseExpression> = args.iter().map(|a| a.absorbed()).collect();
        let kept: Vec<LicenseExpression> = args
            .iter()
            .filter(|x| !args.iter().any(|y| y != *x && y.absorbs(x, is_and)))
            .cloned()
            .collect();
        Self::normalize_group(&kept, is_and)
    }

    /// 在 AND（`in_and`）或 OR 分组中，`self` 能否吸收同组的 `other`
    /// 要求 `other` 是对偶运算符的分组，且 `self` 的成员都出现在其中
    fn absorbs(&self, other: &LicenseExpression, in_and: bool) -> bool {
        let dual = match (other, in_and) {
            (LicenseExpression::Or(args), true) | (LicenseExpression::And(args), false) => args,
            _ => return false,
        };
        match self {
            LicenseExpression::Symbol(_) | LicenseExpression::With { .. } => dual.contains(self),
            LicenseExpression::And(members) | LicenseExpression::Or(members) => {
                self.is_dual_of(in_and) && members.iter().all(|m| dual.contains(m))
            }
        }
    }

    fn is_dual_of(&self, in_and: bool) -> bool {
        matches!(
            (self, in_and),
            (LicenseExpression::Or(_), true) | (LicenseExpression::And(_), false)
        )
    }
}

impl fmt::Display for LicenseExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// 等价判断时析取范式展开项数上限
const MAX_DNF_TERMS: usize = 256;

/// 表达式引擎句柄，进程内共享一份，按引用传入需要解析表达式的操作
#[derive(Debug, Default, Clone, Copy)]
pub struct Licensing;

impl Licensing {
    pub fn new() -> Self {
        Self
    }

    /// 解析表达式字符串
    pub fn parse(&self, expression: &str) -> Result<LicenseExpression, ExpressionError> {
        parser::parse(expression)
    }

    pub fn render(&self, expression: &LicenseExpression) -> String {
        expression.render()
    }

    /// 两个表达式在布尔意义上是否等价
    /// 析取范式规模可控时按范式比较，否则退回到逐层吸收化简后的结构比较
    pub fn is_equivalent(&self, a: &LicenseExpression, b: &LicenseExpression) -> bool {
        let (a, b) = (a.normalized(), b.normalized());
        if a == b {
            return true;
        }
        match (a.absorbed_dnf(MAX_DNF_TERMS), b.absorbed_dnf(MAX_DNF_TERMS)) {
            (Some(x), Some(y)) => x == y,
            _ => a.absorbed() == b.absorbed(),
        }
    }

    /// `a` 是否包含 `b`
    pub fn contains(&self, a: &LicenseExpression, b: &LicenseExpression) -> bool {
        contains_normalized(&a.normalized(), &b.normalized())
    }

    pub fn license_keys(&self, expression: &LicenseExpression, unique: bool) -> Vec<String> {
        expression.license_keys(unique)
    }
}

fn contains_normalized(a: &LicenseExpression, b: &LicenseExpression) -> bool {
    if a == b {
        return true;
    }
    let same_operator_subset = match (a, b) {
        (LicenseExpression::And(xs), LicenseExpression::And(ys))
        | (LicenseExpression::Or(xs), LicenseExpression::Or(ys)) => {
            ys.iter().all(|y| xs.contains(y))
        }
        _ => false,
    };
    same_operator_subset || a.args().iter().any(|x| contains_normalized(x, b))
}
