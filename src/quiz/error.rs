use thiserror::Error;

use super::expr::Token;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("unexpected token {0:?}")]
    UnexpectedToken(Token),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression depends on x")]
    NotConstant,
    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
    #[error("expression has more than {0} tokens")]
    TooLong(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown setting: {0}")]
    UnknownSetting(String),
    #[error("'range' needs two bounds, e.g. 'range 1 12'")]
    MissingBounds,
}
