use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    /// Input rejected before any market data is requested
    #[error("{0}")]
    Validation(String),
}

impl PortfolioError {
    pub fn validation(message: impl Into<String>) -> Self {
        PortfolioError::Validation(message.into())
    }
}
