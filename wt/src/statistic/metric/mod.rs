/// Calmar Ratio: excess return over maximum drawdown.
pub mod calmar;

/// Drawdown, maximum drawdown, and mean drawdown generators.
pub mod drawdown;

/// Profit Factor: gross profit over gross loss.
pub mod profit_factor;

/// Linear-scaling Rate of Return.
pub mod rate_of_return;

/// Sharpe Ratio: excess return over total volatility.
pub mod sharpe;

/// Sortino Ratio: excess return over downside volatility.
pub mod sortino;

/// Win Rate: fraction of closed trades that were profitable.
pub mod win_rate;

pub use calmar::CalmarRatio;
pub use drawdown::{Drawdown, DrawdownGenerator};
pub use profit_factor::ProfitFactor;
pub use rate_of_return::RateOfReturn;
pub use sharpe::SharpeRatio;
pub use sortino::SortinoRatio;
pub use win_rate::WinRate;
