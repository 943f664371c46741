//! Sink trait for line-oriented log destinations

use super::error::Result;

/// A destination that receives each dispatched message as one line.
///
/// Implementations add their own line termination.
pub trait Sink: Send + Sync {
    fn write_line(&self, line: &str) -> Result<()>;
    fn name(&self) -> &str;
}
