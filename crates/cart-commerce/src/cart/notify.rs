//! Shopper-facing notices for failed cart operations.

use std::fmt;

/// One of the fixed messages shown when a cart operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// Requested quantity exceeds the stock.
    OutOfStock,
    /// Adding a product failed.
    AddFailed,
    /// Removing a product failed.
    RemoveFailed,
    /// Changing a quantity failed.
    UpdateFailed,
}

impl Notice {
    /// The message text.
    pub fn message(&self) -> &'static str {
        match self {
            Self::OutOfStock => "requested quantity out of stock",
            Self::AddFailed => "error adding product",
            Self::RemoveFailed => "error removing product",
            Self::UpdateFailed => "error updating product quantity",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Display surface for notices (a toast, a status line, a log).
pub trait Notifier: Send + Sync {
    /// Show a notice.
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(notice = %notice, "cart notice");
    }
}
