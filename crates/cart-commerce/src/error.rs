//! Cart error types.

use cart_cache::CacheError;
use cart_data::FetchError;
use thiserror::Error;

use crate::cart::Notice;
use crate::ids::ProductId;

/// Why a cart operation failed.
///
/// Every variant leaves the cart exactly as it was before the operation.
#[derive(Error, Debug)]
pub enum CartError {
    /// Requested quantity exceeds the available stock.
    #[error("Requested quantity out of stock for product {product_id}: requested {requested}, available {available}")]
    OutOfStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Adding a product failed.
    #[error("Failed to add product {product_id}: {cause}")]
    AddFailed {
        product_id: ProductId,
        #[source]
        cause: FailureCause,
    },

    /// Removing a product failed.
    #[error("Failed to remove product {product_id}: {cause}")]
    RemoveFailed {
        product_id: ProductId,
        #[source]
        cause: FailureCause,
    },

    /// Changing a product's quantity failed.
    #[error("Failed to update amount of product {product_id}: {cause}")]
    UpdateFailed {
        product_id: ProductId,
        #[source]
        cause: FailureCause,
    },
}

/// Underlying reason for a failed add, remove or update.
#[derive(Error, Debug)]
pub enum FailureCause {
    /// The product has no entry in the cart.
    #[error("product is not in the cart")]
    NotInCart,

    /// A product or stock lookup failed.
    #[error("catalog lookup failed: {0}")]
    Catalog(#[from] FetchError),

    /// Writing the cart to storage failed.
    #[error("storage write failed: {0}")]
    Storage(#[from] CacheError),
}

impl CartError {
    pub(crate) fn add_failed(product_id: ProductId, cause: impl Into<FailureCause>) -> Self {
        Self::AddFailed {
            product_id,
            cause: cause.into(),
        }
    }

    pub(crate) fn remove_failed(product_id: ProductId, cause: impl Into<FailureCause>) -> Self {
        Self::RemoveFailed {
            product_id,
            cause: cause.into(),
        }
    }

    pub(crate) fn update_failed(product_id: ProductId, cause: impl Into<FailureCause>) -> Self {
        Self::UpdateFailed {
            product_id,
            cause: cause.into(),
        }
    }

    /// Product the failed operation targeted.
    pub fn product_id(&self) -> ProductId {
        match self {
            Self::OutOfStock { product_id, .. }
            | Self::AddFailed { product_id, .. }
            | Self::RemoveFailed { product_id, .. }
            | Self::UpdateFailed { product_id, .. } => *product_id,
        }
    }

    /// The shopper-facing notice for this failure.
    pub fn notice(&self) -> Notice {
        match self {
            Self::OutOfStock { .. } => Notice::OutOfStock,
            Self::AddFailed { .. } => Notice::AddFailed,
            Self::RemoveFailed { .. } => Notice::RemoveFailed,
            Self::UpdateFailed { .. } => Notice::UpdateFailed,
        }
    }
}
