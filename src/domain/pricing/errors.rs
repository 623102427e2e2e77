// ============================================================================
// Cart Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    QuantityBelowOne,

    #[error("only {stock} of {product_id} in stock, {requested} requested")]
    ExceedsStock {
        product_id: String,
        requested: u32,
        stock: u32,
    },

    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("{0} is not in the cart")]
    NotInCart(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("{0} overflows the money range")]
    Overflow(&'static str),
}
