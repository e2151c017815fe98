//! Cart commands: show, add, remove, set.

use anyhow::Result;
use cart_commerce::{CartOutcome, CartStore, ProductId, UpdateProductAmount};

use super::{ProductArgs, SetArgs};
use crate::context::Context;

/// Print the saved cart.
pub async fn show(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    ctx.output.cart(&store.cart());
    Ok(())
}

/// Add one unit of a product.
pub async fn add(args: ProductArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;

    let pb = ctx
        .output
        .spinner(&format!("Checking stock for product {}...", args.id));
    let result = store.add_product(args.id).await;
    pb.finish_and_clear();

    let outcome = result?;
    ctx.output.success(&format!("Added product {}", args.id));
    render(ctx, &store, &outcome);
    Ok(())
}

/// Drop a product from the cart.
pub async fn remove(args: ProductArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;

    let outcome = store.remove_product(args.id).await?;
    ctx.output.success(&format!("Removed product {}", args.id));
    render(ctx, &store, &outcome);
    Ok(())
}

/// Set the quantity of a product already in the cart.
pub async fn set(args: SetArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let request = UpdateProductAmount {
        product_id: args.id,
        amount: args.amount,
    };

    let pb = ctx
        .output
        .spinner(&format!("Checking stock for product {}...", args.id));
    let result = store.update_product_amount(request).await;
    pb.finish_and_clear();

    let outcome = result?;
    match outcome {
        CartOutcome::Committed(_) => ctx
            .output
            .success(&format!("Product {} quantity set to {}", args.id, args.amount)),
        CartOutcome::Unchanged => ctx.output.warn(&quantity_ignored(args.id, args.amount)),
    }
    render(ctx, &store, &outcome);
    Ok(())
}

fn render(ctx: &Context, store: &CartStore, outcome: &CartOutcome) {
    match outcome.committed() {
        Some(cart) => ctx.output.cart(cart),
        None => ctx.output.cart(&store.cart()),
    }
}

fn quantity_ignored(id: ProductId, amount: i64) -> String {
    format!(
        "Quantity {} for product {} is below 1, cart unchanged",
        amount, id
    )
}
