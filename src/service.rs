//! Cart operations over the store and remote collaborator seams.
//!
//! All dependencies are constructor-injected; nothing here touches ambient
//! process state. Each operation validates its input before any storage
//! access and maps missing entities to [`CartError::NotFound`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::{CouponLookup, ProductCatalog};
use crate::error::CartError;
use crate::model::{CartLine, CartUpsert, CartView, QuantityChange};
use crate::pricing::price_cart;
use crate::store::CartStore;

/// Maximum stored coupon code length.
pub const MAX_COUPON_CODE_LEN: usize = 30;

pub struct CartService {
    store: Arc<dyn CartStore>,
    products: Arc<dyn ProductCatalog>,
    coupons: Arc<dyn CouponLookup>,
}

impl CartService {
    pub fn new(
        store: Arc<dyn CartStore>,
        products: Arc<dyn ProductCatalog>,
        coupons: Arc<dyn CouponLookup>,
    ) -> Self {
        Self {
            store,
            products,
            coupons,
        }
    }

    /// Compute the priced cart for a user.
    ///
    /// A user with no stored cart gets an empty priced view, not an error.
    /// The product catalog and the coupon (when a code is stored) are
    /// fetched concurrently; the discount calculation waits on both.
    pub async fn cart_for_user(&self, user_id: &str) -> Result<CartView, CartError> {
        let Some(header) = self.store.header_for_user(user_id)? else {
            debug!(user_id, "no stored cart, returning empty view");
            return Ok(CartView::empty_for_user(user_id));
        };

        let lines = self.store.lines_for_header(header.id)?;
        let code = header.active_coupon_code().map(str::to_string);

        let (products, coupon) = tokio::join!(self.products.fetch_all(), async {
            match code.as_deref() {
                Some(code) => self.coupons.fetch(code).await,
                None => None,
            }
        });

        let view = price_cart(&header, &lines, &products, coupon.as_ref());
        info!(
            user_id,
            items = view.items.len(),
            cart_total = view.header.cart_total,
            "cart priced"
        );
        Ok(view)
    }

    /// Create or merge a line item according to the upsert protocol.
    ///
    /// - no header for the user: create header, then the first line;
    /// - header but no line for the product: create the line;
    /// - existing line + [`QuantityChange::Set`]: absolute count overwrite
    ///   of that specific row;
    /// - existing line + [`QuantityChange::Add`]: additive merge into the
    ///   existing row, identity reused.
    pub fn upsert_line(&self, request: &CartUpsert) -> Result<CartLine, CartError> {
        if request.user_id.trim().is_empty() {
            return Err(CartError::validation("user id is required"));
        }

        let change = request.change;
        let Some(header) = self.store.header_for_user(&request.user_id)? else {
            let header = self
                .store
                .insert_header(&request.user_id, request.coupon_code.clone())?;
            let line = self
                .store
                .insert_line(header.id, change.product_id(), change.count())?;
            info!(user_id = %request.user_id, header_id = header.id, "created new cart");
            return Ok(line);
        };

        let Some(existing) = self
            .store
            .line_for_product(header.id, change.product_id())?
        else {
            let line = self
                .store
                .insert_line(header.id, change.product_id(), change.count())?;
            info!(user_id = %request.user_id, product_id = change.product_id(), "added product to existing cart");
            return Ok(line);
        };

        match change {
            QuantityChange::Set { line_id, count, .. } => {
                match self.store.set_line_count(line_id, count)? {
                    Some(line) => {
                        info!(user_id = %request.user_id, line_id, count, "set line quantity");
                        Ok(line)
                    }
                    None => Err(CartError::not_found("cart item not found")),
                }
            }
            QuantityChange::Add { count, .. } => {
                let merged = existing.count.saturating_add(count);
                let line = self
                    .store
                    .set_line_count(existing.id, merged)?
                    .ok_or_else(|| CartError::not_found("cart item not found"))?;
                info!(user_id = %request.user_id, line_id = existing.id, count = merged, "merged line quantity");
                Ok(line)
            }
        }
    }

    /// Delete a line item; when it was the last line under its header,
    /// delete the header too. The count is taken before the delete, so a
    /// count of one means "this was the last item".
    pub fn remove_line(&self, line_id: u64) -> Result<(), CartError> {
        let Some(line) = self.store.line_by_id(line_id)? else {
            return Err(CartError::not_found("cart item not found"));
        };

        let count_before = self.store.count_lines(line.header_id)?;
        self.store.delete_line(line_id)?;

        if count_before == 1 {
            self.store.delete_header(line.header_id)?;
            info!(header_id = line.header_id, "removed last item, cart deleted");
        } else {
            info!(line_id, "removed cart item");
        }
        Ok(())
    }

    /// Attach a coupon code to the user's cart. No validity check happens
    /// here; qualification is evaluated at pricing time.
    pub fn apply_coupon(&self, user_id: &str, coupon_code: &str) -> Result<(), CartError> {
        let coupon_code = coupon_code.trim();
        if coupon_code.is_empty() {
            return Err(CartError::validation("coupon code is required"));
        }
        if coupon_code.len() > MAX_COUPON_CODE_LEN {
            return Err(CartError::validation(format!(
                "coupon code exceeds {MAX_COUPON_CODE_LEN} characters"
            )));
        }

        let Some(header) = self.store.header_for_user(user_id)? else {
            return Err(CartError::not_found("cart not found"));
        };

        self.store
            .set_coupon(header.id, Some(coupon_code.to_string()))?;
        info!(user_id, coupon_code, "coupon applied");
        Ok(())
    }

    /// Clear the coupon code from the user's cart.
    pub fn remove_coupon(&self, user_id: &str) -> Result<(), CartError> {
        let Some(header) = self.store.header_for_user(user_id)? else {
            return Err(CartError::not_found("cart not found"));
        };

        self.store.set_coupon(header.id, None)?;
        info!(user_id, "coupon removed");
        Ok(())
    }

    /// Number of line items under the user's cart; zero without a header.
    pub fn count_items(&self, user_id: &str) -> Result<usize, CartError> {
        match self.store.header_for_user(user_id)? {
            Some(header) => Ok(self.store.count_lines(header.id)?),
            None => Ok(0),
        }
    }
}
