//! Per-user cart persisted to the key-value store.

use crate::core::cache::{KeyValueCollection, get_json, put_json};
use crate::core::cart::{self, CartAction, CartLine, LineKey};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

pub const CART_KEY_PREFIX: &str = "agumiya_cart_";
pub const GUEST_USER: &str = "guest";

/// Storage key for a user's cart, `agumiya_cart_guest` when nobody is signed in.
pub fn cart_storage_key(user: &str) -> String {
    format!("{CART_KEY_PREFIX}{user}")
}

fn user_or_guest(user: Option<&str>) -> String {
    user.map(str::trim)
        .filter(|user| !user.is_empty())
        .unwrap_or(GUEST_USER)
        .to_string()
}

struct CartState {
    user: String,
    lines: Vec<CartLine>,
}

/// Cart of the active user. Every mutation goes through [`CartStore::dispatch`],
/// which reduces and writes the full line list back under the user's key.
pub struct CartStore {
    storage: Arc<dyn KeyValueCollection>,
    state: Mutex<CartState>,
}

impl CartStore {
    pub async fn load(storage: Arc<dyn KeyValueCollection>, user: Option<&str>) -> Self {
        let user = user_or_guest(user);
        let lines = Self::read_lines(storage.as_ref(), &user).await;
        Self {
            storage,
            state: Mutex::new(CartState { user, lines }),
        }
    }

    async fn read_lines(storage: &dyn KeyValueCollection, user: &str) -> Vec<CartLine> {
        let lines: Vec<CartLine> = get_json(storage, &cart_storage_key(user))
            .await
            .unwrap_or_default();
        // Stored data is not trusted to uphold the quantity invariant.
        let lines: Vec<CartLine> = lines.into_iter().filter(|l| l.quantity > 0).collect();
        debug!(user, lines = lines.len(), "Loaded cart");
        lines
    }

    async fn write_lines(&self, user: &str, lines: &[CartLine]) {
        if let Err(e) = put_json(self.storage.as_ref(), &cart_storage_key(user), &lines, None).await
        {
            error!(user, error = %e, "Failed to persist cart");
        }
    }

    pub async fn dispatch(&self, action: CartAction) -> Vec<CartLine> {
        let mut state = self.state.lock().await;
        debug!(user = %state.user, ?action, "Cart action");
        cart::reduce(&mut state.lines, action);
        self.write_lines(&state.user, &state.lines).await;
        state.lines.clone()
    }

    pub async fn add(&self, line: CartLine) -> Vec<CartLine> {
        self.dispatch(CartAction::Add(line)).await
    }

    pub async fn remove(&self, key: LineKey) -> Vec<CartLine> {
        self.dispatch(CartAction::Remove(key)).await
    }

    pub async fn set_quantity(&self, key: LineKey, quantity: i64) -> Vec<CartLine> {
        self.dispatch(CartAction::SetQuantity(key, quantity)).await
    }

    pub async fn clear(&self) -> Vec<CartLine> {
        self.dispatch(CartAction::Clear).await
    }

    /// Saves the current cart under the old user and loads the new user's cart.
    pub async fn switch_user(&self, user: Option<&str>) -> Vec<CartLine> {
        let user = user_or_guest(user);
        let mut state = self.state.lock().await;
        if state.user == user {
            return state.lines.clone();
        }
        self.write_lines(&state.user, &state.lines).await;
        let lines = Self::read_lines(self.storage.as_ref(), &user).await;
        debug!(from = %state.user, to = %user, "Switched cart user");
        *state = CartState {
            user,
            lines: lines.clone(),
        };
        lines
    }

    pub async fn active_user(&self) -> String {
        self.state.lock().await.user.clone()
    }

    pub async fn lines(&self) -> Vec<CartLine> {
        self.state.lock().await.lines.clone()
    }

    pub async fn item_count(&self) -> u64 {
        cart::item_count(&self.state.lock().await.lines)
    }

    /// Sum of line totals in the base currency.
    pub async fn subtotal(&self) -> f64 {
        cart::subtotal(&self.state.lock().await.lines)
    }
}
