//! # Cart Store
//!
//! Owns the current [`Cart`] value and persists it after every committed
//! transition.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CartStore::dispatch                              │
//! │                                                                         │
//! │   CartAction ──► Cart::apply (pure) ──┬── Err ──► cart unchanged        │
//! │                                       │                                 │
//! │                                       └── Ok(next) ──► commit           │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                          CartStorage::save(lines)       │
//! │                                                                         │
//! │   Startup: CartStorage::load ──► Cart::from_lines (verbatim)            │
//! │            corrupt file ──► warn + empty cart                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use stockroom_core::{Cart, CartAction, CartLine, Money, Product};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Storage
// =============================================================================

/// Where the cart lines live between runs.
pub trait CartStorage {
    /// Returns the stored lines, or `None` when nothing was stored yet.
    fn load(&self) -> ClientResult<Option<Vec<CartLine>>>;

    /// Replaces the stored lines.
    fn save(&self, lines: &[CartLine]) -> ClientResult<()>;
}

/// JSON file storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for FileStorage {
    fn load(&self) -> ClientResult<Option<Vec<CartLine>>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let lines = serde_json::from_str(&raw)
            .map_err(|e| ClientError::Storage(format!("{}: {e}", self.path.display())))?;
        Ok(Some(lines))
    }

    fn save(&self, lines: &[CartLine]) -> ClientResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let json = serde_json::to_vec_pretty(lines)
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        // Readers only ever see a complete file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    lines: Mutex<Option<Vec<CartLine>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with lines already stored.
    pub fn with_lines(lines: Vec<CartLine>) -> Self {
        MemoryStorage {
            lines: Mutex::new(Some(lines)),
        }
    }

    /// What was last saved.
    pub fn saved(&self) -> Option<Vec<CartLine>> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> ClientResult<Option<Vec<CartLine>>> {
        Ok(self.saved())
    }

    fn save(&self, lines: &[CartLine]) -> ClientResult<()> {
        *self
            .lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(lines.to_vec());
        Ok(())
    }
}

// =============================================================================
// Store
// =============================================================================

/// The cart plus its persistence hook.
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    cart: Cart,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Opens the store, restoring whatever the storage holds.
    ///
    /// Lines are restored verbatim; they are not re-checked against current
    /// stock until checkout.
    pub fn open(storage: S) -> Self {
        let cart = match storage.load() {
            Ok(Some(lines)) => {
                debug!(lines = lines.len(), "Restored stored cart");
                Cart::from_lines(lines)
            }
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Stored cart unreadable, starting empty");
                Cart::new()
            }
        };

        CartStore { cart, storage }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Applies an action. On rejection the cart is left as it was.
    pub fn dispatch(&mut self, action: CartAction) -> ClientResult<&Cart> {
        let next = self.cart.apply(action)?;
        self.cart = next;

        // The transition stays committed even if it could not be written
        if let Err(e) = self.storage.save(self.cart.lines()) {
            warn!(error = %e, "Failed to persist cart");
        }

        Ok(&self.cart)
    }

    pub fn add(&mut self, product: Product, quantity: i64) -> ClientResult<&Cart> {
        let name = product.name.clone();
        let cart = self.dispatch(CartAction::Add { product, quantity })?;
        info!(product = %name, quantity, "Added to cart");
        Ok(cart)
    }

    pub fn remove(&mut self, line_id: &str) -> ClientResult<&Cart> {
        self.dispatch(CartAction::Remove {
            line_id: line_id.to_string(),
        })
    }

    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> ClientResult<&Cart> {
        self.dispatch(CartAction::UpdateQuantity {
            line_id: line_id.to_string(),
            quantity,
        })
    }

    pub fn clear(&mut self) -> ClientResult<&Cart> {
        self.dispatch(CartAction::Clear)
    }

    pub fn subtotal(&self) -> Money {
        self.cart.subtotal()
    }

    /// Checks the cart is ready for checkout.
    pub fn validate(&self) -> ClientResult<()> {
        self.cart.validate().map_err(ClientError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockroom_core::CartError;

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category_id: "cat-1".to_string(),
            image_url: "https://img.example.com/p.jpg".to_string(),
            price_cents,
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_persists_lines() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add(product("p1", 2000, 10), 3).unwrap();

        assert_eq!(store.subtotal().cents(), 6000);
        let saved = store.storage().saved().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].quantity, 3);
        assert_eq!(saved[0].price_cents, 6000);
    }

    #[test]
    fn test_rejected_add_leaves_cart_and_storage_unchanged() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add(product("p1", 2000, 10), 3).unwrap();

        let err = store.add(product("p1", 2000, 10), 8).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Cart(CartError::AddExceedsStock { requested: 8, remaining: 7 })
        ));
        assert_eq!(store.cart().total_quantity(), 3);
        assert_eq!(store.storage().saved().unwrap()[0].quantity, 3);

        assert!(store.add(product("p2", 100, 5), 0).is_err());
        assert_eq!(store.cart().lines().len(), 1);
    }

    #[test]
    fn test_update_remove_clear() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add(product("p1", 2000, 10), 1).unwrap();
        store.add(product("p2", 500, 4), 2).unwrap();

        store.update_quantity("p1", 5).unwrap();
        assert_eq!(store.cart().line("p1").unwrap().price_cents, 10_000);
        assert!(store.update_quantity("p1", 11).is_err());

        store.remove("p2").unwrap();
        assert!(store.remove("p2").is_err());

        store.clear().unwrap();
        assert!(store.cart().is_empty());
        assert_eq!(store.storage().saved(), Some(vec![]));
    }

    #[test]
    fn test_open_restores_stale_lines_verbatim() {
        let mut stale = product("p1", 2000, 10);
        stale.stock = 2;
        let line = CartLine {
            id: "p1".to_string(),
            product: stale,
            quantity: 5,
            price_cents: 10_000,
        };

        let store = CartStore::open(MemoryStorage::with_lines(vec![line]));
        assert_eq!(store.cart().total_quantity(), 5);
        assert!(matches!(
            store.validate(),
            Err(ClientError::Cart(CartError::NotEnoughStock { available: 2, .. }))
        ));
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cart.json");

        let mut store = CartStore::open(FileStorage::new(&path));
        assert!(store.cart().is_empty());
        store.add(product("p1", 2000, 10), 3).unwrap();

        let reopened = CartStore::open(FileStorage::new(&path));
        assert_eq!(reopened.cart(), store.cart());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(FileStorage::new(&path).load().is_err());
        let store = CartStore::open(FileStorage::new(&path));
        assert!(store.cart().is_empty());
    }
}
