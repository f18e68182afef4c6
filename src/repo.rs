use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::AppError;
use crate::record::{
    seed_orders, seed_products, seed_users, Order, OrderStatus, Product, Role, User, UserStatus,
};

/// A record a repository can hold. `unique_field` names the field that must
/// not collide across the collection (email for users, SKU for products).
pub trait Entity: Clone + Send + 'static {
    const NAME: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    fn unique_field() -> Option<&'static str> {
        None
    }
    fn unique_value(&self) -> Option<&str> {
        None
    }

    /// Lowercase-searchable text for the service-level search.
    fn haystack(&self) -> Vec<&str>;
}

impl Entity for User {
    const NAME: &'static str = "User";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn unique_field() -> Option<&'static str> {
        Some("email")
    }
    fn unique_value(&self) -> Option<&str> {
        Some(&self.email)
    }
    fn haystack(&self) -> Vec<&str> {
        vec![&self.name, &self.email, self.role.as_str()]
    }
}

impl Entity for Product {
    const NAME: &'static str = "Product";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn unique_field() -> Option<&'static str> {
        Some("SKU")
    }
    fn unique_value(&self) -> Option<&str> {
        Some(&self.sku)
    }
    fn haystack(&self) -> Vec<&str> {
        vec![&self.name, &self.category, &self.sku]
    }
}

impl Entity for Order {
    const NAME: &'static str = "Order";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn haystack(&self) -> Vec<&str> {
        vec![&self.id, &self.customer, &self.product]
    }
}

/// In-memory stand-in for a remote CRUD API. Constructed per instance and
/// seeded explicitly, so tests never share state. Every call that hands out
/// a record hands out a copy; callers cannot reach the stored collection.
pub struct Repo<T> {
    items: Vec<T>,
    id_seq: u64,
}

impl<T: Entity> Repo<T> {
    pub fn new(seed: Vec<T>, id_seq: u64) -> Self {
        Self { items: seed, id_seq }
    }

    pub fn list(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn get(&self, id: &str) -> Result<T, AppError> {
        self.items
            .iter()
            .find(|i| i.id() == id)
            .cloned()
            .ok_or(AppError::NotFound { what: T::NAME })
    }

    pub fn create(&mut self, mut item: T) -> Result<T, AppError> {
        self.check_unique(&item, None)?;
        item.set_id(self.id_seq.to_string());
        self.id_seq += 1;
        self.items.push(item.clone());
        debug!("Created {} {}", T::NAME, item.id());
        Ok(item)
    }

    /// Full-record replacement under an existing id. Uniqueness is
    /// re-validated against everything but the record being replaced.
    pub fn update(&mut self, id: &str, mut updated: T) -> Result<T, AppError> {
        self.check_unique(&updated, Some(id))?;
        let slot = self
            .items
            .iter_mut()
            .find(|i| i.id() == id)
            .ok_or(AppError::NotFound { what: T::NAME })?;
        updated.set_id(id.to_string());
        *slot = updated.clone();
        debug!("Updated {} {}", T::NAME, id);
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<T, AppError> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id() == id)
            .ok_or(AppError::NotFound { what: T::NAME })?;
        let removed = self.items.remove(idx);
        debug!("Deleted {} {}", T::NAME, id);
        Ok(removed)
    }

    pub fn search(&self, query: &str) -> Vec<T> {
        let needle = query.to_lowercase();
        self.items
            .iter()
            .filter(|i| {
                i.haystack()
                    .iter()
                    .any(|h| h.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn check_unique(&self, candidate: &T, skip_id: Option<&str>) -> Result<(), AppError> {
        let (Some(field), Some(value)) = (T::unique_field(), candidate.unique_value()) else {
            return Ok(());
        };
        let collides = self.items.iter().any(|other| {
            skip_id != Some(other.id()) && other.unique_value() == Some(value)
        });
        if collides {
            return Err(AppError::DuplicateKey {
                entity: T::NAME,
                field,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub admins: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductStats {
    pub total: usize,
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub inventory_value: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub revenue: f64,
}

impl Repo<User> {
    pub fn stats(&self) -> UserStats {
        UserStats {
            total: self.items.len(),
            active: self.count_status(UserStatus::Active),
            inactive: self.count_status(UserStatus::Inactive),
            admins: self.items.iter().filter(|u| u.role == Role::Admin).count(),
        }
    }

    fn count_status(&self, status: UserStatus) -> usize {
        self.items.iter().filter(|u| u.status == status).count()
    }
}

impl Repo<Product> {
    pub fn stats(&self) -> ProductStats {
        use crate::record::StockStatus::*;
        let count = |s| self.items.iter().filter(|p| p.status() == s).count();
        ProductStats {
            total: self.items.len(),
            in_stock: count(InStock),
            low_stock: count(LowStock),
            out_of_stock: count(OutOfStock),
            inventory_value: self.items.iter().map(|p| p.price * p.stock as f64).sum(),
        }
    }
}

impl Repo<Order> {
    /// Status transition from the orders screen. The first time an order
    /// completes, the delivery date is stamped with the given day.
    pub fn set_status(
        &mut self,
        id: &str,
        status: OrderStatus,
        today: NaiveDate,
    ) -> Result<Order, AppError> {
        let order = self
            .items
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(AppError::NotFound { what: Order::NAME })?;
        order.status = status;
        if status == OrderStatus::Completed && order.delivered.is_none() {
            order.delivered = Some(today);
        }
        Ok(order.clone())
    }

    /// Newest orders first, by order date.
    pub fn recent(&self, limit: usize) -> Vec<Order> {
        let mut sorted = self.items.clone();
        sorted.sort_by(|a, b| b.placed.cmp(&a.placed));
        sorted.truncate(limit);
        sorted
    }

    pub fn stats(&self) -> OrderStats {
        let count = |s| self.items.iter().filter(|o| o.status == s).count();
        OrderStats {
            total: self.items.len(),
            pending: count(OrderStatus::Pending),
            processing: count(OrderStatus::Processing),
            completed: count(OrderStatus::Completed),
            cancelled: count(OrderStatus::Cancelled),
            revenue: self
                .items
                .iter()
                .filter(|o| o.status == OrderStatus::Completed)
                .map(|o| o.total)
                .sum(),
        }
    }
}

// -------------------------------- auth ---------------------------------- //

/// The signed-in identity, persisted with the session. Never carries the
/// password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Profile,
}

struct Account {
    profile: Profile,
    password: String,
}

/// Mock credential check against a fixed account list.
pub struct AuthService {
    accounts: Vec<Account>,
    token_seq: u64,
}

impl AuthService {
    pub fn seeded() -> Self {
        let account = |id: &str, name: &str, email: &str, role, password: &str| Account {
            profile: Profile {
                id: id.into(),
                name: name.into(),
                email: email.into(),
                role,
            },
            password: password.into(),
        };
        Self {
            accounts: vec![
                account("1", "Admin User", "admin@example.com", Role::Admin, "admin123"),
                account("2", "John Doe", "john@example.com", Role::User, "john123"),
            ],
            token_seq: 1,
        }
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<Session, AppError> {
        let account = self
            .accounts
            .iter()
            .find(|a| a.profile.email == email && a.password == password)
            .ok_or(AppError::Unauthorized)?;
        let token = format!("mock-jwt-token-{}", self.token_seq);
        self.token_seq += 1;
        Ok(Session {
            token,
            user: account.profile.clone(),
        })
    }

    pub fn update_profile(
        &mut self,
        id: &str,
        name: &str,
        email: &str,
    ) -> Result<Profile, AppError> {
        let account = self
            .accounts
            .iter_mut()
            .find(|a| a.profile.id == id)
            .ok_or(AppError::NotFound { what: "User" })?;
        account.profile.name = name.to_string();
        account.profile.email = email.to_string();
        Ok(account.profile.clone())
    }
}

// ------------------------------ services -------------------------------- //

/// The repositories behind the dashboard, shared with the fetch worker
/// threads. Cloning shares the same underlying collections.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<Mutex<Repo<User>>>,
    pub products: Arc<Mutex<Repo<Product>>>,
    pub orders: Arc<Mutex<Repo<Order>>>,
    pub auth: Arc<Mutex<AuthService>>,
}

impl Services {
    pub fn seeded() -> Self {
        Self {
            users: Arc::new(Mutex::new(Repo::new(seed_users(), 6))),
            products: Arc::new(Mutex::new(Repo::new(seed_products(), 7))),
            orders: Arc::new(Mutex::new(Repo::new(seed_orders(), 1009))),
            auth: Arc::new(Mutex::new(AuthService::seeded())),
        }
    }
}

/// Lock helper that survives a poisoned mutex; the collections stay usable
/// even if a worker thread panicked mid-call.
pub fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::StockStatus;
    use chrono::NaiveDate;

    fn users() -> Repo<User> {
        Repo::new(seed_users(), 6)
    }

    fn products() -> Repo<Product> {
        Repo::new(seed_products(), 7)
    }

    fn orders() -> Repo<Order> {
        Repo::new(seed_orders(), 1009)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn get_miss_is_not_found() {
        let repo = users();
        assert!(matches!(
            repo.get("99"),
            Err(AppError::NotFound { what: "User" })
        ));
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let mut repo = users();
        let mut draft = repo.get("1").unwrap();
        draft.email = "new.person@example.com".into();
        let created = repo.create(draft).unwrap();
        assert_eq!(created.id, "6");
        assert_eq!(repo.len(), 6);
    }

    #[test]
    fn duplicate_sku_rejects_and_leaves_collection_unmodified() {
        let mut repo = products();
        let mut draft = repo.get("1").unwrap();
        draft.name = "Another Headset".into();
        draft.sku = "SW-005".into(); // collides with Smart Watch
        let err = repo.create(draft).unwrap_err();
        assert!(matches!(
            err,
            AppError::DuplicateKey {
                entity: "Product",
                field: "SKU"
            }
        ));
        assert_eq!(repo.len(), 6);
        assert_eq!(repo.get("6").unwrap().name, "Desk Lamp");
    }

    #[test]
    fn update_revalidates_uniqueness_excluding_self() {
        let mut repo = users();
        // Keeping your own email is fine.
        let same = repo.get("1").unwrap();
        assert!(repo.update("1", same).is_ok());
        // Taking someone else's is not.
        let mut stolen = repo.get("1").unwrap();
        stolen.email = "jane.smith@example.com".into();
        assert!(matches!(
            repo.update("1", stolen),
            Err(AppError::DuplicateKey { .. })
        ));
        // Miss is NotFound.
        let ghost = repo.get("1").unwrap();
        assert!(matches!(
            repo.update("99", ghost),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_returns_the_removed_record() {
        let mut repo = users();
        let removed = repo.delete("3").unwrap();
        assert_eq!(removed.name, "Bob Johnson");
        assert_eq!(repo.len(), 4);
        assert!(matches!(repo.delete("3"), Err(AppError::NotFound { .. })));
    }

    #[test]
    fn list_hands_out_copies() {
        let repo = users();
        let mut listed = repo.list();
        listed[0].name = "Mangled".into();
        assert_eq!(repo.get("1").unwrap().name, "John Doe");
    }

    #[test]
    fn search_is_case_insensitive_over_designated_fields() {
        let repo = products();
        let hits = repo.search("sports");
        assert_eq!(hits.len(), 2);
        assert!(repo.search("nonexistent").is_empty());
    }

    #[test]
    fn completing_an_order_stamps_delivery_once() {
        let mut repo = orders();
        let today = day(2023, 12, 1);
        let done = repo
            .set_status("1003", OrderStatus::Completed, today)
            .unwrap();
        assert_eq!(done.delivered, Some(today));
        // Already-delivered orders keep their original date.
        let again = repo
            .set_status("1001", OrderStatus::Completed, today)
            .unwrap();
        assert_eq!(again.delivered, Some(day(2023, 11, 20)));
    }

    #[test]
    fn recent_orders_come_newest_first() {
        let repo = orders();
        let recent = repo.recent(3);
        let ids: Vec<&str> = recent.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1007", "1006", "1003"]);
    }

    #[test]
    fn stats_reflect_the_fixtures() {
        let u = users().stats();
        assert_eq!((u.total, u.active, u.inactive, u.admins), (5, 4, 1, 1));

        let p = products().stats();
        assert_eq!((p.in_stock, p.low_stock, p.out_of_stock), (4, 1, 1));
        assert_eq!(products().get("6").unwrap().status(), StockStatus::LowStock);

        let o = orders().stats();
        assert_eq!((o.pending, o.processing, o.completed, o.cancelled), (2, 2, 3, 1));
        assert!((o.revenue - 509.93).abs() < 1e-9);
    }

    #[test]
    fn login_checks_credentials() {
        let mut auth = AuthService::seeded();
        assert!(matches!(
            auth.login("admin@example.com", "wrong"),
            Err(AppError::Unauthorized)
        ));
        let session = auth.login("admin@example.com", "admin123").unwrap();
        assert_eq!(session.user.name, "Admin User");
        assert!(session.token.starts_with("mock-jwt-token-"));
    }

    #[test]
    fn profile_updates_stick() {
        let mut auth = AuthService::seeded();
        let profile = auth
            .update_profile("1", "Root Admin", "root@example.com")
            .unwrap();
        assert_eq!(profile.name, "Root Admin");
        let session = auth.login("root@example.com", "admin123").unwrap();
        assert_eq!(session.user.name, "Root Admin");
    }
}
