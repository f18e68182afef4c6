use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single display-primitive cell value. Rows are open-ended mappings from
/// field name to one of these; the column schema decides how they render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl CellValue {
    /// Ordering used by the table sort: numeric for numbers, lexicographic
    /// for text, date order for dates. Null sorts before anything else and
    /// mismatched types compare equal, which keeps the sort stable on
    /// ragged data instead of failing.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        use CellValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Text(a), Text(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal),
            (Bool(a), Bool(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Int(n) => write!(f, "{n}"),
            CellValue::Float(n) => write!(f, "{n:.2}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%b %-d, %Y")),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

static NULL: CellValue = CellValue::Null;

/// One record of domain data as seen by the table: field name to value.
/// No fixed schema; the column set supplied per table decides which fields
/// are shown. Absent fields read as Null and render blank.
#[derive(Debug, Clone, Default)]
pub struct Row {
    fields: HashMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<CellValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> &CellValue {
        self.fields.get(key).unwrap_or(&NULL)
    }

    /// Lowercased text of one field, for the search predicate.
    pub fn text_of(&self, key: &str) -> String {
        self.get(key).to_string().to_lowercase()
    }
}

// ---------------------------- domain records ---------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Moderator, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Moderator => "Moderator",
            Role::User => "User",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub const ALL: [UserStatus; 2] = [UserStatus::Active, UserStatus::Inactive];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub phone: String,
    pub join_date: NaiveDate,
}

impl User {
    pub fn to_row(&self) -> Row {
        Row::new()
            .set("id", self.id.as_str())
            .set("name", self.name.as_str())
            .set("email", self.email.as_str())
            .set("role", self.role.as_str())
            .set("status", self.status.as_str())
            .set("phone", self.phone.as_str())
            .set("joinDate", CellValue::Date(self.join_date))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// Derived from the stock count, never stored independently:
    /// 0 is out, below 20 is low.
    pub fn from_stock(stock: u32) -> Self {
        match stock {
            0 => StockStatus::OutOfStock,
            1..=19 => StockStatus::LowStock,
            _ => StockStatus::InStock,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

pub const PRODUCT_CATEGORIES: [&str; 8] = [
    "Electronics",
    "Clothing",
    "Food & Beverage",
    "Home & Garden",
    "Sports & Outdoors",
    "Books",
    "Toys & Games",
    "Health & Beauty",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub stock: u32,
    pub description: String,
    pub sku: String,
    pub created: NaiveDate,
}

impl Product {
    pub fn status(&self) -> StockStatus {
        StockStatus::from_stock(self.stock)
    }

    pub fn to_row(&self) -> Row {
        Row::new()
            .set("id", self.id.as_str())
            .set("name", self.name.as_str())
            .set("price", CellValue::Float(self.price))
            .set("category", self.category.as_str())
            .set("stock", CellValue::Int(self.stock as i64))
            .set("status", self.status().as_str())
            .set("sku", self.sku.as_str())
            .set("created", CellValue::Date(self.created))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn next(&self) -> OrderStatus {
        match self {
            OrderStatus::Pending => OrderStatus::Processing,
            OrderStatus::Processing => OrderStatus::Completed,
            OrderStatus::Completed => OrderStatus::Cancelled,
            OrderStatus::Cancelled => OrderStatus::Pending,
        }
    }

    pub fn parse(s: &str) -> Option<OrderStatus> {
        OrderStatus::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer: String,
    pub email: String,
    pub product: String,
    pub quantity: u32,
    pub total: f64,
    pub status: OrderStatus,
    pub placed: NaiveDate,
    pub delivered: Option<NaiveDate>,
}

impl Order {
    pub fn to_row(&self) -> Row {
        let delivered = match self.delivered {
            Some(d) => CellValue::Date(d),
            None => CellValue::Null,
        };
        Row::new()
            .set("id", self.id.as_str())
            .set("customer", self.customer.as_str())
            .set("email", self.email.as_str())
            .set("product", self.product.as_str())
            .set("quantity", CellValue::Int(self.quantity as i64))
            .set("total", CellValue::Float(self.total))
            .set("status", self.status.as_str())
            .set("placed", CellValue::Date(self.placed))
            .set("delivered", delivered)
    }
}

// ------------------------------- fixtures ------------------------------- //

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub fn seed_users() -> Vec<User> {
    let user = |id: &str, name: &str, email: &str, role, status, phone: &str, jd| User {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        role,
        status,
        phone: phone.into(),
        join_date: jd,
    };
    vec![
        user(
            "1",
            "John Doe",
            "john.doe@example.com",
            Role::Admin,
            UserStatus::Active,
            "+1 234 567 8901",
            date(2023, 1, 15),
        ),
        user(
            "2",
            "Jane Smith",
            "jane.smith@example.com",
            Role::User,
            UserStatus::Active,
            "+1 234 567 8902",
            date(2023, 2, 20),
        ),
        user(
            "3",
            "Bob Johnson",
            "bob.johnson@example.com",
            Role::Moderator,
            UserStatus::Active,
            "+1 234 567 8903",
            date(2023, 3, 10),
        ),
        user(
            "4",
            "Alice Williams",
            "alice.williams@example.com",
            Role::User,
            UserStatus::Inactive,
            "+1 234 567 8904",
            date(2023, 4, 5),
        ),
        user(
            "5",
            "Charlie Brown",
            "charlie.brown@example.com",
            Role::User,
            UserStatus::Active,
            "+1 234 567 8905",
            date(2023, 5, 12),
        ),
    ]
}

pub fn seed_products() -> Vec<Product> {
    let product = |id: &str, name: &str, price, category: &str, stock, desc: &str, sku: &str, created| Product {
        id: id.into(),
        name: name.into(),
        price,
        category: category.into(),
        stock,
        description: desc.into(),
        sku: sku.into(),
        created,
    };
    vec![
        product(
            "1",
            "Wireless Headphones",
            79.99,
            "Electronics",
            150,
            "High-quality wireless headphones with noise cancellation",
            "WH-001",
            date(2023, 1, 10),
        ),
        product(
            "2",
            "Running Shoes",
            129.99,
            "Sports & Outdoors",
            75,
            "Comfortable running shoes for all terrains",
            "RS-002",
            date(2023, 2, 15),
        ),
        product(
            "3",
            "Coffee Maker",
            49.99,
            "Home & Garden",
            0,
            "Programmable coffee maker with timer",
            "CM-003",
            date(2023, 3, 20),
        ),
        product(
            "4",
            "Yoga Mat",
            29.99,
            "Sports & Outdoors",
            200,
            "Non-slip yoga mat with carrying strap",
            "YM-004",
            date(2023, 4, 5),
        ),
        product(
            "5",
            "Smart Watch",
            199.99,
            "Electronics",
            45,
            "Fitness tracker with heart rate monitor",
            "SW-005",
            date(2023, 5, 12),
        ),
        product(
            "6",
            "Desk Lamp",
            39.99,
            "Home & Garden",
            10,
            "LED desk lamp with adjustable brightness",
            "DL-006",
            date(2023, 6, 18),
        ),
    ]
}

pub fn seed_orders() -> Vec<Order> {
    let order = |id: &str,
                 customer: &str,
                 email: &str,
                 product: &str,
                 quantity,
                 total,
                 status,
                 placed,
                 delivered| Order {
        id: id.into(),
        customer: customer.into(),
        email: email.into(),
        product: product.into(),
        quantity,
        total,
        status,
        placed,
        delivered,
    };
    vec![
        order(
            "1001",
            "John Doe",
            "john.doe@example.com",
            "Wireless Headphones",
            2,
            159.98,
            OrderStatus::Completed,
            date(2023, 11, 15),
            Some(date(2023, 11, 20)),
        ),
        order(
            "1002",
            "Jane Smith",
            "jane.smith@example.com",
            "Running Shoes",
            1,
            129.99,
            OrderStatus::Processing,
            date(2023, 11, 18),
            Some(date(2023, 11, 25)),
        ),
        order(
            "1003",
            "Bob Johnson",
            "bob.johnson@example.com",
            "Smart Watch",
            1,
            199.99,
            OrderStatus::Pending,
            date(2023, 11, 20),
            None,
        ),
        order(
            "1004",
            "Alice Williams",
            "alice.williams@example.com",
            "Yoga Mat",
            3,
            89.97,
            OrderStatus::Completed,
            date(2023, 11, 12),
            Some(date(2023, 11, 17)),
        ),
        order(
            "1005",
            "Charlie Brown",
            "charlie.brown@example.com",
            "Coffee Maker",
            1,
            49.99,
            OrderStatus::Cancelled,
            date(2023, 11, 10),
            None,
        ),
        order(
            "1006",
            "Diana Prince",
            "diana.prince@example.com",
            "Desk Lamp",
            2,
            79.98,
            OrderStatus::Processing,
            date(2023, 11, 22),
            Some(date(2023, 11, 28)),
        ),
        order(
            "1007",
            "Edward Norton",
            "edward.norton@example.com",
            "Wireless Headphones",
            1,
            79.99,
            OrderStatus::Pending,
            date(2023, 11, 23),
            None,
        ),
        order(
            "1008",
            "Fiona Green",
            "fiona.green@example.com",
            "Running Shoes",
            2,
            259.98,
            OrderStatus::Completed,
            date(2023, 11, 8),
            Some(date(2023, 11, 14)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_ordering_by_dynamic_type() {
        assert_eq!(
            CellValue::Int(2).compare(&CellValue::Int(10)),
            Ordering::Less
        );
        // Lexicographic for text, so "10" < "2".
        assert_eq!(
            CellValue::Text("10".into()).compare(&CellValue::Text("2".into())),
            Ordering::Less
        );
        assert_eq!(
            CellValue::Int(3).compare(&CellValue::Float(2.5)),
            Ordering::Greater
        );
        assert_eq!(
            CellValue::Null.compare(&CellValue::Text("".into())),
            Ordering::Less
        );
        assert_eq!(
            CellValue::Bool(false).compare(&CellValue::Bool(true)),
            Ordering::Less
        );
    }

    #[test]
    fn absent_field_reads_null() {
        let row = Row::new().set("name", "John Doe");
        assert!(row.get("email").is_null());
        assert_eq!(row.get("name").to_string(), "John Doe");
    }

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(StockStatus::from_stock(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_stock(19), StockStatus::LowStock);
        assert_eq!(StockStatus::from_stock(20), StockStatus::InStock);
    }

    #[test]
    fn date_cells_render_readably() {
        let d = CellValue::Date(date(2023, 11, 15));
        assert_eq!(d.to_string(), "Nov 15, 2023");
    }

    #[test]
    fn fixtures_match_expected_sizes() {
        assert_eq!(seed_users().len(), 5);
        assert_eq!(seed_products().len(), 6);
        assert_eq!(seed_orders().len(), 8);
    }
}
