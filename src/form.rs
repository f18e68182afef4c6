use chrono::NaiveDate;
use once_cell::sync::Lazy;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use regex::Regex;

use crate::domain::AppError;
use crate::inputter::Inputter;
use crate::record::{
    Product, Role, User, UserStatus, PRODUCT_CATEGORIES,
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

pub fn valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// A form field is either free text or a fixed choice cycled with the
/// arrow keys (the select-box analog).
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub kind: FieldKind,
    pub input: Inputter,
    pub choice: usize,
    pub error: Option<String>,
}

impl FormField {
    fn text(label: &'static str, value: &str) -> Self {
        Self {
            label,
            kind: FieldKind::Text,
            input: Inputter::with_value(value),
            choice: 0,
            error: None,
        }
    }

    fn choice(label: &'static str, options: &'static [&'static str], current: &str) -> Self {
        let choice = options.iter().position(|o| *o == current).unwrap_or(0);
        Self {
            label,
            kind: FieldKind::Choice(options),
            input: Inputter::default(),
            choice,
            error: None,
        }
    }

    pub fn value(&self) -> String {
        match self.kind {
            FieldKind::Text => self.input.value(),
            FieldKind::Choice(options) => options[self.choice].to_string(),
        }
    }

    pub fn cycle(&mut self, step: isize) {
        if let FieldKind::Choice(options) = self.kind {
            let len = options.len() as isize;
            self.choice = ((self.choice as isize + step).rem_euclid(len)) as usize;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    User,
    Product,
}

// Field positions, fixed per form kind.
const USER_NAME: usize = 0;
const USER_EMAIL: usize = 1;
const USER_PHONE: usize = 2;
const USER_ROLE: usize = 3;
const USER_STATUS: usize = 4;

const PRODUCT_NAME: usize = 0;
const PRODUCT_SKU: usize = 1;
const PRODUCT_CATEGORY: usize = 2;
const PRODUCT_PRICE: usize = 3;
const PRODUCT_STOCK: usize = 4;
const PRODUCT_DESCRIPTION: usize = 5;

static ROLE_OPTIONS: [&str; 3] = ["Admin", "Moderator", "User"];
static USER_STATUS_OPTIONS: [&str; 2] = ["Active", "Inactive"];

/// Add/edit form state for users and products. Holds the record being
/// edited so an update keeps its id and original dates.
#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub title: String,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub busy: bool,
    pub banner: Option<String>,
    original_user: Option<User>,
    original_product: Option<Product>,
}

impl Form {
    pub fn user(original: Option<User>) -> Self {
        let blank = User {
            id: String::new(),
            name: String::new(),
            email: String::new(),
            role: Role::User,
            status: UserStatus::Active,
            phone: String::new(),
            join_date: NaiveDate::default(),
        };
        let u = original.as_ref().unwrap_or(&blank);
        Self {
            kind: FormKind::User,
            title: if original.is_some() { "Edit User" } else { "Add User" }.to_string(),
            fields: vec![
                FormField::text("Name", &u.name),
                FormField::text("Email", &u.email),
                FormField::text("Phone", &u.phone),
                FormField::choice("Role", &ROLE_OPTIONS, u.role.as_str()),
                FormField::choice("Status", &USER_STATUS_OPTIONS, u.status.as_str()),
            ],
            focus: 0,
            busy: false,
            banner: None,
            original_user: original,
            original_product: None,
        }
    }

    pub fn product(original: Option<Product>) -> Self {
        let blank = Product {
            id: String::new(),
            name: String::new(),
            price: 0.0,
            category: PRODUCT_CATEGORIES[0].to_string(),
            stock: 0,
            description: String::new(),
            sku: String::new(),
            created: NaiveDate::default(),
        };
        let p = original.as_ref().unwrap_or(&blank);
        let price = if original.is_some() {
            format!("{:.2}", p.price)
        } else {
            String::new()
        };
        let stock = if original.is_some() {
            p.stock.to_string()
        } else {
            String::new()
        };
        Self {
            kind: FormKind::Product,
            title: if original.is_some() { "Edit Product" } else { "Add Product" }.to_string(),
            fields: vec![
                FormField::text("Name", &p.name),
                FormField::text("SKU", &p.sku),
                FormField::choice("Category", &PRODUCT_CATEGORIES, &p.category),
                FormField::text("Price", &price),
                FormField::text("Stock", &stock),
                FormField::text("Description", &p.description),
            ],
            focus: 0,
            busy: false,
            banner: None,
            original_user: None,
            original_product: original,
        }
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self.kind {
            FormKind::User => self.original_user.as_ref().map(|u| u.id.as_str()),
            FormKind::Product => self.original_product.as_ref().map(|p| p.id.as_str()),
        }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    /// Feeds one key into the focused field; choice fields only react to
    /// Left/Right.
    pub fn edit_key(&mut self, key: KeyEvent) {
        let field = &mut self.fields[self.focus];
        match (field.kind, key.code) {
            (FieldKind::Choice(_), KeyCode::Left) => field.cycle(-1),
            (FieldKind::Choice(_), KeyCode::Right) => field.cycle(1),
            (FieldKind::Choice(_), _) => {}
            (FieldKind::Text, _) => {
                field.input.read(key);
                field.error = None;
            }
        }
    }

    fn field_value(&self, idx: usize) -> String {
        self.fields[idx].value().trim().to_string()
    }

    /// Required/format checks at the form boundary. Uniqueness stays with
    /// the repository; this only gates what never should reach it.
    pub fn validate(&mut self) -> bool {
        for f in &mut self.fields {
            f.error = None;
        }
        self.banner = None;

        match self.kind {
            FormKind::User => {
                if self.field_value(USER_NAME).is_empty() {
                    self.fields[USER_NAME].error = Some("Name is required".into());
                }
                let email = self.field_value(USER_EMAIL);
                if email.is_empty() {
                    self.fields[USER_EMAIL].error = Some("Email is required".into());
                } else if !valid_email(&email) {
                    self.fields[USER_EMAIL].error = Some("Invalid email address".into());
                }
            }
            FormKind::Product => {
                if self.field_value(PRODUCT_NAME).is_empty() {
                    self.fields[PRODUCT_NAME].error = Some("Name is required".into());
                }
                if self.field_value(PRODUCT_SKU).is_empty() {
                    self.fields[PRODUCT_SKU].error = Some("SKU is required".into());
                }
                let price = self.field_value(PRODUCT_PRICE);
                match price.parse::<f64>() {
                    Ok(p) if p >= 0.0 => {}
                    Ok(_) => {
                        self.fields[PRODUCT_PRICE].error = Some("Price cannot be negative".into())
                    }
                    Err(_) => {
                        self.fields[PRODUCT_PRICE].error = Some("Price must be a number".into())
                    }
                }
                if self.field_value(PRODUCT_STOCK).parse::<u32>().is_err() {
                    self.fields[PRODUCT_STOCK].error =
                        Some("Stock must be a whole number".into());
                }
            }
        }
        self.fields.iter().all(|f| f.error.is_none())
    }

    /// Builds the user record after a successful `validate`. New users are
    /// stamped with today's join date; edits keep the original.
    pub fn to_user(&self, today: NaiveDate) -> User {
        let original = self.original_user.as_ref();
        User {
            id: original.map(|u| u.id.clone()).unwrap_or_default(),
            name: self.field_value(USER_NAME),
            email: self.field_value(USER_EMAIL),
            phone: self.field_value(USER_PHONE),
            role: Role::ALL
                .into_iter()
                .find(|r| r.as_str() == self.fields[USER_ROLE].value())
                .unwrap_or(Role::User),
            status: UserStatus::ALL
                .into_iter()
                .find(|s| s.as_str() == self.fields[USER_STATUS].value())
                .unwrap_or(UserStatus::Active),
            join_date: original.map(|u| u.join_date).unwrap_or(today),
        }
    }

    pub fn to_product(&self, today: NaiveDate) -> Product {
        let original = self.original_product.as_ref();
        Product {
            id: original.map(|p| p.id.clone()).unwrap_or_default(),
            name: self.field_value(PRODUCT_NAME),
            sku: self.field_value(PRODUCT_SKU),
            category: self.fields[PRODUCT_CATEGORY].value(),
            price: self.field_value(PRODUCT_PRICE).parse().unwrap_or(0.0),
            stock: self.field_value(PRODUCT_STOCK).parse().unwrap_or(0),
            description: self.field_value(PRODUCT_DESCRIPTION),
            created: original.map(|p| p.created).unwrap_or(today),
        }
    }

    /// Routes a rejected save back onto the form: unique-key collisions
    /// land on the offending field, everything else on the banner.
    pub fn apply_error(&mut self, err: &AppError) {
        self.busy = false;
        match err {
            AppError::DuplicateKey { field, .. } => {
                let target = self
                    .fields
                    .iter_mut()
                    .find(|f| f.label.eq_ignore_ascii_case(field));
                match target {
                    Some(f) => f.error = Some(err.to_string()),
                    None => self.banner = Some(err.to_string()),
                }
            }
            other => self.banner = Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::seed_users;

    fn set(form: &mut Form, idx: usize, value: &str) {
        form.fields[idx].input.set(value);
    }

    #[test]
    fn email_predicate() {
        assert!(valid_email("john@example.com"));
        assert!(!valid_email("john@example"));
        assert!(!valid_email("not an email"));
        assert!(!valid_email("a b@example.com"));
    }

    #[test]
    fn empty_user_form_fails_validation() {
        let mut form = Form::user(None);
        assert!(!form.validate());
        assert!(form.fields[USER_NAME].error.is_some());
        assert!(form.fields[USER_EMAIL].error.is_some());
    }

    #[test]
    fn valid_user_form_builds_a_record() {
        let mut form = Form::user(None);
        set(&mut form, USER_NAME, "Grace Hopper");
        set(&mut form, USER_EMAIL, "grace@example.com");
        form.fields[USER_ROLE].cycle(1); // Admin -> Moderator
        assert!(form.validate());
        let today = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let user = form.to_user(today);
        assert_eq!(user.name, "Grace Hopper");
        assert_eq!(user.role, Role::Moderator);
        assert_eq!(user.join_date, today);
        assert!(user.id.is_empty());
    }

    #[test]
    fn editing_keeps_id_and_join_date() {
        let original = seed_users().remove(0);
        let mut form = Form::user(Some(original.clone()));
        set(&mut form, USER_NAME, "John Q. Doe");
        assert!(form.validate());
        let user = form.to_user(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(user.id, original.id);
        assert_eq!(user.join_date, original.join_date);
        assert_eq!(user.name, "John Q. Doe");
    }

    #[test]
    fn product_form_checks_numbers() {
        let mut form = Form::product(None);
        set(&mut form, PRODUCT_NAME, "Gadget");
        set(&mut form, PRODUCT_SKU, "GD-010");
        set(&mut form, PRODUCT_PRICE, "not-a-price");
        set(&mut form, PRODUCT_STOCK, "3.5");
        assert!(!form.validate());
        assert!(form.fields[PRODUCT_PRICE].error.is_some());
        assert!(form.fields[PRODUCT_STOCK].error.is_some());

        set(&mut form, PRODUCT_PRICE, "-1");
        assert!(!form.validate());

        set(&mut form, PRODUCT_PRICE, "19.99");
        set(&mut form, PRODUCT_STOCK, "12");
        assert!(form.validate());
        let p = form.to_product(NaiveDate::default());
        assert_eq!(p.price, 19.99);
        assert_eq!(p.stock, 12);
    }

    #[test]
    fn choice_cycling_wraps_both_ways() {
        let mut form = Form::user(None);
        let field = &mut form.fields[USER_STATUS];
        assert_eq!(field.value(), "Active");
        field.cycle(-1);
        assert_eq!(field.value(), "Inactive");
        field.cycle(1);
        assert_eq!(field.value(), "Active");
    }

    #[test]
    fn duplicate_key_errors_land_on_their_field() {
        let mut form = Form::user(None);
        form.apply_error(&AppError::DuplicateKey {
            entity: "User",
            field: "email",
        });
        assert!(form.fields[USER_EMAIL].error.is_some());
        assert!(form.banner.is_none());

        let mut form = Form::product(None);
        form.apply_error(&AppError::DuplicateKey {
            entity: "Product",
            field: "SKU",
        });
        assert!(form.fields[PRODUCT_SKU].error.is_some());
    }
}
