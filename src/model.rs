use std::sync::mpsc::Receiver;
use std::time::Instant;

use arboard::Clipboard;
use chrono::Local;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use serde_json::json;
use tracing::{debug, info, trace, warn};

use crate::domain::{
    AppConfig, FetchPayload, Message, Nav, DASHBOARD_PAGE_SIZE, KEY_AUTH_SESSION, KEY_THEME_MODE,
};
use crate::fetch::Dispatcher;
use crate::filter::{
    filter_rows, StatusFilter, ORDER_SEARCH_FIELDS, PRODUCT_SEARCH_FIELDS, USER_SEARCH_FIELDS,
};
use crate::form::{Form, FormKind};
use crate::inputter::Inputter;
use crate::record::{OrderStatus, Row};
use crate::repo::{lock, OrderStats, ProductStats, Services, Session, UserStats};
use crate::store::KvStore;
use crate::table::{csv_line, CellKind, Column, TableState};
use crate::theme::ThemeMode;

#[derive(Debug, PartialEq, Eq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Users,
    Products,
    Orders,
    UserForm,
    ProductForm,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
    ConfirmDelete { id: String, label: String },
}

/// How the controller should interpret keys this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    Overlay,
}

// Chart fixtures shown on the dashboard, as in the app this replaces.
pub const SALES_SERIES: [(&str, u64, u64); 7] = [
    ("Jan", 4000, 2400),
    ("Feb", 3000, 1398),
    ("Mar", 2000, 9800),
    ("Apr", 2780, 3908),
    ("May", 1890, 4800),
    ("Jun", 2390, 3800),
    ("Jul", 3490, 4300),
];

pub const WEEK_ORDERS: [(&str, u64); 7] = [
    ("Mon", 65),
    ("Tue", 59),
    ("Wed", 80),
    ("Thu", 81),
    ("Fri", 56),
    ("Sat", 55),
    ("Sun", 40),
];

pub const CATEGORY_SALES: [(&str, u64); 5] = [
    ("Electronics", 400),
    ("Clothing", 300),
    ("Food", 200),
    ("Books", 150),
    ("Sports", 100),
];

pub const MOCK_PAGE_VISITS: u64 = 12543;

fn user_columns() -> Vec<Column> {
    vec![
        Column::new("name", "Name"),
        Column::new("email", "Email"),
        Column::new("role", "Role").cell(CellKind::Badge),
        Column::new("status", "Status").cell(CellKind::Badge),
        Column::new("joinDate", "Join Date").cell(CellKind::Date),
    ]
}

fn product_columns() -> Vec<Column> {
    vec![
        Column::new("sku", "SKU"),
        Column::new("name", "Name"),
        Column::new("category", "Category").cell(CellKind::Badge),
        Column::new("price", "Price").cell(CellKind::Currency),
        Column::new("stock", "Stock").cell(CellKind::Quantity),
        Column::new("status", "Status").cell(CellKind::Badge),
    ]
}

fn order_columns() -> Vec<Column> {
    vec![
        Column::new("id", "Order ID"),
        Column::new("customer", "Customer"),
        Column::new("email", "Email"),
        Column::new("product", "Product"),
        Column::new("quantity", "Qty").cell(CellKind::Quantity),
        Column::new("total", "Total").cell(CellKind::Currency),
        Column::new("status", "Status").cell(CellKind::Badge),
        Column::new("placed", "Order Date").cell(CellKind::Date),
    ]
}

fn recent_order_columns() -> Vec<Column> {
    vec![
        Column::new("id", "Order ID"),
        Column::new("customer", "Customer"),
        Column::new("product", "Product"),
        Column::new("total", "Total").cell(CellKind::Currency),
        Column::new("status", "Status").cell(CellKind::Badge).unsortable(),
        Column::new("placed", "Date").cell(CellKind::Date),
    ]
}

/// One list screen: the fetched source rows, the derived filtered view,
/// the table state over that view, and the search box. The view is
/// recomputed in full whenever the source, the query, or the status
/// filter changes; the page and selection are re-clamped each time.
pub struct ListPane {
    source: Vec<Row>,
    pub view: Vec<Row>,
    pub query: String,
    pub editing_query: bool,
    pub input: Inputter,
    pub table: TableState,
    pub selected: usize,
    pub loading: bool,
    pub status_filter: StatusFilter,
    pub has_status_filter: bool,
    search_fields: &'static [&'static str],
}

impl ListPane {
    fn new(
        columns: Vec<Column>,
        page_size: usize,
        search_fields: &'static [&'static str],
        has_status_filter: bool,
    ) -> Self {
        Self {
            source: Vec::new(),
            view: Vec::new(),
            query: String::new(),
            editing_query: false,
            input: Inputter::default(),
            table: TableState::new(columns, page_size),
            selected: 0,
            loading: false,
            status_filter: StatusFilter::All,
            has_status_filter,
            search_fields,
        }
    }

    pub fn set_source(&mut self, rows: Vec<Row>) {
        self.source = rows;
        self.loading = false;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.view = filter_rows(
            &self.source,
            &self.query,
            self.search_fields,
            self.status_filter,
        );
        self.table.sync_len(self.view.len());
        self.clamp_selection();
    }

    /// Indices into `view`, sorted and windowed to the current page.
    pub fn visible_indices(&self) -> Vec<usize> {
        let order = self.table.order(&self.view);
        let slice = self.table.page_slice(order.len());
        order[slice].to_vec()
    }

    pub fn visible_rows(&self) -> Vec<&Row> {
        self.visible_indices()
            .into_iter()
            .map(|i| &self.view[i])
            .collect()
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.visible_rows().into_iter().nth(self.selected)
    }

    fn page_len(&self) -> usize {
        self.table.page_slice(self.view.len()).len()
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.page_len().saturating_sub(1));
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.page_len() {
            self.selected += 1;
        }
    }

    /// Live query update, applied on every keystroke in the search box.
    /// Any change lands back on page 1 of the new view.
    fn set_query(&mut self, q: String) {
        if q != self.query {
            self.query = q;
            self.table.first_page();
            self.refilter();
        }
    }

    fn cycle_status_filter(&mut self) {
        self.status_filter = self.status_filter.next();
        self.table.first_page();
        self.refilter();
    }
}

pub struct LoginPane {
    pub email: Inputter,
    pub password: Inputter,
    pub focus: usize,
    pub error: Option<String>,
    pub busy: bool,
}

impl LoginPane {
    fn new() -> Self {
        Self {
            email: Inputter::default(),
            password: Inputter::default(),
            focus: 0,
            error: None,
            busy: false,
        }
    }
}

pub struct DashPane {
    pub user_stats: UserStats,
    pub order_stats: OrderStats,
    pub product_stats: ProductStats,
    pub recent: Vec<Row>,
    pub recent_table: TableState,
    pub loading: bool,
}

impl DashPane {
    fn new() -> Self {
        Self {
            user_stats: UserStats::default(),
            order_stats: OrderStats::default(),
            product_stats: ProductStats::default(),
            recent: Vec::new(),
            recent_table: TableState::new(recent_order_columns(), DASHBOARD_PAGE_SIZE),
            loading: false,
        }
    }
}

/// Settings items top to bottom: profile name, profile email, theme,
/// logout.
pub const SETTINGS_ITEMS: usize = 4;

pub struct SettingsPane {
    pub name: Inputter,
    pub email: Inputter,
    pub focus: usize,
    pub editing: bool,
    pub error: Option<String>,
    pub saving: bool,
}

impl SettingsPane {
    fn new() -> Self {
        Self {
            name: Inputter::default(),
            email: Inputter::default(),
            focus: 0,
            editing: false,
            error: None,
            saving: false,
        }
    }
}

/// Profile fields go through the same required/format gate as the forms.
fn validate_profile(name: &str, email: &str) -> Result<(), crate::domain::AppError> {
    use crate::domain::AppError;
    if name.is_empty() {
        return Err(AppError::validation("name", "Name is required"));
    }
    if !crate::form::valid_email(email) {
        return Err(AppError::validation("email", "Invalid email address"));
    }
    Ok(())
}

pub struct Model {
    pub status: Status,
    pub screen: Screen,
    pub overlay: Overlay,
    pub theme: ThemeMode,
    pub session: Option<Session>,

    pub login: LoginPane,
    pub dash: DashPane,
    pub users: ListPane,
    pub products: ListPane,
    pub orders: ListPane,
    pub settings: SettingsPane,
    pub form: Option<Form>,

    pub status_message: String,
    pub message_at: Instant,

    services: Services,
    dispatcher: Dispatcher,
    store: KvStore,
    generation: u64,
    clipboard: Option<Clipboard>,
}

impl Model {
    /// Builds the model and issues the initial fetch. The returned
    /// receiver is the channel fetch completions arrive on; hand it to
    /// the controller.
    pub fn init(
        config: &AppConfig,
        services: Services,
        store: KvStore,
    ) -> (Self, Receiver<Message>) {
        let (dispatcher, rx) = Dispatcher::new(config.latency);

        let theme = store
            .get_str(KEY_THEME_MODE)
            .and_then(|s| ThemeMode::parse(&s))
            .unwrap_or_default();
        let session: Option<Session> = store
            .get(KEY_AUTH_SESSION)
            .and_then(|v| serde_json::from_value(v).ok());

        let mut model = Self {
            status: Status::Ready,
            screen: Screen::Login,
            overlay: Overlay::None,
            theme,
            session,
            login: LoginPane::new(),
            dash: DashPane::new(),
            users: ListPane::new(user_columns(), config.page_size, &USER_SEARCH_FIELDS, false),
            products: ListPane::new(
                product_columns(),
                config.page_size,
                &PRODUCT_SEARCH_FIELDS,
                false,
            ),
            orders: ListPane::new(order_columns(), config.page_size, &ORDER_SEARCH_FIELDS, true),
            settings: SettingsPane::new(),
            form: None,
            status_message: "Started opsdash".to_string(),
            message_at: Instant::now(),
            services,
            dispatcher,
            store,
            generation: 0,
            clipboard: Clipboard::new().ok(),
        };

        if model.session.is_some() {
            info!("Resuming persisted session");
            model.goto(Nav::Dashboard);
        }
        (model, rx)
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn input_mode(&self) -> InputMode {
        if self.overlay != Overlay::None {
            return InputMode::Overlay;
        }
        let editing = match self.screen {
            Screen::Login | Screen::UserForm | Screen::ProductForm => true,
            Screen::Settings => self.settings.editing,
            Screen::Users => self.users.editing_query,
            Screen::Products => self.products.editing_query,
            Screen::Orders => self.orders.editing_query,
            Screen::Dashboard => false,
        };
        if editing {
            InputMode::Editing
        } else {
            InputMode::Normal
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.message_at = Instant::now();
    }

    fn active_pane_mut(&mut self) -> Option<&mut ListPane> {
        match self.screen {
            Screen::Users => Some(&mut self.users),
            Screen::Products => Some(&mut self.products),
            Screen::Orders => Some(&mut self.orders),
            _ => None,
        }
    }

    fn active_pane(&self) -> Option<&ListPane> {
        match self.screen {
            Screen::Users => Some(&self.users),
            Screen::Products => Some(&self.products),
            Screen::Orders => Some(&self.orders),
            _ => None,
        }
    }

    // ------------------------------ update ------------------------------ //

    pub fn update(&mut self, message: Message) {
        match message {
            Message::Fetched(generation, payload) => self.on_fetched(generation, payload),
            Message::RawKey(key) => self.on_raw_key(key),
            Message::Resize(w, h) => trace!("Resized to {w}x{h}"),
            msg => match self.overlay.clone() {
                Overlay::Help => {
                    if matches!(msg, Message::CloseOverlay | Message::Confirm | Message::Help) {
                        self.overlay = Overlay::None;
                    }
                }
                Overlay::ConfirmDelete { id, .. } => match msg {
                    Message::Confirm => {
                        self.overlay = Overlay::None;
                        self.delete_record(id);
                    }
                    Message::CloseOverlay => self.overlay = Overlay::None,
                    _ => {}
                },
                Overlay::None => self.on_message(msg),
            },
        }
    }

    fn on_message(&mut self, msg: Message) {
        match msg {
            Message::Quit => self.quit(),
            Message::Help => self.overlay = Overlay::Help,
            Message::ToggleTheme => self.toggle_theme(),
            Message::Goto(nav) => self.goto(nav),
            Message::Logout => self.logout(),
            Message::Refresh => self.fetch_current(),

            Message::EditSearch => {
                if let Some(pane) = self.active_pane_mut() {
                    let query = pane.query.clone();
                    pane.input.set(&query);
                    pane.editing_query = true;
                }
            }
            Message::CycleStatusFilter => {
                if let Some(pane) = self.active_pane_mut()
                    && pane.has_status_filter
                {
                    pane.cycle_status_filter();
                }
                if let Some(pane) = self.active_pane() {
                    if pane.has_status_filter {
                        let label = pane.status_filter.label();
                        self.set_status_message(format!("Filter: {label}"));
                    }
                }
            }
            Message::CycleRowStatus => self.cycle_order_status(),

            Message::MoveUp => match self.screen {
                Screen::Settings => {
                    self.settings.focus = self.settings.focus.saturating_sub(1);
                }
                _ => {
                    if let Some(pane) = self.active_pane_mut() {
                        pane.move_up();
                    }
                }
            },
            Message::MoveDown => match self.screen {
                Screen::Settings => {
                    self.settings.focus = (self.settings.focus + 1).min(SETTINGS_ITEMS - 1);
                }
                _ => {
                    if let Some(pane) = self.active_pane_mut() {
                        pane.move_down();
                    }
                }
            },
            Message::PrevPage => {
                if let Some(pane) = self.active_pane_mut() {
                    pane.table.prev_page();
                    pane.clamp_selection();
                }
            }
            Message::NextPage => {
                if let Some(pane) = self.active_pane_mut() {
                    let len = pane.view.len();
                    pane.table.next_page(len);
                    pane.clamp_selection();
                }
            }
            Message::FirstPage => {
                if let Some(pane) = self.active_pane_mut() {
                    pane.table.first_page();
                    pane.clamp_selection();
                }
            }
            Message::LastPage => {
                if let Some(pane) = self.active_pane_mut() {
                    let len = pane.view.len();
                    pane.table.last_page(len);
                    pane.clamp_selection();
                }
            }
            Message::HeaderLeft => {
                if let Some(pane) = self.active_pane_mut() {
                    pane.table.pick_left();
                }
            }
            Message::HeaderRight => {
                if let Some(pane) = self.active_pane_mut() {
                    pane.table.pick_right();
                }
            }
            Message::ToggleSort => {
                if let Some(pane) = self.active_pane_mut() {
                    pane.table.toggle_sort();
                    pane.clamp_selection();
                }
            }

            Message::Add => match self.screen {
                Screen::Users => {
                    self.form = Some(Form::user(None));
                    self.screen = Screen::UserForm;
                }
                Screen::Products => {
                    self.form = Some(Form::product(None));
                    self.screen = Screen::ProductForm;
                }
                _ => {}
            },
            Message::Edit => match self.screen {
                Screen::Users | Screen::Products => self.edit_selected(),
                Screen::Settings => self.activate_settings_item(),
                _ => {}
            },
            Message::Delete => self.request_delete(),
            Message::YankRow => self.yank_selected(),

            // Confirm/CloseOverlay only mean something while an overlay is
            // open; Fetched/RawKey/Resize are routed before this match.
            _ => {}
        }
    }

    // ----------------------------- fetching ----------------------------- //

    fn goto(&mut self, nav: Nav) {
        self.generation += 1;
        self.form = None;
        self.overlay = Overlay::None;
        self.screen = match nav {
            Nav::Dashboard => Screen::Dashboard,
            Nav::Users => Screen::Users,
            Nav::Products => Screen::Products,
            Nav::Orders => Screen::Orders,
            Nav::Settings => Screen::Settings,
        };
        debug!("Navigating to {:?} (gen {})", self.screen, self.generation);
        if self.screen == Screen::Settings {
            self.prefill_settings();
        } else {
            self.fetch_current();
        }
    }

    fn prefill_settings(&mut self) {
        let (name, email) = match &self.session {
            Some(s) => (s.user.name.clone(), s.user.email.clone()),
            None => (String::new(), String::new()),
        };
        self.settings = SettingsPane::new();
        self.settings.name.set(&name);
        self.settings.email.set(&email);
    }

    fn fetch_current(&mut self) {
        let generation = self.generation;
        let services = self.services.clone();
        match self.screen {
            Screen::Dashboard => {
                self.dash.loading = true;
                self.set_status_message("Loading ...");
                self.dispatcher.spawn(generation, move || {
                    let users = lock(&services.users).stats();
                    let orders_repo = lock(&services.orders);
                    let orders = orders_repo.stats();
                    let recent = orders_repo.recent(DASHBOARD_PAGE_SIZE);
                    drop(orders_repo);
                    let products = lock(&services.products).stats();
                    FetchPayload::Dashboard {
                        users,
                        orders,
                        products,
                        recent,
                    }
                });
            }
            Screen::Users => {
                self.users.loading = true;
                self.set_status_message("Loading ...");
                self.dispatcher.spawn(generation, move || {
                    FetchPayload::Users(lock(&services.users).list())
                });
            }
            Screen::Products => {
                self.products.loading = true;
                self.set_status_message("Loading ...");
                self.dispatcher.spawn(generation, move || {
                    FetchPayload::Products(lock(&services.products).list())
                });
            }
            Screen::Orders => {
                self.orders.loading = true;
                self.set_status_message("Loading ...");
                self.dispatcher.spawn(generation, move || {
                    FetchPayload::Orders(lock(&services.orders).list())
                });
            }
            // Forms return to their list, which refetches then.
            Screen::Login | Screen::Settings | Screen::UserForm | Screen::ProductForm => {}
        }
    }

    fn on_fetched(&mut self, generation: u64, payload: FetchPayload) {
        if generation != self.generation {
            trace!("Discarding stale fetch (gen {generation} != {})", self.generation);
            return;
        }
        match payload {
            FetchPayload::Users(users) => {
                let n = users.len();
                self.users
                    .set_source(users.iter().map(|u| u.to_row()).collect());
                self.set_status_message(format!("Loaded {n} users"));
            }
            FetchPayload::Products(products) => {
                let n = products.len();
                self.products
                    .set_source(products.iter().map(|p| p.to_row()).collect());
                self.set_status_message(format!("Loaded {n} products"));
            }
            FetchPayload::Orders(orders) => {
                let n = orders.len();
                self.orders
                    .set_source(orders.iter().map(|o| o.to_row()).collect());
                self.set_status_message(format!("Loaded {n} orders"));
            }
            FetchPayload::Dashboard {
                users,
                orders,
                products,
                recent,
            } => {
                self.dash.user_stats = users;
                self.dash.order_stats = orders;
                self.dash.product_stats = products;
                self.dash.recent = recent.iter().map(|o| o.to_row()).collect();
                self.dash.loading = false;
                self.set_status_message("Dashboard up to date");
            }
            FetchPayload::Login(Ok(session)) => {
                self.login.busy = false;
                self.persist_session(&session);
                let name = session.user.name.clone();
                self.session = Some(session);
                self.goto(Nav::Dashboard);
                self.set_status_message(format!("Welcome back, {name}!"));
            }
            FetchPayload::Login(Err(e)) => {
                self.login.busy = false;
                self.login.error = Some(e.to_string());
            }
            FetchPayload::EditUser(Ok(user)) => {
                self.form = Some(Form::user(Some(user)));
                self.screen = Screen::UserForm;
            }
            FetchPayload::EditProduct(Ok(product)) => {
                self.form = Some(Form::product(Some(product)));
                self.screen = Screen::ProductForm;
            }
            FetchPayload::EditUser(Err(e)) | FetchPayload::EditProduct(Err(e)) => {
                self.set_status_message(format!("{e} (press r to reload)"));
            }
            FetchPayload::ProfileSaved(Ok(profile)) => {
                self.settings.saving = false;
                self.settings.editing = false;
                if let Some(session) = self.session.as_mut() {
                    session.user = profile;
                    let session = session.clone();
                    self.persist_session(&session);
                }
                self.prefill_settings();
                self.set_status_message("Profile updated successfully!");
            }
            FetchPayload::ProfileSaved(Err(e)) => {
                self.settings.saving = false;
                self.settings.error = Some(e.to_string());
            }
            FetchPayload::Mutated(Ok(message)) => {
                if self.form.is_some() {
                    self.close_form();
                }
                self.set_status_message(message);
                self.fetch_current();
            }
            FetchPayload::Mutated(Err(e)) => {
                if let Some(form) = self.form.as_mut() {
                    form.apply_error(&e);
                } else {
                    self.set_status_message(format!("{e} (press r to reload)"));
                }
            }
        }
    }

    fn persist_session(&mut self, session: &Session) {
        match serde_json::to_value(session) {
            Ok(v) => self.store.set(KEY_AUTH_SESSION, v),
            Err(e) => warn!("Cannot persist session: {e}"),
        }
    }

    // ------------------------------ actions ----------------------------- //

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        self.store.set(KEY_THEME_MODE, json!(self.theme.as_str()));
        self.set_status_message(format!("Theme: {}", self.theme.as_str()));
    }

    fn logout(&mut self) {
        self.store.remove(KEY_AUTH_SESSION);
        self.session = None;
        self.generation += 1;
        self.login = LoginPane::new();
        self.screen = Screen::Login;
        self.set_status_message("Logged out successfully");
    }

    fn selected_id(&self) -> Option<String> {
        let row = self.active_pane()?.selected_row()?;
        let id = row.get("id").to_string();
        (!id.is_empty()).then_some(id)
    }

    fn request_delete(&mut self) {
        let Some(pane) = self.active_pane() else {
            return;
        };
        let Some(row) = pane.selected_row() else {
            return;
        };
        let id = row.get("id").to_string();
        let label = match self.screen {
            Screen::Users => format!("user {}", row.get("name")),
            Screen::Products => format!("product {}", row.get("name")),
            Screen::Orders => format!("order {id}"),
            _ => return,
        };
        self.overlay = Overlay::ConfirmDelete { id, label };
    }

    fn delete_record(&mut self, id: String) {
        let generation = self.generation;
        let services = self.services.clone();
        match self.screen {
            Screen::Users => self.dispatcher.spawn(generation, move || {
                FetchPayload::Mutated(
                    lock(&services.users)
                        .delete(&id)
                        .map(|u| format!("Deleted user {}", u.name)),
                )
            }),
            Screen::Products => self.dispatcher.spawn(generation, move || {
                FetchPayload::Mutated(
                    lock(&services.products)
                        .delete(&id)
                        .map(|p| format!("Deleted product {}", p.name)),
                )
            }),
            Screen::Orders => self.dispatcher.spawn(generation, move || {
                FetchPayload::Mutated(
                    lock(&services.orders)
                        .delete(&id)
                        .map(|o| format!("Deleted order {}", o.id)),
                )
            }),
            _ => {}
        }
    }

    fn edit_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let generation = self.generation;
        let services = self.services.clone();
        match self.screen {
            Screen::Users => self.dispatcher.spawn(generation, move || {
                FetchPayload::EditUser(lock(&services.users).get(&id))
            }),
            Screen::Products => self.dispatcher.spawn(generation, move || {
                FetchPayload::EditProduct(lock(&services.products).get(&id))
            }),
            _ => {}
        }
    }

    fn cycle_order_status(&mut self) {
        if self.screen != Screen::Orders {
            return;
        }
        let Some(row) = self.orders.selected_row() else {
            return;
        };
        let id = row.get("id").to_string();
        let Some(current) = OrderStatus::parse(&row.get("status").to_string()) else {
            return;
        };
        let next = current.next();
        let today = Local::now().date_naive();
        let generation = self.generation;
        let services = self.services.clone();
        self.dispatcher.spawn(generation, move || {
            FetchPayload::Mutated(
                lock(&services.orders)
                    .set_status(&id, next, today)
                    .map(|o| format!("Order {} is now {}", o.id, o.status.as_str())),
            )
        });
    }

    fn yank_selected(&mut self) {
        let Some(pane) = self.active_pane() else {
            return;
        };
        let Some(row) = pane.selected_row() else {
            return;
        };
        let line = csv_line(&pane.table.columns, row);
        match self.clipboard.as_mut() {
            Some(clipboard) => match clipboard.set_text(line) {
                Ok(()) => self.set_status_message("Copied row to clipboard"),
                Err(e) => {
                    trace!("Clipboard write failed: {e:?}");
                    self.set_status_message("Clipboard unavailable");
                }
            },
            None => self.set_status_message("Clipboard unavailable"),
        }
    }

    fn close_form(&mut self) {
        let kind = self.form.as_ref().map(|f| f.kind);
        self.form = None;
        self.screen = match kind {
            Some(FormKind::Product) => Screen::Products,
            _ => Screen::Users,
        };
    }

    // ----------------------------- raw keys ----------------------------- //

    fn on_raw_key(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Login => self.login_key(key),
            Screen::UserForm | Screen::ProductForm => self.form_key(key),
            Screen::Settings if self.settings.editing => self.settings_key(key),
            Screen::Users | Screen::Products | Screen::Orders => self.search_key(key),
            _ => {}
        }
    }

    fn login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
                self.login.focus = (self.login.focus + 1) % 2;
            }
            KeyCode::Esc => self.quit(),
            KeyCode::Enter => self.submit_login(),
            _ => {
                self.login.error = None;
                if self.login.focus == 0 {
                    self.login.email.read(key);
                } else {
                    self.login.password.read(key);
                }
            }
        }
    }

    fn submit_login(&mut self) {
        if self.login.busy {
            return;
        }
        let email = self.login.email.value();
        let password = self.login.password.value();
        if email.trim().is_empty() || password.is_empty() {
            self.login.error = Some("Email and password are required".to_string());
            return;
        }
        self.login.busy = true;
        self.login.error = None;
        let generation = self.generation;
        let services = self.services.clone();
        self.dispatcher.spawn(generation, move || {
            FetchPayload::Login(lock(&services.auth).login(email.trim(), &password))
        });
    }

    fn form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.busy {
            return;
        }
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Esc => self.close_form(),
            KeyCode::Enter => self.submit_form(),
            _ => form.edit_key(key),
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if !form.validate() {
            return;
        }
        form.busy = true;
        let today = Local::now().date_naive();
        let generation = self.generation;
        let services = self.services.clone();
        match form.kind {
            FormKind::User => {
                let user = form.to_user(today);
                match form.editing_id().map(str::to_string) {
                    Some(id) => self.dispatcher.spawn(generation, move || {
                        FetchPayload::Mutated(
                            lock(&services.users)
                                .update(&id, user)
                                .map(|u| format!("Updated user {}", u.name)),
                        )
                    }),
                    None => self.dispatcher.spawn(generation, move || {
                        FetchPayload::Mutated(
                            lock(&services.users)
                                .create(user)
                                .map(|u| format!("Created user {}", u.name)),
                        )
                    }),
                }
            }
            FormKind::Product => {
                let product = form.to_product(today);
                match form.editing_id().map(str::to_string) {
                    Some(id) => self.dispatcher.spawn(generation, move || {
                        FetchPayload::Mutated(
                            lock(&services.products)
                                .update(&id, product)
                                .map(|p| format!("Updated product {}", p.name)),
                        )
                    }),
                    None => self.dispatcher.spawn(generation, move || {
                        FetchPayload::Mutated(
                            lock(&services.products)
                                .create(product)
                                .map(|p| format!("Created product {}", p.name)),
                        )
                    }),
                }
            }
        }
    }

    fn activate_settings_item(&mut self) {
        match self.settings.focus {
            0 | 1 => {
                self.settings.editing = true;
                self.settings.error = None;
            }
            2 => self.toggle_theme(),
            3 => self.logout(),
            _ => {}
        }
    }

    fn settings_key(&mut self, key: KeyEvent) {
        if self.settings.saving {
            return;
        }
        match key.code {
            KeyCode::Esc => {
                self.settings.editing = false;
                self.prefill_settings();
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.settings.focus = if self.settings.focus == 0 { 1 } else { 0 };
            }
            KeyCode::Enter => self.save_profile(),
            _ => {
                self.settings.error = None;
                if self.settings.focus == 0 {
                    self.settings.name.read(key);
                } else {
                    self.settings.email.read(key);
                }
            }
        }
    }

    fn save_profile(&mut self) {
        let name = self.settings.name.value().trim().to_string();
        let email = self.settings.email.value().trim().to_string();
        if let Err(e) = validate_profile(&name, &email) {
            self.settings.error = Some(e.to_string());
            return;
        }
        let Some(id) = self.session.as_ref().map(|s| s.user.id.clone()) else {
            return;
        };
        self.settings.saving = true;
        let generation = self.generation;
        let services = self.services.clone();
        self.dispatcher.spawn(generation, move || {
            FetchPayload::ProfileSaved(lock(&services.auth).update_profile(&id, &name, &email))
        });
    }

    fn search_key(&mut self, key: KeyEvent) {
        let Some(pane) = self.active_pane_mut() else {
            return;
        };
        let result = pane.input.read(key);
        if result.finished {
            pane.editing_query = false;
            if result.canceled {
                pane.input.clear();
                pane.set_query(String::new());
            }
        } else {
            pane.set_query(result.input);
        }
    }
}
