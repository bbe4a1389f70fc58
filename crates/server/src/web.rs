//! The served interface: two password-gated screens plus a navigation
//! selector.
//!
//! - `GET  /`       — selector between the two screens
//! - `GET  /entry`  — stock-entry form
//! - `POST /entry`  — gate check, then one read-modify-write cycle
//! - `GET  /view`   — password form for the view screen
//! - `POST /view`   — gate check, then raw tables + reconciled balances
//!
//! Every handler works on a request-scoped snapshot handed out by the
//! loader; no table state lives in the web layer.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
    Form, Router,
};
use chrono::{Local, NaiveDate};
use estoque_core::access::{AccessPolicy, Screen};
use estoque_core::domain::entry::StockEntry;
use estoque_core::errors::{ApplicationError, InterfaceError};
use estoque_core::stock::{next_lot, reconcile};
use estoque_store::codec;
use estoque_store::{DatasetLoader, PersistenceWriter, StoreError};
use rust_decimal::Decimal;
use serde::Deserialize;
use tera::{Context, Tera};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    loader: Arc<DatasetLoader>,
    writer: Arc<PersistenceWriter>,
    access: Arc<dyn AccessPolicy>,
    templates: Arc<Tera>,
}

impl AppState {
    pub fn new(
        loader: Arc<DatasetLoader>,
        writer: Arc<PersistenceWriter>,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self { loader, writer, access, templates: init_templates() }
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EntryForm {
    pub password: String,
    pub product: String,
    pub quantity: i64,
    pub sector: String,
    pub entry_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub unit_cost: Decimal,
    pub sale_unit_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct GateForm {
    pub password: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Initialize the Tera engine with the web templates.
fn init_templates() -> Arc<Tera> {
    let mut tera = match Tera::new("templates/web/**/*") {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "failed to load web templates from filesystem, using empty Tera instance");
            Tera::default()
        }
    };

    // Embedded copies keep the binary self-contained when the templates
    // directory is not shipped alongside it.
    tera.add_raw_template("index.html", include_str!("../../../templates/web/index.html")).ok();
    tera.add_raw_template("entry.html", include_str!("../../../templates/web/entry.html")).ok();
    tera.add_raw_template("view.html", include_str!("../../../templates/web/view.html")).ok();
    tera.add_raw_template("tables.html", include_str!("../../../templates/web/tables.html")).ok();
    tera.add_raw_template("notice.html", include_str!("../../../templates/web/notice.html")).ok();

    Arc::new(tera)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/entry", get(entry_form_page).post(submit_entry))
        .route("/view", get(view_gate_page).post(view_data_page))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index_page(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    render(&state, "index.html", &Context::new())
}

async fn entry_form_page(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let mut context = Context::new();
    context.insert("today", &codec::format_date(Local::now().date_naive()));
    render(&state, "entry.html", &context)
}

/// One form submission = one read-modify-write cycle: snapshot, lot
/// assignment, append, save (normalize + overwrite both tables + reload).
pub async fn submit_entry(
    State(state): State<AppState>,
    Form(form): Form<EntryForm>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let correlation_id = request_id();

    if !state.access.authorize(Screen::StockEntry, &form.password).is_granted() {
        warn!(
            event_name = "web.entry.denied",
            correlation_id = %correlation_id,
            "wrong password for the stock entry screen"
        );
        return Err(denied(&state, Screen::StockEntry));
    }

    let product = form.product.trim().to_uppercase();
    let sector = form.sector.trim().to_uppercase();

    if product.is_empty() {
        return Err(notice(
            &state,
            StatusCode::BAD_REQUEST,
            "warning",
            "Product name is required.",
            None,
        ));
    }
    if form.quantity < 0 {
        return Err(notice(
            &state,
            StatusCode::BAD_REQUEST,
            "warning",
            "Quantity must be zero or more.",
            None,
        ));
    }

    let mut snapshot = state
        .loader
        .load()
        .await
        .map_err(|e| failure(&state, persistence(e), &correlation_id))?;

    let lot = next_lot(&product, &snapshot.entries)
        .map_err(|e| failure(&state, ApplicationError::Domain(e), &correlation_id))?;

    snapshot.entries.push(StockEntry {
        product: product.clone(),
        lot: lot.clone(),
        quantity: form.quantity,
        sector: sector.clone(),
        entry_date: form.entry_date,
        expiry_date: form.expiry_date,
        unit_cost: form.unit_cost,
        sale_unit_price: form.sale_unit_price,
    });

    state
        .writer
        .save(&snapshot.entries, &snapshot.sales)
        .await
        .map_err(|e| failure(&state, persistence(e), &correlation_id))?;

    info!(
        event_name = "web.entry.recorded",
        correlation_id = %correlation_id,
        product = %product,
        lot = %lot,
        quantity = form.quantity,
        "stock entry recorded"
    );

    Ok(notice_html(
        &state,
        "success",
        &format!(
            "{} units of '{}' (Lot: {}, Sector: {}) added to stock.",
            form.quantity, product, lot, sector
        ),
        None,
    ))
}

async fn view_gate_page(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    render(&state, "view.html", &Context::new())
}

pub async fn view_data_page(
    State(state): State<AppState>,
    Form(form): Form<GateForm>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let correlation_id = request_id();

    if !state.access.authorize(Screen::ViewData, &form.password).is_granted() {
        warn!(
            event_name = "web.view.denied",
            correlation_id = %correlation_id,
            "wrong password for the view data screen"
        );
        return Err(denied(&state, Screen::ViewData));
    }

    let snapshot = state
        .loader
        .load()
        .await
        .map_err(|e| failure(&state, persistence(e), &correlation_id))?;

    let balances = reconcile(&snapshot.entries, &snapshot.sales);

    let entries: Vec<serde_json::Value> = snapshot
        .entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "product": e.product,
                "lot": e.lot.0,
                "quantity": e.quantity,
                "sector": e.sector,
                "entry_date": codec::format_date(e.entry_date),
                "expiry_date": codec::format_date(e.expiry_date),
                "unit_cost": codec::format_money(e.unit_cost),
                "sale_unit_price": codec::format_money(e.sale_unit_price),
            })
        })
        .collect();

    let sales: Vec<serde_json::Value> = snapshot
        .sales
        .iter()
        .map(|s| {
            serde_json::json!({
                "sale_code": s.sale_code,
                "product": s.product,
                "lot": s.lot.0,
                "quantity": s.quantity,
                "payment_method": s.payment_method,
                "sale_date": codec::format_date(s.sale_date),
                "unit_value": codec::format_money(s.unit_value),
                "total_value": codec::format_money(s.total_value),
            })
        })
        .collect();

    let reconciled: Vec<serde_json::Value> = balances
        .iter()
        .map(|b| {
            serde_json::json!({
                "product": b.product,
                "lot": b.lot.0,
                "quantity_entered": b.quantity_entered,
                "quantity_sold": b.quantity_sold,
                "saldo": b.saldo,
                "entry_date": b.entry_date.map(codec::format_date).unwrap_or_default(),
                "expiry_date": b.expiry_date.map(codec::format_date).unwrap_or_default(),
                "unit_cost": codec::format_money(b.unit_cost),
                "sector": b.sector,
                "total_cost_exposure": codec::format_money(b.total_cost_exposure),
            })
        })
        .collect();

    info!(
        event_name = "web.view.rendered",
        correlation_id = %correlation_id,
        entry_rows = entries.len(),
        sale_rows = sales.len(),
        balance_rows = reconciled.len(),
        "view data screen rendered"
    );

    let mut context = Context::new();
    context.insert("entries", &entries);
    context.insert("sales", &sales);
    context.insert("balances", &reconciled);
    render(&state, "tables.html", &context)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn persistence(error: StoreError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

fn render(
    state: &AppState,
    template: &str,
    context: &Context,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state.templates.render(template, context).map(Html).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("<h1>Template Error</h1><pre>{e:?}</pre>")),
        )
    })
}

fn notice_html(
    state: &AppState,
    kind: &str,
    message: &str,
    correlation_id: Option<&str>,
) -> Html<String> {
    let mut context = Context::new();
    context.insert("kind", kind);
    context.insert("message", message);
    context.insert("correlation_id", &correlation_id);

    match state.templates.render("notice.html", &context) {
        Ok(html) => Html(html),
        Err(e) => Html(format!("<h1>Template Error</h1><pre>{e:?}</pre>")),
    }
}

fn notice(
    state: &AppState,
    status: StatusCode,
    kind: &str,
    message: &str,
    correlation_id: Option<&str>,
) -> (StatusCode, Html<String>) {
    (status, notice_html(state, kind, message, correlation_id))
}

fn denied(state: &AppState, screen: Screen) -> (StatusCode, Html<String>) {
    notice(
        state,
        StatusCode::UNAUTHORIZED,
        "warning",
        &format!("Wrong password! Access to {} denied.", screen.title()),
        None,
    )
}

fn failure(
    state: &AppState,
    error: ApplicationError,
    correlation_id: &str,
) -> (StatusCode, Html<String>) {
    // Domain rejections carry their precise reason to the user; everything
    // else gets the generic user-safe message.
    let detail = match &error {
        ApplicationError::Domain(domain) => Some(domain.to_string()),
        _ => None,
    };

    let interface = error.into_interface(correlation_id);
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    error!(
        event_name = "web.request.failed",
        correlation_id = %correlation_id,
        error = %interface,
        "request failed"
    );

    let message = detail.unwrap_or_else(|| interface.user_message().to_string());
    notice(state, status, "error", &message, Some(correlation_id))
}

fn request_id() -> String {
    format!("REQ-{}", &Uuid::new_v4().simple().to_string()[..12])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{extract::State, http::StatusCode, Form};
    use chrono::NaiveDate;
    use estoque_core::access::SharedPasswordPolicy;
    use estoque_core::domain::entry::{LotLabel, StockEntry};
    use estoque_core::domain::sale::Sale;
    use estoque_store::codec::{encode_entries, encode_sales};
    use estoque_store::{DatasetLoader, MemoryStore, PersistenceWriter, RecordStore};
    use rust_decimal::Decimal;

    use super::{submit_entry, view_data_page, AppState, EntryForm, GateForm};

    const PASSWORD: &str = "segredo";

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).expect("valid date")
    }

    fn setup() -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let loader = Arc::new(DatasetLoader::new(
            store.clone(),
            "registro_estoque",
            "vendas",
            Duration::ZERO,
        ));
        let writer =
            PersistenceWriter::new(store.clone(), loader.clone(), "registro_estoque", "vendas");
        let state = AppState::new(
            loader,
            Arc::new(writer),
            Arc::new(SharedPasswordPolicy::new(PASSWORD.to_string().into())),
        );

        (state, store)
    }

    fn entry_fixture(product: &str, lot: &str, quantity: i64, unit_cost: Decimal) -> StockEntry {
        StockEntry {
            product: product.to_string(),
            lot: LotLabel(lot.to_string()),
            quantity,
            sector: "PRODUCE".to_string(),
            entry_date: date(3, 1),
            expiry_date: date(9, 1),
            unit_cost,
            sale_unit_price: unit_cost * Decimal::TWO,
        }
    }

    fn sale_fixture(product: &str, lot: &str, quantity: i64) -> Sale {
        Sale {
            sale_code: "V-0001".to_string(),
            product: product.to_string(),
            lot: LotLabel(lot.to_string()),
            quantity,
            payment_method: "PIX".to_string(),
            sale_date: date(3, 5),
            unit_value: Decimal::TWO,
            total_value: Decimal::TWO * Decimal::from(quantity),
        }
    }

    fn entry_form(password: &str, product: &str) -> EntryForm {
        EntryForm {
            password: password.to_string(),
            product: product.to_string(),
            quantity: 20,
            sector: "produce".to_string(),
            entry_date: date(3, 1),
            expiry_date: date(9, 1),
            unit_cost: Decimal::new(125, 2),
            sale_unit_price: Decimal::new(250, 2),
        }
    }

    #[tokio::test]
    async fn first_entry_gets_lot_one_and_is_persisted_normalized() {
        let (state, store) = setup();

        let html = submit_entry(State(state), Form(entry_form(PASSWORD, "tomato")))
            .await
            .expect("entry should succeed");

        assert!(html.0.contains("LOT 1"));
        assert!(html.0.contains("TOMATO"));

        let sheet = store
            .read_table("registro_estoque")
            .await
            .expect("read")
            .expect("table created by save");
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0][0], "TOMATO");
        assert_eq!(sheet.rows[0][1], "LOT 1");
        assert_eq!(sheet.rows[0][3], "PRODUCE");
        assert_eq!(sheet.rows[0][6], "1.25");
    }

    #[tokio::test]
    async fn lot_numbers_continue_from_the_highest_existing_label() {
        let (state, store) = setup();
        store
            .insert_table(
                "registro_estoque",
                encode_entries(&[
                    entry_fixture("TOMATO", "LOT 1", 5, Decimal::ONE),
                    entry_fixture("TOMATO", "LOT 3", 5, Decimal::ONE),
                ]),
            )
            .await;

        let html = submit_entry(State(state), Form(entry_form(PASSWORD, "tomato")))
            .await
            .expect("entry should succeed");

        assert!(html.0.contains("LOT 4"));
    }

    #[tokio::test]
    async fn malformed_existing_label_rejects_the_entry_and_writes_nothing() {
        let (state, store) = setup();
        store
            .insert_table(
                "registro_estoque",
                encode_entries(&[entry_fixture("TOMATO", "REWORK", 5, Decimal::ONE)]),
            )
            .await;

        let (status, html) = submit_entry(State(state), Form(entry_form(PASSWORD, "tomato")))
            .await
            .expect_err("malformed label must reject the entry");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.0.contains("REWORK"));

        // The table still holds only the seeded row.
        let sheet = store.read_table("registro_estoque").await.expect("read").expect("seeded");
        assert_eq!(sheet.rows.len(), 1);
    }

    #[tokio::test]
    async fn wrong_password_on_entry_changes_nothing() {
        let (state, store) = setup();

        let (status, html) = submit_entry(State(state), Form(entry_form("errada", "tomato")))
            .await
            .expect_err("wrong password must be denied");

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(html.0.contains("Wrong password"));
        assert!(store.read_table("registro_estoque").await.expect("read").is_none());
        assert!(store.read_table("vendas").await.expect("read").is_none());
    }

    #[tokio::test]
    async fn wrong_password_on_view_shows_no_data() {
        let (state, store) = setup();
        store
            .insert_table(
                "registro_estoque",
                encode_entries(&[entry_fixture("TOMATO", "LOT 1", 20, Decimal::ONE)]),
            )
            .await;

        let (status, html) = view_data_page(
            State(state),
            Form(GateForm { password: "errada".to_string() }),
        )
        .await
        .expect_err("wrong password must be denied");

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!html.0.contains("TOMATO"));
    }

    #[tokio::test]
    async fn view_renders_raw_tables_and_reconciled_balances() {
        let (state, store) = setup();
        store
            .insert_table(
                "registro_estoque",
                encode_entries(&[entry_fixture("A", "LOT 1", 20, Decimal::ONE)]),
            )
            .await;
        store
            .insert_table("vendas", encode_sales(&[sale_fixture("A", "LOT 1", 5)]))
            .await;

        let html = view_data_page(
            State(state),
            Form(GateForm { password: PASSWORD.to_string() }),
        )
        .await
        .expect("view should render");

        // Reconciled row: saldo 15, exposure 15.00.
        assert!(html.0.contains(">15<"));
        assert!(html.0.contains("15.00"));
        // Raw sales row.
        assert!(html.0.contains("V-0001"));
    }

    #[tokio::test]
    async fn missing_tables_render_an_empty_view() {
        let (state, _store) = setup();

        let html = view_data_page(
            State(state),
            Form(GateForm { password: PASSWORD.to_string() }),
        )
        .await
        .expect("view should render");

        assert!(html.0.contains("Current Stock"));
    }
}
