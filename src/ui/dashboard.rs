use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::format::{escape_html, fixed2, fixed2_or_zero, fixed4, fixed4_or_na};
use super::{PageSurface, Region, Surface};
use crate::backend::{Backend, BackendError};
use crate::types::{ActiveState, DashboardData, DashboardItem, StrategyAction};

pub const LOADING_TEXT: &str = "Loading strategies...";
pub const ADD_STRATEGY_PATH: &str = "/add-strategy-page";

/// Per-card run state, derived once from the fetched active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    Running,
    Paused,
    NotStarted,
}

impl CardStatus {
    pub fn from_state(state: Option<&ActiveState>) -> Self {
        match state {
            Some(s) if s.is_running => CardStatus::Running,
            Some(_) => CardStatus::Paused,
            None => CardStatus::NotStarted,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardStatus::Running => "Running",
            CardStatus::Paused => "Paused/Stopped",
            CardStatus::NotStarted => "Not Started",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            CardStatus::Running => "status-running",
            CardStatus::Paused => "status-paused",
            CardStatus::NotStarted => "status-idle",
        }
    }

    /// Transition fired by the run/pause button.
    pub fn next_action(&self) -> StrategyAction {
        match self {
            CardStatus::Running => StrategyAction::Pause,
            CardStatus::Paused | CardStatus::NotStarted => StrategyAction::Start,
        }
    }

    pub fn toggle_label(&self) -> &'static str {
        match self.next_action() {
            StrategyAction::Pause => "Pause",
            _ => "Run",
        }
    }

    pub fn can_stop(&self) -> bool {
        !matches!(self, CardStatus::NotStarted)
    }
}

/// Derived figures for an open position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionFigures {
    pub quantity: Decimal,
    pub average_entry_price: Decimal,
    pub market_price: Decimal,
    pub position_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub pnl_percentage: Decimal,
}

impl PositionFigures {
    /// Only computed with a positive quantity and a known market price;
    /// anything else has no position block at all.
    pub fn compute(state: &ActiveState, market_price: Option<Decimal>) -> Option<Self> {
        let price = market_price?;
        if !state.has_position() {
            return None;
        }

        let quantity = state.current_position_quantity;
        let figures = Self::checked(quantity, state.average_entry_price, price, state.total_invested_usdt);
        if figures.is_none() {
            warn!(
                "Position figures out of range (qty {}, avg {}, price {}, invested {})",
                quantity, state.average_entry_price, price, state.total_invested_usdt
            );
        }
        let (position_value, unrealized_pnl, pnl_percentage) = figures?;

        Some(Self {
            quantity,
            average_entry_price: state.average_entry_price,
            market_price: price,
            position_value,
            unrealized_pnl,
            pnl_percentage,
        })
    }

    /// Value, PnL and PnL percentage, or `None` if any step leaves the
    /// `Decimal` range.
    fn checked(
        quantity: Decimal,
        average_entry_price: Decimal,
        price: Decimal,
        invested: Decimal,
    ) -> Option<(Decimal, Decimal, Decimal)> {
        let position_value = quantity.checked_mul(price)?;
        let unrealized_pnl = price.checked_sub(average_entry_price)?.checked_mul(quantity)?;
        let pnl_percentage = if invested.is_zero() {
            Decimal::ZERO
        } else {
            unrealized_pnl
                .checked_div(invested)?
                .checked_mul(Decimal::ONE_HUNDRED)?
        };
        Some((position_value, unrealized_pnl, pnl_percentage))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyCard {
    pub id: Uuid,
    pub name: String,
    pub trading_pair: String,
    pub api_id: Uuid,
    pub status: CardStatus,
    pub market_price: Option<Decimal>,
    pub position: Option<PositionFigures>,
    pub realized_pnl: Option<Decimal>,
    pub total_invested: Option<Decimal>,
    pub cover_orders: Option<u32>,
    pub last_error: Option<String>,
}

impl StrategyCard {
    pub fn from_item(item: &DashboardItem) -> Self {
        let config = &item.strategy_config;
        let state = item.active_state.as_ref();

        Self {
            id: config.id,
            name: config.strategy_name.clone(),
            trading_pair: config.trading_pair.clone(),
            api_id: config.api_id,
            status: CardStatus::from_state(state),
            market_price: item.current_market_price,
            position: state.and_then(|s| PositionFigures::compute(s, item.current_market_price)),
            realized_pnl: state.map(|s| s.realized_pnl_usdt),
            total_invested: state.map(|s| s.total_invested_usdt),
            cover_orders: state.map(|s| s.cover_orders_count),
            last_error: state.and_then(|s| s.last_error.clone()),
        }
    }

    pub fn render(&self) -> String {
        let id = self.id;
        let mut html = String::new();

        html.push_str(&format!(r#"<div class="card strategy-card" data-id="{}">"#, id));
        html.push_str(&format!(r#"<h3 class="card-title">{}</h3>"#, escape_html(&self.name)));
        html.push_str(&format!(
            r#"<p>Pair: <strong>{}</strong></p><p class="muted">API: {}</p>"#,
            escape_html(&self.trading_pair),
            self.api_id
        ));
        html.push_str(&format!(
            r#"<p>Status: <span class="status {}">{}</span></p>"#,
            self.status.css_class(),
            self.status.label()
        ));
        html.push_str(&format!(
            "<p>Current Price: {}</p>",
            fixed4_or_na(self.market_price)
        ));

        match &self.position {
            Some(p) => {
                let class = pnl_class(p.unrealized_pnl);
                html.push_str(&format!(
                    concat!(
                        r#"<div class="position">"#,
                        "<p>Position: {} @ {}</p>",
                        "<p>Position Value: {} USDT</p>",
                        r#"<p>Unrealized PnL: <span class="{}">{} USDT ({}%)</span></p>"#,
                        "</div>"
                    ),
                    fixed4(p.quantity),
                    fixed4(p.average_entry_price),
                    fixed2(p.position_value),
                    class,
                    fixed2(p.unrealized_pnl),
                    fixed2(p.pnl_percentage),
                ));
            }
            None => {
                html.push_str(r#"<div class="position"><p>Position: No current position</p></div>"#);
            }
        }

        html.push_str(&format!(
            r#"<p>Realized PnL: <span class="{}">{} USDT</span></p>"#,
            pnl_class(self.realized_pnl.unwrap_or(Decimal::ZERO)),
            fixed2_or_zero(self.realized_pnl)
        ));
        html.push_str(&format!(
            "<p>Total Invested: {} USDT</p>",
            fixed2_or_zero(self.total_invested)
        ));
        if let Some(count) = self.cover_orders {
            html.push_str(&format!("<p>Cover Orders: {}</p>", count));
        }
        if let Some(err) = &self.last_error {
            html.push_str(&format!(r#"<p class="negative">Last error: {}</p>"#, escape_html(err)));
        }

        html.push_str(r#"<div class="card-actions">"#);
        html.push_str(&action_button(id, "toggle", self.status.toggle_label(), "btn"));
        if self.status.can_stop() {
            html.push_str(&action_button(id, "stop", "Stop", "btn btn-secondary"));
        }
        html.push_str(&action_button(id, "modify", "Modify", "btn btn-secondary"));
        html.push_str(&action_button(id, "delete", "Delete", "btn btn-danger"));
        html.push_str("</div></div>");

        html
    }
}

fn pnl_class(value: Decimal) -> &'static str {
    if value > Decimal::ZERO {
        "positive"
    } else if value < Decimal::ZERO {
        "negative"
    } else {
        "neutral"
    }
}

fn action_button(id: Uuid, action: &str, label: &str, class: &str) -> String {
    format!(
        r#"<form method="post" action="/dashboard/strategies/{id}/{action}" class="inline-form"><button type="submit" class="{class}" data-id="{id}">{label}</button></form>"#,
    )
}

pub fn render_strategy_list(cards: &[StrategyCard]) -> String {
    if cards.is_empty() {
        return format!(
            r#"<p class="empty">No strategies configured yet. <a href="{}">Create your first strategy</a>.</p>"#,
            ADD_STRATEGY_PATH
        );
    }

    let mut html = String::from(r#"<div class="grid grid-3">"#);
    for card in cards {
        html.push_str(&card.render());
    }
    html.push_str("</div>");
    html
}

#[derive(Debug, Clone)]
struct TrackedCard {
    name: String,
    status: CardStatus,
}

/// What the dashboard knows between refreshes: the run state per card,
/// which is the only input the run/pause button reads.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    cards: HashMap<Uuid, TrackedCard>,
    last_updated: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn status_of(&self, id: Uuid) -> Option<CardStatus> {
        self.cards.get(&id).map(|c| c.status)
    }

    pub fn name_of(&self, id: Uuid) -> Option<&str> {
        self.cards.get(&id).map(|c| c.name.as_str())
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub state: DashboardState,
    pub surface: PageSurface,
}

impl Default for DashboardView {
    fn default() -> Self {
        let mut surface = PageSurface::new();
        surface.replace(
            Region::DashboardStatus,
            format!(r#"<p class="loading">{}</p>"#, LOADING_TEXT),
        );
        Self {
            state: DashboardState::default(),
            surface,
        }
    }
}

/// Shared dashboard snapshot plus the refresh generation counter.
///
/// Every refresh takes a generation when it fires; a response is only
/// applied while its generation is still the newest, so the most recently
/// fired refresh wins regardless of which response arrives last.
#[derive(Debug, Default)]
pub struct DashboardHub {
    view: RwLock<DashboardView>,
    generation: AtomicU64,
}

impl DashboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Applies a fetch result if `generation` is still current.
    /// Returns whether it was applied.
    pub async fn apply(&self, generation: u64, result: Result<DashboardData, BackendError>) -> bool {
        let mut view = self.view.write().await;
        // Checked under the write lock so a newer apply cannot slip in between
        if !self.is_current(generation) {
            debug!("Discarding stale dashboard refresh #{}", generation);
            return false;
        }
        let DashboardView { state, surface } = &mut *view;
        DashboardController::apply(state, surface, result);
        true
    }

    pub async fn status_of(&self, id: Uuid) -> Option<CardStatus> {
        self.view.read().await.state.status_of(id)
    }

    pub async fn name_of(&self, id: Uuid) -> Option<String> {
        self.view.read().await.state.name_of(id).map(str::to_string)
    }

    pub async fn snapshot(&self) -> DashboardView {
        self.view.read().await.clone()
    }
}

pub struct DashboardController {
    backend: Arc<dyn Backend>,
}

impl DashboardController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn fetch(&self) -> Result<DashboardData, BackendError> {
        self.backend.dashboard_data().await
    }

    /// Rebuilds the strategy list from a fetch result. On failure only the
    /// status line changes; previously rendered cards stay in place.
    pub fn apply(
        state: &mut DashboardState,
        surface: &mut dyn Surface,
        result: Result<DashboardData, BackendError>,
    ) {
        match result {
            Ok(data) => {
                let cards: Vec<StrategyCard> =
                    data.strategies_data.iter().map(StrategyCard::from_item).collect();

                state.cards = cards
                    .iter()
                    .map(|c| {
                        (
                            c.id,
                            TrackedCard {
                                name: c.name.clone(),
                                status: c.status,
                            },
                        )
                    })
                    .collect();
                let now = Utc::now();
                state.last_updated = Some(now);

                surface.replace(Region::StrategyList, render_strategy_list(&cards));
                surface.replace(
                    Region::DashboardStatus,
                    format!(
                        r#"<p class="muted">Last updated {}</p>"#,
                        now.format("%Y-%m-%d %H:%M:%S UTC")
                    ),
                );
                debug!("Dashboard refreshed with {} strategies", cards.len());
            }
            Err(e) => {
                warn!("Failed to load dashboard data: {}", e);
                surface.replace(
                    Region::DashboardStatus,
                    format!(
                        r#"<p class="error">Error loading dashboard data: {}. Please try again later.</p>"#,
                        escape_html(&e.user_message("server error"))
                    ),
                );
            }
        }
    }

    pub async fn refresh(&self, hub: &DashboardHub) -> bool {
        let generation = hub.begin_refresh();
        let result = self.fetch().await;
        hub.apply(generation, result).await
    }

    /// Run/pause button: the tracked card status decides the transition.
    pub async fn toggle(&self, hub: &DashboardHub, id: Uuid, surface: &mut dyn Surface) {
        let Some(status) = hub.status_of(id).await else {
            surface.alert("This strategy is no longer on the dashboard. Please refresh and try again.");
            return;
        };
        self.control(hub, id, status.next_action(), surface).await;
    }

    pub async fn stop(&self, hub: &DashboardHub, id: Uuid, surface: &mut dyn Surface) {
        match hub.status_of(id).await {
            Some(status) if status.can_stop() => {
                self.control(hub, id, StrategyAction::Stop, surface).await;
            }
            Some(_) => surface.alert("This strategy has not been started."),
            None => surface.alert("This strategy is no longer on the dashboard. Please refresh and try again."),
        }
    }

    async fn control(
        &self,
        hub: &DashboardHub,
        id: Uuid,
        action: StrategyAction,
        surface: &mut dyn Surface,
    ) {
        match self.backend.control_strategy(id, action).await {
            Ok(()) => {
                info!("Strategy {} {} requested", id, action);
                self.refresh(hub).await;
            }
            Err(e) => {
                warn!("Failed to {} strategy {}: {}", action, id, e);
                surface.alert(&format!(
                    "Failed to {} strategy: {}",
                    action,
                    e.user_message("Unknown error")
                ));
            }
        }
    }

    pub fn modify(&self, id: Uuid, surface: &mut dyn Surface) {
        debug!("Modify requested for strategy {}", id);
        surface.alert(&format!(
            "Modify strategy {}: editing is not available yet.",
            id
        ));
    }

    pub async fn delete(&self, hub: &DashboardHub, id: Uuid, surface: &mut dyn Surface) {
        let name = hub.name_of(id).await.unwrap_or_else(|| id.to_string());
        let prompt = format!(
            "Are you sure you want to delete strategy '{}'? This cannot be undone.",
            name
        );
        if !surface.confirm(&prompt) {
            return;
        }

        match self.backend.delete_strategy(id).await {
            Ok(()) => {
                info!("Strategy {} deleted", id);
                self.refresh(hub).await;
            }
            Err(e) => {
                warn!("Failed to delete strategy {}: {}", id, e);
                surface.alert(&format!(
                    "Failed to delete strategy: {}",
                    e.user_message("Unknown error")
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::types::StrategyConfig;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    const STRATEGY_ID: &str = "5c0b9f8e-1d2a-4b3c-8e7f-6a5b4c3d2e1f";

    fn strategy_id() -> Uuid {
        Uuid::from_str(STRATEGY_ID).unwrap()
    }

    fn config(name: &str) -> StrategyConfig {
        serde_json::from_value(serde_json::json!({
            "id": STRATEGY_ID,
            "api_id": "1b2f7e9c-3f5e-4d6a-9c1b-0e8f7a6b5c4d",
            "strategy_name": name,
            "trading_pair": "SUI/USDT"
        }))
        .unwrap()
    }

    fn active(running: bool, qty: Decimal, avg: Decimal, invested: Decimal) -> ActiveState {
        ActiveState {
            strategy_id: Some(strategy_id()),
            is_running: running,
            current_position_quantity: qty,
            average_entry_price: avg,
            realized_pnl_usdt: dec!(1.25),
            total_invested_usdt: invested,
            unrealized_pnl_usdt: Decimal::ZERO,
            cover_orders_count: 0,
            last_error: None,
        }
    }

    fn item(state: Option<ActiveState>, price: Option<Decimal>) -> DashboardItem {
        DashboardItem {
            strategy_config: config("SUI grid"),
            active_state: state,
            current_market_price: price,
        }
    }

    fn data(items: Vec<DashboardItem>) -> DashboardData {
        DashboardData {
            strategies_data: items,
        }
    }

    #[test]
    fn test_position_figures_are_exact() {
        let state = active(true, dec!(2.5), dec!(1.2), dec!(3.0));
        let figures = PositionFigures::compute(&state, Some(dec!(1.5))).unwrap();

        assert_eq!(figures.position_value, dec!(2.5) * dec!(1.5));
        assert_eq!(figures.unrealized_pnl, (dec!(1.5) - dec!(1.2)) * dec!(2.5));
        assert_eq!(figures.pnl_percentage, dec!(25));
    }

    #[test]
    fn test_zero_invested_gives_zero_percentage() {
        let state = active(true, dec!(5), dec!(10), Decimal::ZERO);
        let figures = PositionFigures::compute(&state, Some(dec!(12))).unwrap();

        assert_eq!(figures.unrealized_pnl, dec!(10));
        assert_eq!(figures.pnl_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_no_position_without_price_or_quantity() {
        let with_qty = active(true, dec!(5), dec!(10), dec!(50));
        assert!(PositionFigures::compute(&with_qty, None).is_none());

        let flat = active(true, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        assert!(PositionFigures::compute(&flat, Some(dec!(10))).is_none());
    }

    #[test]
    fn test_overflowing_position_value_has_no_figures() {
        let huge = Decimal::from_str("1000000000000000").unwrap();
        let state = active(true, huge, dec!(1), huge);
        assert!(PositionFigures::compute(&state, Some(huge)).is_none());
    }

    #[test]
    fn test_tiny_investment_does_not_overflow_percentage() {
        let state = active(true, dec!(1000000), dec!(1), dec!(0.00000000000000000001));
        assert!(PositionFigures::compute(&state, Some(dec!(100000))).is_none());
    }

    #[test]
    fn test_out_of_range_card_still_renders() {
        let huge = Decimal::from_str("1000000000000000").unwrap();
        let mut state = DashboardState::default();
        let mut surface = PageSurface::new();
        let extreme = item(Some(active(true, huge, dec!(1), huge)), Some(huge));

        DashboardController::apply(&mut state, &mut surface, Ok(data(vec![extreme])));

        let list = surface.region(Region::StrategyList).unwrap();
        assert!(list.contains("Position: No current position"));
        assert_eq!(state.card_count(), 1);
        assert!(surface
            .region(Region::DashboardStatus)
            .unwrap()
            .contains("Last updated"));
    }

    #[test]
    fn test_card_status_labels() {
        assert_eq!(CardStatus::from_state(None), CardStatus::NotStarted);
        let running = active(true, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        let paused = active(false, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(CardStatus::from_state(Some(&running)).label(), "Running");
        assert_eq!(CardStatus::from_state(Some(&paused)).label(), "Paused/Stopped");
        assert_eq!(CardStatus::NotStarted.label(), "Not Started");

        assert_eq!(CardStatus::Running.next_action(), StrategyAction::Pause);
        assert_eq!(CardStatus::Paused.next_action(), StrategyAction::Start);
        assert_eq!(CardStatus::NotStarted.next_action(), StrategyAction::Start);
    }

    #[test]
    fn test_not_started_card_has_no_position_block() {
        let card = StrategyCard::from_item(&item(None, Some(dec!(1.5))));
        let html = card.render();

        assert!(html.contains("Not Started"));
        assert!(html.contains("Position: No current position"));
        assert!(!html.contains("Unrealized PnL"));
        assert!(html.contains("Realized PnL: <span class=\"neutral\">0.00 USDT</span>"));
        assert!(!html.contains(">Stop<"));
    }

    #[test]
    fn test_null_price_with_quantity_renders_placeholder() {
        let state = active(true, dec!(5), dec!(2), dec!(10));
        let card = StrategyCard::from_item(&item(Some(state), None));
        let html = card.render();

        assert!(card.position.is_none());
        assert!(html.contains("Current Price: N/A"));
        assert!(html.contains("Position: No current position"));
        assert!(!html.contains("Unrealized PnL"));
    }

    #[test]
    fn test_open_position_rendering() {
        let state = active(true, dec!(2), dec!(1.5), dec!(3));
        let card = StrategyCard::from_item(&item(Some(state), Some(dec!(1.75))));
        let html = card.render();

        assert!(html.contains("Running"));
        assert!(html.contains("Current Price: 1.7500"));
        assert!(html.contains("Position: 2.0000 @ 1.5000"));
        assert!(html.contains("Position Value: 3.50 USDT"));
        assert!(html.contains("0.50 USDT (16.67%)"));
        assert!(html.contains(">Pause<"));
        assert!(html.contains(&format!("data-id=\"{}\"", STRATEGY_ID)));
    }

    #[test]
    fn test_card_escapes_strategy_name() {
        let mut it = item(None, None);
        it.strategy_config.strategy_name = "<script>x</script>".to_string();
        let html = StrategyCard::from_item(&it).render();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_empty_list_message() {
        let html = render_strategy_list(&[]);
        assert!(html.to_lowercase().contains("no strategies configured"));
        assert!(html.contains(ADD_STRATEGY_PATH));
        assert!(!html.contains("strategy-card"));
    }

    #[test]
    fn test_failed_refresh_keeps_cards() {
        let mut state = DashboardState::default();
        let mut surface = PageSurface::new();

        DashboardController::apply(&mut state, &mut surface, Ok(data(vec![item(None, None)])));
        let list_before = surface.region(Region::StrategyList).unwrap().to_string();
        assert_eq!(state.status_of(strategy_id()), Some(CardStatus::NotStarted));

        DashboardController::apply(
            &mut state,
            &mut surface,
            Err(BackendError::Transport("connection refused".to_string())),
        );

        assert_eq!(surface.region(Region::StrategyList).unwrap(), list_before);
        let status = surface.region(Region::DashboardStatus).unwrap();
        assert!(status.contains("Error loading dashboard data"));
        assert!(status.contains("connection refused"));
        assert_eq!(state.card_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_refresh_is_discarded() {
        let hub = DashboardHub::new();
        let first = hub.begin_refresh();
        let second = hub.begin_refresh();

        assert!(hub.apply(second, Ok(data(vec![]))).await);
        assert!(!hub.apply(first, Ok(data(vec![item(None, None)]))).await);

        let view = hub.snapshot().await;
        assert_eq!(view.state.card_count(), 0);
        assert!(view
            .surface
            .region(Region::StrategyList)
            .unwrap()
            .contains("No strategies configured"));
    }

    #[tokio::test]
    async fn test_initial_view_shows_loading() {
        let hub = DashboardHub::new();
        let view = hub.snapshot().await;
        assert!(view
            .surface
            .region(Region::DashboardStatus)
            .unwrap()
            .contains(LOADING_TEXT));
        assert!(view.surface.region(Region::StrategyList).is_none());
    }

    #[tokio::test]
    async fn test_toggle_pauses_running_strategy_and_reloads() {
        let running = active(true, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        let mut backend = MockBackend::new();
        backend
            .expect_control_strategy()
            .withf(|id, action| *id == strategy_id() && *action == StrategyAction::Pause)
            .times(1)
            .returning(|_, _| Ok(()));
        let paused = active(false, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        backend
            .expect_dashboard_data()
            .times(1)
            .returning(move || Ok(data(vec![item(Some(paused.clone()), None)])));

        let hub = DashboardHub::new();
        let generation = hub.begin_refresh();
        hub.apply(generation, Ok(data(vec![item(Some(running), None)]))).await;

        let controller = DashboardController::new(Arc::new(backend));
        let mut surface = PageSurface::new();
        controller.toggle(&hub, strategy_id(), &mut surface).await;

        assert!(surface.alerts().is_empty());
        assert_eq!(hub.status_of(strategy_id()).await, Some(CardStatus::Paused));
    }

    #[tokio::test]
    async fn test_toggle_starts_not_started_strategy() {
        let mut backend = MockBackend::new();
        backend
            .expect_control_strategy()
            .withf(|_, action| *action == StrategyAction::Start)
            .times(1)
            .returning(|_, _| Ok(()));
        backend
            .expect_dashboard_data()
            .returning(|| Ok(DashboardData::default()));

        let hub = DashboardHub::new();
        let generation = hub.begin_refresh();
        hub.apply(generation, Ok(data(vec![item(None, None)]))).await;

        let controller = DashboardController::new(Arc::new(backend));
        controller.toggle(&hub, strategy_id(), &mut PageSurface::new()).await;
    }

    #[tokio::test]
    async fn test_toggle_unknown_strategy_sends_nothing() {
        let backend = MockBackend::new();
        let controller = DashboardController::new(Arc::new(backend));
        let hub = DashboardHub::new();
        let mut surface = PageSurface::new();

        controller.toggle(&hub, strategy_id(), &mut surface).await;
        assert_eq!(surface.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_action_alerts_without_reload() {
        let mut backend = MockBackend::new();
        backend.expect_control_strategy().returning(|_, _| {
            Err(BackendError::Http {
                status: 400,
                detail: Some("API Key 'main' is not connected.".to_string()),
            })
        });
        backend.expect_dashboard_data().times(0);

        let hub = DashboardHub::new();
        let generation = hub.begin_refresh();
        hub.apply(generation, Ok(data(vec![item(None, None)]))).await;

        let controller = DashboardController::new(Arc::new(backend));
        let mut surface = PageSurface::new();
        controller.toggle(&hub, strategy_id(), &mut surface).await;

        assert_eq!(
            surface.alerts(),
            ["Failed to start strategy: API Key 'main' is not connected.".to_string()]
        );
        assert_eq!(hub.status_of(strategy_id()).await, Some(CardStatus::NotStarted));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let mut backend = MockBackend::new();
        backend.expect_delete_strategy().times(0);
        let controller = DashboardController::new(Arc::new(backend));
        let hub = DashboardHub::new();
        let generation = hub.begin_refresh();
        hub.apply(generation, Ok(data(vec![item(None, None)]))).await;

        let mut surface = PageSurface::new();
        controller.delete(&hub, strategy_id(), &mut surface).await;

        let prompt = surface.pending_confirmation().unwrap();
        assert!(prompt.contains("SUI grid"));
    }

    #[tokio::test]
    async fn test_confirmed_delete_reloads_list() {
        let mut backend = MockBackend::new();
        backend
            .expect_delete_strategy()
            .withf(|id| *id == strategy_id())
            .times(1)
            .returning(|_| Ok(()));
        backend
            .expect_dashboard_data()
            .times(1)
            .returning(|| Ok(DashboardData::default()));

        let controller = DashboardController::new(Arc::new(backend));
        let hub = DashboardHub::new();
        let mut surface = PageSurface::confirmed();
        controller.delete(&hub, strategy_id(), &mut surface).await;

        assert!(surface.alerts().is_empty());
        assert_eq!(hub.snapshot().await.state.card_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_not_started_is_rejected_locally() {
        let mut backend = MockBackend::new();
        backend.expect_control_strategy().times(0);
        let controller = DashboardController::new(Arc::new(backend));
        let hub = DashboardHub::new();
        let generation = hub.begin_refresh();
        hub.apply(generation, Ok(data(vec![item(None, None)]))).await;

        let mut surface = PageSurface::new();
        controller.stop(&hub, strategy_id(), &mut surface).await;
        assert_eq!(surface.alerts().len(), 1);
    }

    #[test]
    fn test_modify_is_a_notice_only() {
        let controller = DashboardController::new(Arc::new(MockBackend::new()));
        let mut surface = PageSurface::new();
        controller.modify(strategy_id(), &mut surface);
        assert!(surface.alerts()[0].contains("not available yet"));
    }
}
