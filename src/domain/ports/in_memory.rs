use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{
    CollaboratorError, MenuItemSnapshot, MenuLookup, Notification, NotificationSink,
    PartnerDirectory, PartnerProfile, RateSource, RestaurantDirectory, RestaurantProfile,
};
use crate::domain::pricing::PlatformRates;

// ============================================================================
// In-Memory Collaborators
// ============================================================================

#[derive(Debug, Clone)]
struct MenuEntry {
    restaurant_id: Uuid,
    name: String,
    price: Decimal,
    is_available: bool,
    is_active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingSummary {
    pub average: Decimal,
    pub count: u32,
}

#[derive(Default)]
struct CatalogState {
    restaurants: HashMap<Uuid, RestaurantProfile>,
    ratings: HashMap<Uuid, RatingSummary>,
    menu: HashMap<Uuid, MenuEntry>,
    partners: HashMap<Uuid, PartnerProfile>,
}

/// Restaurants, menus and delivery partners held in one process-local map.
#[derive(Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open, approved restaurant and return its id
    pub async fn add_restaurant(&self, name: &str, owner_id: Uuid, commission_override: Option<Decimal>) -> Uuid {
        let id = Uuid::new_v4();
        let profile = RestaurantProfile {
            id,
            owner_id,
            name: name.to_string(),
            is_open: true,
            is_approved: true,
            commission_override,
        };
        self.state.write().await.restaurants.insert(id, profile);
        id
    }

    pub async fn set_open(&self, restaurant_id: Uuid, is_open: bool) {
        if let Some(r) = self.state.write().await.restaurants.get_mut(&restaurant_id) {
            r.is_open = is_open;
        }
    }

    pub async fn set_approved(&self, restaurant_id: Uuid, is_approved: bool) {
        if let Some(r) = self.state.write().await.restaurants.get_mut(&restaurant_id) {
            r.is_approved = is_approved;
        }
    }

    pub async fn set_commission_override(&self, restaurant_id: Uuid, commission: Option<Decimal>) {
        if let Some(r) = self.state.write().await.restaurants.get_mut(&restaurant_id) {
            r.commission_override = commission;
        }
    }

    pub async fn rating_of(&self, restaurant_id: Uuid) -> RatingSummary {
        self.state.read().await.ratings.get(&restaurant_id).copied().unwrap_or_default()
    }

    /// Add an available, active menu item and return its id
    pub async fn add_menu_item(&self, restaurant_id: Uuid, name: &str, price: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        let entry = MenuEntry {
            restaurant_id,
            name: name.to_string(),
            price,
            is_available: true,
            is_active: true,
        };
        self.state.write().await.menu.insert(id, entry);
        id
    }

    pub async fn set_price(&self, item_id: Uuid, price: Decimal) {
        if let Some(item) = self.state.write().await.menu.get_mut(&item_id) {
            item.price = price;
        }
    }

    pub async fn set_available(&self, item_id: Uuid, is_available: bool) {
        if let Some(item) = self.state.write().await.menu.get_mut(&item_id) {
            item.is_available = is_available;
        }
    }

    pub async fn remove_menu_item(&self, item_id: Uuid) {
        self.state.write().await.menu.remove(&item_id);
    }

    /// Register an approved, active delivery partner and return its id
    pub async fn add_partner(&self) -> Uuid {
        let id = Uuid::new_v4();
        let profile = PartnerProfile {
            id,
            is_approved: true,
            is_active: true,
        };
        self.state.write().await.partners.insert(id, profile);
        id
    }

    pub async fn set_partner_flags(&self, partner_id: Uuid, is_approved: bool, is_active: bool) {
        if let Some(p) = self.state.write().await.partners.get_mut(&partner_id) {
            p.is_approved = is_approved;
            p.is_active = is_active;
        }
    }
}

#[async_trait]
impl MenuLookup for InMemoryCatalog {
    async fn get_available_item(
        &self,
        restaurant_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<MenuItemSnapshot>, CollaboratorError> {
        let state = self.state.read().await;
        let snapshot = state
            .menu
            .get(&item_id)
            .filter(|item| item.restaurant_id == restaurant_id && item.is_available && item.is_active)
            .map(|item| MenuItemSnapshot {
                item_id,
                name: item.name.clone(),
                price: item.price,
            });
        Ok(snapshot)
    }
}

#[async_trait]
impl RestaurantDirectory for InMemoryCatalog {
    async fn get_restaurant(&self, restaurant_id: Uuid) -> Result<Option<RestaurantProfile>, CollaboratorError> {
        Ok(self.state.read().await.restaurants.get(&restaurant_id).cloned())
    }

    async fn record_rating(&self, restaurant_id: Uuid, rating: u8) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().await;
        if !state.restaurants.contains_key(&restaurant_id) {
            return Ok(());
        }
        let summary = state.ratings.entry(restaurant_id).or_default();
        let count = summary.count + 1;
        let total = summary.average * Decimal::from(summary.count) + Decimal::from(rating);
        summary.average = (total / Decimal::from(count))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        summary.count = count;
        Ok(())
    }
}

#[async_trait]
impl PartnerDirectory for InMemoryCatalog {
    async fn get_partner(&self, partner_id: Uuid) -> Result<Option<PartnerProfile>, CollaboratorError> {
        Ok(self.state.read().await.partners.get(&partner_id).cloned())
    }
}

/// Singleton rate configuration; every update publishes a new version.
pub struct InMemoryRateSource {
    rates: RwLock<PlatformRates>,
}

impl InMemoryRateSource {
    pub fn new(rates: PlatformRates) -> Self {
        Self {
            rates: RwLock::new(rates),
        }
    }

    pub async fn update<F>(&self, change: F) -> PlatformRates
    where
        F: FnOnce(&mut PlatformRates),
    {
        let mut rates = self.rates.write().await;
        change(&mut rates);
        rates.version += 1;
        tracing::info!(version = rates.version, "Platform rates updated");
        rates.clone()
    }
}

impl Default for InMemoryRateSource {
    fn default() -> Self {
        Self::new(PlatformRates::default())
    }
}

#[async_trait]
impl RateSource for InMemoryRateSource {
    async fn current_rates(&self) -> Result<PlatformRates, CollaboratorError> {
        Ok(self.rates.read().await.clone())
    }
}

/// Keeps every notification it receives, in order.
#[derive(Default)]
pub struct RecordingNotificationSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), CollaboratorError> {
        self.sent.lock().await.push(notification);
        Ok(())
    }
}
