// src/prefs/mod.rs

//! User preference store: follows, subscription plan, role.
//!
//! One constructed store with an injected persistence backend, passed
//! explicitly to whoever needs it. Mutations write through to the backend
//! immediately; reads come from the in-memory copy.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Subscription tier. Plan switching is a state toggle; billing is not
/// this system's concern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    PremiumMonthly,
    PremiumYearly,
}

/// Current subscription state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSubscription {
    pub plan: SubscriptionPlan,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Role toggle gating the admin surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// The persisted preference state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub followed_brands: Vec<String>,
    #[serde(default)]
    pub followed_categories: Vec<String>,
    #[serde(default)]
    pub subscription: UserSubscription,
    #[serde(default)]
    pub role: UserRole,
}

/// Persistence backend for preferences.
#[async_trait]
pub trait PrefsBackend: Send + Sync {
    /// None when nothing has been saved yet.
    async fn load(&self) -> Result<Option<Preferences>>;

    async fn save(&self, prefs: &Preferences) -> Result<()>;
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryPrefsBackend {
    stored: RwLock<Option<Preferences>>,
}

#[async_trait]
impl PrefsBackend for MemoryPrefsBackend {
    async fn load(&self) -> Result<Option<Preferences>> {
        self.stored
            .read()
            .map(|s| s.clone())
            .map_err(|_| AppError::config("prefs backend lock poisoned"))
    }

    async fn save(&self, prefs: &Preferences) -> Result<()> {
        self.stored
            .write()
            .map(|mut s| *s = Some(prefs.clone()))
            .map_err(|_| AppError::config("prefs backend lock poisoned"))
    }
}

/// User preference store with write-through persistence.
pub struct PreferenceStore {
    backend: Box<dyn PrefsBackend>,
    state: RwLock<Preferences>,
}

impl PreferenceStore {
    /// Load preferences from the backend, starting fresh when none exist.
    pub async fn load(backend: Box<dyn PrefsBackend>) -> Result<Self> {
        let state = backend.load().await?.unwrap_or_default();
        Ok(Self {
            backend,
            state: RwLock::new(state),
        })
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> Result<Preferences> {
        self.state
            .read()
            .map(|s| s.clone())
            .map_err(|_| Self::lock_err())
    }

    /// Toggle following a brand; returns whether the brand is now followed.
    pub async fn toggle_brand(&self, brand_id: &str) -> Result<bool> {
        self.mutate(|prefs| toggle(&mut prefs.followed_brands, brand_id))
            .await
    }

    /// Toggle following a category; returns whether it is now followed.
    pub async fn toggle_category(&self, category_id: &str) -> Result<bool> {
        self.mutate(|prefs| toggle(&mut prefs.followed_categories, category_id))
            .await
    }

    pub fn is_following_brand(&self, brand_id: &str) -> Result<bool> {
        Ok(self.snapshot()?.followed_brands.iter().any(|b| b == brand_id))
    }

    pub fn is_following_category(&self, category_id: &str) -> Result<bool> {
        Ok(self
            .snapshot()?
            .followed_categories
            .iter()
            .any(|c| c == category_id))
    }

    /// Switch the subscription plan.
    pub async fn set_plan(
        &self,
        plan: SubscriptionPlan,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UserSubscription> {
        self.mutate(|prefs| {
            prefs.subscription = UserSubscription { plan, expires_at };
            prefs.subscription
        })
        .await
    }

    pub fn subscription(&self) -> Result<UserSubscription> {
        Ok(self.snapshot()?.subscription)
    }

    /// Flip the admin role toggle.
    pub async fn set_role(&self, role: UserRole) -> Result<UserRole> {
        self.mutate(|prefs| {
            prefs.role = role;
            role
        })
        .await
    }

    pub fn role(&self) -> Result<UserRole> {
        Ok(self.snapshot()?.role)
    }

    /// Mutate under the lock, then write through.
    async fn mutate<T>(&self, f: impl FnOnce(&mut Preferences) -> T) -> Result<T> {
        let (result, copy) = {
            let mut state = self.state.write().map_err(|_| Self::lock_err())?;
            let result = f(&mut state);
            (result, state.clone())
        };
        self.backend.save(&copy).await?;
        Ok(result)
    }

    fn lock_err() -> AppError {
        AppError::config("preference store lock poisoned")
    }
}

fn toggle(list: &mut Vec<String>, id: &str) -> bool {
    if let Some(pos) = list.iter().position(|x| x == id) {
        list.remove(pos);
        false
    } else {
        list.push(id.to_string());
        true
    }
}
