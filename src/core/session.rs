use crate::core::{PreferenceStore, Theme, User};
use crate::utils::error::Result;
use uuid::Uuid;

pub const THEME_KEY: &str = "theme";
const DEFAULT_USER_NAME: &str = "Student User";

/// 目前登入的使用者 (mock，不驗證帳密)
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&mut self, email: &str, name: &str) -> &User {
        let name = match name.trim() {
            "" => DEFAULT_USER_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_string(),
            name,
            avatar: None,
        };
        tracing::info!("👤 Signed in as {} <{}>", user.name, user.email);
        self.user.insert(user)
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!("Signed out {}", user.name);
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

/// 顯示主題；每次切換都寫回偏好設定
pub struct ThemeState<S: PreferenceStore> {
    store: S,
    theme: Theme,
}

impl<S: PreferenceStore> ThemeState<S> {
    /// 啟動時讀回上次的主題，讀不到就用 light
    pub async fn load(store: S) -> Self {
        let theme = match store.get(THEME_KEY).await {
            Ok(Some(value)) => value.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring unknown stored theme '{}'", value);
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!("Could not read theme preference: {}", e);
                Theme::default()
            }
        };
        tracing::debug!("Loaded theme: {}", theme);
        Self { store, theme }
    }

    pub fn current(&self) -> Theme {
        self.theme
    }

    pub fn is_dark(&self) -> bool {
        self.theme == Theme::Dark
    }

    /// 寫入成功後才切換；寫入失敗時維持原本的主題
    pub async fn toggle(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        self.store.set(THEME_KEY, next.as_str()).await?;
        self.theme = next;
        tracing::debug!("Theme switched to {}", self.theme);
        Ok(self.theme)
    }
}
