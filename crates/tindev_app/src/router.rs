//! Two-screen switch navigator: Login ⇄ List.

use tindev_client::{ApiClient, Config, Session, SessionStore};

use crate::error::AppError;
use crate::screens::{ListOptions, ListScreen, LoginScreen};

pub enum Screen {
    Login(LoginScreen),
    List(ListScreen),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Login(_) => "login",
            Screen::List(_) => "list",
        }
    }
}

/// Owns the session store and whichever screen is showing.
pub struct App {
    api: ApiClient,
    store: SessionStore,
    options: ListOptions,
    screen: Screen,
}

impl App {
    /// Builds the app on the Login screen without touching storage.
    pub fn new(api: ApiClient, store: SessionStore, options: ListOptions) -> Self {
        Self {
            api,
            store,
            options,
            screen: Screen::Login(LoginScreen::new()),
        }
    }

    pub fn from_config(config: &Config, store: SessionStore) -> Result<Self, AppError> {
        let api = ApiClient::new(&config.effective_base_url(), config.request_timeout())?;
        Ok(Self::new(api, store, ListOptions::from_config(config)))
    }

    /// Restores a saved session straight into the List screen; otherwise
    /// stays on Login. The stored id is trusted until a server call fails.
    pub async fn start(mut self) -> Result<Self, AppError> {
        if let Some(session) = self.store.load()? {
            tracing::info!(user_id = session.user_id(), "restoring session");
            self.show_list(session).await?;
        }
        Ok(self)
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn list(&self) -> Option<&ListScreen> {
        match &self.screen {
            Screen::List(list) => Some(list),
            Screen::Login(_) => None,
        }
    }

    pub fn list_mut(&mut self) -> Option<&mut ListScreen> {
        match &mut self.screen {
            Screen::List(list) => Some(list),
            Screen::Login(_) => None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.list().map(ListScreen::session)
    }

    /// Submits `handle` from the Login screen and navigates to List.
    pub async fn login(&mut self, handle: &str) -> Result<&mut ListScreen, AppError> {
        let login = match &mut self.screen {
            Screen::Login(login) => login,
            Screen::List(_) => {
                return Err(AppError::WrongScreen {
                    operation: "login",
                    screen: "list",
                })
            }
        };
        login.set_handle(handle);
        let session = login.submit(&self.api, &self.store).await?;
        self.show_list(session).await?;
        self.list_mut().ok_or_else(|| AppError::Setup("list screen missing after login".into()))
    }

    /// Clears storage, tears down the List screen and returns to Login.
    pub async fn logout(&mut self) -> Result<(), AppError> {
        self.store.clear()?;
        let previous = std::mem::replace(&mut self.screen, Screen::Login(LoginScreen::new()));
        if let Screen::List(list) = previous {
            list.close().await;
        }
        tracing::info!("logged out");
        Ok(())
    }

    async fn show_list(&mut self, session: Session) -> Result<(), AppError> {
        let list = ListScreen::mount(session, self.api.clone(), &self.options).await?;
        let previous = std::mem::replace(&mut self.screen, Screen::List(list));
        if let Screen::List(old) = previous {
            old.close().await;
        }
        Ok(())
    }

    /// Tears down whatever screen is showing.
    pub async fn shutdown(self) {
        if let Screen::List(list) = self.screen {
            list.close().await;
        }
    }
}
