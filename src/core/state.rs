use crate::core::client::FantasyClient;
use crate::core::config::Args;
use crate::core::error::ConfigError;
use crate::core::oauth::OauthClient;
use crate::core::store::TokenStore;
use crate::utils::states::PendingStates;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pub(crate) store: TokenStore,
    pub(crate) oauth: OauthClient,
    pub(crate) client: FantasyClient,
    pub(crate) pending_states: PendingStates,
}

impl AppState {
    pub(crate) fn new(config: &Args) -> Result<Self, ConfigError> {
        let http = reqwest::ClientBuilder::new()
            .user_agent(concat!("fantasy-broker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let store = TokenStore::new(&config.token_path);
        let oauth = OauthClient::new(http.clone(), config);
        let client = FantasyClient::new(http, store.clone(), oauth.clone());

        Ok(AppState {
            store,
            oauth,
            client,
            pending_states: PendingStates::default(),
        })
    }

    /// State wired to stub endpoints instead of Yahoo.
    #[cfg(test)]
    pub(crate) fn for_tests(token_path: &std::path::Path, token_url: &str, base_url: &str) -> Self {
        let config = Args::for_tests(&token_path.to_string_lossy());
        let http = reqwest::Client::new();

        let store = TokenStore::new(&config.token_path);
        let oauth = OauthClient::new(http.clone(), &config).with_token_url(token_url);
        let client =
            FantasyClient::new(http, store.clone(), oauth.clone()).with_base_url(base_url);

        AppState {
            store,
            oauth,
            client,
            pending_states: PendingStates::default(),
        }
    }
}
