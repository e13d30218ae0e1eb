use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct Args {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub(crate) redirect_uri: String,
    #[serde(default = "default_scope")]
    pub(crate) scope: String,
    #[serde(default = "default_token_path")]
    pub(crate) token_path: String,
    #[serde(default = "default_log_level")]
    pub(crate) log_level: String,
    #[serde(default = "default_port")]
    pub(crate) port: u16,
}

fn default_redirect_uri() -> String {
    String::from("http://localhost:3476/auth/callback")
}

fn default_scope() -> String {
    String::from("fspt-r")
}

fn default_token_path() -> String {
    String::from(".yahoo-tokens.json")
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_port() -> u16 {
    3476
}

#[cfg(test)]
impl Args {
    pub(crate) fn for_tests(token_path: &str) -> Self {
        Self {
            client_id: String::from("test-client-id"),
            client_secret: String::from("test-client-secret"),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
            token_path: token_path.to_string(),
            log_level: default_log_level(),
            port: default_port(),
        }
    }
}
