use std::io;

use reqwest::{Client, Response, Url};

use crate::{
    config::{AuthorizationSettings, Config},
    error::{Error, Result},
    info,
    server::CallbackListener,
    types::{Credential, Scope, TokenResponse},
    warning,
};

/// Obtains an app-level token through the client-credentials grant.
///
/// The token carries no user context and is only good for public endpoints
/// such as artist search. A single attempt is made.
///
/// # Errors
///
/// - `Error::Configuration` - client id or secret missing
/// - `Error::Auth` - the token endpoint could not be reached, answered with a
///   non-success status, or returned an unreadable body
pub async fn acquire_app_token(config: &Config) -> Result<Credential> {
    let (client_id, client_secret) = config.app_credentials()?;

    let res = Client::new()
        .post(&config.token_url)
        .basic_auth(client_id, Some(client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| Error::Auth(e.to_string()))?;

    let token = read_token_response(res).await.map_err(Error::Auth)?;
    Ok(Credential::new(token.access_token, Scope::Public))
}

/// Builds the URL of the provider's consent page.
pub fn authorize_url(
    auth_url: &str,
    client_id: &str,
    scope: &str,
    redirect_uri: &str,
) -> Result<Url> {
    Url::parse_with_params(
        auth_url,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("scope", scope),
            ("redirect_uri", redirect_uri),
        ],
    )
    .map_err(|e| Error::Configuration(format!("invalid authorization URL `{auth_url}`: {e}")))
}

/// Exchanges an authorization code for a user access token.
#[derive(Clone)]
pub struct CodeExchange {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl CodeExchange {
    pub fn new(config: &Config, settings: &AuthorizationSettings<'_>) -> Self {
        Self {
            client: Client::new(),
            token_url: config.token_url.clone(),
            client_id: settings.client_id.to_string(),
            client_secret: settings.client_secret.to_string(),
            redirect_uri: settings.redirect_uri.to_string(),
        }
    }

    /// Redeems `code` at the token endpoint.
    ///
    /// Fails with `Error::TokenExchange`, carrying the upstream status and
    /// body when the endpoint rejects the code.
    pub async fn exchange(&self, code: &str) -> Result<Credential> {
        let res = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::TokenExchange(e.to_string()))?;

        let token = read_token_response(res)
            .await
            .map_err(Error::TokenExchange)?;
        Ok(Credential::new(token.access_token, Scope::LibraryRead))
    }
}

/// Runs the interactive authorization-code login and returns a user token.
///
/// Opens the default browser on the consent page and waits for the redirect
/// on the local callback listener. See [`authenticate_user_with`].
pub async fn authenticate_user(config: &Config) -> Result<Credential> {
    authenticate_user_with(config, |url| webbrowser::open(url)).await
}

/// Runs the interactive authorization-code login with a custom browser
/// launcher.
///
/// # Flow
///
/// 1. **Preflight**: client id, secret and redirect URI are validated; on
///    failure nothing is bound and no browser is opened
/// 2. **Listen**: the callback listener binds the redirect URI's port
/// 3. **Consent**: `open_browser` is called with the consent page URL; if it
///    fails the URL is printed for manual navigation
/// 4. **Resolve**: the first request to the callback route decides the
///    outcome, the code is exchanged for a token, and the listener is closed
///
/// # Errors
///
/// - `Error::Configuration` - missing or invalid settings
/// - `Error::Auth` - the callback port could not be bound
/// - `Error::MissingCode` - the redirect carried no `code`
/// - `Error::TokenExchange` - the token endpoint rejected the code
pub async fn authenticate_user_with<F>(config: &Config, open_browser: F) -> Result<Credential>
where
    F: FnOnce(&str) -> io::Result<()>,
{
    let settings = config.authorization()?;
    let url = authorize_url(
        &config.auth_url,
        settings.client_id,
        &config.scope,
        settings.redirect_uri,
    )?;

    let exchange = CodeExchange::new(config, &settings);
    let mut listener =
        CallbackListener::bind(settings.listen_addr, &settings.callback_path, exchange).await?;
    info!(
        "Callback listener running at http://{}{}",
        listener.local_addr(),
        settings.callback_path
    );

    info!("Opening browser for Spotify authentication...");
    if open_browser(url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        );
    }

    listener.wait().await
}

async fn read_token_response(res: Response) -> std::result::Result<TokenResponse, String> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(format!("token endpoint returned {status}: {body}"));
    }

    res.json::<TokenResponse>()
        .await
        .map_err(|e| format!("invalid token response: {e}"))
}
