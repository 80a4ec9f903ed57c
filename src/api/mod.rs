use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::{AgentPersona, AgentPersonaList, NewAgentPersona, TrendingTokens, Utility};
use crate::validation;

pub mod session;

pub use session::{refresh_session, Session, TokenRefresher};

const CSRF_HEADER: &str = "x-csrftoken";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Token refresh against the platform's auth endpoint. The refresh
/// credential is a cookie managed by the shared HTTP client's jar.
struct RefreshEndpoint {
    http: Client,
    base_url: String,
}

#[async_trait]
impl TokenRefresher for RefreshEndpoint {
    async fn refresh_access_token(&self) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/auth/refresh-token", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::ApiAuthFailed(format!(
                "Token refresh rejected: {}",
                response.status()
            )));
        }
        let body = response.json::<RefreshResponse>().await.map_err(|e| {
            Error::ApiInvalidFormat(format!("Malformed refresh response: {}", e))
        })?;
        Ok(body.access_token)
    }
}

/// Client for the persona backend. Requests carry the session's bearer
/// and CSRF tokens; a 401 triggers exactly one refresh-and-retry before
/// the error surfaces.
pub struct PersonaClient {
    http: Client,
    base_url: String,
    session: Arc<Mutex<Session>>,
    refresher: Box<dyn TokenRefresher>,
}

impl PersonaClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_session(base_url, Session::new())
    }

    pub fn with_session(base_url: &str, session: Session) -> Self {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .unwrap_or_else(|_| Client::new());
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            refresher: Box::new(RefreshEndpoint {
                http: http.clone(),
                base_url: base_url.clone(),
            }),
            http,
            base_url,
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn set_access_token(&self, token: &str) {
        self.session.lock().await.set_access_token(token);
    }

    /// Create an agent persona together with its token record. The
    /// backend expects a multipart form; image parts are optional.
    pub async fn create_agent_persona(&self, input: &NewAgentPersona) -> Result<AgentPersona> {
        validation::validate_ticker(&input.ticker)?;
        let url = format!("{}/api/persona/create-agent-persona/", self.base_url);
        let response = self
            .send_with_session(|| Ok(self.http.post(&url).multipart(persona_form(input))))
            .await?;

        match response.status() {
            status if status.is_success() => {
                info!("Agent persona {} created", input.name);
                Ok(response.json::<AgentPersona>().await?)
            }
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::ApiInvalidData(format!(
                    "Persona creation rejected: {}",
                    body
                )))
            }
            status => Err(Error::ApiError(format!(
                "Persona creation failed: {}",
                status
            ))),
        }
    }

    /// Look up a persona by the bonding curve address of its token.
    pub async fn agent_persona_by_bonding_curve(&self, address: &str) -> Result<AgentPersona> {
        validation::validate_evm_address(address)?;
        let url = format!("{}/api/persona/agent-persona-by-bonding-curve/", self.base_url);
        let response = self
            .send_with_session(|| Ok(self.http.get(&url).query(&[("address", address)])))
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<AgentPersona>().await?),
            StatusCode::NOT_FOUND => Err(Error::NotFound(format!(
                "No agent persona for bonding curve {}",
                address
            ))),
            StatusCode::BAD_REQUEST => Err(Error::ApiInvalidData(format!(
                "Bonding curve address {} rejected by the backend",
                address
            ))),
            status => Err(Error::ApiError(format!(
                "Persona lookup failed: {}",
                status
            ))),
        }
    }

    /// Newest personas first.
    pub async fn agent_persona_list(&self, page: u32) -> Result<AgentPersonaList> {
        let url = format!("{}/api/persona/agent-personas/", self.base_url);
        let response = self
            .send_with_session(|| {
                Ok(self
                    .http
                    .get(&url)
                    .query(&[("sort", "-created_at".to_string()), ("page", page.to_string())]))
            })
            .await?;
        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Persona listing failed: {}",
                response.status()
            )));
        }
        Ok(response.json::<AgentPersonaList>().await?)
    }

    pub async fn trending_tokens(&self) -> Result<TrendingTokens> {
        let url = format!("{}/api/persona/trending-tokens/", self.base_url);
        let response = self.send_with_session(|| Ok(self.http.get(&url))).await?;
        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Trending listing failed: {}",
                response.status()
            )));
        }
        Ok(response.json::<TrendingTokens>().await?)
    }

    /// Search personas by name or ticker. The query is validated before
    /// any request goes out.
    pub async fn search_agent_token(&self, query: &str) -> Result<AgentPersonaList> {
        validation::validate_search_query(query)?;
        let url = format!("{}/api/persona/search-agent-token/", self.base_url);
        let response = self
            .send_with_session(|| Ok(self.http.get(&url).query(&[("query", query)])))
            .await?;
        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Search failed: {}",
                response.status()
            )));
        }
        Ok(response.json::<AgentPersonaList>().await?)
    }

    /// Build and send a request under the current session. Rebuilds the
    /// request per attempt so multipart bodies survive the retry.
    async fn send_with_session<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> Result<RequestBuilder>,
    {
        let mut refreshed = false;
        loop {
            let request = {
                let session = self.session.lock().await;
                session.apply(build()?)
            };
            let response = request.send().await?;
            self.capture_csrf(&response).await;

            if response.status() == StatusCode::UNAUTHORIZED && !refreshed {
                refreshed = true;
                warn!("Request unauthorized, refreshing session");
                let mut session = self.session.lock().await;
                refresh_session(self.refresher.as_ref(), &mut session).await?;
                continue;
            }
            return Ok(response);
        }
    }

    /// The backend rotates the CSRF token on some responses; keep the
    /// session's copy current.
    async fn capture_csrf(&self, response: &Response) {
        if let Some(value) = response.headers().get(CSRF_HEADER) {
            if let Ok(token) = value.to_str() {
                debug!("CSRF token rotated");
                self.session.lock().await.set_csrf_token(token);
            }
        }
    }
}

fn persona_form(input: &NewAgentPersona) -> Form {
    let mut form = Form::new()
        .text("token_name", input.name.clone())
        .text("token_ticker", input.ticker.clone())
        .text("description", input.description.clone().unwrap_or_default())
        .text("personality", input.personality.clone().unwrap_or_default())
        .text("ton&manner", input.manner.clone().unwrap_or_default())
        .text(
            "contract_address",
            input.contract_address.clone().unwrap_or_default(),
        )
        .text(
            "bonding_curve_address",
            input.bonding_curve_address.clone().unwrap_or_default(),
        )
        .text("max_supply", "1000000000")
        .text("mainnet", "Base Testnet")
        .text(
            "utility_twitter_access",
            input.utilities.contains(&Utility::Twitter).to_string(),
        )
        .text(
            "utility_discord_access",
            input.utilities.contains(&Utility::Discord).to_string(),
        )
        .text(
            "utility_telegram_access",
            input.utilities.contains(&Utility::Telegram).to_string(),
        )
        .text(
            "utility_overdive_access",
            input.utilities.contains(&Utility::Overdive).to_string(),
        )
        .text("twitter_link", input.twitter.clone().unwrap_or_default())
        .text("website_link", input.website.clone().unwrap_or_default())
        .text("discord_link", input.discord.clone().unwrap_or_default())
        .text("telegram_link", input.telegram.clone().unwrap_or_default())
        .text("overdive_link", input.overdive.clone().unwrap_or_default());

    if let Some(image) = &input.profile_image {
        form = form.part(
            "profileimg",
            Part::bytes(image.bytes.clone()).file_name(image.file_name.clone()),
        );
    }
    if let Some(image) = &input.cover_image {
        form = form.part(
            "coverimg",
            Part::bytes(image.bytes.clone()).file_name(image.file_name.clone()),
        );
    }
    form
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentToken, Persona};
    use session::MockTokenRefresher;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Minimal listener that answers every request with 401 and counts hits
    async fn spawn_unauthorized_server() -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    )
                    .await;
            }
        });
        (format!("http://{}", addr), hits)
    }

    #[test_log::test(tokio::test)]
    async fn unauthorized_response_refreshes_once_and_retries_once() {
        let (base_url, hits) = spawn_unauthorized_server().await;

        let mut refresher = MockTokenRefresher::new();
        refresher
            .expect_refresh_access_token()
            .times(1)
            .returning(|| Ok("fresh".to_string()));

        let mut client =
            PersonaClient::with_session(&base_url, Session::authenticated("stale"));
        client.refresher = Box::new(refresher);

        // Both attempts come back 401; the second must surface without
        // another refresh
        let result = client.trending_tokens().await;
        assert!(matches!(result, Err(Error::ApiError(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_surfaces_session_expiry_to_the_caller() {
        let (base_url, hits) = spawn_unauthorized_server().await;

        let mut refresher = MockTokenRefresher::new();
        refresher
            .expect_refresh_access_token()
            .times(1)
            .returning(|| Err(Error::ApiAuthFailed("refresh rejected".to_string())));

        let mut client =
            PersonaClient::with_session(&base_url, Session::authenticated("stale"));
        client.refresher = Box::new(refresher);

        let result = client.trending_tokens().await;
        assert!(matches!(result, Err(Error::SessionExpired(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn persona_form_builds_from_sample_input() {
        let input = crate::tests::common::sample_new_persona();
        let form = persona_form(&input);
        assert!(!form.boundary().is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = PersonaClient::new("https://overdive.xyz/");
        assert_eq!(client.base_url, "https://overdive.xyz");
    }

    #[test]
    fn persona_list_parses_backend_shape() {
        let body = r#"{
            "count": 1,
            "results": [{
                "persona": {"id": 7, "name": "Dive Bot"},
                "agent_token": {
                    "token_name": "Dive Bot",
                    "token_ticker": "DIVE",
                    "bonding_curve_address": "0xF1d9E186365ACb95249E05cc7273329135eEB039"
                }
            }]
        }"#;
        let list: AgentPersonaList = serde_json::from_str(body).unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.results[0].agent_token.token_ticker, "DIVE");
    }

    #[test]
    fn trending_parses_enrichment_fields() {
        let body = r#"{
            "count": 1,
            "results": [{
                "persona": {"name": "Dive Bot"},
                "agent_token": {
                    "token_name": "Dive Bot",
                    "token_ticker": "DIVE",
                    "price": 0.0003,
                    "volume_24h": 1200.5,
                    "trades_count": 42
                }
            }],
            "has_transactions": true
        }"#;
        let trending: TrendingTokens = serde_json::from_str(body).unwrap();
        assert!(trending.has_transactions);
        assert_eq!(trending.results[0].agent_token.volume_24h, Some(1200.5));
    }

    #[test]
    fn persona_round_trips() {
        let persona = AgentPersona {
            persona: Persona {
                id: Some(1),
                name: "Dive Bot".to_string(),
                personaname: None,
                description: None,
                profile_image: None,
                cover_image: None,
                created_at: None,
            },
            agent_token: AgentToken {
                token_name: "Dive Bot".to_string(),
                token_ticker: "DIVE".to_string(),
                contract_address: None,
                bonding_curve_address: None,
                max_supply: Some("1000000000".to_string()),
                mainnet: Some("Base Testnet".to_string()),
                twitter_link: None,
                website_link: None,
                discord_link: None,
                telegram_link: None,
                overdive_link: None,
                price: None,
                volume_24h: None,
                trades_count: None,
                unique_traders: None,
                holders_count: None,
            },
        };
        let text = serde_json::to_string(&persona).unwrap();
        let parsed: AgentPersona = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.agent_token.token_name, "Dive Bot");
    }
}
