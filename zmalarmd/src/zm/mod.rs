use async_trait::async_trait;
use reqwest::{Response, Url};
use tokio::sync::RwLock;
use tokio::time::Duration;
use tracing::{debug, warn};
use zmalarm_api::{alarm, AlarmClient, Error, Result};

pub mod config;
mod payload;

// ZoneMinder doesn't always answer quickly, but a request that takes
// longer than this isn't going to succeed.

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Total number of attempts for an API request. A failed attempt is
// followed by a new login, since the usual cause is an expired
// session.

const LOGIN_ATTEMPTS: usize = 2;

// Translates a `reqwest` error into the error kinds the trigger logic
// understands.

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::TimeoutError
    } else if e.is_decode() {
        Error::ProtocolError(format!("couldn't decode reply -- {}", e))
    } else {
        Error::OperationError(format!("request failed -- {}", e))
    }
}

/// A connection to the HTTP API of a ZoneMinder server.
///
/// Newer servers hand out an access token when logging in; it's
/// saved and added to each request. Older servers use a session
/// cookie, which the underlying `reqwest::Client` keeps in its
/// cookie store.

pub struct Client {
    http: reqwest::Client,
    base: Url,
    username: Option<String>,
    password: Option<String>,
    token: RwLock<Option<String>>,
}

impl Client {
    pub fn new(cfg: &config::Params) -> Result<Self> {
        let base = Url::parse(&cfg.server_url()).map_err(|e| {
            Error::ConfigError(format!(
                "host '{}' has a bad server URL -- {}",
                &cfg.name, e
            ))
        })?;

        static APP_USER_AGENT: &str =
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

        // Build the client with our desired defaults. Many
        // ZoneMinder installations use self-signed certificates, so
        // the config can turn off certificate validation.

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!cfg.verify_ssl)
            .user_agent(APP_USER_AGENT)
            .use_rustls_tls()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::OperationError(format!(
                    "can't create connection -- {}",
                    e
                ))
            })?;

        Ok(Client {
            http,
            base,
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| {
            Error::OperationError(format!("bad API path '{}' -- {}", path, e))
        })
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Response> {
        self.http
            .post(self.url(path)?)
            .form(form)
            .send()
            .await
            .map_err(from_reqwest)
    }

    // Tries the token-based login. Returns the access token, if the
    // server provided one.

    async fn token_login(&self) -> Result<Option<String>> {
        let mut form = vec![];

        if let Some(user) = &self.username {
            form.push(("user", user.as_str()))
        }

        if let Some(pass) = &self.password {
            form.push(("pass", pass.as_str()))
        }

        let resp = self.post_form("api/host/login.json", &form).await?;

        if resp.status().is_success() {
            Ok(resp
                .json::<payload::LoginReply>()
                .await
                .ok()
                .and_then(|v| v.access_token))
        } else {
            debug!("token login returned {}", resp.status());
            Ok(None)
        }
    }

    // Logs in through the web console, which sets a session cookie.

    async fn legacy_login(&self) -> Result<()> {
        let form = [
            ("username", self.username.as_deref().unwrap_or("")),
            ("password", self.password.as_deref().unwrap_or("")),
            ("action", "login"),
            ("view", "console"),
        ];
        let resp = self.post_form("index.php", &form).await?;

        if !resp.status().is_success() {
            warn!("legacy login returned {}", resp.status());
            return Err(Error::AuthenticationError);
        }

        // The console answers with a 200 whether or not the
        // credentials were good. Only an API call tells us if the
        // session is usable.

        let resp = self
            .http
            .get(self.url("api/host/getVersion.json")?)
            .send()
            .await
            .map_err(from_reqwest)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            warn!("session check returned {}", resp.status());
            Err(Error::AuthenticationError)
        }
    }
}

#[async_trait]
impl AlarmClient for Client {
    async fn login(&self) -> Result<()> {
        debug!("logging into {}", &self.base);

        let token = self.token_login().await?;
        let legacy = token.is_none();

        *self.token.write().await = token;

        if legacy {
            self.legacy_login().await
        } else {
            Ok(())
        }
    }

    async fn get_state(&self, path: &str) -> Result<alarm::State> {
        let url = self.url(path)?;

        for attempt in 1..=LOGIN_ATTEMPTS {
            let mut req = self.http.get(url.clone());

            if let Some(token) = self.token.read().await.as_deref() {
                req = req.query(&[("token", token)])
            }

            let resp = req.send().await.map_err(from_reqwest)?;

            if resp.status().is_success() {
                return resp
                    .json::<payload::StateReply>()
                    .await
                    .map(alarm::State::from)
                    .map_err(from_reqwest);
            }

            warn!("{} returned {} (attempt {})", path, resp.status(), attempt);

            if attempt < LOGIN_ATTEMPTS {
                self.login().await?
            }
        }

        Err(Error::OperationError(format!(
            "unable to get API response for '{}'",
            path
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zmalarm_api::{alarm::Command, MonitorId};

    const STATUS_PATH: &str = "/zm/api/monitors/alarm/id:2/command:status.json";

    fn params(origin: &str) -> config::Params {
        config::Params {
            name: Arc::from("test"),
            host: origin.trim_start_matches("http://").to_string(),
            username: Some(String::from("admin")),
            password: Some(String::from("secret")),
            path: String::from("/zm/"),
            path_zms: String::from("/zm/cgi-bin/nph-zms"),
            ssl: false,
            verify_ssl: true,
            ttl: 5,
        }
    }

    fn status_path() -> String {
        Command::Status.path(MonitorId::create(2).unwrap())
    }

    async fn mount_token_login(server: &MockServer, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/zm/api/host/login.json"))
            .and(body_string_contains("user=admin"))
            .and(body_string_contains("pass=secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "tok" })),
            )
            .expect(expected)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_token_login() {
        let server = MockServer::start().await;

        mount_token_login(&server, 1).await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .and(query_param("token", "tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "0" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(&params(&server.uri())).unwrap();

        assert_eq!(client.login().await, Ok(()));
        assert_eq!(
            client.get_state(&status_path()).await,
            Ok(alarm::State::new("0"))
        );
    }

    #[tokio::test]
    async fn test_legacy_login() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/zm/api/host/login.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/zm/index.php"))
            .and(body_string_contains("action=login"))
            .and(body_string_contains("username=admin"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/zm/api/host/getVersion.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "version": "1.36.33" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": 2 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(&params(&server.uri())).unwrap();

        assert_eq!(client.login().await, Ok(()));
        assert_eq!(
            client.get_state(&status_path()).await,
            Ok(alarm::State::new("2"))
        );
    }

    #[tokio::test]
    async fn test_rejected_login() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/zm/api/host/login.json"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/zm/index.php"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/zm/api/host/getVersion.json"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = Client::new(&params(&server.uri())).unwrap();

        assert_eq!(client.login().await, Err(Error::AuthenticationError));
    }

    #[tokio::test]
    async fn test_relogin_on_failure() {
        let server = MockServer::start().await;

        mount_token_login(&server, 1).await;

        // The first status request fails as if the session expired.
        // The client should log in again and repeat the request.

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .and(query_param("token", "tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(&params(&server.uri())).unwrap();

        assert_eq!(
            client.get_state(&status_path()).await,
            Ok(alarm::State::new("1"))
        );
    }

    #[tokio::test]
    async fn test_failed_requests() {
        let server = MockServer::start().await;

        mount_token_login(&server, 1).await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/zm/api/monitors/alarm/id:2/command:on.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = Client::new(&params(&server.uri())).unwrap();

        assert!(matches!(
            client.get_state(&status_path()).await,
            Err(Error::OperationError(_))
        ));

        // A reply that isn't JSON is a protocol error.

        let on_path = Command::On.path(MonitorId::create(2).unwrap());

        assert!(matches!(
            client.get_state(&on_path).await,
            Err(Error::ProtocolError(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = Client::new(&params("127.0.0.1:1")).unwrap();

        match client.get_state(&status_path()).await {
            Err(e) => assert!(e.is_remote()),
            Ok(v) => panic!("unreachable server returned {:?}", v),
        }
    }
}
