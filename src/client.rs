use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fmt::Display;
use std::time::Duration;

use crate::config::{DEFAULT_URL, load_config};
use crate::endpoint::Endpoint;
use crate::error::QueryError;
use crate::query::{Query, encode_value};
use crate::response::classify;
use crate::table::ResultTable;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base API URL, typically `https://aqs.epa.gov/data/api`.
    pub url: String,
    /// Email address the account was registered with.
    pub email: String,
    /// Access key issued for `email`.
    pub key: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

impl ClientConfig {
    /// Identity against the production service.
    pub fn new(email: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            email: email.into(),
            key: key.into(),
            verify: true,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// Blocking client for the AQS Data Mart API.
///
/// Every query method performs exactly one GET and returns either a complete
/// [`ResultTable`] or a [`QueryError`]; the client keeps no state between calls, so a
/// clone can be moved to another thread freely.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    auth: String,

    timeout: Option<Duration>,
    progress: bool,

    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.aqsrc`.
    ///
    /// This is equivalent to `Client::new(None, None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`email`/`key` arguments
    /// - environment variables `AQS_URL` / `AQS_EMAIL` / `AQS_KEY`
    /// - config file from `AQS_RC` or `.aqsrc`
    ///
    /// `url` falls back to the production service when not configured anywhere.
    pub fn new(
        url: Option<String>,
        email: Option<String>,
        key: Option<String>,
        verify: Option<bool>,
    ) -> Result<Self> {
        let cfg = load_config(url, email, key, verify)?;
        Self::from_config(cfg)
    }

    /// Creates a client from an explicit identity, without consulting the environment.
    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("aqsapi-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("aqsapi-rs")),
        );

        let mut builder = HttpClient::builder().default_headers(default_headers);
        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            url: cfg.url.trim_end_matches('/').to_string(),
            auth: format!(
                "email={}&key={}",
                encode_value(&cfg.email),
                encode_value(&cfg.key)
            ),
            timeout: None,
            progress: false,
            http,
        })
    }

    /// Bounds each request; without it the transport defaults apply.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Prints a one-line status on stderr while a request is in flight. Off by default.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Core Based Statistical Areas, with `value_represented` renamed to `cbsa_name`.
    pub fn list_metro_areas(&self) -> Result<ResultTable, QueryError> {
        self.execute(Query::new(Endpoint::MetroAreas))
    }

    /// States and their codes, with `value_represented` renamed to `state_name`.
    pub fn list_state_codes(&self) -> Result<ResultTable, QueryError> {
        self.execute(Query::new(Endpoint::States))
    }

    /// Counties of a state, with `value_represented` renamed to `county_name`.
    pub fn list_counties_by_state(&self, state: &str) -> Result<ResultTable, QueryError> {
        self.execute(Query::new(Endpoint::CountiesByState).param("state", state))
    }

    /// Monitoring sites of a county, with `value_represented` renamed to `site_name`.
    pub fn list_sites_by_county(
        &self,
        state: &str,
        county: &str,
    ) -> Result<ResultTable, QueryError> {
        self.execute(
            Query::new(Endpoint::SitesByCounty)
                .param("state", state)
                .param("county", county),
        )
    }

    /// Parameter classes as `class_name` / `class_description`.
    pub fn list_parameter_classes(&self) -> Result<ResultTable, QueryError> {
        self.execute(Query::new(Endpoint::ParameterClasses))
    }

    /// Parameters in a class, with `value_represented` renamed to
    /// `parameter_description`.
    pub fn list_parameters_by_class(&self, class: &str) -> Result<ResultTable, QueryError> {
        self.execute(Query::new(Endpoint::ParametersByClass).param("pc", class))
    }

    /// Annual summary for a CBSA. Dates are `YYYYMMDD`.
    pub fn annual_summary_by_metro_area<P: Display>(
        &self,
        cbsa: &str,
        params: &[P],
        bdate: &str,
        edate: &str,
    ) -> Result<ResultTable, QueryError> {
        let query = Query::new(Endpoint::AnnualByMetroArea)
            .list("param", params)?
            .param("bdate", bdate)
            .param("edate", edate)
            .param("cbsa", cbsa);
        self.execute(query)
    }

    pub fn annual_summary_by_site<P: Display>(
        &self,
        state: &str,
        county: &str,
        site: &str,
        params: &[P],
        bdate: &str,
        edate: &str,
    ) -> Result<ResultTable, QueryError> {
        self.execute(site_query(
            Endpoint::AnnualBySite,
            state,
            county,
            site,
            params,
            bdate,
            edate,
        )?)
    }

    pub fn annual_summary_by_county<P: Display>(
        &self,
        state: &str,
        county: &str,
        params: &[P],
        bdate: &str,
        edate: &str,
    ) -> Result<ResultTable, QueryError> {
        let query = Query::new(Endpoint::AnnualByCounty)
            .list("param", params)?
            .param("state", state)
            .param("county", county)
            .param("bdate", bdate)
            .param("edate", edate);
        self.execute(query)
    }

    pub fn annual_summary_by_state<P: Display>(
        &self,
        state: &str,
        params: &[P],
        bdate: &str,
        edate: &str,
    ) -> Result<ResultTable, QueryError> {
        let query = Query::new(Endpoint::AnnualByState)
            .list("param", params)?
            .param("state", state)
            .param("bdate", bdate)
            .param("edate", edate);
        self.execute(query)
    }

    /// Monitors operating at a site for the given parameters and period.
    pub fn monitors_at_site<P: Display>(
        &self,
        state: &str,
        county: &str,
        site: &str,
        params: &[P],
        bdate: &str,
        edate: &str,
    ) -> Result<ResultTable, QueryError> {
        self.execute(site_query(
            Endpoint::MonitorsBySite,
            state,
            county,
            site,
            params,
            bdate,
            edate,
        )?)
    }

    /// Sends one GET for `query` and classifies the outcome.
    fn execute(&self, query: Query) -> Result<ResultTable, QueryError> {
        let endpoint = query.endpoint();
        let url = query.url(&self.url, &self.auth);
        tracing::debug!(%endpoint, params = %query.fragment(), "sending AQS request");

        let spinner = self.progress.then(|| request_spinner(endpoint));

        let mut req = self.http.get(&url);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let exchange = req.send().and_then(|resp| {
            let status = resp.status();
            resp.text().map(|body| (status, body))
        });

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let result = match exchange {
            Ok((status, body)) => classify(endpoint, status, &body),
            Err(source) => Err(QueryError::Connection {
                endpoint,
                source: source.without_url(),
            }),
        };

        match &result {
            Ok(table) => tracing::debug!(%endpoint, rows = table.len(), "AQS request succeeded"),
            Err(e) => tracing::warn!(%endpoint, kind = ?e.kind(), error = %e, "AQS request failed"),
        }
        result
    }
}

/// Parameters shared by the site-level data services.
fn site_query<P: Display>(
    endpoint: Endpoint,
    state: &str,
    county: &str,
    site: &str,
    params: &[P],
    bdate: &str,
    edate: &str,
) -> Result<Query, QueryError> {
    Ok(Query::new(endpoint)
        .list("param", params)?
        .param("state", state)
        .param("county", county)
        .param("bdate", bdate)
        .param("edate", edate)
        .param("site", site))
}

fn request_spinner(endpoint: Endpoint) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    // Drawn once; a steady tick would need a ticker thread per request.
    pb.set_message(format!("querying {}", endpoint));
    pb.tick();
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn client() -> Client {
        Client::from_config(
            ClientConfig::new("me@example.com", "k3y").with_url("http://127.0.0.1:9/data/api/"),
        )
        .unwrap()
        .with_progress(false)
    }

    #[test]
    fn auth_fragment_is_built_once() {
        let c = client();
        assert_eq!(c.auth, "email=me@example.com&key=k3y");
        assert_eq!(c.base_url(), "http://127.0.0.1:9/data/api");
    }

    #[test]
    fn progress_is_off_unless_requested() {
        let c = Client::from_config(ClientConfig::new("me@example.com", "k3y")).unwrap();
        assert!(!c.progress);
        assert!(c.timeout.is_none());
        assert!(c.with_progress(true).progress);
    }

    #[test]
    fn client_can_be_shared_across_threads() {
        fn assert_shareable<T: Clone + Send + Sync + 'static>() {}
        assert_shareable::<Client>();
    }

    #[test]
    fn empty_parameter_list_fails_before_sending() {
        let c = client();
        let none: [u32; 0] = [];

        let errs = [
            c.annual_summary_by_metro_area("16980", &none, "20200101", "20201231"),
            c.annual_summary_by_site("37", "183", "0014", &none, "20200101", "20201231"),
            c.annual_summary_by_county("37", "183", &none, "20200101", "20201231"),
            c.annual_summary_by_state("37", &none, "20200101", "20201231"),
            c.monitors_at_site("37", "183", "0014", &none, "20200101", "20201231"),
        ];
        for r in errs {
            assert_eq!(r.unwrap_err().kind(), FailureKind::MalformedQuery);
        }
    }

    #[test]
    fn site_query_keeps_parameter_order() {
        let q = site_query(
            Endpoint::MonitorsBySite,
            "37",
            "183",
            "0014",
            &[44201, 88101],
            "20200101",
            "20200131",
        )
        .unwrap();
        assert_eq!(
            q.fragment(),
            "param=44201,88101&state=37&county=183&bdate=20200101&edate=20200131&site=0014"
        );
    }
}
