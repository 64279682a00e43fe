//! ArcGIS feature-service client
//!
//! Talks to the ArcGIS REST API over blocking HTTP: a token is generated from
//! the configured credentials, the portal item is resolved to its feature
//! service, and the service's first table is queried page by page.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use ureq::Agent;

use crate::config::Credentials;
use crate::error::{EveError, Result};
use crate::record::{RawRecord, fields};
use crate::source::FeatureSource;
use crate::source::saved::Feature;

/// Requested token lifetime, in minutes
const TOKEN_EXPIRATION_MINUTES: &str = "60";

/// Page size used when the table does not advertise `maxRecordCount`
const DEFAULT_PAGE_SIZE: usize = 2000;

/// Build the HTTP agent shared by every request of a run
#[must_use]
pub fn build_agent(timeout: Duration) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    Agent::new_with_config(config)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Portal item metadata
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceInfo {
    #[serde(default)]
    tables: Vec<ServiceTable>,
}

#[derive(Debug, Deserialize)]
struct ServiceTable {
    id: i64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FieldInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableInfo {
    #[serde(default)]
    fields: Vec<FieldInfo>,
    #[serde(default)]
    max_record_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPage {
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    exceeded_transfer_limit: bool,
}

/// Authenticated connection to an ArcGIS portal
#[derive(Clone)]
pub struct ArcGisClient {
    agent: Agent,
    base_url: String,
    token: String,
}

impl ArcGisClient {
    /// Generate a token for `credentials` and return a connected client
    pub fn connect(agent: Agent, base_url: &str, credentials: &Credentials) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = format!("{base_url}/sharing/rest/generateToken");
        log::info!("Connecting to {base_url} as {}", credentials.username);

        let response = agent
            .post(&url)
            .send_form([
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("client", "referer"),
                ("referer", base_url.as_str()),
                ("expiration", TOKEN_EXPIRATION_MINUTES),
                ("f", "json"),
            ])
            .map_err(|e| EveError::transport("generating token", e))?;
        let body: Value = response
            .into_body()
            .read_json()
            .map_err(|e| EveError::transport("reading token response", e))?;
        let token: TokenResponse = decode(body, "token response")?;

        Ok(Self {
            agent,
            base_url,
            token: token.token,
        })
    }

    /// Look up a portal item by id
    pub fn item(&self, item_id: &str) -> Result<Item> {
        let url = format!("{}/sharing/rest/content/items/{item_id}", self.base_url);
        let body = get_json(&self.agent, &url, &self.token, &[])
            .map_err(|e| match e {
                EveError::SourceUnavailable(msg) => EveError::SourceUnavailable(format!(
                    "Feature table not found. Check the ID ({item_id}): {msg}"
                )),
                other => other,
            })?;
        decode(body, "portal item")
    }

    /// Open the first table of the feature service behind `item_id`
    pub fn feature_table(&self, item_id: &str) -> Result<ArcGisTable> {
        let item = self.item(item_id)?;
        let service_url = item
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                EveError::SourceUnavailable(format!("Item {} has no service URL", item.id))
            })?;

        let service: ServiceInfo =
            decode(get_json(&self.agent, &service_url, &self.token, &[])?, "service info")?;
        let table = service.tables.first().ok_or_else(|| {
            EveError::SourceUnavailable(format!("Service {service_url} has no tables"))
        })?;
        let table_url = format!("{}/{}", service_url.trim_end_matches('/'), table.id);
        log::info!(
            "Using table {} of {} ({table_url})",
            table.name.as_deref().unwrap_or("unnamed"),
            item.title.as_deref().unwrap_or(&item.id)
        );

        ArcGisTable::open(self.agent.clone(), table_url, self.token.clone())
    }
}

/// A queryable feature-service table
#[derive(Clone)]
pub struct ArcGisTable {
    agent: Agent,
    url: String,
    token: String,
    fields: Vec<String>,
    page_size: usize,
}

impl ArcGisTable {
    /// Read the table description and keep its field list
    pub fn open(agent: Agent, url: String, token: String) -> Result<Self> {
        let info: TableInfo = decode(get_json(&agent, &url, &token, &[])?, "table info")?;
        let page_size = info
            .max_record_count
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Ok(Self {
            agent,
            url,
            token,
            fields: info.fields.into_iter().map(|f| f.name).collect(),
            page_size,
        })
    }

    fn query_page(
        &self,
        filter: &str,
        out_fields: &str,
        offset: usize,
        count: usize,
    ) -> Result<QueryPage> {
        let url = format!("{}/query", self.url);
        let offset = offset.to_string();
        let count = count.to_string();
        let body = get_json(
            &self.agent,
            &url,
            &self.token,
            &[
                ("where", filter),
                ("outFields", out_fields),
                ("returnGeometry", "false"),
                ("resultOffset", offset.as_str()),
                ("resultRecordCount", count.as_str()),
            ],
        )?;
        decode(body, "query result")
    }
}

impl FeatureSource for ArcGisTable {
    fn field_names(&self) -> Result<Vec<String>> {
        Ok(self.fields.clone())
    }

    fn query(&self, filter: &str, columns: &[String]) -> Result<Vec<RawRecord>> {
        let out_fields = out_fields(columns);
        let mut rows = Vec::new();
        loop {
            let page = self.query_page(filter, &out_fields, rows.len(), self.page_size)?;
            let fetched = page.features.len();
            rows.extend(page.features.into_iter().map(|f| f.attributes));
            if !page.exceeded_transfer_limit || fetched == 0 {
                break;
            }
            log::debug!("Fetched {} rows so far, requesting next page", rows.len());
        }
        Ok(rows)
    }

    fn exists(&self, filter: &str) -> Result<bool> {
        let page = self.query_page(filter, fields::PERIOD_NUMBER, 0, 1)?;
        Ok(!page.features.is_empty())
    }
}

fn out_fields(columns: &[String]) -> String {
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    }
}

fn get_json(agent: &Agent, url: &str, token: &str, params: &[(&str, &str)]) -> Result<Value> {
    let mut request = agent.get(url).query("f", "json").query("token", token);
    for (key, value) in params {
        request = request.query(*key, *value);
    }
    let response = request
        .call()
        .map_err(|e| EveError::transport(format!("requesting {url}"), e))?;
    let body: Value = response
        .into_body()
        .read_json()
        .map_err(|e| EveError::transport(format!("reading response from {url}"), e))?;

    match service_error(&body) {
        Some(message) => Err(EveError::SourceUnavailable(message)),
        None => Ok(body),
    }
}

/// ArcGIS reports failures as HTTP 200 with an `error` object
fn service_error(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let details = error
        .get("details")
        .and_then(Value::as_array)
        .map(|d| {
            d.iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ")
        })
        .filter(|d| !d.is_empty());

    Some(match details {
        Some(details) => format!("service error {code}: {message} ({details})"),
        None => format!("service error {code}: {message}"),
    })
}

fn decode<T: DeserializeOwned>(body: Value, what: &str) -> Result<T> {
    if let Some(message) = service_error(&body) {
        return Err(EveError::SourceUnavailable(message));
    }
    serde_json::from_value(body).map_err(|e| {
        EveError::SourceUnavailable(format!("unexpected {what} from feature service: {e}"))
    })
}
