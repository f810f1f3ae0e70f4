use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::{
    config::Config,
    error::{AppError, Result},
    models::*,
};

#[cfg(test)]
pub mod memory;

/// Persistence used by the action endpoint: user accounts plus the audit table.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn find_account(&self, id: i64) -> Result<Option<UserAccount>>;

    /// Inserts `account`. `Ok(None)` means a row with that id already exists.
    async fn insert_account(&self, account: &UserAccount) -> Result<Option<UserAccount>>;

    /// Applies `patch` to the row. With a guard the update only applies while the row
    /// still holds the guarded balances; `Ok(false)` reports that it did not.
    async fn update_account(
        &self,
        id: i64,
        patch: &AccountPatch,
        guard: Option<&BalanceGuard>,
    ) -> Result<bool>;

    async fn append_action(&self, entry: &ActionLogEntry) -> Result<()>;
}

/// Supabase (PostgREST) client: `<url>/rest/v1/<table>?<filter>`.
#[derive(Clone)]
pub struct Database {
    client: Client,
    base_url: String,
    api_key: String,
    users_table: String,
    actions_log_table: String,
}

impl Database {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_anon_key.clone(),
            users_table: config.users_table.clone(),
            actions_log_table: config.actions_log_table.clone(),
        }
    }

    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, table))
            .map_err(|e| AppError::Internal(format!("Invalid Supabase URL: {}", e)))?;
        if !filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in filters {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Turns an unexpected store response into a downstream error, keeping status and body.
    async fn downstream_error(table: &str, method: &Method, response: Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            "Supabase {} {} failed with {}: {}",
            method,
            table,
            status,
            body
        );
        AppError::Database(format!(
            "{} {} failed with {}: {}",
            table, method, status, body
        ))
    }

    fn id_filter(id: i64) -> (&'static str, String) {
        ("id", format!("eq.{}", id))
    }
}

#[async_trait::async_trait]
impl Store for Database {
    async fn find_account(&self, id: i64) -> Result<Option<UserAccount>> {
        let url = self.table_url(
            &self.users_table,
            &[("select", "*".to_string()), Self::id_filter(id)],
        )?;
        let response = self.request(Method::GET, url).send().await?;
        if !response.status().is_success() {
            return Err(Self::downstream_error(&self.users_table, &Method::GET, response).await);
        }

        let rows: Vec<UserAccount> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_account(&self, account: &UserAccount) -> Result<Option<UserAccount>> {
        let url = self.table_url(&self.users_table, &[])?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(account)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                let rows: Vec<UserAccount> = response.json().await?;
                Ok(Some(rows.into_iter().next().unwrap_or_else(|| account.clone())))
            }
            StatusCode::CONFLICT => Ok(None),
            _ => Err(Self::downstream_error(&self.users_table, &Method::POST, response).await),
        }
    }

    async fn update_account(
        &self,
        id: i64,
        patch: &AccountPatch,
        guard: Option<&BalanceGuard>,
    ) -> Result<bool> {
        let mut filters = vec![Self::id_filter(id)];
        if let Some(guard) = guard {
            filters.extend(guard.filters());
        }
        let url = self.table_url(&self.users_table, &filters)?;

        let prefer = if guard.is_some() {
            "return=representation"
        } else {
            "return=minimal"
        };
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", prefer)
            .json(patch)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::downstream_error(&self.users_table, &Method::PATCH, response).await);
        }

        if guard.is_none() {
            return Ok(true);
        }
        let rows: Vec<UserAccount> = response.json().await?;
        Ok(!rows.is_empty())
    }

    async fn append_action(&self, entry: &ActionLogEntry) -> Result<()> {
        let url = self.table_url(&self.actions_log_table, &[("select", "id".to_string())])?;
        let response = self.request(Method::POST, url).json(entry).send().await?;

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Database(format!(
                "{} insert returned {}: {}",
                self.actions_log_table, status, body
            )));
        }
        Ok(())
    }
}
