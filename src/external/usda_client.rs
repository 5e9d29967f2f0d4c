// ABOUTME: USDA FoodData Central API client composing scheduler, retry policy and transport
// ABOUTME: Implements search, single and batch record retrieval, listing, alias substitution and paging
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! USDA `FoodData` Central API Client
//!
//! Every operation goes through the same pipeline: local validation, then the
//! shared [`RequestLimiter`], then the retry loop, then a single
//! [`UpstreamTransport`] attempt. All operations share one scheduling budget
//! so the gateway stays under a single upstream rate ceiling.
//!
//! # API Reference
//! USDA `FoodData` Central API: <https://fdc.nal.usda.gov/api-guide.html>
//!
//! # Example
//! ```rust,no_run
//! use fooddata_mcp_server::config::FdcConfig;
//! use fooddata_mcp_server::external::{FoodQuery, SearchRequest, UsdaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = UsdaClient::new(&FdcConfig::with_api_key("your_api_key"))?;
//! let results = client.search(&SearchRequest::new("apple")).await?;
//! let apple = client.get_food(171_688, &FoodQuery::full()).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use fooddata_core::constants::fdc::MAX_BATCH_IDS;
use fooddata_core::constants::tools::{LIST_FOODS, SEARCH_FOODS};
use fooddata_core::errors::{AppResult, UpstreamError};
use fooddata_core::pagination::decode_cursor;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::aliases::{AliasEntry, AliasTable};
use super::limiter::RequestLimiter;
use super::models::{
    FoodQuery, FoodRecord, FoodSummary, ListPage, ListRequest, ResolvedFood, SearchPage,
    SearchRequest, SearchResult,
};
use super::retry::{run_with_retry, RetryPolicy};
use super::transport::{HttpTransport, UpstreamRequest, UpstreamTransport};
use crate::config::FdcConfig;

/// USDA `FoodData` Central API Client
pub struct UsdaClient {
    transport: Arc<dyn UpstreamTransport>,
    limiter: RequestLimiter,
    retry: RetryPolicy,
    aliases: Arc<AliasTable>,
}

impl UsdaClient {
    /// Create a client talking HTTP to the configured upstream
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` fails validation
    pub fn new(config: &FdcConfig) -> AppResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.base_url, &config.api_key, config.timeout());
        Ok(Self::with_transport(Arc::new(transport))
            .with_limiter(RequestLimiter::new(
                config.max_concurrent,
                config.min_interval(),
            ))
            .with_retry_policy(RetryPolicy::new(
                config.max_retries,
                config.retry_base_delay_ms,
            )))
    }

    /// Create a client over any transport, with default scheduling, retries
    /// and the built-in alias table
    #[must_use]
    pub fn with_transport(transport: Arc<dyn UpstreamTransport>) -> Self {
        Self {
            transport,
            limiter: RequestLimiter::default(),
            retry: RetryPolicy::default(),
            aliases: Arc::new(AliasTable::builtin().clone()),
        }
    }

    /// Replace the scheduler
    #[must_use]
    pub fn with_limiter(mut self, limiter: RequestLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Replace the retry policy
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the alias table
    #[must_use]
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = Arc::new(aliases);
        self
    }

    /// Scheduler shared by every call of this client
    #[must_use]
    pub const fn limiter(&self) -> &RequestLimiter {
        &self.limiter
    }

    /// Search for foods by free text
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty query or bad paging, or the
    /// upstream failure after retries
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, UpstreamError> {
        request.validate()?;
        let value = self
            .call(UpstreamRequest::new("search", "/foods/search", request.to_body()))
            .await?;
        parse_body(&value, "search")
    }

    /// List foods page by page
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad paging, or the upstream failure after retries
    pub async fn list(&self, request: &ListRequest) -> Result<Vec<FoodSummary>, UpstreamError> {
        request.validate()?;
        let value = self
            .call(UpstreamRequest::new("list", "/foods/list", request.to_body()))
            .await?;
        parse_body(&value, "list")
    }

    /// Fetch several records in one logical call.
    ///
    /// Batches larger than the upstream limit are split into sequential
    /// chunks; records come back in upstream order, chunk by chunk. Ids the
    /// upstream does not know are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty id list, or the first chunk failure
    pub async fn get_foods(
        &self,
        fdc_ids: &[u64],
        query: &FoodQuery,
    ) -> Result<Vec<FoodRecord>, UpstreamError> {
        if fdc_ids.is_empty() {
            return Err(UpstreamError::validation("At least one FDC ID is required"));
        }
        let mut records = Vec::with_capacity(fdc_ids.len());
        for chunk in fdc_ids.chunks(MAX_BATCH_IDS) {
            records.extend(self.fetch_chunk(chunk, query).await?);
        }
        Ok(records)
    }

    /// Fetch one record; built on [`Self::get_foods`]
    ///
    /// # Errors
    ///
    /// Returns a 404-class error when the batch reply omits `fdc_id`, or the upstream failure
    pub async fn get_food(&self, fdc_id: u64, query: &FoodQuery) -> Result<FoodRecord, UpstreamError> {
        self.get_foods(&[fdc_id], query)
            .await?
            .into_iter()
            .find(|record| record.fdc_id() == Some(fdc_id))
            .ok_or_else(|| UpstreamError::not_found(format!("Food with FDC ID {fdc_id} not found")))
    }

    /// Fetch one record, substituting a replacement for retired identifiers
    ///
    /// # Errors
    ///
    /// Returns the original not-found error when no alias exists, or any
    /// failure fetching the original or replacement record
    pub async fn get_food_resolved(
        &self,
        fdc_id: u64,
        query: &FoodQuery,
    ) -> Result<ResolvedFood, UpstreamError> {
        match self.get_food(fdc_id, query).await {
            Ok(record) => Ok(ResolvedFood::direct(record)),
            Err(error) if error.is_not_found() => {
                let Some(entry) = self.aliases.resolve(fdc_id) else {
                    return Err(error);
                };
                log_substitution(entry);
                let record = self.get_food(entry.replacement_id, query).await?;
                Ok(ResolvedFood {
                    record,
                    provenance: Some(entry.provenance()),
                })
            }
            Err(error) => Err(error),
        }
    }

    /// Fetch several records, substituting replacements for retired identifiers.
    ///
    /// Ids missing from the first reply are looked up in the alias table and
    /// the replacements fetched in one follow-up batch. The merged result is
    /// de-duplicated on the returned record id; the first occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns a non-404 failure of either batch, or the original 404 when
    /// nothing at all could be returned
    pub async fn get_foods_resolved(
        &self,
        fdc_ids: &[u64],
        query: &FoodQuery,
    ) -> Result<Vec<ResolvedFood>, UpstreamError> {
        let (initial, initial_error) = self.get_foods_tolerating_not_found(fdc_ids, query).await?;

        let returned: HashSet<u64> = initial.iter().filter_map(FoodRecord::fdc_id).collect();
        let mut seen_missing = HashSet::new();
        let substitutions: Vec<&AliasEntry> = fdc_ids
            .iter()
            .copied()
            .filter(|id| !returned.contains(id) && seen_missing.insert(*id))
            .filter_map(|id| {
                let entry = self.aliases.resolve(id);
                if entry.is_none() {
                    debug!(fdc_id = id, "Requested food missing from batch reply, no alias");
                }
                entry
            })
            .collect();

        let mut replacement_ids = Vec::new();
        let mut seen_replacements = HashSet::new();
        for entry in &substitutions {
            log_substitution(entry);
            if seen_replacements.insert(entry.replacement_id) {
                replacement_ids.push(entry.replacement_id);
            }
        }

        let replacements = if replacement_ids.is_empty() {
            Vec::new()
        } else {
            self.get_foods_tolerating_not_found(&replacement_ids, query)
                .await?
                .0
        };

        let mut merged = Vec::with_capacity(initial.len() + substitutions.len());
        let mut seen_final = HashSet::new();
        for record in initial {
            let first_occurrence = match record.fdc_id() {
                Some(id) => seen_final.insert(id),
                None => true,
            };
            if first_occurrence {
                merged.push(ResolvedFood::direct(record));
            }
        }
        for entry in substitutions {
            let found = replacements
                .iter()
                .find(|record| record.fdc_id() == Some(entry.replacement_id));
            if let Some(record) = found {
                if seen_final.insert(entry.replacement_id) {
                    merged.push(ResolvedFood {
                        record: record.clone(),
                        provenance: Some(entry.provenance()),
                    });
                }
            }
        }

        match initial_error {
            Some(error) if merged.is_empty() => Err(error),
            _ => Ok(merged),
        }
    }

    /// Run a search at the position a cursor points to (or page 1) and
    /// return the cursor for the following page
    ///
    /// # Errors
    ///
    /// Returns an invalid-cursor error, a validation error, or the upstream failure
    pub async fn search_page(
        &self,
        request: SearchRequest,
        cursor: Option<&str>,
    ) -> AppResult<SearchPage> {
        let request = match cursor {
            Some(cursor) => request.with_page(decode_cursor(cursor, SEARCH_FOODS)?),
            None => request,
        };
        let page = request.page();
        let result = self.search(&request).await?;
        let next_cursor =
            (page.page < result.total_pages).then(|| page.next().to_cursor(SEARCH_FOODS));
        Ok(SearchPage {
            foods: result.foods,
            total_hits: result.total_hits,
            page,
            next_cursor,
        })
    }

    /// Run a listing at the position a cursor points to (or page 1) and
    /// return the cursor for the following page
    ///
    /// # Errors
    ///
    /// Returns an invalid-cursor error, a validation error, or the upstream failure
    pub async fn list_page(&self, request: ListRequest, cursor: Option<&str>) -> AppResult<ListPage> {
        let request = match cursor {
            Some(cursor) => request.with_page(decode_cursor(cursor, LIST_FOODS)?),
            None => request,
        };
        let page = request.page();
        let foods = self.list(&request).await?;
        let full_page = u32::try_from(foods.len()).is_ok_and(|n| n == page.page_size);
        let next_cursor = full_page.then(|| page.next().to_cursor(LIST_FOODS));
        Ok(ListPage {
            foods,
            page,
            next_cursor,
        })
    }

    /// Batch fetch where a 404 chunk counts as "none of these exist".
    ///
    /// Records from the other chunks are kept; the first 404 is returned
    /// alongside them.
    async fn get_foods_tolerating_not_found(
        &self,
        fdc_ids: &[u64],
        query: &FoodQuery,
    ) -> Result<(Vec<FoodRecord>, Option<UpstreamError>), UpstreamError> {
        if fdc_ids.is_empty() {
            return Err(UpstreamError::validation("At least one FDC ID is required"));
        }
        let mut records = Vec::with_capacity(fdc_ids.len());
        let mut first_not_found = None;
        for chunk in fdc_ids.chunks(MAX_BATCH_IDS) {
            match self.fetch_chunk(chunk, query).await {
                Ok(chunk_records) => records.extend(chunk_records),
                Err(error) if error.is_not_found() => {
                    debug!(chunk_len = chunk.len(), "Batch chunk returned 404");
                    first_not_found.get_or_insert(error);
                }
                Err(error) => return Err(error),
            }
        }
        Ok((records, first_not_found))
    }

    /// One `/foods` call for at most [`MAX_BATCH_IDS`] ids
    async fn fetch_chunk(
        &self,
        chunk: &[u64],
        query: &FoodQuery,
    ) -> Result<Vec<FoodRecord>, UpstreamError> {
        let value = self
            .call(UpstreamRequest::new("foods", "/foods", query.to_body(chunk)))
            .await?;
        let records: Vec<Value> = parse_body(&value, "foods")?;
        Ok(records.into_iter().map(FoodRecord::new).collect())
    }

    /// Scheduler, then retry loop, then one transport attempt per try
    async fn call(&self, request: UpstreamRequest) -> Result<Value, UpstreamError> {
        let request = &request;
        let transport = self.transport.as_ref();
        let retry = &self.retry;
        self.limiter
            .schedule(|| {
                run_with_retry(retry, request.operation, move || transport.execute(request))
            })
            .await
    }
}

fn parse_body<T: DeserializeOwned>(value: &Value, operation: &str) -> Result<T, UpstreamError> {
    T::deserialize(value).map_err(|e| {
        UpstreamError::malformed(
            format!("unexpected {operation} response shape: {e}"),
            Some(value.to_string()),
        )
    })
}

fn log_substitution(entry: &AliasEntry) {
    info!(
        requested_id = entry.requested_id,
        replacement_id = entry.replacement_id,
        dataset = entry.dataset.as_deref().unwrap_or("unknown"),
        "Substituting retired FDC ID"
    );
}

