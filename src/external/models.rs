// ABOUTME: Request and response types for the FoodData Central endpoints the gateway uses
// ABOUTME: Validates paging and filters locally and builds the upstream JSON bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;

use fooddata_core::constants::fdc::MAX_PAGE_SIZE;
use fooddata_core::constants::tools;
use fooddata_core::errors::UpstreamError;
use fooddata_core::pagination::PageRequest;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::aliases::AliasProvenance;

/// Detail level requested for food records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodFormat {
    /// Compact nutrient list
    #[default]
    Abridged,
    /// Everything the upstream has
    Full,
}

impl FoodFormat {
    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abridged => "abridged",
            Self::Full => "full",
        }
    }
}

/// Upstream dataset classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Analytical Foundation Foods
    Foundation,
    /// Standard Reference legacy release
    #[serde(rename = "SR Legacy")]
    SrLegacy,
    /// Survey foods (FNDDS)
    #[serde(rename = "Survey (FNDDS)")]
    Survey,
    /// Branded products with label data
    Branded,
    /// Experimental foods
    Experimental,
}

/// Sort key accepted by search and list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    /// Case-insensitive description
    #[serde(rename = "lowercaseDescription.keyword")]
    Description,
    /// Dataset classification
    #[serde(rename = "dataType.keyword")]
    DataType,
    /// Publication date
    #[serde(rename = "publishedDate")]
    PublishedDate,
    /// Record identifier
    #[serde(rename = "fdcId")]
    FdcId,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

/// Shape of a record fetch: format plus optional nutrient filter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FoodQuery {
    /// Detail level
    pub format: FoodFormat,
    /// Restrict the returned nutrients to these upstream ids
    pub nutrient_ids: Option<BTreeSet<u32>>,
}

impl FoodQuery {
    /// Abridged, unfiltered
    #[must_use]
    pub const fn abridged() -> Self {
        Self {
            format: FoodFormat::Abridged,
            nutrient_ids: None,
        }
    }

    /// Full, unfiltered
    #[must_use]
    pub const fn full() -> Self {
        Self {
            format: FoodFormat::Full,
            nutrient_ids: None,
        }
    }

    /// Restrict returned nutrients; an empty set means no filter
    #[must_use]
    pub fn with_nutrients(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        let ids: BTreeSet<u32> = ids.into_iter().collect();
        self.nutrient_ids = (!ids.is_empty()).then_some(ids);
        self
    }

    /// Whether a nutrient filter is applied
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.nutrient_ids.is_some()
    }

    pub(crate) fn to_body(&self, fdc_ids: &[u64]) -> Value {
        let mut body = json!({
            "fdcIds": fdc_ids,
            "format": self.format.as_str(),
        });
        if let (Some(ids), Some(fields)) = (&self.nutrient_ids, body.as_object_mut()) {
            fields.insert("nutrients".to_owned(), json!(ids));
        }
        body
    }
}

/// Free-text search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Search terms
    pub query: String,
    /// Restrict to these datasets (empty = all)
    pub data_types: Vec<DataType>,
    /// Restrict branded results to one brand owner
    pub brand_owner: Option<String>,
    /// 1-based page number
    pub page_number: u32,
    /// Results per page (1-200)
    pub page_size: u32,
    /// Sort key
    pub sort_by: Option<SortField>,
    /// Sort direction
    pub sort_order: Option<SortOrder>,
}

impl SearchRequest {
    /// Search with default paging
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            data_types: Vec::new(),
            brand_owner: None,
            page_number: 1,
            page_size: tools::SEARCH_FOODS_DEFAULT_PAGE_SIZE,
            sort_by: None,
            sort_order: None,
        }
    }

    /// Restrict datasets
    #[must_use]
    pub fn with_data_types(mut self, data_types: impl IntoIterator<Item = DataType>) -> Self {
        self.data_types = data_types.into_iter().collect();
        self
    }

    /// Set page number and size
    #[must_use]
    pub const fn with_page(mut self, page: PageRequest) -> Self {
        self.page_number = page.page;
        self.page_size = page.page_size;
        self
    }

    /// Set sort key and direction
    #[must_use]
    pub const fn sorted_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = Some(order);
        self
    }

    /// Reject requests the upstream would refuse
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty query or out-of-range paging
    pub fn validate(&self) -> Result<(), UpstreamError> {
        if self.query.trim().is_empty() {
            return Err(UpstreamError::validation("Search query cannot be empty"));
        }
        validate_paging(self.page_number, self.page_size)
    }

    pub(crate) fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_owned(), json!(self.query.trim()));
        if let Some(owner) = &self.brand_owner {
            body.insert("brandOwner".to_owned(), json!(owner));
        }
        insert_listing_fields(
            &mut body,
            &self.data_types,
            self.page_number,
            self.page_size,
            self.sort_by,
            self.sort_order,
        );
        Value::Object(body)
    }

    /// Current page position
    #[must_use]
    pub const fn page(&self) -> PageRequest {
        PageRequest {
            page: self.page_number,
            page_size: self.page_size,
        }
    }
}

/// Filtered, sorted listing of foods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Restrict to these datasets (empty = all)
    pub data_types: Vec<DataType>,
    /// 1-based page number
    pub page_number: u32,
    /// Results per page (1-200)
    pub page_size: u32,
    /// Sort key
    pub sort_by: Option<SortField>,
    /// Sort direction
    pub sort_order: Option<SortOrder>,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            data_types: Vec::new(),
            page_number: 1,
            page_size: tools::LIST_FOODS_DEFAULT_PAGE_SIZE,
            sort_by: None,
            sort_order: None,
        }
    }
}

impl ListRequest {
    /// Set page number and size
    #[must_use]
    pub const fn with_page(mut self, page: PageRequest) -> Self {
        self.page_number = page.page;
        self.page_size = page.page_size;
        self
    }

    /// Current page position
    #[must_use]
    pub const fn page(&self) -> PageRequest {
        PageRequest {
            page: self.page_number,
            page_size: self.page_size,
        }
    }

    /// Reject requests the upstream would refuse
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range paging
    pub fn validate(&self) -> Result<(), UpstreamError> {
        validate_paging(self.page_number, self.page_size)
    }

    pub(crate) fn to_body(&self) -> Value {
        let mut body = Map::new();
        insert_listing_fields(
            &mut body,
            &self.data_types,
            self.page_number,
            self.page_size,
            self.sort_by,
            self.sort_order,
        );
        Value::Object(body)
    }
}

fn validate_paging(page_number: u32, page_size: u32) -> Result<(), UpstreamError> {
    if page_number == 0 {
        return Err(UpstreamError::validation("Page number must be at least 1"));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(UpstreamError::validation(format!(
            "Page size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

fn insert_listing_fields(
    body: &mut Map<String, Value>,
    data_types: &[DataType],
    page_number: u32,
    page_size: u32,
    sort_by: Option<SortField>,
    sort_order: Option<SortOrder>,
) {
    if !data_types.is_empty() {
        body.insert("dataType".to_owned(), json!(data_types));
    }
    body.insert("pageNumber".to_owned(), json!(page_number));
    body.insert("pageSize".to_owned(), json!(page_size));
    if let Some(sort_by) = sort_by {
        body.insert("sortBy".to_owned(), json!(sort_by));
    }
    if let Some(sort_order) = sort_order {
        body.insert("sortOrder".to_owned(), json!(sort_order));
    }
}

/// One row of a search or list reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSummary {
    /// `FoodData` Central ID
    pub fdc_id: u64,
    /// Food description
    #[serde(default)]
    pub description: String,
    /// Dataset classification (e.g. "Foundation", "Branded")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Brand owner (branded foods only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_owner: Option<String>,
    /// Publication date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    /// Nutrient rows as returned by the upstream
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub food_nutrients: Vec<Value>,
}

/// Search reply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResult {
    /// Matches across all pages
    pub total_hits: u64,
    /// Page returned
    pub current_page: u32,
    /// Pages available
    pub total_pages: u32,
    /// Matches on this page
    pub foods: Vec<FoodSummary>,
}

/// A food record as returned by the upstream.
///
/// Kept as raw JSON: the nutrient scan has to tolerate several field layouts
/// across formats and datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodRecord(Value);

impl FoodRecord {
    /// Wrap a record body
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// `fdcId`, accepting numeric strings
    #[must_use]
    pub fn fdc_id(&self) -> Option<u64> {
        match self.0.get("fdcId")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Food description
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }

    /// Dataset classification
    #[must_use]
    pub fn data_type(&self) -> Option<&str> {
        self.0.get("dataType").and_then(Value::as_str)
    }

    /// Structured nutrient rows (empty when absent)
    #[must_use]
    pub fn food_nutrients(&self) -> &[Value] {
        self.0
            .get("foodNutrients")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Free-form label block (branded foods)
    #[must_use]
    pub fn label_nutrients(&self) -> Option<&Map<String, Value>> {
        ["labelNutrients", "label_nutrients", "nutritionLabel"]
            .iter()
            .find_map(|field| self.0.get(*field).and_then(Value::as_object))
    }

    /// Underlying JSON
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume into the underlying JSON
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// A fetched record plus how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFood {
    /// The record
    pub record: FoodRecord,
    /// Present when the requested id was retired and replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<AliasProvenance>,
}

impl ResolvedFood {
    /// Record fetched under the identifier that was asked for
    #[must_use]
    pub const fn direct(record: FoodRecord) -> Self {
        Self {
            record,
            provenance: None,
        }
    }
}

/// One page of search results plus the cursor for the next page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Matches on this page
    pub foods: Vec<FoodSummary>,
    /// Matches across all pages
    pub total_hits: u64,
    /// Position of this page
    pub page: PageRequest,
    /// Cursor for the next page, absent on the last page
    pub next_cursor: Option<String>,
}

/// One page of a listing plus the cursor for the next page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    /// Foods on this page
    pub foods: Vec<FoodSummary>,
    /// Position of this page
    pub page: PageRequest,
    /// Cursor for the next page; absent once a short page is returned
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_query_body() {
        let body = FoodQuery::abridged()
            .with_nutrients([208, 203])
            .to_body(&[1, 2]);
        assert_eq!(
            body,
            json!({"fdcIds": [1, 2], "format": "abridged", "nutrients": [203, 208]})
        );

        let unfiltered = FoodQuery::full().with_nutrients([]).to_body(&[3]);
        assert_eq!(unfiltered, json!({"fdcIds": [3], "format": "full"}));
    }

    #[test]
    fn test_search_body_and_validation() {
        let request = SearchRequest::new(" cheddar ")
            .with_data_types([DataType::Branded, DataType::SrLegacy])
            .sorted_by(SortField::Description, SortOrder::Asc);
        assert!(request.validate().is_ok());
        assert_eq!(
            request.to_body(),
            json!({
                "query": "cheddar",
                "dataType": ["Branded", "SR Legacy"],
                "pageNumber": 1,
                "pageSize": 25,
                "sortBy": "lowercaseDescription.keyword",
                "sortOrder": "asc"
            })
        );

        assert!(SearchRequest::new("  ").validate().is_err());
        let oversized = SearchRequest::new("apple").with_page(PageRequest {
            page: 1,
            page_size: 201,
        });
        assert!(oversized.validate().is_err());
    }

    #[test]
    fn test_food_record_accessors() {
        let record = FoodRecord::new(json!({
            "fdcId": "170567",
            "description": "Almonds",
            "dataType": "Foundation",
            "labelNutrients": {"fat": {"value": 14}}
        }));
        assert_eq!(record.fdc_id(), Some(170_567));
        assert_eq!(record.data_type(), Some("Foundation"));
        assert!(record.food_nutrients().is_empty());
        assert!(record.label_nutrients().is_some());
    }
}
