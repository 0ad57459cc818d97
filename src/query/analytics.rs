//! Analytics Caching
//!
//! Derives cache keys, tags and TTLs for tenant-scoped analytics queries.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::query::{CacheOptions, QueryCache};

// == Tags ==
/// Tag shared by every analytics entry
pub const ANALYTICS_TAG: &str = "analytics";

pub fn tenant_tag(tenant_id: &str) -> String {
    format!("tenant:{}", tenant_id)
}

pub fn data_type_tag(data_type: AnalyticsDataType) -> String {
    format!("type:{}", data_type)
}

// == Analytics Data Type ==
/// Kind of analytics query, each with its own freshness policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsDataType {
    Overview,
    CallVolume,
    CallOutcomes,
    PeakHours,
    TopServices,
    Appointments,
    Revenue,
    Historical,
}

impl AnalyticsDataType {
    pub const ALL: [AnalyticsDataType; 8] = [
        AnalyticsDataType::Overview,
        AnalyticsDataType::CallVolume,
        AnalyticsDataType::CallOutcomes,
        AnalyticsDataType::PeakHours,
        AnalyticsDataType::TopServices,
        AnalyticsDataType::Appointments,
        AnalyticsDataType::Revenue,
        AnalyticsDataType::Historical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsDataType::Overview => "overview",
            AnalyticsDataType::CallVolume => "call_volume",
            AnalyticsDataType::CallOutcomes => "call_outcomes",
            AnalyticsDataType::PeakHours => "peak_hours",
            AnalyticsDataType::TopServices => "top_services",
            AnalyticsDataType::Appointments => "appointments",
            AnalyticsDataType::Revenue => "revenue",
            AnalyticsDataType::Historical => "historical",
        }
    }

    /// Freshness policy. Fast-moving counters get minutes, aggregates over
    /// settled history up to an hour.
    pub fn ttl(&self) -> Duration {
        const MINUTE: u64 = 60;
        let secs = match self {
            AnalyticsDataType::CallVolume | AnalyticsDataType::Appointments => 2 * MINUTE,
            AnalyticsDataType::Overview | AnalyticsDataType::CallOutcomes => 5 * MINUTE,
            AnalyticsDataType::Revenue => 10 * MINUTE,
            AnalyticsDataType::TopServices => 15 * MINUTE,
            AnalyticsDataType::PeakHours => 30 * MINUTE,
            AnalyticsDataType::Historical => 60 * MINUTE,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for AnalyticsDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyticsDataType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|data_type| data_type.as_str() == s)
            .ok_or_else(|| CacheError::UnknownDataType(s.to_string()))
    }
}

// == Date Range ==
/// Inclusive reporting window. Only its day boundaries reach the cache key.
///
/// Deserialization goes through [`DateRange::new`], so an inverted range is
/// rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedDateRange")]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// Builds a range, rejecting a start after the end.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(CacheError::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending now. Spans past the representable range start
    /// at the earliest representable instant.
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        let start = chrono::Duration::try_days(days.max(0))
            .and_then(|span| end.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    fn key_segment(&self) -> String {
        format!(
            "{}:{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

#[derive(Deserialize)]
struct UncheckedDateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<UncheckedDateRange> for DateRange {
    type Error = CacheError;

    fn try_from(raw: UncheckedDateRange) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

// == Key Derivation ==
/// `analytics:<tenant>:<type>:<start day>:<end day>`
pub fn analytics_cache_key(
    tenant_id: &str,
    data_type: AnalyticsDataType,
    date_range: &DateRange,
) -> String {
    format!(
        "analytics:{}:{}:{}",
        tenant_id,
        data_type,
        date_range.key_segment()
    )
}

pub fn analytics_tags(tenant_id: &str, data_type: AnalyticsDataType) -> Vec<String> {
    vec![
        tenant_tag(tenant_id),
        data_type_tag(data_type),
        ANALYTICS_TAG.to_string(),
    ]
}

impl QueryCache {
    // == Get Analytics Data ==
    /// Memoizes an analytics query under a key and TTL derived from its
    /// tenant, data type and date range.
    pub async fn get_analytics_data<T, F, Fut, E>(
        &self,
        tenant_id: &str,
        data_type: AnalyticsDataType,
        date_range: &DateRange,
        compute: F,
        custom_ttl: Option<Duration>,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        let key = analytics_cache_key(tenant_id, data_type, date_range);
        let options = CacheOptions::new()
            .with_ttl(custom_ttl.unwrap_or_else(|| data_type.ttl()))
            .with_tags(analytics_tags(tenant_id, data_type));

        self.get(&key, compute, options).await
    }

    // == Tenant Invalidation ==
    /// Drops every cached analytics result for a tenant.
    pub async fn invalidate_tenant_analytics(&self, tenant_id: &str) -> usize {
        self.invalidate_by_tags(&[tenant_tag(tenant_id)]).await
    }

    /// Drops the tenant's cached results of one data type only.
    pub async fn invalidate_tenant_data_type(
        &self,
        tenant_id: &str,
        data_type: AnalyticsDataType,
    ) -> usize {
        self.invalidate_by_all_tags(&[tenant_tag(tenant_id), data_type_tag(data_type)])
            .await
    }
}
