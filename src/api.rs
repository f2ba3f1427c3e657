//! PokeAPI catalog loader

use std::future::Future;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::LoaderError;
use crate::state::{
    BaseStats, CatalogPage, IndexEntry, LoadedPage, Record, RecordFields, ResolvedBatch,
};

pub const DEFAULT_CATALOG_URL: &str = "https://pokeapi.co/api/v2/pokemon";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    pub catalog_url: String,
    /// Concurrent detail requests per page; `None` means one request per entry.
    pub max_in_flight: Option<usize>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            max_in_flight: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct CatalogResponse {
    count: Option<u32>,
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct NameOnly {
    name: String,
}

#[derive(Clone, Debug, Deserialize)]
struct DetailResponse {
    id: u32,
    name: String,
    species: NameOnly,
    #[serde(default)]
    sprites: serde_json::Value,
    #[serde(default)]
    types: Vec<TypeSlot>,
    #[serde(default)]
    abilities: Vec<AbilitySlot>,
    height: u32,
    weight: u32,
    #[serde(default)]
    stats: Vec<StatSlot>,
}

#[derive(Clone, Debug, Deserialize)]
struct TypeSlot {
    #[serde(rename = "type")]
    type_info: NameOnly,
}

#[derive(Clone, Debug, Deserialize)]
struct AbilitySlot {
    ability: NameOnly,
}

#[derive(Clone, Debug, Deserialize)]
struct StatSlot {
    base_stat: u16,
    stat: NameOnly,
}

static CATALOG: OnceLock<CatalogClient> = OnceLock::new();

/// Installs the loader used by effect tasks. Only the first call wins.
pub fn configure(config: CatalogConfig) -> &'static CatalogClient {
    CATALOG.get_or_init(|| CatalogClient::new(config))
}

pub fn catalog() -> &'static CatalogClient {
    CATALOG.get_or_init(|| CatalogClient::new(CatalogConfig::default()))
}

#[derive(Clone, Debug)]
pub struct CatalogClient {
    http: reqwest::Client,
    config: CatalogConfig,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// One listing request starting at `offset`.
    pub async fn fetch_page(
        &self,
        offset: usize,
        page_size: usize,
    ) -> Result<CatalogPage, LoaderError> {
        let url = &self.config.catalog_url;
        tracing::debug!(%url, offset, page_size, "fetching catalog page");
        let response = self
            .http
            .get(url)
            .query(&[("limit", page_size), ("offset", offset)])
            .send()
            .await
            .map_err(|source| LoaderError::Network {
                url: url.clone(),
                source,
            })?;
        let bytes = checked_body(url, response).await?;
        parse_catalog_page(url, &bytes)
    }

    /// Resolves every entry concurrently. The result keeps entry order;
    /// entries whose detail request fails are dropped and logged.
    pub async fn resolve_details(&self, entries: &[IndexEntry]) -> ResolvedBatch {
        let max_in_flight = self.config.max_in_flight.unwrap_or(entries.len());
        let client = self.clone();
        resolve_with(entries, max_in_flight, move |entry| {
            let client = client.clone();
            async move { client.fetch_detail(&entry.detail_url).await }
        })
        .await
    }

    /// Listing followed by detail resolution.
    pub async fn load_page(
        &self,
        offset: usize,
        page_size: usize,
    ) -> Result<LoadedPage, LoaderError> {
        let page = self.fetch_page(offset, page_size).await?;
        let requested = page.entries.len();
        let batch = self.resolve_details(&page.entries).await;
        tracing::info!(
            offset,
            requested,
            resolved = batch.records.len(),
            dropped = batch.dropped,
            total = ?page.total,
            "catalog page loaded"
        );
        Ok(LoadedPage {
            offset,
            limit: page_size,
            requested,
            total: page.total,
            records: batch.records,
            dropped: batch.dropped,
        })
    }

    pub async fn fetch_detail(&self, url: &str) -> Result<Record, LoaderError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| LoaderError::Network {
                url: url.to_string(),
                source,
            })?;
        let bytes = checked_body(url, response).await?;
        parse_detail(url, &bytes)
    }
}

async fn checked_body(url: &str, response: reqwest::Response) -> Result<Vec<u8>, LoaderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(LoaderError::HttpStatus {
            url: url.to_string(),
            status,
        });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|source| LoaderError::Network {
            url: url.to_string(),
            source,
        })?;
    Ok(bytes.to_vec())
}

/// Fans `fetch` out over `entries` with at most `max_in_flight` running at
/// once, waits for all of them, and compacts the successes in entry order.
pub async fn resolve_with<F, Fut>(
    entries: &[IndexEntry],
    max_in_flight: usize,
    fetch: F,
) -> ResolvedBatch
where
    F: Fn(IndexEntry) -> Fut,
    Fut: Future<Output = Result<Record, LoaderError>> + Send + 'static,
{
    if entries.is_empty() {
        return ResolvedBatch::default();
    }

    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut join_set = JoinSet::new();
    for (index, entry) in entries.iter().enumerate() {
        let semaphore = semaphore.clone();
        let name = entry.name.clone();
        let request = fetch(entry.clone());
        join_set.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => request.await,
                Err(_) => {
                    tracing::warn!(entry = %name, "detail semaphore closed");
                    return (index, None);
                }
            };
            match result {
                Ok(record) => (index, Some(record)),
                Err(error) => {
                    tracing::warn!(entry = %name, %error, "dropping entry");
                    (index, None)
                }
            }
        });
    }

    let mut slots: Vec<Option<Record>> = vec![None; entries.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, record)) => slots[index] = record,
            Err(error) => tracing::warn!(%error, "detail task failed"),
        }
    }

    let records: Vec<Record> = slots.into_iter().flatten().collect();
    ResolvedBatch {
        dropped: entries.len() - records.len(),
        records,
    }
}

pub fn parse_catalog_page(url: &str, bytes: &[u8]) -> Result<CatalogPage, LoaderError> {
    let response: CatalogResponse =
        serde_json::from_slice(bytes).map_err(|source| LoaderError::MalformedResponse {
            url: url.to_string(),
            source,
        })?;
    Ok(CatalogPage {
        total: response.count,
        entries: response
            .results
            .into_iter()
            .map(|entry| IndexEntry {
                name: entry.name,
                detail_url: entry.url,
            })
            .collect(),
    })
}

pub fn parse_detail(url: &str, bytes: &[u8]) -> Result<Record, LoaderError> {
    let response: DetailResponse =
        serde_json::from_slice(bytes).map_err(|source| LoaderError::MalformedResponse {
            url: url.to_string(),
            source,
        })?;
    Ok(record_from_detail(response))
}

fn record_from_detail(response: DetailResponse) -> Record {
    let stat = |name: &str| -> u16 {
        response
            .stats
            .iter()
            .find(|slot| slot.stat.name == name)
            .map(|slot| slot.base_stat)
            .unwrap_or(0)
    };
    let stats = BaseStats {
        hp: stat("hp"),
        attack: stat("attack"),
        defense: stat("defense"),
        special_attack: stat("special-attack"),
        special_defense: stat("special-defense"),
        speed: stat("speed"),
    };
    let abilities_text = if response.abilities.is_empty() {
        "None".to_string()
    } else {
        response
            .abilities
            .iter()
            .map(|slot| slot.ability.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    Record::new(RecordFields {
        id: response.id,
        species: response.species.name,
        sprite_url: pointer_string(&response.sprites, "/front_default"),
        shiny_sprite_url: pointer_string(&response.sprites, "/front_shiny"),
        types: response
            .types
            .into_iter()
            .map(|slot| slot.type_info.name)
            .collect(),
        abilities_text,
        height_m: response.height as f32 / 10.0,
        weight_kg: response.weight as f32 / 10.0,
        stats,
        name: response.name,
    })
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}
