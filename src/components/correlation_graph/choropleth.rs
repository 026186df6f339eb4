//! Per-region statistics for the map embedded in highlighted tooltips.
//!
//! Lookups go through [`ChoroplethCache`], which keeps one entry per
//! `(dataset, mount, source)` key. A ready entry is never fetched again and a
//! pending entry is never fetched twice. Completions are delivered through the
//! loader's queue and drained by the controller on its next tick, so a
//! response never runs inside another event handler.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, RequestInit, Response};

use super::adapter::ChoroplethLoader;
use super::error::LoadError;

/// Cache key for one tooltip map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChoroplethKey {
	/// Dataset requested from the stats endpoint (the node name).
	pub dataset: String,
	/// Element the map is mounted in.
	pub mount: String,
	/// Source document of the dataset.
	pub source: String,
}

/// Numeric value per region id, with the observed range.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionStats {
	values: BTreeMap<String, f64>,
	min: f64,
	max: f64,
}

impl RegionStats {
	pub fn new(values: BTreeMap<String, f64>) -> Self {
		let min = values.values().copied().fold(f64::INFINITY, f64::min);
		let max = values.values().copied().fold(f64::NEG_INFINITY, f64::max);
		if values.is_empty() {
			return Self::default();
		}
		Self { values, min, max }
	}

	/// Parse the endpoint's response shape: `{ regionId: { key: value } }`.
	///
	/// Every region carries one value under the same opaque key; the key is
	/// taken from the first region. Values may be numbers or numeric strings;
	/// anything else is skipped.
	pub fn from_json(data: &serde_json::Value) -> Result<Self, LoadError> {
		let regions = data
			.as_object()
			.ok_or_else(|| LoadError::Malformed("expected an object of regions".into()))?;
		let Some((_, first)) = regions.iter().next() else {
			return Ok(Self::default());
		};
		let key = first
			.as_object()
			.and_then(|inner| inner.keys().next())
			.ok_or_else(|| LoadError::Malformed("region entry has no value key".into()))?;

		let values = regions
			.iter()
			.filter_map(|(id, entry)| {
				let v = entry.get(key)?;
				let n = v
					.as_f64()
					.or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))?;
				n.is_finite().then(|| (id.clone(), n))
			})
			.collect();
		Ok(Self::new(values))
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn min(&self) -> f64 {
		self.min
	}

	pub fn max(&self) -> f64 {
		self.max
	}

	pub fn value(&self, region: &str) -> Option<f64> {
		self.values.get(region).copied()
	}

	/// Normalized shade in `0..=1`; 1.0 when every region has the same value.
	pub fn shade(&self, region: &str) -> Option<f64> {
		let v = self.value(region)?;
		let range = self.max - self.min;
		if range <= 0.0 {
			Some(1.0)
		} else {
			Some((v - self.min) / range)
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
		self.values.iter().map(|(k, &v)| (k.as_str(), v))
	}
}

/// Answer to a cache lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum MapLookup {
	Ready(Rc<RegionStats>),
	/// A request for this key is already in flight.
	Pending,
	/// The caller must issue the request now.
	Fetch,
}

#[derive(Clone, Debug)]
enum Entry {
	Pending,
	Ready(Rc<RegionStats>),
	Failed,
}

/// Result cache for region statistics.
#[derive(Clone, Debug, Default)]
pub struct ChoroplethCache {
	entries: HashMap<ChoroplethKey, Entry>,
}

impl ChoroplethCache {
	/// Look up `key`, marking it pending when a fetch is needed.
	/// Failed keys are fetched again on the next request.
	pub fn request(&mut self, key: &ChoroplethKey) -> MapLookup {
		match self.entries.get(key) {
			Some(Entry::Ready(stats)) => {
				debug!("corr-graph: region stats cache hit for {}", key.dataset);
				MapLookup::Ready(stats.clone())
			}
			Some(Entry::Pending) => MapLookup::Pending,
			Some(Entry::Failed) | None => {
				self.entries.insert(key.clone(), Entry::Pending);
				MapLookup::Fetch
			}
		}
	}

	/// Record a finished request.
	pub fn complete(
		&mut self,
		key: &ChoroplethKey,
		result: Result<RegionStats, LoadError>,
	) -> Result<Rc<RegionStats>, LoadError> {
		match result {
			Ok(stats) => {
				let stats = Rc::new(stats);
				self.entries
					.insert(key.clone(), Entry::Ready(stats.clone()));
				Ok(stats)
			}
			Err(e) => {
				self.entries.insert(key.clone(), Entry::Failed);
				Err(e)
			}
		}
	}

	#[cfg(test)]
	pub(crate) fn is_ready(&self, key: &ChoroplethKey) -> bool {
		matches!(self.entries.get(key), Some(Entry::Ready(_)))
	}
}

type Completions = Rc<RefCell<Vec<(ChoroplethKey, Result<RegionStats, LoadError>)>>>;

/// Fetches region statistics from an HTTP endpoint.
///
/// Sends `send_full=<dataset>` as a form-encoded POST. Without an endpoint
/// every fetch completes immediately with [`LoadError::Disabled`].
#[derive(Clone, Debug, Default)]
pub struct HttpChoroplethLoader {
	endpoint: Option<String>,
	completed: Completions,
}

impl HttpChoroplethLoader {
	pub fn new(endpoint: Option<String>) -> Self {
		Self {
			endpoint,
			completed: Rc::default(),
		}
	}
}

impl ChoroplethLoader for HttpChoroplethLoader {
	fn fetch(&mut self, key: &ChoroplethKey) {
		let Some(endpoint) = self.endpoint.clone() else {
			self.completed
				.borrow_mut()
				.push((key.clone(), Err(LoadError::Disabled)));
			return;
		};
		let (queue, key) = (self.completed.clone(), key.clone());
		wasm_bindgen_futures::spawn_local(async move {
			let result = fetch_region_stats(&endpoint, &key.dataset).await;
			if let Err(e) = &result {
				warn!("corr-graph: region stats for {} unavailable: {}", key.dataset, e);
			}
			queue.borrow_mut().push((key, result));
		});
	}

	fn drain_completed(&mut self) -> Vec<(ChoroplethKey, Result<RegionStats, LoadError>)> {
		std::mem::take(&mut *self.completed.borrow_mut())
	}
}

fn js_error(e: JsValue) -> LoadError {
	LoadError::Request(format!("{e:?}"))
}

async fn fetch_region_stats(endpoint: &str, dataset: &str) -> Result<RegionStats, LoadError> {
	let window = web_sys::window().ok_or_else(|| LoadError::Request("no window".into()))?;

	let headers = Headers::new().map_err(js_error)?;
	headers
		.set("Content-Type", "application/x-www-form-urlencoded")
		.map_err(js_error)?;
	let body = format!(
		"send_full={}",
		String::from(js_sys::encode_uri_component(dataset))
	);
	let init = RequestInit::new();
	init.set_method("POST");
	init.set_headers(&headers);
	init.set_body(&JsValue::from_str(&body));

	let response: Response = JsFuture::from(window.fetch_with_str_and_init(endpoint, &init))
		.await
		.map_err(js_error)?
		.dyn_into()
		.map_err(js_error)?;
	if !response.ok() {
		return Err(LoadError::Status(response.status()));
	}

	let text = JsFuture::from(response.text().map_err(js_error)?)
		.await
		.map_err(js_error)?
		.as_string()
		.ok_or_else(|| LoadError::Malformed("response body is not text".into()))?;
	let data: serde_json::Value = serde_json::from_str(&text)?;
	RegionStats::from_json(&data)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn key(dataset: &str) -> ChoroplethKey {
		ChoroplethKey {
			dataset: dataset.into(),
			mount: "toolmap".into(),
			source: "Census".into(),
		}
	}

	#[test]
	fn parses_opaque_inner_key() {
		let stats = RegionStats::from_json(&json!({
			"06001": {"0": 10.0},
			"06003": {"0": "30"},
			"06005": {"0": null},
		}))
		.unwrap();
		assert_eq!(stats.len(), 2);
		assert_eq!(stats.min(), 10.0);
		assert_eq!(stats.max(), 30.0);
		assert_eq!(stats.shade("06001"), Some(0.0));
		assert_eq!(stats.shade("06003"), Some(1.0));
		assert_eq!(stats.shade("06005"), None);
	}

	#[test]
	fn flat_range_shades_full() {
		let stats = RegionStats::from_json(&json!({"a": {"v": 2}, "b": {"v": 2}})).unwrap();
		assert_eq!(stats.shade("a"), Some(1.0));
	}

	#[test]
	fn empty_object_is_empty_stats() {
		assert!(RegionStats::from_json(&json!({})).unwrap().is_empty());
	}

	#[test]
	fn non_object_is_malformed() {
		assert!(matches!(
			RegionStats::from_json(&json!([1, 2])),
			Err(LoadError::Malformed(_))
		));
		assert!(matches!(
			RegionStats::from_json(&json!({"a": 3})),
			Err(LoadError::Malformed(_))
		));
	}

	#[test]
	fn second_lookup_hits_cache() {
		let mut cache = ChoroplethCache::default();
		assert_eq!(cache.request(&key("docA")), MapLookup::Fetch);
		assert_eq!(cache.request(&key("docA")), MapLookup::Pending);
		cache
			.complete(&key("docA"), Ok(RegionStats::default()))
			.unwrap();
		assert!(matches!(cache.request(&key("docA")), MapLookup::Ready(_)));
		assert!(cache.is_ready(&key("docA")));
	}

	#[test]
	fn keys_differ_by_mount() {
		let mut cache = ChoroplethCache::default();
		cache.request(&key("docA"));
		let other = ChoroplethKey {
			mount: "bigmap".into(),
			..key("docA")
		};
		assert_eq!(cache.request(&other), MapLookup::Fetch);
	}

	#[test]
	fn failure_allows_retry() {
		let mut cache = ChoroplethCache::default();
		cache.request(&key("docA"));
		let err = cache
			.complete(&key("docA"), Err(LoadError::Status(500)))
			.unwrap_err();
		assert_eq!(err, LoadError::Status(500));
		assert_eq!(cache.request(&key("docA")), MapLookup::Fetch);
	}

	#[test]
	fn disabled_loader_completes_with_error() {
		let mut loader = HttpChoroplethLoader::new(None);
		loader.fetch(&key("docA"));
		let done = loader.drain_completed();
		assert_eq!(done, vec![(key("docA"), Err(LoadError::Disabled))]);
		assert!(loader.drain_completed().is_empty());
	}
}
