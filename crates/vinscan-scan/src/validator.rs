// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Validator — repeated-sighting confidence, one-shot registry lookup, and the
// typed-in VIN path.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use vinscan_bridge::traits::VehicleRegistry;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::VehicleInfo;
use vinscan_core::vin::Vin;

use crate::corrector::clean;

pub use vinscan_core::vin::is_structurally_valid;

/// Candidate bookkeeping for one session.
pub struct Validator {
    registry: Arc<dyn VehicleRegistry>,
    lookup_timeout: Duration,
    min_matches: u32,
    match_counts: HashMap<Vin, u32>,
    checked: HashSet<Vin>,
}

impl Validator {
    pub fn new(registry: Arc<dyn VehicleRegistry>, min_matches: u32, lookup_timeout: Duration) -> Self {
        Self {
            registry,
            lookup_timeout,
            min_matches: min_matches.max(1),
            match_counts: HashMap::new(),
            checked: HashSet::new(),
        }
    }

    /// Count one sighting of each candidate and return those now eligible for
    /// lookup, most-seen first.
    pub fn record(&mut self, candidates: &[Vin]) -> Vec<Vin> {
        let unique: BTreeSet<&Vin> = candidates.iter().collect();
        let mut ready: Vec<(u32, Vin)> = Vec::new();
        for vin in unique {
            let count = self.match_counts.entry(vin.clone()).or_insert(0);
            *count += 1;
            debug!(vin = %vin, count = *count, "Candidate sighted");
            if *count >= self.min_matches && !self.checked.contains(vin) {
                ready.push((*count, vin.clone()));
            }
        }
        ready.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        ready.into_iter().map(|(_, vin)| vin).collect()
    }

    /// Record sightings and look up every candidate that qualified this cycle.
    ///
    /// The first one the registry enriches is accepted. When none is enriched
    /// the most-seen candidate is accepted on format alone. Each candidate is
    /// looked up at most once per session.
    pub async fn evaluate(&mut self, candidates: &[Vin]) -> Option<VehicleInfo> {
        let mut fallback = None;
        for vin in self.record(candidates) {
            self.checked.insert(vin.clone());
            let info = self.lookup(&vin).await;
            if info.is_enriched() {
                return Some(info);
            }
            fallback.get_or_insert(info);
        }
        fallback
    }

    /// Enrich `vin` from the registry. Never fails: errors, timeouts and empty
    /// answers all yield an unenriched `VehicleInfo`.
    #[instrument(skip(self), fields(vin = %vin))]
    pub async fn lookup(&self, vin: &Vin) -> VehicleInfo {
        match tokio::time::timeout(self.lookup_timeout, self.registry.decode(vin)).await {
            Ok(Ok(Some(record))) if record.is_usable() => {
                info!("Registry enriched VIN");
                VehicleInfo::from_record(vin.clone(), record)
            }
            Ok(Ok(_)) => {
                info!("Registry has nothing usable; accepting VIN on format");
                VehicleInfo::unenriched(vin.clone())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Registry lookup failed; accepting VIN on format");
                VehicleInfo::unenriched(vin.clone())
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "Registry lookup timed out; accepting VIN on format"
                );
                VehicleInfo::unenriched(vin.clone())
            }
        }
    }

    /// Validate a VIN typed in by hand and enrich it.
    pub async fn validate_manual(&self, input: &str) -> Result<VehicleInfo> {
        let cleaned = clean(input);
        let vin = Vin::parse(&cleaned).map_err(|_| VinScanError::InvalidVin(input.trim().to_string()))?;
        Ok(self.lookup(&vin).await)
    }

    pub fn match_count(&self, vin: &Vin) -> u32 {
        self.match_counts.get(vin).copied().unwrap_or(0)
    }

    pub fn was_checked(&self, vin: &Vin) -> bool {
        self.checked.contains(vin)
    }
}
