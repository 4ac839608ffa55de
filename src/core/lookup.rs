use crate::config::LookupSettings;
use crate::core::normalize::normalize_number;
use crate::core::probe::ProbeRunner;
use crate::domain::model::{LookupResponse, PhoneNumber, ProbeResult, SourceProbe};
use crate::domain::ports::{ConfigProvider, Fetcher};
use crate::utils::error::Result;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

/// 查詢流程：正規化號碼 → 依序 (或有限並行) 執行所有來源 → 組合回應
pub struct LookupEngine {
    runner: ProbeRunner,
    probes: Vec<SourceProbe>,
    settings: LookupSettings,
}

impl LookupEngine {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        probes: Vec<SourceProbe>,
        settings: LookupSettings,
    ) -> Self {
        Self {
            runner: ProbeRunner::new(fetcher, settings.clone()),
            probes,
            settings,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::new(fetcher, config.probes().to_vec(), config.lookup_settings())
    }

    pub fn probes(&self) -> &[SourceProbe] {
        &self.probes
    }

    pub fn normalize(&self, raw: &str) -> Result<PhoneNumber> {
        normalize_number(
            raw,
            self.settings.min_digits,
            self.settings.default_country_code.as_deref(),
        )
    }

    /// Fails only when the number itself is invalid; probe failures are
    /// reported inside the response.
    pub async fn lookup(&self, raw: &str) -> Result<LookupResponse> {
        let number = self.normalize(raw)?;
        let started = Instant::now();

        tracing::info!(
            "🚀 Looking up {} across {} sources",
            number,
            self.probes.len()
        );

        let platforms = self.run_probes(&number).await;
        let response = assemble(raw, &number, platforms);

        tracing::info!(
            "✅ Lookup for {} finished in {:?}: {}/{} sources found data",
            number,
            started.elapsed(),
            response.platforms.iter().filter(|p| p.found).count(),
            response.platforms.len()
        );

        Ok(response)
    }

    async fn run_probes(&self, number: &PhoneNumber) -> Vec<ProbeResult> {
        let concurrency = self.settings.max_concurrent_probes;

        if concurrency <= 1 {
            let mut results = Vec::with_capacity(self.probes.len());
            for (i, probe) in self.probes.iter().enumerate() {
                if i > 0 && !self.settings.polite_delay.is_zero() {
                    tokio::time::sleep(self.settings.polite_delay).await;
                }
                results.push(self.runner.run(probe, number).await);
            }
            return results;
        }

        let mut futures: Vec<BoxFuture<'_, (usize, ProbeResult)>> = Vec::new();
        for (i, probe) in self.probes.iter().enumerate() {
            let runner = &self.runner;
            futures.push(async move { (i, runner.run(probe, number).await) }.boxed());
        }

        let mut indexed: Vec<(usize, ProbeResult)> = stream::iter(futures)
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // 完成順序不固定，依設定順序排回來
        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, result)| result).collect()
    }
}

/// First found probe, in configured order, with a non-empty value wins.
pub fn pick_best(platforms: &[ProbeResult]) -> (Option<String>, Option<String>) {
    let best_name = platforms
        .iter()
        .filter(|p| p.found)
        .find_map(|p| non_blank(&p.name));
    let best_photo = platforms
        .iter()
        .filter(|p| p.found)
        .find_map(|p| non_blank(&p.photo_url));

    (best_name, best_photo)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

pub fn assemble(
    queried: &str,
    number: &PhoneNumber,
    platforms: Vec<ProbeResult>,
) -> LookupResponse {
    let (best_name, best_photo) = pick_best(&platforms);

    LookupResponse {
        queried: queried.to_string(),
        number: number.canonical(),
        platforms,
        best_name,
        best_photo,
        timestamp: chrono::Utc::now(),
    }
}
