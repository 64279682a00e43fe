//! End-to-end scraper run
//!
//! Resolve period -> fetch -> shape -> group -> assemble -> write. Every
//! step is fatal on error; nothing is written unless the whole dataset could
//! be assembled.

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;

use crate::config::{Credentials, PeriodSelection, ProjectConfig, ScraperConfig, StaticMetadata};
use crate::dataset::writer::WriteOptions;
use crate::dataset::{Dataset, assemble, write_dataset};
use crate::error::{EveError, Result};
use crate::fetch::fetch;
use crate::group::group_by_country;
use crate::period::{current_period, resolve_period};
use crate::shape::shape;
use crate::source::arcgis::build_agent;
use crate::source::saved::save_latest;
use crate::source::{ArcGisClient, FeatureSource, SavedFeatures};
use crate::utils::logging::log_warning;

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Period that was published, `None` when every period was fetched
    pub period: Option<i64>,
    pub records: usize,
    pub countries: usize,
    pub resources: usize,
    pub manifest: PathBuf,
    pub dataset: Dataset,
}

/// A configured scraper
#[derive(Debug, Clone)]
pub struct Scraper {
    project: ProjectConfig,
    static_metadata: StaticMetadata,
    config: ScraperConfig,
}

impl Scraper {
    #[must_use]
    pub const fn new(
        project: ProjectConfig,
        static_metadata: StaticMetadata,
        config: ScraperConfig,
    ) -> Self {
        Self {
            project,
            static_metadata,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Open the configured data source.
    ///
    /// Saved snapshots need no credentials; the live service does.
    ///
    /// # Errors
    /// Returns a configuration error when live data is requested without
    /// credentials, or any error from connecting to the service.
    pub fn open_source(&self, credentials: Option<&Credentials>) -> Result<Box<dyn FeatureSource>> {
        if self.config.use_saved {
            let saved = SavedFeatures::load_latest(&self.config.saved_dir)?;
            if saved.is_empty() {
                log_warning("Saved snapshot has no features", Some(saved.path()));
            }
            log::info!(
                "Using {} saved features from {}",
                saved.len(),
                saved.path().display()
            );
            return Ok(Box::new(saved));
        }

        let credentials = credentials.ok_or_else(|| {
            EveError::Config("credentials are required to query the feature service".to_string())
        })?;
        let agent = build_agent(self.config.http_timeout);
        let client = ArcGisClient::connect(agent, &self.project.base_url, credentials)?;
        Ok(Box::new(client.feature_table(&self.project.feature_table_id)?))
    }

    /// Period to fetch given today's date
    pub fn select_period<S: FeatureSource + ?Sized>(
        &self,
        source: &S,
        today: NaiveDate,
    ) -> Result<Option<i64>> {
        match self.config.period {
            PeriodSelection::All => Ok(None),
            PeriodSelection::Fixed(period) => Ok(Some(period)),
            PeriodSelection::Latest => {
                let guess = current_period(today, self.config.start_year);
                log::info!("Current period is {guess}, looking for the latest with data");
                resolve_period(source, guess, self.config.max_lookback).map(Some)
            }
        }
    }

    /// Run the full pipeline against `source`
    pub fn run<S: FeatureSource + ?Sized>(&self, source: &S, today: NaiveDate) -> Result<RunSummary> {
        let start = Instant::now();
        let period = self.select_period(source, today)?;

        let raw = fetch(source, period)?;
        if self.config.save && !self.config.use_saved {
            save_latest(&self.config.saved_dir, &raw)?;
        }

        let records = shape(raw)?;
        let groups = group_by_country(&records);
        let dataset = assemble(
            &records,
            &groups,
            &self.project,
            &self.static_metadata,
            self.config.max_groups,
        )?;

        let options = WriteOptions {
            hxl_tags: Some(&self.project.hxl_tags),
            write_bom: self.config.write_bom,
        };
        let written = write_dataset(&dataset, &self.config.output_dir, &options)?;

        log::info!(
            "Published {} records for {} countries in {:?}",
            records.len(),
            dataset.countries.len(),
            start.elapsed()
        );

        Ok(RunSummary {
            period,
            records: records.len(),
            countries: dataset.countries.len(),
            resources: written.files.len(),
            manifest: written.manifest,
            dataset,
        })
    }
}
