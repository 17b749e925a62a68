//! Fixture Cache
//!
//! Synthetic TSDB blocks are expensive to generate, so they are produced once
//! into a cache root and reused by every later run. The cache root is the
//! unit of validity: if it exists it is trusted. Generation writes into a
//! sibling staging directory that is renamed onto the root only once every
//! fixture is complete, so an interrupted or failed run never leaves a root
//! behind.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use orchestrator::{FileSystem, ProcessLauncher, ToolRun};
use shared::{Labels, logging, service_info, service_warn};

use crate::config::BenchConfig;
use crate::error::{BenchError, BenchResult};

const CACHE: &str = "fixtures";

/// Where a generator stage sees its output directory
const GEN_OUTPUT_DIR: &str = "/shared";

/// One synthetic dataset: external labels plus the end of its time range
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSpec {
    pub name: String,
    pub labels: Labels,
    pub max_time: DateTime<Utc>,
}

impl FixtureSpec {
    pub fn new<S: Into<String>>(name: S, labels: Labels, max_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            labels,
            max_time,
        }
    }

    /// `block plan` arguments for this fixture
    pub fn plan_args(&self, profile: &str) -> Vec<String> {
        let mut args = vec![
            "block".to_string(),
            "plan".to_string(),
            "-p".to_string(),
            profile.to_string(),
        ];
        for matcher in self.labels.to_matchers() {
            args.push("--labels".to_string());
            args.push(matcher);
        }
        args.push(format!(
            "--max-time={}",
            self.max_time.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        args
    }
}

/// Resolved fixture directories, by fixture name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePaths {
    dirs: BTreeMap<String, PathBuf>,
}

impl FixturePaths {
    pub fn get(&self, name: &str) -> BenchResult<&Path> {
        self.dirs
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| BenchError::configuration("fixtures", format!("no fixture named '{name}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.dirs.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

pub struct FixtureCache {
    root: PathBuf,
    image: String,
    profile: String,
    fixtures: Vec<FixtureSpec>,
}

impl FixtureCache {
    /// Cache rooted at `root`, resolved to an absolute path so it can be
    /// bind-mounted into containers
    pub fn new<P: AsRef<Path>>(
        root: P,
        image: &str,
        profile: &str,
        fixtures: Vec<FixtureSpec>,
    ) -> BenchResult<Self> {
        Ok(Self {
            root: std::path::absolute(root.as_ref())?,
            image: image.to_string(),
            profile: profile.to_string(),
            fixtures,
        })
    }

    /// The four datasets of the query pushdown demo
    pub fn query_pushdown(config: &BenchConfig) -> BenchResult<Self> {
        let fixtures = vec![
            FixtureSpec::new(
                "store1",
                Labels::from_pairs(&[("cluster", "eu-1"), ("replica", "0")])?,
                config.max_time_old,
            ),
            FixtureSpec::new(
                "store2",
                Labels::from_pairs(&[("cluster", "us-1"), ("replica", "0")])?,
                config.max_time_old,
            ),
            FixtureSpec::new("prom1", Labels::new(), config.max_time_fresh),
            FixtureSpec::new("prom2", Labels::new(), config.max_time_fresh),
        ];
        Self::new(&config.data_dir, &config.bench_image, &config.profile, fixtures)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sibling directory fixtures are generated into before promotion
    pub fn staging(&self) -> PathBuf {
        let mut name = self.root.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.root.with_file_name(name)
    }

    pub fn fixtures(&self) -> &[FixtureSpec] {
        &self.fixtures
    }

    pub fn paths(&self) -> FixturePaths {
        FixturePaths {
            dirs: self
                .fixtures
                .iter()
                .map(|f| (f.name.clone(), self.root.join(&f.name)))
                .collect(),
        }
    }

    /// An existing cache root is trusted as complete; freshness is not checked.
    pub async fn is_valid(&self, fs: &dyn FileSystem) -> bool {
        fs.exists(&self.root).await
    }

    /// Remove partial output of an unfinished generation. A promoted cache
    /// root is complete and is left alone.
    pub async fn rollback(&self, fs: &dyn FileSystem) -> BenchResult<()> {
        let staging = self.staging();
        if fs.exists(&staging).await {
            service_warn!(CACHE, "🧹 Removing partial fixtures at {}", staging.display());
        }
        fs.remove_dir_all(&staging).await.map_err(BenchError::Setup)
    }

    /// Return the cached fixtures, generating all of them first if the cache is absent.
    pub async fn ensure(
        &self,
        launcher: &dyn ProcessLauncher,
        fs: &dyn FileSystem,
    ) -> BenchResult<FixturePaths> {
        if self.is_valid(fs).await {
            service_info!(CACHE, "♻️ Reusing fixtures in {}", self.root.display());
            return Ok(self.paths());
        }

        logging::log_progress(
            CACHE,
            "Re-creating data (can take minutes)...",
            &self.root.display().to_string(),
        );
        if let Err(e) = self.generate(launcher, fs).await {
            logging::log_error(CACHE, "Fixture generation", &e);
            if let Err(rollback_error) = self.rollback(fs).await {
                service_warn!(CACHE, "⚠️ Rollback failed: {}", rollback_error);
            }
            return Err(e);
        }

        logging::log_success(CACHE, &format!("Generated {} fixtures", self.fixtures.len()));
        Ok(self.paths())
    }

    async fn generate(&self, launcher: &dyn ProcessLauncher, fs: &dyn FileSystem) -> BenchResult<()> {
        let staging = self.staging();
        // Leftovers of a run that was killed before it could roll back
        fs.remove_dir_all(&staging).await.map_err(BenchError::Setup)?;

        for spec in &self.fixtures {
            let dir = staging.join(&spec.name);
            let generation = |source| BenchError::Generation {
                fixture: spec.name.clone(),
                source,
            };

            fs.create_dir_all(&dir).await.map_err(generation)?;
            service_info!(CACHE, "⏳ Generating {} {}", spec.name, spec.labels);
            launcher
                .run_pipeline(&self.pipeline(spec, &dir))
                .await
                .map_err(generation)?;
        }

        fs.rename(&staging, &self.root).await.map_err(BenchError::Setup)
    }

    /// `block plan | block gen` with the fixture directory mounted for `gen`
    pub fn pipeline(&self, spec: &FixtureSpec, dir: &Path) -> Vec<ToolRun> {
        vec![
            ToolRun::new(&self.image).args(spec.plan_args(&self.profile)),
            ToolRun::new(&self.image)
                .args(["block", "gen", "--output.dir", GEN_OUTPUT_DIR])
                .volume(dir, GEN_OUTPUT_DIR),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_args_quote_labels() {
        let spec = FixtureSpec::new(
            "store1",
            Labels::from_pairs(&[("cluster", "eu-1"), ("replica", "0")]).unwrap(),
            BenchConfig::default().max_time_old,
        );

        assert_eq!(
            spec.plan_args("continuous-1w-small"),
            vec![
                "block",
                "plan",
                "-p",
                "continuous-1w-small",
                "--labels",
                "cluster=\"eu-1\"",
                "--labels",
                "replica=\"0\"",
                "--max-time=2021-07-20T00:00:00Z",
            ]
        );
    }

    #[test]
    fn test_query_pushdown_fixture_set() {
        let config = BenchConfig::builder().data_dir("/tmp/fixture-cache").build();
        let cache = FixtureCache::query_pushdown(&config).unwrap();

        let names: Vec<&str> = cache.fixtures().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["store1", "store2", "prom1", "prom2"]);
        assert!(cache.fixtures()[2].labels.is_empty());
        assert_eq!(cache.fixtures()[1].labels.get("cluster"), Some("us-1"));
        assert_eq!(
            cache.paths().get("prom2").unwrap(),
            Path::new("/tmp/fixture-cache/prom2")
        );
    }

    #[test]
    fn test_staging_is_sibling_of_root() {
        let cache = FixtureCache::new("/tmp/fixture-cache", "img", "profile", Vec::new()).unwrap();
        assert_eq!(cache.staging(), PathBuf::from("/tmp/fixture-cache.tmp"));
    }

    #[test]
    fn test_relative_root_made_absolute() {
        let cache = FixtureCache::new("data", "img", "profile", Vec::new()).unwrap();
        assert!(cache.root().is_absolute());
        assert!(cache.root().ends_with("data"));
    }
}
