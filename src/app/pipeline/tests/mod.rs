//! Sequencer tests with fake capabilities
//!
//! The fakes keep the phase logic honest without network or database: the
//! fetcher serves in-memory archives, the expander understands a one-line
//! header format instead of zip, and the loader keeps row counts in memory.
//! Correction uses the real normalizer.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::UTF_8;
use tempfile::TempDir;
use url::Url;

use crate::app::archive::Expander;
use crate::app::client::Fetcher;
use crate::app::encoding::{count_lines, EncodingNormalizer, NormalizeReport, Transcoder};
use crate::app::loader::Loader;
use crate::app::manifest::{FileRecord, Manifest, ManifestStore, Phase, PhaseState};
use crate::app::target::Target;
use crate::errors::{
    AppError, DownloadError, DownloadResult, ExtractError, ExtractResult, LoadError, LoadResult,
    TranscodeResult,
};

use super::*;

const BASE_URL: &str = "https://example.org/dados";
const COMPANIES_MEMBER: &str = "K3241.K03200Y0.D50111.EMPRECSV";
const SIMPLES_MEMBER: &str = "F.K03200$W.SIMPLES.CSV.D50111";

/// Serves archives by file name; failures are consumed per attempt
#[derive(Default)]
struct FakeFetcher {
    listing: Option<String>,
    archives: HashMap<String, Vec<u8>>,
    failures: Mutex<HashMap<String, u32>>,
    listing_calls: AtomicUsize,
    downloads: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn serving(archives: &[(&str, Vec<u8>)]) -> Self {
        let links: String = archives
            .iter()
            .map(|(name, _)| format!("<a href=\"{}\">{}</a>\n", name, name))
            .collect();
        Self {
            listing: Some(format!("<html><body>{}</body></html>", links)),
            archives: archives
                .iter()
                .map(|(name, bytes)| (name.to_string(), bytes.clone()))
                .collect(),
            ..Default::default()
        }
    }

    fn failing(self, name: &str, attempts: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(name.to_string(), attempts);
        self
    }

    fn download_count(&self, name: &str) -> usize {
        self.downloads
            .lock()
            .unwrap()
            .iter()
            .filter(|downloaded| *downloaded == name)
            .count()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch_listing(&self, _url: &Url) -> DownloadResult<String> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.listing
            .clone()
            .ok_or(DownloadError::ServerError { status: 404 })
    }

    async fn fetch_to_file(&self, url: &Url, destination: &Path) -> DownloadResult<u64> {
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();
        self.downloads.lock().unwrap().push(name.clone());

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(DownloadError::Timeout { seconds: 60 });
                }
            }
        }

        let bytes = self
            .archives
            .get(&name)
            .ok_or(DownloadError::ServerError { status: 404 })?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, bytes).await?;
        Ok(bytes.len() as u64)
    }
}

/// Archive format: first line `MEMBER <name>`, the rest is the member body
#[derive(Default)]
struct FakeExpander {
    calls: Mutex<Vec<PathBuf>>,
}

fn fake_archive(member: &str, body: &str) -> Vec<u8> {
    format!("MEMBER {}\n{}", member, body).into_bytes()
}

#[async_trait]
impl Expander for FakeExpander {
    async fn expand(&self, archive: &Path, destination: &Path) -> ExtractResult<Vec<PathBuf>> {
        self.calls.lock().unwrap().push(archive.to_path_buf());

        let content = match tokio::fs::read_to_string(archive).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractError::MissingArchive {
                    path: archive.to_path_buf(),
                })
            }
            Err(e) => return Err(ExtractError::Io(e)),
        };

        let corrupt = || ExtractError::Corrupt {
            path: archive.to_path_buf(),
            reason: "missing member header".to_string(),
        };
        let (header, body) = content.split_once('\n').ok_or_else(corrupt)?;
        let member = header.strip_prefix("MEMBER ").ok_or_else(corrupt)?;

        tokio::fs::create_dir_all(destination).await?;
        let output = destination.join(member);
        tokio::fs::write(&output, body).await?;
        Ok(vec![output])
    }
}

/// Real normalizer that can be told to under-report the output lines
#[derive(Default)]
struct FakeTranscoder {
    lossy: HashSet<String>,
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn normalize(
        &self,
        source: &Path,
        destination: &Path,
    ) -> TranscodeResult<NormalizeReport> {
        let mut report = EncodingNormalizer::default()
            .normalize(source, destination)
            .await?;
        let name = source
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        if self.lossy.contains(name) {
            report.output_lines = report.output_lines.saturating_sub(1);
        }
        Ok(report)
    }
}

/// In-memory tables keyed by `schema.table`
#[derive(Default)]
struct FakeLoader {
    schema_unavailable: bool,
    rows_lost_per_insert: u64,
    tables: Mutex<HashMap<String, u64>>,
    truncated: Mutex<Vec<String>>,
    schema_calls: AtomicUsize,
}

impl FakeLoader {
    fn rows(&self, schema: &str, table: &str) -> Option<u64> {
        self.tables
            .lock()
            .unwrap()
            .get(&format!("{}.{}", schema, table))
            .copied()
    }

    fn truncate_count(&self) -> usize {
        self.truncated.lock().unwrap().len()
    }
}

#[async_trait]
impl Loader for FakeLoader {
    async fn ensure_schema(&self, _schema: &str) -> LoadResult<()> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        if self.schema_unavailable {
            return Err(LoadError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn truncate(&self, schema: &str, table: &str) -> LoadResult<()> {
        let key = format!("{}.{}", schema, table);
        self.truncated.lock().unwrap().push(key.clone());
        self.tables.lock().unwrap().insert(key, 0);
        Ok(())
    }

    async fn bulk_insert(&self, schema: &str, table: &str, file: &Path) -> LoadResult<u64> {
        let lines = count_lines(file, UTF_8)?;
        let inserted = lines.saturating_sub(self.rows_lost_per_insert);
        *self
            .tables
            .lock()
            .unwrap()
            .entry(format!("{}.{}", schema, table))
            .or_insert(0) += inserted;
        Ok(inserted)
    }

    async fn count_rows(&self, schema: &str, table: &str) -> LoadResult<u64> {
        Ok(self.rows(schema, table).unwrap_or(0))
    }
}

struct Harness {
    _temp_dir: TempDir,
    config: PipelineConfig,
    fetcher: Arc<FakeFetcher>,
    expander: Arc<FakeExpander>,
    loader: Arc<FakeLoader>,
    pipeline: Pipeline,
}

impl Harness {
    fn new(fetcher: FakeFetcher, transcoder: FakeTranscoder, loader: FakeLoader) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = PipelineConfig::rooted_at(temp_dir.path())
            .with_source_base_url(BASE_URL)
            .with_retry(RetryPolicy {
                attempts: 3,
                delay: Duration::ZERO,
            });

        let fetcher = Arc::new(fetcher);
        let expander = Arc::new(FakeExpander::default());
        let loader = Arc::new(loader);
        let pipeline = Pipeline::new(
            config.clone(),
            fetcher.clone(),
            expander.clone(),
            Arc::new(transcoder),
            loader.clone(),
        );

        Self {
            _temp_dir: temp_dir,
            config,
            fetcher,
            expander,
            loader,
            pipeline,
        }
    }

    fn store(&self) -> ManifestStore {
        self.pipeline.manifest_store(&target())
    }

    async fn saved_manifest(&self) -> Manifest {
        self.store().load().await.unwrap()
    }
}

fn target() -> Target {
    Target::new(2025, 1).unwrap()
}

fn numbered_lines(count: usize) -> String {
    (1..=count)
        .map(|i| format!("\"{:08}\";\"EMPRESA {}\";\"2062\"\n", i, i))
        .collect()
}

/// Purpose: one 1000-line archive with a known identifier goes all the way
/// through to a verified load
#[tokio::test]
async fn test_success_path_loads_every_line() {
    let harness = Harness::new(
        FakeFetcher::serving(&[(
            "Empresas0.zip",
            fake_archive(COMPANIES_MEMBER, &numbered_lines(1000)),
        )]),
        FakeTranscoder::default(),
        FakeLoader::default(),
    );

    let report = harness.pipeline.run(&target()).await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.succeeded, 1);
    assert!(report.is_complete());

    let manifest = harness.saved_manifest().await;
    let record = manifest.get("Empresas0.zip").unwrap();
    for phase in Phase::ALL {
        assert_eq!(record.state(phase), PhaseState::Success, "{}", phase);
    }
    assert_eq!(record.validated_line_count, Some(1000));
    assert_eq!(
        harness.loader.rows("rfb_202501", "rfb_empresas"),
        Some(1000)
    );

    let corrected = record.corrected_path.as_ref().unwrap();
    assert!(corrected.ends_with("2025/1. Janeiro/K3241.K03200Y0.D50111__corrigido.EMPRECSV"));
    assert!(corrected.exists());

    // Scratch directories are gone after the run
    assert!(!harness.config.downloads_dir.exists());
    assert!(!harness.config.extract_dir.exists());
}

/// Purpose: a second run over a finished manifest performs no downloads,
/// re-plans nothing and leaves the manifest byte-identical
#[tokio::test]
async fn test_second_run_is_idempotent() {
    let harness = Harness::new(
        FakeFetcher::serving(&[(
            "Empresas0.zip",
            fake_archive(COMPANIES_MEMBER, &numbered_lines(10)),
        )]),
        FakeTranscoder::default(),
        FakeLoader::default(),
    );

    harness.pipeline.run(&target()).await.unwrap();
    let first = tokio::fs::read(harness.store().path()).await.unwrap();

    let report = harness.pipeline.run(&target()).await.unwrap();
    let second = tokio::fs::read(harness.store().path()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(report.succeeded, 1);
    assert_eq!(harness.fetcher.listing_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.fetcher.download_count("Empresas0.zip"), 1);
    assert_eq!(harness.expander.calls.lock().unwrap().len(), 1);
    assert_eq!(harness.loader.truncate_count(), 1);
}

/// Purpose: no phase runs for a record whose predecessor did not succeed
#[tokio::test]
async fn test_failed_download_gates_later_phases() {
    let harness = Harness::new(
        FakeFetcher::serving(&[
            ("Cnaes.zip", fake_archive("F.K03200$Z.D50111.CNAECSV", "\"0111301\";\"Arroz\"\n")),
            ("Empresas0.zip", fake_archive(COMPANIES_MEMBER, "x\n")),
        ])
        .failing("Empresas0.zip", 3),
        FakeTranscoder::default(),
        FakeLoader::default(),
    );

    let report = harness.pipeline.run(&target()).await.unwrap();

    assert_eq!(harness.fetcher.download_count("Empresas0.zip"), 3);
    let manifest = harness.saved_manifest().await;
    let record = manifest.get("Empresas0.zip").unwrap();
    assert_eq!(record.download_state, PhaseState::Failed);
    assert_eq!(record.extract_state, PhaseState::Pending);
    assert_eq!(record.correct_state, PhaseState::Pending);
    assert_eq!(record.load_state, PhaseState::Pending);

    // Only the good archive reached the expander
    assert_eq!(harness.expander.calls.lock().unwrap().len(), 1);
    assert_eq!(manifest.get("Cnaes.zip").unwrap().load_state, PhaseState::Success);

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.outstanding.len(), 1);
    assert_eq!(report.outstanding[0].name, "Empresas0.zip");
}

/// Purpose: a transient failure is retried within the same run
#[tokio::test]
async fn test_transient_download_failure_is_retried() {
    let harness = Harness::new(
        FakeFetcher::serving(&[("Paises.zip", fake_archive("F.K03200$Z.D50111.PAIS", "\"013\";\"AFEGANISTAO\"\n"))])
            .failing("Paises.zip", 2),
        FakeTranscoder::default(),
        FakeLoader::default(),
    );

    harness.pipeline.run(&target()).await.unwrap();

    assert_eq!(harness.fetcher.download_count("Paises.zip"), 3);
    let manifest = harness.saved_manifest().await;
    assert_eq!(
        manifest.get("Paises.zip").unwrap().load_state,
        PhaseState::Success
    );
    assert_eq!(harness.loader.rows("rfb_202501", "rfb_paises"), Some(1));
}

/// Purpose: a corrupt archive fails extraction and is queued for download
/// again in the same saved manifest, then recovers on the next run
#[tokio::test]
async fn test_corrupt_archive_is_downloaded_again() {
    let mut fetcher = FakeFetcher::serving(&[("Socios0.zip", b"<html>503</html>".to_vec())]);
    let harness_dir = TempDir::new().unwrap();
    let config = PipelineConfig::rooted_at(harness_dir.path())
        .with_source_base_url(BASE_URL)
        .with_retry(RetryPolicy {
            attempts: 1,
            delay: Duration::ZERO,
        });

    let loader = Arc::new(FakeLoader::default());
    {
        let pipeline = Pipeline::new(
            config.clone(),
            Arc::new(fetcher),
            Arc::new(FakeExpander::default()),
            Arc::new(FakeTranscoder::default()),
            loader.clone(),
        );
        pipeline.run(&target()).await.unwrap();

        let manifest = pipeline.manifest_store(&target()).load().await.unwrap();
        let record = manifest.get("Socios0.zip").unwrap();
        assert_eq!(record.extract_state, PhaseState::Failed);
        assert_eq!(record.download_state, PhaseState::Pending);
        assert_eq!(record.correct_state, PhaseState::Pending);
    }

    // The server now serves a good archive
    fetcher = FakeFetcher::serving(&[(
        "Socios0.zip",
        fake_archive("K3241.K03200Y0.D50111.SOCIOCSV", &numbered_lines(5)),
    )]);
    let fetcher = Arc::new(fetcher);
    let pipeline = Pipeline::new(
        config,
        fetcher.clone(),
        Arc::new(FakeExpander::default()),
        Arc::new(FakeTranscoder::default()),
        loader.clone(),
    );
    let report = pipeline.run(&target()).await.unwrap();

    assert_eq!(fetcher.listing_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fetcher.download_count("Socios0.zip"), 1);
    assert_eq!(report.succeeded, 1);

    let manifest = pipeline.manifest_store(&target()).load().await.unwrap();
    let record = manifest.get("Socios0.zip").unwrap();
    assert_eq!(record.download_state, PhaseState::Success);
    assert_eq!(record.extract_state, PhaseState::Success);
    assert_eq!(loader.rows("rfb_202501", "rfb_socios"), Some(5));
}

/// Purpose: an archive removed from disk after a successful download is
/// fetched again instead of failing forever
#[tokio::test]
async fn test_missing_archive_on_resume_is_downloaded_again() {
    let harness = Harness::new(
        FakeFetcher::serving(&[(
            "Cnaes.zip",
            fake_archive("F.K03200$Z.D50111.CNAECSV", "\"0111301\";\"Arroz\"\n"),
        )]),
        FakeTranscoder::default(),
        FakeLoader::default(),
    );

    let mut manifest = Manifest::new();
    let mut record = FileRecord::new(
        format!("{}/2025-01/Cnaes.zip", BASE_URL),
        harness.config.downloads_dir.join("Cnaes.zip"),
    );
    record.download_state = PhaseState::Success;
    manifest.insert("Cnaes.zip", record);
    harness.store().save(&manifest).await.unwrap();

    harness.pipeline.run(&target()).await.unwrap();

    let manifest = harness.saved_manifest().await;
    let record = manifest.get("Cnaes.zip").unwrap();
    assert_eq!(record.extract_state, PhaseState::Failed);
    assert_eq!(record.download_state, PhaseState::Pending);
    assert_eq!(harness.fetcher.listing_calls.load(Ordering::SeqCst), 0);

    // Next run downloads, extracts and loads it
    harness.pipeline.run(&target()).await.unwrap();
    let manifest = harness.saved_manifest().await;
    assert_eq!(
        manifest.get("Cnaes.zip").unwrap().load_state,
        PhaseState::Success
    );
}

/// Purpose: a member whose identifier has no table is skipped without the
/// loader ever touching a table
#[tokio::test]
async fn test_unmapped_identifier_is_skipped() {
    let harness = Harness::new(
        FakeFetcher::serving(&[(
            "Simples.zip",
            fake_archive(SIMPLES_MEMBER, "\"00000000\";\"N\"\n"),
        )]),
        FakeTranscoder::default(),
        FakeLoader::default(),
    );

    let report = harness.pipeline.run(&target()).await.unwrap();

    let manifest = harness.saved_manifest().await;
    let record = manifest.get("Simples.zip").unwrap();
    assert_eq!(record.correct_state, PhaseState::Success);
    assert_eq!(record.load_state, PhaseState::Skipped);
    assert_eq!(harness.loader.truncate_count(), 0);
    assert!(harness.loader.tables.lock().unwrap().is_empty());

    assert_eq!(report.succeeded, 0);
    assert_eq!(report.outstanding[0].load_state, PhaseState::Skipped);
}

/// Purpose: 1000 source lines against 999 corrected lines fails correction
/// and the load never runs
#[tokio::test]
async fn test_line_count_mismatch_blocks_load() {
    let transcoder = FakeTranscoder {
        lossy: [COMPANIES_MEMBER.to_string()].into_iter().collect(),
    };
    let harness = Harness::new(
        FakeFetcher::serving(&[(
            "Empresas0.zip",
            fake_archive(COMPANIES_MEMBER, &numbered_lines(1000)),
        )]),
        transcoder,
        FakeLoader::default(),
    );

    harness.pipeline.run(&target()).await.unwrap();

    let manifest = harness.saved_manifest().await;
    let record = manifest.get("Empresas0.zip").unwrap();
    assert_eq!(record.correct_state, PhaseState::Failed);
    assert_eq!(record.load_state, PhaseState::Pending);
    assert_eq!(record.validated_line_count, None);
    assert!(record.corrected_path.is_some());
    assert_eq!(harness.loader.truncate_count(), 0);
}

/// Purpose: a table whose row count disagrees with the file fails the load
#[tokio::test]
async fn test_row_count_mismatch_fails_load() {
    let loader = FakeLoader {
        rows_lost_per_insert: 1,
        ..Default::default()
    };
    let harness = Harness::new(
        FakeFetcher::serving(&[(
            "Empresas0.zip",
            fake_archive(COMPANIES_MEMBER, &numbered_lines(20)),
        )]),
        FakeTranscoder::default(),
        loader,
    );

    let report = harness.pipeline.run(&target()).await.unwrap();

    let manifest = harness.saved_manifest().await;
    assert_eq!(
        manifest.get("Empresas0.zip").unwrap().load_state,
        PhaseState::Failed
    );
    assert_eq!(harness.loader.rows("rfb_202501", "rfb_empresas"), Some(19));
    assert_eq!(report.outstanding[0].load_state, PhaseState::Failed);
}

/// Purpose: an unreachable database aborts the load phase for every file
/// but the run still reports
#[tokio::test]
async fn test_schema_failure_aborts_load_phase() {
    let loader = FakeLoader {
        schema_unavailable: true,
        ..Default::default()
    };
    let harness = Harness::new(
        FakeFetcher::serving(&[
            ("Empresas0.zip", fake_archive(COMPANIES_MEMBER, &numbered_lines(3))),
            ("Cnaes.zip", fake_archive("F.K03200$Z.D50111.CNAECSV", "\"0111301\";\"Arroz\"\n")),
        ]),
        FakeTranscoder::default(),
        loader,
    );

    let report = harness.pipeline.run(&target()).await.unwrap();

    assert!(report.load_phase_error.is_some());
    assert!(!report.is_complete());
    assert_eq!(report.outstanding.len(), 2);

    let manifest = harness.saved_manifest().await;
    for (_, record) in manifest.iter() {
        assert_eq!(record.correct_state, PhaseState::Success);
        assert_eq!(record.load_state, PhaseState::Pending);
    }
    assert_eq!(harness.loader.truncate_count(), 0);
}

/// Purpose: a listing that cannot be fetched is fatal and writes no manifest
#[tokio::test]
async fn test_planning_failure_writes_no_manifest() {
    let fetcher = FakeFetcher {
        listing: None,
        ..Default::default()
    };
    let harness = Harness::new(fetcher, FakeTranscoder::default(), FakeLoader::default());

    let result = harness.pipeline.run(&target()).await;

    assert!(matches!(result, Err(AppError::Listing(_))));
    assert!(!harness.store().exists().await.unwrap());
    assert_eq!(harness.loader.schema_calls.load(Ordering::SeqCst), 0);
}

/// Purpose: a listing without archives is fatal and writes no manifest
#[tokio::test]
async fn test_empty_listing_writes_no_manifest() {
    let harness = Harness::new(
        FakeFetcher::serving(&[]),
        FakeTranscoder::default(),
        FakeLoader::default(),
    );

    let result = harness.pipeline.run(&target()).await;

    match result {
        Err(e) => assert_eq!(e.category(), "planning"),
        Ok(_) => panic!("Expected a planning failure"),
    }
    assert!(!harness.store().exists().await.unwrap());
}

/// Purpose: status reads the report without running anything
#[tokio::test]
async fn test_read_status() {
    let harness = Harness::new(
        FakeFetcher::serving(&[("Empresas0.zip", fake_archive(COMPANIES_MEMBER, "a\n"))]),
        FakeTranscoder::default(),
        FakeLoader::default(),
    );

    let root = harness.config.destination_root.clone();
    assert!(read_status(&root, &target()).await.unwrap().is_none());

    harness.pipeline.run(&target()).await.unwrap();
    let report = read_status(&root, &target()).await.unwrap().unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(harness.fetcher.listing_calls.load(Ordering::SeqCst), 1);
}

/// Purpose: an unreadable manifest location is an error, not "no manifest"
#[tokio::test]
async fn test_read_status_propagates_io_errors() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("dados_cnpj");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("2025"), b"not a directory").unwrap();

    let result = read_status(&root, &target()).await;
    assert!(matches!(result, Err(AppError::Manifest(_))));
}

/// Purpose: a workspace that overlaps the destination tree is refused
/// before anything is wiped
#[tokio::test]
async fn test_overlapping_workspace_keeps_existing_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = PipelineConfig::rooted_at(temp_dir.path()).with_source_base_url(BASE_URL);
    config.downloads_dir = config.destination_root.clone();

    let store = ManifestStore::new(target().manifest_path(&config.destination_root));
    let mut manifest = Manifest::new();
    manifest.insert(
        "Cnaes.zip",
        FileRecord::new(
            format!("{}/2025-01/Cnaes.zip", BASE_URL),
            config.downloads_dir.join("Cnaes.zip"),
        ),
    );
    store.save(&manifest).await.unwrap();

    let fetcher = Arc::new(FakeFetcher::serving(&[(
        "Cnaes.zip",
        fake_archive("F.K03200$Z.D50111.CNAECSV", "\"0111301\";\"Arroz\"\n"),
    )]));
    let pipeline = Pipeline::new(
        config,
        fetcher.clone(),
        Arc::new(FakeExpander::default()),
        Arc::new(FakeTranscoder::default()),
        Arc::new(FakeLoader::default()),
    );

    let result = pipeline.run(&target()).await;

    assert!(matches!(result, Err(AppError::Generic { .. })));
    assert_eq!(store.load().await.unwrap(), manifest);
    assert_eq!(fetcher.download_count("Cnaes.zip"), 0);
}
