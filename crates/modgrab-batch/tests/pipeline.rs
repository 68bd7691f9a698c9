use std::collections::{HashMap, VecDeque};
use std::io::{self, Cursor, Read};
use std::sync::{Arc, Mutex};

use color_eyre::eyre::Report as EyreReport;
use modgrab_batch::{Orchestrator, Report, Status};
use modgrab_component::ModQuery;
use modgrab_repository::http::{
    Exchange, HttpClient, Request, RetryPolicy, StatusCode, Transport, TransportError,
};
use modgrab_repository::{ArtifactFetcher, ModrinthRepository, ModsDirectory};
use modgrab_target::platform::{GameVersion, Loader, PlatformTarget};
use modgrab_target::settings::Settings;
use rstest::{fixture, rstest};
use tempdir::TempDir;

const TEMPDIR_PREFIX: &str = "modgrab-pipeline-test";
const SODIUM_JAR: &[u8] = b"PK\x03\x04 sodium";
const LITHIUM_JAR: &[u8] = b"PK\x03\x04 lithium";

struct Body(Cursor<Vec<u8>>, StatusCode);

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Exchange for Body {
    fn status(&self) -> StatusCode {
        self.1
    }
}

/// A tiny stand-in for the registry and its CDN, routed by path and, for
/// searches, by the `query` parameter.
#[derive(Default)]
struct Registry {
    routes: Mutex<HashMap<String, VecDeque<(StatusCode, Vec<u8>)>>>,
    sent: Mutex<Vec<Request>>,
}

impl Registry {
    fn route(&self, key: &str, status: StatusCode, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back((status, body.into()));
    }

    fn project(&self, slug: &str, title: &str, versions: &str) {
        let hit = format!(r#"{{"hits": [{{"project_id": "id-{slug}", "slug": "{slug}", "title": "{title}"}}]}}"#);
        self.route(&format!("/v2/search?{title}"), StatusCode::OK, hit);
        self.route(&format!("/v2/project/{slug}/version"), StatusCode::OK, versions);
    }

    fn downloads(&self) -> Vec<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter()
            .filter(|request| request.url.path().starts_with("/data/"))
            .map(|request| request.url.path().to_string())
            .collect()
    }
}

#[derive(Clone)]
struct Server(Arc<Registry>);

impl Transport for Server {
    type Response = Body;

    fn send(&self, request: &Request) -> Result<Self::Response, TransportError> {
        self.0.sent.lock().unwrap().push(request.clone());
        let key = match request.query.first() {
            Some((_, value)) => format!("{}?{value}", request.url.path()),
            None => request.url.path().to_string(),
        };
        let mut routes = self.0.routes.lock().unwrap();
        let (status, body) = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None if key.starts_with("/v2/search") => (StatusCode::OK, br#"{"hits": []}"#.to_vec()),
            None => (StatusCode::NOT_FOUND, vec![]),
        };
        Ok(Body(Cursor::new(body), status))
    }
}

fn version(id: &str, loader: &str, game_version: &str, published: &str, file: &[u8]) -> String {
    format!(
        r#"{{
            "id": "{id}", "version_number": "{id}", "game_versions": ["{game_version}"],
            "loaders": ["{loader}"], "date_published": "{published}",
            "files": [{{
                "url": "https://cdn.modrinth.com/data/{id}/{id}.jar",
                "filename": "{id}.jar", "primary": true, "size": {size}
            }}]
        }}"#,
        size = file.len(),
    )
}

struct Harness {
    _dir: TempDir,
    registry: Arc<Registry>,
    repository: ModrinthRepository<Server>,
    fetcher: ArtifactFetcher<Server>,
    target: PlatformTarget,
}

impl Harness {
    fn run(&self, names: &[&str]) -> Report {
        let queries = names
            .iter()
            .map(|name| ModQuery::try_new(name.to_string()).unwrap());
        Orchestrator::new(&self.repository, &self.fetcher, &self.target).run(queries)
    }

    fn destination_listing(&self) -> Result<Vec<String>, EyreReport> {
        let mut names = std::fs::read_dir(self.fetcher.directory().path())?
            .map(|entry| -> Result<String, EyreReport> {
                Ok(entry?.file_name().to_string_lossy().into_owned())
            })
            .collect::<Result<Vec<_>, _>>()?;
        names.sort();
        Ok(names)
    }
}

#[fixture]
fn harness() -> Harness {
    (|| -> Result<Harness, EyreReport> {
        let dir = TempDir::new(TEMPDIR_PREFIX)?;
        let registry = Arc::new(Registry::default());
        let settings = Settings::default();
        let client = HttpClient::with_transport(Server(Arc::clone(&registry)), RetryPolicy::from(&settings))
            .with_sleeper(|_| {});
        let repository = ModrinthRepository::new(client.clone(), &settings);
        let fetcher = ArtifactFetcher::new(client, ModsDirectory::open(dir.path().join("mods"))?, &settings);
        let target = PlatformTarget::new(Loader::Fabric, GameVersion::try_new("1.21.11".to_string())?);

        let sodium = [
            version("sodium-new", "fabric", "1.21.11", "2025-12-09T00:00:00Z", SODIUM_JAR),
            version("sodium-neo", "neoforge", "1.21.11", "2025-12-10T00:00:00Z", SODIUM_JAR),
            version("sodium-old", "fabric", "1.21.11", "2025-11-01T00:00:00Z", SODIUM_JAR),
        ];
        registry.project("sodium", "Sodium", &format!("[{}]", sodium.join(",")));
        let lithium = version("lithium-new", "fabric", "1.21.11", "2025-12-01T00:00:00Z", LITHIUM_JAR);
        registry.project("lithium", "Lithium", &format!("[{lithium}]"));
        let create = version("create-new", "forge", "1.21.11", "2025-12-01T00:00:00Z", b"");
        registry.project("create", "Create", &format!("[{create}]"));

        registry.route("/data/sodium-new/sodium-new.jar", StatusCode::OK, SODIUM_JAR);
        registry.route("/data/lithium-new/lithium-new.jar", StatusCode::OK, LITHIUM_JAR);

        Ok(Harness {
            _dir: dir,
            registry,
            repository,
            fetcher,
            target,
        })
    })()
    .unwrap()
}

#[rstest]
fn fresh_mod_is_downloaded(harness: Harness) -> Result<(), EyreReport> {
    let report = harness.run(&["Sodium"]);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, Status::Downloaded);
    assert_eq!(outcome.file_name.as_deref(), Some("sodium-new.jar"));

    let path = harness.fetcher.directory().path().join("sodium-new.jar");
    assert_eq!(std::fs::read(path)?, SODIUM_JAR);
    assert_eq!(harness.destination_listing()?, ["sodium-new.jar"]);
    Ok(())
}

#[rstest]
fn existing_file_is_skipped_without_downloading(harness: Harness) -> Result<(), EyreReport> {
    let path = harness.fetcher.directory().path().join("sodium-new.jar");
    std::fs::write(&path, b"left over from last time")?;

    let report = harness.run(&["Sodium"]);
    assert_eq!(report.outcomes[0].status, Status::SkippedExisting);
    assert!(harness.registry.downloads().is_empty());
    assert_eq!(std::fs::read(path)?, b"left over from last time");
    Ok(())
}

#[rstest]
fn unknown_mod_is_not_found(harness: Harness) -> Result<(), EyreReport> {
    let report = harness.run(&["NoSuchMod"]);
    assert_eq!(report.outcomes[0].status, Status::NotFound);
    assert!(harness.registry.downloads().is_empty());
    assert!(harness.destination_listing()?.is_empty());
    Ok(())
}

#[rstest]
fn mod_for_another_loader_has_no_compatible_version(harness: Harness) -> Result<(), EyreReport> {
    let report = harness.run(&["Create"]);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, Status::NoCompatibleVersion);
    assert!(outcome.detail.as_deref().is_some_and(|detail| detail.contains("fabric 1.21.11")));
    assert!(harness.destination_listing()?.is_empty());
    Ok(())
}

#[rstest]
fn batch_reports_every_mod_in_order(harness: Harness) -> Result<(), EyreReport> {
    harness.registry.route("/v2/project/broken/version", StatusCode::BAD_REQUEST, "");
    harness.registry.route(
        "/v2/search?Broken",
        StatusCode::OK,
        r#"{"hits": [{"project_id": "id-broken", "slug": "broken", "title": "Broken"}]}"#,
    );

    let names = ["NoSuchMod", "Sodium", "Broken", "Create", "Lithium"];
    let report = harness.run(&names);

    let statuses = report.outcomes.iter().map(|o| o.status).collect::<Vec<_>>();
    assert_eq!(
        statuses,
        [
            Status::NotFound,
            Status::Downloaded,
            Status::Failed,
            Status::NoCompatibleVersion,
            Status::Downloaded,
        ]
    );
    let order = report.outcomes.iter().map(|o| o.query.to_string()).collect::<Vec<_>>();
    assert_eq!(order, names);
    assert_eq!(report.summary.failed, 3);
    assert_eq!(
        harness.destination_listing()?,
        ["lithium-new.jar", "sodium-new.jar"]
    );
    Ok(())
}

#[rstest]
fn second_run_downloads_nothing(harness: Harness) -> Result<(), EyreReport> {
    let first = harness.run(&["Sodium", "Lithium"]);
    assert!(first.outcomes.iter().all(|o| o.status == Status::Downloaded));
    let sodium_before = std::fs::read(harness.fetcher.directory().path().join("sodium-new.jar"))?;

    let second = harness.run(&["Sodium", "Lithium"]);
    assert!(second.outcomes.iter().all(|o| o.status == Status::SkippedExisting));
    assert_eq!(harness.registry.downloads().len(), 2);
    assert_eq!(
        std::fs::read(harness.fetcher.directory().path().join("sodium-new.jar"))?,
        sodium_before
    );
    Ok(())
}

#[rstest]
fn registry_outage_is_survived(harness: Harness) {
    let path = "/data/lithium-new/lithium-new.jar";
    harness.registry.routes.lock().unwrap().remove(path);
    harness.registry.route(path, StatusCode::SERVICE_UNAVAILABLE, "");
    harness.registry.route(path, StatusCode::OK, LITHIUM_JAR);

    let report = harness.run(&["Lithium"]);
    assert_eq!(report.outcomes[0].status, Status::Downloaded);
    assert_eq!(harness.registry.downloads().len(), 2);
}

