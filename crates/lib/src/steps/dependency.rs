//! Executables resolved from release metadata.

use tracing::debug;

use super::{EntryOutcome, StepContext, StepError, StepKind, place_executable};
use crate::fetch::{FetchFile, FetchText, scratch_file_name};
use crate::host::Host;
use crate::manifest::{DependencySpec, Entry};
use crate::release::resolve_asset_url;

/// Resolve, download and install each dependency.
///
/// Resolution failures (unreachable metadata, malformed release, missing
/// asset) fail only their own entry.
pub async fn apply<F, H>(ctx: &StepContext<'_, F, H>, specs: &[Entry<DependencySpec>]) -> Vec<EntryOutcome>
where
  F: FetchFile + FetchText,
  H: Host,
{
  let mut outcomes = Vec::with_capacity(specs.len());

  for entry in specs {
    let outcome = match entry {
      Entry::Valid(spec) => EntryOutcome::record(StepKind::Dependencies, &spec.name, apply_one(ctx, spec).await),
      Entry::Invalid(invalid) => EntryOutcome::record(StepKind::Dependencies, &invalid.label, Err(invalid.into())),
    };
    outcomes.push(outcome);
  }

  outcomes
}

async fn apply_one<F, H>(ctx: &StepContext<'_, F, H>, spec: &DependencySpec) -> Result<(), StepError>
where
  F: FetchFile + FetchText,
  H: Host,
{
  let url = resolve_asset_url(ctx.fetcher, &spec.source, &spec.binary).await?;
  let staged = ctx.scratch_dir.join(scratch_file_name(&spec.binary));

  debug!(url = %url, staged = ?staged, "downloading release asset");
  ctx.fetcher.fetch_file(&url, &staged).await?;

  place_executable(ctx.host, &staged, &spec.location, spec.binlink()).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::host::HostOp;
  use crate::steps::FailureKind;
  use crate::util::testutil::{FakeHost, StubFetcher};
  use std::path::PathBuf;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  const META: &str = "http://x/releases/latest";
  const RELEASE: &str = r#"{"assets":[{"name":"foo-linux","browser_download_url":"http://x/foo"}]}"#;

  fn dependency(name: &str, binary: &str, location: &str) -> Entry<DependencySpec> {
    Entry::Valid(DependencySpec {
      name: name.to_string(),
      source: META.to_string(),
      binary: binary.to_string(),
      location: location.to_string(),
      binlink: None,
    })
  }

  #[tokio::test]
  #[traced_test]
  async fn missing_asset_fails_only_its_entry() {
    let scratch = TempDir::new().unwrap();
    let host = FakeHost::new();
    let fetcher = StubFetcher::new()
      .with_text(META, RELEASE)
      .with_file("http://x/foo", "foo binary");
    let ctx = StepContext {
      fetcher: &fetcher,
      host: &host,
      scratch_dir: scratch.path(),
      operator: None,
    };
    let specs = [
      dependency("foo-mac", "foo-mac", "/opt/foo-mac"),
      dependency("foo", "foo-linux", "/opt/foo"),
    ];

    let outcomes = apply(&ctx, &specs).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::AssetNotFound));
    assert!(outcomes[1].is_success());
    assert!(fetcher.requests().contains(&"http://x/foo".to_string()));
    assert_eq!(
      std::fs::read_to_string(scratch.path().join("foo-linux")).unwrap(),
      "foo binary"
    );
    assert!(host.ops().contains(&HostOp::MakeExecutable {
      path: PathBuf::from("/opt/foo")
    }));
    assert!(logs_contain("entry failed"));
    assert!(logs_contain("foo-mac"));
  }

  #[tokio::test]
  async fn unreachable_metadata_is_fetch_failure() {
    let scratch = TempDir::new().unwrap();
    let host = FakeHost::new();
    let fetcher = StubFetcher::new();
    let ctx = StepContext {
      fetcher: &fetcher,
      host: &host,
      scratch_dir: scratch.path(),
      operator: None,
    };

    let outcomes = apply(&ctx, &[dependency("foo", "foo-linux", "/opt/foo")]).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::Fetch));
    assert!(host.ops().is_empty());
  }

  #[tokio::test]
  async fn malformed_release_is_parse_failure() {
    let scratch = TempDir::new().unwrap();
    let host = FakeHost::new();
    let fetcher = StubFetcher::new().with_text(META, "{\"tag_name\": \"v1\"}");
    let ctx = StepContext {
      fetcher: &fetcher,
      host: &host,
      scratch_dir: scratch.path(),
      operator: None,
    };

    let outcomes = apply(&ctx, &[dependency("foo", "foo-linux", "/opt/foo")]).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::Parse));
  }

  #[tokio::test]
  async fn asset_download_failure_is_fetch_failure() {
    let scratch = TempDir::new().unwrap();
    let host = FakeHost::new();
    let fetcher = StubFetcher::new().with_text(META, RELEASE);
    let ctx = StepContext {
      fetcher: &fetcher,
      host: &host,
      scratch_dir: scratch.path(),
      operator: None,
    };

    let outcomes = apply(&ctx, &[dependency("foo", "foo-linux", "/opt/foo")]).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::Fetch));
    assert!(host.ops().is_empty());
  }
}
