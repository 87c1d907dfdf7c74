//! Handler for `resolver fetch`.

use std::path::Path;
use std::sync::Arc;

use miette::IntoDiagnostic;
use resolver_core::artifact_resolver::{ArtifactRequest, ArtifactResolver};
use resolver_core::sync_context::SyncContext;
use resolver_core::transform::GraphTransformer;
use resolver_core::{CollectRequest, Collector};
use resolver_descriptor::MavenDescriptorProvider;
use resolver_model::config::ResolverConfig;
use resolver_model::graph::DependencyGraph;
use resolver_model::session::Session;
use resolver_transport::{ChecksumPostProcessor, HttpTransport, LocalRepository};
use resolver_util::progress;

use crate::manifest::Manifest;

pub async fn exec(manifest_path: &Path, local_repository: &Path) -> miette::Result<()> {
    let manifest = Manifest::load(manifest_path).into_diagnostic()?;
    let config = ResolverConfig::load(&ResolverConfig::default_path()).into_diagnostic()?;
    let session = Session::new(config, local_repository.to_path_buf());

    let transport = Arc::new(HttpTransport::new().into_diagnostic()?);
    let provider = Arc::new(MavenDescriptorProvider::new(transport.clone()));
    let collector = Collector::from_session(provider, &session);

    let mut graph = collector
        .collect(CollectRequest {
            root_artifact: manifest.root_artifact(),
            direct_dependencies: manifest.direct_dependencies(),
            repositories: manifest.repositories(),
            managed_dependencies: manifest.managed_dependencies(),
        })
        .await
        .into_diagnostic()?;

    let transformer = GraphTransformer::from_session(&session);
    transformer.transform(&mut graph).into_diagnostic()?;

    let sync_context = SyncContext::from_session(&session);

    let resolver = ArtifactResolver::from_session(
        transport.clone(),
        LocalRepository::new(&session.local_repository_path),
        sync_context,
        vec![Arc::new(ChecksumPostProcessor::new(transport))],
        &session,
    );

    let repositories = manifest.repositories();
    let mut coordinates = Vec::new();
    let mut requests = Vec::new();

    for (id, depth) in graph.walk(graph.root()) {
        if depth == 0 {
            continue;
        }
        let Some(dep) = graph.node(id).dependency.clone() else {
            continue;
        };

        let resolved_remote_version = dep.artifact.version.clone();
        coordinates.push(dep.artifact.coordinate());
        requests.push(ArtifactRequest {
            artifact: dep.artifact,
            repositories: repositories.clone(),
            resolved_remote_version,
        });
    }

    let mut fetched = 0usize;
    let mut failed = 0usize;

    for (coordinate, outcome) in coordinates.into_iter().zip(resolver.resolve(requests).await.into_diagnostic()?) {
        match outcome {
            Ok(result) => {
                fetched += 1;
                let label = if result.from_cache { "Cached" } else { "Fetched" };
                progress::status(label, &format!("{coordinate} -> {}", result.file.display()));
            }
            Err(err) => {
                failed += 1;
                progress::status_warn("Failed", &format!("{coordinate}: {err}"));
            }
        }
    }

    progress::status_info("Finished", &format!("{fetched} resolved, {failed} failed, into {}", local_repository.display()));

    if failed > 0 {
        return Err(miette::miette!("{failed} artifact(s) could not be resolved"));
    }

    Ok(())
}
