//! Handler for `resolver tree`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::IntoDiagnostic;
use resolver_core::transform::GraphTransformer;
use resolver_core::{CollectRequest, Collector};
use resolver_descriptor::MavenDescriptorProvider;
use resolver_model::config::ResolverConfig;
use resolver_model::graph::{DependencyGraph, NodeId};
use resolver_model::session::Session;
use resolver_transport::HttpTransport;

use crate::manifest::Manifest;

pub async fn exec(manifest_path: &Path, show_conflicts: bool) -> miette::Result<()> {
    let manifest = Manifest::load(manifest_path).into_diagnostic()?;
    // `tree` never fetches, so the local repository path is only here to
    // satisfy `Session`'s shape; nothing reads it on this path.
    let session = Session::new(
        ResolverConfig::load(&ResolverConfig::default_path()).into_diagnostic()?,
        PathBuf::from(".resolver/repository"),
    );

    let transport = Arc::new(HttpTransport::new().into_diagnostic()?);
    let provider = Arc::new(MavenDescriptorProvider::new(transport));
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
    let report = transformer.transform(&mut graph).into_diagnostic()?;

    print_tree(&graph, graph.root());

    if show_conflicts && !report.is_empty() {
        println!();
        println!("{report}");
    }

    Ok(())
}

fn print_tree(graph: &DependencyGraph, root: NodeId) {
    for (id, depth) in graph.walk(root) {
        if id == root {
            continue;
        }
        let Some(dep) = graph.node(id).dependency.as_ref() else {
            continue;
        };
        let indent = "  ".repeat(depth - 1);
        println!("{indent}{} ({})", dep.artifact.coordinate(), dep.scope);
    }
}
