//! Command execution.

use crate::cli::{ChangedArgs, Commands, ExamineArgs, RevisionArgs};
use crate::plan::PlanDocument;
use c3i_conda::{MetaYamlRenderer, RepodataResolver};
use c3i_core::{
    Error, Platform, RecipeRenderer, Result, VariantMatrix, load_platforms, load_variant_matrix,
};
use c3i_engine::{ExpandOptions, PlanRequest, Planner};
use c3i_vcs::{ChangeDetector, GitCli};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const PLATFORMS_DIR: &str = "build_platforms.d";
const VARIANTS_FILE: &str = "versions.yml";

pub fn execute(command: Commands) -> miette::Result<()> {
    match command {
        Commands::Examine(args) => {
            let document = examine(&args)?;
            let yaml = document.to_yaml()?;
            write_output(args.output.as_deref(), &yaml)
        }
        Commands::Changed(args) => {
            let recipes = changed(&args)?;
            let mut listing = String::new();
            for name in recipes {
                listing.push_str(&name);
                listing.push('\n');
            }
            write_output(None, &listing)
        }
    }
}

/// Compute the plan document for `args`.
#[instrument(skip_all, fields(path = %args.path.display()))]
pub fn examine(args: &ExamineArgs) -> Result<PlanDocument> {
    let renderer = MetaYamlRenderer::new()?;
    let matrix_dir = args.matrix_base_dir.as_deref().unwrap_or(&args.path);
    let mut platforms =
        load_platforms(&matrix_dir.join(PLATFORMS_DIR), &args.platform_filters)?;
    if platforms.is_empty() {
        return Err(Error::config(format!(
            "no build platforms in '{}' match {:?}",
            matrix_dir.join(PLATFORMS_DIR).display(),
            args.platform_filters
        )));
    }
    let pins = variant_pins(&args.variant_pins);
    let matrix = variant_matrix(&args.variants_files, matrix_dir)?.with_overrides(&pins);
    pin_platforms(&mut platforms, &pins);

    let seeds: Vec<PathBuf> = if args.folders.is_empty() {
        changed_recipes(&args.path, &args.revisions, &renderer)?
            .into_iter()
            .map(PathBuf::from)
            .collect()
    } else {
        args.folders.clone()
    };
    info!(
        seeds = seeds.len(),
        platforms = platforms.len(),
        "Planning builds"
    );

    let resolver = RepodataResolver::new(&args.channels);
    let graph = Planner::new(&renderer, &resolver, matrix).plan(&PlanRequest {
        recipes_root: Some(args.path.clone()),
        seeds,
        platforms,
        expand: ExpandOptions {
            steps: args.steps,
            max_downstream: args.max_downstream,
        },
        noarch_build_subdir: args.noarch_build_subdir.clone(),
    })?;

    if graph.is_empty() {
        return Err(Error::EmptyGraph);
    }
    PlanDocument::from_graph(&graph)
}

/// Recipe directory names changed in the revision range.
pub fn changed(args: &ChangedArgs) -> Result<BTreeSet<String>> {
    let renderer = MetaYamlRenderer::new()?;
    changed_recipes(&args.path, &args.revisions, &renderer)
}

fn changed_recipes<R: RecipeRenderer>(
    root: &Path,
    revisions: &RevisionArgs,
    renderer: &R,
) -> Result<BTreeSet<String>> {
    ChangeDetector::new(GitCli::new()).changed_recipes(
        root,
        &revisions.git_rev,
        revisions.stop_rev.as_deref(),
        renderer,
    )
}

/// `<matrix_dir>/versions.yml` when present, then each explicit file in
/// order. Explicit files must exist; a later file replaces earlier keys.
fn variant_matrix(files: &[PathBuf], matrix_dir: &Path) -> Result<VariantMatrix> {
    let default = matrix_dir.join(VARIANTS_FILE);
    let mut matrix = if default.is_file() {
        load_variant_matrix(&default)?
    } else {
        VariantMatrix::new()
    };
    for file in files {
        for (key, values) in load_variant_matrix(file)?.iter() {
            matrix.insert(key, values.to_vec());
        }
    }
    Ok(matrix)
}

/// Group `KEY=VALUE` pins by key, keeping first-seen key order.
fn variant_pins(pairs: &[(String, String)]) -> IndexMap<String, Vec<String>> {
    let mut pins: IndexMap<String, Vec<String>> = IndexMap::new();
    for (key, value) in pairs {
        pins.entry(key.clone()).or_default().push(value.clone());
    }
    if !pins.is_empty() {
        debug!(?pins, "Pinned variant keys");
    }
    pins
}

/// Command-line pins replace the same keys in platform files.
fn pin_platforms(platforms: &mut [Platform], pins: &IndexMap<String, Vec<String>>) {
    for platform in platforms {
        for (key, values) in pins {
            if let Some(slot) = platform.variants.get_mut(key) {
                slot.clone_from(values);
            }
        }
    }
}

fn write_output(path: Option<&Path>, contents: &str) -> miette::Result<()> {
    match path {
        Some(path) => std::fs::write(path, contents)
            .map_err(|e| Error::io(e, path, "write plan"))?,
        None => std::io::stdout()
            .lock()
            .write_all(contents.as_bytes())
            .map_err(|e| miette::miette!("Failed to write to stdout: {e}"))?,
    }
    Ok(())
}
