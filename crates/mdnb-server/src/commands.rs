//! Command implementations behind the `mdnb` binary
//!
//! Each command takes its input as bytes and returns its output, so the
//! binary only handles files and streams.

use anyhow::{bail, Context, Result};
use mdnb_annotations::schema::NAME;
use mdnb_annotations::{summarize, CellAnnotations, CellSummary, ValidationError};
use mdnb_document::Document;
use mdnb_sequencer::{EnvStore, ExecutionPlan, Platform};
use mdnb_serializer::{SerializationLayer, WireNotebook};

/// Markdown to notebook JSON
///
/// # Errors
/// Fails if the markdown does not parse.
pub fn deserialize(layer: &SerializationLayer, source: &[u8]) -> Result<String> {
    let document = layer.parse_document(source)?;
    let notebook = WireNotebook::from(&document);
    serde_json::to_string_pretty(&notebook).context("failed to encode notebook")
}

/// Notebook JSON to markdown
///
/// # Errors
/// Fails if the input is not a notebook or cannot be written.
pub fn serialize(layer: &SerializationLayer, json: &[u8]) -> Result<Vec<u8>> {
    let notebook: WireNotebook =
        serde_json::from_slice(json).context("input is not a notebook")?;
    Ok(layer.render_document(&Document::from(notebook))?)
}

/// Canonical formatting: parse then write
///
/// # Errors
/// Fails if the markdown does not parse.
pub fn format(layer: &SerializationLayer, source: &[u8]) -> Result<Vec<u8>> {
    let document = layer.parse_document(source)?;
    Ok(layer.render_document(&document)?)
}

/// Cell listing, as a table or JSON
///
/// # Errors
/// Fails if the markdown does not parse.
pub fn list(layer: &SerializationLayer, source: &[u8], json: bool) -> Result<String> {
    let document = layer.parse_document(source)?;
    let summaries = summarize(&document);

    if json {
        return serde_json::to_string_pretty(&summaries).context("failed to encode listing");
    }

    let mut out = format!(
        "{:<24} {:<10} {:<11} {}\n",
        "NAME", "LANGUAGE", "BACKGROUND", "FIRST LINE"
    );
    for summary in &summaries {
        out.push_str(&format!(
            "{:<24} {:<10} {:<11} {}\n",
            summary.name, summary.language_id, summary.background, summary.first_line
        ));
    }
    Ok(out)
}

/// Outcome of planning one cell
type Planned = (String, Result<ExecutionPlan, ValidationError>);

/// Plan the selected cells, keeping per-cell validation failures
///
/// Unnamed cells run under the name the listing shows for them.
fn plan_cells(
    layer: &SerializationLayer,
    source: &[u8],
    names: &[String],
    env: &EnvStore,
    platform: Platform,
) -> Result<Vec<Planned>> {
    let document = layer.parse_document(source)?;
    let summaries = summarize(&document);

    let selected: Vec<&CellSummary> = if names.is_empty() {
        summaries.iter().collect()
    } else {
        names
            .iter()
            .map(|name| {
                summaries
                    .iter()
                    .find(|s| &s.name == name)
                    .with_context(|| format!("no cell named '{name}'"))
            })
            .collect::<Result<_>>()?
    };

    selected
        .into_iter()
        .map(|summary| {
            let Some(code) = document.cells[summary.index].as_code() else {
                bail!("cell {} is not a code cell", summary.index);
            };
            let mut cell = code.clone();
            if cell.annotations().name.is_empty() {
                cell.metadata.insert(NAME.to_string(), summary.name.clone());
            }
            let plan = ExecutionPlan::prepare_in(&cell, &document.frontmatter, env, platform);
            Ok((summary.name.clone(), plan))
        })
        .collect()
}

/// Execution plans for named cells, or for every code cell
///
/// When no names are given, cells with invalid annotations are skipped
/// with a warning. A named cell with invalid annotations is an error.
///
/// # Errors
/// Fails if the markdown does not parse, a requested cell does not exist,
/// or a requested cell's annotations fail strict validation.
pub fn plans(
    layer: &SerializationLayer,
    source: &[u8],
    names: &[String],
    env: &EnvStore,
    platform: Platform,
) -> Result<Vec<ExecutionPlan>> {
    let mut plans = Vec::new();
    for (name, planned) in plan_cells(layer, source, names, env, platform)? {
        match planned {
            Ok(plan) => plans.push(plan),
            Err(err) if names.is_empty() => tracing::warn!("skipping cell '{name}': {err}"),
            Err(err) => return Err(err).with_context(|| format!("cell '{name}' cannot run")),
        }
    }
    Ok(plans)
}

/// Shell invocations of the selected cells, one per line
///
/// Cells that fail validation are reported in place and do not stop the
/// remaining cells.
///
/// # Errors
/// Fails if the markdown does not parse or a requested cell does not exist.
pub fn sequence(
    layer: &SerializationLayer,
    source: &[u8],
    names: &[String],
    env: &EnvStore,
    platform: Platform,
) -> Result<String> {
    let mut out = String::new();
    for (name, planned) in plan_cells(layer, source, names, env, platform)? {
        match planned {
            Ok(ExecutionPlan {
                invocation: Some(invocation),
                ..
            }) => out.push_str(&format!("# {name}\n{invocation}\n")),
            Ok(plan) => out.push_str(&format!("# {name} ({}: nothing to run)\n", plan.key)),
            Err(err) => {
                tracing::warn!("skipping cell '{name}': {err}");
                out.push_str(&format!("# {name} (skipped: {err})\n"));
            }
        }
    }
    Ok(out)
}
