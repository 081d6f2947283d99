//! Bundle construction.

use remote_exec_core::CodeBundle;
use thiserror::Error;

use crate::Definition;

/// Prefix of marker lines annotating a definition for dispatch.
const MARKER_PREFIX: char = '@';

/// Bundle build error.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Source unavailable for {name}: {reason}")]
    SourceUnavailable { name: String, reason: String },
}

/// Build a bundle: helpers in order, then the entry definition.
///
/// Each fragment has its leading marker lines stripped and is dedented so
/// it stands alone as top-level source.
///
/// # Errors
/// Returns `BundleError::SourceUnavailable` if any definition's source cannot
/// be read or is empty once markers are removed.
pub fn build_bundle(entry: &Definition, helpers: &[Definition]) -> Result<CodeBundle, BundleError> {
    let fragments = helpers
        .iter()
        .chain(std::iter::once(entry))
        .map(prepare_fragment)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        entry = entry.name(),
        helpers = helpers.len(),
        "Built code bundle"
    );
    Ok(CodeBundle::from_fragments(fragments))
}

fn prepare_fragment(definition: &Definition) -> Result<String, BundleError> {
    let raw = definition.load()?;
    let text = dedent(&strip_markers(&raw));
    let text = text.trim_end();

    if text.is_empty() {
        return Err(BundleError::SourceUnavailable {
            name: definition.name().to_string(),
            reason: "source is empty".to_string(),
        });
    }
    Ok(text.to_string())
}

/// Remove blank lines and marker lines (`@…`) preceding the definition.
///
/// Marker lines after the first line of code are left untouched.
#[must_use]
pub fn strip_markers(source: &str) -> String {
    source
        .lines()
        .skip_while(|line| {
            let trimmed = line.trim_start();
            trimmed.is_empty() || trimmed.starts_with(MARKER_PREFIX)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove the indentation shared by every non-blank line.
///
/// Blank lines are emptied. Only spaces and tabs count as indentation.
#[must_use]
pub fn dedent(source: &str) -> String {
    let margin = source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(indentation)
        .reduce(common_prefix)
        .unwrap_or("");

    source
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[margin.len()..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indentation(line: &str) -> &str {
    let rest = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - rest.len()]
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let shared = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..shared]
}
