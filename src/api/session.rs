//! Viewer session driven by explicit actions
//!
//! All state lives in [`ViewerState`]; [`handle`] is the only place that
//! changes it.

use tracing::{info, warn};

use crate::algorithms::LocalizationEstimator;
use crate::api::types::{Action, Outcome, ViewerState};
use crate::processing::DatasetLoader;
use crate::render::build_map_for_root;
use crate::utils::config::ViewerConfig;
use crate::validation::{Result, ViewerError};

/// Apply one action to the session.
///
/// A failed action leaves the state as it was, except that a failed
/// `Generate` for a case without its object record drops the stored map.
pub fn handle(
    state: &mut ViewerState,
    action: Action,
    config: &ViewerConfig,
    estimator: &dyn LocalizationEstimator,
) -> Result<Outcome> {
    match action {
        Action::SetRoot(root) => {
            let cases = DatasetLoader::new(&root, config).list_cases()?;
            let selected = cases.first().cloned();
            info!(root = %root.display(), cases = cases.len(), "dataset root set");
            state.root = Some(root);
            state.cases = cases.clone();
            state.selected_case = selected.clone();
            Ok(Outcome::RootSet { cases, selected })
        }

        Action::SelectCase(case) => {
            if !state.cases.iter().any(|c| c == &case) {
                return Err(ViewerError::UnknownCase { case });
            }
            state.selected_case = Some(case.clone());
            Ok(Outcome::CaseSelected(case))
        }

        Action::Generate => generate(state, config, estimator),

        Action::Clear => {
            let had_map = state.map.take().is_some();
            Ok(Outcome::Cleared { had_map })
        }

        Action::Quit => {
            state.quit_requested = true;
            Ok(Outcome::Quit)
        }
    }
}

fn generate(
    state: &mut ViewerState,
    config: &ViewerConfig,
    estimator: &dyn LocalizationEstimator,
) -> Result<Outcome> {
    let (root, case) = match (&state.root, &state.selected_case) {
        (Some(root), Some(case)) => (root.clone(), case.clone()),
        _ => return Err(ViewerError::NoCaseSelected),
    };

    // Object record is checked before any rendering starts
    let loader = DatasetLoader::new(&root, config);
    if let Err(e) = loader.object_record_path(&case) {
        if matches!(e, ViewerError::MissingRequiredFile { .. }) {
            warn!(case = %case, error = %e, "cannot render case");
            state.map = None;
        }
        return Err(e);
    }

    let rendered = build_map_for_root(&root, std::slice::from_ref(&case), config, estimator)?;
    let outcome = Outcome::Generated {
        case: case.clone(),
        markers: rendered.document.markers.len(),
        metrics: rendered.metrics.clone(),
    };
    info!(case = %case, markers = rendered.document.markers.len(), "map ready");
    state.map = Some(rendered);
    Ok(outcome)
}
