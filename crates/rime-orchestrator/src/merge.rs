//! Merge steps applied to provider proposals.
//!
//! All steps are deterministic: dedup keeps the first occurrence, the sort is
//! stable, and dependency annotation is a single left-to-right pass.

use std::cmp::Ordering;
use std::collections::HashSet;

use rime_core::{Action, ActionStatus, ActionType};

/// Drop actions whose `(type, title)` was already seen. First occurrence wins.
///
/// Surviving actions are reset to `pending` with no dependencies, since
/// dependency edges are only assigned by [`annotate_dependencies`].
pub fn dedup(actions: impl IntoIterator<Item = Action>) -> Vec<Action> {
    let mut seen: HashSet<(ActionType, String)> = HashSet::new();
    let mut merged = Vec::new();

    for mut action in actions {
        let (action_type, title) = action.signature();
        if !seen.insert((action_type, title.to_string())) {
            continue;
        }
        action.status = ActionStatus::Pending;
        action.dependencies.clear();
        merged.push(action);
    }

    merged
}

/// Tie-break rank among equally confident actions. Lower sorts first.
fn rank(action_type: ActionType, has_code_errors: bool) -> u8 {
    match (action_type, has_code_errors) {
        (ActionType::CodeFix, true) => 0,
        (ActionType::Explain, true) => 1,
        (_, true) => 2,
        (ActionType::Explain, false) => 0,
        (_, false) => 1,
    }
}

/// Stable sort: confidence descending, then code fixes first when the context
/// shows errors, then explanations.
pub fn prioritize(actions: &mut [Action], has_code_errors: bool) {
    actions.sort_by(|a, b| {
        b.confidence.total_cmp(&a.confidence).then_with(|| {
            rank(a.action_type, has_code_errors).cmp(&rank(b.action_type, has_code_errors))
        })
    });
}

fn depends_on_previous(previous: ActionType, current: ActionType) -> bool {
    matches!(
        (previous, current),
        (ActionType::WebSearch, ActionType::CodeFix)
            | (ActionType::CodeFix, ActionType::DraftMessage)
            | (ActionType::Explain, ActionType::DraftMessage)
    )
}

/// Point an action at its immediate predecessor when research should precede
/// a fix, or analysis should precede a message.
pub fn annotate_dependencies(actions: &mut [Action]) {
    for i in 1..actions.len() {
        let (previous_type, previous_id) = (actions[i - 1].action_type, actions[i - 1].id);
        if depends_on_previous(previous_type, actions[i].action_type) {
            actions[i].dependencies = vec![previous_id];
        }
    }
}

/// Order confidences descending; NaN sorts last.
pub(crate) fn by_confidence_desc(a: f32, b: f32) -> Ordering {
    b.total_cmp(&a)
}
