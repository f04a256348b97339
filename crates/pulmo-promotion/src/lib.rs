//! Promotion policy: should a freshly evaluated model go to serving, or be
//! recorded as an experiment only?
//!
//! The decision itself is a pure function of (mode, accuracy, answer). The
//! interactive channel is injected behind [`PromotionPrompt`] so the
//! automated and manual paths share one code path and are independently
//! testable; nothing in this crate touches the network or blocks unless the
//! caller wires in the console prompt.

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The only token accepted as an affirmative interactive answer
/// (compared case-insensitively after trimming).
const AFFIRMATIVE: &str = "yes";

/// Outcome of a promotion decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoteDecision {
    /// Transition the newly registered version to the current-serving stage.
    PromoteToServing,
    /// Record the run; leave serving untouched.
    ExperimentOnly,
}

/// Policy knobs. `min_accuracy` is a deliberate, visible constant of the
/// system (default 0.5) rather than a buried literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PromotionPolicy {
    /// true: threshold decides. false: defer to the interactive answer.
    pub auto: bool,
    /// Accuracy at or above this value promotes (boundary inclusive).
    pub min_accuracy: f64,
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self {
            auto: true,
            min_accuracy: 0.5,
        }
    }
}

/// Pure decision function.
///
/// Auto mode: promote iff `accuracy >= min_accuracy`. Interactive mode: the
/// answer must equal `"yes"` case-insensitively; anything else — empty,
/// `"y"`, `"NO"`, or no answer at all — stays experiment-only.
pub fn decide(policy: &PromotionPolicy, accuracy: f64, answer: Option<&str>) -> PromoteDecision {
    if policy.auto {
        if accuracy < policy.min_accuracy {
            warn!(
                accuracy,
                min_accuracy = policy.min_accuracy,
                "accuracy below threshold, registering as experiment only"
            );
            return PromoteDecision::ExperimentOnly;
        }
        return PromoteDecision::PromoteToServing;
    }
    let affirmative = answer
        .map(|a| a.trim().eq_ignore_ascii_case(AFFIRMATIVE))
        .unwrap_or(false);
    info!(affirmative, "interactive promotion answer evaluated");
    if affirmative {
        PromoteDecision::PromoteToServing
    } else {
        PromoteDecision::ExperimentOnly
    }
}

/// Source of the interactive answer. Only consulted when the policy is not
/// in auto mode.
pub trait PromotionPrompt {
    /// Ask the operator. `None` means no answer was obtainable.
    fn ask(&self) -> Option<String>;
}

/// Run the policy, consulting `prompt` only on the interactive path.
pub fn decide_with(
    policy: &PromotionPolicy,
    accuracy: f64,
    prompt: &dyn PromotionPrompt,
) -> PromoteDecision {
    if policy.auto {
        decide(policy, accuracy, None)
    } else {
        let answer = prompt.ask();
        decide(policy, accuracy, answer.as_deref())
    }
}

/// Interactive prompt reading one line from stdin.
///
/// This blocks the calling thread; pipelines that must not suspend use auto
/// mode or a scripted prompt instead.
pub struct ConsolePrompt;

impl PromotionPrompt for ConsolePrompt {
    fn ask(&self) -> Option<String> {
        print!("Promote to serving? (Yes/No): ");
        io::stdout().flush().ok()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        Some(line)
    }
}

/// Fixed-answer prompt for tests and non-interactive automation.
pub struct ScriptedPrompt(pub Option<String>);

impl PromotionPrompt for ScriptedPrompt {
    fn ask(&self) -> Option<String> {
        self.0.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
