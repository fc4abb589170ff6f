//! Human-readable rendering of routine runs.

use colored::{ColoredString, Colorize};
use matchbot_runtime::{CorrectionOutcome, RunReport, StepOutcome, StepRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Warn,
    Bad,
}

/// Short text for a step outcome and how alarming it is.
pub fn describe(outcome: &StepOutcome) -> (String, Tone) {
    match outcome {
        StepOutcome::Done => ("ok".to_string(), Tone::Good),
        StepOutcome::Faulted { details } => (format!("skipped: {details}"), Tone::Bad),
        StepOutcome::Correction { result } => match result {
            CorrectionOutcome::Reached => ("reached standoff".to_string(), Tone::Good),
            CorrectionOutcome::TimedOut => ("timed out".to_string(), Tone::Warn),
            CorrectionOutcome::SensorFault => ("sensor fault".to_string(), Tone::Warn),
        },
        StepOutcome::Unstuck { cycles } => (format!("{cycles} cycle(s)"), Tone::Good),
        StepOutcome::Measured { reading_mm: Some(mm) } => (format!("{mm} mm"), Tone::Good),
        StepOutcome::Measured { reading_mm: None } => ("no valid reading".to_string(), Tone::Warn),
        StepOutcome::RangedDrive { inches: Some(inches) } => {
            (format!("{inches:.2} in"), Tone::Good)
        }
        StepOutcome::RangedDrive { inches: None } => {
            ("skipped: no measurement".to_string(), Tone::Warn)
        }
        StepOutcome::Mechanism { state } => {
            let active: Vec<String> = state.active().iter().map(|m| m.to_string()).collect();
            if active.is_empty() {
                ("all off".to_string(), Tone::Good)
            } else {
                (active.join(", "), Tone::Good)
            }
        }
    }
}

fn paint(text: String, tone: Tone) -> ColoredString {
    match tone {
        Tone::Good => text.green(),
        Tone::Warn => text.yellow(),
        Tone::Bad => text.red(),
    }
}

pub fn print_step(record: &StepRecord) {
    let (text, tone) = describe(&record.outcome);
    println!(
        "  {:>3}  {:>6} ms  {:<14} {}",
        record.index,
        record.started_ms,
        record.kind.bold(),
        paint(text, tone)
    );
}

pub fn print_report(report: &RunReport) {
    for record in &report.steps {
        print_step(record);
    }
    let corrections = report.corrections();
    let reached = corrections
        .iter()
        .filter(|c| **c == CorrectionOutcome::Reached)
        .count();
    println!();
    println!(
        "  {} {} steps in {} ms, {}/{} corrections reached, {} skipped",
        "✓".green().bold(),
        report.steps.len(),
        report.elapsed_ms,
        reached,
        corrections.len(),
        report.faults()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbot_kernel::MechanismState;

    #[test]
    fn correction_tones() {
        let tone = |result| describe(&StepOutcome::Correction { result }).1;
        assert_eq!(tone(CorrectionOutcome::Reached), Tone::Good);
        assert_eq!(tone(CorrectionOutcome::TimedOut), Tone::Warn);
        assert_eq!(tone(CorrectionOutcome::SensorFault), Tone::Warn);
    }

    #[test]
    fn mechanism_state_lists_active_flags() {
        let state = MechanismState {
            aligner: true,
            bottom_intake: true,
            ..Default::default()
        };
        let (text, _) = describe(&StepOutcome::Mechanism { state });
        assert_eq!(text, "bottom_intake, aligner");
        let (text, _) = describe(&StepOutcome::Mechanism {
            state: MechanismState::default(),
        });
        assert_eq!(text, "all off");
    }

    #[test]
    fn faults_are_bad() {
        let (text, tone) = describe(&StepOutcome::Faulted {
            details: "Device not registered: intake".to_string(),
        });
        assert!(text.starts_with("skipped"));
        assert_eq!(tone, Tone::Bad);
    }

    #[test]
    fn ranged_drive_rounds_inches() {
        let (text, _) = describe(&StepOutcome::RangedDrive {
            inches: Some(-20.622),
        });
        assert_eq!(text, "-20.62 in");
    }
}
