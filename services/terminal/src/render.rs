use classroom_core::notice::{Notice, SessionOutcome};
use classroom_core::persona::{CATALOG, CUSTOM_CHOICE};
use colored::Colorize;

/// Formats one notice the way the terminal shows it.
pub fn format_notice(notice: &Notice) -> String {
    match notice {
        Notice::System { text } => format!("[SYSTEM]: {}", text).cyan().to_string(),
        Notice::Student { text } => format!("[STUDENT]: {}", text).yellow().to_string(),
        Notice::RandomEvent { text } => format!("\n>>> RANDOM EVENT: {} <<<\n", text)
            .red()
            .bold()
            .to_string(),
        Notice::CurriculumFact { text } => format!("- {}", text),
        Notice::Question { text } => format!("\nQ: {}", text).white().to_string(),
        Notice::Grade { passed: true } => ">> CORRECT".green().to_string(),
        Notice::Grade { passed: false } => ">> INCORRECT".red().to_string(),
        Notice::AlienDeadline { turns } => {
            format!("ALIEN DEADLINE: {} TURNS", turns).red().to_string()
        }
        Notice::SessionOver { outcome } => outcome_banner(*outcome),
    }
}

fn outcome_banner(outcome: SessionOutcome) -> String {
    let text = match outcome {
        SessionOutcome::Passed => "CLASS DISMISSED. The student passed.",
        SessionOutcome::Exhausted => "GAME OVER. No attempts left.",
        SessionOutcome::EarthDestroyed => "GAME OVER. The aliens won.",
        SessionOutcome::Quit => "Class dismissed.",
    };
    if outcome.is_success() {
        text.green().bold().to_string()
    } else {
        text.magenta().bold().to_string()
    }
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        println!("{}", format_notice(notice));
    }
}

/// The numbered persona menu, custom option last.
pub fn persona_menu() -> String {
    let mut lines = vec!["\n--- SELECT YOUR STUDENT ---".magenta().to_string()];
    lines.extend(
        CATALOG
            .iter()
            .enumerate()
            .map(|(i, persona)| format!("{}. {}", i + 1, persona.prompt_text())),
    );
    lines.push(format!("{}. Custom", CUSTOM_CHOICE));
    lines.join("\n")
}
