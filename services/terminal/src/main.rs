//! Terminal front end for the classroom.
//!
//! Reads teacher lines from stdin and prints the classroom's notices until the
//! session ends or stdin closes. Logs go to stderr so they never interleave
//! with play.

mod render;

use anyhow::{Context, Result};
use clap::Parser;
use classroom_core::{
    Classroom,
    config::{OracleConfig, build_oracle},
    curriculum::{CurriculumService, LLMCurriculumService, MockCurriculumService},
    persona::{CUSTOM_CHOICE, resolve_persona},
};
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;

type InputLines = Lines<BufReader<Stdin>>;

/// Teach a simulated student, then make them pass the exam.
#[derive(Parser, Debug)]
#[command(name = "classroom", version, about)]
struct Cli {
    /// Topic to teach; asked interactively when omitted.
    #[arg(long)]
    topic: Option<String>,
    /// Catalog number, archetype name, or a free-text student description.
    #[arg(long)]
    persona: Option<String>,
    /// Seed for random events and quiz sampling.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides CHAT_MODEL.
    #[arg(long)]
    model: Option<String>,
    /// Play without any language model.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut config = if cli.offline {
        OracleConfig::offline()
    } else {
        OracleConfig::from_env().context("Failed to load configuration")?
    };
    if let Some(model) = cli.model {
        config.chat_model = model;
    }
    let prompts = Arc::new(config.load_prompts()?);
    let oracle = build_oracle(&config).context("Failed to build oracle")?;
    let curriculum_service: Box<dyn CurriculumService> = if cli.offline {
        Box::new(MockCurriculumService)
    } else {
        Box::new(LLMCurriculumService::new(oracle.clone(), prompts.clone()))
    };

    println!("{}", "Welcome to CHAOS CLASSROOM".magenta());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let persona = match cli.persona {
        Some(choice) => resolve_persona(&choice),
        None => {
            let Some(persona) = choose_persona(&mut lines).await? else {
                return Ok(());
            };
            persona
        }
    };
    let topic = match cli.topic {
        Some(topic) => topic,
        None => {
            let Some(topic) = ask_topic(&mut lines).await? else {
                return Ok(());
            };
            topic
        }
    };

    println!("{}", "[SYSTEM]: Generating Curriculum...".cyan());
    let (classroom, notices) = Classroom::setup(
        oracle,
        prompts,
        curriculum_service.as_ref(),
        persona,
        topic,
    )
    .await;
    let mut classroom = match cli.seed {
        Some(seed) => classroom.with_rng(StdRng::seed_from_u64(seed)),
        None => classroom,
    };
    println!("\n{}", "--- CURRICULUM GENERATED ---".magenta());
    render::print_notices(&notices);

    while !classroom.is_finished() {
        let Some(line) = prompt(&mut lines, &format!("\n{}", "You: ".green())).await? else {
            info!("Stdin closed. Leaving the classroom.");
            break;
        };
        let notices = classroom.submit_teacher_line(&line).await;
        render::print_notices(&notices);
    }

    Ok(())
}

/// Prints `label` and reads one line. `None` on end of input.
async fn prompt(lines: &mut InputLines, label: &str) -> Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

async fn choose_persona(lines: &mut InputLines) -> Result<Option<String>> {
    println!("{}", render::persona_menu());
    let Some(choice) = prompt(lines, "Select (1-6): ").await? else {
        return Ok(None);
    };
    if choice.trim() == CUSTOM_CHOICE {
        return prompt(lines, "Describe the student: ").await;
    }
    Ok(Some(resolve_persona(&choice)))
}

async fn ask_topic(lines: &mut InputLines) -> Result<Option<String>> {
    loop {
        let Some(topic) = prompt(lines, "Enter the topic you want to teach: ").await? else {
            return Ok(None);
        };
        if !topic.trim().is_empty() {
            return Ok(Some(topic.trim().to_string()));
        }
    }
}
