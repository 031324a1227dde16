use std::io::Write as _;

use anyhow::Context;
use dr_client::ResearchClient;
use dr_config::ResearchConfig;
use dr_core::enums::SessionStatus;
use dr_session::{Action, SessionController, Transport, Update};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RunArgs;
use crate::output::{output_snapshot, render_plan_text};
use crate::progress::Progress;

/// What the user answered at a plan review.
#[derive(Debug, PartialEq, Eq)]
enum ReviewDecision {
    Approve,
    Revise(String),
}

impl ReviewDecision {
    /// Empty input, `y`, `yes` or `approve` approve; anything else is feedback.
    fn parse(line: &str) -> Self {
        let answer = line.trim();
        if answer.is_empty()
            || ["y", "yes", "approve"]
                .iter()
                .any(|word| answer.eq_ignore_ascii_case(word))
        {
            Self::Approve
        } else {
            Self::Revise(answer.to_string())
        }
    }
}

enum Step {
    Settled(SessionStatus),
    Interrupted,
}

pub async fn handle(
    args: &RunArgs,
    config: &ResearchConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let client =
        ResearchClient::from_config(&config.server).context("failed to build HTTP client")?;
    let mut controller = SessionController::new(client);
    let auto_approve = args.approve || config.general.auto_approve;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    let mut progress = Progress::spinner("Connecting to research backend...");
    let started = tokio::select! {
        result = controller.start(&args.goal) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let mut interrupted = match started {
        Some(result) => {
            let thread_id = result?;
            tracing::debug!(%thread_id, "run: session started");
            false
        }
        None => true,
    };

    while !interrupted {
        let step = tokio::select! {
            status = follow(&mut controller, &progress) => Step::Settled(status),
            _ = tokio::signal::ctrl_c() => Step::Interrupted,
        };
        match step {
            Step::Interrupted => interrupted = true,
            Step::Settled(SessionStatus::WaitingReview) => {
                let plan = render_plan_text(controller.state().plan().unwrap_or_default());
                let decision = if auto_approve {
                    progress.note(&plan);
                    progress.note("Plan approved automatically.");
                    ReviewDecision::Approve
                } else {
                    progress.finish_clear();
                    let decision = ask_for_review(&plan, &mut stdin).await?;
                    progress = Progress::spinner("Resuming research...");
                    decision
                };
                match decision {
                    ReviewDecision::Approve => controller.approve().await?,
                    ReviewDecision::Revise(feedback) => controller.revise(&feedback).await?,
                }
            }
            Step::Settled(_) => break,
        }
    }

    if interrupted {
        controller.cancel();
    }
    progress.finish_clear();

    let snapshot = controller.snapshot();
    output_snapshot(&snapshot, flags.format, config.general.log_tail)?;

    match snapshot.status {
        SessionStatus::Completed => Ok(()),
        _ if interrupted => anyhow::bail!("research cancelled"),
        status => {
            let reason = snapshot
                .log
                .last()
                .map_or("no log output", |entry| entry.message.as_str());
            anyhow::bail!("research stopped while {status}: {reason}")
        }
    }
}

/// Apply frames until the transport closes, narrating them on the spinner.
async fn follow<T: Transport>(
    controller: &mut SessionController<T>,
    progress: &Progress,
) -> SessionStatus {
    while let Some(update) = controller.next_update().await {
        describe(&update, controller.state().report().len(), progress);
    }
    controller.state().status()
}

fn describe(update: &Update, report_len: usize, progress: &Progress) {
    match &update.action {
        Action::Log { message } | Action::TransportLost { reason: message } => {
            progress.note(message);
            progress.set_message(message);
        }
        Action::Progress(patch) => {
            if let Some(status) = patch.status {
                let title = patch.title.as_deref().unwrap_or("");
                progress.note(format!("task #{} {status} {title}", patch.task_id).trim_end());
            }
            if let Some(message) = &patch.message {
                progress.set_message(message);
            }
        }
        Action::ReportToken { .. } => {
            progress.set_message(&format!("Writing report ({report_len} bytes)"));
        }
        Action::Interrupt { message, .. } => {
            progress.set_message(message.as_deref().unwrap_or("Plan ready for review"));
        }
        Action::Done { .. } => progress.set_message("Research completed"),
        Action::BackendError { error } => progress.note(&format!("Backend error: {error}")),
        Action::Reset { .. }
        | Action::Begin
        | Action::Resume
        | Action::Connected
        | Action::Cancelled => {}
    }
}

async fn ask_for_review(
    plan: &str,
    stdin: &mut Lines<BufReader<Stdin>>,
) -> anyhow::Result<ReviewDecision> {
    eprint!("{plan}");
    eprint!("Approve this plan? [Enter/y approves, anything else is sent as feedback] > ");
    std::io::stderr().flush().context("failed to flush prompt")?;

    let line = stdin
        .next_line()
        .await
        .context("failed to read review decision")?
        .context("stdin closed while waiting for plan review")?;
    Ok(ReviewDecision::parse(&line))
}
