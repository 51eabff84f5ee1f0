use std::sync::Arc;

use anyhow::Context;
use reqwest::Url;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use onboarding_flow::api::{ApiClient, HttpBackend};
use onboarding_flow::config::Config;
use onboarding_flow::onboarding::model::validate_nickname;
use onboarding_flow::onboarding::{
    InitOutcome, Interest, Navigator, OnboardingController, PageDeps, PostCompletionAction,
    SubmitOutcome,
};
use onboarding_flow::ui::{LoadingOverlay, NotificationCenter};

/// Prints where a browser would have gone.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, url: &Url) {
        println!("→ {url}");
    }
}

type StdinLines = Lines<BufReader<Stdin>>;

async fn prompt(lines: &mut StdinLines, question: &str) -> anyhow::Result<String> {
    eprint!("{question} ");
    let line = lines
        .next_line()
        .await
        .context("Failed to read stdin")?
        .context("stdin closed")?;
    Ok(line.trim().to_string())
}

/// Comma- or space-separated list of numbers or tags → interest tags.
fn parse_interest_choices(input: &str) -> Vec<&'static str> {
    input
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<usize>() {
            Ok(n) => Interest::ALL.get(n.checked_sub(1)?).map(Interest::tag),
            Err(_) => s.parse::<Interest>().ok().map(|i| i.tag()),
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Invalid onboarding configuration")?;

    eprintln!("👋 Onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.api_url);
    eprintln!("   Dashboard: {}\n", config.dashboard_url);

    let notifications = NotificationCenter::with_duration(config.notification_duration)
        .with_sink(|toast| eprintln!("{} {}", toast.severity.icon(), toast.message));

    let deps = PageDeps {
        backend: Arc::new(HttpBackend::new(ApiClient::new(config.api_url.clone()))),
        notifier: Arc::new(notifications),
        loading: Arc::new(LoadingOverlay::new()),
        navigator: Arc::new(TerminalNavigator),
    };

    let mut controller = match OnboardingController::init(config, deps).await {
        InitOutcome::Ready(controller) => controller,
        InitOutcome::Redirected(_) => {
            eprintln!("You have already completed onboarding.");
            return Ok(());
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    'collect: loop {
        eprintln!("What would you like your agents to help with?");
        for (i, interest) in Interest::ALL.iter().enumerate() {
            eprintln!("  {}. {}", i + 1, interest.display_name());
        }
        let answer = prompt(&mut lines, "Pick one or more (e.g. 2,7):").await?;
        for tag in parse_interest_choices(&answer) {
            controller.handle_interest_change(tag, true);
        }

        let nickname = loop {
            let nickname = prompt(&mut lines, "Nickname:").await?;
            match validate_nickname(&nickname) {
                Ok(()) => break nickname,
                Err(e) => eprintln!("{e}"),
            }
        };
        controller.handle_nickname_input(&nickname);

        loop {
            match controller.complete_onboarding().await {
                SubmitOutcome::Completed | SubmitOutcome::AlreadyComplete => break 'collect,
                SubmitOutcome::Rejected => continue 'collect,
                SubmitOutcome::Failed => {
                    let retry = prompt(&mut lines, "Try again? [Y/n]").await?;
                    if retry.eq_ignore_ascii_case("n") {
                        return Ok(());
                    }
                }
            }
        }
    }

    eprintln!("\nWhat next?");
    eprintln!("  1. Take the guided tour");
    eprintln!("  2. Create your first agent");
    eprintln!("  3. Go to the dashboard");
    let action = match prompt(&mut lines, "Choose [1-3]:").await?.as_str() {
        "1" => PostCompletionAction::StartTour,
        "2" => PostCompletionAction::CreateDirect,
        _ => PostCompletionAction::SkipTour,
    };
    controller.finish(action).await?;

    Ok(())
}
