use colored::Colorize;
use lstake_sdk::{chain::ChainClient, orchestrator::StakingOrchestrator, state::StakeUiState};

pub(crate) async fn render<C: ChainClient>(
    orchestrator: &StakingOrchestrator<C>,
    amount: &str,
) -> anyhow::Result<()> {
    orchestrator.load_initial_data().await?;
    let validation = orchestrator.on_amount_changed(amount).await;
    if !validation.is_valid() {
        return Err(anyhow::anyhow!("{}", validation));
    }
    println!(
        "Staking {} HYPE, expecting {} kHYPE",
        orchestrator.candidate_amount().to_string().bold(),
        orchestrator.expected_output().to_string().bold()
    );

    let result = orchestrator.stake(amount).await;
    match orchestrator.ui_state() {
        StakeUiState::Error(message) => return Err(anyhow::anyhow!(message)),
        state => println!("{}", state),
    }
    result?;

    if let Some(warning) = orchestrator.slippage_warning() {
        println!("{}", warning.yellow());
    }
    println!("\n{}", orchestrator.snapshot());
    Ok(())
}
