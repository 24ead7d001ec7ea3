use colored::Colorize;
use lstake_sdk::{chain::ChainClient, orchestrator::StakingOrchestrator};

pub(crate) async fn render<C: ChainClient>(
    orchestrator: &StakingOrchestrator<C>,
    amount: &str,
) -> anyhow::Result<()> {
    orchestrator.load_initial_data().await?;
    let validation = orchestrator.on_amount_changed(amount).await;

    println!("{} {}", "Amount:".bold(), orchestrator.candidate_amount());
    println!("{} {}", "Validation:".bold(), validation);
    println!("{} {}", "Expected kHYPE:".bold(), orchestrator.expected_output());
    Ok(())
}
