use colored::Colorize;
use lstake_sdk::{chain::ChainClient, orchestrator::StakingOrchestrator};

pub(crate) async fn render<C: ChainClient>(
    orchestrator: &StakingOrchestrator<C>,
) -> anyhow::Result<()> {
    let snapshot = orchestrator.load_initial_data().await?;

    println!(
        "{}\n",
        format!("{:#^64}", format!(" {} ", orchestrator.identity().address()))
            .bold()
            .purple()
    );
    println!("{}", snapshot);
    Ok(())
}
