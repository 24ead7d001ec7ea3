use colored::Colorize;
use lstake_sdk::{connection::SignerIdentity, key};

pub(crate) fn render(private_key: &str) -> anyhow::Result<()> {
    let cleaned = key::validate(private_key)?;
    let identity = SignerIdentity::from_private_key(&cleaned)?;

    println!("{} {}", "Key:".bold(), key::mask(&cleaned));
    println!("{} {}", "Address:".bold(), identity.address().to_string().green());
    Ok(())
}
