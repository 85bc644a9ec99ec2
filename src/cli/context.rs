//! Context and system message CLI commands.

// CLI commands are allowed to use println! for output
#![allow(clippy::print_stdout)]

use crate::config::DeluluConfig;
use crate::context::ContextAssembler;
use crate::rendering::{Bindings, SystemMessage};
use crate::vault::FsVault;
use std::path::Path;

/// Prints the journal context assembled from `vault`.
pub async fn cmd_context(
    config: &DeluluConfig,
    vault: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = FsVault::new(vault);
    let context = ContextAssembler::new(&source, config)
        .gather_context()
        .await?;
    print!("{context}");
    Ok(())
}

/// Prints the system message the completion request would carry.
pub fn cmd_system_message(config: &DeluluConfig) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = SystemMessage::from_config(config).render(&Bindings::from_config(config))?;
    println!("{rendered}");
    Ok(())
}
