use std::path::PathBuf;

use tracing::{info, warn};

use crate::registers::RegisterMap;

pub const DEFAULT_INPUT: &str = "input/registers.html";

#[derive(clap::Parser)]
#[group(id = "input::Args")]
pub struct Args {
    /// HTML document with the register table.
    #[arg(long, short = 'i', default_value = DEFAULT_INPUT)]
    pub input: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not read the register table at {1:?}")]
    ReadInput(#[source] std::io::Error, PathBuf),
}

impl Args {
    pub fn load(&self) -> Result<RegisterMap, Error> {
        let markup = std::fs::read_to_string(&self.input)
            .map_err(|e| Error::ReadInput(e, self.input.clone()))?;
        let registers = RegisterMap::from_html(&markup);
        if registers.is_empty() {
            warn!(path = ?self.input, "no register rows found in the document");
        } else {
            info!(path = ?self.input, registers = registers.len(), "parsed register table");
        }
        Ok(registers)
    }
}
