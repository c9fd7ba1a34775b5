pub mod generate {
    use std::io::Write as _;
    use std::path::PathBuf;

    use tracing::info;

    use crate::{emit, input};

    pub const DEFAULT_OUTPUT: &str = "include/caparoc/registers_generated.hpp";

    #[derive(clap::Parser)]
    #[group(id = "generate::Args")]
    pub struct Args {
        #[command(flatten)]
        pub input: input::Args,
        /// Where to write the generated header.
        #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
        pub output: PathBuf,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error(transparent)]
        Input(#[from] input::Error),
        #[error("could not open the specified output file at {1:?}")]
        OpenOutputFile(#[source] std::io::Error, PathBuf),
        #[error("could not write data to the output file at {1:?}")]
        WriteFile(#[source] std::io::Error, PathBuf),
        #[error("could not write data to the terminal")]
        WriteStdout(#[source] std::io::Error),
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let registers = args.input.load()?;
        let summary = registers.access_summary();
        let mut stdout = std::io::stdout().lock();
        let report = format!(
            "Parsed {} registers\n  Read-Only: {}\n  Write-Only: {}\n  Read-Write: {}\n",
            registers.len(),
            summary.read_only,
            summary.write_only,
            summary.read_write,
        );
        stdout.write_all(report.as_bytes()).map_err(Error::WriteStdout)?;

        let header = emit::render_header(registers.records());
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&args.output)
            .map_err(|e| Error::OpenOutputFile(e, args.output.clone()))?;
        file.write_all(header.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| Error::WriteFile(e, args.output.clone()))?;
        info!(path = ?args.output, bytes = header.len(), "wrote register header");

        writeln!(stdout, "Generated {}", args.output.display()).map_err(Error::WriteStdout)?;
        Ok(())
    }
}

pub mod list {
    use crate::registers::RegisterRecord;
    use crate::{input, output};

    /// Search and output the registers in the register table.
    #[derive(clap::Parser)]
    pub struct Args {
        #[command(flatten)]
        input: input::Args,
        #[command(flatten)]
        output: output::Args,
        /// Only list registers with this text in their name or description.
        filter: Option<String>,
        /// Match the filter against register names only.
        #[arg(long, requires = "filter")]
        name_only: bool,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error(transparent)]
        Input(#[from] input::Error),
        #[error(transparent)]
        Output(#[from] output::Error),
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let registers = args.input.load()?;
        let selected: Vec<&RegisterRecord> = match &args.filter {
            Some(pattern) if args.name_only => registers.find_by_name(pattern).collect(),
            Some(pattern) => registers.matching(pattern).collect(),
            None => registers.records().iter().collect(),
        };
        let mut output = args.output.to_output()?;
        output.begin(registers.len(), args.filter.is_some())?;
        for register in selected {
            output.register(register)?;
        }
        output.commit()?;
        Ok(())
    }
}

pub mod info {
    use std::io::Write as _;

    use crate::input;

    /// Describe the register at an address.
    #[derive(clap::Parser)]
    pub struct Args {
        #[command(flatten)]
        input: input::Args,
        /// Register address, decimal or `0x` prefixed hexadecimal.
        #[arg(value_parser = parse_address)]
        address: u16,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error(transparent)]
        Input(#[from] input::Error),
        #[error("register at address 0x{0:04X} not found")]
        NotFound(u16),
        #[error("could not write data to the terminal")]
        WriteStdout(#[source] std::io::Error),
    }

    pub fn parse_address(text: &str) -> Result<u16, std::num::ParseIntError> {
        match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => text.parse(),
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let registers = args.input.load()?;
        let description = registers
            .describe(args.address)
            .ok_or(Error::NotFound(args.address))?;
        writeln!(std::io::stdout().lock(), "{description}").map_err(Error::WriteStdout)
    }

    #[cfg(test)]
    mod tests {
        use super::parse_address;

        #[test]
        fn addresses() {
            assert_eq!(parse_address("100"), Ok(100));
            assert_eq!(parse_address("0x0064"), Ok(100));
            assert_eq!(parse_address("0XC050"), Ok(0xC050));
            assert!(parse_address("0x").is_err());
            assert!(parse_address("70000").is_err());
            assert!(parse_address("zz").is_err());
        }
    }
}
