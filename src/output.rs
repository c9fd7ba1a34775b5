use std::io::Write as _;
use std::path::PathBuf;

use csv_core::WriteResult;

use crate::registers::{RegisterAccess, RegisterRecord, RegisterType};

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Format {
    Table,
    Text,
    Jsonl,
    Csv,
}

#[derive(clap::Parser)]
#[group(id = "output::Args")]
pub struct Args {
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    #[arg(long, short='f', value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open the specified output file at {1:?}")]
    OpenOutputFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the output file at {1:?}")]
    WriteFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the terminal")]
    WriteStdout(#[source] std::io::Error),
    #[error("could not serialize registers to JSON")]
    SerializeJson(#[source] serde_json::Error),
    #[error("could not serialize registers to CSV")]
    SerializeCsv(#[source] std::io::Error),
}

/// Registers shown by an unfiltered plain listing before the rest is summarized in one line.
pub const TEXT_LISTING_LIMIT: usize = 800;

const HEADERS: [&str; 6] = ["Address", "Registers", "Type", "Access", "Name", "Description"];

#[derive(serde::Serialize)]
struct RegisterEntry<'a> {
    address: u16,
    address_hex: &'a str,
    registers: u16,
    #[serde(rename = "type")]
    data_type: RegisterType,
    access: RegisterAccess,
    function_codes: &'a str,
    name: &'a str,
    description: &'a str,
}

impl<'a> From<&'a RegisterRecord> for RegisterEntry<'a> {
    fn from(r: &'a RegisterRecord) -> Self {
        Self {
            address: r.address,
            address_hex: &r.address_hex,
            registers: r.register_count,
            data_type: r.register_type(),
            access: r.register_access(),
            function_codes: &r.function_codes,
            name: &r.name,
            description: &r.description,
        }
    }
}

fn table_row(r: &RegisterRecord) -> Vec<String> {
    vec![
        format!("0x{:04X}", r.address),
        r.register_count.to_string(),
        r.register_type().to_string(),
        r.register_access().to_string(),
        r.name.clone(),
        r.description.clone(),
    ]
}

impl Args {
    pub fn to_output(self) -> Result<Output, Error> {
        let io = match &self.output {
            None => Box::new(std::io::stdout().lock()) as Box<_>,
            Some(path) => Box::new(
                std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| Error::OpenOutputFile(e, path.clone()))?,
            ) as Box<_>,
        };
        let formatter = match &self.format {
            Format::Table => {
                let mut comfy = comfy_table::Table::new();
                comfy.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
                Formatter::Table { comfy }
            }
            Format::Text => Formatter::Text,
            Format::Jsonl => Formatter::Jsonl,
            Format::Csv => Formatter::Csv,
        };
        Ok(Output { args: self, io, formatter, total: 0, filtered: false, written: 0 })
    }
}

/// Sink for a listing of registers in one of the [`Format`]s.
pub struct Output {
    args: Args,
    io: Box<dyn std::io::Write>,
    formatter: Formatter,
    total: usize,
    filtered: bool,
    written: usize,
}

enum Formatter {
    Csv,
    Table { comfy: comfy_table::Table },
    /// Plain listing, one line per register.
    Text,
    Jsonl,
}

impl Output {
    /// Must be called before the first register.
    ///
    /// `total` is the size of the whole register table and `filtered` tells whether only a
    /// selection of it follows.
    pub fn begin(&mut self, total: usize, filtered: bool) -> Result<(), Error> {
        self.total = total;
        self.filtered = filtered;
        match &mut self.formatter {
            Formatter::Csv => self.write_csv_row(&HEADERS)?,
            Formatter::Table { comfy } => {
                comfy.set_header(HEADERS);
            }
            Formatter::Text => {
                let title = format!(
                    "CAPAROC MODBUS Register Map\n\
                     ===========================\n\
                     Total registers: {total}\n"
                );
                self.io.write_all(title.as_bytes()).map_err(|e| self.write_error(e))?;
            }
            Formatter::Jsonl => {}
        }
        Ok(())
    }

    pub fn register(&mut self, r: &RegisterRecord) -> Result<(), Error> {
        if matches!(self.formatter, Formatter::Text) && self.is_truncated() {
            return Ok(());
        }
        self.written += 1;
        match &mut self.formatter {
            Formatter::Csv => self.write_csv_row(&table_row(r))?,
            Formatter::Table { comfy } => {
                comfy.add_row(table_row(r));
            }
            Formatter::Text => {
                let separator = if self.written == 1 { "\n" } else { "" };
                let line = format!(
                    "{separator}[0x{:04X}] {} | {} | {} regs | {}\n",
                    r.address,
                    r.register_access(),
                    r.register_type(),
                    r.register_count,
                    r.name
                );
                self.io.write_all(line.as_bytes()).map_err(|e| self.write_error(e))?;
            }
            Formatter::Jsonl => {
                serde_json::to_writer(&mut self.io, &RegisterEntry::from(r))
                    .map_err(Error::SerializeJson)?;
                writeln!(self.io).map_err(|e| self.write_error(e))?
            }
        }
        Ok(())
    }

    fn write_csv_row<V: AsRef<str>>(&mut self, values: &[V]) -> Result<(), Error> {
        // Worst case every byte is a quote and gets doubled, plus the enclosing quotes and the
        // record terminator.
        let max_len = 4 + 2 * values.iter().map(|v| v.as_ref().len()).max().unwrap_or(0);
        let mut buffer = vec![0; max_len];
        let mut writer = csv_core::Writer::new();
        for (index, value) in values.iter().enumerate() {
            if index != 0 {
                let (result, written) = writer.delimiter(&mut buffer);
                self.write_csv_chunk(result, &buffer[..written])?;
            }
            let (result, _, written) = writer.field(value.as_ref().as_bytes(), &mut buffer);
            self.write_csv_chunk(result, &buffer[..written])?;
        }
        let (result, written) = writer.terminator(&mut buffer);
        self.write_csv_chunk(result, &buffer[..written])
    }

    fn write_csv_chunk(&mut self, result: WriteResult, chunk: &[u8]) -> Result<(), Error> {
        if let WriteResult::OutputFull = result {
            return Err(Error::SerializeCsv(std::io::Error::other("csv record buffer too small")));
        }
        self.io.write_all(chunk).map_err(|e| self.write_error(e))
    }

    fn is_truncated(&self) -> bool {
        !self.filtered && self.written >= TEXT_LISTING_LIMIT
    }

    fn write_error(&self, e: std::io::Error) -> Error {
        match &self.args.output {
            None => Error::WriteStdout(e),
            Some(p) => Error::WriteFile(e, p.into()),
        }
    }

    /// Finish the listing. A filtered plain listing ends with the number of listed registers, a
    /// truncated one with the number of registers left out.
    pub fn commit(mut self) -> Result<(), Error> {
        match &self.formatter {
            Formatter::Csv | Formatter::Jsonl => {}
            Formatter::Table { comfy } => {
                self.io.write_fmt(format_args!("{}\n", comfy)).map_err(|e| self.write_error(e))?;
            }
            Formatter::Text => {
                let footer = if self.filtered {
                    format!("\nMatching registers: {}\n", self.written)
                } else if self.is_truncated() && self.total > self.written {
                    format!(
                        "\n... and {} more registers (use filter to narrow down)\n",
                        self.total - self.written
                    )
                } else {
                    String::new()
                };
                self.io.write_all(footer.as_bytes()).map_err(|e| self.write_error(e))?;
            }
        }
        self.io.flush().map_err(|e| self.write_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::tests::record;

    fn listing(format: Format, filtered: bool, records: &[RegisterRecord]) -> String {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("listing");
        let args = Args { output: Some(path.clone()), format };
        let mut output = args.to_output().expect("open output");
        output.begin(records.len(), filtered).expect("begin");
        for r in records {
            output.register(r).expect("register");
        }
        output.commit().expect("commit");
        std::fs::read_to_string(path).expect("read listing")
    }

    #[test]
    fn text_listing() {
        let records = [
            record(16, "0x0010", "WO", "Reset"),
            record(24576, "0x6000", "RO", "Global status"),
        ];
        assert_eq!(
            listing(Format::Text, true, &records),
            "CAPAROC MODBUS Register Map\n\
             ===========================\n\
             Total registers: 2\n\
             \n\
             [0x0010] WO | UINT16 | 1 regs | Reset\n\
             [0x6000] RO | UINT16 | 1 regs | Global status\n\
             \n\
             Matching registers: 2\n"
        );
        assert!(!listing(Format::Text, false, &records).contains("Matching"));
    }

    fn many(count: usize) -> Vec<RegisterRecord> {
        (0..count)
            .map(|i| {
                let address = u16::try_from(i).expect("small table");
                record(address, &format!("0x{address:04X}"), "RO", "Status")
            })
            .collect()
    }

    #[test]
    fn long_text_listing_is_truncated() {
        let text = listing(Format::Text, false, &many(TEXT_LISTING_LIMIT + 5));
        assert_eq!(text.matches("] RO |").count(), TEXT_LISTING_LIMIT);
        assert!(text.contains("[0x031F] RO"), "last shown register");
        assert!(!text.contains("[0x0320]"));
        assert!(text.ends_with(
            "[0x031F] RO | UINT16 | 1 regs | Status\n\
             \n\
             ... and 5 more registers (use filter to narrow down)\n"
        ));

        let text = listing(Format::Text, false, &many(TEXT_LISTING_LIMIT));
        assert_eq!(text.matches("] RO |").count(), TEXT_LISTING_LIMIT);
        assert!(!text.contains("more registers"));
    }

    #[test]
    fn filtered_and_structured_listings_are_complete() {
        let records = many(TEXT_LISTING_LIMIT + 5);
        let text = listing(Format::Text, true, &records);
        assert_eq!(text.matches("] RO |").count(), records.len());
        assert!(text.ends_with("\nMatching registers: 805\n"));
        assert_eq!(listing(Format::Jsonl, false, &records).lines().count(), records.len());
        assert_eq!(listing(Format::Csv, false, &records).lines().count(), records.len() + 1);
    }

    #[test]
    fn jsonl_listing() {
        let records = [record(16, "0x0010", "WO", "Reset")];
        let text = listing(Format::Jsonl, false, &records);
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).expect("json");
        assert_eq!(value["address"], 16);
        assert_eq!(value["address_hex"], "0x0010");
        assert_eq!(value["type"], "UINT16");
        assert_eq!(value["access"], "WO");
        assert_eq!(value["name"], "Reset");
    }

    #[test]
    fn csv_listing_quotes_fields() {
        let mut r = record(16, "0x0010", "WO", "Reset, all");
        r.description = "say \"hi\"".into();
        let text = listing(Format::Csv, false, &[r]);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Address,Registers,Type,Access,Name,Description"));
        assert_eq!(lines.next(), Some(r#"0x0010,1,UINT16,WO,"Reset, all","say ""hi""""#));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn table_listing() {
        let text = listing(Format::Table, false, &[record(16, "0x0010", "WO", "Reset")]);
        assert!(text.contains("Address"));
        assert!(text.contains("0x0010"));
        assert!(text.contains("Reset"));
    }
}
