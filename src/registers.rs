use crate::extract::{self, Row};
use tracing::debug;

/// First cell of the column header row in the vendor table. The misspelling is theirs.
pub const HEADER_LABEL: &str = "Dec Adress";
/// First cell of the rows standing in for elided ranges.
pub const PLACEHOLDER: &str = "[...]";

/// Data type of a register as it appears in the generated `RegisterType` enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr, strum::VariantArray)]
pub enum RegisterType {
    #[strum(serialize = "UINT16")]
    Uint16,
    #[strum(serialize = "INT16")]
    Int16,
    #[strum(serialize = "UINT32")]
    Uint32,
    #[strum(serialize = "INT32")]
    Int32,
    #[strum(serialize = "FLOAT")]
    Float,
    /// 32 characters packed into 16 registers.
    #[strum(serialize = "STRING32")]
    String32,
}

impl RegisterType {
    /// Map the free-form type column of the register table.
    ///
    /// The table only ever uses these four spellings; `INT32` and `FLOAT` exist in the generated
    /// enum but have no source representation.
    pub fn from_source(text: &str) -> Option<Self> {
        Some(match text {
            "UINT16" => Self::Uint16,
            "UINT32" => Self::Uint32,
            "INT16" => Self::Int16,
            "String32" => Self::String32,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for RegisterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for RegisterType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr, strum::VariantArray)]
pub enum RegisterAccess {
    #[strum(serialize = "READ_ONLY")]
    ReadOnly,
    #[strum(serialize = "WRITE_ONLY")]
    WriteOnly,
    #[strum(serialize = "READ_WRITE")]
    ReadWrite,
}

impl RegisterAccess {
    pub fn from_source(text: &str) -> Option<Self> {
        Some(match text {
            "RO" => Self::ReadOnly,
            "WO" => Self::WriteOnly,
            "RW" => Self::ReadWrite,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// The abbreviation used by the register table.
    pub const fn short(&self) -> &'static str {
        match self {
            Self::ReadOnly => "RO",
            Self::WriteOnly => "WO",
            Self::ReadWrite => "RW",
        }
    }
}

impl std::fmt::Display for RegisterAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short())
    }
}

impl serde::Serialize for RegisterAccess {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.short())
    }
}

/// One row of the register table.
///
/// `data_type` and `access` keep the text from the table verbatim: the generated constants are
/// annotated with it, while the lookup table uses the mapped [`RegisterType`] and
/// [`RegisterAccess`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterRecord {
    pub address: u16,
    pub address_hex: String,
    pub register_count: u16,
    pub function_codes: String,
    pub data_type: String,
    pub access: String,
    pub name: String,
    pub description: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RowRejection {
    #[error("column header row")]
    Header,
    #[error("placeholder row")]
    Placeholder,
    #[error("empty address cell")]
    EmptyAddress,
    #[error("address `{1}` is not a decimal register address")]
    Address(#[source] std::num::ParseIntError, String),
    #[error("register count `{1}` is out of range")]
    RegisterCount(#[source] std::num::ParseIntError, String),
}

impl RegisterRecord {
    pub fn from_row(row: Row) -> Result<Self, RowRejection> {
        let [
            dec,
            address_hex,
            count,
            function_codes,
            data_type,
            access,
            name,
            description,
        ] = row;
        match dec.as_str() {
            HEADER_LABEL => return Err(RowRejection::Header),
            PLACEHOLDER => return Err(RowRejection::Placeholder),
            "" => return Err(RowRejection::EmptyAddress),
            _ => {}
        }
        // Padding such as an `&nbsp;` that survived the cell trim is not part of the number.
        let address = dec
            .trim()
            .parse::<u16>()
            .map_err(|e| RowRejection::Address(e, dec.clone()))?;
        // Anything that is not a plain digit string ("1-2", "n", "") counts as a single register.
        let register_count = if !count.is_empty() && count.bytes().all(|b| b.is_ascii_digit()) {
            count
                .parse::<u16>()
                .map_err(|e| RowRejection::RegisterCount(e, count.clone()))?
        } else {
            1
        };
        Ok(Self {
            address,
            address_hex,
            register_count,
            function_codes,
            data_type,
            access,
            name,
            description,
        })
    }

    /// Type used in the generated table, `UINT16` when the table's text is not recognized.
    pub fn register_type(&self) -> RegisterType {
        RegisterType::from_source(&self.data_type).unwrap_or(RegisterType::Uint16)
    }

    /// Access used in the generated table, `READ_ONLY` when the table's text is not recognized.
    pub fn register_access(&self) -> RegisterAccess {
        RegisterAccess::from_source(&self.access).unwrap_or(RegisterAccess::ReadOnly)
    }

    fn is_match(&self, pattern: &str) -> bool {
        self.name.to_lowercase().contains(pattern)
            || self.description.to_lowercase().contains(pattern)
    }
}

/// Turn table rows into records, preserving their order.
///
/// Rows that are not register definitions are dropped. This never fails: a document without a
/// single usable row results in an empty list.
pub fn normalize(rows: impl IntoIterator<Item = Row>) -> Vec<RegisterRecord> {
    rows.into_iter()
        .filter_map(|row| match RegisterRecord::from_row(row) {
            Ok(record) => Some(record),
            Err(reason) => {
                debug!(%reason, "skipping row");
                None
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessSummary {
    pub read_only: usize,
    pub write_only: usize,
    pub read_write: usize,
}

/// All registers found in one register table document, in table order.
#[derive(Clone, Debug, Default)]
pub struct RegisterMap {
    records: Vec<RegisterRecord>,
}

impl RegisterMap {
    pub fn new(records: Vec<RegisterRecord>) -> Self {
        Self { records }
    }

    pub fn from_html(markup: &str) -> Self {
        Self::new(normalize(extract::rows(markup)))
    }

    pub fn records(&self) -> &[RegisterRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the register at `address`.
    ///
    /// The table may list an address more than once, in which case the later row wins.
    pub fn lookup(&self, address: u16) -> Option<&RegisterRecord> {
        self.records.iter().rev().find(|r| r.address == address)
    }

    /// Registers whose name contains `pattern`, ignoring case.
    pub fn find_by_name<'a>(
        &'a self,
        pattern: &str,
    ) -> impl Iterator<Item = &'a RegisterRecord> + use<'a> {
        let pattern = pattern.to_lowercase();
        self.records
            .iter()
            .filter(move |r| r.name.to_lowercase().contains(&pattern))
    }

    /// Registers whose name or description contains `pattern`, ignoring case.
    pub fn matching<'a>(
        &'a self,
        pattern: &str,
    ) -> impl Iterator<Item = &'a RegisterRecord> + use<'a> {
        let pattern = pattern.to_lowercase();
        self.records.iter().filter(move |r| r.is_match(&pattern))
    }

    /// Count registers per access mode. Rows with an access text other than `RO`, `WO` or `RW`
    /// are not counted anywhere.
    pub fn access_summary(&self) -> AccessSummary {
        let mut summary = AccessSummary::default();
        for record in &self.records {
            match RegisterAccess::from_source(&record.access) {
                Some(RegisterAccess::ReadOnly) => summary.read_only += 1,
                Some(RegisterAccess::WriteOnly) => summary.write_only += 1,
                Some(RegisterAccess::ReadWrite) => summary.read_write += 1,
                None => {}
            }
        }
        summary
    }

    /// Human readable description of the register at `address`.
    pub fn describe(&self, address: u16) -> Option<String> {
        let r = self.lookup(address)?;
        Some(format!(
            "Address: 0x{:04X} ({} dec)\n\
             Registers: {}\n\
             Type: {}\n\
             Access: {}\n\
             Name: {}\n\
             Description: {}",
            r.address,
            r.address,
            r.register_count,
            r.register_type(),
            r.register_access(),
            r.name,
            r.description,
        ))
    }
}

impl FromIterator<RegisterRecord> for RegisterMap {
    fn from_iter<I: IntoIterator<Item = RegisterRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
