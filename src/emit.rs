//! Rendering of the `registers_generated.hpp` header.
//!
//! The header consists of a fixed prelude declaring `RegisterAccess`, `RegisterType` and
//! `RegisterInfo`, a block of `constexpr` address constants inside `caparoc::registers` and the
//! `register_table` lookup array. Both blocks list registers in table order.

use crate::registers::RegisterRecord;
use std::collections::HashSet;
use tracing::debug;

const PRELUDE: &str = include_str!("emit/prelude.hpp");

pub const MAX_IDENTIFIER_LEN: usize = 60;
pub const FALLBACK_PREFIX: &str = "REG_";

/// Address ranges the constants are grouped under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum AddressGroup {
    #[strum(serialize = "Control/Reset")]
    ControlReset,
    #[strum(serialize = "Product Information")]
    ProductInformation,
    #[strum(serialize = "Status/Measurements")]
    StatusMeasurements,
    #[strum(serialize = "Configuration")]
    Configuration,
    #[strum(serialize = "Configuration (Extended)")]
    ConfigurationExtended,
}

impl AddressGroup {
    pub const fn of(address: u16) -> Self {
        match address {
            0..0x0100 => Self::ControlReset,
            0x0100..0x1000 => Self::ProductInformation,
            0x1000..0xC000 => Self::StatusMeasurements,
            0xC000..0xD000 => Self::Configuration,
            0xD000.. => Self::ConfigurationExtended,
        }
    }

    pub fn label(&self) -> &'static str {
        self.into()
    }
}

/// Reduce a register name to `[a-z0-9_]`, at most [`MAX_IDENTIFIER_LEN`] characters long.
///
/// Every run of other characters becomes a single underscore and no underscores are left at
/// either end. The result may be empty.
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            sanitized.push(c);
        } else if !sanitized.ends_with('_') {
            sanitized.push('_');
        }
    }
    let mut trimmed = sanitized.trim_matches('_');
    if trimmed.len() > MAX_IDENTIFIER_LEN {
        // Only ASCII is left at this point, so any byte offset is a char boundary.
        trimmed = trimmed[..MAX_IDENTIFIER_LEN].trim_end_matches('_');
    }
    trimmed.to_owned()
}

/// Identifier derived from the hex address text, e.g. `REG_C050` for `0xc050`.
///
/// The first two characters of `address_hex` are taken to be the `0x` prefix.
pub fn fallback_identifier(address_hex: &str) -> String {
    let digits = address_hex.chars().skip(2).collect::<String>();
    format!("{FALLBACK_PREFIX}{}", digits.to_uppercase())
}

/// Constant names handed out so far within one header.
#[derive(Debug, Default)]
pub struct Identifiers {
    used: HashSet<String>,
}

impl Identifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the constant name for `record`.
    ///
    /// The upper-cased sanitized name is used unless it is empty or already taken, in which case
    /// the [`fallback_identifier`] is used. Fallbacks are not checked against earlier names, so
    /// two registers with the same hex text and unusable names end up with the same identifier.
    pub fn assign(&mut self, record: &RegisterRecord) -> String {
        let mut identifier = sanitize_name(&record.name).to_ascii_uppercase();
        if identifier.is_empty() || self.used.contains(&identifier) {
            let fallback = fallback_identifier(&record.address_hex);
            debug!(
                address = record.address,
                name = %record.name,
                candidate = %identifier,
                %fallback,
                "register name unusable as identifier"
            );
            identifier = fallback;
        }
        self.used.insert(identifier.clone());
        identifier
    }

    #[cfg(test)]
    fn contains(&self, identifier: &str) -> bool {
        self.used.contains(identifier)
    }
}

/// The `constexpr` address constants, grouped by address range.
///
/// A group comment is written whenever the range differs from the previous register's, so a
/// table that is not sorted by address repeats group comments.
pub fn constants_block(records: &[RegisterRecord]) -> String {
    let mut lines = vec![
        "// Auto-generated register definitions from CAPAROC specification".to_string(),
        format!("// Total registers: {}", records.len()),
        String::new(),
    ];
    let mut identifiers = Identifiers::new();
    let mut current_group = None;
    for record in records {
        let group = AddressGroup::of(record.address);
        if current_group != Some(group) {
            lines.push(String::new());
            lines.push(format!("// {}", group.label()));
            current_group = Some(group);
        }
        let identifier = identifiers.assign(record);
        lines.push(format!(
            "constexpr uint16_t {identifier} = {}; // {}, {}",
            record.address_hex, record.access, record.data_type
        ));
    }
    lines.join("\n")
}

/// Escape a string for a C++ literal. Only quotes are handled.
fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}

/// The `register_table` array and its `register_table_size`.
pub fn table_block(records: &[RegisterRecord]) -> String {
    let mut lines = vec![
        "// Register information table".to_string(),
        "constexpr RegisterInfo register_table[] = {".to_string(),
    ];
    for record in records {
        lines.push(format!(
            "    {{{}, {}, RegisterType::{}, RegisterAccess::{},",
            record.address_hex,
            record.register_count,
            record.register_type().as_str(),
            record.register_access().as_str(),
        ));
        lines.push(format!("     \"{}\",", escape(&record.name)));
        lines.push(format!("     \"{}\"}},", escape(&record.description)));
    }
    lines.push("};".to_string());
    lines.push(format!("constexpr size_t register_table_size = {};", records.len()));
    lines.join("\n")
}

/// The complete header file contents.
pub fn render_header(records: &[RegisterRecord]) -> String {
    let mut header = String::from(PRELUDE);
    header.push_str(&constants_block(records));
    header.push_str("\n\n} // namespace registers\n\n");
    header.push_str(&table_block(records));
    header.push_str("\n\n} // namespace caparoc\n");
    header
}
