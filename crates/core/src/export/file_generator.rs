use chrono::Utc;
use log::info;
use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::export_errors::ExportError;
use crate::allocations::Allocation;
use crate::constants::{
    TRANSACTION_FILE_HEADER, TRANSACTION_FILE_PREFIX, TRANSACTION_FILE_TIMESTAMP_FORMAT,
};
use crate::Result;

/// Trait defining the contract for transaction file generation.
pub trait FileGeneratorTrait: Send + Sync {
    /// Writes the transaction file for the given allocations and returns its
    /// file name (not the full path). The output is deterministic given the
    /// input order.
    fn generate(&self, allocations: &[Allocation]) -> Result<String>;

    fn cleanup(&self, file_name: &str) -> Result<()>;

    fn file_path(&self, file_name: &str) -> PathBuf;
}

/// Writes portfolio accounting transaction files into a configured output
/// directory shared with the downstream CLI.
pub struct FileGenerator {
    output_dir: PathBuf,
}

impl FileGenerator {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

impl FileGeneratorTrait for FileGenerator {
    fn generate(&self, allocations: &[Allocation]) -> Result<String> {
        if allocations.is_empty() {
            return Err(ExportError::NoAllocations.into());
        }

        let file_name = format!(
            "{}{}.csv",
            TRANSACTION_FILE_PREFIX,
            Utc::now().format(TRANSACTION_FILE_TIMESTAMP_FORMAT)
        );
        let path = self.output_dir.join(&file_name);

        let mut content = String::with_capacity(64 * (allocations.len() + 1));
        content.push_str(TRANSACTION_FILE_HEADER);
        content.push('\n');
        for allocation in allocations {
            // Building the line cannot fail; write! into a String is infallible.
            let _ = writeln!(content, "{}", allocation_to_csv_line(allocation));
        }

        fs::create_dir_all(&self.output_dir)
            .map_err(|err| ExportError::Io(err.to_string()))?;
        fs::write(&path, content).map_err(|err| ExportError::Io(err.to_string()))?;

        info!(
            "generated transaction file {} with {} records",
            path.display(),
            allocations.len()
        );

        Ok(file_name)
    }

    fn cleanup(&self, file_name: &str) -> Result<()> {
        let path = self.output_dir.join(file_name);
        fs::remove_file(&path).map_err(|err| ExportError::Io(err.to_string()))?;
        info!("removed transaction file {}", path.display());
        Ok(())
    }

    fn file_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

fn allocation_to_csv_line(allocation: &Allocation) -> String {
    let fields = [
        allocation.portfolio_id.clone(),
        allocation.security_id.clone(),
        format!("AC{}", allocation.id),
        allocation.side.to_string(),
        format_fixed_scale(allocation.quantity),
        format_fixed_scale(allocation.average_price),
        allocation.trade_date.format("%Y-%m-%d").to_string(),
    ];

    fields
        .iter()
        .map(|field| escape_csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders a decimal with exactly 8 fractional digits, truncating any excess
/// scale rather than rounding, so the output is stable across platforms.
fn format_fixed_scale(value: Decimal) -> String {
    format!("{:.8}", value.trunc_with_scale(8))
}

/// Fields containing a comma, a double quote, or a newline are surrounded
/// with double quotes; internal double quotes are doubled.
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocations::TradeSide;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn sample_allocation(id: i64) -> Allocation {
        Allocation {
            id,
            external_execution_id: 123,
            is_open: false,
            status: "FILLED".to_string(),
            side: TradeSide::Buy,
            destination: "NYSE".to_string(),
            security_id: "SEC000000000000000000ABCD".to_string(),
            ticker: "AAPL".to_string(),
            portfolio_id: "PORTFOLIO123456789012".to_string(),
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            quantity: dec!(100.5),
            limit_price: None,
            quantity_filled: dec!(100.5),
            total_amount: dec!(15075.0),
            average_price: dec!(150.0),
            received_timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
            sent_timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 1, 0).unwrap(),
            last_fill_timestamp: None,
            ready_to_send_timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 2, 0).unwrap(),
            version: 1,
        }
    }

    /// Splits one CSV line back into fields under the declared escaping
    /// rules. Test-side inverse of the formatter.
    fn parse_csv_line(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    chars.next();
                    current.push('"');
                }
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    fields.push(std::mem::take(&mut current));
                }
                _ => current.push(ch),
            }
        }
        fields.push(current);
        fields
    }

    #[test]
    fn line_follows_portfolio_accounting_format() {
        let line = allocation_to_csv_line(&sample_allocation(42));
        assert_eq!(
            line,
            "PORTFOLIO123456789012,SEC000000000000000000ABCD,AC42,BUY,100.50000000,150.00000000,2024-01-15"
        );
    }

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        let mut allocation = sample_allocation(1);
        allocation.portfolio_id = "PORT,X".to_string();
        allocation.security_id = "SEC\"Y".to_string();
        let line = allocation_to_csv_line(&allocation);
        assert!(line.starts_with("\"PORT,X\",\"SEC\"\"Y\","));
    }

    #[test]
    fn formatting_truncates_excess_scale() {
        assert_eq!(format_fixed_scale(dec!(1.123456789)), "1.12345678");
        assert_eq!(format_fixed_scale(dec!(2)), "2.00000000");
    }

    #[test]
    fn format_then_parse_round_trips() {
        let allocation = sample_allocation(7);
        let fields = parse_csv_line(&allocation_to_csv_line(&allocation));

        assert_eq!(fields.len(), 7);
        assert_eq!(fields[0], allocation.portfolio_id);
        assert_eq!(fields[1], allocation.security_id);
        assert_eq!(fields[2], format!("AC{}", allocation.id));
        assert_eq!(fields[3], allocation.side.to_string());
        assert_eq!(fields[4].parse::<Decimal>().unwrap(), allocation.quantity);
        assert_eq!(
            fields[5].parse::<Decimal>().unwrap(),
            allocation.average_price
        );
        assert_eq!(fields[6], allocation.trade_date.format("%Y-%m-%d").to_string());
    }

    #[test]
    fn escaped_fields_round_trip() {
        let mut allocation = sample_allocation(9);
        allocation.portfolio_id = "A,\"B\",C".to_string();
        let fields = parse_csv_line(&allocation_to_csv_line(&allocation));
        assert_eq!(fields[0], "A,\"B\",C");
    }

    #[test]
    fn generate_writes_header_and_one_line_per_allocation() {
        let dir = tempfile::tempdir().unwrap();
        let generator = FileGenerator::new(dir.path());
        let allocations = vec![sample_allocation(1), sample_allocation(2)];

        let file_name = generator.generate(&allocations).unwrap();
        assert!(file_name.starts_with(TRANSACTION_FILE_PREFIX));
        assert!(file_name.ends_with(".csv"));

        let content = fs::read_to_string(generator.file_path(&file_name)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TRANSACTION_FILE_HEADER);
        assert!(lines[1].contains(",AC1,"));
        assert!(lines[2].contains(",AC2,"));
    }

    #[test]
    fn generate_rejects_empty_selection() {
        let dir = tempfile::tempdir().unwrap();
        let generator = FileGenerator::new(dir.path());
        assert!(matches!(
            generator.generate(&[]),
            Err(crate::Error::Export(ExportError::NoAllocations))
        ));
    }

    #[test]
    fn cleanup_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let generator = FileGenerator::new(dir.path());
        let file_name = generator.generate(&[sample_allocation(1)]).unwrap();

        generator.cleanup(&file_name).unwrap();
        assert!(!generator.file_path(&file_name).exists());

        // A second cleanup reports the I/O failure.
        assert!(generator.cleanup(&file_name).is_err());
    }
}
