//! MT Inspect - CLI tool for decoding SWIFT MT message files.

use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::str::FromStr;
use swift_mt::{
    csv_format::{write_statements, CsvStatement},
    entry_date::ShortestDelta,
    mt103_format::Mt103Reader,
    mt940_format::Mt940Reader,
    mt942_format::Mt942Reader,
    Error, MessageType, Result, TransactionGroup,
};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "mt_inspect")]
#[command(about = "Decode SWIFT MT940, MT942 and MT103 files", long_about = None)]
struct Cli {
    /// Input file path (or stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Message type (mt940, mt942, mt103)
    #[arg(long = "message-type")]
    message_type: String,

    /// Output format (csv, summary)
    #[arg(long = "output-format", default_value = "summary")]
    output_format: String,

    /// Output file path (or stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Log decoding progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Summary,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "summary" | "text" => Ok(OutputFormat::Summary),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let message_type = cli.message_type.parse::<MessageType>()?;
    let output_format = cli.output_format.parse::<OutputFormat>()?;

    let reader: Box<dyn BufRead> = match cli.input {
        Some(ref input_path) => Box::new(BufReader::new(File::open(input_path)?)),
        None => Box::new(io::stdin().lock()),
    };

    if let Some(ref output_path) = cli.output {
        let mut file = File::create(output_path)?;
        inspect(reader, &mut file, message_type, output_format)
    } else {
        let mut stdout = io::stdout().lock();
        inspect(reader, &mut stdout, message_type, output_format)
    }
}

fn inspect<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    message_type: MessageType,
    output_format: OutputFormat,
) -> Result<()> {
    info!(message_type = message_type.name(), "reading messages");
    match (message_type, output_format) {
        (MessageType::Mt940, OutputFormat::Csv) => {
            let mut statements = Vec::new();
            for statement in Mt940Reader::new(reader) {
                let statement = statement?;
                let mut csv = CsvStatement::from(&statement);
                csv.transactions = statement.adjusted_transactions(&ShortestDelta)?;
                statements.push(csv);
            }
            write_statements(writer, &statements)?;
        }
        (MessageType::Mt940, OutputFormat::Summary) => {
            for statement in Mt940Reader::new(reader) {
                let statement = statement?;
                writeln!(
                    writer,
                    "MT940 {} account {} statement {} ({})",
                    statement.transaction_reference(),
                    statement.account(),
                    statement.statement_number(),
                    statement.statement_date()
                )?;
                writeln!(
                    writer,
                    "  opening {} {}  closing {} {}",
                    statement.opening_balance().signed_amount(),
                    statement.currency(),
                    statement.closing_balance().signed_amount(),
                    statement.closing_balance().currency
                )?;
                write_entries(writer, &statement.adjusted_transactions(&ShortestDelta)?)?;
            }
        }
        (MessageType::Mt942, OutputFormat::Csv) => {
            let mut reports = Vec::new();
            for report in Mt942Reader::new(reader) {
                let report = report?;
                let mut csv = CsvStatement::from(&report);
                csv.transactions = report.adjusted_transactions(&ShortestDelta)?;
                reports.push(csv);
            }
            write_statements(writer, &reports)?;
        }
        (MessageType::Mt942, OutputFormat::Summary) => {
            for report in Mt942Reader::new(reader) {
                let report = report?;
                writeln!(
                    writer,
                    "MT942 {} account {} report {} ({})",
                    report.transaction_reference(),
                    report.account(),
                    report.statement_number(),
                    report.created_at()
                )?;
                write_entries(writer, &report.adjusted_transactions(&ShortestDelta)?)?;
            }
        }
        (MessageType::Mt103, OutputFormat::Summary) => {
            for transfer in Mt103Reader::new(reader) {
                let transfer = transfer?;
                let settlement = transfer.settlement();
                writeln!(
                    writer,
                    "MT103 {} {} {} {} from {} to {}",
                    transfer.sender_reference(),
                    settlement.value_date,
                    settlement.amount,
                    settlement.currency,
                    transfer.ordering_customer().name().unwrap_or("?"),
                    transfer.beneficiary().name().unwrap_or("?")
                )?;
            }
        }
        (MessageType::Mt103, OutputFormat::Csv) => {
            return Err(Error::InvalidFormat("csv output is only available for statements".to_string()));
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_entries<W: Write>(writer: &mut W, groups: &[TransactionGroup]) -> Result<()> {
    for group in groups {
        let entry = group.entry();
        let entry_date = entry
            .entry_date
            .and_then(|date| date.date())
            .map(|date| date.to_string())
            .unwrap_or_default();
        writeln!(
            writer,
            "  {} {:10} {:>2} {:>14} {} {}",
            entry.value_date,
            entry_date,
            entry.mark.code(),
            entry.amount,
            entry.transaction_type,
            entry.reference_owner
        )?;
        if let Some(narrative) = group.narrative() {
            match narrative.bcs() {
                Ok(bcs) => writeln!(writer, "      {}", bcs.purpose().unwrap_or_default())?,
                Err(_) => writeln!(writer, "      {}", narrative.text.replace('\n', " "))?,
            }
        }
    }
    Ok(())
}
