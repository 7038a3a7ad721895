use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;

use tillbook::accounting::ledger::Ledger;
use tillbook::data;
use tillbook::profile::ConversionProfile;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Preset {
    /// Card till report, 16 banner rows, MT01 till, 2% daily bank charges
    CardSales,
    /// Site sales report with a labelled header row
    Site,
}

/// Converts a till sales report into an IIF file for import into the books
#[derive(Parser, Debug)]
#[command(name = "tillbook", version)]
struct Cli {
    /// Report to convert (.xlsx, .xls, .ods or .csv)
    input: PathBuf,

    /// Where to write the IIF file (defaults to credit_card_sales.iif)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "card-sales")]
    preset: Preset,

    /// Site name used in memos of the site preset
    #[arg(long, default_value = "Shop")]
    site_name: String,

    /// Zero-based row holding the column labels (site preset)
    #[arg(long, default_value_t = 0)]
    header_row: usize,

    /// Only keep rows whose till id contains this text
    #[arg(long)]
    channel: Option<String>,

    /// Do not book daily bank charges
    #[arg(long)]
    no_fees: bool,
}

impl Cli {
    fn profile(&self) -> ConversionProfile {
        let mut profile = match self.preset {
            Preset::CardSales => ConversionProfile::card_sales(),
            Preset::Site => ConversionProfile::site_sales(self.site_name.clone(), self.header_row),
        };

        if self.channel.is_some() {
            profile = profile.with_channel(self.channel.clone());
        }
        if self.no_fees {
            profile = profile.without_fees();
        }

        profile
    }
}

fn run(cli: &Cli) -> Result<()> {
    let profile = cli.profile();
    info!("converting report, file={}, preset={:?}", cli.input.display(), cli.preset);

    let table = data::load_table(&cli.input)?;
    let mut ledger = Ledger::new(&profile);
    data::process_table(&table, &profile, &mut ledger)?;

    let output = cli.output.clone().unwrap_or_else(|| PathBuf::from(&profile.output_file));

    let charge_days = ledger.service_charges()?.len();
    ledger.write_iif(BufWriter::new(File::create(&output)?))?;

    println!("Preview: first {} cleaned sales", profile.preview_rows);
    data::export_preview(&ledger, profile.preview_rows, io::stdout().lock())?;

    println!(
        "IIF file written to {} ({} sales, {} bank charge days, {} rows dropped)",
        output.display(),
        ledger.sales.len(),
        charge_days,
        ledger.dropped.total()
    );

    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        eprintln!("Error processing file: {}", err);
        process::exit(1);
    }
}
