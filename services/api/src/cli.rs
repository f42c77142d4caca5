use crate::infra::{load_catalog, read_answer_values};
use crate::server;
use clap::{Args, Parser, Subcommand};
use clinicshield::error::AppError;
use clinicshield::questionnaire::{calculate_completion_percent, Catalog, InputType, YesNoValue};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ClinicShield",
    about = "Run the ClinicShield DSPT questionnaire service and inspect its catalog",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the evidence catalog summary, or the questions of one standard
    Catalog(CatalogArgs),
    /// Compute a completion percentage from a JSON array of answers
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Load the evidence catalog from this CSV instead of the embedded one
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Catalog CSV to inspect (defaults to the embedded DSPT v8 GP catalog)
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// List the questions of this standard
    #[arg(long)]
    pub(crate) standard: Option<u32>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Number of evidence items in the assessment
    #[arg(long)]
    pub(crate) total: usize,
    /// JSON file holding an array of `{yes_no_value, text_value, file_id}` objects
    #[arg(long)]
    pub(crate) answers_json: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Catalog(args) => run_catalog(args),
        Command::Score(args) => run_score(args),
    }
}

fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let catalog = load_catalog(args.catalog_csv.as_deref())?;
    print!("{}", render_catalog(&catalog, args.standard)?);
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let answers = match args.answers_json {
        Some(path) => read_answer_values(&path)?,
        None => Vec::new(),
    };
    let percent = calculate_completion_percent(args.total, &answers);
    println!("{percent:.1}%");
    Ok(())
}

pub(crate) fn render_catalog(catalog: &Catalog, standard: Option<u32>) -> Result<String, AppError> {
    let mut out = String::new();

    let Some(number) = standard else {
        let summary = catalog.seed_summary();
        out.push_str(&format!(
            "{} standards, {} assertions, {} evidence items ({} mandatory, {} approaching mandatory)\n",
            summary.standards,
            summary.assertions,
            summary.evidence_items,
            catalog.mandatory_items(),
            catalog.approaching_items(),
        ));
        for standard in catalog.standards() {
            let assertions = catalog
                .assertions()
                .iter()
                .filter(|assertion| assertion.standard_number == standard.number)
                .count();
            out.push_str(&format!(
                "  {:>2}. {} ({} assertions, {} items)\n",
                standard.number,
                standard.title,
                assertions,
                catalog.items_for_standard(standard.number).len()
            ));
        }
        return Ok(out);
    };

    let standard = catalog
        .standard(number)
        .ok_or_else(|| AppError::Input(format!("standard {number} is not in the catalog")))?;
    out.push_str(&format!("Standard {}: {}\n", standard.number, standard.title));

    let items = catalog.items_for_standard(number);
    for assertion in catalog
        .assertions()
        .iter()
        .filter(|assertion| assertion.standard_number == number)
    {
        out.push_str(&format!("  {} {}\n", assertion.reference, assertion.title));
        for item in items
            .iter()
            .filter(|item| item.assertion_ref == assertion.reference)
        {
            let marker = if item.mandatory { "*" } else { " " };
            out.push_str(&format!(
                "    {} {:<7} [{}] {}\n",
                marker,
                item.reference,
                item.input_type.label(),
                item.plain_english_question
            ));
        }
    }

    if items.iter().any(|item| item.input_type == InputType::YesNo) {
        let options: Vec<String> = YesNoValue::ordered()
            .into_iter()
            .map(|value| format!("{} ({})", value.as_str(), value.label()))
            .collect();
        out.push_str(&format!("Yes/no answers: {}\n", options.join(", ")));
    }
    Ok(out)
}
