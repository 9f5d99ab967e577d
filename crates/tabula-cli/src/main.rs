use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use tabula_classifiers::config::ModelType;
use tabula_cli::submit::{load_run_config, run_evaluation, run_submission, RunConfig};

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to a JSON run configuration file")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn path_arg(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .help(help)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn shared_args(command: Command) -> Command {
    command
        .arg(config_arg())
        .arg(path_arg(
            "train",
            "train",
            "Training table (CSV or TSV). Overrides the configuration file.",
        ))
        .arg(
            Arg::new("target")
                .long("target")
                .help("Target attribute. Defaults to the last training column.")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("folds")
                .short('k')
                .long("folds")
                .help("Number of cross-validation folds.")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed for the cross-validation shuffle.")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("model_type")
                .long("model-type")
                .help("Override the model type from the JSON config.")
                .value_parser(["tree", "adaboost", "gbdt", "majority"])
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("no_report")
                .long("no-report")
                .help("Disable HTML report generation.")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("TABULA_LOG", "error,tabula=info"))
        .init();

    let matches = Command::new("tabula")
        .version(clap::crate_version!())
        .about("Preprocess tabular data, cross-validate a classifier and write a submission")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            shared_args(Command::new("run").about(
                "Cross-validate on the training set, predict the test set and fill the template",
            ))
            .arg(path_arg("test", "test", "Test table to predict."))
            .arg(path_arg(
                "template",
                "template",
                "Submission template holding the identifier and target columns.",
            ))
            .arg(
                path_arg("output", "output", "Where to write the submission.")
                    .short('o'),
            ),
        )
        .subcommand(shared_args(
            Command::new("evaluate").about("Cross-validate the configured model on the training set only"),
        ))
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("run", sub_m)) => handle_run(sub_m),
        Some(("evaluate", sub_m)) => handle_evaluate(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn build_config(matches: &ArgMatches) -> Result<RunConfig> {
    let config_path = matches.get_one::<PathBuf>("config");
    let mut config = match config_path {
        Some(path) => {
            eprintln!("[tabula] Using config: {:?}", path);
            load_run_config(path)?
        }
        None => {
            eprintln!("[tabula] No config provided; using defaults.");
            RunConfig::default()
        }
    };

    for (id, slot) in [
        ("train", &mut config.train),
        ("test", &mut config.test),
        ("template", &mut config.template),
    ] {
        if let Some(path) = matches.try_get_one::<PathBuf>(id).ok().flatten() {
            *slot = Some(path.clone());
        }
    }
    if let Some(output) = matches.try_get_one::<PathBuf>("output").ok().flatten() {
        config.output = output.clone();
    }
    if let Some(target) = matches.get_one::<String>("target") {
        config.pipeline.target_attribute = Some(target.clone());
    }
    if let Some(&folds) = matches.get_one::<usize>("folds") {
        config.pipeline.folds = folds;
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.pipeline.seed = seed;
    }
    if let Some(model_type) = matches.get_one::<String>("model_type") {
        config.model.model_type = ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
    }
    if matches.get_flag("no_report") {
        config.report = false;
    }

    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        eprintln!("[tabula] Default config:\n{}", default_json);
    }
    Ok(config)
}

fn handle_run(matches: &ArgMatches) -> Result<()> {
    let config = build_config(matches)?;
    match run_submission(&config) {
        Ok(outcome) => {
            println!("{}", outcome.evaluation.summary());
            eprintln!(
                "[tabula] Target '{}'; submission written to {:?}",
                outcome.target_name, config.output
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Run failed: {:#}", e);
            eprintln!("[tabula] Run failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_evaluate(matches: &ArgMatches) -> Result<()> {
    let config = build_config(matches)?;
    match run_evaluation(&config) {
        Ok((evaluation, target)) => {
            println!("{}", evaluation.summary());
            eprintln!("[tabula] Target '{}'", target);
            Ok(())
        }
        Err(e) => {
            log::error!("Evaluation failed: {:#}", e);
            eprintln!("[tabula] Evaluation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
