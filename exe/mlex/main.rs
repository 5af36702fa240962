mod app_config;

use lib::{genres, model, subcommands, utils};

use app_config::AppConfig;
use clap::{Args, Parser, Subcommand};
use genres::TRACKS;
use model::{DataSource, OptimizerKind, DATA_URL};
use std::{error::Error, path::PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
  /// YAML file with defaults for the options below
  #[arg(short, long, value_name = "PATH", global = true)]
  config: Option<PathBuf>,
  /// Log debug output
  #[arg(short, long, global = true)]
  verbose: bool,
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Rank music genres from your ratings of eight reference tracks
  Genres(GenresArgs),
  /// Train the horsepower to MPG regression and test it
  Cars(CarsArgs),
}

#[derive(Args)]
struct GenresArgs {
  /// Ratings in track order: Duki NFT LilChip dragons Maluma bionica soda Arcangel
  #[arg(
    value_name = "RATING",
    allow_hyphen_values = true,
    conflicts_with_all = ["duki", "nft", "lil_chip", "dragons", "maluma", "bionica", "soda", "arcangel"]
  )]
  ratings: Vec<String>,
  #[arg(long)]
  duki: Option<String>,
  #[arg(long)]
  nft: Option<String>,
  #[arg(long)]
  lil_chip: Option<String>,
  #[arg(long)]
  dragons: Option<String>,
  #[arg(long)]
  maluma: Option<String>,
  #[arg(long)]
  bionica: Option<String>,
  #[arg(long)]
  soda: Option<String>,
  #[arg(long)]
  arcangel: Option<String>,
}

impl GenresArgs {
  /// The named ratings when any is given, the positional ones otherwise. A missing named
  /// rating is left empty so it's reported as not a number.
  fn fields(self) -> Vec<String> {
    let named = [
      self.duki,
      self.nft,
      self.lil_chip,
      self.dragons,
      self.maluma,
      self.bionica,
      self.soda,
      self.arcangel,
    ];
    if named.iter().all(Option::is_none) {
      return self.ratings;
    }
    named.into_iter().map(Option::unwrap_or_default).collect()
  }
}

#[derive(Args)]
struct CarsArgs {
  /// Url of the car dataset
  #[arg(long, conflicts_with = "data")]
  url: Option<String>,
  /// Local copy of the car dataset
  #[arg(short, long, value_name = "PATH")]
  data: Option<PathBuf>,
  #[arg(short, long, value_name = "INT")]
  epochs: Option<usize>,
  #[arg(long, value_name = "INT")]
  batch_size: Option<usize>,
  #[arg(long, value_name = "FLOAT")]
  learning_rate: Option<f32>,
  #[arg(long, value_enum)]
  optimizer: Option<Optimizer>,
  /// Keep the sample order fixed across epochs
  #[arg(long)]
  no_shuffle: bool,
  #[arg(long, value_name = "INT")]
  seed: Option<u64>,
  /// Write the training history and predictions as json
  #[arg(short, long, value_name = "PATH")]
  output: Option<PathBuf>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Optimizer {
  Adam,
  Sgd,
}

impl From<Optimizer> for OptimizerKind {
  fn from(optimizer: Optimizer) -> Self {
    match optimizer {
      Optimizer::Adam => OptimizerKind::Adam,
      Optimizer::Sgd => OptimizerKind::Sgd,
    }
  }
}

impl CarsArgs {
  fn into_config(self) -> AppConfig {
    AppConfig {
      url: self.url,
      data: self.data,
      epochs: self.epochs,
      batch_size: self.batch_size,
      learning_rate: self.learning_rate,
      optimizer: self.optimizer.map(Into::into),
      shuffle: self.no_shuffle.then_some(false),
      seed: self.seed,
      output: self.output,
      ..AppConfig::default()
    }
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
  let args = Cli::parse();

  let file_config = match &args.config {
    Some(path) => AppConfig::load(path)?,
    None => AppConfig::default(),
  };
  let cli_config = AppConfig {
    verbose: args.verbose.then_some(true),
    ..AppConfig::default()
  };
  let config = file_config.merge(cli_config);
  let level = if config.verbose.unwrap_or(false) {
    Level::DEBUG
  } else {
    Level::INFO
  };
  utils::init_logging(level)?;

  match args.command {
    Command::Genres(genres_args) => {
      let fields = genres_args.fields();
      tracing::debug!("{} ratings for {} tracks", fields.len(), TRACKS.len());
      let ranking = subcommands::Genres::new(fields).run()?;
      println!("Based on your answers, your favourite music genres are: {}", ranking);
    }
    Command::Cars(cars_args) => {
      let cli_config = cars_args.into_config();
      // A url given on the command line beats a local file from the config file.
      let config = match cli_config.url {
        Some(_) => AppConfig { data: None, ..config },
        None => config,
      }
      .merge(cli_config);
      let source = match (&config.data, &config.url) {
        (Some(path), _) => DataSource::File(path.clone()),
        (None, Some(url)) => DataSource::Url(url.clone()),
        (None, None) => DataSource::Url(DATA_URL.to_string()),
      };
      let params = config.train_params();
      let app = subcommands::Cars::new(source, params, config.output.clone());
      let report = app.run().await?;
      println!(
        "Trained on {} cars, final loss {:.6}",
        report.samples, report.loss
      );
    }
  }
  Ok(())
}
