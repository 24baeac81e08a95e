use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use clap::{Parser, Subcommand};
use infixcalc::{host, CalcError, EngineConfig, Scope, Session};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Significant digits of results
  #[arg(long, env = "INFIXCALC_DIGITS", default_value_t = 15)]
  digits: usize,

  /// Time limit of one calculation, in seconds
  #[arg(long, env = "INFIXCALC_TIMEOUT", default_value_t = 20.0)]
  timeout: f64,

  /// JSON file holding custom definitions
  #[arg(long, env = "INFIXCALC_STORE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Evaluate an expression
  Eval {
    /// The expression to evaluate
    expression: String,
    /// Variable binding, e.g. `--var x=2`
    #[arg(long = "var", value_parser = parse_binding)]
    vars: Vec<(String, f64)>,
  },
  /// Add or replace a custom function, e.g. `f(x) = x^2`
  Define { definition: String },
  /// Remove a custom function
  Remove { name: String },
  /// Sample a one-parameter function, printing `x<TAB>y` rows
  Plot {
    name: String,
    #[arg(allow_hyphen_values = true)]
    xlow: f64,
    #[arg(allow_hyphen_values = true)]
    xhigh: f64,
    #[arg(long, env = "INFIXCALC_SAMPLES", default_value_t = 100)]
    samples: usize,
  },
  /// List custom functions
  List,
  /// Show one custom or built-in function
  Show { name: String },
  /// Read expressions from stdin, one per line
  Repl,
}

fn parse_binding(text: &str) -> Result<(String, f64), String> {
  let (name, value) = text
    .split_once('=')
    .ok_or_else(|| format!("expected name=value, got '{text}'"))?;
  let value = value
    .trim()
    .parse::<f64>()
    .map_err(|e| format!("invalid value for {name}: {e}"))?;
  Ok((name.trim().to_string(), value))
}

fn setup_logging() {
  use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
    .with(filter)
    .init();
}

struct Shell {
  session: Arc<Mutex<Session>>,
  limit: Duration,
}

impl Shell {
  async fn run<T, F>(&self, job: F) -> Result<T, CalcError>
  where
    T: Send + 'static,
    F: FnOnce(&mut Session) -> Result<T, CalcError> + Send + 'static,
  {
    host::run_with_timeout(self.session.clone(), self.limit, job).await
  }

  async fn eval(&self, expression: String, scope: Scope) -> Result<String, CalcError> {
    self
      .run(move |s| {
        let value = s.evaluate(&expression, &scope)?;
        Ok(s.format(&value))
      })
      .await
  }

  async fn define(&self, text: String) -> Result<String, CalcError> {
    self
      .run(move |s| s.define(&text).map(|d| format!("defined {d}")))
      .await
  }

  async fn remove(&self, name: String) -> Result<String, CalcError> {
    self
      .run(move |s| s.remove(&name).map(|d| format!("removed {d}")))
      .await
  }

  async fn plot(&self, name: String, xlow: f64, xhigh: f64, samples: usize) -> Result<String, CalcError> {
    let points = self
      .run(move |s| s.plot(&name, xlow, xhigh, samples))
      .await?;
    Ok(
      points
        .iter()
        .map(|(x, y)| format!("{x}\t{y}"))
        .collect::<Vec<_>>()
        .join("\n"),
    )
  }

  fn list(&self) -> String {
    let session = self.session.lock().unwrap_or_else(|e| e.into_inner());
    session
      .registry()
      .customs()
      .map(|d| d.to_string())
      .collect::<Vec<_>>()
      .join("\n")
  }

  fn show(&self, name: &str) -> Result<String, CalcError> {
    let session = self.session.lock().unwrap_or_else(|e| e.into_inner());
    session
      .registry()
      .function(name)
      .map(|d| d.to_string())
      .ok_or_else(|| CalcError::Name(format!("function does not exist: {name}")))
  }

  /// Runs one REPL line; `:define`, `:remove`, `:plot` and `:list` are
  /// commands, anything else is evaluated.
  async fn line(&self, line: &str, samples: usize) -> Result<String, anyhow::Error> {
    let (command, rest) = match line.strip_prefix(':') {
      Some(command) => command.split_once(' ').unwrap_or((command, "")),
      None => return Ok(self.eval(line.to_string(), Scope::new()).await?),
    };
    let rest = rest.trim();
    match command {
      "define" => Ok(self.define(rest.to_string()).await?),
      "remove" => Ok(self.remove(rest.to_string()).await?),
      "list" => Ok(self.list()),
      "show" => Ok(self.show(rest)?),
      "plot" => {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        let [name, xlow, xhigh] = parts.as_slice() else {
          return Err(anyhow!("usage: :plot <name> <xlow> <xhigh>"));
        };
        let xlow = xlow.parse::<f64>().context("invalid lower bound")?;
        let xhigh = xhigh.parse::<f64>().context("invalid upper bound")?;
        Ok(self.plot(name.to_string(), xlow, xhigh, samples).await?)
      }
      other => Err(anyhow!("unknown command :{other}")),
    }
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  setup_logging();
  let cli = Cli::parse();

  let mut config = EngineConfig::default().with_digits(cli.digits);
  config.store = cli.store;
  config.timeout = Duration::try_from_secs_f64(cli.timeout)
    .map_err(|e| anyhow!("invalid timeout {}: {e}", cli.timeout))?;
  let limit = config.timeout;
  let samples = config.samples;

  let session = Session::new(config).context("cannot start the calculator")?;
  let shell = Shell {
    session: Arc::new(Mutex::new(session)),
    limit,
  };

  match cli.command {
    Commands::Eval { expression, vars } => {
      let mut scope = Scope::new();
      {
        let mut session = shell.session.lock().unwrap_or_else(|e| e.into_inner());
        let math = &mut session.context_mut().math;
        for (name, value) in vars {
          scope.insert(name, math.from_f64(value));
        }
      }
      println!("{}", shell.eval(expression, scope).await?);
    }
    Commands::Define { definition } => println!("{}", shell.define(definition).await?),
    Commands::Remove { name } => println!("{}", shell.remove(name).await?),
    Commands::Plot {
      name,
      xlow,
      xhigh,
      samples,
    } => println!("{}", shell.plot(name, xlow, xhigh, samples).await?),
    Commands::List => println!("{}", shell.list()),
    Commands::Show { name } => println!("{}", shell.show(&name)?),
    Commands::Repl => {
      let mut lines = BufReader::new(tokio::io::stdin()).lines();
      while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
          continue;
        }
        match shell.line(line, samples).await {
          Ok(output) if output.is_empty() => {}
          Ok(output) => println!("{output}"),
          Err(e) => eprintln!("Error: {e}"),
        }
      }
    }
  }
  Ok(())
}
