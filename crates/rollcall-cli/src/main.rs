use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rollcall", about = "Rollcall attendance CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a student from the next captured frame
    Register {
        /// Student name (the identity on the roll)
        name: String,
    },
    /// Run attendance and print the resulting roll
    Attend {
        /// Maximum frames to process (0 = whole capture source)
        #[arg(short, long, default_value_t = 0)]
        frames: u32,
    },
    /// Print the roll of the last completed attendance run
    Roll,
    /// List enrolled students
    Students,
    /// Show daemon status and enrolled students
    Status,
    /// Stop a running attendance loop
    Stop,
}

#[zbus::proxy(
    interface = "org.rollcall.Attendance1",
    default_service = "org.rollcall.Attendance1",
    default_path = "/org/rollcall/Attendance1"
)]
trait Rollcall {
    async fn register(&self, name: &str) -> zbus::Result<String>;
    async fn attend(&self, max_frames: u32) -> zbus::Result<String>;
    async fn snapshot(&self) -> zbus::Result<String>;
    async fn students(&self) -> zbus::Result<String>;
    async fn status(&self) -> zbus::Result<String>;
    async fn stop(&self) -> zbus::Result<bool>;
}

fn print_pretty(json: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(json).context("daemon returned malformed JSON")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let connection = zbus::Connection::session()
        .await
        .context("connecting to the session bus (is rollcalld running?)")?;
    let proxy = RollcallProxy::new(&connection).await?;

    match cli.command {
        Commands::Register { name } => {
            let reply = proxy.register(&name).await?;
            print_pretty(&reply)?;
        }
        Commands::Attend { frames } => {
            let reply = proxy.attend(frames).await?;
            print_pretty(&reply)?;
        }
        Commands::Roll => {
            let reply = proxy.snapshot().await?;
            print_pretty(&reply)?;
        }
        Commands::Students => {
            let reply = proxy.students().await?;
            print_pretty(&reply)?;
        }
        Commands::Status => {
            let reply = proxy.status().await?;
            print_pretty(&reply)?;
        }
        Commands::Stop => {
            let stopped = proxy.stop().await?;
            println!("stop signalled: {stopped}");
        }
    }

    Ok(())
}
