use clap::{Parser, Subcommand};
use kontainer::distrobox::DistroboxManager;
use kontainer::{APP_NAME, LOG_ENV, Settings, VERSION, cli};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "Manage Distrobox containers and their applications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Container(ContainerCommand),
    /// List supported terminal emulators
    Terminals,
    /// Show how a command would be started in a terminal
    Resolve {
        command: String,

        #[arg(long, default_value = "")]
        workdir: String,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

/// Commands that go through the container tool
#[derive(Subcommand)]
enum ContainerCommand {
    /// List containers
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List images a container can be created from
    Images {
        #[arg(long)]
        json: bool,
    },
    /// Create a container
    Create {
        name: String,
        image: String,

        /// Extra flags passed to `distrobox create`, split like a shell would
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        args: String,
    },
    /// Open a shell in a container
    Enter { name: String },
    /// Remove a container
    Rm { name: String },
    /// Upgrade a container's packages
    Upgrade { name: String },
    /// Create a host launcher for a container, or for all of them
    GenerateEntry { name: Option<String> },
    /// Install a local package file inside a container
    Install {
        name: String,
        package: String,

        /// Image of the container, selects the package manager
        #[arg(long)]
        image: String,
    },
    /// List applications installed in a container
    Apps {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// List applications exported from a container
    Exported {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Export an application to the host
    Export { name: String, basename: String },
    /// Remove an exported application from the host
    Unexport { name: String, basename: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Set the preferred terminal (empty to clear)
    SetTerminal { application: String },
    /// Set the preferred terminal desktop service (empty to clear)
    SetService { service: String },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("[{}] Error: {}", APP_NAME, e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Terminals => cli::list_terminals(),
        Commands::Resolve { command, workdir } => cli::resolve_terminal(&command, &workdir)?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => cli::show_config()?,
            ConfigAction::SetTerminal { application } => cli::set_terminal(&application)?,
            ConfigAction::SetService { service } => cli::set_service(&service)?,
        },
        Commands::Container(command) => {
            let settings = Settings::load()?;
            let manager = DistroboxManager::from_settings(&settings);
            run_container_command(&manager, command)?;
        }
    }

    Ok(())
}

fn run_container_command<R, T>(
    manager: &DistroboxManager<R, T>,
    command: ContainerCommand,
) -> Result<(), kontainer::distrobox::DistroboxError>
where
    R: kontainer::runtime::Runner,
    T: kontainer::terminal::Terminal,
{
    match command {
        ContainerCommand::List { json } => cli::list_containers(manager, json),
        ContainerCommand::Images { json } => cli::list_images(manager, json),
        ContainerCommand::Create { name, image, args } => {
            cli::create_container(manager, &name, &image, &args)
        }
        ContainerCommand::Enter { name } => cli::enter_container(manager, &name),
        ContainerCommand::Rm { name } => cli::remove_container(manager, &name),
        ContainerCommand::Upgrade { name } => cli::upgrade_container(manager, &name),
        ContainerCommand::GenerateEntry { name } => cli::generate_entry(manager, name.as_deref()),
        ContainerCommand::Install {
            name,
            package,
            image,
        } => cli::install_package(manager, &name, &package, &image),
        ContainerCommand::Apps { name, json } => cli::list_available_apps(manager, &name, json),
        ContainerCommand::Exported { name, json } => cli::list_exported_apps(manager, &name, json),
        ContainerCommand::Export { name, basename } => cli::export_app(manager, &name, &basename),
        ContainerCommand::Unexport { name, basename } => {
            cli::unexport_app(manager, &name, &basename)
        }
    }
}
