use clap::{Args, Parser, Subcommand};
use psi_vision::{
    cli::{
        auth::{create_attendee, NewAttendee},
        db::{db_generate, db_list, db_migrate, db_revert},
    },
    core::db::init_pool,
    settings::get_config,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database related command
    Db(DbArgs),
    /// Account related command
    Auth(AuthArgs),
}

#[derive(Debug, Args)]
struct AuthArgs {
    #[command(subcommand)]
    command: AuthCommands,
}

#[derive(Debug, Subcommand)]
enum AuthCommands {
    /// Create an attendee account with an empty profile
    CreateUser {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        /// random when omitted
        #[arg(short, long)]
        password: Option<String>,
        #[arg(long)]
        age_group: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        staff: bool,
    },
}

#[derive(Debug, Args)]
struct DbArgs {
    #[command(subcommand)]
    command: DbCommands,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Generate new migration file
    Generate { migration_name: String },
    /// List all migration
    List,
    /// Run all pending migration
    Migrate,
    /// Revert latest migration
    Revert,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Db(db_args) => match db_args.command {
            DbCommands::Generate { migration_name } => {
                println!("generate migration: {migration_name:?}");
                db_generate(&migration_name).await?;
            }
            DbCommands::List => {
                let pool = init_pool(&get_config()?).await?;
                for (version, description, applied) in db_list(&pool).await? {
                    let state = if applied { "applied" } else { "pending" };
                    println!("{version} {description} ({state})");
                }
            }
            DbCommands::Migrate => {
                println!("run all pending migration");
                let pool = init_pool(&get_config()?).await?;
                db_migrate(&pool).await?;
            }
            DbCommands::Revert => {
                let pool = init_pool(&get_config()?).await?;
                match db_revert(&pool).await? {
                    Some(version) => println!("reverted migration {version}"),
                    None => println!("nothing to revert"),
                }
            }
        },
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::CreateUser {
                username,
                email,
                password,
                age_group,
                gender,
                region,
                staff,
            } => {
                let pool = init_pool(&get_config()?).await?;
                let attendee = NewAttendee {
                    username,
                    email,
                    password,
                    age_group,
                    gender,
                    region,
                    staff,
                };
                let (user, password) = create_attendee(&pool, &attendee).await?;
                println!("created {} ({})", user.user_name, user.id);
                println!("temporary password: {password}");
            }
        },
    }
    Ok(())
}
