use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConnectionArgs {
    #[arg(long, help = "Source database host")]
    pub host: String,

    #[arg(long, default_value_t = 3306, help = "Source database port")]
    pub port: u16,

    #[arg(long, help = "Source database user")]
    pub username: String,

    #[arg(
        long,
        help = "Source database password; falls back to the DB_PASSWORD environment variable"
    )]
    pub password: Option<String>,

    #[arg(long, help = "Source database name")]
    pub database: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full migration: analyze, map, migrate, verify
    Migrate {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[arg(long, help = "Directory the target collections are written to")]
        target: String,

        #[arg(long, default_value_t = 1000, help = "Rows per batch")]
        batch_size: usize,

        #[arg(long, help = "Skip post-migration integrity verification")]
        no_validate: bool,

        #[arg(long, help = "Do not copy primary keys into the document id")]
        no_preserve_ids: bool,

        #[arg(
            long,
            help = "If specified, writes the JSON result to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Introspect the source and print the derived document schema
    Schema {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[arg(
            long,
            help = "If specified, writes the JSON schema to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Test the source connection and exit
    TestConn {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}
