use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Export a query to a delimited file
    ExportFile {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(
            long,
            help = "Destination file; a temporary .csv file is created when omitted"
        )]
        output: Option<PathBuf>,
    },
    /// Append a query result to a table of a SQLite database
    ExportTable {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(long, help = "SQLite database file")]
        database: PathBuf,

        #[arg(long, help = "Destination table, created when missing")]
        table: String,
    },
    /// Upload a query result as a delimited object
    ExportObject {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(long, help = "Object store location: s3://bucket[/prefix], memory:// or a directory")]
        location: String,

        #[arg(long, help = "Object key")]
        key: String,
    },
    /// Copy attachment bodies into an object store
    Attachments {
        #[arg(long, help = "Comma separated attachment ids")]
        ids: String,

        #[arg(long, help = "Object store location: s3://bucket[/prefix], memory:// or a directory")]
        location: String,

        #[arg(long, default_value_t = 5, help = "Number of concurrent transfers")]
        concurrency: usize,
    },
    /// Print the query result as delimited rows on stdout
    Query {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Print the normalized output columns of a query without running it
    Columns {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List the available operations
    Operations,
}

#[derive(Args)]
pub struct QueryArgs {
    /// SOQL query; `%s` placeholders are filled from --param/--params
    pub soql: String,

    #[arg(long = "param", help = "Positional parameter, repeatable")]
    pub param: Vec<String>,

    #[arg(long, help = "Comma separated positional parameters")]
    pub params: Option<String>,

    #[arg(
        long = "replace",
        value_name = "OLD=NEW",
        help = "Rewrite identifiers before normalization, repeatable"
    )]
    pub replace: Vec<String>,
}
