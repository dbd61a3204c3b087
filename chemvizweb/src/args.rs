use clap::{arg, command, Parser};

pub fn parse_args() -> Args {
    Args::parse()
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(
        short,
        long,
        help = "Specify a port to serve the site on. If not specified, a random unused port is chosen."
    )]
    pub port: Option<u16>,

    #[arg(
        short,
        long,
        default_value = "false",
        help = "Whether to automatically open the website in the browser."
    )]
    pub auto_open: bool,

    #[arg(
        short,
        long,
        default_value = "chemvizweb.db",
        help = "Filename of the database to open. Can be an absolute path or a filename such as 'chemvizweb-debug.db'. \
        If just a filename, then the database will be located in your 'data_local_dir' as specified by \
        the 'directories' crate: https://crates.io/crates/directories. The database is in SQLite format."
    )]
    pub database: String,

    #[arg(
        long,
        default_value_t = 5,
        help = "How many of the most recent uploads to keep in the history. Older uploads are deleted."
    )]
    pub history_size: usize,

    #[arg(
        long,
        env = "CHEMVIZ_API_TOKEN",
        help = "If specified, every request, including the pages, must carry an \
        'Authorization: Bearer <token>' header with this token. If not specified, anyone can use the site."
    )]
    pub api_token: Option<String>,

    #[arg(
        long,
        default_value_t = 16 * 1024 * 1024,
        help = "The largest upload accepted, in bytes."
    )]
    pub max_upload_bytes: usize,
}
